use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use super::{days_of, events_by_day, month_range};
use crate::constants::{DAYS_PER_WEEK, MAX_VISIBLE_EVENTS};
use crate::date::is_weekend;
use crate::date_range::DateRange;
use crate::event::CalendarEvent;
use crate::state::CalendarState;
use crate::store::EventStore;

/// Month grid: whole weeks covering the month of the current date.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthGrid {
    /// 1-12
    pub month: u32,
    pub year: i32,
    /// Weekday index (0 = Sunday) of each column, in column order.
    pub weekdays: Vec<u8>,
    /// Rows of exactly seven days.
    pub weeks: Vec<Vec<MonthDay>>,
    pub range: DateRange,
}

impl MonthGrid {
    pub fn days(&self) -> impl Iterator<Item = &MonthDay> {
        self.weeks.iter().flatten()
    }

    pub fn day(&self, date: NaiveDate) -> Option<&MonthDay> {
        self.days().find(|day| day.date == date)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthDay {
    pub date: NaiveDate,
    pub day_of_month: u32,
    pub is_current_month: bool,
    pub is_today: bool,
    /// Saturday or Sunday, whatever day the week starts on.
    pub is_weekend: bool,
    pub is_selected: bool,
    pub events: Vec<CalendarEvent>,
    /// Events past the first few that a cell collapses into "+N more".
    pub more_count: usize,
}

pub(super) fn build(store: &EventStore, state: &CalendarState, today: NaiveDate) -> MonthGrid {
    let current = state.current_day();
    let week_starts_on = state.config.week_starts_on;
    let range = month_range(current, week_starts_on);
    let selected = state.selected_day();

    let mut events = events_by_day(store, range, state.time_zone());

    let mut weeks = Vec::new();
    for week in days_of(range).chunks(DAYS_PER_WEEK) {
        let mut row = Vec::with_capacity(DAYS_PER_WEEK);
        for &date in week {
            let day_events = events.remove(&date).unwrap_or_default();
            row.push(MonthDay {
                date,
                day_of_month: date.day(),
                is_current_month: date.year() == current.year() && date.month() == current.month(),
                is_today: date == today,
                is_weekend: is_weekend(date),
                is_selected: selected == Some(date),
                more_count: day_events.len().saturating_sub(MAX_VISIBLE_EVENTS),
                events: day_events,
            });
        }
        weeks.push(row);
    }

    MonthGrid {
        month: current.month(),
        year: current.year(),
        weekdays: (0..DAYS_PER_WEEK as u8)
            .map(|offset| (week_starts_on + offset) % 7)
            .collect(),
        weeks,
        range,
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use chrono::{DateTime, TimeZone, Utc, Weekday};
    use chrono_tz::Tz;

    use super::*;
    use crate::config::CalendarConfig;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn state_at(current: DateTime<Utc>, week_starts_on: u8) -> CalendarState {
        let config = CalendarConfig::new()
            .with_time_zone(Tz::UTC)
            .with_week_starts_on(week_starts_on);
        CalendarState::new(Rc::new(config), current)
    }

    fn noon(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn january_2025_with_monday_start() {
        let state = state_at(noon(2025, 1, 15), 1);
        let grid = build(&EventStore::new(), &state, ymd(2025, 1, 20));

        assert_eq!((grid.month, grid.year), (1, 2025));
        assert_eq!(grid.weeks.len(), 5);
        assert_eq!(grid.weekdays, vec![1, 2, 3, 4, 5, 6, 0]);

        let first = &grid.weeks[0][0];
        let last = &grid.weeks[4][6];
        assert_eq!(first.date, ymd(2024, 12, 30));
        assert_eq!(first.date.weekday(), Weekday::Mon);
        assert!(!first.is_current_month);
        assert_eq!(last.date, ymd(2025, 2, 2));
        assert_eq!(last.date.weekday(), Weekday::Sun);
    }

    #[test]
    fn february_that_fits_four_rows() {
        // 2026-02-01 is a Sunday and February 2026 has 28 days.
        let state = state_at(noon(2026, 2, 10), 0);
        let grid = build(&EventStore::new(), &state, ymd(2000, 1, 1));

        assert_eq!(grid.weeks.len(), 4);
        assert!(grid.days().all(|day| day.is_current_month));
        assert_eq!(grid.weeks[0][0].date, ymd(2026, 2, 1));
        assert_eq!(grid.weeks[3][6].date, ymd(2026, 2, 28));
    }

    #[test]
    fn month_needing_six_rows() {
        // March 2025 starts on a Saturday and has 31 days.
        let state = state_at(noon(2025, 3, 1), 0);
        let grid = build(&EventStore::new(), &state, ymd(2000, 1, 1));
        assert_eq!(grid.weeks.len(), 6);
        assert!(grid.weeks.iter().all(|week| week.len() == 7));
    }

    #[test]
    fn flags_today_selection_and_weekends() {
        let mut state = state_at(noon(2025, 1, 15), 0);
        state.selected_date = Some(Utc.with_ymd_and_hms(2025, 1, 22, 8, 0, 0).unwrap());
        let grid = build(&EventStore::new(), &state, ymd(2025, 1, 16));

        let today: Vec<_> = grid.days().filter(|d| d.is_today).map(|d| d.date).collect();
        assert_eq!(today, vec![ymd(2025, 1, 16)]);

        let selected: Vec<_> = grid.days().filter(|d| d.is_selected).map(|d| d.date).collect();
        assert_eq!(selected, vec![ymd(2025, 1, 22)]);

        let saturday = grid.day(ymd(2025, 1, 18)).unwrap();
        let monday = grid.day(ymd(2025, 1, 20)).unwrap();
        assert!(saturday.is_weekend);
        assert!(!monday.is_weekend);
        assert_eq!(grid.day(ymd(2025, 1, 9)).unwrap().day_of_month, 9);
    }

    #[test]
    fn places_sorted_events_and_counts_overflow() {
        let mut store = EventStore::new();
        let at = |h| Utc.with_ymd_and_hms(2025, 1, 15, h, 0, 0).unwrap();
        for (id, hour) in [("d", 16), ("a", 9), ("c", 14), ("b", 11)] {
            store
                .add(CalendarEvent::starting_at(id, at(hour)).with_id(id))
                .unwrap();
        }
        store
            .add(CalendarEvent::new("Holiday", at(0), at(23)).with_id("h").all_day())
            .unwrap();
        // Spills into the next month's leading cells.
        store
            .add(CalendarEvent::starting_at("Feb", noon(2025, 2, 1)).with_id("feb"))
            .unwrap();

        let grid = build(&store, &state_at(noon(2025, 1, 15), 0), ymd(2025, 1, 15));

        let day = grid.day(ymd(2025, 1, 15)).unwrap();
        let ids: Vec<_> = day.events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["h", "a", "b", "c", "d"]);
        assert_eq!(day.more_count, 2);

        let feb = grid.day(ymd(2025, 2, 1)).unwrap();
        assert!(!feb.is_current_month);
        assert_eq!(feb.events.len(), 1);
        assert_eq!(feb.more_count, 0);
    }

    #[test]
    fn serializes_camel_case_fields() {
        let grid = build(&EventStore::new(), &state_at(noon(2025, 1, 15), 1), ymd(2025, 1, 15));
        let json = serde_json::to_value(&grid).unwrap();

        assert_eq!(json["month"], 1);
        let cell = &json["weeks"][0][0];
        assert_eq!(cell["date"], "2024-12-30");
        assert_eq!(cell["dayOfMonth"], 30);
        assert_eq!(cell["isCurrentMonth"], false);
        assert!(cell.get("moreCount").is_some());
    }
}
