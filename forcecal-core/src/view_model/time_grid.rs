use chrono::{Datelike, NaiveDate, Timelike};
use serde::Serialize;

use super::{days_of, events_by_day};
use crate::constants::HOURS_PER_DAY;
use crate::date::is_weekend;
use crate::date_range::DateRange;
use crate::event::CalendarEvent;
use crate::state::CalendarState;
use crate::store::EventStore;

/// Day columns with hour rows, for the week and day views.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeGrid {
    pub range: DateRange,
    pub days: Vec<TimeGridDay>,
}

impl TimeGrid {
    pub fn day(&self, date: NaiveDate) -> Option<&TimeGridDay> {
        self.days.iter().find(|day| day.date == date)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeGridDay {
    pub date: NaiveDate,
    /// 0 = Sunday
    pub weekday: u8,
    pub is_today: bool,
    pub is_weekend: bool,
    pub is_selected: bool,
    pub all_day_events: Vec<CalendarEvent>,
    /// 24 rows, hour 0 first.
    pub hours: Vec<HourSlot>,
}

/// Timed events starting within one local hour.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HourSlot {
    pub hour: u32,
    pub events: Vec<CalendarEvent>,
}

pub(super) fn build(
    store: &EventStore,
    state: &CalendarState,
    today: NaiveDate,
    range: DateRange,
) -> TimeGrid {
    let tz = state.time_zone();
    let selected = state.selected_day();
    let mut events = events_by_day(store, range, tz);

    let days = days_of(range)
        .into_iter()
        .map(|date| {
            let mut hours: Vec<HourSlot> = (0..HOURS_PER_DAY)
                .map(|hour| HourSlot {
                    hour,
                    events: Vec::new(),
                })
                .collect();
            let mut all_day_events = Vec::new();

            // Already sorted, so each slot stays in start order.
            for event in events.remove(&date).unwrap_or_default() {
                if event.all_day {
                    all_day_events.push(event);
                } else {
                    let hour = event.start.with_timezone(&tz).hour() as usize;
                    hours[hour].events.push(event);
                }
            }

            TimeGridDay {
                date,
                weekday: date.weekday().num_days_from_sunday() as u8,
                is_today: date == today,
                is_weekend: is_weekend(date),
                is_selected: selected == Some(date),
                all_day_events,
                hours,
            }
        })
        .collect();

    TimeGrid { range, days }
}
