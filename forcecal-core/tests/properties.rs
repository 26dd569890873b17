use std::cell::Cell;
use std::rc::Rc;

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use forcecal_core::{CalendarConfig, CalendarEvent, FixedClock, StateManager, View};
use proptest::prelude::*;

const ZONES: [Tz; 4] = [
    Tz::UTC,
    chrono_tz::America::New_York,
    chrono_tz::Europe::Berlin,
    chrono_tz::Asia::Kolkata,
];

/// Days on, next to, or a week or month away from the 2025 DST changes in
/// New York (03-09, 11-02) and Berlin (03-30, 10-26).
const DST_NEIGHBOURS: [(i32, u32, u32); 12] = [
    (2025, 2, 9),
    (2025, 3, 2),
    (2025, 3, 8),
    (2025, 3, 9),
    (2025, 3, 29),
    (2025, 3, 30),
    (2025, 10, 2),
    (2025, 10, 25),
    (2025, 10, 26),
    (2025, 11, 1),
    (2025, 11, 2),
    (2025, 12, 2),
];

fn noon(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
}

fn manager_at(current: DateTime<Utc>, now: DateTime<Utc>, week_starts_on: u8, tz: Tz) -> StateManager {
    let config = CalendarConfig::new()
        .with_time_zone(tz)
        .with_week_starts_on(week_starts_on);
    StateManager::builder(config)
        .date(current)
        .clock(FixedClock::new(now))
        .build()
        .unwrap()
}

fn view_strategy() -> impl Strategy<Value = View> {
    prop_oneof![Just(View::Month), Just(View::Week), Just(View::Day), Just(View::Agenda)]
}

proptest! {
    #[test]
    fn month_grid_is_whole_weeks(
        year in 1900i32..2200,
        month in 1u32..=12,
        day in 1u32..=28,
        week_starts_on in 0u8..=6,
    ) {
        let manager = manager_at(noon(year, month, day), noon(year, month, day), week_starts_on, Tz::UTC);
        let data = manager.get_view_data();
        let grid = data.as_month().unwrap();

        let total = grid.days().count();
        prop_assert!(total > 0);
        prop_assert_eq!(total % 7, 0);
        prop_assert!((4..=6).contains(&grid.weeks.len()));
        prop_assert!(grid.weeks.iter().all(|week| week.len() == 7));
        let weeks_start_on_configured_day = grid.weeks.iter().all(|week| {
            week[0].date.weekday().num_days_from_sunday() == u32::from(week_starts_on)
        });
        prop_assert!(weeks_start_on_configured_day);

        let first = NaiveDate::from_ymd_opt(year, month, 1).unwrap();
        prop_assert!(grid.day(first).is_some_and(|cell| cell.is_current_month));
    }

    #[test]
    fn one_today_cell_only_in_the_real_month(
        year in 1990i32..2100,
        month in 1u32..=12,
        day in 1u32..=28,
        offset_months in -3i32..=3,
        week_starts_on in 0u8..=6,
    ) {
        let now = noon(year, month, day);
        let index = year * 12 + month as i32 - 1 + offset_months;
        let shown = noon(index.div_euclid(12), index.rem_euclid(12) as u32 + 1, 15);

        let manager = manager_at(shown, now, week_starts_on, Tz::UTC);
        let data = manager.get_view_data();
        let grid = data.as_month().unwrap();

        // Leading and trailing cells belong to the neighbouring months and are
        // flagged too when today falls on one of them (see DESIGN.md, "Exactly
        // one today"), so only current-month cells are counted.
        let today_in_month = grid.days().filter(|d| d.is_today && d.is_current_month).count();
        let expected = usize::from(offset_months == 0);
        prop_assert_eq!(today_in_month, expected);
        prop_assert!(grid.days().filter(|d| d.is_today).count() <= 1);
    }

    #[test]
    fn next_then_previous_restores_the_date(
        year in 1900i32..2200,
        month in 1u32..=12,
        day in 1u32..=31,
        view in view_strategy(),
        zone in 0usize..ZONES.len(),
    ) {
        let day = day.min(forcecal_core::date::days_in_month(year, month).unwrap());
        let start = noon(year, month, day);
        let manager = manager_at(start, start, 0, ZONES[zone]);
        manager.set_view(view).unwrap();

        manager.next().unwrap();
        manager.previous().unwrap();
        prop_assert_eq!(manager.get_state().current_date, start);

        manager.previous().unwrap();
        manager.next().unwrap();
        prop_assert_eq!(manager.get_state().current_date, start);
    }

    #[test]
    fn round_trip_holds_around_dst_changes(
        date in prop::sample::select(DST_NEIGHBOURS.to_vec()),
        hour in 0u32..24,
        minute in prop::sample::select(vec![0u32, 30]),
        view in view_strategy(),
        zone in prop::sample::select(vec![chrono_tz::America::New_York, chrono_tz::Europe::Berlin]),
        forward_first in any::<bool>(),
    ) {
        let (year, month, day) = date;
        let start = Utc.with_ymd_and_hms(year, month, day, hour, minute, 0).unwrap();
        let manager = manager_at(start, start, 0, zone);
        manager.set_view(view).unwrap();

        if forward_first {
            manager.next().unwrap();
            manager.previous().unwrap();
        } else {
            manager.previous().unwrap();
            manager.next().unwrap();
        }
        prop_assert_eq!(manager.get_state().current_date, start);
    }

    #[test]
    fn add_then_delete_restores_events(
        existing in prop::collection::vec((0u32..24, 1i64..180), 0..8),
        hour in 0u32..24,
    ) {
        let start = noon(2025, 1, 15);
        let manager = manager_at(start, start, 0, Tz::UTC);
        for (i, (h, minutes)) in existing.iter().enumerate() {
            let from = Utc.with_ymd_and_hms(2025, 1, 15, *h, 0, 0).unwrap();
            let event = CalendarEvent::new(format!("e{i}"), from, from + chrono::Duration::minutes(*minutes))
                .with_id(format!("e{i}"));
            manager.add_event(event).unwrap();
        }
        let before = manager.get_events();

        let extra = CalendarEvent::starting_at("extra", Utc.with_ymd_and_hms(2025, 1, 16, hour, 0, 0).unwrap())
            .with_id("extra");
        manager.add_event(extra).unwrap();
        prop_assert!(manager.delete_event("extra").unwrap().is_some());

        prop_assert_eq!(manager.get_events(), before);
    }

    #[test]
    fn each_unsubscribe_removes_exactly_one_listener(subscribers in 1usize..8, removed in 0usize..8) {
        let start = noon(2025, 1, 15);
        let manager = manager_at(start, start, 0, Tz::UTC);
        let calls = Rc::new(Cell::new(0usize));

        let mut subscriptions: Vec<_> = (0..subscribers)
            .map(|_| {
                let calls = calls.clone();
                manager.subscribe(move |_, _| calls.set(calls.get() + 1))
            })
            .collect();

        let removed = removed.min(subscribers);
        for subscription in subscriptions.drain(..removed) {
            prop_assert!(subscription.unsubscribe());
        }

        manager.set_loading(true).unwrap();
        prop_assert_eq!(manager.listener_count(), subscribers - removed);
        prop_assert_eq!(calls.get(), subscribers - removed);
    }
}
