//! View-model builder.
//!
//! Turns the event store and a state snapshot into the structure a renderer
//! draws: a month grid, a week/day time grid, or an agenda list. Building is a
//! pure function of its inputs; "today" is passed in rather than read from a
//! clock so the output is deterministic.

mod agenda;
mod month;
mod time_grid;

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use chrono_tz::Tz;
use serde::Serialize;

use crate::date::{calendar_day, end_of_week, first_of_month, last_of_month, start_of_week};
use crate::date_range::DateRange;
use crate::event::CalendarEvent;
use crate::state::CalendarState;
use crate::store::EventStore;
use crate::view::View;

pub use agenda::{AgendaDay, AgendaList};
pub use month::{MonthDay, MonthGrid};
pub use time_grid::{HourSlot, TimeGrid, TimeGridDay};

/// Renderer-ready output for the active view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "view", rename_all = "lowercase")]
pub enum ViewData {
    Month(MonthGrid),
    Week(TimeGrid),
    Day(TimeGrid),
    Agenda(AgendaList),
}

impl ViewData {
    pub fn view(&self) -> View {
        match self {
            ViewData::Month(_) => View::Month,
            ViewData::Week(_) => View::Week,
            ViewData::Day(_) => View::Day,
            ViewData::Agenda(_) => View::Agenda,
        }
    }

    pub fn range(&self) -> DateRange {
        match self {
            ViewData::Month(grid) => grid.range,
            ViewData::Week(grid) | ViewData::Day(grid) => grid.range,
            ViewData::Agenda(_) => DateRange::unbounded(),
        }
    }

    pub fn as_month(&self) -> Option<&MonthGrid> {
        match self {
            ViewData::Month(grid) => Some(grid),
            _ => None,
        }
    }

    pub fn as_time_grid(&self) -> Option<&TimeGrid> {
        match self {
            ViewData::Week(grid) | ViewData::Day(grid) => Some(grid),
            _ => None,
        }
    }

    pub fn as_agenda(&self) -> Option<&AgendaList> {
        match self {
            ViewData::Agenda(list) => Some(list),
            _ => None,
        }
    }
}

/// Build the view model for `state.view`.
pub fn build(store: &EventStore, state: &CalendarState, today: NaiveDate) -> ViewData {
    match state.view {
        View::Month => ViewData::Month(month::build(store, state, today)),
        View::Week => ViewData::Week(time_grid::build(store, state, today, visible_range(state))),
        View::Day => ViewData::Day(time_grid::build(store, state, today, visible_range(state))),
        View::Agenda => ViewData::Agenda(agenda::build(store, state, today)),
    }
}

/// Calendar days the active view puts on screen.
pub fn visible_range(state: &CalendarState) -> DateRange {
    let current = state.current_day();
    let week_starts_on = state.config.week_starts_on;

    match state.view {
        View::Month => month_range(current, week_starts_on),
        View::Week => DateRange::new(
            start_of_week(current, week_starts_on),
            end_of_week(current, week_starts_on),
        ),
        View::Day => DateRange::new(current, current),
        View::Agenda => DateRange::unbounded(),
    }
}

/// Whole weeks covering the month that contains `date`.
pub fn month_range(date: NaiveDate, week_starts_on: u8) -> DateRange {
    DateRange::new(
        start_of_week(first_of_month(date), week_starts_on),
        end_of_week(last_of_month(date), week_starts_on),
    )
}

/// All-day events first, then by start. Ties keep store order.
pub fn sort_for_display(events: &mut [CalendarEvent]) {
    events.sort_by(|a, b| b.all_day.cmp(&a.all_day).then(a.start.cmp(&b.start)));
}

/// Events grouped by the calendar day they start on, each day sorted for
/// display. Days outside `range` are dropped.
fn events_by_day(
    store: &EventStore,
    range: DateRange,
    tz: Tz,
) -> BTreeMap<NaiveDate, Vec<CalendarEvent>> {
    let mut days: BTreeMap<NaiveDate, Vec<CalendarEvent>> = BTreeMap::new();

    for event in store.iter() {
        let day = calendar_day(&event.start, tz);
        if range.contains(day) {
            days.entry(day).or_default().push(event.clone());
        }
    }

    for events in days.values_mut() {
        sort_for_display(events);
    }
    days
}

/// Every day of a bounded range, in order.
fn days_of(range: DateRange) -> Vec<NaiveDate> {
    match (range.from, range.to) {
        (Some(from), Some(to)) => {
            let count = (to - from).num_days() + 1;
            (0..count).map(|offset| from + Duration::days(offset)).collect()
        }
        _ => Vec::new(),
    }
}
