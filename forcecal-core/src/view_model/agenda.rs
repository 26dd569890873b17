use chrono::NaiveDate;
use serde::Serialize;

use super::events_by_day;
use crate::date_range::DateRange;
use crate::event::CalendarEvent;
use crate::state::CalendarState;
use crate::store::EventStore;

/// Every event, flat and grouped by day.
///
/// `events` is ordered by start, all-day first on ties. Each day in `days`
/// uses display order instead: all-day events first, then by start.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgendaList {
    pub events: Vec<CalendarEvent>,
    pub days: Vec<AgendaDay>,
}

impl AgendaList {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgendaDay {
    pub date: NaiveDate,
    pub is_today: bool,
    pub events: Vec<CalendarEvent>,
}

pub(super) fn build(store: &EventStore, state: &CalendarState, today: NaiveDate) -> AgendaList {
    let days: Vec<AgendaDay> = events_by_day(store, DateRange::unbounded(), state.time_zone())
        .into_iter()
        .map(|(date, events)| AgendaDay {
            date,
            is_today: date == today,
            events,
        })
        .collect();

    let mut events: Vec<CalendarEvent> =
        days.iter().flat_map(|day| day.events.iter().cloned()).collect();
    events.sort_by(|a, b| a.start.cmp(&b.start).then(b.all_day.cmp(&a.all_day)));

    AgendaList { events, days }
}
