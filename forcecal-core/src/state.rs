//! Calendar state snapshots.

use std::rc::Rc;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::config::CalendarConfig;
use crate::date::{NavAnchor, calendar_day};
use crate::error::CalendarError;
use crate::event::CalendarEvent;
use crate::view::View;

/// Navigation, selection and status at one point in time.
///
/// The [`StateManager`](crate::manager::StateManager) is the only writer. It
/// never edits a published snapshot: every accepted mutation builds a new
/// value, and listeners receive both the new and the previous one.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarState {
    /// Anchors the visible period.
    pub current_date: DateTime<Utc>,
    pub view: View,
    pub selected_date: Option<DateTime<Utc>>,
    /// Copy of the selected event as it was when last selected or updated.
    pub selected_event: Option<CalendarEvent>,
    pub loading: bool,
    pub error: Option<CalendarError>,
    pub config: Rc<CalendarConfig>,

    /// Bumped by every accepted mutation, event changes included.
    pub revision: u64,

    /// Wall-clock position navigation steps from. Differs from
    /// `current_date` only after a step landed on a short month or a DST gap.
    pub(crate) anchor: NavAnchor,
}

impl CalendarState {
    pub(crate) fn new(config: Rc<CalendarConfig>, current_date: DateTime<Utc>) -> Self {
        let anchor = NavAnchor::at(&current_date, config.time_zone);
        CalendarState {
            current_date,
            view: config.default_view,
            selected_date: None,
            selected_event: None,
            loading: false,
            error: None,
            config,
            revision: 0,
            anchor,
        }
    }

    pub fn time_zone(&self) -> Tz {
        self.config.time_zone
    }

    /// Calendar day of `current_date` in the configured zone.
    pub fn current_day(&self) -> NaiveDate {
        calendar_day(&self.current_date, self.time_zone())
    }

    pub fn selected_day(&self) -> Option<NaiveDate> {
        self.selected_date
            .as_ref()
            .map(|date| calendar_day(date, self.time_zone()))
    }

    /// Day of month that month navigation aims for.
    pub fn anchor_day(&self) -> u32 {
        self.anchor.day
    }

    /// Move to `date`, resetting the navigation anchor to it.
    pub(crate) fn jump_to(&mut self, date: DateTime<Utc>) {
        self.current_date = date;
        self.anchor = NavAnchor::at(&date, self.time_zone());
    }

    /// Move to a navigation step already resolved to `date`.
    pub(crate) fn step_to(&mut self, anchor: NavAnchor, date: DateTime<Utc>) {
        self.current_date = date;
        self.anchor = anchor;
    }
}
