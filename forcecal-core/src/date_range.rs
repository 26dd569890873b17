//! Range of calendar days shown by a view.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;

use crate::date::IntoInstant;
use crate::error::CalendarResult;

/// Inclusive range of calendar days.
/// None values mean unbounded in that direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        DateRange {
            from: Some(from),
            to: Some(to),
        }
    }

    pub fn unbounded() -> Self {
        DateRange { from: None, to: None }
    }

    pub fn is_bounded(&self) -> bool {
        self.from.is_some() && self.to.is_some()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.is_none_or(|from| date >= from) && self.to.is_none_or(|to| date <= to)
    }

    /// Number of days in a bounded range.
    pub fn num_days(&self) -> Option<i64> {
        match (self.from, self.to) {
            (Some(from), Some(to)) => Some((to - from).num_days() + 1),
            _ => None,
        }
    }

    /// First instant of `from` in `tz`, or None if unbounded.
    pub fn start_instant(&self, tz: Tz) -> CalendarResult<Option<DateTime<Utc>>> {
        self.from.map(|from| from.into_instant(tz)).transpose()
    }

    /// Last instant of `to` in `tz` (one nanosecond before the next day), or
    /// None if unbounded.
    pub fn end_instant(&self, tz: Tz) -> CalendarResult<Option<DateTime<Utc>>> {
        self.to
            .map(|to| {
                let next_midnight = (to + Duration::days(1)).and_time(NaiveTime::MIN);
                next_midnight
                    .into_instant(tz)
                    .map(|instant| instant - Duration::nanoseconds(1))
            })
            .transpose()
    }
}
