//! Instant parsing and calendar arithmetic.
//!
//! Instants are always `DateTime<Utc>`. Calendar questions ("which day is
//! this?", "move one month forward") are answered on the wall-clock time in
//! the configured zone and converted back to UTC.

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, NaiveTime,
    Offset, TimeZone, Utc, Weekday,
};
use chrono_tz::Tz;

use crate::constants::{MAX_YEAR, MIN_YEAR};
use crate::error::{CalendarError, CalendarResult};

const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Values that can be turned into an instant.
///
/// Inputs without an offset (naive dates and times, strings without a zone)
/// are read as wall-clock time in `tz`.
pub trait IntoInstant {
    fn into_instant(self, tz: Tz) -> CalendarResult<DateTime<Utc>>;
}

impl<Z: TimeZone> IntoInstant for DateTime<Z> {
    fn into_instant(self, _tz: Tz) -> CalendarResult<DateTime<Utc>> {
        ensure_supported(self.with_timezone(&Utc))
    }
}

impl IntoInstant for NaiveDateTime {
    fn into_instant(self, tz: Tz) -> CalendarResult<DateTime<Utc>> {
        let instant = resolve_local(self, tz, None).ok_or_else(|| {
            CalendarError::InvalidDate(format!("{} does not exist in {}", self, tz.name()))
        })?;
        ensure_supported(instant)
    }
}

impl IntoInstant for NaiveDate {
    fn into_instant(self, tz: Tz) -> CalendarResult<DateTime<Utc>> {
        let midnight = self.and_time(NaiveTime::MIN);
        // Zones that skip midnight on a DST change start the day an hour later.
        let instant = resolve_local(midnight, tz, None)
            .or_else(|| resolve_local(midnight + Duration::hours(1), tz, None))
            .ok_or_else(|| {
                CalendarError::InvalidDate(format!("{} has no midnight in {}", self, tz.name()))
            })?;
        ensure_supported(instant)
    }
}

impl IntoInstant for &str {
    fn into_instant(self, tz: Tz) -> CalendarResult<DateTime<Utc>> {
        parse_instant(self, tz)
    }
}

impl IntoInstant for String {
    fn into_instant(self, tz: Tz) -> CalendarResult<DateTime<Utc>> {
        parse_instant(&self, tz)
    }
}

impl IntoInstant for &String {
    fn into_instant(self, tz: Tz) -> CalendarResult<DateTime<Utc>> {
        parse_instant(self, tz)
    }
}

/// Parse RFC 3339, `YYYY-MM-DDTHH:MM[:SS]` or `YYYY-MM-DD`.
pub fn parse_instant(s: &str, tz: Tz) -> CalendarResult<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.into_instant(tz);
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return naive.into_instant(tz);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date.into_instant(tz);
    }

    Err(CalendarError::InvalidDate(format!(
        "'{}'. Expected RFC 3339, YYYY-MM-DD or YYYY-MM-DDTHH:MM",
        s
    )))
}

fn ensure_supported(instant: DateTime<Utc>) -> CalendarResult<DateTime<Utc>> {
    let year = instant.year();
    if (MIN_YEAR..=MAX_YEAR).contains(&year) {
        Ok(instant)
    } else {
        Err(CalendarError::InvalidDate(format!(
            "year {} is outside {}..={}",
            year, MIN_YEAR, MAX_YEAR
        )))
    }
}

/// The calendar day `instant` falls on in `tz`.
pub fn calendar_day(instant: &DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// Map local wall-clock time to an instant.
///
/// A repeated hour (DST fall-back) resolves to the instant whose UTC offset is
/// `offset`, or the earlier one. Skipped hours yield `None`.
fn resolve_local(
    naive: NaiveDateTime,
    tz: Tz,
    offset: Option<FixedOffset>,
) -> Option<DateTime<Utc>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(early, late) => {
            let pick = if offset == Some(late.offset().fix()) { late } else { early };
            Some(pick.with_timezone(&Utc))
        }
        LocalResult::None => None,
    }
}

/// Wall-clock position that navigation steps from.
///
/// Steps move the intended local date and time rather than the resolved
/// instant, so a step that lands in a DST gap or overlap can be undone
/// exactly by the opposite step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavAnchor {
    /// Intended local date and time, which may not exist in the zone.
    pub local: NaiveDateTime,
    /// UTC offset at the last explicit jump; picks the side of a repeated hour.
    pub offset: FixedOffset,
    /// Day of month that month steps aim for.
    pub day: u32,
}

impl NavAnchor {
    pub fn at(instant: &DateTime<Utc>, tz: Tz) -> Self {
        let zoned = instant.with_timezone(&tz);
        NavAnchor {
            local: zoned.naive_local(),
            offset: zoned.offset().fix(),
            day: zoned.day(),
        }
    }

    /// Move by whole calendar days. The day-of-month target follows.
    pub fn add_days(&self, days: i64) -> CalendarResult<Self> {
        let local = self
            .local
            .checked_add_signed(Duration::days(days))
            .ok_or_else(|| CalendarError::InvalidDate(format!("{} + {} days overflows", self.local, days)))?;
        Ok(NavAnchor {
            local,
            day: local.day(),
            ..*self
        })
    }

    /// Move by whole calendar months, clamping the target day to the month.
    pub fn add_months(&self, months: i32) -> CalendarResult<Self> {
        let (year, month) = shift_year_month(self.local.year(), self.local.month(), months);
        let last_day = days_in_month(year, month)
            .ok_or_else(|| CalendarError::InvalidDate(format!("{}-{:02} is out of range", year, month)))?;
        let date = NaiveDate::from_ymd_opt(year, month, self.day.clamp(1, last_day))
            .ok_or_else(|| CalendarError::InvalidDate(format!("{}-{:02}-{:02}", year, month, self.day)))?;
        Ok(NavAnchor {
            local: date.and_time(self.local.time()),
            ..*self
        })
    }

    /// The instant this position shows. A time inside a DST gap moves forward
    /// by the usual one-hour shift.
    pub fn resolve(&self, tz: Tz) -> CalendarResult<DateTime<Utc>> {
        let instant = resolve_local(self.local, tz, Some(self.offset))
            .or_else(|| resolve_local(self.local + Duration::hours(1), tz, Some(self.offset)))
            .ok_or_else(|| {
                CalendarError::InvalidDate(format!("{} does not exist in {}", self.local, tz.name()))
            })?;
        ensure_supported(instant)
    }
}

fn shift_year_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let index = year * 12 + (month as i32 - 1) + delta;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let (next_year, next_month) = shift_year_month(year, month, 1);
    let next_first = NaiveDate::from_ymd_opt(next_year, next_month, 1)?;
    Some(next_first.signed_duration_since(first).num_days() as u32)
}

pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn last_of_month(date: NaiveDate) -> NaiveDate {
    days_in_month(date.year(), date.month())
        .and_then(|last| date.with_day(last))
        .unwrap_or(date)
}

/// Weekday for a 0–6 index, 0 = Sunday.
pub fn weekday_from_index(index: u8) -> Weekday {
    match index % 7 {
        0 => Weekday::Sun,
        1 => Weekday::Mon,
        2 => Weekday::Tue,
        3 => Weekday::Wed,
        4 => Weekday::Thu,
        5 => Weekday::Fri,
        _ => Weekday::Sat,
    }
}

/// Latest day on or before `date` whose weekday index is `week_starts_on`.
pub fn start_of_week(date: NaiveDate, week_starts_on: u8) -> NaiveDate {
    let back = (date.weekday().num_days_from_sunday() + 7 - u32::from(week_starts_on % 7)) % 7;
    date - Duration::days(i64::from(back))
}

/// Earliest day on or after `date` that closes a week started on `week_starts_on`.
pub fn end_of_week(date: NaiveDate, week_starts_on: u8) -> NaiveDate {
    start_of_week(date, week_starts_on) + Duration::days(6)
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}
