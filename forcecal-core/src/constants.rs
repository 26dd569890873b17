//! Shared defaults.

pub const DEFAULT_LOCALE: &str = "en-US";

/// Title given to events created without one.
pub const UNTITLED_EVENT: &str = "(No Title)";

/// Length of an event created from a start time alone.
pub const DEFAULT_EVENT_MINUTES: i64 = 60;

/// Events shown per month cell before the rest collapse into "+N more".
pub const MAX_VISIBLE_EVENTS: usize = 3;

pub const DAYS_PER_WEEK: usize = 7;
pub const HOURS_PER_DAY: u32 = 24;

/// Supported calendar years. Instants outside this window are rejected as
/// malformed dates.
pub const MIN_YEAR: i32 = 1;
pub const MAX_YEAR: i32 = 9999;
