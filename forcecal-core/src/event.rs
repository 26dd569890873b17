//! Event records held by the store.
//!
//! These are plain values: the event form (or any other caller) builds one,
//! hands it to the [`StateManager`](crate::manager::StateManager), and the
//! store owns it from then on.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{DEFAULT_EVENT_MINUTES, UNTITLED_EVENT};
use crate::error::{CalendarError, CalendarResult};

/// A timed calendar event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub all_day: bool,

    // Display hints, passed through to renderers untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
}

impl CalendarEvent {
    /// New event with a generated id.
    pub fn new(title: impl Into<String>, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        let title = title.into();
        CalendarEvent {
            id: Uuid::new_v4().to_string(),
            title: if title.trim().is_empty() {
                UNTITLED_EVENT.to_string()
            } else {
                title
            },
            start,
            end,
            all_day: false,
            background_color: None,
            text_color: None,
        }
    }

    /// New event lasting the default duration (one hour).
    pub fn starting_at(title: impl Into<String>, start: DateTime<Utc>) -> Self {
        Self::new(title, start, start + Duration::minutes(DEFAULT_EVENT_MINUTES))
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn all_day(mut self) -> Self {
        self.all_day = true;
        self
    }

    pub fn with_background_color(mut self, color: impl Into<String>) -> Self {
        self.background_color = Some(color.into());
        self
    }

    pub fn with_text_color(mut self, color: impl Into<String>) -> Self {
        self.text_color = Some(color.into());
        self
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Check the record invariants: non-empty id and `start <= end`.
    pub fn validate(&self) -> CalendarResult<()> {
        if self.id.trim().is_empty() {
            return Err(CalendarError::InvalidEvent("event id must not be empty".into()));
        }
        if self.start > self.end {
            return Err(CalendarError::InvalidEvent(format!(
                "'{}' ends ({}) before it starts ({})",
                self.id, self.end, self.start
            )));
        }
        Ok(())
    }

    /// Apply `patch` and return the merged event. `self` is untouched.
    pub fn patched(&self, patch: &EventPatch) -> CalendarEvent {
        let mut merged = self.clone();
        if let Some(title) = &patch.title {
            merged.title = title.clone();
        }
        if let Some(start) = patch.start {
            merged.start = start;
        }
        if let Some(end) = patch.end {
            merged.end = end;
        }
        if let Some(all_day) = patch.all_day {
            merged.all_day = all_day;
        }
        if let Some(background_color) = &patch.background_color {
            merged.background_color = background_color.clone();
        }
        if let Some(text_color) = &patch.text_color {
            merged.text_color = text_color.clone();
        }
        merged
    }
}

/// A partial update for [`CalendarEvent`]. `None` leaves a field alone.
///
/// The colour hints are doubly optional: `Some(None)` clears the hint.
/// The id can't be patched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventPatch {
    pub title: Option<String>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub all_day: Option<bool>,
    pub background_color: Option<Option<String>>,
    pub text_color: Option<Option<String>>,
}

impl EventPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn start(mut self, start: DateTime<Utc>) -> Self {
        self.start = Some(start);
        self
    }

    pub fn end(mut self, end: DateTime<Utc>) -> Self {
        self.end = Some(end);
        self
    }

    /// Set both bounds at once.
    pub fn times(self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.start(start).end(end)
    }

    pub fn all_day(mut self, all_day: bool) -> Self {
        self.all_day = Some(all_day);
        self
    }

    pub fn background_color(mut self, color: Option<String>) -> Self {
        self.background_color = Some(color);
        self
    }

    pub fn text_color(mut self, color: Option<String>) -> Self {
        self.text_color = Some(color);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == EventPatch::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, h, m, 0).unwrap()
    }

    #[test]
    fn new_generates_distinct_ids_and_default_title() {
        let a = CalendarEvent::new("", at(9, 0), at(10, 0));
        let b = CalendarEvent::new("Standup", at(9, 0), at(10, 0));
        assert_ne!(a.id, b.id);
        assert_eq!(a.title, UNTITLED_EVENT);
        assert_eq!(b.title, "Standup");
    }

    #[test]
    fn starting_at_lasts_one_hour() {
        let event = CalendarEvent::starting_at("Review", at(14, 0));
        assert_eq!(event.end, at(15, 0));
        assert_eq!(event.duration(), Duration::hours(1));
    }

    #[test]
    fn validate_rejects_inverted_ranges_and_blank_ids() {
        let inverted = CalendarEvent::new("Oops", at(10, 0), at(9, 0));
        assert!(matches!(inverted.validate(), Err(CalendarError::InvalidEvent(_))));

        let blank = CalendarEvent::new("Blank", at(9, 0), at(9, 0)).with_id(" ");
        assert!(blank.validate().is_err());

        let instant = CalendarEvent::new("Instant", at(9, 0), at(9, 0));
        assert!(instant.validate().is_ok());
    }

    #[test]
    fn patch_merges_only_given_fields() {
        let event = CalendarEvent::new("Standup", at(9, 0), at(9, 30))
            .with_id("e1")
            .with_background_color("#1a73e8");

        let patch = EventPatch::new().title("Daily").background_color(None);
        let merged = event.patched(&patch);

        assert_eq!(merged.id, "e1");
        assert_eq!(merged.title, "Daily");
        assert_eq!(merged.start, at(9, 0));
        assert_eq!(merged.background_color, None);
        assert_eq!(event.title, "Standup");
        assert!(EventPatch::new().is_empty());
        assert!(!patch.is_empty());
    }

    #[test]
    fn serializes_with_widget_field_names() {
        let event = CalendarEvent::new("Standup", at(9, 0), at(9, 30))
            .with_id("e1")
            .all_day()
            .with_text_color("#fff");
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["allDay"], true);
        assert_eq!(json["textColor"], "#fff");
        assert!(json.get("backgroundColor").is_none());

        let back: CalendarEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
