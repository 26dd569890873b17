//! In-memory event collection.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use indexmap::IndexMap;

use crate::date::calendar_day;
use crate::error::{CalendarError, CalendarResult};
use crate::event::{CalendarEvent, EventPatch};

/// Events keyed by id, iterated in insertion order.
#[derive(Debug, Clone, Default)]
pub struct EventStore {
    events: IndexMap<String, CalendarEvent>,
}

impl EventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `event`. An event with the same id is replaced in place.
    pub fn add(&mut self, event: CalendarEvent) -> CalendarResult<()> {
        event.validate()?;
        self.events.insert(event.id.clone(), event);
        Ok(())
    }

    /// Merge `patch` into the event with `id` and return the updated event.
    pub fn update(&mut self, id: &str, patch: &EventPatch) -> CalendarResult<CalendarEvent> {
        let existing = self
            .events
            .get_mut(id)
            .ok_or_else(|| CalendarError::EventNotFound(id.to_string()))?;

        let merged = existing.patched(patch);
        merged.validate()?;

        *existing = merged.clone();
        Ok(merged)
    }

    /// Delete the event with `id`. Absent ids are ignored.
    pub fn remove(&mut self, id: &str) -> Option<CalendarEvent> {
        self.events.shift_remove(id)
    }

    pub fn get(&self, id: &str) -> Option<&CalendarEvent> {
        self.events.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.events.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CalendarEvent> {
        self.events.values()
    }

    pub fn all(&self) -> Vec<CalendarEvent> {
        self.iter().cloned().collect()
    }

    /// Events starting within `[start, end]`, both ends inclusive.
    ///
    /// Only the start instant is considered: an event that began before
    /// `start` and is still running is not returned.
    pub fn between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<CalendarEvent> {
        self.iter()
            .filter(|event| event.start >= start && event.start <= end)
            .cloned()
            .collect()
    }

    /// Events whose start falls on `date` in `tz`.
    pub fn for_date(&self, date: NaiveDate, tz: Tz) -> Vec<CalendarEvent> {
        self.iter()
            .filter(|event| calendar_day(&event.start, tz) == date)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn event(id: &str, day: u32, hour: u32) -> CalendarEvent {
        let start = Utc.with_ymd_and_hms(2025, 1, day, hour, 0, 0).unwrap();
        CalendarEvent::starting_at(id.to_uppercase(), start).with_id(id)
    }

    fn ids(events: &[CalendarEvent]) -> Vec<&str> {
        events.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn keeps_insertion_order() {
        let mut store = EventStore::new();
        store.add(event("c", 20, 9)).unwrap();
        store.add(event("a", 10, 9)).unwrap();
        store.add(event("b", 15, 9)).unwrap();

        assert_eq!(ids(&store.all()), vec!["c", "a", "b"]);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn duplicate_id_replaces_in_place() {
        let mut store = EventStore::new();
        store.add(event("a", 10, 9)).unwrap();
        store.add(event("b", 11, 9)).unwrap();
        store.add(event("a", 12, 9).with_id("a")).unwrap();

        let all = store.all();
        assert_eq!(ids(&all), vec!["a", "b"]);
        assert_eq!(all[0].start, Utc.with_ymd_and_hms(2025, 1, 12, 9, 0, 0).unwrap());
    }

    #[test]
    fn add_rejects_invalid_events() {
        let mut store = EventStore::new();
        let mut bad = event("bad", 10, 9);
        bad.end = bad.start - chrono::Duration::minutes(1);

        assert!(matches!(store.add(bad), Err(CalendarError::InvalidEvent(_))));
        assert!(store.is_empty());
    }

    #[test]
    fn update_merges_and_reports_missing_ids() {
        let mut store = EventStore::new();
        store.add(event("a", 10, 9)).unwrap();

        let updated = store.update("a", &EventPatch::new().title("Renamed")).unwrap();
        assert_eq!(updated.title, "Renamed");
        assert_eq!(store.get("a").unwrap().title, "Renamed");

        assert_eq!(
            store.update("missing", &EventPatch::new()),
            Err(CalendarError::EventNotFound("missing".into()))
        );
    }

    #[test]
    fn invalid_update_leaves_event_untouched() {
        let mut store = EventStore::new();
        let original = event("a", 10, 9);
        store.add(original.clone()).unwrap();

        let too_early = original.start - chrono::Duration::hours(2);
        let result = store.update("a", &EventPatch::new().end(too_early));

        assert!(result.is_err());
        assert_eq!(store.get("a"), Some(&original));
    }

    #[test]
    fn remove_is_idempotent() {
        let mut store = EventStore::new();
        store.add(event("a", 10, 9)).unwrap();

        assert!(store.remove("a").is_some());
        assert!(store.remove("a").is_none());
        assert!(store.remove("never").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn remove_keeps_the_order_of_the_rest() {
        let mut store = EventStore::new();
        for (id, day) in [("a", 10), ("b", 11), ("c", 12), ("d", 13)] {
            store.add(event(id, day, 9)).unwrap();
        }

        store.remove("b").unwrap();
        store.add(event("b", 11, 9)).unwrap();
        store.remove("a").unwrap();

        assert_eq!(ids(&store.all()), vec!["c", "d", "b"]);
        assert!(!store.contains("a"));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn between_is_inclusive_on_both_ends() {
        let mut store = EventStore::new();
        store.add(event("before", 9, 23)).unwrap();
        store.add(event("first", 10, 0)).unwrap();
        store.add(event("last", 12, 0)).unwrap();
        store.add(event("after", 12, 1)).unwrap();

        let start = Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 1, 12, 0, 0, 0).unwrap();
        assert_eq!(ids(&store.between(start, end)), vec!["first", "last"]);
    }

    #[test]
    fn multi_day_events_match_only_their_start_day() {
        let mut store = EventStore::new();
        let start = Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 1, 12, 9, 0, 0).unwrap();
        store
            .add(CalendarEvent::new("Trip", start, end).with_id("trip"))
            .unwrap();

        let day = |d| NaiveDate::from_ymd_opt(2025, 1, d).unwrap();
        assert_eq!(ids(&store.for_date(day(10), Tz::UTC)), vec!["trip"]);
        assert!(store.for_date(day(11), Tz::UTC).is_empty());
    }

    #[test]
    fn for_date_uses_the_zone() {
        let mut store = EventStore::new();
        // 02:00 UTC on the 15th is still the 14th in New York.
        store.add(event("late", 15, 2)).unwrap();

        let day = |d| NaiveDate::from_ymd_opt(2025, 1, d).unwrap();
        let ny = chrono_tz::America::New_York;
        assert_eq!(ids(&store.for_date(day(14), ny)), vec!["late"]);
        assert!(store.for_date(day(15), ny).is_empty());
        assert_eq!(ids(&store.for_date(day(15), Tz::UTC)), vec!["late"]);
    }
}
