//! The state manager: single owner of calendar state and events.
//!
//! Every change goes through a method here. A mutation either fails without
//! touching anything, or it publishes a new [`CalendarState`] snapshot,
//! drops the cached view model, and synchronously calls every subscribed
//! listener with `(new, old)` before returning.
//!
//! Listeners run with no internal borrow held, so a listener that owns an
//! `Rc<StateManager>` (or a `Weak`) may call back into the manager. Such a
//! nested mutation notifies all listeners again before the outer dispatch
//! continues. Listeners must not re-trigger the mutation that invoked them
//! unconditionally.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{Value, json};
use tracing::{debug, trace, warn};

use crate::bus::{EventBus, topics};
use crate::clock::{Clock, SystemClock};
use crate::config::CalendarConfig;
use crate::date::{IntoInstant, calendar_day};
use crate::date_range::DateRange;
use crate::error::{CalendarError, CalendarResult};
use crate::event::{CalendarEvent, EventPatch};
use crate::state::CalendarState;
use crate::store::EventStore;
use crate::view::{IntoView, View};
use crate::view_model::{self, ViewData};

type Listener = Rc<dyn Fn(&CalendarState, &CalendarState)>;

#[derive(Default)]
struct Listeners {
    entries: Vec<(u64, Listener)>,
    next_id: u64,
}

impl Listeners {
    fn contains(&self, id: u64) -> bool {
        self.entries.iter().any(|(existing, _)| *existing == id)
    }
}

/// Registration handle returned by [`StateManager::subscribe`].
///
/// Dropping the handle does not unsubscribe; call
/// [`unsubscribe`](Self::unsubscribe).
pub struct Subscription {
    id: u64,
    listeners: Weak<RefCell<Listeners>>,
}

impl Subscription {
    /// Remove this registration. Returns false if it was already gone (for
    /// example after `destroy()`).
    pub fn unsubscribe(self) -> bool {
        let Some(listeners) = self.listeners.upgrade() else {
            return false;
        };
        let mut listeners = listeners.borrow_mut();
        let before = listeners.entries.len();
        listeners.entries.retain(|(id, _)| *id != self.id);
        listeners.entries.len() != before
    }

    pub fn is_active(&self) -> bool {
        self.listeners
            .upgrade()
            .is_some_and(|listeners| listeners.borrow().contains(self.id))
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

struct CachedView {
    revision: u64,
    today: NaiveDate,
    data: Rc<ViewData>,
}

pub struct StateManager {
    state: RefCell<Rc<CalendarState>>,
    store: RefCell<EventStore>,
    listeners: Rc<RefCell<Listeners>>,
    clock: Box<dyn Clock>,
    bus: Option<Rc<EventBus>>,
    view_cache: RefCell<Option<CachedView>>,
    destroyed: Cell<bool>,
}

impl StateManager {
    /// Manager starting at the current instant in the config's default view.
    pub fn new(config: CalendarConfig) -> CalendarResult<Self> {
        Self::builder(config).build()
    }

    pub fn builder(config: CalendarConfig) -> StateManagerBuilder {
        StateManagerBuilder {
            config,
            view: None,
            date: None,
            clock: None,
            bus: None,
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub fn get_state(&self) -> Rc<CalendarState> {
        self.state.borrow().clone()
    }

    pub fn get_view(&self) -> View {
        self.state.borrow().view
    }

    pub fn config(&self) -> Rc<CalendarConfig> {
        self.state.borrow().config.clone()
    }

    /// View model for the current state, rebuilt after any mutation or when
    /// the present day changes.
    pub fn get_view_data(&self) -> Rc<ViewData> {
        let state = self.get_state();
        let today = calendar_day(&self.clock.now(), state.time_zone());

        if let Some(cached) = self.view_cache.borrow().as_ref() {
            if cached.revision == state.revision && cached.today == today {
                return cached.data.clone();
            }
        }

        let data = Rc::new(view_model::build(&self.store.borrow(), &state, today));
        *self.view_cache.borrow_mut() = Some(CachedView {
            revision: state.revision,
            today,
            data: data.clone(),
        });
        data
    }

    /// Calendar days the current view shows.
    pub fn visible_range(&self) -> DateRange {
        view_model::visible_range(&self.get_state())
    }

    pub fn get_events(&self) -> Vec<CalendarEvent> {
        self.store.borrow().all()
    }

    pub fn get_event(&self, id: &str) -> Option<CalendarEvent> {
        self.store.borrow().get(id).cloned()
    }

    /// Events starting within `[start, end]`.
    pub fn get_events_between(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<CalendarEvent> {
        self.store.borrow().between(start, end)
    }

    /// Events starting on `date` in the configured zone.
    pub fn get_events_for_date(&self, date: NaiveDate) -> Vec<CalendarEvent> {
        let tz = self.state.borrow().time_zone();
        self.store.borrow().for_date(date, tz)
    }

    pub fn event_count(&self) -> usize {
        self.store.borrow().len()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    // =========================================================================
    // Event mutations
    // =========================================================================

    pub fn add_event(&self, event: CalendarEvent) -> CalendarResult<()> {
        self.ensure_active("add_event")?;

        if let Err(err) = self.store.borrow_mut().add(event.clone()) {
            return self.reject("add_event", err);
        }

        debug!(id = %event.id, "event added");
        self.commit(|state| refresh_selected(state, &event));
        self.publish(topics::EVENT_ADDED, json!({ "event": event }));
        Ok(())
    }

    /// Merge `patch` into an existing event and return the result.
    pub fn update_event(&self, id: &str, patch: EventPatch) -> CalendarResult<CalendarEvent> {
        self.ensure_active("update_event")?;

        let updated = match self.store.borrow_mut().update(id, &patch) {
            Ok(updated) => updated,
            Err(err) => return self.reject("update_event", err),
        };

        debug!(id, "event updated");
        self.commit(|state| refresh_selected(state, &updated));
        self.publish(topics::EVENT_UPDATED, json!({ "event": updated, "changes": patch }));
        Ok(updated)
    }

    /// Delete an event. Unknown ids are a no-op and notify nobody.
    pub fn delete_event(&self, id: &str) -> CalendarResult<Option<CalendarEvent>> {
        self.ensure_active("delete_event")?;

        let removed = self.store.borrow_mut().remove(id);
        let Some(removed) = removed else {
            trace!(id, "delete of unknown event ignored");
            return Ok(None);
        };

        debug!(id, "event deleted");
        self.commit(|state| {
            if state.selected_event.as_ref().is_some_and(|e| e.id == id) {
                state.selected_event = None;
            }
        });
        self.publish(topics::EVENT_DELETED, json!({ "eventId": id }));
        Ok(Some(removed))
    }

    // =========================================================================
    // View and navigation
    // =========================================================================

    pub fn set_view(&self, view: impl IntoView) -> CalendarResult<()> {
        self.ensure_active("set_view")?;

        let view = match view.into_view() {
            Ok(view) => view,
            Err(err) => return self.reject("set_view", err),
        };

        let previous = self.get_view();
        debug!(from = %previous, to = %view, "view changed");
        self.commit(|state| state.view = view);
        self.publish(
            topics::VIEW_CHANGED,
            json!({ "view": view, "previousView": previous }),
        );
        Ok(())
    }

    pub fn set_date(&self, date: impl IntoInstant) -> CalendarResult<()> {
        self.ensure_active("set_date")?;

        let date = match date.into_instant(self.config().time_zone) {
            Ok(date) => date,
            Err(err) => return self.reject("set_date", err),
        };

        debug!(%date, "date changed");
        self.commit(|state| state.jump_to(date));
        self.publish(topics::DATE_CHANGED, json!({ "date": date }));
        Ok(())
    }

    /// Advance one month, week, or day depending on the view. No-op in agenda.
    pub fn next(&self) -> CalendarResult<()> {
        self.navigate(1, topics::NAVIGATION_NEXT)
    }

    /// Go back one month, week, or day depending on the view. No-op in agenda.
    pub fn previous(&self) -> CalendarResult<()> {
        self.navigate(-1, topics::NAVIGATION_PREVIOUS)
    }

    fn navigate(&self, step: i32, topic: &str) -> CalendarResult<()> {
        self.ensure_active("navigate")?;

        let state = self.get_state();
        if !state.view.is_navigable() {
            trace!(view = %state.view, "view has no navigation unit");
            return Ok(());
        }

        let tz = state.time_zone();
        let stepped = match state.view {
            View::Month => state.anchor.add_months(step),
            View::Week => state.anchor.add_days(7 * i64::from(step)),
            _ => state.anchor.add_days(i64::from(step)),
        };
        let resolved = stepped.and_then(|anchor| anchor.resolve(tz).map(|target| (anchor, target)));
        let (anchor, target) = match resolved {
            Ok(resolved) => resolved,
            Err(err) => return self.reject("navigate", err),
        };

        debug!(view = %state.view, step, date = %target, "navigated");
        self.commit(|state| state.step_to(anchor, target));
        self.publish(topic, json!({ "date": target, "view": state.view }));
        Ok(())
    }

    /// Jump to the present instant and clear both selections.
    pub fn today(&self) -> CalendarResult<()> {
        self.ensure_active("today")?;

        let now = self.clock.now();
        debug!(date = %now, "navigated to today");
        self.commit(|state| {
            state.jump_to(now);
            state.selected_date = None;
            state.selected_event = None;
        });
        self.publish(topics::NAVIGATION_TODAY, json!({ "date": now }));
        Ok(())
    }

    // =========================================================================
    // Selection and status
    // =========================================================================

    pub fn select_date(&self, date: impl IntoInstant) -> CalendarResult<()> {
        self.ensure_active("select_date")?;

        let date = match date.into_instant(self.config().time_zone) {
            Ok(date) => date,
            Err(err) => return self.reject("select_date", err),
        };

        debug!(%date, "date selected");
        self.commit(|state| state.selected_date = Some(date));
        self.publish(topics::DATE_SELECTED, json!({ "date": date }));
        Ok(())
    }

    /// Select a stored event by id.
    pub fn select_event(&self, id: &str) -> CalendarResult<()> {
        self.ensure_active("select_event")?;

        let Some(event) = self.get_event(id) else {
            return self.reject("select_event", CalendarError::EventNotFound(id.to_string()));
        };

        debug!(id, "event selected");
        self.commit(|state| state.selected_event = Some(event.clone()));
        self.publish(topics::EVENT_SELECTED, json!({ "event": event }));
        Ok(())
    }

    pub fn clear_selected_date(&self) -> CalendarResult<()> {
        self.ensure_active("clear_selected_date")?;
        self.commit(|state| state.selected_date = None);
        Ok(())
    }

    pub fn clear_selected_event(&self) -> CalendarResult<()> {
        self.ensure_active("clear_selected_event")?;
        self.commit(|state| state.selected_event = None);
        Ok(())
    }

    pub fn set_loading(&self, loading: bool) -> CalendarResult<()> {
        self.ensure_active("set_loading")?;
        self.commit(|state| state.loading = loading);
        Ok(())
    }

    /// Record (or clear, with `None`) an error for renderers to display.
    pub fn set_error(&self, error: Option<CalendarError>) -> CalendarResult<()> {
        self.ensure_active("set_error")?;
        self.commit(|state| state.error = error);
        Ok(())
    }

    // =========================================================================
    // Subscriptions and lifecycle
    // =========================================================================

    /// Register `listener(new_state, old_state)`, called after every accepted
    /// mutation in registration order.
    pub fn subscribe(
        &self,
        listener: impl Fn(&CalendarState, &CalendarState) + 'static,
    ) -> Subscription {
        if self.is_destroyed() {
            warn!("subscribe called after destroy; listener will never run");
            return Subscription {
                id: 0,
                listeners: Weak::new(),
            };
        }

        let mut listeners = self.listeners.borrow_mut();
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.push((id, Rc::new(listener)));
        trace!(id, total = listeners.entries.len(), "listener subscribed");

        Subscription {
            id,
            listeners: Rc::downgrade(&self.listeners),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().entries.len()
    }

    /// Drop all listeners and events, and clear the injected bus. Every later
    /// mutation fails with [`CalendarError::Disposed`].
    pub fn destroy(&self) {
        if self.destroyed.replace(true) {
            return;
        }

        self.listeners.borrow_mut().entries.clear();
        self.store.borrow_mut().clear();
        self.view_cache.borrow_mut().take();
        if let Some(bus) = &self.bus {
            bus.clear();
        }
        debug!("state manager destroyed");
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn ensure_active(&self, operation: &'static str) -> CalendarResult<()> {
        if self.is_destroyed() {
            return self.reject(operation, CalendarError::Disposed);
        }
        Ok(())
    }

    fn reject<T>(&self, operation: &'static str, err: CalendarError) -> CalendarResult<T> {
        warn!(operation, error = %err, "mutation rejected");
        Err(err)
    }

    /// Publish a new snapshot derived from the current one, then notify.
    fn commit(&self, update: impl FnOnce(&mut CalendarState)) {
        let (old, new) = {
            let mut slot = self.state.borrow_mut();
            let old = slot.clone();
            let mut next = CalendarState::clone(&old);
            update(&mut next);
            next.revision = old.revision + 1;

            let new = Rc::new(next);
            *slot = new.clone();
            (old, new)
        };

        self.view_cache.borrow_mut().take();
        self.notify(&new, &old);
    }

    fn notify(&self, new: &CalendarState, old: &CalendarState) {
        let listeners: Vec<(u64, Listener)> = self.listeners.borrow().entries.clone();
        trace!(revision = new.revision, listeners = listeners.len(), "notifying listeners");

        for (id, listener) in listeners {
            // Skip listeners removed by an earlier listener in this round.
            if self.listeners.borrow().contains(id) {
                listener(new, old);
            }
        }
    }

    fn publish(&self, topic: &str, payload: Value) {
        if let Some(bus) = &self.bus {
            bus.emit(topic, &payload);
        }
    }
}

/// Keep the selected-event snapshot in step with the store.
fn refresh_selected(state: &mut CalendarState, event: &CalendarEvent) {
    if state.selected_event.as_ref().is_some_and(|e| e.id == event.id) {
        state.selected_event = Some(event.clone());
    }
}

impl fmt::Debug for StateManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateManager")
            .field("state", &self.state.borrow())
            .field("events", &self.event_count())
            .field("listeners", &self.listener_count())
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

pub struct StateManagerBuilder {
    config: CalendarConfig,
    view: Option<CalendarResult<View>>,
    date: Option<CalendarResult<DateTime<Utc>>>,
    clock: Option<Box<dyn Clock>>,
    bus: Option<Rc<EventBus>>,
}

impl StateManagerBuilder {
    /// Initial view, overriding `config.default_view`.
    pub fn view(mut self, view: impl IntoView) -> Self {
        self.view = Some(view.into_view());
        self
    }

    /// Initial current date; defaults to the clock's now.
    pub fn date(mut self, date: impl IntoInstant) -> Self {
        self.date = Some(date.into_instant(self.config.time_zone));
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    /// Bus to publish navigation, view, selection and event signals on.
    pub fn bus(mut self, bus: Rc<EventBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn build(self) -> CalendarResult<StateManager> {
        let mut config = self.config;
        if let Some(view) = self.view {
            config.default_view = view?;
        }
        config.validate()?;

        let clock = self.clock.unwrap_or_else(|| Box::new(SystemClock));
        let current_date = match self.date {
            Some(date) => date?,
            None => clock.now(),
        };

        let state = CalendarState::new(Rc::new(config), current_date);
        debug!(
            view = %state.view,
            date = %state.current_date,
            time_zone = state.config.time_zone_name(),
            week_starts_on = state.config.week_starts_on,
            "state manager created"
        );

        Ok(StateManager {
            state: RefCell::new(Rc::new(state)),
            store: RefCell::new(EventStore::new()),
            listeners: Rc::new(RefCell::new(Listeners::default())),
            clock,
            bus: self.bus,
            view_cache: RefCell::new(None),
            destroyed: Cell::new(false),
        })
    }
}
