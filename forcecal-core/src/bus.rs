//! Namespaced publish/subscribe for cross-component signals.
//!
//! One bus per widget: construct it, share it as `Rc<EventBus>` with whoever
//! publishes or listens, and `clear()` it on teardown. Topics look like
//! `navigation:next`; subscriptions may use a trailing wildcard
//! (`navigation:*`) or `*` for everything.
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use forcecal_core::bus::EventBus;
//! use serde_json::json;
//!
//! let bus = EventBus::new();
//! let seen = Rc::new(RefCell::new(Vec::new()));
//!
//! let log = seen.clone();
//! bus.on("navigation:*", move |_, topic| log.borrow_mut().push(topic.to_string()));
//!
//! bus.emit("navigation:next", &json!({}));
//! bus.emit("view:changed", &json!({ "view": "week" }));
//! assert_eq!(*seen.borrow(), vec!["navigation:next"]);
//! ```

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use serde_json::Value;
use tracing::trace;

/// Topics published by the [`StateManager`](crate::manager::StateManager).
pub mod topics {
    pub const EVENT_ADDED: &str = "event:added";
    pub const EVENT_UPDATED: &str = "event:updated";
    pub const EVENT_DELETED: &str = "event:deleted";
    pub const EVENT_SELECTED: &str = "event:selected";
    pub const VIEW_CHANGED: &str = "view:changed";
    pub const NAVIGATION_NEXT: &str = "navigation:next";
    pub const NAVIGATION_PREVIOUS: &str = "navigation:previous";
    pub const NAVIGATION_TODAY: &str = "navigation:today";
    pub const DATE_CHANGED: &str = "date:changed";
    pub const DATE_SELECTED: &str = "date:selected";
}

type Handler = Rc<dyn Fn(&Value, &str)>;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Pattern {
    All,
    Prefix(String),
    Exact(String),
}

impl Pattern {
    fn parse(pattern: &str) -> Self {
        if pattern == "*" {
            Pattern::All
        } else if let Some(prefix) = pattern.strip_suffix('*') {
            Pattern::Prefix(prefix.to_string())
        } else {
            Pattern::Exact(pattern.to_string())
        }
    }

    fn matches(&self, topic: &str) -> bool {
        match self {
            Pattern::All => true,
            Pattern::Prefix(prefix) => topic.starts_with(prefix.as_str()),
            Pattern::Exact(exact) => topic == exact,
        }
    }
}

struct Registration {
    id: u64,
    pattern: Pattern,
    handler: Handler,
    once: bool,
}

/// Handle returned by [`EventBus::on`]; pass it to [`EventBus::off`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BusSubscription {
    id: u64,
}

#[derive(Default)]
pub struct EventBus {
    registrations: RefCell<Vec<Registration>>,
    next_id: Cell<u64>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `handler(payload, topic)` for every emitted topic matching `pattern`.
    pub fn on(&self, pattern: &str, handler: impl Fn(&Value, &str) + 'static) -> BusSubscription {
        self.register(pattern, Rc::new(handler), false)
    }

    /// Like [`on`](Self::on), but the handler is removed after its first call.
    pub fn once(
        &self,
        pattern: &str,
        handler: impl Fn(&Value, &str) + 'static,
    ) -> BusSubscription {
        self.register(pattern, Rc::new(handler), true)
    }

    fn register(&self, pattern: &str, handler: Handler, once: bool) -> BusSubscription {
        let id = self.next_id.get();
        self.next_id.set(id + 1);

        self.registrations.borrow_mut().push(Registration {
            id,
            pattern: Pattern::parse(pattern),
            handler,
            once,
        });
        BusSubscription { id }
    }

    /// Remove a handler. Returns false if it was already gone.
    pub fn off(&self, subscription: BusSubscription) -> bool {
        let mut registrations = self.registrations.borrow_mut();
        let before = registrations.len();
        registrations.retain(|r| r.id != subscription.id);
        registrations.len() != before
    }

    /// Deliver `payload` to every handler whose pattern matches `topic`, in
    /// registration order. Returns how many handlers ran.
    ///
    /// Handlers may emit or subscribe re-entrantly; handlers added during a
    /// delivery only see later emits, and handlers removed by `off()` or
    /// `clear()` during a delivery are skipped.
    pub fn emit(&self, topic: &str, payload: &Value) -> usize {
        let matched: Vec<(u64, bool, Handler)> = self
            .registrations
            .borrow()
            .iter()
            .filter(|r| r.pattern.matches(topic))
            .map(|r| (r.id, r.once, r.handler.clone()))
            .collect();

        trace!(topic, handlers = matched.len(), "bus emit");
        let mut delivered = 0;
        for (id, once, handler) in matched {
            if !self.claim(id, once) {
                continue;
            }
            handler(payload, topic);
            delivered += 1;
        }
        delivered
    }

    /// Whether registration `id` is still live. A once-handler is removed
    /// before it runs, so a nested emit can't call it again.
    fn claim(&self, id: u64, once: bool) -> bool {
        let mut registrations = self.registrations.borrow_mut();
        let Some(index) = registrations.iter().position(|r| r.id == id) else {
            return false;
        };
        if once {
            registrations.remove(index);
        }
        true
    }

    /// Drop every handler.
    pub fn clear(&self) {
        self.registrations.borrow_mut().clear();
    }

    pub fn handler_count(&self) -> usize {
        self.registrations.borrow().len()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &self.handler_count())
            .finish()
    }
}
