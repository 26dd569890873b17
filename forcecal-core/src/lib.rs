//! State core for an embeddable month/week/day/agenda calendar widget.
//!
//! This crate owns the data behind the widget and nothing about drawing it:
//! - `EventStore` holds the event collection and answers range/date queries
//! - `CalendarState` is an immutable snapshot of navigation and selection
//! - `view_model` turns store + state into render-ready grids
//! - `StateManager` is the single mutation point, notifying subscribers
//! - `EventBus` carries namespaced signals between decoupled components

pub mod bus;
pub mod clock;
pub mod config;
pub mod constants;
pub mod date;
pub mod date_range;
pub mod error;
pub mod event;
pub mod manager;
pub mod state;
pub mod store;
pub mod view;
pub mod view_model;

pub use bus::{BusSubscription, EventBus};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::CalendarConfig;
pub use date::IntoInstant;
pub use date_range::DateRange;
pub use error::{CalendarError, CalendarResult, ErrorKind};
pub use event::{CalendarEvent, EventPatch};
pub use manager::{StateManager, StateManagerBuilder, Subscription};
pub use state::CalendarState;
pub use store::EventStore;
pub use view::{IntoView, View};
pub use view_model::ViewData;
