//! Time source abstraction.
//!
//! The state manager asks a [`Clock`] for "now" whenever it needs the present
//! instant (`today()`, `isToday` flags), so tests can pin time with
//! [`FixedClock`] instead of depending on the wall clock.
//!
//! ```
//! use chrono::{Duration, TimeZone, Utc};
//! use forcecal_core::clock::{Clock, FixedClock};
//!
//! let clock = FixedClock::new(Utc.with_ymd_and_hms(2025, 1, 15, 9, 0, 0).unwrap());
//! let handle = clock.clone();
//! handle.advance(Duration::days(1));
//! assert_eq!(clock.now(), Utc.with_ymd_and_hms(2025, 1, 16, 9, 0, 0).unwrap());
//! ```

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use chrono::{DateTime, Duration, Utc};

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock. Use this outside of tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually controlled clock.
///
/// Clones share the same instant, so a test can keep a handle after passing
/// the clock to a [`StateManager`](crate::manager::StateManager).
#[derive(Clone)]
pub struct FixedClock {
    now: Rc<Cell<DateTime<Utc>>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Rc::new(Cell::new(now)),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        self.now.set(now);
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.get()
    }
}

impl fmt::Debug for FixedClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FixedClock").field("now", &self.now.get()).finish()
    }
}
