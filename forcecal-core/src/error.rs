//! Error types for the calendar state core.

use thiserror::Error;

/// Errors that can occur while mutating or querying calendar state.
///
/// Errors are `Clone` so the last one can be carried in the
/// [`CalendarState`](crate::state::CalendarState) snapshot.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    #[error("Invalid view '{0}'. Expected one of: month, week, day, agenda")]
    InvalidView(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error("Configuration error: {0}")]
    InvalidConfig(String),

    #[error("Event not found: {0}")]
    EventNotFound(String),

    #[error("Calendar has been destroyed")]
    Disposed,
}

/// Coarse classification of a [`CalendarError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input (date, view name, event, config).
    Validation,
    /// Reference to an event id the store doesn't hold.
    NotFound,
    /// Mutation attempted after `destroy()`.
    Disposed,
}

impl CalendarError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CalendarError::InvalidView(_)
            | CalendarError::InvalidDate(_)
            | CalendarError::InvalidEvent(_)
            | CalendarError::InvalidConfig(_) => ErrorKind::Validation,
            CalendarError::EventNotFound(_) => ErrorKind::NotFound,
            CalendarError::Disposed => ErrorKind::Disposed,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }
}

/// Result type alias for calendar operations.
pub type CalendarResult<T> = Result<T, CalendarError>;
