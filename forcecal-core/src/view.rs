//! The four display modes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CalendarError, CalendarResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Month,
    Week,
    Day,
    Agenda,
}

impl View {
    pub const ALL: [View; 4] = [View::Month, View::Week, View::Day, View::Agenda];

    pub fn as_str(&self) -> &'static str {
        match self {
            View::Month => "month",
            View::Week => "week",
            View::Day => "day",
            View::Agenda => "agenda",
        }
    }

    /// Whether `next()`/`previous()` move the current date in this view.
    pub fn is_navigable(&self) -> bool {
        !matches!(self, View::Agenda)
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for View {
    type Err = CalendarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "month" => Ok(View::Month),
            "week" => Ok(View::Week),
            "day" => Ok(View::Day),
            "agenda" => Ok(View::Agenda),
            other => Err(CalendarError::InvalidView(other.to_string())),
        }
    }
}

/// Anything `set_view` accepts: a [`View`] or its lowercase name.
pub trait IntoView {
    fn into_view(self) -> CalendarResult<View>;
}

impl IntoView for View {
    fn into_view(self) -> CalendarResult<View> {
        Ok(self)
    }
}

impl IntoView for &str {
    fn into_view(self) -> CalendarResult<View> {
        self.parse()
    }
}

impl IntoView for String {
    fn into_view(self) -> CalendarResult<View> {
        self.parse()
    }
}

impl IntoView for &String {
    fn into_view(self) -> CalendarResult<View> {
        self.parse()
    }
}
