//! Static calendar configuration.
//!
//! Fixed once a [`StateManager`](crate::manager::StateManager) is built. Can
//! be written inline or read from a TOML file:
//!
//! ```toml
//! locale = "de-DE"
//! time_zone = "Europe/Berlin"
//! week_starts_on = 1
//! default_view = "week"
//! ```

use std::path::Path;

use chrono::Weekday;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_LOCALE;
use crate::date::weekday_from_index;
use crate::error::{CalendarError, CalendarResult};
use crate::view::View;

/// The zone this process runs in, or UTC when it can't be determined.
pub fn system_time_zone() -> Tz {
    iana_time_zone::get_timezone()
        .ok()
        .and_then(|name| name.parse::<Tz>().ok())
        .unwrap_or(Tz::UTC)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    /// Carried for renderers; the core doesn't format anything.
    pub locale: String,

    /// Zone used to decide which calendar day an instant belongs to.
    pub time_zone: Tz,

    /// First column of week rows, 0 = Sunday .. 6 = Saturday.
    pub week_starts_on: u8,

    pub default_view: View,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        CalendarConfig {
            locale: DEFAULT_LOCALE.to_string(),
            time_zone: system_time_zone(),
            week_starts_on: 0,
            default_view: View::Month,
        }
    }
}

impl CalendarConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn with_time_zone(mut self, time_zone: Tz) -> Self {
        self.time_zone = time_zone;
        self
    }

    /// Set the zone from an IANA name such as `"Europe/Berlin"`.
    pub fn with_time_zone_name(self, name: &str) -> CalendarResult<Self> {
        let time_zone = name
            .parse::<Tz>()
            .map_err(|_| CalendarError::InvalidConfig(format!("Unknown time zone '{}'", name)))?;
        Ok(self.with_time_zone(time_zone))
    }

    pub fn with_week_starts_on(mut self, week_starts_on: u8) -> Self {
        self.week_starts_on = week_starts_on;
        self
    }

    pub fn with_default_view(mut self, view: View) -> Self {
        self.default_view = view;
        self
    }

    pub fn time_zone_name(&self) -> &'static str {
        self.time_zone.name()
    }

    pub fn first_weekday(&self) -> Weekday {
        weekday_from_index(self.week_starts_on)
    }

    pub fn validate(&self) -> CalendarResult<()> {
        if self.week_starts_on > 6 {
            return Err(CalendarError::InvalidConfig(format!(
                "week_starts_on must be 0-6, got {}",
                self.week_starts_on
            )));
        }
        if self.locale.trim().is_empty() {
            return Err(CalendarError::InvalidConfig("locale must not be empty".into()));
        }
        Ok(())
    }

    /// Parse and validate a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(content: &str) -> CalendarResult<Self> {
        let config: CalendarConfig =
            toml::from_str(content).map_err(|e| CalendarError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from a TOML file, or defaults if the file doesn't exist.
    pub fn load(path: &Path) -> CalendarResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            CalendarError::InvalidConfig(format!("Could not read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> CalendarResult<String> {
        toml::to_string_pretty(self).map_err(|e| CalendarError::InvalidConfig(e.to_string()))
    }
}
