use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, Utc};
use chrono_tz::Tz;

use crate::errors::RunAfterError;

/// Where schedule times are rendered. Cron fields are always UTC.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DisplayZone {
    Utc,
    /// The viewer's system zone.
    Local,
    Fixed(FixedOffset),
    Named(Tz),
}

impl DisplayZone {
    /// Parse an IANA zone name such as `"America/New_York"`.
    pub fn from_name(name: &str) -> Result<Self, RunAfterError> {
        name.parse::<Tz>()
            .map(DisplayZone::Named)
            .map_err(|e| RunAfterError::Config(format!("Invalid timezone '{}': {}", name, e)))
    }

    pub fn is_utc(&self) -> bool {
        matches!(self, DisplayZone::Utc)
    }

    /// Wall-clock reading of `instant` in this zone.
    pub fn wall_clock(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        match self {
            DisplayZone::Utc => instant.naive_utc(),
            DisplayZone::Local => instant.with_timezone(&Local).naive_local(),
            DisplayZone::Fixed(offset) => instant.with_timezone(offset).naive_local(),
            DisplayZone::Named(tz) => instant.with_timezone(tz).naive_local(),
        }
    }
}
