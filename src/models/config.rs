use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::RunAfterError;
use crate::schedule::DisplayZone;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_use_local_time")]
    pub use_local_time: bool,
    /// IANA zone treated as "local" when `use_local_time` is on. Falls back
    /// to the system zone when unset.
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub jobs_file: Option<PathBuf>,
}

fn default_use_local_time() -> bool {
    false
}

impl Default for Config {
    fn default() -> Self {
        Self {
            use_local_time: default_use_local_time(),
            timezone: None,
            jobs_file: None,
        }
    }
}

impl Config {
    /// Zone schedule times are rendered in. `use_local_time` overrides the
    /// configured preference when given.
    pub fn display_zone(&self, use_local_time: Option<bool>) -> Result<DisplayZone, RunAfterError> {
        if !use_local_time.unwrap_or(self.use_local_time) {
            return Ok(DisplayZone::Utc);
        }
        match self.timezone.as_deref() {
            Some(name) => DisplayZone::from_name(name),
            None => Ok(DisplayZone::Local),
        }
    }
}
