//! Engine configuration.
//!
//! Every field has a default, so an empty JSON object (or no file at all) is a
//! valid configuration.

use std::path::Path;

use chrono::Weekday;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

pub const DEFAULT_SLOT_STEP_MINUTES: u32 = 30;
pub const DEFAULT_MAX_WEEKS_TO_SCAN: u32 = 8;
pub const DEFAULT_TIMEZONE: &str = "Europe/Paris";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Spacing of the candidate grid, anchored at opening time.
    pub slot_step_minutes: u32,
    /// How many weeks the forward scan may look at before giving up.
    pub max_weeks_to_scan: u32,
    /// First day of a displayed week.
    pub week_starts_on: Weekday,
    /// IANA zone the business operates in; only used to derive local "now".
    pub timezone: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            slot_step_minutes: DEFAULT_SLOT_STEP_MINUTES,
            max_weeks_to_scan: DEFAULT_MAX_WEEKS_TO_SCAN,
            week_starts_on: Weekday::Mon,
            timezone: DEFAULT_TIMEZONE.to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| EngineError::InvalidConfig(format!("Invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            EngineError::InvalidConfig(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.slot_step_minutes == 0 || self.slot_step_minutes > 24 * 60 {
            return Err(EngineError::InvalidConfig(format!(
                "slotStepMinutes must be between 1 and 1440, got {}",
                self.slot_step_minutes
            )));
        }
        if self.max_weeks_to_scan == 0 {
            return Err(EngineError::InvalidConfig(
                "maxWeeksToScan must be at least 1".to_string(),
            ));
        }
        self.tz()?;
        Ok(())
    }

    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse()
            .map_err(|_| EngineError::InvalidConfig(format!("Invalid timezone: {}", self.timezone)))
    }
}
