//! Physics settings
//!
//! Loaded from JSON by the host, validated before a sector is built.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;

/// Tunable physics parameters for one sector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    /// Downward acceleration applied to bodies with gravity enabled (units/s²)
    pub gravity: f32,
    /// Fixed simulation timestep (seconds)
    pub fixed_dt: f32,
    /// Maximum substeps `Sector::step` runs for one frame
    pub max_substeps: u32,
    /// How many diagnostics the sector keeps before dropping the oldest
    pub diagnostics_capacity: usize,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            fixed_dt: SIM_DT,
            max_substeps: MAX_SUBSTEPS,
            diagnostics_capacity: 256,
        }
    }
}

impl PhysicsSettings {
    /// Reject values the tick loop cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.gravity.is_finite() {
            return Err(ConfigError::InvalidSetting {
                field: "gravity",
                reason: format!("must be finite, got {}", self.gravity),
            });
        }
        if !(self.fixed_dt.is_finite() && self.fixed_dt > 0.0) {
            return Err(ConfigError::InvalidSetting {
                field: "fixed_dt",
                reason: format!("must be positive, got {}", self.fixed_dt),
            });
        }
        if self.max_substeps == 0 {
            return Err(ConfigError::InvalidSetting {
                field: "max_substeps",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Parse and validate settings from a JSON string
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_json_str(&contents)?;
        log::info!("Loaded physics settings from {}", path.as_ref().display());
        Ok(settings)
    }

    /// Save settings to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        log::info!("Physics settings saved");
        Ok(())
    }
}
