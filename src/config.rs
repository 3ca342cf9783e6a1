//! JSON configuration for a pointing model.

use serde::{Deserialize, Serialize};

use crate::chain::Handedness;
use crate::error::{require_finite, require_positive, Result};
use crate::profile::REFERENCE_HEIGHT;

/// Static parameters of a pointing model.
///
/// Every field is optional in JSON:
///
/// ```json
/// { "body_height": 1.72, "handedness": "rightHand", "floor_height": 0.0 }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PointingConfig {
    /// Body height in meters
    pub body_height: f32,
    pub handedness: Handedness,
    /// Height of the horizontal target plane (meters, world Z)
    pub floor_height: f32,
}

impl Default for PointingConfig {
    fn default() -> Self {
        Self {
            body_height: REFERENCE_HEIGHT,
            handedness: Handedness::Ignore,
            floor_height: 0.0,
        }
    }
}

impl PointingConfig {
    /// Parse and validate a configuration
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        require_positive("body_height", self.body_height)?;
        require_finite("floor_height", self.floor_height)?;
        Ok(())
    }
}
