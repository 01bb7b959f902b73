//! Vehicle body and drivetrain parameters.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleConfig {
    /// Body length in world units (default: 80)
    pub length: f32,
    /// Body width in world units (default: 40)
    pub width: f32,
    /// Speed gain per frame while accelerating (default: 0.01)
    pub acceleration_rate: f32,
    /// Speed loss per frame while decelerating (default: 0.02)
    pub deceleration_rate: f32,
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self { length: 80.0, width: 40.0, acceleration_rate: 0.01, deceleration_rate: 0.02 }
    }
}

impl VehicleConfig {
    /// Turning radius for the given length ratio.
    pub fn turning_radius(&self, turn_radius_ratio: f32) -> f32 {
        self.length * turn_radius_ratio
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.length > 0.0) {
            return Err(ConfigError::non_positive("length", self.length));
        }
        if !(self.width > 0.0) {
            return Err(ConfigError::non_positive("width", self.width));
        }
        if !(self.acceleration_rate >= 0.0) {
            return Err(ConfigError::negative("acceleration_rate", self.acceleration_rate));
        }
        if !(self.deceleration_rate >= 0.0) {
            return Err(ConfigError::negative("deceleration_rate", self.deceleration_rate));
        }
        Ok(())
    }
}
