//! Gate for the one-time spot selection during SEARCHING.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotSearchConfig {
    /// Vehicle must be past this x before a spot is chosen (default: 250)
    pub min_x: f32,
    /// Seconds in SEARCHING before a spot is chosen (default: 0.5)
    pub min_elapsed: f32,
}

impl Default for SpotSearchConfig {
    fn default() -> Self {
        Self { min_x: 250.0, min_elapsed: 0.5 }
    }
}

impl SpotSearchConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min_elapsed >= 0.0) {
            return Err(ConfigError::negative("min_elapsed", self.min_elapsed));
        }
        if !self.min_x.is_finite() {
            return Err(ConfigError::InvalidValue {
                field: "min_x",
                value: self.min_x,
                requirement: "finite",
            });
        }
        Ok(())
    }

    /// Both gate conditions are strict.
    pub fn is_open(&self, car_x: f32, phase_elapsed: f32) -> bool {
        phase_elapsed > self.min_elapsed && car_x > self.min_x
    }
}
