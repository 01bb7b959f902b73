//! Maneuver tunables consumed by rule actions and vehicle geometry.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Preferred travel direction while searching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParkingConfig {
    /// Turning radius as a multiple of vehicle length (default: 2.5)
    pub turn_radius_ratio: f32,
    /// Maximum sensor ray length in world units (default: 400)
    pub sensor_range: f32,
    /// Forward speed cap (default: 2.5)
    pub max_speed: f32,
    /// Reverse speed cap, positive magnitude (default: 1.5)
    pub max_reverse_speed: f32,
    pub preferred_direction: Direction,
    /// Clearance kept from obstacles (default: 30)
    pub safety_margin: f32,
    /// Steering gain (default: 0.3)
    pub steering_sensitivity: f32,
}

impl Default for ParkingConfig {
    fn default() -> Self {
        Self {
            turn_radius_ratio: 2.5,
            sensor_range: 400.0,
            max_speed: 2.5,
            max_reverse_speed: 1.5,
            preferred_direction: Direction::Forward,
            safety_margin: 30.0,
            steering_sensitivity: 0.3,
        }
    }
}

impl ParkingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("turn_radius_ratio", self.turn_radius_ratio),
            ("sensor_range", self.sensor_range),
            ("max_speed", self.max_speed),
            ("max_reverse_speed", self.max_reverse_speed),
        ];
        for (field, value) in positive {
            // NaN fails this check too
            if !(value > 0.0) {
                return Err(ConfigError::non_positive(field, value));
            }
        }
        if !(self.safety_margin >= 0.0) {
            return Err(ConfigError::negative("safety_margin", self.safety_margin));
        }
        if !(self.steering_sensitivity >= 0.0) {
            return Err(ConfigError::negative("steering_sensitivity", self.steering_sensitivity));
        }
        Ok(())
    }
}
