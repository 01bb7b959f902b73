//! # Simulation Configuration
//!
//! All tuning constants live here, grouped by the component that reads them.
//! Configs are immutable once a controller has been built from them.
//!
//! ## Usage
//! ```rust
//! use park_core::config::SimConfig;
//!
//! let config = SimConfig::default();
//! let cautious = SimConfig::cautious();
//! assert!(cautious.parking.max_speed < config.parking.max_speed);
//! ```

mod parking_config;
mod search_config;
mod vehicle_config;

pub use parking_config::{Direction, ParkingConfig};
pub use search_config::SpotSearchConfig;
pub use vehicle_config::VehicleConfig;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SimConfig {
    #[serde(default)]
    pub parking: ParkingConfig,
    #[serde(default)]
    pub vehicle: VehicleConfig,
    #[serde(default)]
    pub search: SpotSearchConfig,
}

impl SimConfig {
    /// Lower speed caps for crowded lots.
    pub fn cautious() -> Self {
        let mut cfg = Self::default();
        cfg.parking.max_speed = 1.5;
        cfg.parking.max_reverse_speed = 1.0;
        cfg.parking.safety_margin = 45.0;
        cfg
    }

    /// Defaults pinned for tests; identical to `default()` today.
    pub fn deterministic_test() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.parking.validate()?;
        self.vehicle.validate()?;
        self.search.validate()?;
        Ok(())
    }

    /// Parse and validate a YAML document. Missing sections fall back to defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let cfg: SimConfig = serde_yaml::from_str(yaml)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn turning_radius(&self) -> f32 {
        self.vehicle.turning_radius(self.parking.turn_radius_ratio)
    }
}

// ========== Tests ==========
