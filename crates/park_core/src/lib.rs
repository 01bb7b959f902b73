//! # park_core - Rule-Based Parallel Parking Simulation
//!
//! A vehicle searches a curbside lane for a free spot and reverses into it.
//! Every tick a fixed rule table reads the vehicle's sensors and pose and
//! picks throttle and steering; a phase state machine sequences the maneuver.
//!
//! ## Features
//! - Deterministic: same config and lot, same decisions
//! - Auditable: every decision names the rule that produced it
//! - Headless: no rendering, no wall clock

// Negated float comparisons reject NaN on purpose
#![allow(clippy::neg_cmp_op_on_partial_ord)]
// Struct initialization pattern used intentionally
#![allow(clippy::field_reassign_with_default)]

pub mod config;
pub mod controller;
pub mod error;
pub mod facts;
pub mod history;
pub mod lot;
pub mod phase;
pub mod rules;
pub mod sensor;
pub mod timestep;
pub mod vehicle;

pub use config::SimConfig;
pub use controller::{DecisionController, RunSummary, TickSnapshot};
pub use error::{ConfigError, Result, SimError};
pub use facts::{Fact, FactStore};
pub use history::{DecisionHistory, LogEntry, RuleUsage};
pub use lot::{ParkingLot, ParkingSpot};
pub use phase::{Phase, PhaseStateMachine, PhaseTransition};
pub use rules::{Decision, Priority, RuleEngine, RULE_TABLE};
pub use vehicle::{Pose, VehicleKinematics, VehicleState};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
