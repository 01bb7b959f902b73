//! Decision Controller
//!
//! Owns one simulation and drives it a tick at a time.
//!
//! ## Tick order (fixed)
//! 1. phase timer += dt
//! 2. sensor refresh against the lot's obstacles
//! 3. one-time spot selection while SEARCHING (gated on x and phase time)
//! 4. fact store rebuild
//! 5. rule inference
//! 6. history append
//! 7. emergency override (command zero throttle and steering)
//! 8. vehicle integration
//! 9. automatic phase transition check
//!
//! The decision made in step 5 becomes the "previous" decision for the next
//! tick's facts.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::SimConfig;
use crate::error::Result;
use crate::facts::{FactInputs, FactStore};
use crate::history::{DecisionHistory, DecisionRecord, RuleUsage};
use crate::lot::{ParkingLot, ParkingSpot};
use crate::phase::{Phase, PhaseInputs, PhaseStateMachine, PhaseTransition};
use crate::rules::{Decision, RuleEngine};
use crate::sensor::{SensorModel, SensorReadings};
use crate::vehicle::{Pose, VehicleKinematics, VehicleState};

/// Read-only view of the simulation after a tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickSnapshot {
    pub tick: u64,
    pub phase: Phase,
    pub decision: Decision,
    pub pose: Pose,
    pub speed: f32,
    pub sensors: SensorReadings,
    pub selected_spot: Option<usize>,
    /// Transition taken at the end of this tick, if any.
    pub transition: Option<PhaseTransition>,
    pub history_len: usize,
}

impl TickSnapshot {
    pub fn rule_id(&self) -> &str {
        &self.decision.rule_id
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub ticks: u64,
    pub sim_time: f32,
    pub final_phase: Phase,
    pub transitions: Vec<PhaseTransition>,
    pub usage: RuleUsage,
    pub final_pose: Pose,
}

impl RunSummary {
    pub fn parked(&self) -> bool {
        self.final_phase == Phase::Parked
    }
}

pub struct DecisionController {
    config: SimConfig,
    lot: ParkingLot,
    engine: RuleEngine<'static>,
    sensors: SensorModel,
    vehicle: VehicleKinematics,
    phases: PhaseStateMachine,
    selected_spot: Option<usize>,
    last_decision: Option<Decision>,
    history: DecisionHistory,
    tick: u64,
    sim_time: f32,
}

impl DecisionController {
    /// Validates `config` up front; nothing fails after construction.
    pub fn new(config: SimConfig, lot: ParkingLot) -> Result<Self> {
        config.validate()?;
        let sensors = SensorModel::new(config.parking.sensor_range)?;
        let engine = RuleEngine::new(&config);
        let vehicle = Self::spawn_vehicle(&config, &lot);

        info!(
            spots = lot.spots.len(),
            obstacles = lot.obstacles.len(),
            turning_radius = config.turning_radius(),
            "parking simulation ready"
        );

        Ok(Self {
            config,
            lot,
            engine,
            sensors,
            vehicle,
            phases: PhaseStateMachine::new(),
            selected_spot: None,
            last_decision: None,
            history: DecisionHistory::new(),
            tick: 0,
            sim_time: 0.0,
        })
    }

    fn spawn_vehicle(config: &SimConfig, lot: &ParkingLot) -> VehicleKinematics {
        VehicleKinematics::new(
            lot.start,
            config.vehicle.clone(),
            config.turning_radius(),
            config.parking.sensor_range,
        )
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn lot(&self) -> &ParkingLot {
        &self.lot
    }

    pub fn phase(&self) -> Phase {
        self.phases.phase()
    }

    pub fn phase_elapsed(&self) -> f32 {
        self.phases.elapsed()
    }

    pub fn vehicle(&self) -> &VehicleState {
        self.vehicle.state()
    }

    pub fn selected_spot(&self) -> Option<&ParkingSpot> {
        self.selected_spot.and_then(|i| self.lot.spots.get(i))
    }

    pub fn last_decision(&self) -> Option<&Decision> {
        self.last_decision.as_ref()
    }

    pub fn history(&self) -> &DecisionHistory {
        &self.history
    }

    pub fn ticks(&self) -> u64 {
        self.tick
    }

    /// Advance the simulation by `dt` seconds.
    pub fn tick(&mut self, dt: f32) -> TickSnapshot {
        self.phases.advance_timer(dt);
        self.sim_time += dt;

        let sensors = self.vehicle.update_sensors(&self.sensors, &self.lot.obstacles);

        if self.phases.phase() == Phase::Searching
            && self.selected_spot.is_none()
            && self.config.search.is_open(self.vehicle.state().x, self.phases.elapsed())
        {
            self.selected_spot = self.lot.select_spot();
        }

        let phase = self.phases.phase();
        let pose = self.vehicle.state().pose();
        let decision = {
            let facts = FactStore::rebuild(FactInputs {
                phase,
                vehicle: self.vehicle.state(),
                spot: self.selected_spot.and_then(|i| self.lot.spots.get(i)),
                previous: self.last_decision.as_ref(),
            });
            self.engine.infer(&facts)
        };

        self.history.push(DecisionRecord {
            tick: self.tick,
            phase,
            decision: decision.clone(),
            pose,
            sensors,
        });

        let (throttle, steering) =
            if decision.emergency { (0.0, 0.0) } else { (decision.throttle, decision.steering) };
        self.vehicle.update(throttle, steering, dt);

        let state = self.vehicle.state();
        let inputs = PhaseInputs {
            car_x: state.x,
            car_angle: state.angle,
            spot_x: self.selected_spot().map(|s| s.x),
            vehicle_length: self.config.vehicle.length,
        };
        let transition = self.phases.check_transition(&inputs);

        self.last_decision = Some(decision);
        self.tick += 1;
        self.snapshot_with(transition)
    }

    /// Current state without advancing.
    pub fn snapshot(&self) -> TickSnapshot {
        self.snapshot_with(None)
    }

    fn snapshot_with(&self, transition: Option<PhaseTransition>) -> TickSnapshot {
        let state = self.vehicle.state();
        TickSnapshot {
            tick: self.tick,
            phase: self.phases.phase(),
            decision: self.last_decision.clone().unwrap_or_else(Decision::waiting),
            pose: state.pose(),
            speed: state.speed,
            sensors: state.sensors,
            selected_spot: self.selected_spot,
            transition,
            history_len: self.history.len(),
        }
    }

    /// Operator trigger: step to the next phase now.
    pub fn advance_phase(&mut self) -> PhaseTransition {
        self.phases.advance_manual()
    }

    /// Operator-forced stop.
    pub fn abort(&mut self) -> PhaseTransition {
        info!(tick = self.tick, "maneuver aborted by operator");
        self.phases.abort()
    }

    /// Back to the start pose with the same config and lot. History is dropped.
    pub fn reset(&mut self) {
        self.vehicle = Self::spawn_vehicle(&self.config, &self.lot);
        self.phases = PhaseStateMachine::new();
        self.selected_spot = None;
        self.last_decision = None;
        self.history.clear();
        self.tick = 0;
        self.sim_time = 0.0;
        info!("simulation reset");
    }

    /// Tick until a terminal phase or `max_ticks`, whichever comes first.
    pub fn run(&mut self, max_ticks: u64, dt: f32) -> RunSummary {
        let mut transitions = Vec::new();
        for _ in 0..max_ticks {
            if self.phase().is_terminal() {
                break;
            }
            if let Some(t) = self.tick(dt).transition {
                transitions.push(t);
            }
        }

        let summary = RunSummary {
            ticks: self.tick,
            sim_time: self.sim_time,
            final_phase: self.phase(),
            transitions,
            usage: self.history.rule_usage(),
            final_pose: self.vehicle.state().pose(),
        };
        info!(
            ticks = summary.ticks,
            phase = %summary.final_phase,
            rules_used = summary.usage.distinct_rules,
            "run finished"
        );
        summary
    }
}
