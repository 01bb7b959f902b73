//! Fact Store
//!
//! Typed snapshot of everything the rule predicates may look at. The set of
//! numeric facts is closed ([`Fact`]); a fact that was never set reads as
//! absent and any predicate touching it evaluates to false.
//!
//! The store is rebuilt from scratch every tick. `distance_to_spot` is derived
//! during the rebuild whenever a spot is selected.

use serde::{Deserialize, Serialize};

use crate::lot::ParkingSpot;
use crate::phase::Phase;
use crate::rules::Decision;
use crate::sensor::SensorReadings;
use crate::vehicle::VehicleState;

/// Numeric fact keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fact {
    CarX,
    CarY,
    CarAngle,
    FrontLeftSensor,
    FrontSensor,
    FrontRightSensor,
    LeftSensor,
    RightSensor,
    RearLeftSensor,
    RearRightSensor,
    RearSensor,
    /// Throttle of the previous tick's decision.
    Throttle,
    /// Steering of the previous tick's decision.
    Steering,
    DistanceToSpot,
}

impl Fact {
    pub const COUNT: usize = 14;

    pub const ALL: [Fact; Fact::COUNT] = [
        Fact::CarX,
        Fact::CarY,
        Fact::CarAngle,
        Fact::FrontLeftSensor,
        Fact::FrontSensor,
        Fact::FrontRightSensor,
        Fact::LeftSensor,
        Fact::RightSensor,
        Fact::RearLeftSensor,
        Fact::RearRightSensor,
        Fact::RearSensor,
        Fact::Throttle,
        Fact::Steering,
        Fact::DistanceToSpot,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Fact::CarX => "car_x",
            Fact::CarY => "car_y",
            Fact::CarAngle => "car_angle",
            Fact::FrontLeftSensor => "front_left_sensor",
            Fact::FrontSensor => "front_sensor",
            Fact::FrontRightSensor => "front_right_sensor",
            Fact::LeftSensor => "left_sensor",
            Fact::RightSensor => "right_sensor",
            Fact::RearLeftSensor => "rear_left_sensor",
            Fact::RearRightSensor => "rear_right_sensor",
            Fact::RearSensor => "rear_sensor",
            Fact::Throttle => "throttle",
            Fact::Steering => "steering",
            Fact::DistanceToSpot => "distance_to_spot",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// Inputs for a full rebuild.
#[derive(Debug, Clone, Copy)]
pub struct FactInputs<'a> {
    pub phase: Phase,
    pub vehicle: &'a VehicleState,
    pub spot: Option<&'a ParkingSpot>,
    pub previous: Option<&'a Decision>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FactStore<'a> {
    phase: Phase,
    values: [Option<f32>; Fact::COUNT],
    selected_spot: Option<&'a ParkingSpot>,
    emergency: bool,
}

impl<'a> FactStore<'a> {
    /// Phase only; every numeric fact absent, no spot.
    pub fn new(phase: Phase) -> Self {
        Self { phase, values: [None; Fact::COUNT], selected_spot: None, emergency: false }
    }

    /// `{phase, all sensors = range, no spot}`, the baseline for totality checks.
    pub fn baseline(phase: Phase, sensor_range: f32) -> Self {
        Self::new(phase).with_sensors(&SensorReadings::clear(sensor_range))
    }

    /// Rebuild from current vehicle, phase, spot, and last decision.
    pub fn rebuild(inputs: FactInputs<'a>) -> Self {
        let v = inputs.vehicle;
        let (throttle, steering, emergency) = inputs
            .previous
            .map(|d| (d.throttle, d.steering, d.emergency))
            .unwrap_or((0.0, 0.0, false));

        let mut store = Self::new(inputs.phase)
            .with(Fact::CarX, v.x)
            .with(Fact::CarY, v.y)
            .with(Fact::CarAngle, v.angle)
            .with_sensors(&v.sensors)
            .with(Fact::Throttle, throttle)
            .with(Fact::Steering, steering)
            .with_spot(inputs.spot);
        store.emergency = emergency;
        store
    }

    pub fn with(mut self, fact: Fact, value: f32) -> Self {
        self.set(fact, value);
        self
    }

    pub fn with_sensors(self, sensors: &SensorReadings) -> Self {
        self.with(Fact::RearLeftSensor, sensors.rear_left())
            .with(Fact::LeftSensor, sensors.left())
            .with(Fact::FrontLeftSensor, sensors.front_left())
            .with(Fact::FrontSensor, sensors.front())
            .with(Fact::FrontRightSensor, sensors.front_right())
            .with(Fact::RightSensor, sensors.right())
            .with(Fact::RearRightSensor, sensors.rear_right())
            .with(Fact::RearSensor, sensors.rear())
    }

    /// Select (or clear) the target spot and refresh the derived distance.
    pub fn with_spot(mut self, spot: Option<&'a ParkingSpot>) -> Self {
        self.selected_spot = spot;
        self.derive();
        self
    }

    pub fn set(&mut self, fact: Fact, value: f32) {
        self.values[fact.slot()] = Some(value);
        if matches!(fact, Fact::CarX | Fact::CarY) {
            self.derive();
        }
    }

    pub fn get(&self, fact: Fact) -> Option<f32> {
        self.values[fact.slot()]
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn selected_spot(&self) -> Option<&'a ParkingSpot> {
        self.selected_spot
    }

    /// Emergency flag of the previous decision.
    pub fn emergency(&self) -> bool {
        self.emergency
    }

    /// Present facts in key order.
    pub fn iter(&self) -> impl Iterator<Item = (Fact, f32)> + '_ {
        Fact::ALL.iter().filter_map(|&f| self.get(f).map(|v| (f, v)))
    }

    fn derive(&mut self) {
        let distance = match (self.selected_spot, self.get(Fact::CarX), self.get(Fact::CarY)) {
            (Some(spot), Some(x), Some(y)) => Some(spot.distance_to(x, y)),
            _ => None,
        };
        self.values[Fact::DistanceToSpot.slot()] = distance;
    }
}
