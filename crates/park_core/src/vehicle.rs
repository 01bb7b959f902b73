//! Vehicle Kinematics
//!
//! Simplified bicycle-like model, no slip and no mass.
//!
//! # Per-tick update
//! 1. Speed moves toward the commanded throttle, capped per tick at
//!    `acceleration_rate × dt × 60` when |speed| grows and
//!    `deceleration_rate × dt × 60` otherwise.
//! 2. Heading turns only when |steering| > 0.1° and |speed| > 0.1, on a circle of
//!    radius `turning_radius / max(0.1, |steering| / 30)`.
//! 3. Position advances along the heading by `speed × dt × 100`.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::config::VehicleConfig;
use crate::sensor::{footprint_corners, Obstacle, SensorModel, SensorReadings};
use crate::timestep::{DISTANCE_SCALE, FRAME_RATE_SCALE};

/// Below this the vehicle is treated as not steering.
const STEERING_DEADBAND_DEG: f32 = 0.1;
/// Below this the vehicle is treated as stationary for turning.
const SPEED_DEADBAND: f32 = 0.1;
/// Steering angle that maps to the nominal turning radius.
const FULL_LOCK_DEG: f32 = 30.0;
/// Lower bound on the steering fraction, keeps the turning circle finite.
const MIN_STEERING_FRACTION: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub x: f32,
    pub y: f32,
    /// Degrees; positive turns clockwise on screen (y grows downward).
    pub angle: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleState {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub speed: f32,
    pub previous_speed: f32,
    pub steering: f32,
    pub turning_radius: f32,
    pub sensors: SensorReadings,
}

impl VehicleState {
    pub fn pose(&self) -> Pose {
        Pose { x: self.x, y: self.y, angle: self.angle }
    }

    pub fn position(&self) -> Point2<f32> {
        Point2::new(self.x, self.y)
    }
}

#[derive(Debug, Clone)]
pub struct VehicleKinematics {
    state: VehicleState,
    config: VehicleConfig,
}

impl VehicleKinematics {
    pub fn new(pose: Pose, config: VehicleConfig, turning_radius: f32, sensor_range: f32) -> Self {
        Self {
            state: VehicleState {
                x: pose.x,
                y: pose.y,
                angle: pose.angle,
                speed: 0.0,
                previous_speed: 0.0,
                steering: 0.0,
                turning_radius,
                sensors: SensorReadings::clear(sensor_range),
            },
            config,
        }
    }

    pub fn state(&self) -> &VehicleState {
        &self.state
    }

    pub fn config(&self) -> &VehicleConfig {
        &self.config
    }

    /// Largest speed change allowed this tick for a move from `previous` toward `commanded`.
    pub fn speed_change_cap(&self, previous: f32, commanded: f32, dt: f32) -> f32 {
        let rate = if commanded.abs() > previous.abs() {
            self.config.acceleration_rate
        } else {
            self.config.deceleration_rate
        };
        rate * dt * FRAME_RATE_SCALE
    }

    /// Integrate one tick under the commanded throttle and steering (degrees).
    pub fn update(&mut self, commanded_throttle: f32, commanded_steering: f32, dt: f32) {
        let previous = self.state.previous_speed;
        let diff = commanded_throttle - previous;
        let max_change = self.speed_change_cap(previous, commanded_throttle, dt);

        let speed = if diff.abs() > max_change {
            previous + max_change.copysign(diff)
        } else {
            commanded_throttle
        };

        let s = &mut self.state;
        s.speed = speed;
        s.previous_speed = speed;
        s.steering = commanded_steering;

        if s.steering.abs() > STEERING_DEADBAND_DEG && s.speed.abs() > SPEED_DEADBAND {
            let fraction = (s.steering.abs() / FULL_LOCK_DEG).max(MIN_STEERING_FRACTION);
            let turning_circle = s.turning_radius / fraction;
            let mut angular_speed = s.speed / turning_circle;
            if s.steering < 0.0 {
                angular_speed = -angular_speed;
            }
            s.angle += angular_speed.to_degrees() * dt * FRAME_RATE_SCALE;
        }

        let (sin, cos) = s.angle.to_radians().sin_cos();
        s.x += s.speed * cos * dt * DISTANCE_SCALE;
        s.y += s.speed * sin * dt * DISTANCE_SCALE;
    }

    /// Refresh the eight range readings against `obstacles`.
    pub fn update_sensors<O: Obstacle>(&mut self, model: &SensorModel, obstacles: &[O]) -> SensorReadings {
        let readings = model.scan(self.state.position(), self.state.angle, obstacles);
        self.state.sensors = readings;
        readings
    }
}

impl Obstacle for VehicleKinematics {
    fn corners(&self) -> [Point2<f32>; 4] {
        footprint_corners(self.state.position(), self.state.angle, self.config.length, self.config.width)
    }
}
