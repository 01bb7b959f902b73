//! Range Sensor Model
//!
//! Eight rays at fixed offsets from the vehicle heading. A ray "sees" an
//! obstacle corner when the corner lies ahead along the ray (positive
//! projection); the reported distance is the straight-line distance to the
//! nearest such corner, capped at the sensor range.
//!
//! Ray layout (degrees relative to heading; positive is clockwise on screen):
//!
//! | idx | offset | name        |
//! |-----|--------|-------------|
//! | 0   | -135   | rear_left   |
//! | 1   | -90    | left        |
//! | 2   | -45    | front_left  |
//! | 3   | -20    | front       |
//! | 4   | 20     | front_right |
//! | 5   | 45     | right       |
//! | 6   | 90     | rear_right  |
//! | 7   | 135    | rear        |

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const SENSOR_COUNT: usize = 8;

/// Ray offsets in degrees, relative to heading.
pub const SENSOR_ANGLES: [f32; SENSOR_COUNT] = [-135.0, -90.0, -45.0, -20.0, 20.0, 45.0, 90.0, 135.0];

/// Anything with a rectangular world-space footprint.
pub trait Obstacle {
    fn corners(&self) -> [Point2<f32>; 4];
}

/// Oriented rectangle, e.g. a parked car.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxObstacle {
    pub center: Point2<f32>,
    /// Degrees.
    pub heading: f32,
    pub length: f32,
    pub width: f32,
}

impl BoxObstacle {
    pub fn new(x: f32, y: f32, heading: f32, length: f32, width: f32) -> Self {
        Self { center: Point2::new(x, y), heading, length, width }
    }
}

impl Obstacle for BoxObstacle {
    fn corners(&self) -> [Point2<f32>; 4] {
        footprint_corners(self.center, self.heading, self.length, self.width)
    }
}

/// Corners of an oriented rectangle, rear-left first, counter-clockwise in body frame.
pub fn footprint_corners(center: Point2<f32>, heading: f32, length: f32, width: f32) -> [Point2<f32>; 4] {
    let (s, c) = heading.to_radians().sin_cos();
    let hl = length / 2.0;
    let hw = width / 2.0;
    [(-hl, -hw), (hl, -hw), (hl, hw), (-hl, hw)]
        .map(|(bx, by)| Point2::new(center.x + bx * c - by * s, center.y + bx * s + by * c))
}

/// One distance per ray, indexed as in [`SENSOR_ANGLES`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReadings(pub [f32; SENSOR_COUNT]);

impl SensorReadings {
    /// Every ray unobstructed.
    pub fn clear(range: f32) -> Self {
        Self([range; SENSOR_COUNT])
    }

    pub fn as_array(&self) -> &[f32; SENSOR_COUNT] {
        &self.0
    }

    pub fn rear_left(&self) -> f32 {
        self.0[0]
    }

    pub fn left(&self) -> f32 {
        self.0[1]
    }

    pub fn front_left(&self) -> f32 {
        self.0[2]
    }

    pub fn front(&self) -> f32 {
        self.0[3]
    }

    pub fn front_right(&self) -> f32 {
        self.0[4]
    }

    pub fn right(&self) -> f32 {
        self.0[5]
    }

    pub fn rear_right(&self) -> f32 {
        self.0[6]
    }

    pub fn rear(&self) -> f32 {
        self.0[7]
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SensorModel {
    range: f32,
}

impl SensorModel {
    pub fn new(range: f32) -> Result<Self, ConfigError> {
        if !(range > 0.0) {
            return Err(ConfigError::non_positive("sensor_range", range));
        }
        Ok(Self { range })
    }

    pub fn range(&self) -> f32 {
        self.range
    }

    /// Cast all rays from `origin` with the vehicle facing `heading` degrees.
    pub fn scan<O: Obstacle>(&self, origin: Point2<f32>, heading: f32, obstacles: &[O]) -> SensorReadings {
        let mut readings = SensorReadings::clear(self.range);

        for (slot, offset) in readings.0.iter_mut().zip(SENSOR_ANGLES) {
            let (s, c) = (heading + offset).to_radians().sin_cos();
            let dir = Vector2::new(c, s);

            for corner in obstacles.iter().flat_map(|o| o.corners()) {
                let rel = corner - origin;
                if rel.dot(&dir) > 0.0 {
                    let dist = rel.norm();
                    if dist < *slot {
                        *slot = dist;
                    }
                }
            }
        }

        readings
    }
}
