//! Parking lot layout: curbside spots, parked cars, and spot selection.
//!
//! ## Coordinates
//! Screen-style world units: x grows to the right along the road, y grows
//! downward toward the curb. The curb line sits at y = 550.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::VehicleConfig;
use crate::sensor::BoxObstacle;
use crate::vehicle::Pose;

/// World height of the standard scene.
pub const WORLD_HEIGHT: f32 = 700.0;
/// y of the standard spot row.
pub const CURB_Y: f32 = WORLD_HEIGHT - 150.0;
/// Spot centres of the standard lot.
pub const STANDARD_SPOT_XS: [f32; 6] = [400.0, 550.0, 700.0, 850.0, 1000.0, 1150.0];
/// Spots occupied in the standard lot.
const STANDARD_OCCUPIED: [usize; 2] = [1, 3];
/// Default probability that a spot gets a parked car.
pub const DEFAULT_FILL_RATIO: f32 = 0.7;
/// Max jitter of a parked car around its spot centre.
const PARKED_CAR_JITTER: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParkingSpot {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub length: f32,
    pub occupied: bool,
    pub suitable: bool,
}

impl ParkingSpot {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, width: 100.0, length: 120.0, occupied: false, suitable: true }
    }

    pub fn occupied(mut self, occupied: bool) -> Self {
        self.occupied = occupied;
        self.suitable = !occupied;
        self
    }

    pub fn distance_to(&self, x: f32, y: f32) -> f32 {
        (x - self.x).hypot(y - self.y)
    }
}

/// Spots plus the obstacles the sensors see.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParkingLot {
    pub spots: Vec<ParkingSpot>,
    pub obstacles: Vec<BoxObstacle>,
    pub start: Pose,
}

impl ParkingLot {
    /// Six curbside spots, two marked occupied, no parked cars.
    pub fn standard() -> Self {
        let spots = STANDARD_SPOT_XS
            .iter()
            .enumerate()
            .map(|(i, &x)| ParkingSpot::new(x, CURB_Y).occupied(STANDARD_OCCUPIED.contains(&i)))
            .collect();
        Self { spots, obstacles: Vec::new(), start: Self::standard_start() }
    }

    pub fn standard_start() -> Pose {
        Pose { x: 200.0, y: WORLD_HEIGHT - 200.0, angle: 0.0 }
    }

    /// Park a car centred on each listed spot.
    pub fn with_parked_cars(mut self, spot_indices: &[usize], vehicle: &VehicleConfig) -> Self {
        for &i in spot_indices {
            if let Some(spot) = self.spots.get(i) {
                self.obstacles.push(BoxObstacle::new(spot.x, spot.y, 0.0, vehicle.length, vehicle.width));
            }
        }
        self
    }

    /// Fill spots at random; same seed, same lot.
    ///
    /// Occupancy flags are left alone: a spot can look free on the map and
    /// still hold a car, which is what the sensors are for.
    pub fn with_random_fill(mut self, seed: u64, fill_ratio: f32, vehicle: &VehicleConfig) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        for spot in &self.spots {
            if rng.gen::<f32>() < fill_ratio {
                let dx = rng.gen_range(-PARKED_CAR_JITTER..=PARKED_CAR_JITTER);
                let dy = rng.gen_range(-PARKED_CAR_JITTER..=PARKED_CAR_JITTER);
                self.obstacles.push(BoxObstacle::new(
                    spot.x + dx,
                    spot.y + dy,
                    0.0,
                    vehicle.length,
                    vehicle.width,
                ));
            }
        }
        self
    }

    /// Best free spot: the one whose nearest obstacle (by x) is farthest away.
    ///
    /// Ties keep the first spot in declaration order. A spot only qualifies
    /// with a strictly positive clearance.
    pub fn select_spot(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        let mut best_clearance = 0.0f32;

        for (i, spot) in self.spots.iter().enumerate().filter(|(_, s)| !s.occupied) {
            let clearance = self
                .obstacles
                .iter()
                .map(|o| (o.center.x - spot.x).abs())
                .fold(f32::INFINITY, f32::min);
            if clearance > best_clearance {
                best_clearance = clearance;
                best = Some(i);
            }
        }

        if let Some(i) = best {
            info!(spot = i, x = self.spots[i].x, clearance = best_clearance, "parking spot selected");
        }
        best
    }
}

impl Default for ParkingLot {
    fn default() -> Self {
        Self::standard()
    }
}
