//! Timestep constants.
//!
//! The kinematic model is tuned in "per frame at 60 FPS" units: rates are
//! multiplied by `dt × FRAME_RATE_SCALE` and positions by `dt × DISTANCE_SCALE`.
//! These ratios must not drift or the maneuver timing changes.

/// Nominal host frame rate.
pub const FPS: u32 = 60;

/// Nominal tick length in seconds.
pub const FRAME_DT: f32 = 1.0 / FPS as f32;

/// Converts per-frame rates (acceleration, heading change) into per-second.
pub const FRAME_RATE_SCALE: f32 = 60.0;

/// World units travelled per speed unit per second.
pub const DISTANCE_SCALE: f32 = 100.0;

// Compile-time validation
const _: () = assert!(FRAME_RATE_SCALE == FPS as f32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_dt_matches_fps() {
        assert!((FRAME_DT * FPS as f32 - 1.0).abs() < 1e-6);
    }

    #[test]
    fn one_second_of_frames_covers_distance_scale() {
        // speed 1.0 held for 60 frames moves DISTANCE_SCALE units
        let travelled: f32 = (0..FPS).map(|_| 1.0 * FRAME_DT * DISTANCE_SCALE).sum();
        assert!((travelled - DISTANCE_SCALE).abs() < 1e-3);
    }
}
