//! Drift Rocks - A tiny asteroid-field arcade simulation
//!
//! Core modules:
//! - `sim`: Gameplay state machine (spawning, drift, collision outcomes, session lifecycle)
//! - `settings`: Runtime configuration
//! - `error`: Typed errors for configuration and lifecycle misuse

pub mod error;
pub mod settings;
pub mod sim;

pub use error::{SessionError, SettingsError};
pub use settings::Settings;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz, one physics step per frame)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per advance to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Field dimensions
    pub const FIELD_WIDTH: f32 = 500.0;
    pub const FIELD_HEIGHT: f32 = 400.0;

    /// Ship is a square of this side length
    pub const SHIP_SIZE: f32 = 20.0;

    /// Seconds between projectile spawns
    pub const PROJECTILE_INTERVAL: f32 = 0.75;
    /// Projectile speed (pixels/s, 4 px per step at 60 Hz)
    pub const PROJECTILE_SPEED: f32 = 240.0;
    pub const PROJECTILE_RADIUS: f32 = 5.0;
    /// Angular offset so shots leave from the ship's nose (calibrated)
    pub const NOSE_ANGLE_OFFSET: f32 = 1.56;
    /// Projectiles further than this outside the field are culled
    pub const PROJECTILE_CULL_MARGIN: f32 = 50.0;

    /// Seconds between asteroid spawn attempts
    pub const ASTEROID_INTERVAL: f32 = 2.0;
    pub const ASTEROID_MIN_RADIUS: f32 = 10.0;
    pub const ASTEROID_MAX_RADIUS: f32 = 50.0;
    /// Drift speed unit for edge spawns (pixels/s, 1 px per step at 60 Hz)
    pub const DRIFT_SPEED: f32 = 60.0;

    /// Asteroids strictly larger than this split when shot
    pub const SPLIT_RADIUS_THRESHOLD: f32 = 30.0;
    /// Split fraction is drawn from this half-open range
    pub const SPLIT_FRACTION_MIN: f32 = 0.1;
    pub const SPLIT_FRACTION_MAX: f32 = 0.7;
    /// Offset that keeps the two fragments from sharing a center
    pub const FRAGMENT_EPSILON: f32 = 0.1;
    /// First fragment's drift relative to its parent
    pub const FRAGMENT_DRIFT_FACTOR: f32 = -0.5;

    /// Per-step velocity damping applied by the built-in world (matches a
    /// typical rigid-body engine's default air friction)
    pub const AIR_FRICTION: f32 = 0.01;
}

/// Angle (radians) of the vector pointing from `from` to `to`
#[inline]
pub fn angle_between(from: Vec2, to: Vec2) -> f32 {
    let d = to - from;
    d.y.atan2(d.x)
}

/// Rotate a vector counter-clockwise by `angle` radians
#[inline]
pub fn rotate(v: Vec2, angle: f32) -> Vec2 {
    Vec2::from_angle(angle).rotate(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_angle_between_axes() {
        let center = Vec2::new(250.0, 200.0);
        assert!(angle_between(center, center + Vec2::new(100.0, 0.0)).abs() < 1e-6);
        assert!((angle_between(center, center + Vec2::new(0.0, 50.0)) - FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let v = rotate(Vec2::new(0.0, 4.0), -FRAC_PI_2);
        assert!((v.x - 4.0).abs() < 1e-5);
        assert!(v.y.abs() < 1e-5);
    }
}
