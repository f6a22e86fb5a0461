//! Session settings
//!
//! Defaults reproduce the constants in [`crate::consts`]. Hosts may override
//! them from a JSON file.

use std::fs;
use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::SettingsError;

/// Tunable parameters for one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Field ===
    /// Field width in pixels
    pub field_width: f32,
    /// Field height in pixels
    pub field_height: f32,
    /// Fixed simulation timestep in seconds
    pub sim_dt: f32,

    // === Ship & projectiles ===
    /// Side length of the square ship
    pub ship_size: f32,
    /// Seconds between shots
    pub projectile_interval: f32,
    /// Shot speed in pixels/s
    pub projectile_speed: f32,
    pub projectile_radius: f32,

    // === Asteroids ===
    /// Seconds between asteroid spawn attempts
    pub asteroid_interval: f32,
    pub asteroid_min_radius: f32,
    pub asteroid_max_radius: f32,
    /// Asteroids larger than this split when shot
    pub split_threshold: f32,
    /// Edge spawn speed unit in pixels/s
    pub drift_speed: f32,

    /// Optional fixed RNG seed (random when absent)
    pub seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            field_width: FIELD_WIDTH,
            field_height: FIELD_HEIGHT,
            sim_dt: SIM_DT,

            ship_size: SHIP_SIZE,
            projectile_interval: PROJECTILE_INTERVAL,
            projectile_speed: PROJECTILE_SPEED,
            projectile_radius: PROJECTILE_RADIUS,

            asteroid_interval: ASTEROID_INTERVAL,
            asteroid_min_radius: ASTEROID_MIN_RADIUS,
            asteroid_max_radius: ASTEROID_MAX_RADIUS,
            split_threshold: SPLIT_RADIUS_THRESHOLD,
            drift_speed: DRIFT_SPEED,

            seed: None,
        }
    }
}

impl Settings {
    /// Field size as a vector
    pub fn field_size(&self) -> Vec2 {
        Vec2::new(self.field_width, self.field_height)
    }

    /// Field center, where the ship sits
    pub fn field_center(&self) -> Vec2 {
        self.field_size() / 2.0
    }

    /// Parse and validate settings from a JSON string
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), SettingsError> {
        let positive = [
            ("field_width", self.field_width),
            ("field_height", self.field_height),
            ("sim_dt", self.sim_dt),
            ("ship_size", self.ship_size),
            ("projectile_interval", self.projectile_interval),
            ("projectile_radius", self.projectile_radius),
            ("asteroid_interval", self.asteroid_interval),
            ("asteroid_min_radius", self.asteroid_min_radius),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(SettingsError::invalid(field, format!("must be > 0, got {value}")));
            }
        }

        let finite = [
            ("asteroid_max_radius", self.asteroid_max_radius),
            ("split_threshold", self.split_threshold),
        ];
        for (field, value) in finite {
            if !value.is_finite() {
                return Err(SettingsError::invalid(field, format!("must be finite, got {value}")));
            }
        }

        if self.asteroid_max_radius < self.asteroid_min_radius {
            return Err(SettingsError::invalid(
                "asteroid_max_radius",
                format!(
                    "{} is below asteroid_min_radius {}",
                    self.asteroid_max_radius, self.asteroid_min_radius
                ),
            ));
        }
        // Negative drift would push edge spawns out of the field
        let speeds = [("projectile_speed", self.projectile_speed), ("drift_speed", self.drift_speed)];
        for (field, value) in speeds {
            if !(value.is_finite() && value > 0.0) {
                return Err(SettingsError::invalid(field, format!("must be a positive speed, got {value}")));
            }
        }

        Ok(())
    }
}
