//! Spawn scheduling
//!
//! Two periodic triggers driven by simulation ticks: one fires a projectile
//! from the ship's nose, the other rolls an asteroid candidate on a random
//! field edge. Both are cancelled together when the session ends.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::field::AsteroidCandidate;
use super::physics::Bounds;
use crate::consts::NOSE_ANGLE_OFFSET;
use crate::rotate;
use crate::settings::Settings;

/// Field edge an asteroid enters from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpawnEdge {
    Top,
    Right,
    Bottom,
    Left,
}

impl SpawnEdge {
    pub const ALL: [SpawnEdge; 4] = [SpawnEdge::Top, SpawnEdge::Right, SpawnEdge::Bottom, SpawnEdge::Left];

    /// Uniformly random edge
    pub fn choose<R: Rng>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    /// Unit vector pointing from this edge into the field (screen space, y down)
    pub fn inward(self) -> Vec2 {
        match self {
            SpawnEdge::Top => Vec2::Y,
            SpawnEdge::Right => Vec2::NEG_X,
            SpawnEdge::Bottom => Vec2::NEG_Y,
            SpawnEdge::Left => Vec2::X,
        }
    }

    /// Random point along the edge
    pub fn position<R: Rng>(self, rng: &mut R, bounds: &Bounds) -> Vec2 {
        match self {
            SpawnEdge::Top => Vec2::new(rng.random_range(bounds.min.x..=bounds.max.x), bounds.min.y),
            SpawnEdge::Right => Vec2::new(bounds.max.x, rng.random_range(bounds.min.y..=bounds.max.y)),
            SpawnEdge::Bottom => Vec2::new(rng.random_range(bounds.min.x..=bounds.max.x), bounds.max.y),
            SpawnEdge::Left => Vec2::new(bounds.min.x, rng.random_range(bounds.min.y..=bounds.max.y)),
        }
    }

    /// Inward drift with a random sideways component, scaled by `speed`
    pub fn velocity<R: Rng>(self, rng: &mut R, speed: f32) -> Vec2 {
        let lateral: f32 = rng.random_range(-1.0..=1.0);
        let inward = self.inward();
        (inward + inward.perp() * lateral) * speed
    }
}

/// Roll a fresh asteroid candidate on a random edge
pub fn roll_candidate<R: Rng>(rng: &mut R, settings: &Settings, bounds: &Bounds) -> (SpawnEdge, AsteroidCandidate) {
    let edge = SpawnEdge::choose(rng);
    let pos = edge.position(rng, bounds);
    let radius = rng.random_range(settings.asteroid_min_radius..=settings.asteroid_max_radius);
    let drift = edge.velocity(rng, settings.drift_speed);
    (edge, AsteroidCandidate::new(pos, radius, drift))
}

/// Launch velocity for a shot from a ship facing `heading`
#[inline]
pub fn projectile_velocity(heading: f32, speed: f32) -> Vec2 {
    rotate(Vec2::new(0.0, speed), heading - NOSE_ANGLE_OFFSET)
}

/// Fixed-period trigger counted in simulation ticks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalTimer {
    period_ticks: u32,
    elapsed_ticks: u32,
    cancelled: bool,
}

impl IntervalTimer {
    pub fn new(period_ticks: u32) -> Self {
        Self {
            period_ticks: period_ticks.max(1),
            elapsed_ticks: 0,
            cancelled: false,
        }
    }

    /// Period given in seconds, rounded to whole ticks of `dt`
    pub fn from_secs(period: f32, dt: f32) -> Self {
        Self::new((period / dt).round() as u32)
    }

    pub fn period_ticks(&self) -> u32 {
        self.period_ticks
    }

    /// Advance one tick; true when the period elapsed
    pub fn tick(&mut self) -> bool {
        if self.cancelled {
            return false;
        }
        self.elapsed_ticks += 1;
        if self.elapsed_ticks >= self.period_ticks {
            self.elapsed_ticks = 0;
            true
        } else {
            false
        }
    }

    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

/// A due spawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnRequest {
    Projectile,
    Asteroid,
}

/// The two spawn triggers of a running session
#[derive(Debug, Clone)]
pub struct SpawnScheduler {
    projectile: IntervalTimer,
    asteroid: IntervalTimer,
}

impl SpawnScheduler {
    pub fn new(settings: &Settings) -> Self {
        Self {
            projectile: IntervalTimer::from_secs(settings.projectile_interval, settings.sim_dt),
            asteroid: IntervalTimer::from_secs(settings.asteroid_interval, settings.sim_dt),
        }
    }

    /// Advance both timers one tick, projectile first
    pub fn tick(&mut self) -> Vec<SpawnRequest> {
        let mut due = Vec::new();
        if self.projectile.tick() {
            due.push(SpawnRequest::Projectile);
        }
        if self.asteroid.tick() {
            due.push(SpawnRequest::Asteroid);
        }
        due
    }

    /// Cancel both triggers together
    pub fn cancel(&mut self) {
        self.projectile.cancel();
        self.asteroid.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.projectile.is_cancelled() && self.asteroid.is_cancelled()
    }
}
