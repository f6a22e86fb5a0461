//! Entities and the shared arena
//!
//! Gameplay data (drift vectors, radii, kinds) is owned here, next to the
//! physics world, instead of being attached to the world's bodies.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::field::AsteroidField;
use super::physics::{BodyDesc, BodyId, Bounds, PhysicsWorld};

/// What a body represents in the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Ship,
    Asteroid,
    Projectile,
}

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Constructed, not yet started
    Idle,
    /// Ship alive, spawn timers running
    Running,
    /// Ship destroyed (terminal)
    Ended,
}

/// The player's ship
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ship {
    pub body: BodyId,
    /// Non-colliding group shared with the ship's projectiles
    pub group: i32,
}

/// An asteroid drifting across the field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Asteroid {
    pub body: BodyId,
    pub radius: f32,
    /// Constant velocity reasserted every tick
    pub drift: Vec2,
    /// Region the body wraps around
    pub wrap: Bounds,
}

/// A shot fired by the ship
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub body: BodyId,
    /// Fire-time velocity, reasserted every tick
    pub drift: Vec2,
}

/// Notable things that happened, drained by the host (audio, logging, HUD)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SessionEvent {
    ProjectileFired { body: BodyId },
    AsteroidSpawned { body: BodyId, radius: f32 },
    /// Candidate overlapped a live asteroid and was dropped
    SpawnRejected { pos: Vec2, radius: f32 },
    AsteroidDestroyed { body: BodyId, radius: f32 },
    AsteroidSplit { parent: BodyId, children: [BodyId; 2] },
    /// Projectile left the field and was removed
    ProjectileCulled { body: BodyId },
    SessionEnded { time_ticks: u64 },
}

/// The physics world plus the gameplay records for every body in it
#[derive(Debug)]
pub struct Arena<W> {
    pub world: W,
    /// Field bounds (also every asteroid's wrap region)
    pub bounds: Bounds,
    pub ship: Option<Ship>,
    /// Non-colliding group for the ship and its projectiles
    pub ship_group: i32,
    pub field: AsteroidField,
    /// Live projectiles (sorted by body id for determinism)
    pub projectiles: BTreeMap<BodyId, Projectile>,
}

impl<W: PhysicsWorld> Arena<W> {
    /// Allocate collision groups and wrap an empty world
    pub fn new(mut world: W, bounds: Bounds) -> Self {
        let ship_group = world.next_group(true);
        let asteroid_group = world.next_group(false);

        Self {
            world,
            bounds,
            ship: None,
            ship_group,
            field: AsteroidField::new(asteroid_group, bounds),
            projectiles: BTreeMap::new(),
        }
    }

    /// Classify a live body
    pub fn kind_of(&self, id: BodyId) -> Option<EntityKind> {
        if self.ship.is_some_and(|ship| ship.body == id) {
            Some(EntityKind::Ship)
        } else if self.field.contains(id) {
            Some(EntityKind::Asteroid)
        } else if self.projectiles.contains_key(&id) {
            Some(EntityKind::Projectile)
        } else {
            None
        }
    }

    /// Place the square ship (one per arena)
    pub fn spawn_ship(&mut self, pos: Vec2, size: f32) -> Ship {
        debug_assert!(self.ship.is_none(), "arena already has a ship");
        let body = self
            .world
            .add_body(BodyDesc::rect(pos, size, size).with_group(self.ship_group));
        let ship = Ship {
            body,
            group: self.ship_group,
        };
        self.ship = Some(ship);
        ship
    }

    pub fn ship_position(&self) -> Option<Vec2> {
        self.ship.and_then(|ship| self.world.position(ship.body))
    }

    pub fn ship_heading(&self) -> Option<f32> {
        self.ship.and_then(|ship| self.world.angle(ship.body))
    }

    /// Insert a projectile sharing the ship's group
    pub fn add_projectile(&mut self, pos: Vec2, vel: Vec2, radius: f32) -> BodyId {
        let body = self.world.add_body(
            BodyDesc::circle(pos, radius)
                .with_group(self.ship_group)
                .with_velocity(vel),
        );
        self.projectiles.insert(body, Projectile { body, drift: vel });
        body
    }

    pub fn remove_projectile(&mut self, id: BodyId) -> Option<Projectile> {
        let projectile = self.projectiles.remove(&id)?;
        self.world.remove_body(id);
        Some(projectile)
    }

    /// Remove projectiles outside `limit`, returning their ids
    pub fn cull_projectiles(&mut self, limit: Bounds) -> Vec<BodyId> {
        let outside: Vec<BodyId> = self
            .projectiles
            .keys()
            .copied()
            .filter(|&id| self.world.position(id).is_some_and(|pos| !limit.contains(pos)))
            .collect();
        for &id in &outside {
            self.remove_projectile(id);
        }
        outside
    }
}
