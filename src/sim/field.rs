//! Asteroid field manager
//!
//! Owns asteroid placement: every new asteroid goes through [`AsteroidField::spawn`],
//! which refuses candidates overlapping a live asteroid. Dropping the candidate
//! is cheaper than letting the physics world push two bodies apart, which
//! would fling the existing asteroid across the field.

use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::physics::{BodyDesc, BodyId, Bounds, PhysicsWorld};
use super::state::Asteroid;

/// A proposed asteroid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AsteroidCandidate {
    pub pos: Vec2,
    pub radius: f32,
    pub drift: Vec2,
}

impl AsteroidCandidate {
    pub fn new(pos: Vec2, radius: f32, drift: Vec2) -> Self {
        Self { pos, radius, drift }
    }
}

/// All live asteroids plus the group and wrap region they share
#[derive(Debug, Clone)]
pub struct AsteroidField {
    group: i32,
    wrap: Bounds,
    /// Sorted by body id for deterministic iteration
    asteroids: BTreeMap<BodyId, Asteroid>,
}

impl AsteroidField {
    pub fn new(group: i32, wrap: Bounds) -> Self {
        Self {
            group,
            wrap,
            asteroids: BTreeMap::new(),
        }
    }

    /// Collision group shared by every asteroid
    pub fn group(&self) -> i32 {
        self.group
    }

    fn body_desc(&self, candidate: &AsteroidCandidate) -> BodyDesc {
        BodyDesc::circle(candidate.pos, candidate.radius)
            .with_group(self.group)
            .with_velocity(candidate.drift)
            .with_wrap(self.wrap)
    }

    /// Does the candidate's footprint overlap any live asteroid?
    pub fn overlaps_any<W: PhysicsWorld>(&self, world: &W, candidate: &AsteroidCandidate) -> bool {
        let probe = self.body_desc(candidate);
        self.asteroids
            .keys()
            .any(|&id| world.narrow_phase_collides(&probe, id))
    }

    /// Insert the candidate unless it overlaps a live asteroid.
    ///
    /// Returns the new body, or `None` when the candidate was dropped. A
    /// dropped candidate has no side effects and is not retried.
    pub fn spawn<W: PhysicsWorld>(&mut self, world: &mut W, candidate: AsteroidCandidate) -> Option<BodyId> {
        if self.overlaps_any(world, &candidate) {
            log::debug!(
                "Dropped asteroid r={:.1} at ({:.1}, {:.1}): overlaps a live asteroid",
                candidate.radius,
                candidate.pos.x,
                candidate.pos.y
            );
            return None;
        }
        Some(self.insert(world, candidate))
    }

    /// Insert without the overlap check (fragments of a removed parent)
    pub fn insert<W: PhysicsWorld>(&mut self, world: &mut W, candidate: AsteroidCandidate) -> BodyId {
        let body = world.add_body(self.body_desc(&candidate));
        self.asteroids.insert(
            body,
            Asteroid {
                body,
                radius: candidate.radius,
                drift: candidate.drift,
                wrap: self.wrap,
            },
        );
        body
    }

    /// Remove an asteroid from the field and the world
    pub fn remove<W: PhysicsWorld>(&mut self, world: &mut W, id: BodyId) -> Option<Asteroid> {
        let asteroid = self.asteroids.remove(&id)?;
        world.remove_body(id);
        Some(asteroid)
    }

    pub fn get(&self, id: BodyId) -> Option<&Asteroid> {
        self.asteroids.get(&id)
    }

    pub fn contains(&self, id: BodyId) -> bool {
        self.asteroids.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Asteroid> {
        self.asteroids.values()
    }

    pub fn len(&self) -> usize {
        self.asteroids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.asteroids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::physics::KinematicWorld;

    fn setup() -> (KinematicWorld, AsteroidField) {
        let mut world = KinematicWorld::new(0.0);
        let group = world.next_group(false);
        let field = AsteroidField::new(group, Bounds::from_size(Vec2::new(500.0, 400.0)));
        (world, field)
    }

    #[test]
    fn test_spawn_into_empty_field() {
        let (mut world, mut field) = setup();
        let drift = Vec2::new(-30.0, 60.0);
        let id = field
            .spawn(&mut world, AsteroidCandidate::new(Vec2::new(100.0, 0.0), 25.0, drift))
            .expect("empty field accepts any candidate");

        let asteroid = field.get(id).unwrap();
        assert_eq!(asteroid.radius, 25.0);
        assert_eq!(asteroid.drift, drift);
        assert_eq!(asteroid.wrap, Bounds::from_size(Vec2::new(500.0, 400.0)));

        let body = world.body(id).unwrap();
        assert_eq!(body.group, field.group());
        assert_eq!(body.wrap, Some(asteroid.wrap));
        assert_eq!(body.vel, drift);
    }

    #[test]
    fn test_spawn_on_top_of_live_asteroid_is_dropped() {
        let (mut world, mut field) = setup();
        let candidate = AsteroidCandidate::new(Vec2::new(200.0, 200.0), 30.0, Vec2::X);
        field.spawn(&mut world, candidate).unwrap();

        let before = world.body_count();
        assert!(field.spawn(&mut world, candidate).is_none());
        assert_eq!(world.body_count(), before);
        assert_eq!(field.len(), 1);
    }

    #[test]
    fn test_spawn_next_to_live_asteroid_is_accepted() {
        let (mut world, mut field) = setup();
        field
            .spawn(&mut world, AsteroidCandidate::new(Vec2::new(100.0, 100.0), 20.0, Vec2::X))
            .unwrap();
        // 45 apart with radii 20 + 20: clear
        assert!(
            field
                .spawn(&mut world, AsteroidCandidate::new(Vec2::new(145.0, 100.0), 20.0, Vec2::X))
                .is_some()
        );
        assert_eq!(field.len(), 2);
    }

    #[test]
    fn test_overlap_ignores_non_asteroids() {
        let (mut world, mut field) = setup();
        // A projectile-sized body that is not part of the field
        world.add_body(BodyDesc::circle(Vec2::new(100.0, 100.0), 5.0));
        assert!(
            field
                .spawn(&mut world, AsteroidCandidate::new(Vec2::new(100.0, 100.0), 20.0, Vec2::X))
                .is_some()
        );
    }

    #[test]
    fn test_insert_skips_overlap_check() {
        let (mut world, mut field) = setup();
        let candidate = AsteroidCandidate::new(Vec2::new(50.0, 50.0), 15.0, Vec2::Y);
        field.insert(&mut world, candidate);
        field.insert(&mut world, candidate);
        assert_eq!(field.len(), 2);
    }

    #[test]
    fn test_remove() {
        let (mut world, mut field) = setup();
        let id = field.insert(&mut world, AsteroidCandidate::new(Vec2::ZERO, 15.0, Vec2::Y));
        let removed = field.remove(&mut world, id).unwrap();
        assert_eq!(removed.radius, 15.0);
        assert!(field.is_empty());
        assert!(!world.contains(id));
        assert!(field.remove(&mut world, id).is_none());
    }
}
