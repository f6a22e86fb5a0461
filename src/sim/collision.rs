//! Collision outcomes
//!
//! The physics world reports which pairs started touching; this module
//! decides what each contact means for the game:
//! - ship × asteroid: the session ends
//! - asteroid × asteroid: nothing (they pass through each other)
//! - projectile × asteroid: both are removed, large asteroids split in two
//! - ship × own projectile: nothing (a ship cannot shoot itself)

use std::collections::BTreeSet;

use glam::Vec2;
use rand::Rng;

use super::field::AsteroidCandidate;
use super::physics::{BodyId, CollisionPair, PhysicsWorld};
use super::state::{Arena, EntityKind, SessionEvent};
use crate::consts::*;

/// Meaning of one contact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contact {
    ShipStruck { asteroid: BodyId },
    ProjectileHit { projectile: BodyId, asteroid: BodyId },
    Pass,
}

/// Whether the session survives a batch of contacts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Continue,
    Terminate,
}

/// Classify a contact between two known bodies (order does not matter)
pub fn classify(a: (BodyId, EntityKind), b: (BodyId, EntityKind)) -> Contact {
    use EntityKind::*;

    match (a.1, b.1) {
        (Ship, Asteroid) => Contact::ShipStruck { asteroid: b.0 },
        (Asteroid, Ship) => Contact::ShipStruck { asteroid: a.0 },
        (Projectile, Asteroid) => Contact::ProjectileHit {
            projectile: a.0,
            asteroid: b.0,
        },
        (Asteroid, Projectile) => Contact::ProjectileHit {
            projectile: b.0,
            asteroid: a.0,
        },
        (Asteroid, Asteroid) => Contact::Pass,
        // Same group as the ship; the world filters these, and if one slips
        // through the ship survives its own shot
        (Ship, Projectile) | (Projectile, Ship) | (Projectile, Projectile) => Contact::Pass,
        (Ship, Ship) => {
            debug_assert!(false, "contact between two ships: {:?} / {:?}", a.0, b.0);
            Contact::Pass
        }
    }
}

/// Split a shot asteroid in two.
///
/// `division` is the first fragment's share of the parent radius. Fragments
/// drift in opposite directions at half the parent's speed, the first one
/// reversed.
pub fn split(pos: Vec2, radius: f32, drift: Vec2, division: f32) -> [AsteroidCandidate; 2] {
    let remainder = 1.0 - division;
    let first_radius = division * radius;
    let second_radius = remainder * radius;
    let first_drift = drift * FRAGMENT_DRIFT_FACTOR;

    [
        AsteroidCandidate::new(pos + Vec2::splat(first_radius / 2.0), first_radius, first_drift),
        AsteroidCandidate::new(
            pos - Vec2::splat(second_radius / 2.0) + Vec2::splat(FRAGMENT_EPSILON),
            second_radius,
            -first_drift,
        ),
    ]
}

/// Applies contact outcomes to an arena
#[derive(Debug, Clone, Copy)]
pub struct CollisionResolver {
    /// Asteroids strictly larger than this split when shot
    pub split_threshold: f32,
}

impl Default for CollisionResolver {
    fn default() -> Self {
        Self {
            split_threshold: SPLIT_RADIUS_THRESHOLD,
        }
    }
}

impl CollisionResolver {
    pub fn new(split_threshold: f32) -> Self {
        Self { split_threshold }
    }

    /// Resolve one step's collision-start pairs, in order.
    ///
    /// Stops at the first ship strike. Pairs naming a body removed earlier in
    /// the batch are skipped, so an asteroid hit by two shots at once is only
    /// destroyed (and split) once.
    pub fn resolve<W: PhysicsWorld, R: Rng>(
        &self,
        arena: &mut Arena<W>,
        pairs: &[CollisionPair],
        rng: &mut R,
        events: &mut Vec<SessionEvent>,
    ) -> Resolution {
        let mut removed = BTreeSet::new();

        for pair in pairs {
            if removed.contains(&pair.a) || removed.contains(&pair.b) {
                continue;
            }
            let (Some(kind_a), Some(kind_b)) = (arena.kind_of(pair.a), arena.kind_of(pair.b)) else {
                debug_assert!(false, "contact with an unknown body: {:?}", pair);
                continue;
            };

            match classify((pair.a, kind_a), (pair.b, kind_b)) {
                Contact::ShipStruck { asteroid } => {
                    log::info!("Ship struck by asteroid {:?}", asteroid);
                    return Resolution::Terminate;
                }
                Contact::ProjectileHit { projectile, asteroid } => {
                    self.destroy(arena, projectile, asteroid, rng, events);
                    removed.insert(projectile);
                    removed.insert(asteroid);
                }
                Contact::Pass => {}
            }
        }

        Resolution::Continue
    }

    fn destroy<W: PhysicsWorld, R: Rng>(
        &self,
        arena: &mut Arena<W>,
        projectile: BodyId,
        asteroid: BodyId,
        rng: &mut R,
        events: &mut Vec<SessionEvent>,
    ) {
        // Capture the parent's pose before it leaves the world
        let pos = arena.world.position(asteroid);
        arena.remove_projectile(projectile);
        let Some(parent) = arena.field.remove(&mut arena.world, asteroid) else {
            return;
        };
        events.push(SessionEvent::AsteroidDestroyed {
            body: asteroid,
            radius: parent.radius,
        });

        if parent.radius <= self.split_threshold {
            log::debug!("Asteroid {:?} (r={:.1}) destroyed", asteroid, parent.radius);
            return;
        }
        let Some(pos) = pos else {
            return;
        };

        let division = rng.random_range(SPLIT_FRACTION_MIN..SPLIT_FRACTION_MAX);
        let [first, second] = split(pos, parent.radius, parent.drift, division);
        let children = [
            arena.field.insert(&mut arena.world, first),
            arena.field.insert(&mut arena.world, second),
        ];
        log::debug!(
            "Asteroid {:?} (r={:.1}) split {:.2}/{:.2} into {:?}",
            asteroid,
            parent.radius,
            division,
            1.0 - division,
            children
        );
        events.push(SessionEvent::AsteroidSplit {
            parent: asteroid,
            children,
        });
    }
}
