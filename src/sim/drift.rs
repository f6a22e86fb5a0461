//! Drift override
//!
//! Asteroids and projectiles fly in straight lines at constant speed. The
//! physics world still detects their contacts and wraps them, but whatever
//! velocity it integrated this step is replaced by the stored drift vector.
//! Must run every tick after the physics step.

use super::physics::PhysicsWorld;
use super::state::Arena;

/// Reassert every non-ship body's drift vector
pub fn apply_drift<W: PhysicsWorld>(arena: &mut Arena<W>) {
    for asteroid in arena.field.iter() {
        arena.world.set_velocity(asteroid.body, asteroid.drift);
    }
    for projectile in arena.projectiles.values() {
        arena.world.set_velocity(projectile.body, projectile.drift);
    }
}
