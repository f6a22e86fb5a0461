//! Session lifecycle and the fixed timestep tick
//!
//! A session goes Idle -> Running -> Ended, once. Starting it places the ship
//! and arms the spawn timers; a ship strike ends it, cancelling the timers and
//! halting the physics world. Replaying means building a new session.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::collision::{CollisionResolver, Resolution};
use super::drift::apply_drift;
use super::physics::{BodyId, Bounds, KinematicWorld, PhysicsWorld};
use super::spawn::{SpawnRequest, SpawnScheduler, projectile_velocity, roll_candidate};
use super::state::{Arena, SessionEvent, SessionPhase};
use crate::angle_between;
use crate::consts::{MAX_SUBSTEPS, PROJECTILE_CULL_MARGIN};
use crate::error::SessionError;
use crate::settings::Settings;

/// Input for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Pointer position in field space; `None` keeps the last known position
    pub pointer: Option<Vec2>,
}

/// One single-player run
#[derive(Debug)]
pub struct Session<W = KinematicWorld> {
    settings: Settings,
    seed: u64,
    rng: Pcg32,
    phase: SessionPhase,
    arena: Arena<W>,
    /// Present only while running
    scheduler: Option<SpawnScheduler>,
    resolver: CollisionResolver,
    /// Last known pointer position
    pointer: Vec2,
    /// Unsimulated time carried between `advance` calls
    accumulator: f32,
    /// Simulation tick counter
    time_ticks: u64,
    events: Vec<SessionEvent>,
}

impl Session<KinematicWorld> {
    /// Session backed by the built-in headless world
    pub fn headless(settings: Settings) -> Self {
        Self::new(settings, KinematicWorld::default())
    }
}

impl<W: PhysicsWorld> Session<W> {
    /// Create an idle session. Uses `settings.seed`, or a random seed.
    pub fn new(settings: Settings, world: W) -> Self {
        let seed = settings.seed.unwrap_or_else(rand::random);
        let bounds = Bounds::from_size(settings.field_size());
        let resolver = CollisionResolver::new(settings.split_threshold);

        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: SessionPhase::Idle,
            arena: Arena::new(world, bounds),
            scheduler: None,
            resolver,
            pointer: Vec2::ZERO,
            accumulator: 0.0,
            time_ticks: 0,
            events: Vec::new(),
            settings,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn arena(&self) -> &Arena<W> {
        &self.arena
    }

    /// Direct access for hosts and tests that stage bodies
    pub fn arena_mut(&mut self) -> &mut Arena<W> {
        &mut self.arena
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    /// Whether the spawn timers are armed
    pub fn timers_active(&self) -> bool {
        self.scheduler.as_ref().is_some_and(|s| !s.is_cancelled())
    }

    /// Take all events recorded since the last call
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Idle -> Running: place the ship at the field center and arm the timers
    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Idle {
            return Err(SessionError::InvalidTransition {
                from: self.phase,
                action: "start",
            });
        }

        let center = self.settings.field_center();
        self.arena.spawn_ship(center, self.settings.ship_size);
        self.scheduler = Some(SpawnScheduler::new(&self.settings));
        self.phase = SessionPhase::Running;
        self.update_heading();

        log::info!(
            "Session started (seed {}, field {}x{})",
            self.seed,
            self.settings.field_width,
            self.settings.field_height
        );
        Ok(())
    }

    /// Running -> Ended: cancel both timers and halt the world.
    ///
    /// Only a ship strike ends a session, so hosts cannot call this.
    pub(crate) fn end(&mut self) -> Result<(), SessionError> {
        if self.phase != SessionPhase::Running {
            return Err(SessionError::InvalidTransition {
                from: self.phase,
                action: "end",
            });
        }

        if let Some(mut scheduler) = self.scheduler.take() {
            scheduler.cancel();
        }
        self.arena.world.halt();
        self.phase = SessionPhase::Ended;
        self.events.push(SessionEvent::SessionEnded {
            time_ticks: self.time_ticks,
        });

        log::info!(
            "Session ended after {} ticks ({} asteroids live)",
            self.time_ticks,
            self.arena.field.len()
        );
        Ok(())
    }

    /// Run as many fixed ticks as `dt` seconds cover. Returns the number run.
    pub fn advance(&mut self, dt: f32, input: &TickInput) -> u32 {
        if self.phase != SessionPhase::Running {
            return 0;
        }

        self.accumulator += dt.max(0.0);
        let step = self.settings.sim_dt;
        let mut substeps = 0;
        while self.accumulator >= step && substeps < MAX_SUBSTEPS && self.phase == SessionPhase::Running {
            self.tick(input);
            self.accumulator -= step;
            substeps += 1;
        }
        // Drop time we could not catch up on
        if substeps == MAX_SUBSTEPS {
            self.accumulator = self.accumulator.min(step);
        }
        substeps
    }

    /// Advance exactly one fixed timestep
    pub fn tick(&mut self, input: &TickInput) {
        if self.phase != SessionPhase::Running {
            return;
        }
        if let Some(pointer) = input.pointer {
            self.pointer = pointer;
        }

        // Timers fire between physics steps
        let due = self.scheduler.as_mut().map(SpawnScheduler::tick).unwrap_or_default();
        for request in due {
            match request {
                SpawnRequest::Projectile => {
                    self.fire_projectile();
                }
                SpawnRequest::Asteroid => {
                    self.spawn_asteroid();
                }
            }
        }

        let pairs = self.arena.world.step(self.settings.sim_dt);
        self.time_ticks += 1;

        let resolution = self
            .resolver
            .resolve(&mut self.arena, &pairs, &mut self.rng, &mut self.events);
        if resolution == Resolution::Terminate {
            // Phase is Running here, so this cannot fail
            let _ = self.end();
            return;
        }

        apply_drift(&mut self.arena);
        self.update_heading();

        let limit = self.arena.bounds.expanded(PROJECTILE_CULL_MARGIN);
        for body in self.arena.cull_projectiles(limit) {
            self.events.push(SessionEvent::ProjectileCulled { body });
        }
    }

    /// Point the ship at the pointer
    fn update_heading(&mut self) {
        let Some(ship) = self.arena.ship else {
            return;
        };
        if let Some(pos) = self.arena.world.position(ship.body) {
            self.arena.world.set_angle(ship.body, angle_between(pos, self.pointer));
        }
    }

    /// Fire from the ship's position along its heading
    fn fire_projectile(&mut self) -> Option<BodyId> {
        let pos = self.arena.ship_position()?;
        let heading = self.arena.ship_heading()?;
        let vel = projectile_velocity(heading, self.settings.projectile_speed);
        let body = self.arena.add_projectile(pos, vel, self.settings.projectile_radius);

        log::trace!("Projectile {:?} fired at heading {:.2}", body, heading);
        self.events.push(SessionEvent::ProjectileFired { body });
        Some(body)
    }

    /// Roll a candidate on a random edge and try to place it
    fn spawn_asteroid(&mut self) -> Option<BodyId> {
        let (edge, candidate) = roll_candidate(&mut self.rng, &self.settings, &self.arena.bounds);
        match self.arena.field.spawn(&mut self.arena.world, candidate) {
            Some(body) => {
                log::debug!(
                    "Asteroid {:?} r={:.1} entered from {:?}",
                    body,
                    candidate.radius,
                    edge
                );
                self.events.push(SessionEvent::AsteroidSpawned {
                    body,
                    radius: candidate.radius,
                });
                Some(body)
            }
            None => {
                self.events.push(SessionEvent::SpawnRejected {
                    pos: candidate.pos,
                    radius: candidate.radius,
                });
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::field::AsteroidCandidate;
    use crate::sim::state::EntityKind;

    fn seeded(seed: u64) -> Session {
        Session::headless(Settings {
            seed: Some(seed),
            ..Settings::default()
        })
    }

    fn running(seed: u64) -> Session {
        let mut session = seeded(seed);
        session.start().unwrap();
        session
    }

    #[test]
    fn test_new_session_is_idle() {
        let mut session = seeded(1);
        assert_eq!(session.phase(), SessionPhase::Idle);
        assert!(session.arena().ship.is_none());
        assert!(!session.timers_active());
        // Idle sessions do not simulate
        assert_eq!(session.advance(1.0, &TickInput::default()), 0);
        assert_eq!(session.arena().world.body_count(), 0);
    }

    #[test]
    fn test_start_places_ship_at_center() {
        let session = running(1);
        assert_eq!(session.phase(), SessionPhase::Running);
        assert!(session.timers_active());
        assert_eq!(session.arena().ship_position(), Some(Vec2::new(250.0, 200.0)));
        let ship = session.arena().ship.unwrap();
        assert_eq!(session.arena().kind_of(ship.body), Some(EntityKind::Ship));
    }

    #[test]
    fn test_start_twice_is_rejected() {
        let mut session = running(1);
        assert_eq!(
            session.start(),
            Err(SessionError::InvalidTransition {
                from: SessionPhase::Running,
                action: "start",
            })
        );
    }

    #[test]
    fn test_heading_tracks_pointer() {
        let mut session = running(1);
        let center = Vec2::new(250.0, 200.0);

        session.tick(&TickInput {
            pointer: Some(center + Vec2::new(100.0, 0.0)),
        });
        assert!(session.arena().ship_heading().unwrap().abs() < 1e-6);

        session.tick(&TickInput {
            pointer: Some(center + Vec2::new(0.0, -100.0)),
        });
        let heading = session.arena().ship_heading().unwrap();
        assert!((heading + std::f32::consts::FRAC_PI_2).abs() < 1e-6);

        // No pointer update: heading holds
        session.tick(&TickInput::default());
        assert_eq!(session.arena().ship_heading(), Some(heading));
    }

    #[test]
    fn test_advance_runs_fixed_substeps() {
        let mut session = running(1);
        let step = session.settings().sim_dt;
        assert_eq!(session.advance(step * 3.5, &TickInput::default()), 3);
        assert_eq!(session.time_ticks(), 3);
        // Remainder carries over
        assert_eq!(session.advance(step * 0.6, &TickInput::default()), 1);
        // Long stalls are capped
        assert_eq!(session.advance(10.0, &TickInput::default()), MAX_SUBSTEPS);
    }

    #[test]
    fn test_projectiles_fire_on_schedule() {
        let mut session = running(5);
        let pointer = TickInput {
            pointer: Some(Vec2::new(400.0, 200.0)),
        };
        for _ in 0..90 {
            session.tick(&pointer);
        }
        let fired = session
            .drain_events()
            .iter()
            .filter(|e| matches!(e, SessionEvent::ProjectileFired { .. }))
            .count();
        assert_eq!(fired, 2);

        // Shots head toward the pointer (+x)
        let arena = session.arena();
        for projectile in arena.projectiles.values() {
            assert!(projectile.drift.x > 0.0);
            assert_eq!(arena.world.velocity(projectile.body), Some(projectile.drift));
        }
    }

    #[test]
    fn test_spawned_asteroids_respect_limits_and_drift() {
        let mut session = running(11);
        // Let the field fill up for twenty seconds
        for _ in 0..(60 * 20) {
            session.tick(&TickInput::default());
            if session.phase() == SessionPhase::Ended {
                break;
            }
            let arena = session.arena();
            for asteroid in arena.field.iter() {
                assert_eq!(arena.world.velocity(asteroid.body), Some(asteroid.drift));
            }
            for projectile in arena.projectiles.values() {
                assert_eq!(arena.world.velocity(projectile.body), Some(projectile.drift));
            }
        }

        let spawned: Vec<f32> = session
            .drain_events()
            .iter()
            .filter_map(|e| match e {
                SessionEvent::AsteroidSpawned { radius, .. } => Some(*radius),
                _ => None,
            })
            .collect();
        assert!(!spawned.is_empty());
        assert!(spawned.iter().all(|r| (10.0..=50.0).contains(r)));
    }

    #[test]
    fn test_ship_strike_ends_session_once() {
        let mut session = running(3);
        let center = session.settings().field_center();
        {
            let arena = session.arena_mut();
            arena
                .field
                .insert(&mut arena.world, AsteroidCandidate::new(center + Vec2::new(40.0, 0.0), 25.0, Vec2::new(-120.0, 0.0)));
        }

        for _ in 0..30 {
            session.tick(&TickInput::default());
        }

        assert_eq!(session.phase(), SessionPhase::Ended);
        assert!(!session.timers_active());
        assert!(session.arena().world.is_halted());
        let ended = session
            .drain_events()
            .iter()
            .filter(|e| matches!(e, SessionEvent::SessionEnded { .. }))
            .count();
        assert_eq!(ended, 1);

        // Nothing spawns or moves after teardown
        let bodies = session.arena().world.body_count();
        let ticks = session.time_ticks();
        assert_eq!(session.advance(30.0, &TickInput::default()), 0);
        for _ in 0..300 {
            session.tick(&TickInput::default());
        }
        assert_eq!(session.arena().world.body_count(), bodies);
        assert_eq!(session.time_ticks(), ticks);
        assert!(session.drain_events().is_empty());
        assert!(session.end().is_err());
        assert!(session.start().is_err());
    }

    #[test]
    fn test_shot_asteroid_is_removed() {
        let mut session = running(9);
        let center = session.settings().field_center();
        // Park a small asteroid right where the first shot will travel (+x)
        {
            let arena = session.arena_mut();
            arena
                .field
                .insert(&mut arena.world, AsteroidCandidate::new(center + Vec2::new(60.0, 0.0), 15.0, Vec2::ZERO));
        }
        let pointer = TickInput {
            pointer: Some(center + Vec2::new(100.0, 0.0)),
        };
        for _ in 0..60 {
            session.tick(&pointer);
        }

        let events = session.drain_events();
        assert!(
            events
                .iter()
                .any(|e| matches!(e, SessionEvent::AsteroidDestroyed { radius, .. } if *radius == 15.0))
        );
        assert_eq!(session.phase(), SessionPhase::Running);
    }

    #[test]
    fn test_runaway_projectiles_are_culled() {
        let mut session = running(2);
        let pointer = TickInput {
            pointer: Some(Vec2::new(250.0, 0.0)),
        };
        // A shot at 240 px/s clears 200 px + margin in about a second
        for _ in 0..(60 * 3) {
            session.tick(&pointer);
        }
        let culled = session
            .drain_events()
            .iter()
            .filter(|e| matches!(e, SessionEvent::ProjectileCulled { .. }))
            .count();
        assert!(culled >= 1);
    }

    #[test]
    fn test_same_seed_same_run() {
        let mut a = running(777);
        let mut b = running(777);
        let input = TickInput {
            pointer: Some(Vec2::new(100.0, 300.0)),
        };
        for _ in 0..600 {
            a.tick(&input);
            b.tick(&input);
        }

        assert_eq!(a.phase(), b.phase());
        assert_eq!(a.time_ticks(), b.time_ticks());
        let rocks_a: Vec<_> = a.arena().field.iter().map(|r| (r.radius, r.drift)).collect();
        let rocks_b: Vec<_> = b.arena().field.iter().map(|r| (r.radius, r.drift)).collect();
        assert_eq!(rocks_a, rocks_b);
    }
}
