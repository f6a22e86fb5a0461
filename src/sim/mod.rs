//! Gameplay simulation
//!
//! All gameplay decisions live here. Motion integration and contact detection
//! belong to a [`PhysicsWorld`]; this module decides what gets spawned, how
//! it drifts, and what each contact means.
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by body id)

pub mod collision;
pub mod drift;
pub mod field;
pub mod physics;
pub mod session;
pub mod spawn;
pub mod state;

pub use collision::{CollisionResolver, Contact, Resolution, classify, split};
pub use drift::apply_drift;
pub use field::{AsteroidCandidate, AsteroidField};
pub use physics::{BodyDesc, BodyId, Bounds, CollisionPair, KinematicWorld, PhysicsWorld, Shape};
pub use session::{Session, TickInput};
pub use spawn::{IntervalTimer, SpawnEdge, SpawnRequest, SpawnScheduler, projectile_velocity};
pub use state::{Arena, Asteroid, EntityKind, Projectile, SessionEvent, SessionPhase, Ship};
