//! Drift Rocks headless runner
//!
//! Plays one session with a synthetic pointer circling the ship and reports
//! what happened. Rendering and real pointer input belong to the host.

use std::path::PathBuf;

use clap::Parser;
use glam::Vec2;
use log::info;

use drift_rocks::Settings;
use drift_rocks::sim::{Session, SessionEvent, SessionPhase, TickInput};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON settings file (defaults are used when absent)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// RNG seed, overriding the settings file
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many simulated seconds if the ship survives
    #[arg(long, default_value_t = 120.0)]
    max_seconds: f32,

    /// Angular speed of the synthetic pointer (radians/s)
    #[arg(long, default_value_t = 1.5)]
    orbit_speed: f32,
}

/// Running totals for the summary
#[derive(Debug, Default)]
struct Tally {
    fired: u32,
    spawned: u32,
    rejected: u32,
    destroyed: u32,
    split: u32,
    culled: u32,
}

impl Tally {
    fn record(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::ProjectileFired { .. } => self.fired += 1,
            SessionEvent::AsteroidSpawned { .. } => self.spawned += 1,
            SessionEvent::SpawnRejected { .. } => self.rejected += 1,
            SessionEvent::AsteroidDestroyed { .. } => self.destroyed += 1,
            SessionEvent::AsteroidSplit { .. } => self.split += 1,
            SessionEvent::ProjectileCulled { .. } => self.culled += 1,
            SessionEvent::SessionEnded { time_ticks } => info!("Ship destroyed at tick {}", time_ticks),
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut settings = match &args.settings {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    if args.seed.is_some() {
        settings.seed = args.seed;
    }

    let dt = settings.sim_dt;
    let center = settings.field_center();
    let orbit_radius = settings.field_height / 3.0;

    let mut session = Session::headless(settings);
    session.start()?;

    let mut tally = Tally::default();
    let mut elapsed = 0.0_f32;
    while session.phase() == SessionPhase::Running && elapsed < args.max_seconds {
        let theta = elapsed * args.orbit_speed;
        let input = TickInput {
            pointer: Some(center + Vec2::from_angle(theta) * orbit_radius),
        };
        session.advance(dt, &input);
        elapsed += dt;

        for event in session.drain_events() {
            tally.record(&event);
        }
    }

    let outcome = match session.phase() {
        SessionPhase::Ended => "ship destroyed",
        _ => "time limit reached",
    };
    println!(
        "seed {}: {} after {:.1}s ({} ticks)",
        session.seed(),
        outcome,
        session.time_ticks() as f32 * dt,
        session.time_ticks()
    );
    println!(
        "shots fired {} (culled {}), asteroids spawned {} (rejected {}), destroyed {}, split {}, live {}",
        tally.fired,
        tally.culled,
        tally.spawned,
        tally.rejected,
        tally.destroyed,
        tally.split,
        session.arena().field.len()
    );

    Ok(())
}
