//! Ember Player - windowed demo binary
//!
//! Usage:
//!   ember-player [--config <ember.toml>] [--demo particles|triangle] [--seed <n>]
//!                [--particles <n>] [--fullscreen]
//!
//! Escape or Backspace exits.

use anyhow::Result;
use clap::Parser;
use ember_core::Demo;
use ember_player::PlayOptions;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "ember-player")]
#[command(about = "Ember particle demo - bursts of additive point sprites")]
struct Args {
    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Demo to run: particles or triangle
    #[arg(long)]
    demo: Option<Demo>,

    /// Seed for particle generation and reseeding
    #[arg(long)]
    seed: Option<u64>,

    /// Number of particles
    #[arg(long)]
    particles: Option<u32>,

    /// Launch in fullscreen mode
    #[arg(long)]
    fullscreen: bool,

    /// Log filter (overrides RUST_LOG), e.g. "debug" or "ember_particles=debug"
    #[arg(long)]
    log: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    ember_player::init_logging(args.log.as_deref());

    let config = PlayOptions {
        config: args.config,
        demo: args.demo,
        seed: args.seed,
        particles: args.particles,
        fullscreen: args.fullscreen,
    }
    .resolve()?;

    info!(
        demo = config.demo.name(),
        particles = config.simulation.particle_count,
        seed = config.simulation.seed,
        "Starting Ember player"
    );
    ember_player::run(config)
}
