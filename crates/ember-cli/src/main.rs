//! Ember CLI - run, render and inspect the demos

mod commands;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use commands::{config, play, render, trace};
use ember_core::Demo;
use ember_player::PlayOptions;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ember")]
#[command(about = "Particle and triangle demos: play them, render them headless, or trace their GPU commands", long_about = None)]
#[command(version)]
struct Cli {
    /// Log filter (overrides RUST_LOG), e.g. "debug" or "ember_render=debug"
    #[arg(long, global = true)]
    log: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Where the simulation settings come from
#[derive(Args, Clone)]
struct SourceArgs {
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
}

impl SourceArgs {
    fn into_options(self, fullscreen: bool) -> PlayOptions {
        PlayOptions {
            config: self.config,
            demo: self.demo,
            seed: self.seed,
            particles: self.particles,
            fullscreen,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Open a demo in a window
    Play {
        #[command(flatten)]
        source: SourceArgs,

        /// Launch in fullscreen mode
        #[arg(long)]
        fullscreen: bool,
    },

    /// Render frames headlessly and save the last one as PNG
    Render {
        #[command(flatten)]
        source: SourceArgs,

        /// Output file path
        #[arg(short, long, default_value = "ember.png")]
        output: String,

        /// Frames to run before capturing
        #[arg(long, default_value = "20")]
        frames: u32,

        /// Image width
        #[arg(long, default_value = "720")]
        width: u32,

        /// Image height
        #[arg(long, default_value = "1280")]
        height: u32,
    },

    /// Run frames against the recording backend and report the GPU commands
    Trace {
        #[command(flatten)]
        source: SourceArgs,

        /// Frames to run
        #[arg(long, default_value = "60")]
        frames: u32,

        /// Output format
        #[arg(long, value_enum, default_value = "summary")]
        format: trace::TraceFormat,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Print the effective configuration as TOML
    Config {
        #[command(flatten)]
        source: SourceArgs,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    ember_player::init_logging(cli.log.as_deref());

    match cli.command {
        Commands::Play { source, fullscreen } => play::run(source.into_options(fullscreen)),
        Commands::Render {
            source,
            output,
            frames,
            width,
            height,
        } => render::run(render::RenderArgs {
            options: source.into_options(false),
            output,
            frames,
            width,
            height,
        }),
        Commands::Trace {
            source,
            frames,
            format,
            output,
        } => trace::run(trace::TraceArgs {
            options: source.into_options(false),
            frames,
            format,
            output,
        }),
        Commands::Config { source } => config::run(source.into_options(false)),
    }
}
