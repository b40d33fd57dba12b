//! Ember Player - windowed demo player
//!
//! This crate provides the `PlayerApp` application handler, which opens a
//! window, drives the configured demo view once per redraw and tears it down
//! when the window closes.

mod player_app;

pub use player_app::PlayerApp;

use anyhow::{Context, Result};
use ember_core::{Demo, EmberConfig};
use std::path::PathBuf;
use winit::event_loop::{ControlFlow, EventLoop};

/// Command-line overrides shared by `ember-player` and `ember play`
#[derive(Debug, Clone, Default)]
pub struct PlayOptions {
    pub config: Option<PathBuf>,
    pub demo: Option<Demo>,
    pub seed: Option<u64>,
    pub particles: Option<u32>,
    pub fullscreen: bool,
}

impl PlayOptions {
    /// Load the config file (or defaults) and apply the overrides on top
    pub fn resolve(&self) -> Result<EmberConfig> {
        let mut config = match &self.config {
            Some(path) => EmberConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => EmberConfig::default(),
        };
        if let Some(demo) = self.demo {
            config.demo = demo;
        }
        if let Some(seed) = self.seed {
            config.simulation.seed = seed;
        }
        if let Some(particles) = self.particles {
            config.simulation.particle_count = particles;
        }
        if self.fullscreen {
            config.window.fullscreen = true;
        }
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }
}

/// Open the player window and run until it closes
pub fn run(config: EmberConfig) -> Result<()> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = PlayerApp::new(config);
    event_loop.run_app(&mut app)?;

    Ok(())
}

/// Install the global `tracing` subscriber.
///
/// `filter` takes precedence over `RUST_LOG`; with neither, `info` is used.
pub fn init_logging(filter: Option<&str>) {
    use tracing_subscriber::EnvFilter;

    let filter = match filter {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_without_a_file() {
        let config = PlayOptions::default().resolve().unwrap();
        assert_eq!(config, EmberConfig::default());
    }

    #[test]
    fn flags_override_the_file() {
        let path = std::env::temp_dir().join(format!("ember-play-{}.toml", uuid::Uuid::new_v4()));
        fs::write(&path, "[simulation]\nseed = 3\nparticle_count = 50\n").unwrap();

        let options = PlayOptions {
            config: Some(path.clone()),
            demo: Some(Demo::Triangle),
            seed: Some(9),
            particles: None,
            fullscreen: true,
        };
        let config = options.resolve().unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(config.demo, Demo::Triangle);
        assert_eq!(config.simulation.seed, 9);
        assert_eq!(config.simulation.particle_count, 50);
        assert!(config.window.fullscreen);
    }

    #[test]
    fn overrides_are_validated() {
        let options = PlayOptions {
            particles: Some(0),
            ..PlayOptions::default()
        };
        assert!(options.resolve().is_err());
    }
}
