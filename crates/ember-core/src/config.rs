//! Demo configuration, loaded from TOML

use crate::error::{EmberError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Upper bound on the particle population; the whole buffer is re-bound every frame.
pub const MAX_PARTICLE_COUNT: u32 = 1_000_000;

/// Top-level configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmberConfig {
    pub demo: Demo,
    pub simulation: SimulationConfig,
    pub window: WindowConfig,
}

/// Which view the player and CLI drive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Demo {
    /// Looping particle bursts
    #[default]
    Particles,
    /// A single static triangle
    Triangle,
}

impl Demo {
    pub fn name(self) -> &'static str {
        match self {
            Demo::Particles => "particles",
            Demo::Triangle => "triangle",
        }
    }
}

impl std::str::FromStr for Demo {
    type Err = EmberError;
    fn from_str(name: &str) -> Result<Self> {
        match name {
            "particles" => Ok(Demo::Particles),
            "triangle" => Ok(Demo::Triangle),
            other => Err(EmberError::InvalidConfig(format!(
                "unknown demo `{other}`, expected `particles` or `triangle`"
            ))),
        }
    }
}

/// Particle population and clock settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub particle_count: u32,
    /// Seeds both particle generation and every later reseed
    pub seed: u64,
    pub pacing: FramePacing,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            particle_count: 1000,
            seed: 0,
            pacing: FramePacing::default(),
        }
    }
}

/// How the cycle-time delta for each frame is chosen
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FramePacing {
    /// Constant cycle-time per frame, independent of frame rate
    Fixed { delta: f32 },
    /// Wall-clock seconds since the previous frame, times `scale`, clamped to `max_delta`
    Elapsed {
        #[serde(default = "default_elapsed_scale")]
        scale: f32,
        #[serde(default = "default_max_delta")]
        max_delta: f32,
    },
}

impl Default for FramePacing {
    fn default() -> Self {
        FramePacing::Fixed { delta: 0.02 }
    }
}

fn default_elapsed_scale() -> f32 {
    1.0
}

fn default_max_delta() -> f32 {
    0.25
}

/// Window settings for the interactive player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub fullscreen: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Ember Particles".into(),
            width: 720,
            height: 1280,
            fullscreen: false,
        }
    }
}

impl EmberConfig {
    /// Read and validate a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        text.parse()
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<()> {
        self.simulation.validate()?;
        if self.window.width == 0 || self.window.height == 0 {
            return Err(EmberError::InvalidConfig(format!(
                "window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            )));
        }
        Ok(())
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.particle_count == 0 || self.particle_count > MAX_PARTICLE_COUNT {
            return Err(EmberError::ValueOutOfRange {
                field: "simulation.particle_count".into(),
                min: 1.0,
                max: MAX_PARTICLE_COUNT as f64,
                value: self.particle_count as f64,
            });
        }
        self.pacing.validate()
    }
}

impl FramePacing {
    pub fn validate(&self) -> Result<()> {
        match *self {
            FramePacing::Fixed { delta } => check_positive("simulation.pacing.delta", delta, 1.0),
            FramePacing::Elapsed { scale, max_delta } => {
                check_positive("simulation.pacing.scale", scale, 1000.0)?;
                check_positive("simulation.pacing.max_delta", max_delta, 1.0)
            }
        }
    }
}

fn check_positive(field: &str, value: f32, max: f32) -> Result<()> {
    if !value.is_finite() || value <= 0.0 || value > max {
        return Err(EmberError::ValueOutOfRange {
            field: field.into(),
            min: 0.0,
            max: max as f64,
            value: value as f64,
        });
    }
    Ok(())
}

impl std::str::FromStr for EmberConfig {
    type Err = EmberError;
    fn from_str(serialized: &str) -> Result<Self> {
        let config: EmberConfig = toml::from_str(serialized)?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_demo() {
        let config = EmberConfig::default();
        assert_eq!(config.simulation.particle_count, 1000);
        assert_eq!(config.simulation.seed, 0);
        assert_eq!(config.simulation.pacing, FramePacing::Fixed { delta: 0.02 });
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_file_gives_defaults() {
        let config: EmberConfig = "".parse().unwrap();
        assert_eq!(config, EmberConfig::default());
    }

    #[test]
    fn parse_elapsed_pacing() {
        let toml_str = r#"
[simulation]
particle_count = 250
seed = 7

[simulation.pacing]
mode = "elapsed"
scale = 0.5
"#;
        let config: EmberConfig = toml_str.parse().unwrap();
        assert_eq!(config.simulation.particle_count, 250);
        assert_eq!(config.simulation.seed, 7);
        match config.simulation.pacing {
            FramePacing::Elapsed { scale, max_delta } => {
                assert!((scale - 0.5).abs() < 1e-6);
                assert!((max_delta - 0.25).abs() < 1e-6);
            }
            other => panic!("Expected elapsed pacing, got {other:?}"),
        }
        assert_eq!(config.window, WindowConfig::default());
    }

    #[test]
    fn demo_selection() {
        let config: EmberConfig = "demo = \"triangle\"".parse().unwrap();
        assert_eq!(config.demo, Demo::Triangle);
        assert_eq!(EmberConfig::default().demo, Demo::Particles);

        assert_eq!("particles".parse::<Demo>().unwrap(), Demo::Particles);
        assert!(matches!(
            "teapot".parse::<Demo>(),
            Err(EmberError::InvalidConfig(_))
        ));
    }

    #[test]
    fn zero_particles_is_rejected() {
        let err = "[simulation]\nparticle_count = 0".parse::<EmberConfig>().unwrap_err();
        assert!(matches!(err, EmberError::ValueOutOfRange { .. }));
    }

    #[test]
    fn non_positive_delta_is_rejected() {
        let toml_str = "[simulation.pacing]\nmode = \"fixed\"\ndelta = 0.0";
        assert!(toml_str.parse::<EmberConfig>().is_err());

        let pacing = FramePacing::Fixed { delta: f32::NAN };
        assert!(pacing.validate().is_err());
    }

    #[test]
    fn toml_round_trip() {
        let mut config = EmberConfig::default();
        config.demo = Demo::Triangle;
        config.simulation.seed = 42;
        config.simulation.pacing = FramePacing::Elapsed {
            scale: 2.0,
            max_delta: 0.1,
        };
        let serialized = config.to_toml_string().unwrap();
        let deserialized: EmberConfig = serialized.parse().unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn load_from_file() {
        let path = std::env::temp_dir().join(format!("ember_test_{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[window]\ntitle = \"Sparks\"\nwidth = 320\nheight = 240\n").unwrap();
        let config = EmberConfig::load(&path).unwrap();
        assert_eq!(config.window.title, "Sparks");
        assert_eq!(config.window.width, 320);
        assert_eq!(config.simulation, SimulationConfig::default());
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_file_is_io_error() {
        let path = std::env::temp_dir().join(format!("ember_missing_{}.toml", uuid::Uuid::new_v4()));
        assert!(matches!(EmberConfig::load(&path), Err(EmberError::IoError(_))));
    }
}
