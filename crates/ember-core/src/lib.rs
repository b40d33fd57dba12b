//! Ember Core - Foundational types for the Ember particle demo
//!
//! This crate provides the types that all other Ember crates depend on:
//! - `EmberError` and the `Result` alias
//! - `EmberConfig` - TOML configuration for the demo, simulation and window
//! - `FramePacing` - how each frame's simulation delta is chosen

mod config;
mod error;

pub use config::{Demo, EmberConfig, FramePacing, SimulationConfig, WindowConfig};
pub use error::{EmberError, Result};
