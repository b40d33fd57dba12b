//! CLI command implementations

pub mod config;
pub mod play;
pub mod render;
pub mod trace;

use ember_core::{EmberConfig, FramePacing};
use tracing::warn;

/// Offline runs need reproducible deltas, so wall-clock pacing falls back to the default fixed step
pub(crate) fn offline_pacing(config: &EmberConfig) -> FramePacing {
    match config.simulation.pacing {
        fixed @ FramePacing::Fixed { .. } => fixed,
        FramePacing::Elapsed { .. } => {
            warn!("Elapsed pacing is not reproducible offline; using the fixed default");
            FramePacing::default()
        }
    }
}
