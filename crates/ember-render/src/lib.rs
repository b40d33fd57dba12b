//! Ember Render - GPU programs and the demo views
//!
//! `ParticleRenderer` and `TriangleView` talk to the device only through the
//! `GpuBackend` traits:
//! - `WgpuBackend` draws into window surfaces or offscreen textures
//! - `RecordingBackend` records commands without a device, for tests and traces
//!
//! Programs are WGSL, validated and reflected with naga by both backends.

mod context;
mod demo;
pub mod gpu;
mod headless;
pub mod particle_renderer;
pub mod program;
pub mod recording;
pub mod shaders;
pub mod triangle_view;
mod wgpu_backend;

pub use context::{RenderContext, RenderError};
pub use demo::demo_view;
pub use gpu::{
    AttributePointer, BlendFactor, BlendFunc, GpuBackend, GpuCommands, GpuProgramService,
    ProgramHandle, UniformKind, UniformSlot, UniformValue,
};
pub use headless::HeadlessContext;
pub use particle_renderer::{ParticleRenderer, CLEAR_COLOR, PARTICLE_ATTRIBUTES};
pub use program::ProgramInterface;
pub use recording::{GpuCommand, RecordingBackend};
pub use triangle_view::{TriangleView, TRIANGLE_ATTRIBUTE, TRIANGLE_VERTICES};
pub use wgpu_backend::{FrameTarget, WgpuBackend, DEPTH_FORMAT};
