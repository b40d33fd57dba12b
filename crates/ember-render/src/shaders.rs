//! Program sources and the names and locations they expose

pub const PARTICLE_VERTEX_SHADER: &str = include_str!("particle_vertex.wgsl");
pub const PARTICLE_FRAGMENT_SHADER: &str = include_str!("particle_fragment.wgsl");

/// Cycle time, pushed every frame
pub const U_TIME: &str = "u_time";
/// Emission center, pushed on cycle boundaries
pub const U_CENTER_POSITION: &str = "u_centerPosition";
/// Emission tint, pushed on cycle boundaries
pub const U_COLOR: &str = "u_color";
/// Target size in pixels, maintained by the wgpu backend
pub const U_VIEWPORT: &str = "u_viewport";

pub const LIFETIME_LOCATION: u32 = 0;
pub const START_POSITION_LOCATION: u32 = 1;
pub const END_POSITION_LOCATION: u32 = 2;

pub const TRIANGLE_VERTEX_SHADER: &str = include_str!("triangle_vertex.wgsl");
pub const TRIANGLE_FRAGMENT_SHADER: &str = include_str!("triangle_fragment.wgsl");

pub const POSITION_LOCATION: u32 = 0;
