//! GPU program and command interfaces the particle renderer draws through
//!
//! The shape follows a classic immediate-mode GL context: programs are
//! compiled and linked from source, uniforms are addressed by slots looked up
//! by name, attribute streams point into shared interleaved data, and state
//! (current program, blend, enabled attributes, uniform values) persists until
//! changed. Backends translate this into whatever the device needs.

use bytemuck::bytes_of;
use ember_core::Result;
use serde::Serialize;

/// A linked GPU program. Id 0 is never a valid program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ProgramHandle(u32);

impl ProgramHandle {
    pub fn new(id: u32) -> Option<Self> {
        (id != 0).then_some(Self(id))
    }

    pub fn id(self) -> u32 {
        self.0
    }
}

/// Shape of a uniform value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UniformKind {
    Float,
    Vec2,
    Vec3,
    Vec4,
}

/// Where a named uniform lives inside its program's uniform block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct UniformSlot {
    /// Byte offset within the block
    pub offset: u32,
    pub kind: UniformKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UniformValue {
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Float(_) => UniformKind::Float,
            UniformValue::Vec2(_) => UniformKind::Vec2,
            UniformValue::Vec3(_) => UniformKind::Vec3,
            UniformValue::Vec4(_) => UniformKind::Vec4,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            UniformValue::Float(v) => bytes_of(v),
            UniformValue::Vec2(v) => bytes_of(v),
            UniformValue::Vec3(v) => bytes_of(v),
            UniformValue::Vec4(v) => bytes_of(v),
        }
    }
}

/// One float attribute stream inside interleaved vertex data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct AttributePointer {
    pub location: u32,
    /// Floats per vertex, 1 to 4
    pub components: u32,
    /// Bytes between consecutive vertices; 0 means tightly packed
    pub stride: u32,
    /// Byte offset of the first vertex's value
    pub offset: u32,
}

impl AttributePointer {
    /// Stride with 0 resolved to the width of one value
    pub fn effective_stride(&self) -> u32 {
        match self.stride {
            0 => self.components * 4,
            stride => stride,
        }
    }

    /// Bytes a draw of `vertices` vertices reads through this pointer
    pub fn bytes_needed(&self, vertices: u32) -> u64 {
        if vertices == 0 {
            return 0;
        }
        (vertices as u64 - 1) * self.effective_stride() as u64
            + self.offset as u64
            + self.components as u64 * 4
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendFactor {
    Zero,
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
}

/// Source and destination factors, applied to color and alpha alike
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct BlendFunc {
    pub src: BlendFactor,
    pub dst: BlendFactor,
}

impl BlendFunc {
    /// Overlapping particles brighten instead of occluding
    pub const ADDITIVE: Self = Self {
        src: BlendFactor::SrcAlpha,
        dst: BlendFactor::One,
    };
}

/// Compiles, introspects and releases GPU programs
pub trait GpuProgramService {
    /// Compile both stages and link them into a program
    fn compile_and_link(&mut self, vertex_source: &str, fragment_source: &str)
        -> Result<ProgramHandle>;

    /// Look up a uniform by name; `None` if the program has no such uniform
    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformSlot>;

    fn release(&mut self, program: ProgramHandle);
}

/// Per-frame drawing commands. Failures are swallowed (and logged) by the
/// backend; callers never see them.
pub trait GpuCommands {
    fn set_viewport(&mut self, width: u32, height: u32);

    /// Clear color to `color` and depth to the far plane
    fn clear(&mut self, color: [f32; 4]);

    fn use_program(&mut self, program: ProgramHandle);

    /// Store a value in the current program's uniform block
    fn set_uniform(&mut self, slot: UniformSlot, value: UniformValue);

    /// Point an attribute stream at `data`; every bound stream shares the same data
    fn bind_attribute(&mut self, pointer: AttributePointer, data: &[f32]);

    fn enable_attribute(&mut self, location: u32);

    /// `None` disables blending
    fn set_blend(&mut self, blend: Option<BlendFunc>);

    /// Draw `count` point sprites starting at vertex `first`
    fn draw_points(&mut self, first: u32, count: u32);

    /// Draw `count / 3` independent triangles starting at vertex `first`
    fn draw_triangles(&mut self, first: u32, count: u32);

    /// Submit everything recorded since the last flush
    fn flush(&mut self);
}

/// Everything the particle renderer needs from a device
pub trait GpuBackend: GpuProgramService + GpuCommands {}

impl<T: GpuProgramService + GpuCommands + ?Sized> GpuBackend for T {}
