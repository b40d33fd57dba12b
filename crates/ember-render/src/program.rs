//! Program compilation and introspection shared by every backend
//!
//! Both stages are parsed and validated with naga. Linking checks that each
//! stage has its entry point and that the uniform blocks the stages declare
//! agree, then exposes the merged block layout for name lookups.

use crate::gpu::{UniformKind, UniformSlot};
use ember_core::{EmberError, Result};
use naga::valid::{Capabilities, ValidationFlags, Validator};
use naga::{AddressSpace, Binding, Module, ScalarKind, ShaderStage, TypeInner, VectorSize};
use std::collections::BTreeMap;

/// Bind group and binding every program's uniform block must sit at
pub const UNIFORM_GROUP: u32 = 0;
pub const UNIFORM_BINDING: u32 = 0;

/// A per-vertex input the vertex stage reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexInput {
    pub location: u32,
    pub components: u32,
}

/// Linked interface of a vertex + fragment program
#[derive(Debug, Clone)]
pub struct ProgramInterface {
    pub vertex_entry: String,
    pub fragment_entry: String,
    /// Size of the uniform block in bytes, 0 when neither stage has one
    pub uniform_block_size: u32,
    uniforms: BTreeMap<String, UniformSlot>,
    vertex_inputs: Vec<VertexInput>,
}

impl ProgramInterface {
    pub fn link(vertex_source: &str, fragment_source: &str) -> Result<Self> {
        let vertex = compile_stage(vertex_source, ShaderStage::Vertex)?;
        let fragment = compile_stage(fragment_source, ShaderStage::Fragment)?;

        let vertex_entry = entry_point(&vertex, ShaderStage::Vertex)?;
        let fragment_entry = entry_point(&fragment, ShaderStage::Fragment)?;

        let mut uniforms = BTreeMap::new();
        let mut uniform_block_size = 0;
        for module in [&vertex, &fragment] {
            let Some(block) = uniform_block(module)? else {
                continue;
            };
            uniform_block_size = uniform_block_size.max(block.size);
            for (name, slot) in block.members {
                match uniforms.get(&name) {
                    Some(existing) if *existing != slot => {
                        return Err(EmberError::ProgramLink(format!(
                            "uniform `{name}` has a different layout in each stage"
                        )));
                    }
                    Some(_) => {}
                    None => {
                        uniforms.insert(name, slot);
                    }
                }
            }
        }

        let vertex_inputs = vertex_inputs(&vertex, &vertex_entry);

        Ok(Self {
            vertex_entry,
            fragment_entry,
            uniform_block_size,
            uniforms,
            vertex_inputs,
        })
    }

    pub fn uniform(&self, name: &str) -> Option<UniformSlot> {
        self.uniforms.get(name).copied()
    }

    pub fn uniform_names(&self) -> impl Iterator<Item = &str> {
        self.uniforms.keys().map(String::as_str)
    }

    /// Name of the uniform at `slot`, if any
    pub fn uniform_name(&self, slot: UniformSlot) -> Option<&str> {
        self.uniforms
            .iter()
            .find(|(_, s)| **s == slot)
            .map(|(name, _)| name.as_str())
    }

    /// Vertex inputs sorted by location
    pub fn vertex_inputs(&self) -> &[VertexInput] {
        &self.vertex_inputs
    }
}

fn stage_name(stage: ShaderStage) -> &'static str {
    match stage {
        ShaderStage::Vertex => "vertex",
        ShaderStage::Fragment => "fragment",
        ShaderStage::Compute => "compute",
    }
}

fn compile_stage(source: &str, stage: ShaderStage) -> Result<Module> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| EmberError::ShaderCompile {
        stage: stage_name(stage).to_string(),
        message: e.emit_to_string(source),
    })?;
    Validator::new(ValidationFlags::all(), Capabilities::empty())
        .validate(&module)
        .map_err(|e| EmberError::ShaderCompile {
            stage: stage_name(stage).to_string(),
            message: e.emit_to_string(source),
        })?;
    Ok(module)
}

fn entry_point(module: &Module, stage: ShaderStage) -> Result<String> {
    let mut entries = module.entry_points.iter().filter(|ep| ep.stage == stage);
    let first = entries.next().ok_or_else(|| {
        EmberError::ProgramLink(format!("no {} entry point", stage_name(stage)))
    })?;
    if entries.next().is_some() {
        return Err(EmberError::ProgramLink(format!(
            "more than one {} entry point",
            stage_name(stage)
        )));
    }
    Ok(first.name.clone())
}

struct UniformBlock {
    size: u32,
    members: Vec<(String, UniformSlot)>,
}

fn uniform_block(module: &Module) -> Result<Option<UniformBlock>> {
    let mut blocks = module
        .global_variables
        .iter()
        .filter(|(_, var)| var.space == AddressSpace::Uniform);
    let Some((_, var)) = blocks.next() else {
        return Ok(None);
    };
    if blocks.next().is_some() {
        return Err(EmberError::ProgramLink(
            "only one uniform block is supported".into(),
        ));
    }

    match &var.binding {
        Some(b) if b.group == UNIFORM_GROUP && b.binding == UNIFORM_BINDING => {}
        _ => {
            return Err(EmberError::ProgramLink(format!(
                "uniform block must be bound at @group({UNIFORM_GROUP}) @binding({UNIFORM_BINDING})"
            )));
        }
    }

    let TypeInner::Struct { members, span } = &module.types[var.ty].inner else {
        return Err(EmberError::ProgramLink(
            "uniform block must be a struct".into(),
        ));
    };

    let mut slots = Vec::with_capacity(members.len());
    for member in members {
        let Some(name) = &member.name else { continue };
        let kind = uniform_kind(&module.types[member.ty].inner).ok_or_else(|| {
            EmberError::ProgramLink(format!("uniform `{name}` is not a float scalar or vector"))
        })?;
        slots.push((
            name.clone(),
            UniformSlot {
                offset: member.offset,
                kind,
            },
        ));
    }

    Ok(Some(UniformBlock {
        size: *span,
        members: slots,
    }))
}

fn uniform_kind(inner: &TypeInner) -> Option<UniformKind> {
    match inner {
        TypeInner::Scalar(s) if s.kind == ScalarKind::Float && s.width == 4 => {
            Some(UniformKind::Float)
        }
        TypeInner::Vector { size, scalar } if scalar.kind == ScalarKind::Float && scalar.width == 4 => {
            Some(match size {
                VectorSize::Bi => UniformKind::Vec2,
                VectorSize::Tri => UniformKind::Vec3,
                VectorSize::Quad => UniformKind::Vec4,
            })
        }
        _ => None,
    }
}

fn components(inner: &TypeInner) -> u32 {
    match inner {
        TypeInner::Vector { size, .. } => *size as u32,
        _ => 1,
    }
}

fn vertex_inputs(module: &Module, entry: &str) -> Vec<VertexInput> {
    let Some(ep) = module.entry_points.iter().find(|ep| ep.name == entry) else {
        return Vec::new();
    };
    let mut inputs: Vec<VertexInput> = ep
        .function
        .arguments
        .iter()
        .filter_map(|arg| match arg.binding {
            Some(Binding::Location { location, .. }) => Some(VertexInput {
                location,
                components: components(&module.types[arg.ty].inner),
            }),
            _ => None,
        })
        .collect();
    inputs.sort_by_key(|input| input.location);
    inputs
}

#[cfg(test)]
mod tests {
    use super::*;

    const VS: &str = r#"
struct U { tint: vec4<f32>, scale: f32 }
@group(0) @binding(0) var<uniform> u: U;
@vertex
fn main_vs(@location(0) pos: vec3<f32>, @location(1) size: f32) -> @builtin(position) vec4<f32> {
    return vec4<f32>(pos * u.scale * size, 1.0);
}
"#;

    const FS: &str = r#"
struct U { tint: vec4<f32>, scale: f32 }
@group(0) @binding(0) var<uniform> u: U;
@fragment
fn main_fs() -> @location(0) vec4<f32> {
    return u.tint;
}
"#;

    #[test]
    fn links_and_reflects() {
        let program = ProgramInterface::link(VS, FS).unwrap();
        assert_eq!(program.vertex_entry, "main_vs");
        assert_eq!(program.fragment_entry, "main_fs");
        assert_eq!(
            program.uniform("tint"),
            Some(UniformSlot {
                offset: 0,
                kind: UniformKind::Vec4
            })
        );
        assert_eq!(program.uniform("scale").map(|s| s.offset), Some(16));
        assert_eq!(program.uniform("missing"), None);
        assert_eq!(program.uniform_block_size, 32);
        assert_eq!(
            program.vertex_inputs(),
            &[
                VertexInput {
                    location: 0,
                    components: 3
                },
                VertexInput {
                    location: 1,
                    components: 1
                }
            ]
        );
    }

    #[test]
    fn syntax_error_names_the_stage() {
        let err = ProgramInterface::link("fn broken(", FS).unwrap_err();
        match err {
            EmberError::ShaderCompile { stage, .. } => assert_eq!(stage, "vertex"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn stages_must_be_in_the_right_slot() {
        let err = ProgramInterface::link(FS, VS).unwrap_err();
        assert!(matches!(err, EmberError::ProgramLink(_)));
    }

    #[test]
    fn mismatched_blocks_fail_to_link() {
        let fs = r#"
struct U { scale: f32, tint: vec4<f32> }
@group(0) @binding(0) var<uniform> u: U;
@fragment
fn main_fs() -> @location(0) vec4<f32> {
    return u.tint * u.scale;
}
"#;
        let err = ProgramInterface::link(VS, fs).unwrap_err();
        assert!(matches!(err, EmberError::ProgramLink(_)));
    }

    #[test]
    fn uniform_block_must_use_group_zero() {
        let fs = r#"
struct U { tint: vec4<f32>, scale: f32 }
@group(1) @binding(0) var<uniform> u: U;
@fragment
fn main_fs() -> @location(0) vec4<f32> {
    return u.tint;
}
"#;
        assert!(ProgramInterface::link(VS, fs).is_err());
    }
}
