//! Device-free backend that records every command it receives
//!
//! Programs are linked with the same naga reflection the wgpu backend uses, so
//! uniform lookups and link failures behave identically. Used by tests and by
//! `ember trace`.

use crate::gpu::{
    AttributePointer, BlendFunc, GpuCommands, GpuProgramService, ProgramHandle, UniformSlot,
    UniformValue,
};
use crate::program::ProgramInterface;
use ember_core::{EmberError, Result};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// One recorded call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum GpuCommand {
    Link {
        program: Option<ProgramHandle>,
    },
    Release {
        program: ProgramHandle,
    },
    Viewport {
        width: u32,
        height: u32,
    },
    Clear {
        color: [f32; 4],
    },
    UseProgram {
        program: ProgramHandle,
    },
    Uniform {
        name: String,
        value: UniformValue,
    },
    BindAttribute {
        pointer: AttributePointer,
        floats: usize,
    },
    EnableAttribute {
        location: u32,
    },
    Blend {
        blend: Option<BlendFunc>,
    },
    /// Draw calls carry the state they were issued under
    DrawPoints {
        first: u32,
        count: u32,
        program: Option<ProgramHandle>,
        blend: Option<BlendFunc>,
        enabled: Vec<u32>,
    },
    DrawTriangles {
        first: u32,
        count: u32,
        program: Option<ProgramHandle>,
        blend: Option<BlendFunc>,
        enabled: Vec<u32>,
    },
    Flush,
}

struct RecordedProgram {
    interface: ProgramInterface,
    values: BTreeMap<String, UniformValue>,
}

#[derive(Default)]
pub struct RecordingBackend {
    commands: Vec<GpuCommand>,
    programs: HashMap<u32, RecordedProgram>,
    next_program: u32,
    fail_link: Option<String>,
    current: Option<ProgramHandle>,
    blend: Option<BlendFunc>,
    enabled: BTreeSet<u32>,
    bound: Option<Vec<f32>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend whose every link attempt fails with `message`
    pub fn failing_link(message: impl Into<String>) -> Self {
        Self {
            fail_link: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn commands(&self) -> &[GpuCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<GpuCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Recorded commands split after each `Flush`
    pub fn frames(&self) -> Vec<&[GpuCommand]> {
        self.commands
            .split_inclusive(|c| matches!(c, GpuCommand::Flush))
            .collect()
    }

    /// Value currently stored in a program's uniform
    pub fn uniform_value(&self, program: ProgramHandle, name: &str) -> Option<UniformValue> {
        self.programs.get(&program.id())?.values.get(name).copied()
    }

    /// Data most recently passed to `bind_attribute`
    pub fn bound_data(&self) -> Option<&[f32]> {
        self.bound.as_deref()
    }

    pub fn live_programs(&self) -> usize {
        self.programs.len()
    }
}

impl GpuProgramService for RecordingBackend {
    fn compile_and_link(
        &mut self,
        vertex_source: &str,
        fragment_source: &str,
    ) -> Result<ProgramHandle> {
        let linked = match &self.fail_link {
            Some(message) => Err(EmberError::ProgramLink(message.clone())),
            None => ProgramInterface::link(vertex_source, fragment_source),
        };
        let interface = match linked {
            Ok(interface) => interface,
            Err(e) => {
                self.commands.push(GpuCommand::Link { program: None });
                return Err(e);
            }
        };

        self.next_program += 1;
        let handle = ProgramHandle::new(self.next_program)
            .ok_or_else(|| EmberError::ProgramLink("program ids exhausted".into()))?;
        self.programs.insert(
            handle.id(),
            RecordedProgram {
                interface,
                values: BTreeMap::new(),
            },
        );
        self.commands.push(GpuCommand::Link {
            program: Some(handle),
        });
        Ok(handle)
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformSlot> {
        self.programs.get(&program.id())?.interface.uniform(name)
    }

    fn release(&mut self, program: ProgramHandle) {
        if self.programs.remove(&program.id()).is_some() {
            if self.current == Some(program) {
                self.current = None;
            }
            self.commands.push(GpuCommand::Release { program });
        }
    }
}

impl GpuCommands for RecordingBackend {
    fn set_viewport(&mut self, width: u32, height: u32) {
        self.commands.push(GpuCommand::Viewport { width, height });
    }

    fn clear(&mut self, color: [f32; 4]) {
        self.commands.push(GpuCommand::Clear { color });
    }

    fn use_program(&mut self, program: ProgramHandle) {
        self.current = self
            .programs
            .contains_key(&program.id())
            .then_some(program);
        self.commands.push(GpuCommand::UseProgram { program });
    }

    fn set_uniform(&mut self, slot: UniformSlot, value: UniformValue) {
        let Some(program) = self.current.and_then(|p| self.programs.get_mut(&p.id())) else {
            return;
        };
        if slot.kind != value.kind() {
            return;
        }
        let Some(name) = program.interface.uniform_name(slot).map(str::to_string) else {
            return;
        };
        program.values.insert(name.clone(), value);
        self.commands.push(GpuCommand::Uniform { name, value });
    }

    fn bind_attribute(&mut self, pointer: AttributePointer, data: &[f32]) {
        if self.bound.as_deref() != Some(data) {
            self.bound = Some(data.to_vec());
        }
        self.commands.push(GpuCommand::BindAttribute {
            pointer,
            floats: data.len(),
        });
    }

    fn enable_attribute(&mut self, location: u32) {
        self.enabled.insert(location);
        self.commands.push(GpuCommand::EnableAttribute { location });
    }

    fn set_blend(&mut self, blend: Option<BlendFunc>) {
        self.blend = blend;
        self.commands.push(GpuCommand::Blend { blend });
    }

    fn draw_points(&mut self, first: u32, count: u32) {
        self.commands.push(GpuCommand::DrawPoints {
            first,
            count,
            program: self.current,
            blend: self.blend,
            enabled: self.enabled.iter().copied().collect(),
        });
    }

    fn draw_triangles(&mut self, first: u32, count: u32) {
        self.commands.push(GpuCommand::DrawTriangles {
            first,
            count,
            program: self.current,
            blend: self.blend,
            enabled: self.enabled.iter().copied().collect(),
        });
    }

    fn flush(&mut self) {
        self.commands.push(GpuCommand::Flush);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shaders::{PARTICLE_FRAGMENT_SHADER, PARTICLE_VERTEX_SHADER, U_TIME};

    #[test]
    fn program_ids_start_at_one() {
        let mut gpu = RecordingBackend::new();
        let a = gpu
            .compile_and_link(PARTICLE_VERTEX_SHADER, PARTICLE_FRAGMENT_SHADER)
            .unwrap();
        let b = gpu
            .compile_and_link(PARTICLE_VERTEX_SHADER, PARTICLE_FRAGMENT_SHADER)
            .unwrap();
        assert_eq!(a.id(), 1);
        assert_eq!(b.id(), 2);
        assert_eq!(gpu.live_programs(), 2);
    }

    #[test]
    fn uniforms_need_a_current_program() {
        let mut gpu = RecordingBackend::new();
        let program = gpu
            .compile_and_link(PARTICLE_VERTEX_SHADER, PARTICLE_FRAGMENT_SHADER)
            .unwrap();
        let slot = gpu.uniform_location(program, U_TIME).unwrap();

        gpu.set_uniform(slot, UniformValue::Float(0.5));
        assert_eq!(gpu.uniform_value(program, U_TIME), None);

        gpu.use_program(program);
        gpu.set_uniform(slot, UniformValue::Float(0.5));
        assert_eq!(
            gpu.uniform_value(program, U_TIME),
            Some(UniformValue::Float(0.5))
        );
    }

    #[test]
    fn mistyped_uniform_is_ignored() {
        let mut gpu = RecordingBackend::new();
        let program = gpu
            .compile_and_link(PARTICLE_VERTEX_SHADER, PARTICLE_FRAGMENT_SHADER)
            .unwrap();
        let slot = gpu.uniform_location(program, U_TIME).unwrap();
        gpu.use_program(program);
        gpu.set_uniform(slot, UniformValue::Vec3([1.0; 3]));
        assert_eq!(gpu.uniform_value(program, U_TIME), None);
    }

    #[test]
    fn failing_link_records_no_program() {
        let mut gpu = RecordingBackend::failing_link("no device");
        let err = gpu.compile_and_link(PARTICLE_VERTEX_SHADER, PARTICLE_FRAGMENT_SHADER);
        assert!(matches!(err, Err(EmberError::ProgramLink(_))));
        assert_eq!(gpu.commands(), &[GpuCommand::Link { program: None }]);
        assert_eq!(gpu.live_programs(), 0);
    }

    #[test]
    fn frames_split_on_flush() {
        let mut gpu = RecordingBackend::new();
        gpu.clear([0.0, 0.0, 0.0, 1.0]);
        gpu.flush();
        gpu.clear([0.0, 0.0, 0.0, 1.0]);
        gpu.flush();
        assert_eq!(gpu.frames().len(), 2);
        assert_eq!(gpu.frames()[1].len(), 2);
    }

    #[test]
    fn commands_serialize_as_tagged_json() {
        let mut gpu = RecordingBackend::new();
        gpu.set_blend(Some(BlendFunc::ADDITIVE));
        let json = serde_json::to_string(gpu.commands()).unwrap();
        assert_eq!(
            json,
            r#"[{"op":"blend","blend":{"src":"src_alpha","dst":"one"}}]"#
        );
    }
}
