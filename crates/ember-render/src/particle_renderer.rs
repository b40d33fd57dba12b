//! Draws the particle simulation through a `GpuBackend`

use crate::gpu::{AttributePointer, BlendFunc, GpuBackend, ProgramHandle, UniformSlot, UniformValue};
use crate::shaders::{
    END_POSITION_LOCATION, LIFETIME_LOCATION, PARTICLE_FRAGMENT_SHADER, PARTICLE_VERTEX_SHADER,
    START_POSITION_LOCATION, U_CENTER_POSITION, U_COLOR, U_TIME,
};
use ember_core::{Result, SimulationConfig};
use ember_particles::{Emission, Particle, ParticleSimulation};
use ember_runtime::ViewLifecycle;
use std::mem::size_of;
use tracing::{error, info, warn};

/// Color the target is cleared to before each frame
pub const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

const STRIDE: u32 = size_of::<Particle>() as u32;

/// The three streams the particle program reads, all from the same interleaved buffer
pub const PARTICLE_ATTRIBUTES: [AttributePointer; 3] = [
    AttributePointer {
        location: LIFETIME_LOCATION,
        components: 1,
        stride: STRIDE,
        offset: Particle::LIFETIME_OFFSET as u32,
    },
    AttributePointer {
        location: START_POSITION_LOCATION,
        components: 3,
        stride: STRIDE,
        offset: Particle::START_OFFSET_OFFSET as u32,
    },
    AttributePointer {
        location: END_POSITION_LOCATION,
        components: 3,
        stride: STRIDE,
        offset: Particle::END_OFFSET_OFFSET as u32,
    },
];

/// Uniform slots of the linked program; a missing slot means the push is skipped
#[derive(Debug, Clone, Copy)]
struct UniformSlots {
    time: Option<UniformSlot>,
    center_position: Option<UniformSlot>,
    color: Option<UniformSlot>,
}

impl UniformSlots {
    fn lookup<B: GpuBackend + ?Sized>(gpu: &B, program: ProgramHandle) -> Self {
        let find = |name: &str| {
            let slot = gpu.uniform_location(program, name);
            if slot.is_none() {
                warn!(uniform = name, "Uniform not found in particle program");
            }
            slot
        };
        Self {
            time: find(U_TIME),
            center_position: find(U_CENTER_POSITION),
            color: find(U_COLOR),
        }
    }
}

struct ParticleScene {
    program: ProgramHandle,
    uniforms: UniformSlots,
    simulation: ParticleSimulation,
}

/// View that owns the particle program and simulation.
///
/// When the program fails to build, the renderer stays alive without a scene
/// and every frame only clears the target.
pub struct ParticleRenderer {
    config: SimulationConfig,
    scene: Option<ParticleScene>,
}

impl ParticleRenderer {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            scene: None,
        }
    }

    /// Whether the program linked and the simulation is running
    pub fn is_ready(&self) -> bool {
        self.scene.is_some()
    }

    pub fn simulation(&self) -> Option<&ParticleSimulation> {
        self.scene.as_ref().map(|s| &s.simulation)
    }

    pub fn program(&self) -> Option<ProgramHandle> {
        self.scene.as_ref().map(|s| s.program)
    }

    fn push_emission<B: GpuBackend + ?Sized>(gpu: &mut B, slots: UniformSlots, emission: Emission) {
        if let Some(slot) = slots.center_position {
            gpu.set_uniform(slot, UniformValue::Vec3(emission.center_position));
        }
        if let Some(slot) = slots.color {
            gpu.set_uniform(slot, UniformValue::Vec4(emission.color));
        }
    }

    fn draw<B: GpuBackend + ?Sized>(gpu: &mut B, scene: &mut ParticleScene, dt: f32) {
        gpu.use_program(scene.program);

        let update = scene.simulation.update(dt);
        if let Some(emission) = update.reseeded {
            Self::push_emission(gpu, scene.uniforms, emission);
        }
        if let Some(slot) = scene.uniforms.time {
            gpu.set_uniform(slot, UniformValue::Float(update.time));
        }

        let buffer = scene.simulation.buffer();
        let data = buffer.as_floats();
        for pointer in PARTICLE_ATTRIBUTES {
            gpu.bind_attribute(pointer, data);
            gpu.enable_attribute(pointer.location);
        }

        gpu.set_blend(Some(BlendFunc::ADDITIVE));
        gpu.draw_points(0, buffer.len() as u32);
    }
}

impl<B: GpuBackend + ?Sized> ViewLifecycle<B> for ParticleRenderer {
    fn initialize(&mut self, gpu: &mut B) -> Result<()> {
        if self.scene.is_some() {
            return Ok(());
        }
        let simulation = ParticleSimulation::new(&self.config)?;

        let program = gpu
            .compile_and_link(PARTICLE_VERTEX_SHADER, PARTICLE_FRAGMENT_SHADER)
            .inspect_err(|e| error!(error = %e, "Particle program failed to build; frames will be blank"))?;
        let uniforms = UniformSlots::lookup(gpu, program);

        info!(
            particles = simulation.buffer().len(),
            seed = self.config.seed,
            program = program.id(),
            "Particle renderer ready"
        );
        self.scene = Some(ParticleScene {
            program,
            uniforms,
            simulation,
        });
        Ok(())
    }

    fn resize(&mut self, gpu: &mut B, width: u32, height: u32) {
        gpu.set_viewport(width, height);
    }

    fn on_frame(&mut self, gpu: &mut B, dt: f32) {
        gpu.clear(CLEAR_COLOR);
        if let Some(scene) = self.scene.as_mut() {
            Self::draw(gpu, scene, dt);
        }
        gpu.flush();
    }

    fn teardown(&mut self, gpu: &mut B) {
        if let Some(scene) = self.scene.take() {
            gpu.release(scene.program);
        }
    }

    fn name(&self) -> &str {
        "particles"
    }
}
