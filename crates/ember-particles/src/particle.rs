//! Particle records and the immutable particle buffer

use crate::rand::ParticleRng;
use bytemuck::{Pod, Zeroable};
use ember_core::{EmberError, Result};
use std::mem::{offset_of, size_of};

/// One particle, exactly as the GPU reads it.
/// 28 bytes: 7 interleaved floats.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Particle {
    /// Cycle time at which the particle disappears, in [0, 1)
    pub lifetime: f32,
    /// Offset from the emission center at cycle time 0, each in [-0.125, 0.125)
    pub start_offset: [f32; 3],
    /// Drift added per unit of cycle time, each in [-1, 1)
    pub end_offset: [f32; 3],
}

impl Particle {
    /// Floats per record in the interleaved view
    pub const STRIDE_FLOATS: usize = size_of::<Particle>() / size_of::<f32>();
    pub const LIFETIME_OFFSET: usize = offset_of!(Particle, lifetime);
    pub const START_OFFSET_OFFSET: usize = offset_of!(Particle, start_offset);
    pub const END_OFFSET_OFFSET: usize = offset_of!(Particle, end_offset);

    /// Draw one particle. The draw order is lifetime, end offset, start offset,
    /// which keeps seeded buffers stable across layout changes.
    fn random(rng: &mut ParticleRng) -> Self {
        let lifetime = rng.next_f32();
        let end_offset = rng.range3(-1.0, 1.0);
        let start_offset = rng.range3(-0.125, 0.125);
        Self {
            lifetime,
            start_offset,
            end_offset,
        }
    }
}

/// Fixed population of particles, generated once and never mutated.
#[derive(Clone, Debug, PartialEq)]
pub struct ParticleBuffer {
    particles: Vec<Particle>,
}

impl ParticleBuffer {
    /// Fill `count` particles from `rng`, in generation order.
    pub fn generate(count: usize, rng: &mut ParticleRng) -> Result<Self> {
        if count == 0 {
            return Err(EmberError::InvalidConfig(
                "particle count must be at least 1".into(),
            ));
        }
        let particles = (0..count).map(|_| Particle::random(rng)).collect();
        Ok(Self { particles })
    }

    /// Generate from a fresh PRNG seeded with `seed`
    pub fn from_seed(count: usize, seed: u64) -> Result<Self> {
        Self::generate(count, &mut ParticleRng::new(seed))
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// The buffer as interleaved floats, `Particle::STRIDE_FLOATS` per particle
    pub fn as_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.particles)
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.particles)
    }
}
