//! Simulation state: immutable buffer plus the per-frame clock and emission

use crate::clock::SimulationClock;
use crate::particle::ParticleBuffer;
use crate::rand::ParticleRng;
use crate::reseed::{CycleReseeder, Emission};
use ember_core::{Result, SimulationConfig};
use tracing::debug;

/// Outcome of one simulation step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameUpdate {
    /// Cycle time after the step
    pub time: f32,
    /// New emission, present only on the frame a cycle boundary fired
    pub reseeded: Option<Emission>,
}

/// Everything the renderer reads and mutates between frames
pub struct ParticleSimulation {
    buffer: ParticleBuffer,
    clock: SimulationClock,
    reseeder: CycleReseeder,
    emission: Emission,
    cycles: u64,
}

impl ParticleSimulation {
    pub fn new(config: &SimulationConfig) -> Result<Self> {
        config.validate()?;
        Self::with_seed(config.particle_count as usize, config.seed)
    }

    /// Generate `count` particles from `seed`; the same stream then drives reseeding.
    pub fn with_seed(count: usize, seed: u64) -> Result<Self> {
        let mut rng = ParticleRng::new(seed);
        let buffer = ParticleBuffer::generate(count, &mut rng)?;
        Ok(Self {
            buffer,
            clock: SimulationClock::new(),
            reseeder: CycleReseeder::new(rng),
            emission: Emission::UNSET,
            cycles: 0,
        })
    }

    pub fn update(&mut self, delta: f32) -> FrameUpdate {
        let reseeded = self.clock.advance(delta).map(|_| {
            self.emission = self.reseeder.reseed();
            self.cycles += 1;
            debug!(
                cycle = self.cycles,
                center = ?self.emission.center_position,
                color = ?self.emission.color,
                "Cycle boundary"
            );
            self.emission
        });
        FrameUpdate {
            time: self.clock.time(),
            reseeded,
        }
    }

    pub fn buffer(&self) -> &ParticleBuffer {
        &self.buffer
    }

    pub fn time(&self) -> f32 {
        self.clock.time()
    }

    pub fn emission(&self) -> Emission {
        self.emission
    }

    /// Number of cycle boundaries seen so far
    pub fn cycles(&self) -> u64 {
        self.cycles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_update_reseeds_before_anything_is_visible() {
        let mut sim = ParticleSimulation::with_seed(1000, 0).unwrap();
        assert_eq!(sim.emission(), Emission::UNSET);
        let update = sim.update(0.02);
        assert_eq!(update.time, 0.0);
        let emission = update.reseeded.expect("first frame must reseed");
        assert_eq!(sim.emission(), emission);
        assert_eq!(emission.color[3], 0.5);
    }

    #[test]
    fn boundaries_at_frames_1_and_51() {
        let mut sim = ParticleSimulation::with_seed(1000, 0).unwrap();
        let mut expected_time = 1.0f32;
        let mut boundaries = Vec::new();
        for frame in 1..=51 {
            let update = sim.update(0.02);
            expected_time += 0.02;
            if update.reseeded.is_some() {
                boundaries.push(frame);
                expected_time = 0.0;
            }
            assert_eq!(update.time, expected_time, "frame {frame}");
        }
        assert_eq!(boundaries, vec![1, 51]);
        assert_eq!(sim.cycles(), 2);
    }

    #[test]
    fn buffer_is_unchanged_by_updates() {
        let mut sim = ParticleSimulation::with_seed(1000, 0).unwrap();
        let before = ParticleBuffer::from_seed(1000, 0).unwrap();
        for _ in 0..500 {
            sim.update(0.02);
        }
        assert_eq!(sim.buffer().as_bytes(), before.as_bytes());
    }

    #[test]
    fn reseeding_continues_the_generation_stream() {
        let mut sim = ParticleSimulation::with_seed(10, 4).unwrap();
        let mut rng = ParticleRng::new(4);
        ParticleBuffer::generate(10, &mut rng).unwrap();
        let mut reseeder = CycleReseeder::new(rng);
        assert_eq!(sim.update(0.02).reseeded, Some(reseeder.reseed()));
    }

    #[test]
    fn config_errors_surface_at_setup() {
        let config = SimulationConfig {
            particle_count: 0,
            ..SimulationConfig::default()
        };
        assert!(ParticleSimulation::new(&config).is_err());
    }
}
