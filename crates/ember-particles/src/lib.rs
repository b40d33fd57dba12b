//! Ember Particles - fixed-population burst simulation
//!
//! Provides the CPU side of the particle demo:
//! - `ParticleBuffer` - seeded, immutable per-particle attributes with an interleaved view
//! - `SimulationClock` - looping cycle time with boundary detection
//! - `CycleReseeder` - new emission center and tint every cycle
//! - `ParticleSimulation` - the state the renderer advances once per frame

pub mod clock;
pub mod particle;
pub mod rand;
pub mod reseed;
pub mod simulation;

pub use clock::{CycleBoundary, SimulationClock};
pub use particle::{Particle, ParticleBuffer};
pub use reseed::{CycleReseeder, Emission, EMISSION_ALPHA};
pub use simulation::{FrameUpdate, ParticleSimulation};
