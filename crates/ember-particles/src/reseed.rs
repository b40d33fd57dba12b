//! Per-cycle emission center and tint

use crate::rand::ParticleRng;
use serde::Serialize;

/// Alpha of every cycle's tint; the program fades it further by particle age.
pub const EMISSION_ALPHA: f32 = 0.5;

/// Shared values every particle reads during one cycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Emission {
    pub center_position: [f32; 3],
    pub color: [f32; 4],
}

impl Emission {
    /// What the program sees before the first reseed
    pub const UNSET: Self = Self {
        center_position: [0.0; 3],
        color: [0.0; 4],
    };
}

impl Default for Emission {
    fn default() -> Self {
        Self::UNSET
    }
}

/// Draws a new emission at every cycle boundary.
///
/// Owns the PRNG stream left over from particle generation so the whole run
/// replays from a single seed.
pub struct CycleReseeder {
    rng: ParticleRng,
}

impl CycleReseeder {
    pub fn new(rng: ParticleRng) -> Self {
        Self { rng }
    }

    pub fn reseed(&mut self) -> Emission {
        let center_position = self.rng.range3(-0.5, 0.5);
        let [r, g, b] = self.rng.range3(0.5, 1.0);
        Emission {
            center_position,
            color: [r, g, b, EMISSION_ALPHA],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reseed_ranges() {
        let mut reseeder = CycleReseeder::new(ParticleRng::new(0));
        for _ in 0..2000 {
            let emission = reseeder.reseed();
            for v in emission.center_position {
                assert!((-0.5..0.5).contains(&v));
            }
            for v in &emission.color[..3] {
                assert!((0.5..1.0).contains(v));
            }
            assert_eq!(emission.color[3], 0.5);
        }
    }

    #[test]
    fn reseeds_vary_between_cycles() {
        let mut reseeder = CycleReseeder::new(ParticleRng::new(11));
        let first = reseeder.reseed();
        let second = reseeder.reseed();
        assert_ne!(first, second);
    }

    #[test]
    fn reseed_is_replayable() {
        let mut a = CycleReseeder::new(ParticleRng::new(5));
        let mut b = CycleReseeder::new(ParticleRng::new(5));
        for _ in 0..10 {
            assert_eq!(a.reseed(), b.reseed());
        }
    }
}
