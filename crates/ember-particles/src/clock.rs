//! Looping cycle clock

/// Accumulated `f32` error allowed when detecting the end of a cycle,
/// so fifty 0.02 steps close a cycle even though they sum to 0.9999996.
const CYCLE_END_TOLERANCE: f32 = 1e-5;

/// Fired when the clock wraps back to 0
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleBoundary;

/// Scalar cycle time in [0, 1], advanced once per frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationClock {
    time: f32,
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulationClock {
    /// Starts at the end of a cycle so the first advance reseeds immediately.
    pub fn new() -> Self {
        Self { time: 1.0 }
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    /// Advance by `delta` of cycle time, wrapping to 0 at the end of the cycle
    pub fn advance(&mut self, delta: f32) -> Option<CycleBoundary> {
        self.time += delta;
        if self.time >= 1.0 - CYCLE_END_TOLERANCE {
            self.time = 0.0;
            Some(CycleBoundary)
        } else {
            None
        }
    }
}
