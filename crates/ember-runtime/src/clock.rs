//! Wall-clock frame timing

use std::time::Instant;

/// Measures the time between consecutive frames
pub struct FrameClock {
    /// Total measured time in seconds
    pub total_time: f64,
    /// Time since last frame in seconds
    pub delta_time: f64,
    /// Last tick instant
    last_instant: Instant,
    /// Whether the next tick starts a new measurement
    first_tick: bool,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self {
            total_time: 0.0,
            delta_time: 0.0,
            last_instant: Instant::now(),
            first_tick: true,
        }
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock. Call once per frame.
    pub fn tick(&mut self) -> f64 {
        self.tick_at(Instant::now())
    }

    /// Advance the clock to `now`, returning the seconds since the previous tick.
    /// The first tick after construction or `reset` returns 0.
    pub fn tick_at(&mut self, now: Instant) -> f64 {
        if self.first_tick {
            self.first_tick = false;
            self.last_instant = now;
            self.delta_time = 0.0;
            return 0.0;
        }

        self.delta_time = now.saturating_duration_since(self.last_instant).as_secs_f64();
        self.last_instant = now;
        self.total_time += self.delta_time;
        self.delta_time
    }

    /// Forget the previous tick, e.g. after a pause
    pub fn reset(&mut self) {
        self.first_tick = true;
        self.delta_time = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_clock_defaults() {
        let clock = FrameClock::new();
        assert_eq!(clock.total_time, 0.0);
        assert_eq!(clock.delta_time, 0.0);
    }

    #[test]
    fn test_first_tick_zero_delta() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.tick(), 0.0);
    }

    #[test]
    fn test_measures_between_ticks() {
        let mut clock = FrameClock::new();
        let start = Instant::now();
        clock.tick_at(start);
        let dt = clock.tick_at(start + Duration::from_millis(40));
        assert!((dt - 0.04).abs() < 1e-9);
        clock.tick_at(start + Duration::from_millis(50));
        assert!((clock.total_time - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_reset_skips_the_gap() {
        let mut clock = FrameClock::new();
        let start = Instant::now();
        clock.tick_at(start);
        clock.reset();
        assert_eq!(clock.tick_at(start + Duration::from_secs(30)), 0.0);
        assert_eq!(clock.total_time, 0.0);
    }
}
