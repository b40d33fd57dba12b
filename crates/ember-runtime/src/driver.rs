//! Periodic frame invoker

use crate::clock::FrameClock;
use crate::system::ViewLifecycle;
use ember_core::{FramePacing, Result};
use std::time::Instant;
use tracing::{debug, info};

/// Where the driver is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// Created, view not initialized yet
    Idle,
    Running,
    /// Ticks are ignored until `resume`
    Paused,
    /// View torn down; nothing is forwarded any more
    Stopped,
}

/// Calls a view's `on_frame` once per tick.
///
/// Holding the view only by `&mut` for the duration of each call means two
/// frames can never overlap, and `shutdown` flips to `Stopped` before
/// teardown so no frame can follow it.
pub struct FrameDriver {
    pacing: FramePacing,
    clock: FrameClock,
    state: DriverState,
    frames: u64,
}

impl FrameDriver {
    pub fn new(pacing: FramePacing) -> Self {
        Self {
            pacing,
            clock: FrameClock::new(),
            state: DriverState::Idle,
            frames: 0,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Whether ticks currently reach the view
    pub fn is_running(&self) -> bool {
        self.state == DriverState::Running
    }

    /// Frames delivered so far
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Initialize the view and start running.
    ///
    /// The driver runs even when initialization fails; a view that failed to
    /// set up is expected to produce blank frames. The error is returned for
    /// the caller to report.
    pub fn start<C, V>(&mut self, view: &mut V, ctx: &mut C) -> Result<()>
    where
        C: ?Sized,
        V: ViewLifecycle<C> + ?Sized,
    {
        if self.state != DriverState::Idle {
            return Ok(());
        }
        info!(view = view.name(), pacing = ?self.pacing, "Starting frame driver");
        self.state = DriverState::Running;
        self.clock.reset();
        view.initialize(ctx)
    }

    /// Deliver one frame if running. Returns whether `on_frame` was called.
    pub fn tick<C, V>(&mut self, view: &mut V, ctx: &mut C) -> bool
    where
        C: ?Sized,
        V: ViewLifecycle<C> + ?Sized,
    {
        self.tick_at(view, ctx, Instant::now())
    }

    pub fn tick_at<C, V>(&mut self, view: &mut V, ctx: &mut C, now: Instant) -> bool
    where
        C: ?Sized,
        V: ViewLifecycle<C> + ?Sized,
    {
        if self.state != DriverState::Running {
            return false;
        }
        let elapsed = self.clock.tick_at(now) as f32;
        let dt = match self.pacing {
            FramePacing::Fixed { delta } => delta,
            FramePacing::Elapsed { scale, max_delta } => (elapsed * scale).min(max_delta),
        };
        view.on_frame(ctx, dt);
        self.frames += 1;
        true
    }

    /// Forward a surface size change to an initialized view
    pub fn resize<C, V>(&mut self, view: &mut V, ctx: &mut C, width: u32, height: u32)
    where
        C: ?Sized,
        V: ViewLifecycle<C> + ?Sized,
    {
        if matches!(self.state, DriverState::Running | DriverState::Paused) {
            debug!(width, height, "Resizing view");
            view.resize(ctx, width, height);
        }
    }

    pub fn pause(&mut self) {
        if self.state == DriverState::Running {
            info!(frames = self.frames, "Pausing frame driver");
            self.state = DriverState::Paused;
        }
    }

    /// Continue from the same simulation state; the paused interval is not credited.
    pub fn resume(&mut self) {
        if self.state == DriverState::Paused {
            info!("Resuming frame driver");
            self.state = DriverState::Running;
            self.clock.reset();
        }
    }

    /// Stop ticking for good, then tear the view down exactly once
    pub fn shutdown<C, V>(&mut self, view: &mut V, ctx: &mut C)
    where
        C: ?Sized,
        V: ViewLifecycle<C> + ?Sized,
    {
        let previous = self.state;
        if previous == DriverState::Stopped {
            return;
        }
        self.state = DriverState::Stopped;
        if previous != DriverState::Idle {
            info!(view = view.name(), frames = self.frames, "Tearing down view");
            view.teardown(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_core::EmberError;
    use std::time::Duration;

    #[derive(Debug, PartialEq)]
    enum Call {
        Initialize,
        Resize(u32, u32),
        Frame(f32),
        Teardown,
    }

    #[derive(Default)]
    struct ScriptedView {
        calls: Vec<Call>,
        fail_init: bool,
    }

    impl ViewLifecycle<()> for ScriptedView {
        fn initialize(&mut self, _ctx: &mut ()) -> Result<()> {
            self.calls.push(Call::Initialize);
            if self.fail_init {
                return Err(EmberError::ProgramLink("scripted".into()));
            }
            Ok(())
        }

        fn resize(&mut self, _ctx: &mut (), width: u32, height: u32) {
            self.calls.push(Call::Resize(width, height));
        }

        fn on_frame(&mut self, _ctx: &mut (), dt: f32) {
            self.calls.push(Call::Frame(dt));
        }

        fn teardown(&mut self, _ctx: &mut ()) {
            self.calls.push(Call::Teardown);
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    #[test]
    fn ticks_before_start_are_ignored() {
        let mut driver = FrameDriver::new(FramePacing::default());
        let mut view = ScriptedView::default();
        assert!(!driver.tick(&mut view, &mut ()));
        driver.resize(&mut view, &mut (), 10, 10);
        assert!(view.calls.is_empty());
    }

    #[test]
    fn fixed_pacing_delivers_constant_delta() {
        let mut driver = FrameDriver::new(FramePacing::Fixed { delta: 0.02 });
        let mut view = ScriptedView::default();
        driver.start(&mut view, &mut ()).unwrap();
        for _ in 0..3 {
            assert!(driver.tick(&mut view, &mut ()));
        }
        assert_eq!(
            view.calls,
            vec![
                Call::Initialize,
                Call::Frame(0.02),
                Call::Frame(0.02),
                Call::Frame(0.02)
            ]
        );
        assert_eq!(driver.frames(), 3);
    }

    #[test]
    fn elapsed_pacing_scales_and_clamps() {
        let mut driver = FrameDriver::new(FramePacing::Elapsed {
            scale: 0.5,
            max_delta: 0.25,
        });
        let mut view = ScriptedView::default();
        driver.start(&mut view, &mut ()).unwrap();
        let t0 = Instant::now();
        driver.tick_at(&mut view, &mut (), t0);
        driver.tick_at(&mut view, &mut (), t0 + Duration::from_millis(100));
        driver.tick_at(&mut view, &mut (), t0 + Duration::from_secs(10));

        let deltas: Vec<f32> = view
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Frame(dt) => Some(*dt),
                _ => None,
            })
            .collect();
        assert_eq!(deltas.len(), 3);
        assert_eq!(deltas[0], 0.0);
        assert!((deltas[1] - 0.05).abs() < 1e-6);
        assert_eq!(deltas[2], 0.25);
    }

    #[test]
    fn paused_driver_skips_frames_and_resumes() {
        let mut driver = FrameDriver::new(FramePacing::default());
        let mut view = ScriptedView::default();
        driver.start(&mut view, &mut ()).unwrap();
        driver.pause();
        assert_eq!(driver.state(), DriverState::Paused);
        assert!(!driver.tick(&mut view, &mut ()));
        driver.resize(&mut view, &mut (), 640, 480);
        driver.resume();
        assert!(driver.tick(&mut view, &mut ()));
        assert_eq!(
            view.calls,
            vec![Call::Initialize, Call::Resize(640, 480), Call::Frame(0.02)]
        );
    }

    #[test]
    fn only_a_running_driver_wants_frames() {
        let mut driver = FrameDriver::new(FramePacing::default());
        let mut view = ScriptedView::default();
        assert!(!driver.is_running());

        driver.start(&mut view, &mut ()).unwrap();
        assert!(driver.is_running());

        driver.pause();
        assert!(!driver.is_running());
        driver.resume();
        assert!(driver.is_running());

        driver.shutdown(&mut view, &mut ());
        assert!(!driver.is_running());
    }

    #[test]
    fn shutdown_tears_down_once_and_blocks_frames() {
        let mut driver = FrameDriver::new(FramePacing::default());
        let mut view = ScriptedView::default();
        driver.start(&mut view, &mut ()).unwrap();
        driver.tick(&mut view, &mut ());
        driver.shutdown(&mut view, &mut ());
        driver.shutdown(&mut view, &mut ());
        assert!(!driver.tick(&mut view, &mut ()));
        driver.resume();
        assert!(!driver.tick(&mut view, &mut ()));
        assert_eq!(
            view.calls,
            vec![Call::Initialize, Call::Frame(0.02), Call::Teardown]
        );
    }

    #[test]
    fn shutdown_before_start_skips_teardown() {
        let mut driver = FrameDriver::new(FramePacing::default());
        let mut view = ScriptedView::default();
        driver.shutdown(&mut view, &mut ());
        assert!(view.calls.is_empty());
        assert_eq!(driver.state(), DriverState::Stopped);
    }

    #[test]
    fn failed_initialize_still_runs_frames() {
        let mut driver = FrameDriver::new(FramePacing::default());
        let mut view = ScriptedView {
            fail_init: true,
            ..Default::default()
        };
        assert!(driver.start(&mut view, &mut ()).is_err());
        assert!(driver.tick(&mut view, &mut ()));
        assert_eq!(driver.state(), DriverState::Running);
    }
}
