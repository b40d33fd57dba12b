//! Ember Runtime - Frame loop infrastructure
//!
//! Provides the pieces that sit between a windowing surface and a renderer:
//! - `ViewLifecycle` - initialize / resize / on_frame / teardown contract
//! - `FrameClock` - wall-clock delta between frames
//! - `FrameDriver` - periodic invoker with pause, resume and ordered shutdown

mod clock;
mod driver;
mod system;

pub use clock::FrameClock;
pub use driver::{DriverState, FrameDriver};
pub use system::ViewLifecycle;
