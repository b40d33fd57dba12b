//! View lifecycle trait

use ember_core::Result;

/// A view whose frames are produced by a `FrameDriver`
///
/// `C` is whatever the view draws with (a GPU backend, usually). The driver
/// guarantees `initialize` runs before any frame, frames never overlap, and
/// `teardown` runs once after the last frame.
pub trait ViewLifecycle<C: ?Sized> {
    /// Called once when the drawing context becomes available
    fn initialize(&mut self, ctx: &mut C) -> Result<()>;

    /// Called when the surface changes size
    fn resize(&mut self, ctx: &mut C, width: u32, height: u32);

    /// Called once per tick with the cycle-time delta for this frame
    fn on_frame(&mut self, ctx: &mut C, dt: f32);

    /// Called once the driver will never tick this view again
    fn teardown(&mut self, ctx: &mut C);

    /// Human-readable name for this view
    fn name(&self) -> &str;
}
