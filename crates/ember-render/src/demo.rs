//! Picks the view a `Demo` runs

use crate::gpu::GpuBackend;
use crate::particle_renderer::ParticleRenderer;
use crate::triangle_view::TriangleView;
use ember_core::{Demo, EmberConfig};
use ember_runtime::ViewLifecycle;

pub fn demo_view<B>(config: &EmberConfig) -> Box<dyn ViewLifecycle<B>>
where
    B: GpuBackend + ?Sized + 'static,
{
    match config.demo {
        Demo::Particles => Box::new(ParticleRenderer::new(config.simulation.clone())),
        Demo::Triangle => Box::new(TriangleView::new()),
    }
}
