//! Single static triangle drawn through a `GpuBackend`

use crate::gpu::{AttributePointer, GpuBackend, ProgramHandle};
use crate::particle_renderer::CLEAR_COLOR;
use crate::shaders::{POSITION_LOCATION, TRIANGLE_FRAGMENT_SHADER, TRIANGLE_VERTEX_SHADER};
use ember_core::Result;
use ember_runtime::ViewLifecycle;
use tracing::{error, info};

/// Clip-space corners, three floats each
pub const TRIANGLE_VERTICES: [f32; 9] = [
    -0.5, -0.5, 0.0, //
    0.5, -0.5, 0.0, //
    0.0, 0.5, 0.0,
];

pub const TRIANGLE_ATTRIBUTE: AttributePointer = AttributePointer {
    location: POSITION_LOCATION,
    components: 3,
    stride: 0,
    offset: 0,
};

/// View with no state beyond its program. Frames are blank if it failed to link.
#[derive(Debug, Default)]
pub struct TriangleView {
    program: Option<ProgramHandle>,
}

impl TriangleView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn program(&self) -> Option<ProgramHandle> {
        self.program
    }
}

impl<B: GpuBackend + ?Sized> ViewLifecycle<B> for TriangleView {
    fn initialize(&mut self, gpu: &mut B) -> Result<()> {
        if self.program.is_some() {
            return Ok(());
        }
        let program = gpu
            .compile_and_link(TRIANGLE_VERTEX_SHADER, TRIANGLE_FRAGMENT_SHADER)
            .inspect_err(|e| error!(error = %e, "Triangle program failed to build"))?;
        info!(program = program.id(), "Triangle view ready");
        self.program = Some(program);
        Ok(())
    }

    fn resize(&mut self, gpu: &mut B, width: u32, height: u32) {
        gpu.set_viewport(width, height);
    }

    fn on_frame(&mut self, gpu: &mut B, _dt: f32) {
        gpu.clear(CLEAR_COLOR);
        if let Some(program) = self.program {
            gpu.use_program(program);
            gpu.bind_attribute(TRIANGLE_ATTRIBUTE, &TRIANGLE_VERTICES);
            gpu.enable_attribute(TRIANGLE_ATTRIBUTE.location);
            gpu.draw_triangles(0, 3);
        }
        gpu.flush();
    }

    fn teardown(&mut self, gpu: &mut B) {
        if let Some(program) = self.program.take() {
            gpu.release(program);
        }
    }

    fn name(&self) -> &str {
        "triangle"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recording::{GpuCommand, RecordingBackend};
    use ember_core::FramePacing;
    use ember_runtime::FrameDriver;

    #[test]
    fn frame_command_sequence() {
        let mut gpu = RecordingBackend::new();
        let mut driver = FrameDriver::new(FramePacing::default());
        let mut view = TriangleView::new();
        driver.start(&mut view, &mut gpu).unwrap();
        let program = view.program().unwrap();
        gpu.take_commands();

        driver.tick(&mut view, &mut gpu);
        driver.tick(&mut view, &mut gpu);

        let frame = vec![
            GpuCommand::Clear { color: CLEAR_COLOR },
            GpuCommand::UseProgram { program },
            GpuCommand::BindAttribute {
                pointer: TRIANGLE_ATTRIBUTE,
                floats: 9,
            },
            GpuCommand::EnableAttribute {
                location: POSITION_LOCATION,
            },
            GpuCommand::DrawTriangles {
                first: 0,
                count: 3,
                program: Some(program),
                blend: None,
                enabled: vec![POSITION_LOCATION],
            },
            GpuCommand::Flush,
        ];
        assert_eq!(gpu.frames(), vec![frame.as_slice(), frame.as_slice()]);
        assert_eq!(gpu.bound_data(), Some(TRIANGLE_VERTICES.as_slice()));
    }

    #[test]
    fn failed_link_clears_only() {
        let mut gpu = RecordingBackend::failing_link("no compiler");
        let mut driver = FrameDriver::new(FramePacing::default());
        let mut view = TriangleView::new();
        assert!(driver.start(&mut view, &mut gpu).is_err());
        gpu.take_commands();

        driver.tick(&mut view, &mut gpu);
        assert_eq!(
            gpu.commands(),
            &[GpuCommand::Clear { color: CLEAR_COLOR }, GpuCommand::Flush]
        );
    }

    #[test]
    fn resize_then_teardown() {
        let mut gpu = RecordingBackend::new();
        let mut driver = FrameDriver::new(FramePacing::default());
        let mut view = TriangleView::new();
        driver.start(&mut view, &mut gpu).unwrap();
        let program = view.program().unwrap();

        driver.resize(&mut view, &mut gpu, 320, 240);
        driver.shutdown(&mut view, &mut gpu);

        let tail = &gpu.commands()[gpu.commands().len() - 2..];
        assert_eq!(
            tail,
            &[
                GpuCommand::Viewport {
                    width: 320,
                    height: 240
                },
                GpuCommand::Release { program },
            ]
        );
        assert_eq!(gpu.live_programs(), 0);
        assert!(view.program().is_none());
    }
}
