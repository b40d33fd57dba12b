//! Player application implementing winit ApplicationHandler
//!
//! One redraw is one frame: the driver ticks the configured demo view into
//! the acquired surface texture, which is then presented.

use ember_core::EmberConfig;
use ember_render::{demo_view, RenderContext, WgpuBackend};
use ember_runtime::{FrameDriver, ViewLifecycle};
use std::sync::Arc;
use tracing::{error, info, warn};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::ActiveEventLoop;
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Fullscreen, Window, WindowId};

pub struct PlayerApp {
    pub config: EmberConfig,

    // Frame driving
    driver: FrameDriver,
    view: Box<dyn ViewLifecycle<WgpuBackend>>,

    // Rendering
    window: Option<Arc<Window>>,
    render_context: Option<RenderContext>,
    backend: Option<WgpuBackend>,
}

impl PlayerApp {
    pub fn new(config: EmberConfig) -> Self {
        Self {
            driver: FrameDriver::new(config.simulation.pacing),
            view: demo_view(&config),
            config,
            window: None,
            render_context: None,
            backend: None,
        }
    }

    fn initialize(&mut self, event_loop: &ActiveEventLoop) {
        let window_config = &self.config.window;
        let window_attrs = Window::default_attributes()
            .with_title(window_config.title.clone())
            .with_inner_size(PhysicalSize::new(window_config.width, window_config.height));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                error!(error = %e, "Failed to create window");
                event_loop.exit();
                return;
            }
        };

        if window_config.fullscreen {
            window.set_fullscreen(Some(Fullscreen::Borderless(None)));
        }

        let render_context = match pollster::block_on(RenderContext::new(window.clone())) {
            Ok(context) => context,
            Err(e) => {
                error!(error = %e, "Failed to create render context");
                event_loop.exit();
                return;
            }
        };
        let mut backend = render_context.create_backend();

        // A failed start leaves the view producing blank frames
        if let Err(e) = self.driver.start(self.view.as_mut(), &mut backend) {
            warn!(error = %e, view = self.view.name(), "View did not initialize");
        }
        let size = render_context.size;
        self.driver
            .resize(self.view.as_mut(), &mut backend, size.width, size.height);

        info!(width = size.width, height = size.height, "Player window ready");
        self.window = Some(window);
        self.render_context = Some(render_context);
        self.backend = Some(backend);
    }

    fn render(&mut self) {
        // A paused driver draws nothing, so there is no frame to present
        if !self.driver.is_running() {
            return;
        }
        let (Some(context), Some(backend)) = (&self.render_context, &mut self.backend) else {
            return;
        };

        let output = match context.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                context.reconfigure();
                return;
            }
            Err(e) => {
                warn!(error = ?e, "Surface error");
                return;
            }
        };

        backend.begin_frame(context.frame_target(&output));
        self.driver.tick(self.view.as_mut(), backend);
        backend.end_frame();

        output.present();
    }

    /// Tear the view down, then leave the event loop
    fn exit(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(backend) = &mut self.backend {
            self.driver.shutdown(self.view.as_mut(), backend);
        }
        event_loop.exit();
    }
}

impl ApplicationHandler for PlayerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            self.initialize(event_loop);
        } else {
            self.driver.resume();
        }
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        self.driver.pause();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                self.exit(event_loop);
            }

            WindowEvent::Resized(new_size) => {
                if let Some(context) = &mut self.render_context {
                    context.resize(new_size);
                }
                if let Some(backend) = &mut self.backend {
                    self.driver
                        .resize(self.view.as_mut(), backend, new_size.width, new_size.height);
                }
            }

            WindowEvent::Occluded(occluded) => {
                if occluded {
                    self.driver.pause();
                } else {
                    self.driver.resume();
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.state != ElementState::Pressed {
                    return;
                }
                // Backspace stands in for a hardware back key
                if let PhysicalKey::Code(KeyCode::Escape | KeyCode::Backspace) = event.physical_key
                {
                    self.exit(event_loop);
                }
            }

            WindowEvent::RedrawRequested => {
                self.render();
            }

            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if !self.driver.is_running() {
            return;
        }
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(backend) = &mut self.backend {
            self.driver.shutdown(self.view.as_mut(), backend);
        }
    }
}
