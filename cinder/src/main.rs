use std::time::Duration;

use anyhow::Result;
use ash::vk;
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

use cinder::context::DEFAULT_WINDOW_EXTENT;
use cinder::Engine;

#[derive(Default)]
struct App {
    window: Option<winit::window::Window>,
    engine: Option<Engine>,
}

impl App {
    /// Any failure in the frame path leaves the GPU in a state that cannot be reasoned
    /// about; log it and terminate without attempting recovery.
    fn fatal(err: anyhow::Error) -> ! {
        error!("fatal rendering error: {err:#}");
        std::process::exit(1);
    }
}

impl winit::application::ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &winit::event_loop::ActiveEventLoop) {
        if self.window.is_none() {
            let window = match event_loop.create_window(
                winit::window::WindowAttributes::default()
                    .with_title("cinder")
                    .with_inner_size(winit::dpi::PhysicalSize::new(
                        DEFAULT_WINDOW_EXTENT.width,
                        DEFAULT_WINDOW_EXTENT.height,
                    ))
                    .with_resizable(true),
            ) {
                Ok(window) => window,
                Err(err) => Self::fatal(err.into()),
            };
            match Engine::new(&window) {
                Ok(engine) => self.engine = Some(engine),
                Err(err) => Self::fatal(err),
            }
            self.window = Some(window);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &winit::event_loop::ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: winit::event::WindowEvent,
    ) {
        let Some(window) = self.window.as_ref() else {
            return;
        };

        match event {
            winit::event::WindowEvent::CloseRequested => {
                if let Some(engine) = self.engine.take() {
                    if let Err(err) = engine.shutdown() {
                        Self::fatal(err);
                    }
                }
                event_loop.exit();
            }
            winit::event::WindowEvent::Resized(new_size) => {
                if let Some(engine) = self.engine.as_mut() {
                    // zero-sized means minimized; throttle instead of rendering
                    engine.stop_rendering = new_size.width == 0 || new_size.height == 0;
                    if !engine.stop_rendering {
                        engine.swapchain.resize_requested = true;
                    }
                }
            }
            winit::event::WindowEvent::RedrawRequested => {
                let Some(engine) = self.engine.as_mut() else {
                    return;
                };
                if engine.stop_rendering {
                    return;
                }
                if engine.swapchain.resize_requested {
                    let size = window.inner_size();
                    if size.width == 0 || size.height == 0 {
                        return;
                    }
                    if let Err(err) = engine.resize_swapchain(vk::Extent2D {
                        width: size.width,
                        height: size.height,
                    }) {
                        Self::fatal(err);
                    }
                }
                engine.overlay.new_frame();
                if let Err(err) = engine.draw() {
                    Self::fatal(err);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &winit::event_loop::ActiveEventLoop) {
        let Some(window) = self.window.as_ref() else {
            return;
        };
        if self
            .engine
            .as_ref()
            .map(|engine| engine.stop_rendering)
            .unwrap_or(false)
        {
            // minimized; avoid spinning the loop at full speed
            std::thread::sleep(Duration::from_millis(100));
        }
        window.request_redraw();
    }
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let event_loop = winit::event_loop::EventLoop::new()?;
    event_loop.set_control_flow(winit::event_loop::ControlFlow::Poll);
    let mut app = App::default();
    event_loop.run_app(&mut app)?;
    Ok(())
}
