//! Platform layer: windowing, event loop and per-frame timing.
//!
//! Design goals:
//! - The scene sees only plain values: a GPU handle, an input snapshot and
//!   the elapsed time since the previous frame.
//! - Proper handling of resize/scale/surface-loss/close.
//! - Clear log messages to help future debugging.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use winit::{
    dpi::PhysicalSize,
    event::{Event, WindowEvent},
    event_loop::EventLoop,
    window::Window,
};

use renderer::{FrameCtx, Gpu};

pub mod input;

pub use input::InputState;
pub use winit::event::ElementState;
pub use winit::keyboard::{KeyCode, PhysicalKey};

/// Per-frame application hooks driven by [`run`].
pub trait App {
    /// Called once, after the GPU device is ready and before the first frame.
    fn init(&mut self, gpu: &Gpu) -> Result<()>;

    /// Called once per redraw with a frame ready for recording. `dt` is the
    /// elapsed time since the previous frame, in seconds.
    fn frame(&mut self, gpu: &Gpu, ctx: &mut FrameCtx, input: &InputState, dt: f32) -> Result<()>;
}

#[derive(Clone, Debug)]
pub struct WindowOptions {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub backends: wgpu::Backends,
}

impl Default for WindowOptions {
    fn default() -> Self {
        Self {
            title: "Veles3D".to_owned(),
            width: 1280,
            height: 720,
            backends: wgpu::Backends::all(),
        }
    }
}

/// Create the window and GPU state, run `app` until the window closes.
/// Load/build in `init` completes fully before any frame is issued; the
/// loop itself is single-threaded.
#[allow(deprecated)] // winit 0.30 closure-style event loop
pub fn run(options: WindowOptions, mut app: impl App + 'static) -> Result<()> {
    let event_loop: EventLoop<()> = EventLoop::new()?;

    let window_attributes = Window::default_attributes()
        .with_title(&options.title)
        .with_inner_size(PhysicalSize::new(options.width.max(1), options.height.max(1)));
    #[allow(deprecated)]
    let window = event_loop.create_window(window_attributes)?;
    let window = Arc::new(window);

    log::info!(
        "Window created: {}x{}",
        window.inner_size().width,
        window.inner_size().height
    );

    let mut gpu = pollster::block_on(Gpu::new(window.clone(), options.backends))?;
    app.init(&gpu)?;

    let mut input = InputState::new();
    let mut last_frame = Instant::now();

    event_loop.run(move |event, window_target| {
        match event {
            Event::WindowEvent { event, .. } => match event {
                WindowEvent::CloseRequested => {
                    log::info!("Close requested. Exiting event loop.");
                    window_target.exit();
                }
                WindowEvent::Resized(new_size) => {
                    log::info!("Resized: {}x{}", new_size.width, new_size.height);
                    gpu.resize(new_size.width, new_size.height);
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    input.handle_key(event.physical_key, event.state);
                }
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    let dt = (now - last_frame).as_secs_f32();
                    last_frame = now;

                    match gpu.begin_frame() {
                        Ok(mut ctx) => {
                            if let Err(err) = app.frame(&gpu, &mut ctx, &input, dt) {
                                log::error!("frame failed: {err:#}");
                                window_target.exit();
                                return;
                            }
                            gpu.end_frame(ctx);
                        }
                        Err(err) if Gpu::is_surface_lost(&err) => {
                            log::warn!("surface lost, recreating");
                            gpu.recreate_surface();
                        }
                        Err(wgpu::SurfaceError::OutOfMemory) => {
                            log::error!("surface out of memory, exiting");
                            window_target.exit();
                        }
                        Err(err) => {
                            log::warn!("frame skipped: {err:?}");
                        }
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                window.request_redraw();
            }
            _ => {}
        }
    })?;

    Ok(())
}
