//! vkspin - Main Entry Point
//!
//! Opens a window and spins a colored cube with Vulkan until the window is
//! closed. Configuration is read from the TOML file named by `VKSPIN_CONFIG`
//! or the first command line argument; without either, defaults apply.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, error, info};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::WindowId;

use vkspin_core::{AppConfig, Timer};
use vkspin_platform::Window;
use vkspin_renderer::{FrameOutcome, Renderer};

const CONFIG_ENV: &str = "VKSPIN_CONFIG";
const FPS_REPORT_INTERVAL: Duration = Duration::from_secs(5);

struct App {
    config: AppConfig,
    // Dropped in declaration order: the renderer (and its surface) before
    // the window it draws into.
    renderer: Option<Renderer>,
    window: Option<Window>,
    timer: Timer,
    fatal: Option<anyhow::Error>,
}

impl App {
    fn new(config: AppConfig) -> Self {
        Self {
            config,
            renderer: None,
            window: None,
            timer: Timer::new(),
            fatal: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        error!("{:#}", err);
        self.fatal = Some(err);
        self.shutdown(event_loop);
    }

    /// Waits for the GPU, then destroys the renderer before the window.
    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        if let Some(renderer) = self.renderer.take() {
            if let Err(e) = renderer.wait_idle() {
                error!("Failed to wait for device idle on shutdown: {:?}", e);
            }
            drop(renderer);
        }
        self.window = None;
        event_loop.exit();
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(window), Some(renderer)) = (self.window.as_ref(), self.renderer.as_mut()) else {
            return;
        };

        let (width, height) = window.framebuffer_size();
        match renderer.render_frame(width, height) {
            Ok(FrameOutcome::Presented { .. }) => {
                self.timer.tick();
                if let Some(fps) = self.timer.fps_report(FPS_REPORT_INTERVAL) {
                    info!("{:.1} fps", fps);
                }
            }
            Ok(FrameOutcome::OutOfDate) => debug!("Frame dropped, swapchain rebuilt"),
            Ok(FrameOutcome::Skipped) => {}
            Err(e) => self.fail(event_loop, anyhow!(e).context("Rendering failed")),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window = match Window::new(event_loop, &self.config.window) {
            Ok(window) => window,
            Err(e) => {
                self.fail(event_loop, anyhow!(e).context("Failed to create window"));
                return;
            }
        };

        match Renderer::new(&window, &self.config) {
            Ok(renderer) => {
                info!("Initialization complete, entering main loop");
                self.renderer = Some(renderer);
                self.window = Some(window);
            }
            Err(e) => {
                self.fail(event_loop, anyhow!(e).context("Failed to create renderer"));
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                self.shutdown(event_loop);
            }
            WindowEvent::Resized(size) => {
                if let Some(ref mut window) = self.window {
                    window.resize(size.width, size.height);
                }
                if let Some(ref mut renderer) = self.renderer {
                    renderer.request_resize();
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}

/// Path from `VKSPIN_CONFIG`, else the first argument.
fn config_path() -> Option<PathBuf> {
    std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .or_else(|| std::env::args_os().nth(1).map(PathBuf::from))
}

fn load_config() -> Result<AppConfig> {
    match config_path() {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            AppConfig::load(&path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))
        }
        None => {
            debug!("No configuration file given, using defaults");
            Ok(AppConfig::default())
        }
    }
}

fn main() -> Result<()> {
    vkspin_core::init_logging();
    info!("Starting vkspin");

    let config = load_config()?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;

    match app.fatal.take() {
        Some(err) => Err(err),
        None => {
            info!("Shut down cleanly");
            Ok(())
        }
    }
}
