//! Platform layer for the renderer.
//!
//! - Window creation and size tracking via winit
//! - Surface extensions and RAII Vulkan surfaces via ash-window

mod window;

pub use window::{Surface, Window};

pub use winit::event::WindowEvent;
pub use winit::event_loop::{ActiveEventLoop, EventLoop};
