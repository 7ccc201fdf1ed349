//! Frame pacing and the spinning cube renderer.
//!
//! The pacing core is backend-agnostic:
//! - [`frame_slots`]: the fixed ring of per-frame semaphores and fences
//! - [`images_in_flight`]: which slot last used each swapchain image
//! - [`scheduler`]: one render loop iteration
//! - [`lifecycle`]: swapchain rebuild
//!
//! It talks to the GPU through the traits in [`backend`]; [`vulkan`] and
//! [`resources`] implement them over `vkspin-rhi`, and [`Renderer`] ties it
//! all to a window.

pub mod backend;
pub mod frame_slots;
pub mod geometry;
pub mod images_in_flight;
pub mod lifecycle;
pub mod renderer;
pub mod resources;
pub mod scheduler;
pub mod ubo;
pub mod vulkan;

pub use renderer::Renderer;
pub use scheduler::{FrameOutcome, FrameScheduler};
