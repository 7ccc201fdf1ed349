//! Vulkan abstraction layer (Render Hardware Interface).
//!
//! Safe RAII wrappers over `ash` for everything a single-pass forward
//! renderer needs:
//! - Instance, physical device selection and logical device creation
//! - Swapchain management with typed acquire/present outcomes
//! - Semaphores and fences with bounded waits
//! - Command pools, buffers, descriptors, render pass and framebuffers
//! - WGSL shader compilation and graphics pipeline creation

mod error;

pub mod buffer;
pub mod command;
pub mod descriptor;
pub mod device;
pub mod framebuffer;
pub mod instance;
pub mod physical_device;
pub mod pipeline;
pub mod render_pass;
pub mod shader;
pub mod swapchain;
pub mod sync;
pub mod vertex;

pub use error::{RhiError, RhiResult};

pub use ash::vk;
