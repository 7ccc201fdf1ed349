//! RHI-specific error types.

use std::time::Duration;

use thiserror::Error;

/// RHI-specific error type.
#[derive(Error, Debug)]
pub enum RhiError {
    /// Vulkan API error
    #[error("Vulkan error: {0}")]
    VulkanError(#[from] ash::vk::Result),

    /// Failed to load Vulkan
    #[error("Failed to load Vulkan: {0}")]
    LoadingError(#[from] ash::LoadingError),

    /// GPU allocator error
    #[error("Allocator error: {0}")]
    AllocatorError(#[from] gpu_allocator::AllocationError),

    /// No GPU satisfies the requested queues, extensions and surface support
    #[error("No suitable GPU found")]
    NoSuitableGpu,

    /// Shader translation or module creation error
    #[error("Shader error: {0}")]
    ShaderError(String),

    /// Surface creation error
    #[error("Surface error: {0}")]
    SurfaceError(String),

    /// Swapchain error
    #[error("Swapchain error: {0}")]
    SwapchainError(String),

    /// Invalid handle or argument
    #[error("Invalid handle: {0}")]
    InvalidHandle(String),

    /// Pipeline creation error
    #[error("Pipeline error: {0}")]
    PipelineError(String),

    /// A bounded wait on a fence or image acquisition expired
    #[error("Timed out after {0:?} waiting for {1}")]
    Timeout(Duration, &'static str),
}

/// Result type alias for RHI operations.
pub type RhiResult<T> = std::result::Result<T, RhiError>;
