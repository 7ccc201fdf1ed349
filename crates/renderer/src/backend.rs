//! Collaborator interfaces of the frame pacing core.
//!
//! The scheduler and lifecycle manager only talk to the GPU through these
//! three traits:
//!
//! - [`FrameDevice`] creates and drives synchronization primitives and owns
//!   the graphics queue
//! - [`PresentTarget`] is the swapchain: acquire, present, recreate
//! - [`FrameResources`] is everything sized by the swapchain (render pass,
//!   pipeline, framebuffers, per-image uniforms and command buffers)
//!
//! The Vulkan renderer implements them over `vkspin-rhi`; tests implement
//! them with a recording mock.

use std::time::Duration;

use ash::vk;
use vkspin_rhi::RhiResult;
use vkspin_rhi::swapchain::{AcquireOutcome, PresentOutcome};

/// Device and queue provider.
pub trait FrameDevice {
    /// Binary GPU-to-GPU signal.
    type Semaphore;
    /// GPU-to-host completion signal.
    type Fence;
    /// Handle of a recorded command buffer.
    type CommandBuffer: Copy;

    fn create_semaphore(&self) -> RhiResult<Self::Semaphore>;

    /// Creates a fence, optionally already signaled.
    fn create_fence(&self, signaled: bool) -> RhiResult<Self::Fence>;

    /// Blocks until `fence` is signaled. `None` waits forever; an expired
    /// bounded wait is `RhiError::Timeout`.
    fn wait_for_fence(&self, fence: &Self::Fence, timeout: Option<Duration>) -> RhiResult<()>;

    fn reset_fence(&self, fence: &Self::Fence) -> RhiResult<()>;

    /// Submits `command_buffer` to the graphics queue. The submission waits
    /// on `wait` at the color attachment output stage, then signals `signal`
    /// and `fence` on completion.
    fn submit(
        &self,
        command_buffer: Self::CommandBuffer,
        wait: &Self::Semaphore,
        signal: &Self::Semaphore,
        fence: &Self::Fence,
    ) -> RhiResult<()>;

    /// Blocks until every queue is idle.
    fn wait_idle(&self) -> RhiResult<()>;
}

/// Swapchain provider.
pub trait PresentTarget<D: FrameDevice> {
    /// Acquires the next presentable image; `signal` is raised once the
    /// presentation engine has released it.
    fn acquire_next_image(
        &mut self,
        timeout: Option<Duration>,
        signal: &D::Semaphore,
    ) -> RhiResult<AcquireOutcome>;

    /// Queues `image_index` for presentation after `wait`.
    fn present(&mut self, image_index: u32, wait: &D::Semaphore) -> RhiResult<PresentOutcome>;

    fn extent(&self) -> vk::Extent2D;

    fn format(&self) -> vk::Format;

    /// One view per swapchain image, in image order.
    fn image_views(&self) -> &[vk::ImageView];

    /// Number of images (M).
    fn image_count(&self) -> usize {
        self.image_views().len()
    }

    /// Replaces the swapchain for a framebuffer of `extent`, re-querying the
    /// surface. The device must be idle.
    fn recreate(&mut self, extent: vk::Extent2D) -> RhiResult<()>;
}

/// Builder of everything that depends on the swapchain.
pub trait FrameResources<D: FrameDevice> {
    /// Destroys all swapchain-dependent resources. The device must be idle.
    fn teardown(&mut self);

    /// Creates all swapchain-dependent resources for the images behind
    /// `image_views`, all of `extent` and `format`.
    fn rebuild_all(
        &mut self,
        extent: vk::Extent2D,
        format: vk::Format,
        image_views: &[vk::ImageView],
    ) -> RhiResult<()>;

    /// Refreshes per-frame transient state (uniform data) of one image.
    fn update_frame(&mut self, image_index: u32) -> RhiResult<()>;

    /// The pre-recorded command buffer that draws into `image_index`.
    fn command_buffer(&self, image_index: u32) -> RhiResult<D::CommandBuffer>;
}
