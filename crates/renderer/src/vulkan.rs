//! Vulkan implementations of the device and swapchain collaborators.

use std::sync::Arc;
use std::time::Duration;

use ash::vk;
use vkspin_platform::Surface;
use vkspin_rhi::RhiResult;
use vkspin_rhi::device::Device;
use vkspin_rhi::instance::Instance;
use vkspin_rhi::swapchain::{AcquireOutcome, PresentOutcome, Swapchain};
use vkspin_rhi::sync::{Fence, Semaphore};

use crate::backend::{FrameDevice, PresentTarget};

/// Logical device as seen by the frame scheduler.
pub struct VulkanDevice {
    device: Arc<Device>,
}

impl VulkanDevice {
    pub fn new(device: Arc<Device>) -> Self {
        Self { device }
    }

    #[inline]
    pub fn device(&self) -> &Arc<Device> {
        &self.device
    }
}

impl FrameDevice for VulkanDevice {
    type Semaphore = Semaphore;
    type Fence = Fence;
    type CommandBuffer = vk::CommandBuffer;

    fn create_semaphore(&self) -> RhiResult<Semaphore> {
        Semaphore::new(self.device.clone())
    }

    fn create_fence(&self, signaled: bool) -> RhiResult<Fence> {
        Fence::new(self.device.clone(), signaled)
    }

    fn wait_for_fence(&self, fence: &Fence, timeout: Option<Duration>) -> RhiResult<()> {
        fence.wait(timeout)
    }

    fn reset_fence(&self, fence: &Fence) -> RhiResult<()> {
        fence.reset()
    }

    fn submit(
        &self,
        command_buffer: vk::CommandBuffer,
        wait: &Semaphore,
        signal: &Semaphore,
        fence: &Fence,
    ) -> RhiResult<()> {
        let wait_semaphores = [wait.handle()];
        let wait_stages = [vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT];
        let command_buffers = [command_buffer];
        let signal_semaphores = [signal.handle()];

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        // SAFETY: The command buffer was recorded against live resources, the
        // fence was reset by the caller, and every handle belongs to this
        // device.
        unsafe { self.device.submit_graphics(&[submit_info], fence.handle()) }
    }

    fn wait_idle(&self) -> RhiResult<()> {
        self.device.wait_idle()
    }
}

/// Swapchain plus what it needs to be recreated, borrowed for one frame.
pub struct SwapchainTarget<'a> {
    pub instance: &'a Instance,
    pub surface: &'a Surface,
    pub swapchain: &'a mut Swapchain,
    pub present_queue: vk::Queue,
}

impl PresentTarget<VulkanDevice> for SwapchainTarget<'_> {
    fn acquire_next_image(
        &mut self,
        timeout: Option<Duration>,
        signal: &Semaphore,
    ) -> RhiResult<AcquireOutcome> {
        self.swapchain.acquire_next_image(timeout, signal.handle())
    }

    fn present(&mut self, image_index: u32, wait: &Semaphore) -> RhiResult<PresentOutcome> {
        self.swapchain
            .present(self.present_queue, image_index, wait.handle())
    }

    fn extent(&self) -> vk::Extent2D {
        self.swapchain.extent()
    }

    fn format(&self) -> vk::Format {
        self.swapchain.format()
    }

    fn image_views(&self) -> &[vk::ImageView] {
        self.swapchain.image_views()
    }

    fn recreate(&mut self, extent: vk::Extent2D) -> RhiResult<()> {
        self.swapchain.recreate(
            self.instance,
            self.surface.handle(),
            extent.width,
            extent.height,
        )
    }
}
