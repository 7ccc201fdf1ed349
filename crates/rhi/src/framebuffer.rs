//! Framebuffers binding swapchain image views to a render pass.

use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::device::Device;
use crate::error::RhiResult;

/// One framebuffer over a single color image view.
pub struct Framebuffer {
    device: Arc<Device>,
    framebuffer: vk::Framebuffer,
}

impl Framebuffer {
    pub fn new(
        device: Arc<Device>,
        render_pass: vk::RenderPass,
        view: vk::ImageView,
        extent: vk::Extent2D,
    ) -> RhiResult<Self> {
        let attachments = [view];
        let create_info = vk::FramebufferCreateInfo::default()
            .render_pass(render_pass)
            .attachments(&attachments)
            .width(extent.width)
            .height(extent.height)
            .layers(1);

        let framebuffer = unsafe { device.handle().create_framebuffer(&create_info, None)? };

        Ok(Self {
            device,
            framebuffer,
        })
    }

    /// Creates one framebuffer per image view, in image order.
    ///
    /// Framebuffers created before a failure are destroyed on return.
    pub fn for_views(
        device: &Arc<Device>,
        render_pass: vk::RenderPass,
        views: &[vk::ImageView],
        extent: vk::Extent2D,
    ) -> RhiResult<Vec<Self>> {
        let framebuffers = views
            .iter()
            .map(|&view| Self::new(device.clone(), render_pass, view, extent))
            .collect::<RhiResult<Vec<_>>>()?;

        debug!(
            "Created {} framebuffer(s) at {}x{}",
            framebuffers.len(),
            extent.width,
            extent.height
        );

        Ok(framebuffers)
    }

    #[inline]
    pub fn handle(&self) -> vk::Framebuffer {
        self.framebuffer
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        unsafe {
            self.device
                .handle()
                .destroy_framebuffer(self.framebuffer, None);
        }
    }
}
