//! Single-subpass color render pass.
//!
//! The pass clears the swapchain image, draws into it, and leaves it in
//! `PRESENT_SRC_KHR`. The external dependency makes the layout transition
//! wait for the color-attachment-output stage, which is the stage the
//! submit waits on for the image-available semaphore.

use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::device::Device;
use crate::error::RhiResult;

/// Vulkan render pass wrapper.
pub struct RenderPass {
    device: Arc<Device>,
    render_pass: vk::RenderPass,
    format: vk::Format,
}

impl RenderPass {
    /// Creates a render pass with one color attachment of `format`.
    pub fn new_color(device: Arc<Device>, format: vk::Format) -> RhiResult<Self> {
        let attachments = [color_attachment(format)];

        let color_refs = [vk::AttachmentReference {
            attachment: 0,
            layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        }];

        let subpasses = [vk::SubpassDescription::default()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&color_refs)];

        let dependencies = [external_dependency()];

        let create_info = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(&subpasses)
            .dependencies(&dependencies);

        let render_pass = unsafe { device.handle().create_render_pass(&create_info, None)? };

        debug!("Created render pass for {:?}", format);

        Ok(Self {
            device,
            render_pass,
            format,
        })
    }

    #[inline]
    pub fn handle(&self) -> vk::RenderPass {
        self.render_pass
    }

    /// Color attachment format the pass was created for.
    #[inline]
    pub fn format(&self) -> vk::Format {
        self.format
    }
}

impl Drop for RenderPass {
    fn drop(&mut self) {
        unsafe {
            self.device
                .handle()
                .destroy_render_pass(self.render_pass, None);
        }
        debug!("Destroyed render pass");
    }
}

fn color_attachment(format: vk::Format) -> vk::AttachmentDescription {
    vk::AttachmentDescription::default()
        .format(format)
        .samples(vk::SampleCountFlags::TYPE_1)
        .load_op(vk::AttachmentLoadOp::CLEAR)
        .store_op(vk::AttachmentStoreOp::STORE)
        .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
        .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
        .initial_layout(vk::ImageLayout::UNDEFINED)
        .final_layout(vk::ImageLayout::PRESENT_SRC_KHR)
}

fn external_dependency() -> vk::SubpassDependency {
    vk::SubpassDependency::default()
        .src_subpass(vk::SUBPASS_EXTERNAL)
        .dst_subpass(0)
        .src_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
        .src_access_mask(vk::AccessFlags::empty())
        .dst_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
        .dst_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE)
}

/// Clear value for the color attachment.
pub fn clear_color(rgba: [f32; 4]) -> vk::ClearValue {
    vk::ClearValue {
        color: vk::ClearColorValue { float32: rgba },
    }
}
