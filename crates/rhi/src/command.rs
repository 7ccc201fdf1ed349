//! Command pool and command buffer management.
//!
//! - [`CommandPool`] allocates and frees primary command buffers
//! - [`CommandBuffer`] records into a buffer the pool owns
//!
//! Buffers here are recorded once per swapchain generation and resubmitted
//! every time their image comes back, so recording uses no
//! `ONE_TIME_SUBMIT` flag.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use vkspin_rhi::command::{CommandBuffer, CommandPool};
//! use vkspin_rhi::device::Device;
//!
//! # fn example(device: Arc<Device>) -> Result<(), vkspin_rhi::RhiError> {
//! let pool = CommandPool::new(device.clone(), device.queue_families().graphics)?;
//! let handles = pool.allocate_command_buffers(3)?;
//!
//! let cmd = CommandBuffer::from_handle(device.clone(), handles[0]);
//! cmd.begin_reusable()?;
//! // ... record the frame ...
//! cmd.end()?;
//!
//! pool.free_command_buffers(&handles);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use ash::vk;
use tracing::{debug, info};

use crate::device::Device;
use crate::error::RhiResult;

/// Vulkan command pool wrapper.
///
/// Destroying the pool frees every buffer still allocated from it.
pub struct CommandPool {
    device: Arc<Device>,
    pool: vk::CommandPool,
    queue_family_index: u32,
}

impl CommandPool {
    /// Creates a pool for queues of `queue_family_index`.
    ///
    /// # Errors
    ///
    /// Returns an error if pool creation fails.
    pub fn new(device: Arc<Device>, queue_family_index: u32) -> RhiResult<Self> {
        let create_info =
            vk::CommandPoolCreateInfo::default().queue_family_index(queue_family_index);

        let pool = unsafe { device.handle().create_command_pool(&create_info, None)? };

        info!(
            "Command pool created for queue family {}",
            queue_family_index
        );

        Ok(Self {
            device,
            pool,
            queue_family_index,
        })
    }

    #[inline]
    pub fn handle(&self) -> vk::CommandPool {
        self.pool
    }

    #[inline]
    pub fn queue_family_index(&self) -> u32 {
        self.queue_family_index
    }

    /// Allocates `count` primary command buffers.
    ///
    /// # Errors
    ///
    /// Returns an error if allocation fails.
    pub fn allocate_command_buffers(&self, count: u32) -> RhiResult<Vec<vk::CommandBuffer>> {
        let alloc_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(self.pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(count);

        let buffers = unsafe { self.device.handle().allocate_command_buffers(&alloc_info)? };
        debug!("Allocated {} command buffer(s)", buffers.len());
        Ok(buffers)
    }

    /// Returns `buffers` to the pool. None of them may be pending execution.
    pub fn free_command_buffers(&self, buffers: &[vk::CommandBuffer]) {
        if buffers.is_empty() {
            return;
        }
        unsafe {
            self.device
                .handle()
                .free_command_buffers(self.pool, buffers);
        }
        debug!("Freed {} command buffer(s)", buffers.len());
    }
}

impl Drop for CommandPool {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_command_pool(self.pool, None);
        }
        info!(
            "Command pool destroyed for queue family {}",
            self.queue_family_index
        );
    }
}

/// Recording interface over a pool-owned command buffer handle.
///
/// Does not own the handle; it is freed through its [`CommandPool`].
pub struct CommandBuffer {
    device: Arc<Device>,
    buffer: vk::CommandBuffer,
}

impl CommandBuffer {
    #[inline]
    pub fn from_handle(device: Arc<Device>, buffer: vk::CommandBuffer) -> Self {
        Self { device, buffer }
    }

    #[inline]
    pub fn handle(&self) -> vk::CommandBuffer {
        self.buffer
    }

    /// Begins recording a buffer that may be submitted many times.
    pub fn begin_reusable(&self) -> RhiResult<()> {
        let begin_info = vk::CommandBufferBeginInfo::default();

        unsafe {
            self.device
                .handle()
                .begin_command_buffer(self.buffer, &begin_info)?;
        }

        Ok(())
    }

    pub fn end(&self) -> RhiResult<()> {
        unsafe {
            self.device.handle().end_command_buffer(self.buffer)?;
        }

        Ok(())
    }

    /// Begins `render_pass` on `framebuffer` over the full `extent`.
    pub fn begin_render_pass(
        &self,
        render_pass: vk::RenderPass,
        framebuffer: vk::Framebuffer,
        extent: vk::Extent2D,
        clear_values: &[vk::ClearValue],
    ) {
        let begin_info = vk::RenderPassBeginInfo::default()
            .render_pass(render_pass)
            .framebuffer(framebuffer)
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent,
            })
            .clear_values(clear_values);

        unsafe {
            self.device.handle().cmd_begin_render_pass(
                self.buffer,
                &begin_info,
                vk::SubpassContents::INLINE,
            );
        }
    }

    pub fn end_render_pass(&self) {
        unsafe {
            self.device.handle().cmd_end_render_pass(self.buffer);
        }
    }

    pub fn bind_graphics_pipeline(&self, pipeline: vk::Pipeline) {
        unsafe {
            self.device.handle().cmd_bind_pipeline(
                self.buffer,
                vk::PipelineBindPoint::GRAPHICS,
                pipeline,
            );
        }
    }

    /// Binds `buffers` starting at `first_binding`, all at offset 0.
    pub fn bind_vertex_buffers(&self, first_binding: u32, buffers: &[vk::Buffer]) {
        let offsets = vec![0; buffers.len()];
        unsafe {
            self.device.handle().cmd_bind_vertex_buffers(
                self.buffer,
                first_binding,
                buffers,
                &offsets,
            );
        }
    }

    pub fn bind_index_buffer(&self, buffer: vk::Buffer, index_type: vk::IndexType) {
        unsafe {
            self.device
                .handle()
                .cmd_bind_index_buffer(self.buffer, buffer, 0, index_type);
        }
    }

    pub fn bind_graphics_descriptor_sets(
        &self,
        layout: vk::PipelineLayout,
        first_set: u32,
        sets: &[vk::DescriptorSet],
    ) {
        unsafe {
            self.device.handle().cmd_bind_descriptor_sets(
                self.buffer,
                vk::PipelineBindPoint::GRAPHICS,
                layout,
                first_set,
                sets,
                &[],
            );
        }
    }

    /// Draws `index_count` indices as a single instance.
    pub fn draw_indexed(&self, index_count: u32) {
        unsafe {
            self.device
                .handle()
                .cmd_draw_indexed(self.buffer, index_count, 1, 0, 0, 0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_buffer_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<CommandBuffer>();
        assert_send::<CommandPool>();
    }
}
