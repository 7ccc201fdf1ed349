//! GPU resources of the spinning cube.
//!
//! Split by lifetime:
//!
//! - created once: shaders, descriptor set layout, pipeline layout, command
//!   pool, vertex and index buffers
//! - created per swapchain: render pass, pipeline, framebuffers, per-image
//!   uniform buffers, descriptor pool and sets, recorded command buffers
//!
//! The per-swapchain half is dropped by [`FrameResources::teardown`] and
//! recreated by [`FrameResources::rebuild_all`].

use std::sync::Arc;

use ash::vk;
use tracing::debug;
use vkspin_core::Timer;
use vkspin_rhi::buffer::{Buffer, BufferUsage};
use vkspin_rhi::command::{CommandBuffer, CommandPool};
use vkspin_rhi::descriptor::{
    DescriptorBindingBuilder, DescriptorPool, DescriptorSetLayout, buffer_info,
    write_uniform_buffer,
};
use vkspin_rhi::device::Device;
use vkspin_rhi::framebuffer::Framebuffer;
use vkspin_rhi::pipeline::{
    CullMode, FrontFace, GraphicsPipelineBuilder, Pipeline, PipelineLayout, PrimitiveTopology,
};
use vkspin_rhi::render_pass::{RenderPass, clear_color};
use vkspin_rhi::shader::{Shader, ShaderStage};
use vkspin_rhi::vertex::Vertex;
use vkspin_rhi::{RhiError, RhiResult};

use crate::backend::FrameResources;
use crate::geometry::{CUBE_INDEX_COUNT, CUBE_INDICES, CUBE_VERTICES};
use crate::ubo::{TransformUbo, aspect_ratio};
use crate::vulkan::VulkanDevice;

/// WGSL source of the cube shaders.
pub const CUBE_SHADER: &str = include_str!("../../../shaders/cube.wgsl");
pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// Resources tied to one swapchain generation.
///
/// Fields drop in declaration order: framebuffers before the render pass they
/// were created against, descriptor sets (with their pool) before the buffers
/// they reference.
struct SwapchainResources {
    extent: vk::Extent2D,
    command_buffers: Vec<vk::CommandBuffer>,
    descriptor_sets: Vec<vk::DescriptorSet>,
    framebuffers: Vec<Framebuffer>,
    pipeline: Pipeline,
    render_pass: RenderPass,
    descriptor_pool: DescriptorPool,
    uniform_buffers: Vec<Buffer>,
}

/// Everything the cube needs to be drawn.
pub struct CubeResources {
    device: Arc<Device>,
    frame: Option<SwapchainResources>,
    vertex_shader: Shader,
    fragment_shader: Shader,
    pipeline_layout: PipelineLayout,
    descriptor_set_layout: DescriptorSetLayout,
    command_pool: CommandPool,
    vertex_buffer: Buffer,
    index_buffer: Buffer,
    clear_color: [f32; 4],
    timer: Timer,
}

impl CubeResources {
    /// Creates the swapchain-independent resources. Call
    /// [`rebuild_all`](FrameResources::rebuild_all) before drawing.
    pub fn new(device: Arc<Device>, clear_color: [f32; 4]) -> RhiResult<Self> {
        let vertex_shader = Shader::from_wgsl(
            device.clone(),
            CUBE_SHADER,
            ShaderStage::Vertex,
            VERTEX_ENTRY,
        )?;
        let fragment_shader = Shader::from_wgsl(
            device.clone(),
            CUBE_SHADER,
            ShaderStage::Fragment,
            FRAGMENT_ENTRY,
        )?;

        let transform_binding =
            DescriptorBindingBuilder::uniform_buffer(0, vk::ShaderStageFlags::VERTEX);
        let descriptor_set_layout = DescriptorSetLayout::new(device.clone(), &[transform_binding])?;
        let pipeline_layout =
            PipelineLayout::new(device.clone(), &[descriptor_set_layout.handle()])?;

        let command_pool = CommandPool::new(device.clone(), device.queue_families().graphics)?;

        let vertex_buffer = Buffer::new_with_data(
            device.clone(),
            BufferUsage::Vertex,
            bytemuck::cast_slice(&CUBE_VERTICES),
        )?;
        let index_buffer = Buffer::new_with_data(
            device.clone(),
            BufferUsage::Index,
            bytemuck::cast_slice(&CUBE_INDICES),
        )?;

        debug!(
            "Cube resources created: {} vertices, {} indices",
            CUBE_VERTICES.len(),
            CUBE_INDEX_COUNT
        );

        Ok(Self {
            device,
            frame: None,
            vertex_shader,
            fragment_shader,
            pipeline_layout,
            descriptor_set_layout,
            command_pool,
            vertex_buffer,
            index_buffer,
            clear_color,
            timer: Timer::new(),
        })
    }

    /// Whether swapchain-dependent resources currently exist.
    pub fn is_built(&self) -> bool {
        self.frame.is_some()
    }

    fn build_frame(
        &self,
        extent: vk::Extent2D,
        format: vk::Format,
        image_views: &[vk::ImageView],
    ) -> RhiResult<SwapchainResources> {
        let image_count = image_views.len() as u32;

        let render_pass = RenderPass::new_color(self.device.clone(), format)?;

        let pipeline = GraphicsPipelineBuilder::new()
            .vertex_shader(&self.vertex_shader)
            .fragment_shader(&self.fragment_shader)
            .vertex_binding(Vertex::binding_description())
            .vertex_attributes(&Vertex::attribute_descriptions())
            .topology(PrimitiveTopology::TriangleList)
            .cull_mode(CullMode::Back)
            .front_face(FrontFace::CounterClockwise)
            .extent(extent)
            .render_pass(render_pass.handle(), 0)
            .build(self.device.clone(), &self.pipeline_layout)?;

        let framebuffers =
            Framebuffer::for_views(&self.device, render_pass.handle(), image_views, extent)?;

        let uniform_buffers = (0..image_count)
            .map(|_| {
                Buffer::new(
                    self.device.clone(),
                    BufferUsage::Uniform,
                    TransformUbo::SIZE as vk::DeviceSize,
                )
            })
            .collect::<RhiResult<Vec<_>>>()?;

        let descriptor_pool = DescriptorPool::for_uniform_buffers(self.device.clone(), image_count)?;
        let layouts = vec![self.descriptor_set_layout.handle(); image_views.len()];
        let descriptor_sets = descriptor_pool.allocate(&layouts)?;
        for (set, buffer) in descriptor_sets.iter().zip(&uniform_buffers) {
            write_uniform_buffer(
                &self.device,
                *set,
                0,
                buffer_info(buffer.handle(), TransformUbo::SIZE as vk::DeviceSize),
            );
        }

        let command_buffers = self.command_pool.allocate_command_buffers(image_count)?;
        let frame = SwapchainResources {
            extent,
            command_buffers,
            descriptor_sets,
            framebuffers,
            pipeline,
            render_pass,
            descriptor_pool,
            uniform_buffers,
        };

        if let Err(e) = self.record(&frame) {
            self.command_pool.free_command_buffers(&frame.command_buffers);
            return Err(e);
        }

        Ok(frame)
    }

    /// Records one reusable draw per image.
    fn record(&self, frame: &SwapchainResources) -> RhiResult<()> {
        let clear_values = [clear_color(self.clear_color)];

        for (i, &handle) in frame.command_buffers.iter().enumerate() {
            let cmd = CommandBuffer::from_handle(self.device.clone(), handle);

            cmd.begin_reusable()?;
            cmd.begin_render_pass(
                frame.render_pass.handle(),
                frame.framebuffers[i].handle(),
                frame.extent,
                &clear_values,
            );
            cmd.bind_graphics_pipeline(frame.pipeline.handle());
            cmd.bind_vertex_buffers(0, &[self.vertex_buffer.handle()]);
            cmd.bind_index_buffer(self.index_buffer.handle(), vk::IndexType::UINT16);
            cmd.bind_graphics_descriptor_sets(
                self.pipeline_layout.handle(),
                0,
                &[frame.descriptor_sets[i]],
            );
            cmd.draw_indexed(CUBE_INDEX_COUNT);
            cmd.end_render_pass();
            cmd.end()?;
        }

        debug!(
            "Recorded {} command buffer(s)",
            frame.command_buffers.len()
        );

        Ok(())
    }

    fn built(&self) -> RhiResult<&SwapchainResources> {
        self.frame.as_ref().ok_or_else(|| {
            RhiError::InvalidHandle("swapchain resources have not been built".to_string())
        })
    }
}

impl FrameResources<VulkanDevice> for CubeResources {
    fn teardown(&mut self) {
        if let Some(frame) = self.frame.take() {
            self.command_pool.free_command_buffers(&frame.command_buffers);
            debug!(
                "Tearing down resources for {} swapchain image(s)",
                frame.framebuffers.len()
            );
        }
    }

    fn rebuild_all(
        &mut self,
        extent: vk::Extent2D,
        format: vk::Format,
        image_views: &[vk::ImageView],
    ) -> RhiResult<()> {
        self.teardown();
        self.frame = Some(self.build_frame(extent, format, image_views)?);
        Ok(())
    }

    fn update_frame(&mut self, image_index: u32) -> RhiResult<()> {
        let frame = self.built()?;
        let buffer = frame
            .uniform_buffers
            .get(image_index as usize)
            .ok_or_else(|| {
                RhiError::InvalidHandle(format!("no uniform buffer for image {}", image_index))
            })?;

        let ubo = TransformUbo::spinning(
            self.timer.elapsed_secs(),
            aspect_ratio(frame.extent.width, frame.extent.height),
        );
        buffer.write_data(0, bytemuck::bytes_of(&ubo))
    }

    fn command_buffer(&self, image_index: u32) -> RhiResult<vk::CommandBuffer> {
        self.built()?
            .command_buffers
            .get(image_index as usize)
            .copied()
            .ok_or_else(|| {
                RhiError::InvalidHandle(format!("no command buffer for image {}", image_index))
            })
    }
}

impl Drop for CubeResources {
    fn drop(&mut self) {
        self.teardown();
    }
}
