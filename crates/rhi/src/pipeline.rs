//! Graphics pipeline management.
//!
//! - [`PipelineLayout`] wraps VkPipelineLayout (descriptor set layouts)
//! - [`Pipeline`] wraps a graphics VkPipeline
//! - [`GraphicsPipelineBuilder`] assembles the fixed-function state
//!
//! Viewport and scissor are baked from the swapchain extent, so the pipeline
//! belongs to the swapchain generation it was built for and is rebuilt with
//! it. The layout does not depend on the extent and is kept across rebuilds.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use vkspin_rhi::device::Device;
//! use vkspin_rhi::pipeline::{CullMode, FrontFace, GraphicsPipelineBuilder, PipelineLayout};
//! use vkspin_rhi::shader::Shader;
//! use vkspin_rhi::vertex::Vertex;
//! use vkspin_rhi::vk;
//!
//! # fn example(device: Arc<Device>, vs: &Shader, fs: &Shader, render_pass: vk::RenderPass) -> Result<(), vkspin_rhi::RhiError> {
//! let layout = PipelineLayout::new(device.clone(), &[])?;
//!
//! let pipeline = GraphicsPipelineBuilder::new()
//!     .vertex_shader(vs)
//!     .fragment_shader(fs)
//!     .vertex_binding(Vertex::binding_description())
//!     .vertex_attributes(&Vertex::attribute_descriptions())
//!     .cull_mode(CullMode::Back)
//!     .front_face(FrontFace::CounterClockwise)
//!     .extent(vk::Extent2D { width: 800, height: 600 })
//!     .render_pass(render_pass, 0)
//!     .build(device, &layout)?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use ash::vk;
use tracing::{debug, info};

use crate::device::Device;
use crate::error::{RhiError, RhiResult};
use crate::shader::Shader;

/// Vulkan pipeline layout wrapper.
pub struct PipelineLayout {
    device: Arc<Device>,
    layout: vk::PipelineLayout,
}

impl PipelineLayout {
    /// Creates a pipeline layout over `descriptor_set_layouts`, in set order.
    ///
    /// # Errors
    ///
    /// Returns an error if pipeline layout creation fails.
    pub fn new(
        device: Arc<Device>,
        descriptor_set_layouts: &[vk::DescriptorSetLayout],
    ) -> RhiResult<Self> {
        let create_info =
            vk::PipelineLayoutCreateInfo::default().set_layouts(descriptor_set_layouts);

        let layout = unsafe { device.handle().create_pipeline_layout(&create_info, None)? };

        debug!(
            "Created pipeline layout with {} descriptor set layout(s)",
            descriptor_set_layouts.len()
        );

        Ok(Self { device, layout })
    }

    #[inline]
    pub fn handle(&self) -> vk::PipelineLayout {
        self.layout
    }
}

impl Drop for PipelineLayout {
    fn drop(&mut self) {
        unsafe {
            self.device
                .handle()
                .destroy_pipeline_layout(self.layout, None);
        }
        debug!("Pipeline layout destroyed");
    }
}

/// Graphics pipeline wrapper.
pub struct Pipeline {
    device: Arc<Device>,
    pipeline: vk::Pipeline,
}

impl Pipeline {
    fn create_graphics_internal(
        device: Arc<Device>,
        create_info: &vk::GraphicsPipelineCreateInfo,
    ) -> RhiResult<Self> {
        let pipelines = unsafe {
            device
                .handle()
                .create_graphics_pipelines(vk::PipelineCache::null(), &[*create_info], None)
                .map_err(|(_, result)| result)?
        };
        let pipeline = pipelines.into_iter().next().ok_or_else(|| {
            RhiError::PipelineError("driver returned no pipeline".to_string())
        })?;

        info!("Graphics pipeline created");

        Ok(Self { device, pipeline })
    }

    #[inline]
    pub fn handle(&self) -> vk::Pipeline {
        self.pipeline
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_pipeline(self.pipeline, None);
        }
        info!("Graphics pipeline destroyed");
    }
}

/// Primitive topology for input assembly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PrimitiveTopology {
    PointList,
    LineList,
    LineStrip,
    #[default]
    TriangleList,
    TriangleStrip,
}

impl PrimitiveTopology {
    pub fn to_vk(self) -> vk::PrimitiveTopology {
        match self {
            PrimitiveTopology::PointList => vk::PrimitiveTopology::POINT_LIST,
            PrimitiveTopology::LineList => vk::PrimitiveTopology::LINE_LIST,
            PrimitiveTopology::LineStrip => vk::PrimitiveTopology::LINE_STRIP,
            PrimitiveTopology::TriangleList => vk::PrimitiveTopology::TRIANGLE_LIST,
            PrimitiveTopology::TriangleStrip => vk::PrimitiveTopology::TRIANGLE_STRIP,
        }
    }
}

/// Which faces are discarded by the rasterizer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CullMode {
    None,
    Front,
    #[default]
    Back,
}

impl CullMode {
    pub fn to_vk(self) -> vk::CullModeFlags {
        match self {
            CullMode::None => vk::CullModeFlags::NONE,
            CullMode::Front => vk::CullModeFlags::FRONT,
            CullMode::Back => vk::CullModeFlags::BACK,
        }
    }
}

/// Winding order that counts as front-facing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FrontFace {
    #[default]
    CounterClockwise,
    Clockwise,
}

impl FrontFace {
    pub fn to_vk(self) -> vk::FrontFace {
        match self {
            FrontFace::CounterClockwise => vk::FrontFace::COUNTER_CLOCKWISE,
            FrontFace::Clockwise => vk::FrontFace::CLOCKWISE,
        }
    }
}

/// Full-extent viewport with the standard [0, 1] depth range.
pub fn full_viewport(extent: vk::Extent2D) -> vk::Viewport {
    vk::Viewport {
        x: 0.0,
        y: 0.0,
        width: extent.width as f32,
        height: extent.height as f32,
        min_depth: 0.0,
        max_depth: 1.0,
    }
}

/// Scissor covering the whole extent.
pub fn full_scissor(extent: vk::Extent2D) -> vk::Rect2D {
    vk::Rect2D {
        offset: vk::Offset2D { x: 0, y: 0 },
        extent,
    }
}

/// Builder for a single-color-attachment graphics pipeline.
#[derive(Default)]
pub struct GraphicsPipelineBuilder<'a> {
    vertex_shader: Option<&'a Shader>,
    fragment_shader: Option<&'a Shader>,

    vertex_bindings: Vec<vk::VertexInputBindingDescription>,
    vertex_attributes: Vec<vk::VertexInputAttributeDescription>,

    topology: PrimitiveTopology,
    cull_mode: CullMode,
    front_face: FrontFace,

    extent: vk::Extent2D,
    render_pass: vk::RenderPass,
    subpass: u32,
}

impl<'a> GraphicsPipelineBuilder<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_shader(mut self, shader: &'a Shader) -> Self {
        self.vertex_shader = Some(shader);
        self
    }

    pub fn fragment_shader(mut self, shader: &'a Shader) -> Self {
        self.fragment_shader = Some(shader);
        self
    }

    /// Adds a vertex input binding description.
    pub fn vertex_binding(mut self, binding: vk::VertexInputBindingDescription) -> Self {
        self.vertex_bindings.push(binding);
        self
    }

    /// Adds vertex input attribute descriptions.
    pub fn vertex_attributes(mut self, attributes: &[vk::VertexInputAttributeDescription]) -> Self {
        self.vertex_attributes.extend_from_slice(attributes);
        self
    }

    pub fn topology(mut self, topology: PrimitiveTopology) -> Self {
        self.topology = topology;
        self
    }

    pub fn cull_mode(mut self, mode: CullMode) -> Self {
        self.cull_mode = mode;
        self
    }

    pub fn front_face(mut self, face: FrontFace) -> Self {
        self.front_face = face;
        self
    }

    /// Target extent; becomes the static viewport and scissor.
    pub fn extent(mut self, extent: vk::Extent2D) -> Self {
        self.extent = extent;
        self
    }

    /// Render pass and subpass the pipeline is compatible with.
    pub fn render_pass(mut self, render_pass: vk::RenderPass, subpass: u32) -> Self {
        self.render_pass = render_pass;
        self.subpass = subpass;
        self
    }

    fn validate(&self) -> RhiResult<(&'a Shader, &'a Shader)> {
        let vertex_shader = self
            .vertex_shader
            .ok_or_else(|| RhiError::PipelineError("Vertex shader is required".to_string()))?;

        let fragment_shader = self
            .fragment_shader
            .ok_or_else(|| RhiError::PipelineError("Fragment shader is required".to_string()))?;

        if self.render_pass == vk::RenderPass::null() {
            return Err(RhiError::PipelineError(
                "A render pass is required".to_string(),
            ));
        }

        if self.extent.width == 0 || self.extent.height == 0 {
            return Err(RhiError::PipelineError(format!(
                "Pipeline extent must be non-zero, got {}x{}",
                self.extent.width, self.extent.height
            )));
        }

        Ok((vertex_shader, fragment_shader))
    }

    /// Builds the graphics pipeline.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Either shader is missing
    /// - No render pass was given or the extent is zero
    /// - Pipeline creation fails
    pub fn build(self, device: Arc<Device>, layout: &PipelineLayout) -> RhiResult<Pipeline> {
        let (vertex_shader, fragment_shader) = self.validate()?;

        let shader_stages = [
            vertex_shader.stage_create_info(),
            fragment_shader.stage_create_info(),
        ];

        let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&self.vertex_bindings)
            .vertex_attribute_descriptions(&self.vertex_attributes);

        let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(self.topology.to_vk())
            .primitive_restart_enable(false);

        let viewports = [full_viewport(self.extent)];
        let scissors = [full_scissor(self.extent)];
        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewports(&viewports)
            .scissors(&scissors);

        let rasterization_state = vk::PipelineRasterizationStateCreateInfo::default()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(vk::PolygonMode::FILL)
            .line_width(1.0)
            .cull_mode(self.cull_mode.to_vk())
            .front_face(self.front_face.to_vk())
            .depth_bias_enable(false);

        let multisample_state = vk::PipelineMultisampleStateCreateInfo::default()
            .sample_shading_enable(false)
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);

        let color_blend_attachments = [vk::PipelineColorBlendAttachmentState::default()
            .blend_enable(false)
            .color_write_mask(vk::ColorComponentFlags::RGBA)];

        let color_blend_state = vk::PipelineColorBlendStateCreateInfo::default()
            .logic_op_enable(false)
            .attachments(&color_blend_attachments);

        let pipeline_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&shader_stages)
            .vertex_input_state(&vertex_input_state)
            .input_assembly_state(&input_assembly_state)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization_state)
            .multisample_state(&multisample_state)
            .color_blend_state(&color_blend_state)
            .layout(layout.handle())
            .render_pass(self.render_pass)
            .subpass(self.subpass);

        debug!(
            "Building graphics pipeline for {}x{}",
            self.extent.width, self.extent.height
        );

        Pipeline::create_graphics_internal(device, &pipeline_info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_topology_to_vk() {
        assert_eq!(
            PrimitiveTopology::TriangleList.to_vk(),
            vk::PrimitiveTopology::TRIANGLE_LIST
        );
        assert_eq!(
            PrimitiveTopology::LineStrip.to_vk(),
            vk::PrimitiveTopology::LINE_STRIP
        );
    }

    #[test]
    fn test_cull_mode_to_vk() {
        assert_eq!(CullMode::None.to_vk(), vk::CullModeFlags::NONE);
        assert_eq!(CullMode::Front.to_vk(), vk::CullModeFlags::FRONT);
        assert_eq!(CullMode::Back.to_vk(), vk::CullModeFlags::BACK);
    }

    #[test]
    fn test_front_face_to_vk() {
        assert_eq!(
            FrontFace::CounterClockwise.to_vk(),
            vk::FrontFace::COUNTER_CLOCKWISE
        );
        assert_eq!(FrontFace::Clockwise.to_vk(), vk::FrontFace::CLOCKWISE);
    }

    #[test]
    fn test_builder_defaults() {
        let builder = GraphicsPipelineBuilder::new();
        assert_eq!(builder.topology, PrimitiveTopology::TriangleList);
        assert_eq!(builder.cull_mode, CullMode::Back);
        assert_eq!(builder.front_face, FrontFace::CounterClockwise);
        assert!(builder.vertex_bindings.is_empty());
    }

    #[test]
    fn test_builder_requires_shaders() {
        let err = GraphicsPipelineBuilder::new()
            .extent(vk::Extent2D {
                width: 800,
                height: 600,
            })
            .validate()
            .err();
        assert!(matches!(err, Some(RhiError::PipelineError(_))));
    }

    #[test]
    fn test_viewport_and_scissor_cover_extent() {
        let extent = vk::Extent2D {
            width: 1280,
            height: 720,
        };
        let viewport = full_viewport(extent);
        assert_eq!(viewport.width, 1280.0);
        assert_eq!(viewport.height, 720.0);
        assert_eq!(viewport.max_depth, 1.0);

        let scissor = full_scissor(extent);
        assert_eq!(scissor.offset.x, 0);
        assert_eq!(scissor.extent, extent);
    }
}
