//! Shader module management.
//!
//! Shaders are written in WGSL and compiled to SPIR-V in-process with
//! `naga`, so no external shader toolchain is needed at build time.
//! Precompiled SPIR-V is still accepted through [`Shader::from_spirv_bytes`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use vkspin_rhi::device::Device;
//! use vkspin_rhi::shader::{Shader, ShaderStage};
//!
//! # fn example(device: Arc<Device>, source: &str) -> Result<(), vkspin_rhi::RhiError> {
//! let vertex = Shader::from_wgsl(device.clone(), source, ShaderStage::Vertex, "vs_main")?;
//! let fragment = Shader::from_wgsl(device, source, ShaderStage::Fragment, "fs_main")?;
//! let stages = [vertex.stage_create_info(), fragment.stage_create_info()];
//! # Ok(())
//! # }
//! ```

use std::ffi::{CStr, CString};
use std::sync::Arc;

use ash::vk;
use tracing::{debug, info};

use crate::device::Device;
use crate::error::{RhiError, RhiResult};

/// Programmable pipeline stage a shader entry point runs in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn to_vk_stage(self) -> vk::ShaderStageFlags {
        match self {
            ShaderStage::Vertex => vk::ShaderStageFlags::VERTEX,
            ShaderStage::Fragment => vk::ShaderStageFlags::FRAGMENT,
        }
    }

    fn to_naga_stage(self) -> naga::ShaderStage {
        match self {
            ShaderStage::Vertex => naga::ShaderStage::Vertex,
            ShaderStage::Fragment => naga::ShaderStage::Fragment,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
        }
    }
}

impl std::fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Compiles one entry point of a WGSL module to SPIR-V words.
///
/// The module is parsed and validated in full, then only `entry_point` is
/// emitted. No coordinate-space adjustment is applied: clip space is exactly
/// what the shader writes.
///
/// # Errors
///
/// [`RhiError::ShaderError`] for parse, validation or code generation
/// failures, and when `entry_point` does not exist for `stage`.
pub fn compile_wgsl(source: &str, stage: ShaderStage, entry_point: &str) -> RhiResult<Vec<u32>> {
    let module = naga::front::wgsl::parse_str(source)
        .map_err(|e| RhiError::ShaderError(format!("WGSL parse error: {}", e.emit_to_string(source))))?;

    let mut validator = naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    );
    let info = validator
        .validate(&module)
        .map_err(|e| RhiError::ShaderError(format!("WGSL validation error: {}", e)))?;

    let naga_stage = stage.to_naga_stage();
    if !module
        .entry_points
        .iter()
        .any(|ep| ep.name == entry_point && ep.stage == naga_stage)
    {
        return Err(RhiError::ShaderError(format!(
            "entry point '{}' not found for {} stage",
            entry_point, stage
        )));
    }

    let options = naga::back::spv::Options {
        lang_version: (1, 0),
        flags: naga::back::spv::WriterFlags::empty(),
        capabilities: None,
        bounds_check_policies: naga::proc::BoundsCheckPolicies::default(),
        binding_map: Default::default(),
        debug_info: None,
        zero_initialize_workgroup_memory: naga::back::spv::ZeroInitializeWorkgroupMemoryMode::None,
    };
    let pipeline_options = naga::back::spv::PipelineOptions {
        shader_stage: naga_stage,
        entry_point: entry_point.to_string(),
    };

    let words = naga::back::spv::write_vec(&module, &info, &options, Some(&pipeline_options))
        .map_err(|e| RhiError::ShaderError(format!("SPIR-V generation error: {}", e)))?;

    debug!(
        "Compiled {} entry point '{}' to {} SPIR-V words",
        stage,
        entry_point,
        words.len()
    );

    Ok(words)
}

/// Vulkan shader module wrapper with its stage and entry point.
pub struct Shader {
    device: Arc<Device>,
    module: vk::ShaderModule,
    stage: ShaderStage,
    entry_point: CString,
}

impl Shader {
    /// Compiles `entry_point` from WGSL source and creates the module.
    ///
    /// The SPIR-V keeps naga's entry point name, so the pipeline references
    /// the same name as the WGSL function.
    pub fn from_wgsl(
        device: Arc<Device>,
        source: &str,
        stage: ShaderStage,
        entry_point: &str,
    ) -> RhiResult<Self> {
        let code = compile_wgsl(source, stage, entry_point)?;
        Self::from_spirv_words(device, &code, stage, entry_point)
    }

    /// Creates a shader module from little-endian SPIR-V bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The byte length is not a multiple of 4
    /// - The entry point name contains NUL bytes
    /// - Shader module creation fails
    pub fn from_spirv_bytes(
        device: Arc<Device>,
        bytes: &[u8],
        stage: ShaderStage,
        entry_point: &str,
    ) -> RhiResult<Self> {
        let code = spirv_words(bytes)?;
        Self::from_spirv_words(device, &code, stage, entry_point)
    }

    fn from_spirv_words(
        device: Arc<Device>,
        code: &[u32],
        stage: ShaderStage,
        entry_point: &str,
    ) -> RhiResult<Self> {
        let entry_point_cstring = CString::new(entry_point)
            .map_err(|e| RhiError::ShaderError(format!("Invalid entry point name: {}", e)))?;

        let create_info = vk::ShaderModuleCreateInfo::default().code(code);

        let module = unsafe { device.handle().create_shader_module(&create_info, None)? };

        info!(
            "Created {} shader module with entry point '{}'",
            stage, entry_point
        );

        Ok(Self {
            device,
            module,
            stage,
            entry_point: entry_point_cstring,
        })
    }

    #[inline]
    pub fn handle(&self) -> vk::ShaderModule {
        self.module
    }

    #[inline]
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    #[inline]
    pub fn entry_point(&self) -> &CStr {
        &self.entry_point
    }

    /// Stage description for pipeline creation. Borrows from `self`.
    pub fn stage_create_info(&self) -> vk::PipelineShaderStageCreateInfo<'_> {
        vk::PipelineShaderStageCreateInfo::default()
            .stage(self.stage.to_vk_stage())
            .module(self.module)
            .name(&self.entry_point)
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        unsafe {
            self.device
                .handle()
                .destroy_shader_module(self.module, None);
        }
        debug!("Destroyed {} shader module", self.stage);
    }
}

/// Reinterprets SPIR-V bytes as 32-bit words.
fn spirv_words(bytes: &[u8]) -> RhiResult<Vec<u32>> {
    if bytes.len() % 4 != 0 {
        return Err(RhiError::ShaderError(format!(
            "SPIR-V code must be 4-byte aligned, got {} bytes",
            bytes.len()
        )));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}
