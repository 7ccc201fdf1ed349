//! Descriptor set management for shader resource binding.
//!
//! - [`DescriptorSetLayout`] describes the bindings a pipeline expects
//! - [`DescriptorPool`] owns the sets allocated from it
//! - [`write_uniform_buffer`] points a set's binding at a uniform buffer
//!
//! Layouts are created once and survive swapchain rebuilds. Pools and their
//! sets are sized to the swapchain image count and rebuilt with it.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use vkspin_rhi::descriptor::{DescriptorBindingBuilder, DescriptorPool, DescriptorSetLayout};
//! use vkspin_rhi::device::Device;
//! use vkspin_rhi::vk;
//!
//! # fn example(device: Arc<Device>) -> Result<(), vkspin_rhi::RhiError> {
//! let binding = DescriptorBindingBuilder::uniform_buffer(0, vk::ShaderStageFlags::VERTEX);
//! let layout = DescriptorSetLayout::new(device.clone(), &[binding])?;
//!
//! let pool = DescriptorPool::for_uniform_buffers(device.clone(), 3)?;
//! let sets = pool.allocate(&[layout.handle(); 3])?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use ash::vk;
use tracing::debug;

use crate::device::Device;
use crate::error::RhiResult;

/// Descriptor set layout wrapper.
pub struct DescriptorSetLayout {
    device: Arc<Device>,
    layout: vk::DescriptorSetLayout,
}

impl DescriptorSetLayout {
    /// Creates a new descriptor set layout.
    ///
    /// # Errors
    ///
    /// Returns an error if layout creation fails.
    pub fn new(
        device: Arc<Device>,
        bindings: &[vk::DescriptorSetLayoutBinding],
    ) -> RhiResult<Self> {
        let create_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(bindings);

        let layout = unsafe {
            device
                .handle()
                .create_descriptor_set_layout(&create_info, None)?
        };

        debug!(
            "Created descriptor set layout with {} binding(s)",
            bindings.len()
        );

        Ok(Self { device, layout })
    }

    #[inline]
    pub fn handle(&self) -> vk::DescriptorSetLayout {
        self.layout
    }
}

impl Drop for DescriptorSetLayout {
    fn drop(&mut self) {
        unsafe {
            self.device
                .handle()
                .destroy_descriptor_set_layout(self.layout, None);
        }
        debug!("Destroyed descriptor set layout");
    }
}

/// Descriptor pool. Destroying it frees every set allocated from it.
pub struct DescriptorPool {
    device: Arc<Device>,
    pool: vk::DescriptorPool,
    max_sets: u32,
}

impl DescriptorPool {
    /// Creates a new descriptor pool.
    ///
    /// # Errors
    ///
    /// Returns an error if pool creation fails.
    pub fn new(
        device: Arc<Device>,
        max_sets: u32,
        pool_sizes: &[vk::DescriptorPoolSize],
    ) -> RhiResult<Self> {
        let create_info = vk::DescriptorPoolCreateInfo::default()
            .max_sets(max_sets)
            .pool_sizes(pool_sizes);

        let pool = unsafe { device.handle().create_descriptor_pool(&create_info, None)? };

        debug!(
            "Created descriptor pool: max_sets={}, pool_sizes={}",
            max_sets,
            pool_sizes.len()
        );

        Ok(Self {
            device,
            pool,
            max_sets,
        })
    }

    /// A pool holding `count` sets of one uniform buffer each.
    pub fn for_uniform_buffers(device: Arc<Device>, count: u32) -> RhiResult<Self> {
        Self::new(device, count, &uniform_pool_sizes(count))
    }

    /// Allocates one set per entry of `layouts`.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool is exhausted or allocation fails.
    pub fn allocate(
        &self,
        layouts: &[vk::DescriptorSetLayout],
    ) -> RhiResult<Vec<vk::DescriptorSet>> {
        let alloc_info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(self.pool)
            .set_layouts(layouts);

        let sets = unsafe { self.device.handle().allocate_descriptor_sets(&alloc_info)? };

        debug!("Allocated {} descriptor set(s)", sets.len());

        Ok(sets)
    }

    #[inline]
    pub fn handle(&self) -> vk::DescriptorPool {
        self.pool
    }

    #[inline]
    pub fn max_sets(&self) -> u32 {
        self.max_sets
    }
}

impl Drop for DescriptorPool {
    fn drop(&mut self) {
        unsafe {
            self.device
                .handle()
                .destroy_descriptor_pool(self.pool, None);
        }
        debug!("Destroyed descriptor pool ({} sets)", self.max_sets);
    }
}

/// Pool sizes for `count` uniform-buffer descriptors.
pub fn uniform_pool_sizes(count: u32) -> [vk::DescriptorPoolSize; 1] {
    [vk::DescriptorPoolSize::default()
        .ty(vk::DescriptorType::UNIFORM_BUFFER)
        .descriptor_count(count)]
}

/// Describes the whole of `buffer` as a descriptor target.
#[inline]
pub fn buffer_info(buffer: vk::Buffer, range: vk::DeviceSize) -> vk::DescriptorBufferInfo {
    vk::DescriptorBufferInfo::default()
        .buffer(buffer)
        .offset(0)
        .range(range)
}

/// Writes a uniform buffer into `binding` of `set`.
pub fn write_uniform_buffer(
    device: &Device,
    set: vk::DescriptorSet,
    binding: u32,
    info: vk::DescriptorBufferInfo,
) {
    let infos = [info];
    let write = vk::WriteDescriptorSet::default()
        .dst_set(set)
        .dst_binding(binding)
        .dst_array_element(0)
        .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
        .buffer_info(&infos);

    unsafe {
        device.handle().update_descriptor_sets(&[write], &[]);
    }
}

/// Shorthand constructors for layout bindings.
pub struct DescriptorBindingBuilder;

impl DescriptorBindingBuilder {
    /// A single uniform buffer visible to `stages`.
    pub fn uniform_buffer(
        binding: u32,
        stages: vk::ShaderStageFlags,
    ) -> vk::DescriptorSetLayoutBinding<'static> {
        vk::DescriptorSetLayoutBinding::default()
            .binding(binding)
            .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
            .descriptor_count(1)
            .stage_flags(stages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_buffer_binding() {
        let binding = DescriptorBindingBuilder::uniform_buffer(0, vk::ShaderStageFlags::VERTEX);
        assert_eq!(binding.binding, 0);
        assert_eq!(binding.descriptor_type, vk::DescriptorType::UNIFORM_BUFFER);
        assert_eq!(binding.descriptor_count, 1);
        assert_eq!(binding.stage_flags, vk::ShaderStageFlags::VERTEX);
    }

    #[test]
    fn test_uniform_pool_sizes() {
        let sizes = uniform_pool_sizes(3);
        assert_eq!(sizes[0].ty, vk::DescriptorType::UNIFORM_BUFFER);
        assert_eq!(sizes[0].descriptor_count, 3);
    }

    #[test]
    fn test_buffer_info_covers_range() {
        let info = buffer_info(vk::Buffer::null(), 192);
        assert_eq!(info.offset, 0);
        assert_eq!(info.range, 192);
    }
}
