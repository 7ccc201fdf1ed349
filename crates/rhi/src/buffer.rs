//! GPU buffer management.
//!
//! Vertex, index and uniform buffers live in host-visible memory obtained
//! from gpu-allocator. The cube is tiny, so there is no staging path: data is
//! written straight through the persistent mapping.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use vkspin_rhi::buffer::{Buffer, BufferUsage};
//! use vkspin_rhi::device::Device;
//!
//! # fn example(device: Arc<Device>) -> Result<(), vkspin_rhi::RhiError> {
//! let indices: [u16; 3] = [0, 1, 2];
//! let index_buffer = Buffer::new_with_data(device, BufferUsage::Index, bytemuck::cast_slice(&indices))?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use ash::vk;
use gpu_allocator::MemoryLocation;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use tracing::{debug, error};

use crate::device::Device;
use crate::error::{RhiError, RhiResult};

/// What a buffer is bound as.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferUsage {
    Vertex,
    Index,
    /// Per-image transform data, rewritten every frame.
    Uniform,
}

impl BufferUsage {
    /// Converts to Vulkan buffer usage flags.
    pub fn to_vk_usage(self) -> vk::BufferUsageFlags {
        match self {
            BufferUsage::Vertex => vk::BufferUsageFlags::VERTEX_BUFFER,
            BufferUsage::Index => vk::BufferUsageFlags::INDEX_BUFFER,
            BufferUsage::Uniform => vk::BufferUsageFlags::UNIFORM_BUFFER,
        }
    }

    /// All buffers are written from the host.
    pub fn memory_location(self) -> MemoryLocation {
        MemoryLocation::CpuToGpu
    }

    pub fn name(self) -> &'static str {
        match self {
            BufferUsage::Vertex => "vertex",
            BufferUsage::Index => "index",
            BufferUsage::Uniform => "uniform",
        }
    }
}

/// A `VkBuffer` bound to a gpu-allocator allocation.
///
/// The allocation is returned to the allocator before the buffer handle is
/// destroyed.
pub struct Buffer {
    device: Arc<Device>,
    buffer: vk::Buffer,
    allocation: Option<Allocation>,
    size: vk::DeviceSize,
    usage: BufferUsage,
}

impl Buffer {
    /// Creates a new buffer with the specified size.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `usage` - The intended buffer usage
    /// * `size` - Buffer size in bytes
    ///
    /// # Errors
    ///
    /// Returns an error if buffer or memory allocation fails.
    pub fn new(device: Arc<Device>, usage: BufferUsage, size: vk::DeviceSize) -> RhiResult<Self> {
        if size == 0 {
            return Err(RhiError::InvalidHandle(
                "Buffer size must be greater than 0".to_string(),
            ));
        }

        let buffer_info = vk::BufferCreateInfo::default()
            .size(size)
            .usage(usage.to_vk_usage())
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let buffer = unsafe { device.handle().create_buffer(&buffer_info, None)? };

        let requirements = unsafe { device.handle().get_buffer_memory_requirements(buffer) };

        let allocation = device.allocator().and_then(|mut allocator| {
            allocator
                .allocate(&AllocationCreateDesc {
                    name: usage.name(),
                    requirements,
                    location: usage.memory_location(),
                    linear: true,
                    allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                })
                .map_err(RhiError::from)
        });
        let allocation = match allocation {
            Ok(allocation) => allocation,
            Err(e) => {
                unsafe { device.handle().destroy_buffer(buffer, None) };
                return Err(e);
            }
        };

        let bound = unsafe {
            device
                .handle()
                .bind_buffer_memory(buffer, allocation.memory(), allocation.offset())
        };
        if let Err(e) = bound {
            if let Ok(mut allocator) = device.allocator() {
                let _ = allocator.free(allocation);
            }
            unsafe { device.handle().destroy_buffer(buffer, None) };
            return Err(e.into());
        }

        debug!("Created {} buffer: {} bytes", usage.name(), size);

        Ok(Self {
            device,
            buffer,
            allocation: Some(allocation),
            size,
            usage,
        })
    }

    /// Creates a buffer sized to `data` and fills it.
    pub fn new_with_data(device: Arc<Device>, usage: BufferUsage, data: &[u8]) -> RhiResult<Self> {
        let buffer = Self::new(device, usage, data.len() as vk::DeviceSize)?;
        buffer.write_data(0, data)?;
        Ok(buffer)
    }

    /// Copies `data` into the mapped memory at `offset`.
    ///
    /// # Errors
    ///
    /// Fails if the range exceeds the buffer or the memory is not mapped.
    pub fn write_data(&self, offset: vk::DeviceSize, data: &[u8]) -> RhiResult<()> {
        if data.is_empty() {
            return Ok(());
        }

        if !write_fits(self.size, offset, data.len()) {
            return Err(RhiError::InvalidHandle(format!(
                "write of {} bytes at offset {} exceeds buffer of {} bytes",
                data.len(),
                offset,
                self.size
            )));
        }

        let allocation = self.allocation.as_ref().ok_or_else(|| {
            RhiError::InvalidHandle("Buffer allocation is not available".to_string())
        })?;

        let mapped_ptr = allocation
            .mapped_ptr()
            .ok_or_else(|| RhiError::InvalidHandle("Buffer memory is not mapped".to_string()))?;

        unsafe {
            let dst = mapped_ptr.as_ptr().add(offset as usize);
            std::ptr::copy_nonoverlapping(data.as_ptr(), dst as *mut u8, data.len());
        }

        Ok(())
    }

    /// Returns the Vulkan buffer handle.
    #[inline]
    pub fn handle(&self) -> vk::Buffer {
        self.buffer
    }

    /// Returns the buffer size in bytes.
    #[inline]
    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }

    #[inline]
    pub fn usage(&self) -> BufferUsage {
        self.usage
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        if let Some(allocation) = self.allocation.take() {
            match self.device.allocator() {
                Ok(mut allocator) => {
                    if let Err(e) = allocator.free(allocation) {
                        error!("Failed to free {} buffer allocation: {:?}", self.usage.name(), e);
                    }
                }
                Err(e) => error!("Leaking {} buffer allocation: {}", self.usage.name(), e),
            }
        }

        unsafe {
            self.device.handle().destroy_buffer(self.buffer, None);
        }

        debug!("Destroyed {} buffer", self.usage.name());
    }
}

/// Whether `len` bytes written at `offset` stay inside a buffer of `size`.
fn write_fits(size: vk::DeviceSize, offset: vk::DeviceSize, len: usize) -> bool {
    offset
        .checked_add(len as vk::DeviceSize)
        .is_some_and(|end| end <= size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_usage_to_vk_usage() {
        assert_eq!(
            BufferUsage::Vertex.to_vk_usage(),
            vk::BufferUsageFlags::VERTEX_BUFFER
        );
        assert_eq!(
            BufferUsage::Index.to_vk_usage(),
            vk::BufferUsageFlags::INDEX_BUFFER
        );
        assert_eq!(
            BufferUsage::Uniform.to_vk_usage(),
            vk::BufferUsageFlags::UNIFORM_BUFFER
        );
    }

    #[test]
    fn test_buffers_are_host_visible() {
        for usage in [BufferUsage::Vertex, BufferUsage::Index, BufferUsage::Uniform] {
            assert_eq!(usage.memory_location(), MemoryLocation::CpuToGpu);
        }
    }

    #[test]
    fn test_write_bounds() {
        assert!(write_fits(192, 0, 192));
        assert!(write_fits(192, 64, 128));
        assert!(!write_fits(192, 64, 129));
        assert!(!write_fits(192, u64::MAX, 1));
    }
}
