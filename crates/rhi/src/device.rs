//! Vulkan logical device and queue management.
//!
//! This module handles VkDevice creation, queue retrieval, and gpu-allocator initialization.
//!
//! # Example
//!
//! ```no_run
//! use vkspin_rhi::device::Device;
//! use vkspin_rhi::instance::Instance;
//! use vkspin_rhi::physical_device::select_physical_device;
//! use vkspin_rhi::vk;
//!
//! let instance = Instance::new("vkspin", &[], &[]).expect("Failed to create instance");
//! let surface: vk::SurfaceKHR = vk::SurfaceKHR::null(); // placeholder
//! let surface_loader = ash::khr::surface::Instance::new(instance.entry(), instance.handle());
//! let extensions = vec!["VK_KHR_swapchain".to_string()];
//!
//! let info = select_physical_device(instance.handle(), surface, &surface_loader, &extensions)
//!     .expect("No suitable GPU found");
//! let device = Device::new(&instance, &info, &extensions).expect("Failed to create device");
//!
//! let graphics_queue = device.graphics_queue();
//! let present_queue = device.present_queue();
//! ```

use std::mem::ManuallyDrop;
use std::sync::{Arc, Mutex, MutexGuard};

use ash::vk;
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use tracing::{debug, error, info};

use crate::error::{RhiError, RhiResult};
use crate::instance::Instance;
use crate::physical_device::{PhysicalDeviceInfo, QueueFamilies, extension_cstrings};

/// Vulkan logical device wrapper.
///
/// Owns the logical device, its graphics and present queues, and the memory
/// allocator. Shared through `Arc` by every resource created from it, so the
/// device outlives all of them.
pub struct Device {
    device: ash::Device,
    physical_device: vk::PhysicalDevice,
    // Dropped by hand before the device is destroyed.
    allocator: ManuallyDrop<Mutex<Allocator>>,
    graphics_queue: vk::Queue,
    present_queue: vk::Queue,
    queue_families: QueueFamilies,
}

impl Device {
    /// Creates a logical device with one queue per unique family and the
    /// given device extensions enabled.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - An extension name contains a NUL byte
    /// - Device creation fails
    /// - Allocator initialization fails
    pub fn new(
        instance: &Instance,
        physical_device_info: &PhysicalDeviceInfo,
        extensions: &[String],
    ) -> RhiResult<Arc<Self>> {
        let queue_families = physical_device_info.queue_families;

        let unique_families = queue_families.unique_families();
        let queue_priorities = [1.0f32];

        let queue_create_infos: Vec<vk::DeviceQueueCreateInfo> = unique_families
            .iter()
            .map(|&family| {
                vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(family)
                    .queue_priorities(&queue_priorities)
            })
            .collect();

        debug!(
            "Creating {} queue(s) for families: {:?}",
            queue_create_infos.len(),
            unique_families
        );

        let features = vk::PhysicalDeviceFeatures::default();

        let extension_names = extension_cstrings(extensions)?;
        let extension_ptrs: Vec<*const std::ffi::c_char> =
            extension_names.iter().map(|ext| ext.as_ptr()).collect();

        let create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_create_infos)
            .enabled_extension_names(&extension_ptrs)
            .enabled_features(&features);

        let device = unsafe {
            instance
                .handle()
                .create_device(physical_device_info.device, &create_info, None)?
        };

        info!(
            "Logical device created on {} with extensions {:?}",
            physical_device_info.device_name(),
            extensions
        );

        let graphics_queue = unsafe { device.get_device_queue(queue_families.graphics, 0) };
        let present_queue = unsafe { device.get_device_queue(queue_families.present, 0) };
        debug!(
            "Queues retrieved: graphics family {}, present family {}",
            queue_families.graphics, queue_families.present
        );

        let allocator = match Allocator::new(&AllocatorCreateDesc {
            instance: instance.handle().clone(),
            device: device.clone(),
            physical_device: physical_device_info.device,
            debug_settings: Default::default(),
            buffer_device_address: false,
            allocation_sizes: Default::default(),
        }) {
            Ok(allocator) => allocator,
            Err(e) => {
                unsafe { device.destroy_device(None) };
                return Err(e.into());
            }
        };

        info!("GPU memory allocator initialized");

        Ok(Arc::new(Self {
            device,
            physical_device: physical_device_info.device,
            allocator: ManuallyDrop::new(Mutex::new(allocator)),
            graphics_queue,
            present_queue,
            queue_families,
        }))
    }

    /// Returns the Vulkan logical device handle.
    #[inline]
    pub fn handle(&self) -> &ash::Device {
        &self.device
    }

    /// Returns the physical device handle.
    #[inline]
    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    #[inline]
    pub fn graphics_queue(&self) -> vk::Queue {
        self.graphics_queue
    }

    #[inline]
    pub fn present_queue(&self) -> vk::Queue {
        self.present_queue
    }

    /// Returns the queue families the queues were created from.
    #[inline]
    pub fn queue_families(&self) -> &QueueFamilies {
        &self.queue_families
    }

    /// Locks the GPU memory allocator.
    ///
    /// # Errors
    ///
    /// Returns [`RhiError::InvalidHandle`] if a previous holder panicked.
    pub fn allocator(&self) -> RhiResult<MutexGuard<'_, Allocator>> {
        self.allocator
            .lock()
            .map_err(|_| RhiError::InvalidHandle("GPU allocator mutex poisoned".to_string()))
    }

    /// Blocks until all outstanding work on every queue has completed.
    pub fn wait_idle(&self) -> RhiResult<()> {
        unsafe { self.device.device_wait_idle()? };
        Ok(())
    }

    /// Submits command buffers to the graphics queue.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    /// - All command buffers are valid and fully recorded
    /// - Referenced semaphores are in the state the submission expects
    /// - `fence` is unsignaled and not used by another pending submission
    pub unsafe fn submit_graphics(
        &self,
        submit_infos: &[vk::SubmitInfo],
        fence: vk::Fence,
    ) -> RhiResult<()> {
        unsafe {
            self.device
                .queue_submit(self.graphics_queue, submit_infos, fence)?;
        }
        Ok(())
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        unsafe {
            if let Err(e) = self.device.device_wait_idle() {
                error!("Failed to wait for device idle during drop: {:?}", e);
            }
        }

        unsafe {
            ManuallyDrop::drop(&mut self.allocator);
            self.device.destroy_device(None);
        }
        info!("Logical device destroyed");
    }
}

// Safety: ash::Device is Send+Sync, queues and the physical device are plain
// handles, and the allocator is behind a Mutex.
unsafe impl Send for Device {}
unsafe impl Sync for Device {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Device>();
    }
}
