//! Synchronization primitives for Vulkan.
//!
//! This module provides RAII wrappers for Vulkan synchronization objects:
//! - [`Semaphore`] - GPU-to-GPU ordering between acquire, submit and present
//! - [`Fence`] - GPU-to-CPU completion signal that the host can wait on
//!
//! Waits take an optional [`Duration`]. `None` waits forever; an expired
//! bounded wait is reported as [`RhiError::Timeout`] rather than a generic
//! Vulkan error so callers can tell a hung GPU from a lost device.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use vkspin_rhi::device::Device;
//! use vkspin_rhi::sync::{Fence, Semaphore};
//!
//! # fn example(device: Arc<Device>) -> Result<(), vkspin_rhi::RhiError> {
//! let image_available = Semaphore::new(device.clone())?;
//!
//! // Signaled so the first frame does not block.
//! let in_flight = Fence::new(device.clone(), true)?;
//!
//! in_flight.wait(Some(Duration::from_secs(1)))?;
//! in_flight.reset()?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use ash::vk;
use tracing::debug;

use crate::device::Device;
use crate::error::{RhiError, RhiResult};

/// Converts an optional timeout into the nanosecond value Vulkan expects.
///
/// `None` maps to `u64::MAX`, which Vulkan treats as an unbounded wait.
pub fn timeout_to_nanos(timeout: Option<Duration>) -> u64 {
    match timeout {
        Some(duration) => u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX),
        None => u64::MAX,
    }
}

/// Vulkan semaphore wrapper.
///
/// Binary semaphores order queue operations: the image-available semaphore
/// is signaled by acquisition and waited on by the submit, the
/// render-complete semaphore is signaled by the submit and waited on by the
/// present.
pub struct Semaphore {
    device: Arc<Device>,
    semaphore: vk::Semaphore,
}

impl Semaphore {
    /// Creates a new unsignaled semaphore.
    ///
    /// # Errors
    ///
    /// Returns an error if semaphore creation fails.
    pub fn new(device: Arc<Device>) -> RhiResult<Self> {
        let create_info = vk::SemaphoreCreateInfo::default();

        let semaphore = unsafe { device.handle().create_semaphore(&create_info, None)? };

        debug!("Created semaphore {:?}", semaphore);

        Ok(Self { device, semaphore })
    }

    /// Returns the Vulkan semaphore handle.
    #[inline]
    pub fn handle(&self) -> vk::Semaphore {
        self.semaphore
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_semaphore(self.semaphore, None);
        }
        debug!("Destroyed semaphore {:?}", self.semaphore);
    }
}

/// Vulkan fence wrapper.
///
/// A frame slot's fence is signaled by the queue when the slot's last
/// submission retires. The host waits on it before reusing the slot's
/// semaphores and resets it immediately before the next submission.
pub struct Fence {
    device: Arc<Device>,
    fence: vk::Fence,
}

impl Fence {
    /// Creates a new fence.
    ///
    /// # Arguments
    ///
    /// * `device` - The logical device
    /// * `signaled` - Create in the signaled state, for fences that are waited
    ///   on before the first submission that would signal them.
    ///
    /// # Errors
    ///
    /// Returns an error if fence creation fails.
    pub fn new(device: Arc<Device>, signaled: bool) -> RhiResult<Self> {
        let flags = if signaled {
            vk::FenceCreateFlags::SIGNALED
        } else {
            vk::FenceCreateFlags::empty()
        };

        let create_info = vk::FenceCreateInfo::default().flags(flags);

        let fence = unsafe { device.handle().create_fence(&create_info, None)? };

        debug!(
            "Created fence {:?} ({})",
            fence,
            if signaled { "signaled" } else { "unsignaled" }
        );

        Ok(Self { device, fence })
    }

    /// Returns the Vulkan fence handle.
    #[inline]
    pub fn handle(&self) -> vk::Fence {
        self.fence
    }

    /// Blocks until the fence is signaled.
    ///
    /// # Errors
    ///
    /// - [`RhiError::Timeout`] if a bounded `timeout` expires first
    /// - [`RhiError::VulkanError`] for any other failure, such as device loss
    pub fn wait(&self, timeout: Option<Duration>) -> RhiResult<()> {
        wait_for_fences(&self.device, &[self.fence], timeout)
    }

    /// Resets the fence to the unsignaled state.
    ///
    /// The fence must not be referenced by a pending queue submission.
    pub fn reset(&self) -> RhiResult<()> {
        unsafe { self.device.handle().reset_fences(&[self.fence])? };
        Ok(())
    }

    /// Non-blocking check of the fence status.
    pub fn is_signaled(&self) -> RhiResult<bool> {
        let signaled = unsafe { self.device.handle().get_fence_status(self.fence)? };
        Ok(signaled)
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        unsafe {
            self.device.handle().destroy_fence(self.fence, None);
        }
        debug!("Destroyed fence {:?}", self.fence);
    }
}

/// Waits until every fence in `fences` is signaled.
///
/// # Errors
///
/// Returns [`RhiError::Timeout`] when a bounded wait expires.
pub fn wait_for_fences(
    device: &Device,
    fences: &[vk::Fence],
    timeout: Option<Duration>,
) -> RhiResult<()> {
    if fences.is_empty() {
        return Ok(());
    }

    let result = unsafe {
        device
            .handle()
            .wait_for_fences(fences, true, timeout_to_nanos(timeout))
    };

    match (result, timeout) {
        (Ok(()), _) => Ok(()),
        (Err(vk::Result::TIMEOUT), Some(limit)) => Err(RhiError::Timeout(limit, "fence")),
        (Err(e), _) => Err(e.into()),
    }
}
