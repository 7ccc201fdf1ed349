//! Swapchain rebuild.
//!
//! A rebuild drains the device, destroys everything sized by the old
//! swapchain, recreates the swapchain for the current framebuffer and then
//! rebuilds the dependents in creation order. Frame slots are not touched:
//! their semaphores and fences are independent of the swapchain, and keeping
//! them means the frame counter and every outstanding fence stay valid.

use ash::vk;
use tracing::{debug, info};
use vkspin_rhi::{RhiError, RhiResult};

use crate::backend::{FrameDevice, FrameResources, PresentTarget};
use crate::images_in_flight::ImagesInFlight;

/// Tracks swapchain generations and performs rebuilds.
#[derive(Debug, Default)]
pub struct SwapchainLifecycle {
    rebuilds: u64,
}

impl SwapchainLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of completed rebuilds.
    #[inline]
    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    /// Replaces the swapchain and all of its dependents.
    ///
    /// Order:
    /// 1. wait for the device to go idle
    /// 2. tear down swapchain-dependent resources
    /// 3. recreate the swapchain (old image views go with it)
    /// 4. rebuild dependents against the new images
    /// 5. clear and resize the images-in-flight table
    ///
    /// # Errors
    ///
    /// A zero-area `extent` is rejected before anything is destroyed; callers
    /// defer the rebuild until the framebuffer has area again. Any other
    /// failure leaves the renderer without a usable swapchain and is fatal.
    pub fn rebuild<D, T, R>(
        &mut self,
        device: &D,
        target: &mut T,
        resources: &mut R,
        images_in_flight: &mut ImagesInFlight,
        extent: vk::Extent2D,
    ) -> RhiResult<()>
    where
        D: FrameDevice,
        T: PresentTarget<D>,
        R: FrameResources<D>,
    {
        if extent.width == 0 || extent.height == 0 {
            return Err(RhiError::SwapchainError(format!(
                "cannot rebuild for a {}x{} framebuffer",
                extent.width, extent.height
            )));
        }

        debug!(
            "Rebuilding swapchain for {}x{} framebuffer",
            extent.width, extent.height
        );

        device.wait_idle()?;
        resources.teardown();
        target.recreate(extent)?;

        let new_extent = target.extent();
        let image_count = target.image_count();
        resources.rebuild_all(new_extent, target.format(), target.image_views())?;
        images_in_flight.reset(image_count);

        self.rebuilds += 1;

        info!(
            "Swapchain rebuilt: {}x{}, {} images (generation {})",
            new_extent.width, new_extent.height, image_count, self.rebuilds
        );

        Ok(())
    }
}
