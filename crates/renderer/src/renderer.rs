//! Main renderer orchestration.
//!
//! This module provides the main [`Renderer`] struct that owns every Vulkan
//! object and drives the frame scheduler against them.

use std::mem::ManuallyDrop;

use ash::vk;
use tracing::{debug, error, info};

use vkspin_core::AppConfig;
use vkspin_platform::{Surface, Window};
use vkspin_rhi::device::Device;
use vkspin_rhi::instance::Instance;
use vkspin_rhi::physical_device::select_physical_device;
use vkspin_rhi::swapchain::{Swapchain, SwapchainOptions};
use vkspin_rhi::{RhiError, RhiResult};

use crate::backend::FrameResources;
use crate::resources::CubeResources;
use crate::scheduler::{FrameOutcome, FrameScheduler};
use crate::vulkan::{SwapchainTarget, VulkanDevice};

/// Renderer of the spinning cube.
///
/// # Resource Destruction Order
///
/// Vulkan objects must be destroyed children first:
/// 1. Wait for all GPU work to complete
/// 2. Swapchain-dependent and persistent cube resources
/// 3. Frame slots (semaphores and fences)
/// 4. Swapchain and its image views
/// 5. Surface
/// 6. Logical device (the last `Arc` reference)
/// 7. Instance
///
/// ManuallyDrop is used to enforce this order.
pub struct Renderer {
    instance: ManuallyDrop<Instance>,
    device: ManuallyDrop<VulkanDevice>,
    surface: ManuallyDrop<Surface>,
    swapchain: ManuallyDrop<Swapchain>,
    scheduler: ManuallyDrop<FrameScheduler<VulkanDevice>>,
    resources: ManuallyDrop<CubeResources>,
}

impl Renderer {
    /// Creates a renderer for `window`.
    ///
    /// # Errors
    ///
    /// Returns an error if any part of the Vulkan bootstrap fails: loader,
    /// instance, surface, GPU selection, device, swapchain, shaders or
    /// pipeline.
    pub fn new(window: &Window, config: &AppConfig) -> RhiResult<Self> {
        let graphics = &config.graphics;
        let (width, height) = window.framebuffer_size();

        info!("Initializing Vulkan renderer ({}x{})", width, height);

        let surface_extensions = window
            .required_extensions()
            .map_err(|e| RhiError::SurfaceError(e.to_string()))?;
        let instance = Instance::new(
            &config.window.title,
            graphics.enabled_layers(),
            &surface_extensions,
        )?;

        let surface = window
            .create_surface(instance.entry(), instance.handle())
            .map_err(|e| RhiError::SurfaceError(e.to_string()))?;

        let physical_device_info = select_physical_device(
            instance.handle(),
            surface.handle(),
            surface.loader(),
            &graphics.device_extensions,
        )?;

        let device = Device::new(
            &instance,
            &physical_device_info,
            &graphics.device_extensions,
        )?;

        let swapchain = Swapchain::new(
            &instance,
            device.clone(),
            surface.handle(),
            width,
            height,
            SwapchainOptions {
                prefer_mailbox: graphics.prefer_mailbox,
            },
        )?;

        let mut resources = CubeResources::new(device.clone(), graphics.clear_color)?;
        resources.rebuild_all(
            swapchain.extent(),
            swapchain.format(),
            swapchain.image_views(),
        )?;

        let device = VulkanDevice::new(device);
        let scheduler = FrameScheduler::new(
            &device,
            graphics.max_frames_in_flight,
            swapchain.image_count() as usize,
            graphics.frame_timeout(),
        )?;

        info!(
            "Renderer initialized on {}: {} swapchain images, {} frames in flight, {:?}",
            physical_device_info.device_name(),
            swapchain.image_count(),
            graphics.max_frames_in_flight,
            swapchain.present_mode()
        );

        Ok(Self {
            instance: ManuallyDrop::new(instance),
            device: ManuallyDrop::new(device),
            surface: ManuallyDrop::new(surface),
            swapchain: ManuallyDrop::new(swapchain),
            scheduler: ManuallyDrop::new(scheduler),
            resources: ManuallyDrop::new(resources),
        })
    }

    /// Flags the framebuffer as resized. The swapchain is rebuilt after the
    /// next present.
    pub fn request_resize(&mut self) {
        debug!("Resize requested");
        self.scheduler.request_resize();
    }

    /// Renders and presents one frame for a framebuffer of `width` x
    /// `height` pixels.
    ///
    /// # Errors
    ///
    /// Every error is fatal; the caller should shut down.
    pub fn render_frame(&mut self, width: u32, height: u32) -> RhiResult<FrameOutcome> {
        let present_queue = self.device.device().present_queue();
        let mut target = SwapchainTarget {
            instance: &self.instance,
            surface: &self.surface,
            swapchain: &mut self.swapchain,
            present_queue,
        };

        self.scheduler.render_frame(
            &self.device,
            &mut target,
            &mut *self.resources,
            vk::Extent2D { width, height },
        )
    }

    /// Blocks until the GPU has finished all submitted work.
    pub fn wait_idle(&self) -> RhiResult<()> {
        self.device.device().wait_idle()
    }

    /// Returns the current swapchain extent.
    pub fn extent(&self) -> vk::Extent2D {
        self.swapchain.extent()
    }

    /// Returns the swapchain format.
    pub fn format(&self) -> vk::Format {
        self.swapchain.format()
    }

    /// Frame slot the next frame will use.
    pub fn current_frame(&self) -> usize {
        self.scheduler.current_frame()
    }

    pub fn rebuilds(&self) -> u64 {
        self.scheduler.rebuilds()
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        if let Err(e) = self.device.device().wait_idle() {
            error!(
                "Failed to wait for device idle during renderer drop: {:?}",
                e
            );
        }

        // SAFETY: Each field is dropped exactly once, here, and never used
        // again. The device is idle, so nothing references the objects being
        // destroyed.
        unsafe {
            ManuallyDrop::drop(&mut self.resources);
            ManuallyDrop::drop(&mut self.scheduler);
            ManuallyDrop::drop(&mut self.swapchain);
            ManuallyDrop::drop(&mut self.surface);
            ManuallyDrop::drop(&mut self.device);
            ManuallyDrop::drop(&mut self.instance);
        }

        info!("Renderer destroyed");
    }
}
