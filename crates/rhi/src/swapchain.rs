//! Swapchain management.
//!
//! This module handles VkSwapchainKHR creation, image acquisition, and presentation.
//!
//! # Overview
//!
//! The [`Swapchain`] struct owns the swapchain handle and one image view per
//! presentable image. Acquisition and presentation report their status as
//! [`AcquireOutcome`] and [`PresentOutcome`] so that surface staleness
//! (out-of-date or suboptimal) is a value the frame loop branches on, while
//! every other failure stays an error.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use vkspin_rhi::device::Device;
//! use vkspin_rhi::instance::Instance;
//! use vkspin_rhi::swapchain::{AcquireOutcome, Swapchain, SwapchainOptions};
//! use ash::vk;
//!
//! # fn example(instance: &Instance, device: Arc<Device>, surface: vk::SurfaceKHR, semaphore: vk::Semaphore)
//! # -> Result<(), vkspin_rhi::RhiError> {
//! let swapchain = Swapchain::new(instance, device, surface, 800, 600, SwapchainOptions::default())?;
//!
//! match swapchain.acquire_next_image(None, semaphore)? {
//!     AcquireOutcome::Acquired { index, .. } => {
//!         // record and submit against swapchain.image_views()[index as usize]
//!         let _ = index;
//!     }
//!     AcquireOutcome::OutOfDate => {
//!         // rebuild before the next frame
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use ash::vk;
use tracing::{debug, info, warn};

use crate::device::Device;
use crate::error::{RhiError, RhiResult};
use crate::instance::Instance;
use crate::sync::timeout_to_nanos;

/// Swapchain surface support details.
///
/// Contains information about what the surface supports for swapchain creation.
#[derive(Debug, Clone)]
pub struct SwapchainSupportDetails {
    /// Surface capabilities (min/max image count, extents, transforms, etc.)
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    /// Supported surface formats (format and color space combinations)
    pub formats: Vec<vk::SurfaceFormatKHR>,
    /// Supported present modes (FIFO, MAILBOX, IMMEDIATE, etc.)
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl SwapchainSupportDetails {
    /// Queries swapchain support details for a physical device and surface.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the queries fail.
    pub fn query(
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
        surface_loader: &ash::khr::surface::Instance,
    ) -> RhiResult<Self> {
        let capabilities = unsafe {
            surface_loader.get_physical_device_surface_capabilities(physical_device, surface)?
        };

        let formats = unsafe {
            surface_loader.get_physical_device_surface_formats(physical_device, surface)?
        };

        let present_modes = unsafe {
            surface_loader.get_physical_device_surface_present_modes(physical_device, surface)?
        };

        debug!(
            "Swapchain support: {} formats, {} present modes, image count: {}-{}",
            formats.len(),
            present_modes.len(),
            capabilities.min_image_count,
            max_image_count_label(&capabilities)
        );

        Ok(Self {
            capabilities,
            formats,
            present_modes,
        })
    }

    /// Returns true if at least one format and one present mode are available.
    #[inline]
    pub fn is_adequate(&self) -> bool {
        !self.formats.is_empty() && !self.present_modes.is_empty()
    }
}

/// Creation options that come from configuration.
#[derive(Debug, Clone, Copy)]
pub struct SwapchainOptions {
    /// Use MAILBOX when available instead of FIFO.
    pub prefer_mailbox: bool,
}

impl Default for SwapchainOptions {
    fn default() -> Self {
        Self {
            prefer_mailbox: true,
        }
    }
}

/// Result of asking the swapchain for the next image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireOutcome {
    /// An image was acquired. `suboptimal` images may still be rendered and
    /// presented; presentation will report the staleness again.
    Acquired { index: u32, suboptimal: bool },
    /// The swapchain no longer matches the surface and must be rebuilt
    /// before anything else is submitted against it.
    OutOfDate,
}

/// Result of queueing an image for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentOutcome {
    Optimal,
    Suboptimal,
    OutOfDate,
}

impl PresentOutcome {
    /// True when the swapchain should be rebuilt after this present.
    #[inline]
    pub fn is_stale(self) -> bool {
        !matches!(self, PresentOutcome::Optimal)
    }
}

/// Maps the raw result of `vkAcquireNextImageKHR` onto [`AcquireOutcome`].
///
/// Out-of-date is a value; an expired bounded wait is [`RhiError::Timeout`];
/// anything else is fatal.
pub fn classify_acquire(
    result: Result<(u32, bool), vk::Result>,
    timeout: Option<Duration>,
) -> RhiResult<AcquireOutcome> {
    match result {
        Ok((index, suboptimal)) => Ok(AcquireOutcome::Acquired { index, suboptimal }),
        Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(AcquireOutcome::OutOfDate),
        Err(vk::Result::TIMEOUT | vk::Result::NOT_READY) => Err(RhiError::Timeout(
            timeout.unwrap_or(Duration::ZERO),
            "swapchain image",
        )),
        Err(e) => Err(e.into()),
    }
}

/// Maps the raw result of `vkQueuePresentKHR` onto [`PresentOutcome`].
pub fn classify_present(result: Result<bool, vk::Result>) -> RhiResult<PresentOutcome> {
    match result {
        Ok(false) => Ok(PresentOutcome::Optimal),
        Ok(true) | Err(vk::Result::SUBOPTIMAL_KHR) => Ok(PresentOutcome::Suboptimal),
        Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(PresentOutcome::OutOfDate),
        Err(e) => Err(e.into()),
    }
}

/// Vulkan swapchain wrapper.
///
/// Owns the swapchain handle and its image views. The images themselves
/// belong to the presentation engine.
pub struct Swapchain {
    device: Arc<Device>,
    swapchain_loader: ash::khr::swapchain::Device,
    swapchain: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    image_views: Vec<vk::ImageView>,
    format: vk::Format,
    color_space: vk::ColorSpaceKHR,
    extent: vk::Extent2D,
    present_mode: vk::PresentModeKHR,
    options: SwapchainOptions,
}

impl Swapchain {
    /// Creates a new swapchain sized to `width` x `height` where the surface
    /// leaves the extent to the application.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Surface queries fail
    /// - The surface offers no format or present mode
    /// - Swapchain or image view creation fails
    pub fn new(
        instance: &Instance,
        device: Arc<Device>,
        surface: vk::SurfaceKHR,
        width: u32,
        height: u32,
        options: SwapchainOptions,
    ) -> RhiResult<Self> {
        Self::create_internal(
            instance,
            device,
            surface,
            width,
            height,
            options,
            vk::SwapchainKHR::null(),
        )
    }

    fn create_internal(
        instance: &Instance,
        device: Arc<Device>,
        surface: vk::SurfaceKHR,
        width: u32,
        height: u32,
        options: SwapchainOptions,
        old_swapchain: vk::SwapchainKHR,
    ) -> RhiResult<Self> {
        let swapchain_loader = ash::khr::swapchain::Device::new(instance.handle(), device.handle());
        let surface_loader = ash::khr::surface::Instance::new(instance.entry(), instance.handle());

        // Capabilities change with the window, so they are queried on every build
        let support =
            SwapchainSupportDetails::query(device.physical_device(), surface, &surface_loader)?;

        if !support.is_adequate() {
            return Err(RhiError::SwapchainError(
                "Inadequate swapchain support (no formats or present modes)".to_string(),
            ));
        }

        let surface_format = choose_surface_format(&support.formats);
        let present_mode = choose_present_mode(&support.present_modes, options.prefer_mailbox);
        let extent = choose_extent(&support.capabilities, width, height);
        let image_count = determine_image_count(&support.capabilities);

        info!(
            "Creating swapchain: {}x{}, format {:?}, color space {:?}, present mode {:?}, {} images requested",
            extent.width,
            extent.height,
            surface_format.format,
            surface_format.color_space,
            present_mode,
            image_count
        );

        let queue_families = device.queue_families();
        let queue_family_indices = [queue_families.graphics, queue_families.present];

        let (sharing_mode, queue_family_indices_slice) =
            if queue_families.graphics != queue_families.present {
                debug!(
                    "Using CONCURRENT sharing mode between graphics ({}) and present ({}) queues",
                    queue_families.graphics, queue_families.present
                );
                (vk::SharingMode::CONCURRENT, queue_family_indices.as_slice())
            } else {
                (vk::SharingMode::EXCLUSIVE, &[][..])
            };

        let create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(surface)
            .min_image_count(image_count)
            .image_format(surface_format.format)
            .image_color_space(surface_format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(sharing_mode)
            .queue_family_indices(queue_family_indices_slice)
            .pre_transform(support.capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode)
            .clipped(true)
            .old_swapchain(old_swapchain);

        let swapchain = unsafe { swapchain_loader.create_swapchain(&create_info, None)? };

        let images = match unsafe { swapchain_loader.get_swapchain_images(swapchain) } {
            Ok(images) => images,
            Err(e) => {
                unsafe { swapchain_loader.destroy_swapchain(swapchain, None) };
                return Err(e.into());
            }
        };
        info!("Swapchain created with {} images", images.len());

        let image_views = match create_image_views(&device, &images, surface_format.format) {
            Ok(views) => views,
            Err(e) => {
                unsafe { swapchain_loader.destroy_swapchain(swapchain, None) };
                return Err(e);
            }
        };

        Ok(Self {
            device,
            swapchain_loader,
            swapchain,
            images,
            image_views,
            format: surface_format.format,
            color_space: surface_format.color_space,
            extent,
            present_mode,
            options,
        })
    }

    /// Replaces the swapchain with one matching the surface's current state.
    ///
    /// The old handle is passed as `oldSwapchain` and destroyed once the new
    /// one exists. The caller must have waited for the device to go idle so
    /// that no submission still references the old images.
    ///
    /// # Errors
    ///
    /// Returns an error if swapchain recreation fails. The old swapchain is
    /// destroyed either way.
    pub fn recreate(
        &mut self,
        instance: &Instance,
        surface: vk::SurfaceKHR,
        width: u32,
        height: u32,
    ) -> RhiResult<()> {
        info!("Recreating swapchain for {}x{}", width, height);

        self.destroy_image_views();

        let old_swapchain = std::mem::replace(&mut self.swapchain, vk::SwapchainKHR::null());
        self.images.clear();

        let result = Self::create_internal(
            instance,
            self.device.clone(),
            surface,
            width,
            height,
            self.options,
            old_swapchain,
        );

        unsafe {
            self.swapchain_loader.destroy_swapchain(old_swapchain, None);
        }

        let mut fresh = result?;

        self.swapchain = std::mem::replace(&mut fresh.swapchain, vk::SwapchainKHR::null());
        self.images = std::mem::take(&mut fresh.images);
        self.image_views = std::mem::take(&mut fresh.image_views);
        self.format = fresh.format;
        self.color_space = fresh.color_space;
        self.extent = fresh.extent;
        self.present_mode = fresh.present_mode;

        Ok(())
    }

    /// Acquires the next presentable image, signaling `semaphore` once the
    /// presentation engine has released it.
    ///
    /// # Errors
    ///
    /// [`RhiError::Timeout`] if a bounded `timeout` expires, and any Vulkan
    /// error other than out-of-date or suboptimal.
    pub fn acquire_next_image(
        &self,
        timeout: Option<Duration>,
        semaphore: vk::Semaphore,
    ) -> RhiResult<AcquireOutcome> {
        let result = unsafe {
            self.swapchain_loader.acquire_next_image(
                self.swapchain,
                timeout_to_nanos(timeout),
                semaphore,
                vk::Fence::null(),
            )
        };
        classify_acquire(result, timeout)
    }

    /// Queues image `image_index` for presentation after `wait_semaphore`.
    pub fn present(
        &self,
        queue: vk::Queue,
        image_index: u32,
        wait_semaphore: vk::Semaphore,
    ) -> RhiResult<PresentOutcome> {
        let swapchains = [self.swapchain];
        let image_indices = [image_index];
        let wait_semaphores = [wait_semaphore];

        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        let result = unsafe { self.swapchain_loader.queue_present(queue, &present_info) };
        classify_present(result)
    }

    /// Returns the swapchain handle.
    #[inline]
    pub fn handle(&self) -> vk::SwapchainKHR {
        self.swapchain
    }

    /// Returns the swapchain image format.
    #[inline]
    pub fn format(&self) -> vk::Format {
        self.format
    }

    /// Returns the swapchain color space.
    #[inline]
    pub fn color_space(&self) -> vk::ColorSpaceKHR {
        self.color_space
    }

    /// Returns the swapchain extent (resolution).
    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    /// Returns the present mode.
    #[inline]
    pub fn present_mode(&self) -> vk::PresentModeKHR {
        self.present_mode
    }

    /// Returns the number of swapchain images (M).
    #[inline]
    pub fn image_count(&self) -> u32 {
        self.images.len() as u32
    }

    /// Returns all image views, one per swapchain image.
    #[inline]
    pub fn image_views(&self) -> &[vk::ImageView] {
        &self.image_views
    }

    fn destroy_image_views(&mut self) {
        for &image_view in &self.image_views {
            unsafe {
                self.device.handle().destroy_image_view(image_view, None);
            }
        }
        if !self.image_views.is_empty() {
            debug!("Destroyed {} swapchain image views", self.image_views.len());
        }
        self.image_views.clear();
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        self.destroy_image_views();

        if self.swapchain != vk::SwapchainKHR::null() {
            unsafe {
                self.swapchain_loader
                    .destroy_swapchain(self.swapchain, None);
            }

            info!(
                "Swapchain destroyed (was {}x{}, {} images)",
                self.extent.width,
                self.extent.height,
                self.images.len()
            );
        }
    }
}

fn max_image_count_label(capabilities: &vk::SurfaceCapabilitiesKHR) -> String {
    if capabilities.max_image_count == 0 {
        "unlimited".to_string()
    } else {
        capabilities.max_image_count.to_string()
    }
}

/// Chooses the surface format.
///
/// Prefers B8G8R8A8_SRGB with SRGB_NONLINEAR, then B8G8R8A8_UNORM, then
/// whatever the surface lists first.
fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> vk::SurfaceFormatKHR {
    let find = |format: vk::Format| {
        formats
            .iter()
            .copied()
            .find(|f| f.format == format && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR)
    };

    if let Some(format) = find(vk::Format::B8G8R8A8_SRGB) {
        debug!("Selected preferred surface format: B8G8R8A8_SRGB with SRGB_NONLINEAR");
        return format;
    }

    if let Some(format) = find(vk::Format::B8G8R8A8_UNORM) {
        warn!("Using fallback surface format: B8G8R8A8_UNORM with SRGB_NONLINEAR");
        return format;
    }

    // Callers check is_adequate() first, so formats is non-empty here
    warn!(
        "Using first available surface format: {:?}",
        formats[0].format
    );
    formats[0]
}

/// Chooses the present mode.
///
/// MAILBOX when requested and offered, otherwise FIFO, which every surface
/// must support.
fn choose_present_mode(
    present_modes: &[vk::PresentModeKHR],
    prefer_mailbox: bool,
) -> vk::PresentModeKHR {
    if prefer_mailbox && present_modes.contains(&vk::PresentModeKHR::MAILBOX) {
        debug!("Selected MAILBOX present mode");
        return vk::PresentModeKHR::MAILBOX;
    }

    debug!("Selected FIFO present mode (vsync)");
    vk::PresentModeKHR::FIFO
}

/// Chooses the swapchain extent.
///
/// Uses the surface's current extent when it is defined; a current width of
/// `u32::MAX` means the application picks, clamped to the surface limits.
fn choose_extent(capabilities: &vk::SurfaceCapabilitiesKHR, width: u32, height: u32) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }

    let extent = vk::Extent2D {
        width: width.clamp(
            capabilities.min_image_extent.width,
            capabilities.max_image_extent.width,
        ),
        height: height.clamp(
            capabilities.min_image_extent.height,
            capabilities.max_image_extent.height,
        ),
    };

    debug!(
        "Calculated extent: {}x{} (requested: {}x{})",
        extent.width, extent.height, width, height
    );

    extent
}

/// One more image than the minimum, bounded by the maximum when there is one.
fn determine_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let preferred = capabilities.min_image_count + 1;

    if capabilities.max_image_count > 0 {
        preferred.min(capabilities.max_image_count)
    } else {
        preferred
    }
}

fn create_image_views(
    device: &Device,
    images: &[vk::Image],
    format: vk::Format,
) -> RhiResult<Vec<vk::ImageView>> {
    let mut image_views = Vec::with_capacity(images.len());

    for (i, &image) in images.iter().enumerate() {
        let create_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .components(vk::ComponentMapping::default())
            .subresource_range(
                vk::ImageSubresourceRange::default()
                    .aspect_mask(vk::ImageAspectFlags::COLOR)
                    .level_count(1)
                    .layer_count(1),
            );

        match unsafe { device.handle().create_image_view(&create_info, None) } {
            Ok(view) => image_views.push(view),
            Err(e) => {
                for view in image_views {
                    unsafe { device.handle().destroy_image_view(view, None) };
                }
                return Err(RhiError::SwapchainError(format!(
                    "Failed to create image view {}: {:?}",
                    i, e
                )));
            }
        }
    }

    debug!("Created {} image views", image_views.len());
    Ok(image_views)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface_format(format: vk::Format) -> vk::SurfaceFormatKHR {
        vk::SurfaceFormatKHR {
            format,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        }
    }

    #[test]
    fn test_choose_surface_format_prefers_srgb() {
        let formats = vec![
            surface_format(vk::Format::R8G8B8A8_UNORM),
            surface_format(vk::Format::B8G8R8A8_SRGB),
            surface_format(vk::Format::B8G8R8A8_UNORM),
        ];

        let selected = choose_surface_format(&formats);
        assert_eq!(selected.format, vk::Format::B8G8R8A8_SRGB);
        assert_eq!(selected.color_space, vk::ColorSpaceKHR::SRGB_NONLINEAR);
    }

    #[test]
    fn test_choose_surface_format_unorm_second() {
        let formats = vec![
            surface_format(vk::Format::R8G8B8A8_UNORM),
            surface_format(vk::Format::B8G8R8A8_UNORM),
        ];
        assert_eq!(
            choose_surface_format(&formats).format,
            vk::Format::B8G8R8A8_UNORM
        );
    }

    #[test]
    fn test_choose_surface_format_fallback() {
        let formats = vec![surface_format(vk::Format::R8G8B8A8_UNORM)];
        assert_eq!(
            choose_surface_format(&formats).format,
            vk::Format::R8G8B8A8_UNORM
        );
    }

    #[test]
    fn test_choose_present_mode_prefers_mailbox() {
        let modes = [
            vk::PresentModeKHR::FIFO,
            vk::PresentModeKHR::MAILBOX,
            vk::PresentModeKHR::IMMEDIATE,
        ];
        assert_eq!(choose_present_mode(&modes, true), vk::PresentModeKHR::MAILBOX);
    }

    #[test]
    fn test_choose_present_mode_mailbox_not_requested() {
        let modes = [vk::PresentModeKHR::FIFO, vk::PresentModeKHR::MAILBOX];
        assert_eq!(choose_present_mode(&modes, false), vk::PresentModeKHR::FIFO);
    }

    #[test]
    fn test_choose_present_mode_fallback_to_fifo() {
        let modes = [vk::PresentModeKHR::FIFO, vk::PresentModeKHR::IMMEDIATE];
        assert_eq!(choose_present_mode(&modes, true), vk::PresentModeKHR::FIFO);
    }

    #[test]
    fn test_choose_extent_uses_current() {
        let capabilities = vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D {
                width: 1920,
                height: 1080,
            },
            min_image_extent: vk::Extent2D {
                width: 1,
                height: 1,
            },
            max_image_extent: vk::Extent2D {
                width: 4096,
                height: 4096,
            },
            ..Default::default()
        };

        let extent = choose_extent(&capabilities, 800, 600);
        assert_eq!((extent.width, extent.height), (1920, 1080));
    }

    #[test]
    fn test_choose_extent_clamps_to_limits() {
        let capabilities = vk::SurfaceCapabilitiesKHR {
            current_extent: vk::Extent2D {
                width: u32::MAX,
                height: u32::MAX,
            },
            min_image_extent: vk::Extent2D {
                width: 100,
                height: 100,
            },
            max_image_extent: vk::Extent2D {
                width: 2000,
                height: 2000,
            },
            ..Default::default()
        };

        let extent = choose_extent(&capabilities, 3000, 3000);
        assert_eq!((extent.width, extent.height), (2000, 2000));

        let extent = choose_extent(&capabilities, 50, 50);
        assert_eq!((extent.width, extent.height), (100, 100));

        let extent = choose_extent(&capabilities, 800, 600);
        assert_eq!((extent.width, extent.height), (800, 600));
    }

    #[test]
    fn test_determine_image_count() {
        let capped = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 2,
            ..Default::default()
        };
        assert_eq!(determine_image_count(&capped), 2);

        let roomy = vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 8,
            ..Default::default()
        };
        assert_eq!(determine_image_count(&roomy), 3);

        let unlimited = vk::SurfaceCapabilitiesKHR {
            min_image_count: 3,
            max_image_count: 0,
            ..Default::default()
        };
        assert_eq!(determine_image_count(&unlimited), 4);
    }

    #[test]
    fn test_swapchain_support_details_is_adequate() {
        let adequate = SwapchainSupportDetails {
            capabilities: vk::SurfaceCapabilitiesKHR::default(),
            formats: vec![vk::SurfaceFormatKHR::default()],
            present_modes: vec![vk::PresentModeKHR::FIFO],
        };
        assert!(adequate.is_adequate());

        let no_formats = SwapchainSupportDetails {
            formats: vec![],
            ..adequate.clone()
        };
        assert!(!no_formats.is_adequate());

        let no_modes = SwapchainSupportDetails {
            present_modes: vec![],
            ..adequate
        };
        assert!(!no_modes.is_adequate());
    }

    #[test]
    fn test_classify_acquire() {
        assert_eq!(
            classify_acquire(Ok((2, false)), None).unwrap(),
            AcquireOutcome::Acquired {
                index: 2,
                suboptimal: false
            }
        );
        assert_eq!(
            classify_acquire(Ok((0, true)), None).unwrap(),
            AcquireOutcome::Acquired {
                index: 0,
                suboptimal: true
            }
        );
        assert_eq!(
            classify_acquire(Err(vk::Result::ERROR_OUT_OF_DATE_KHR), None).unwrap(),
            AcquireOutcome::OutOfDate
        );
    }

    #[test]
    fn test_classify_acquire_errors() {
        let limit = Duration::from_millis(5);
        assert!(matches!(
            classify_acquire(Err(vk::Result::TIMEOUT), Some(limit)),
            Err(RhiError::Timeout(d, _)) if d == limit
        ));
        assert!(matches!(
            classify_acquire(Err(vk::Result::ERROR_DEVICE_LOST), None),
            Err(RhiError::VulkanError(vk::Result::ERROR_DEVICE_LOST))
        ));
        assert!(matches!(
            classify_acquire(Err(vk::Result::ERROR_SURFACE_LOST_KHR), None),
            Err(RhiError::VulkanError(_))
        ));
    }

    #[test]
    fn test_classify_present() {
        assert_eq!(classify_present(Ok(false)).unwrap(), PresentOutcome::Optimal);
        assert_eq!(
            classify_present(Ok(true)).unwrap(),
            PresentOutcome::Suboptimal
        );
        assert_eq!(
            classify_present(Err(vk::Result::SUBOPTIMAL_KHR)).unwrap(),
            PresentOutcome::Suboptimal
        );
        assert_eq!(
            classify_present(Err(vk::Result::ERROR_OUT_OF_DATE_KHR)).unwrap(),
            PresentOutcome::OutOfDate
        );
        assert!(classify_present(Err(vk::Result::ERROR_DEVICE_LOST)).is_err());
    }

    #[test]
    fn test_present_outcome_staleness() {
        assert!(!PresentOutcome::Optimal.is_stale());
        assert!(PresentOutcome::Suboptimal.is_stale());
        assert!(PresentOutcome::OutOfDate.is_stale());
    }
}
