//! Window management using winit.
//!
//! This module provides window creation, framebuffer size tracking, and
//! Vulkan surface creation.

use std::ffi::{CStr, c_char};
use std::sync::Arc;

use ash::vk;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::dpi::PhysicalSize;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window as WinitWindow, WindowAttributes};

use vkspin_core::{Error, Result, WindowConfig};

/// RAII wrapper for a Vulkan surface.
///
/// The caller must ensure that the Vulkan instance outlives this surface and
/// that every swapchain created on it is destroyed first.
pub struct Surface {
    handle: vk::SurfaceKHR,
    surface_loader: ash::khr::surface::Instance,
}

impl Surface {
    /// Get the raw Vulkan surface handle.
    ///
    /// Valid only as long as this `Surface` exists.
    #[inline]
    pub fn handle(&self) -> vk::SurfaceKHR {
        self.handle
    }

    /// Surface loader for capability, format and present mode queries.
    #[inline]
    pub fn loader(&self) -> &ash::khr::surface::Instance {
        &self.surface_loader
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        // SAFETY: The handle was created by ash_window::create_surface from the
        // same instance as the loader, and is destroyed only here.
        unsafe {
            self.surface_loader.destroy_surface(self.handle, None);
        }
        tracing::debug!("Vulkan surface destroyed");
    }
}

/// A winit window plus its last known framebuffer size in physical pixels.
pub struct Window {
    window: Arc<WinitWindow>,
    width: u32,
    height: u32,
}

impl Window {
    /// Creates a window from configuration.
    pub fn new(event_loop: &ActiveEventLoop, config: &WindowConfig) -> Result<Self> {
        let attrs = WindowAttributes::default()
            .with_title(config.title.as_str())
            .with_inner_size(PhysicalSize::new(config.width, config.height))
            .with_resizable(config.resizable);

        let window = event_loop
            .create_window(attrs)
            .map_err(|e| Error::Window(e.to_string()))?;

        // The compositor may not honor the requested size.
        let size = window.inner_size();

        tracing::info!(
            "Window '{}' created: {}x{} (requested {}x{})",
            config.title,
            size.width,
            size.height,
            config.width,
            config.height
        );

        Ok(Self {
            window: Arc::new(window),
            width: size.width,
            height: size.height,
        })
    }

    /// Get a reference to the underlying winit window.
    pub fn inner(&self) -> &WinitWindow {
        &self.window
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Current framebuffer size as `(width, height)`.
    pub fn framebuffer_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// True while the framebuffer has zero area, e.g. when minimized.
    pub fn is_minimized(&self) -> bool {
        is_zero_area(self.width, self.height)
    }

    /// Update the stored dimensions from a resize event.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        tracing::debug!("Window resized: {}x{}", width, height);
    }

    /// Re-reads the size from the windowing system.
    pub fn refresh_size(&mut self) -> (u32, u32) {
        let size = self.window.inner_size();
        self.width = size.width;
        self.height = size.height;
        (self.width, self.height)
    }

    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }

    /// Instance extensions needed to create a surface for this window.
    ///
    /// The returned pointers reference static strings owned by `ash-window`.
    pub fn required_extensions(&self) -> Result<Vec<*const c_char>> {
        let display_handle = self
            .window
            .display_handle()
            .map_err(|e| Error::Window(format!("Failed to get display handle: {}", e)))?;

        let extensions = ash_window::enumerate_required_extensions(display_handle.as_raw())
            .map_err(|e| Error::Vulkan(format!("Failed to enumerate required extensions: {}", e)))?;

        tracing::debug!(
            "Required Vulkan extensions for surface: {:?}",
            extensions
                .iter()
                // SAFETY: ash_window returns pointers to static NUL-terminated names.
                .map(|&ext| unsafe { CStr::from_ptr(ext) })
                .collect::<Vec<_>>()
        );

        Ok(extensions.to_vec())
    }

    /// Create a Vulkan surface for this window.
    ///
    /// # Errors
    /// Returns an error if the window or display handle is unavailable, or
    /// surface creation fails.
    pub fn create_surface(&self, entry: &ash::Entry, instance: &ash::Instance) -> Result<Surface> {
        let display_handle = self
            .window
            .display_handle()
            .map_err(|e| Error::Window(format!("Failed to get display handle: {}", e)))?;

        let window_handle = self
            .window
            .window_handle()
            .map_err(|e| Error::Window(format!("Failed to get window handle: {}", e)))?;

        // SAFETY: Handles come from a live winit window and the instance was
        // created with the extensions from `required_extensions`.
        let handle = unsafe {
            ash_window::create_surface(
                entry,
                instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            )
            .map_err(|e| Error::Vulkan(format!("Failed to create Vulkan surface: {}", e)))?
        };

        let surface_loader = ash::khr::surface::Instance::new(entry, instance);

        tracing::info!("Vulkan surface created");

        Ok(Surface {
            handle,
            surface_loader,
        })
    }
}

fn is_zero_area(width: u32, height: u32) -> bool {
    width == 0 || height == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_area() {
        assert!(is_zero_area(0, 600));
        assert!(is_zero_area(800, 0));
        assert!(is_zero_area(0, 0));
        assert!(!is_zero_area(1, 1));
    }
}
