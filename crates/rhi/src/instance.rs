//! Vulkan instance management.
//!
//! This module handles VkInstance creation, validation layers, and the debug
//! messenger that forwards validation output to `tracing`.
//!
//! # Example
//!
//! ```no_run
//! use vkspin_rhi::instance::Instance;
//!
//! let layers = vec!["VK_LAYER_KHRONOS_validation".to_string()];
//! let instance = Instance::new("vkspin", &layers, &[]).expect("Failed to create Vulkan instance");
//! println!("validation: {}", instance.has_validation());
//! ```

use std::ffi::{CStr, CString, c_char};

use ash::{Entry, vk};
use tracing::{debug, error, info, warn};

use crate::error::{RhiError, RhiResult};

/// Vulkan instance wrapper with optional validation layer support.
///
/// Dropping the instance destroys the debug messenger first, then the
/// instance. Every other Vulkan object must already be gone by then.
pub struct Instance {
    entry: Entry,
    instance: ash::Instance,
    debug_utils: Option<ash::ext::debug_utils::Instance>,
    debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
    enabled_layers: Vec<String>,
}

impl Instance {
    /// Creates a new Vulkan instance.
    ///
    /// # Arguments
    ///
    /// * `application_name` - Reported to the driver in `VkApplicationInfo`
    /// * `validation_layers` - Layers to enable; empty disables validation.
    ///   Layers the loader does not know are skipped with a warning.
    /// * `surface_extensions` - Instance extensions the window system needs,
    ///   as returned by `ash_window::enumerate_required_extensions`
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Vulkan library cannot be loaded
    /// - Instance creation fails
    /// - Debug messenger setup fails (when validation is enabled)
    pub fn new(
        application_name: &str,
        validation_layers: &[String],
        surface_extensions: &[*const c_char],
    ) -> RhiResult<Self> {
        let entry = unsafe { Entry::load()? };

        let enabled_layers = Self::available_layers(&entry, validation_layers)?;
        let validation = !enabled_layers.is_empty();

        let app_name = CString::new(application_name)
            .map_err(|e| RhiError::InvalidHandle(format!("Invalid application name: {}", e)))?;

        let app_info = vk::ApplicationInfo::default()
            .application_name(&app_name)
            .application_version(vk::make_api_version(0, 0, 1, 0))
            .engine_name(c"vkspin")
            .engine_version(vk::make_api_version(0, 0, 1, 0))
            .api_version(vk::API_VERSION_1_1);

        let mut extensions = surface_extensions.to_vec();
        if validation {
            extensions.push(ash::ext::debug_utils::NAME.as_ptr());
        }

        #[cfg(target_os = "macos")]
        extensions.push(ash::khr::portability_enumeration::NAME.as_ptr());

        let layer_names: Vec<CString> = enabled_layers
            .iter()
            .map(|name| CString::new(name.as_str()))
            .collect::<Result<_, _>>()
            .map_err(|e| RhiError::InvalidHandle(format!("Invalid layer name: {}", e)))?;
        let layer_ptrs: Vec<*const c_char> = layer_names.iter().map(|n| n.as_ptr()).collect();

        let create_flags = if cfg!(target_os = "macos") {
            vk::InstanceCreateFlags::ENUMERATE_PORTABILITY_KHR
        } else {
            vk::InstanceCreateFlags::empty()
        };

        let create_info = vk::InstanceCreateInfo::default()
            .application_info(&app_info)
            .enabled_extension_names(&extensions)
            .enabled_layer_names(&layer_ptrs)
            .flags(create_flags);

        let instance = unsafe { entry.create_instance(&create_info, None)? };

        info!(
            "Vulkan instance created ({} extensions, {} layers)",
            extensions.len(),
            layer_ptrs.len()
        );

        let (debug_utils, debug_messenger) = if validation {
            let debug_utils = ash::ext::debug_utils::Instance::new(&entry, &instance);
            match Self::setup_debug_messenger(&debug_utils) {
                Ok(messenger) => {
                    info!("Validation layers enabled: {:?}", enabled_layers);
                    (Some(debug_utils), Some(messenger))
                }
                Err(e) => {
                    unsafe { instance.destroy_instance(None) };
                    return Err(e);
                }
            }
        } else {
            (None, None)
        };

        Ok(Self {
            entry,
            instance,
            debug_utils,
            debug_messenger,
            enabled_layers,
        })
    }

    /// Returns the Vulkan instance handle.
    #[inline]
    pub fn handle(&self) -> &ash::Instance {
        &self.instance
    }

    /// Returns the Vulkan entry point loader.
    #[inline]
    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    /// Returns whether validation layers are enabled.
    #[inline]
    pub fn has_validation(&self) -> bool {
        self.debug_messenger.is_some()
    }

    /// Layers that were actually enabled.
    #[inline]
    pub fn enabled_layers(&self) -> &[String] {
        &self.enabled_layers
    }

    /// Filters `requested` down to the layers the loader reports.
    fn available_layers(entry: &Entry, requested: &[String]) -> RhiResult<Vec<String>> {
        if requested.is_empty() {
            return Ok(Vec::new());
        }

        let properties = unsafe { entry.enumerate_instance_layer_properties()? };
        let available: Vec<String> = properties
            .iter()
            .filter_map(|layer| layer.layer_name_as_c_str().ok())
            .map(|name| name.to_string_lossy().into_owned())
            .collect();

        let (found, missing) = partition_layers(requested, &available);
        for layer in &missing {
            warn!("Validation layer {} requested but not available", layer);
        }
        Ok(found)
    }

    fn setup_debug_messenger(
        debug_utils: &ash::ext::debug_utils::Instance,
    ) -> RhiResult<vk::DebugUtilsMessengerEXT> {
        let create_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
            .message_severity(
                vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
                    | vk::DebugUtilsMessageSeverityFlagsEXT::INFO
                    | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                    | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
            )
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(debug_callback));

        let messenger = unsafe { debug_utils.create_debug_utils_messenger(&create_info, None)? };

        Ok(messenger)
    }
}

impl Drop for Instance {
    fn drop(&mut self) {
        unsafe {
            if let (Some(debug_utils), Some(messenger)) = (&self.debug_utils, self.debug_messenger)
            {
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }
            self.instance.destroy_instance(None);
        }
        info!("Vulkan instance destroyed");
    }
}

/// Splits requested layers into (available, missing), keeping request order.
fn partition_layers(requested: &[String], available: &[String]) -> (Vec<String>, Vec<String>) {
    requested
        .iter()
        .cloned()
        .partition(|layer| available.iter().any(|have| have == layer))
}

/// Forwards validation messages to `tracing` by severity.
///
/// # Safety
///
/// Called by the Vulkan loader with a valid (or null) callback data pointer.
unsafe extern "system" fn debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    _user_data: *mut std::ffi::c_void,
) -> vk::Bool32 {
    if p_callback_data.is_null() {
        return vk::FALSE;
    }

    let callback_data = unsafe { &*p_callback_data };
    let message = if callback_data.p_message.is_null() {
        std::borrow::Cow::Borrowed("(no message)")
    } else {
        unsafe { CStr::from_ptr(callback_data.p_message).to_string_lossy() }
    };

    let kind = match message_type {
        vk::DebugUtilsMessageTypeFlagsEXT::GENERAL => "general",
        vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION => "validation",
        vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE => "performance",
        _ => "other",
    };

    match message_severity {
        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR => {
            error!(target: "vkspin::validation", kind, "{}", message);
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::WARNING => {
            warn!(target: "vkspin::validation", kind, "{}", message);
        }
        vk::DebugUtilsMessageSeverityFlagsEXT::INFO => {
            info!(target: "vkspin::validation", kind, "{}", message);
        }
        _ => {
            debug!(target: "vkspin::validation", kind, "{}", message);
        }
    }

    vk::FALSE
}
