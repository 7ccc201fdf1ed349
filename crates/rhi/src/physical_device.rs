//! Physical device (GPU) selection.
//!
//! A GPU is usable when it has:
//! 1. a queue family with graphics support and one that can present to the surface
//! 2. every device extension named in the configuration
//! 3. at least one surface format and one present mode for the surface
//!
//! Among usable GPUs a discrete one is preferred over integrated, virtual and
//! CPU implementations; ties keep enumeration order.

use ash::vk;
use tracing::{debug, info, warn};

use crate::error::{RhiError, RhiResult};
use crate::swapchain::SwapchainSupportDetails;

/// Queue family indices discovered while probing a device.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueueFamilyIndices {
    /// Index of the queue family that supports graphics operations.
    pub graphics_family: Option<u32>,
    /// Index of the queue family that supports presentation to a surface.
    pub present_family: Option<u32>,
}

impl QueueFamilyIndices {
    /// Scans queue family properties.
    ///
    /// A family that does both graphics and presentation is preferred so the
    /// swapchain can use exclusive sharing.
    pub fn from_properties(
        families: &[vk::QueueFamilyProperties],
        mut supports_present: impl FnMut(u32) -> bool,
    ) -> Self {
        let mut indices = Self::default();

        for (i, family) in families.iter().enumerate() {
            let i = i as u32;
            if family.queue_count == 0 {
                continue;
            }

            let graphics = family.queue_flags.contains(vk::QueueFlags::GRAPHICS);
            let present = supports_present(i);

            if graphics && present {
                indices.graphics_family = Some(i);
                indices.present_family = Some(i);
                break;
            }
            if graphics && indices.graphics_family.is_none() {
                indices.graphics_family = Some(i);
            }
            if present && indices.present_family.is_none() {
                indices.present_family = Some(i);
            }
        }

        indices
    }

    /// Checks if both graphics and present families were found.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.graphics_family.is_some() && self.present_family.is_some()
    }

    /// Converts to resolved indices, `None` if a family is missing.
    pub fn resolve(&self) -> Option<QueueFamilies> {
        Some(QueueFamilies {
            graphics: self.graphics_family?,
            present: self.present_family?,
        })
    }
}

/// Resolved queue families of the selected device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueueFamilies {
    pub graphics: u32,
    pub present: u32,
}

impl QueueFamilies {
    /// Distinct family indices, one queue is created per entry.
    pub fn unique_families(&self) -> Vec<u32> {
        if self.graphics == self.present {
            vec![self.graphics]
        } else {
            vec![self.graphics, self.present]
        }
    }
}

/// Information about the selected physical device.
#[derive(Clone)]
pub struct PhysicalDeviceInfo {
    /// Vulkan physical device handle.
    pub device: vk::PhysicalDevice,
    /// Device properties (name, limits, API version, etc.).
    pub properties: vk::PhysicalDeviceProperties,
    /// Graphics and present queue families.
    pub queue_families: QueueFamilies,
}

impl PhysicalDeviceInfo {
    /// Returns the device name as a string.
    pub fn device_name(&self) -> &str {
        device_name(&self.properties)
    }

    /// Returns a human-readable string for the device type.
    pub fn device_type_name(&self) -> &'static str {
        match self.properties.device_type {
            vk::PhysicalDeviceType::DISCRETE_GPU => "Discrete GPU",
            vk::PhysicalDeviceType::INTEGRATED_GPU => "Integrated GPU",
            vk::PhysicalDeviceType::VIRTUAL_GPU => "Virtual GPU",
            vk::PhysicalDeviceType::CPU => "CPU",
            _ => "Other",
        }
    }

    /// Returns the Vulkan API version supported by the device.
    pub fn api_version(&self) -> (u32, u32, u32) {
        let version = self.properties.api_version;
        (
            vk::api_version_major(version),
            vk::api_version_minor(version),
            vk::api_version_patch(version),
        )
    }
}

impl std::fmt::Debug for PhysicalDeviceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (major, minor, patch) = self.api_version();
        f.debug_struct("PhysicalDeviceInfo")
            .field("name", &self.device_name())
            .field("type", &self.device_type_name())
            .field("api_version", &format!("{}.{}.{}", major, minor, patch))
            .field("queue_families", &self.queue_families)
            .finish()
    }
}

fn device_name(properties: &vk::PhysicalDeviceProperties) -> &str {
    properties
        .device_name_as_c_str()
        .ok()
        .and_then(|name| name.to_str().ok())
        .unwrap_or("Unknown Device")
}

/// Selects the GPU to render with.
///
/// # Arguments
///
/// * `instance` - The Vulkan instance
/// * `surface` - The window surface for present support checking
/// * `surface_loader` - The surface extension loader
/// * `required_extensions` - Device extension names the GPU must expose
///
/// # Errors
///
/// Returns [`RhiError::NoSuitableGpu`] if no GPU meets the requirements.
pub fn select_physical_device(
    instance: &ash::Instance,
    surface: vk::SurfaceKHR,
    surface_loader: &ash::khr::surface::Instance,
    required_extensions: &[String],
) -> RhiResult<PhysicalDeviceInfo> {
    let devices = unsafe { instance.enumerate_physical_devices()? };

    if devices.is_empty() {
        warn!("No Vulkan-capable GPUs found");
        return Err(RhiError::NoSuitableGpu);
    }

    info!("Found {} GPU(s)", devices.len());

    let mut best: Option<(PhysicalDeviceInfo, u32)> = None;
    for device in devices {
        let Some(info) =
            check_device_suitability(instance, device, surface, surface_loader, required_extensions)?
        else {
            continue;
        };
        let rank = device_type_rank(info.properties.device_type);
        debug!(
            "GPU '{}' ({}) is suitable, rank {}",
            info.device_name(),
            info.device_type_name(),
            rank
        );
        if best.as_ref().is_none_or(|(_, best_rank)| rank > *best_rank) {
            best = Some((info, rank));
        }
    }

    let Some((selected, _)) = best else {
        warn!("No suitable GPU found with required capabilities");
        return Err(RhiError::NoSuitableGpu);
    };

    let (major, minor, patch) = selected.api_version();
    info!(
        "Selected GPU: '{}' ({}) - Vulkan {}.{}.{}",
        selected.device_name(),
        selected.device_type_name(),
        major,
        minor,
        patch
    );

    Ok(selected)
}

/// Returns `Some` when the device meets every requirement.
fn check_device_suitability(
    instance: &ash::Instance,
    device: vk::PhysicalDevice,
    surface: vk::SurfaceKHR,
    surface_loader: &ash::khr::surface::Instance,
    required_extensions: &[String],
) -> RhiResult<Option<PhysicalDeviceInfo>> {
    let properties = unsafe { instance.get_physical_device_properties(device) };
    let name = device_name(&properties).to_string();

    let families = unsafe { instance.get_physical_device_queue_family_properties(device) };
    let indices = QueueFamilyIndices::from_properties(&families, |i| unsafe {
        surface_loader
            .get_physical_device_surface_support(device, i, surface)
            .unwrap_or(false)
    });

    let Some(queue_families) = indices.resolve() else {
        debug!(
            "GPU '{}' skipped: missing required queue families (graphics={}, present={})",
            name,
            indices.graphics_family.is_some(),
            indices.present_family.is_some()
        );
        return Ok(None);
    };

    let available = unsafe { instance.enumerate_device_extension_properties(device)? };
    let available: Vec<String> = available
        .iter()
        .filter_map(|ext| ext.extension_name_as_c_str().ok())
        .map(|name| name.to_string_lossy().into_owned())
        .collect();

    let missing = missing_extensions(&available, required_extensions);
    if !missing.is_empty() {
        debug!("GPU '{}' skipped: missing extensions {:?}", name, missing);
        return Ok(None);
    }

    // Only meaningful once the swapchain extension is known to be present
    let support = SwapchainSupportDetails::query(device, surface, surface_loader)?;
    if !support.is_adequate() {
        debug!("GPU '{}' skipped: inadequate swapchain support", name);
        return Ok(None);
    }

    Ok(Some(PhysicalDeviceInfo {
        device,
        properties,
        queue_families,
    }))
}

/// Required extension names absent from `available`.
pub fn missing_extensions(available: &[String], required: &[String]) -> Vec<String> {
    required
        .iter()
        .filter(|req| !available.iter().any(|have| have == *req))
        .cloned()
        .collect()
}

/// Preference order between device types, higher is better.
pub fn device_type_rank(device_type: vk::PhysicalDeviceType) -> u32 {
    match device_type {
        vk::PhysicalDeviceType::DISCRETE_GPU => 4,
        vk::PhysicalDeviceType::INTEGRATED_GPU => 3,
        vk::PhysicalDeviceType::VIRTUAL_GPU => 2,
        vk::PhysicalDeviceType::CPU => 1,
        _ => 0,
    }
}

/// Converts configured extension names into C strings for device creation.
pub(crate) fn extension_cstrings(names: &[String]) -> RhiResult<Vec<std::ffi::CString>> {
    names
        .iter()
        .map(|name| {
            std::ffi::CString::new(name.as_str()).map_err(|_| {
                RhiError::InvalidHandle(format!("extension name contains NUL: {name:?}"))
            })
        })
        .collect()
}
