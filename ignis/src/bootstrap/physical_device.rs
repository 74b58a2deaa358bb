use std::collections::HashSet;
use std::ffi::{c_char, CString};

use anyhow::Result;
use ash::vk;

use crate::util::wrap_c_str;
use crate::IgnisError;

/// A selected physical device along with the graphics queue family that drives it
#[derive(Debug, Clone)]
pub struct SelectedDevice {
    pub physical_device: crate::device::PhysicalDevice,
    pub graphics_family: u32,
    pub extensions: Vec<CString>,
}

/// Picks the physical device used for the rest of the engine's lifetime. A suitable device
/// offers the minimum Vulkan version, every required extension, and a graphics-capable
/// queue family that can present to the given surface. Discrete GPUs win ties.
#[derive(Default)]
pub struct PhysicalDeviceSelector {
    min_vulkan_version: (u32, u32),
    required_extensions: HashSet<CString>,
}

/// Get Vulkan version from the version given by Khronos
fn get_version(version: u32) -> (u32, u32) {
    (version >> 22, (version >> 12) & 0x3ff)
}

impl PhysicalDeviceSelector {
    /// Set the minimum supported Vulkan version that is deemed suitable
    pub fn set_minimum_vulkan_version(mut self, version: (u32, u32)) -> Self {
        self.min_vulkan_version = version;
        self
    }

    /// Adds a required extension
    pub fn add_required_extension(mut self, extension: *const c_char) -> Self {
        self.required_extensions.insert(wrap_c_str(extension));
        self
    }

    fn graphics_family_with_present(
        physical_device: &crate::device::PhysicalDevice,
        surface: &crate::wsi::Surface,
    ) -> Result<Option<u32>> {
        for (index, family) in physical_device.get_queue_families().iter().enumerate() {
            if family.queue_count == 0 {
                continue;
            }
            if !family.queue_flags.contains(vk::QueueFlags::GRAPHICS) {
                continue;
            }
            if surface.supports_queue_family(physical_device.handle(), index as u32)? {
                return Ok(Some(index as u32));
            }
        }
        Ok(None)
    }

    /// Selects the most suitable physical device able to present to `surface`
    pub fn select(
        self,
        instance: &crate::core::Instance,
        surface: &crate::wsi::Surface,
    ) -> Result<SelectedDevice> {
        let physical_devices =
            unsafe { instance.get_instance().enumerate_physical_devices()? };
        let mut fallback: Option<SelectedDevice> = None;

        for handle in physical_devices {
            let physical_device =
                crate::device::PhysicalDevice::new(instance.get_instance(), handle);
            let (major, minor) = get_version(physical_device.get_properties().api_version);
            if (major, minor) < self.min_vulkan_version {
                continue;
            }

            let available: HashSet<CString> = unsafe {
                instance
                    .get_instance()
                    .enumerate_device_extension_properties(handle)?
            }
            .into_iter()
            .map(|ext| wrap_c_str(ext.extension_name.as_ptr()))
            .collect();
            if !self
                .required_extensions
                .iter()
                .all(|ext| available.contains(ext))
            {
                continue;
            }

            let Some(graphics_family) =
                Self::graphics_family_with_present(&physical_device, surface)?
            else {
                continue;
            };

            let dedicated = physical_device.get_properties().device_type
                == vk::PhysicalDeviceType::DISCRETE_GPU;
            let selected = SelectedDevice {
                physical_device,
                graphics_family,
                extensions: self.required_extensions.iter().cloned().collect(),
            };
            if dedicated {
                return Ok(selected);
            }
            fallback.get_or_insert(selected);
        }

        fallback.ok_or_else(|| IgnisError::NoPhysicalDevice.into())
    }
}
