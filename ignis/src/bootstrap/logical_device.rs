use std::ffi::{c_char, c_void, CString};
use std::ptr;

use anyhow::Result;
use ash::vk;

/// Builds a logical device with one graphics queue, chaining the 1.2/1.3 feature structs
/// the engine negotiates at startup.
pub struct LogicalDeviceBuilder<'a> {
    physical_device: crate::device::PhysicalDevice,
    graphics_family: u32,
    features_1_0: vk::PhysicalDeviceFeatures,
    features_1_2: vk::PhysicalDeviceVulkan12Features<'a>,
    features_1_3: vk::PhysicalDeviceVulkan13Features<'a>,
    extensions: Vec<CString>,
    debug_utils: bool,
}

impl<'a> LogicalDeviceBuilder<'a> {
    pub fn new(selected: crate::bootstrap::SelectedDevice) -> Self {
        Self {
            physical_device: selected.physical_device,
            graphics_family: selected.graphics_family,
            features_1_0: Default::default(),
            features_1_2: Default::default(),
            features_1_3: Default::default(),
            extensions: selected.extensions,
            debug_utils: false,
        }
    }

    pub fn debug_utils(mut self, enabled: bool) -> Self {
        self.debug_utils = enabled;
        self
    }

    pub fn attach_feature_1_0(mut self, feature: vk::PhysicalDeviceFeatures) -> Self {
        self.features_1_0 = feature;
        self
    }

    pub fn attach_feature_1_2(mut self, feature: vk::PhysicalDeviceVulkan12Features<'a>) -> Self {
        self.features_1_2 = feature;
        self
    }

    pub fn attach_feature_1_3(mut self, feature: vk::PhysicalDeviceVulkan13Features<'a>) -> Self {
        self.features_1_3 = feature;
        self
    }

    /// Adds an extension to enable
    pub fn add_extension(mut self, extension: *const c_char) -> Self {
        self.extensions.push(crate::util::wrap_c_str(extension));
        self
    }

    pub fn build(
        mut self,
        instance: &crate::core::Instance,
    ) -> Result<(crate::device::LogicalDevice, crate::device::Queue)> {
        let queue_priority = 1.0f32;
        let queue_ci = vk::DeviceQueueCreateInfo {
            s_type: vk::StructureType::DEVICE_QUEUE_CREATE_INFO,
            p_next: ptr::null(),
            flags: vk::DeviceQueueCreateFlags::empty(),
            queue_family_index: self.graphics_family,
            queue_count: 1,
            p_queue_priorities: &queue_priority,
            _marker: Default::default(),
        };

        let ext_cptrs: Vec<*const c_char> =
            self.extensions.iter().map(|ext| ext.as_ptr()).collect();

        // Assemble the feature chain
        self.features_1_3.s_type = vk::StructureType::PHYSICAL_DEVICE_VULKAN_1_3_FEATURES;
        self.features_1_2.s_type = vk::StructureType::PHYSICAL_DEVICE_VULKAN_1_2_FEATURES;
        self.features_1_3.p_next = ptr::null_mut();
        self.features_1_2.p_next = &mut self.features_1_3 as *mut _ as *mut c_void;
        let features_2 = vk::PhysicalDeviceFeatures2 {
            s_type: vk::StructureType::PHYSICAL_DEVICE_FEATURES_2,
            p_next: &mut self.features_1_2 as *mut _ as *mut c_void,
            features: self.features_1_0,
            _marker: Default::default(),
        };

        let device_ci = vk::DeviceCreateInfo {
            s_type: vk::StructureType::DEVICE_CREATE_INFO,
            p_next: &features_2 as *const _ as *const c_void,
            flags: vk::DeviceCreateFlags::empty(),
            queue_create_info_count: 1,
            p_queue_create_infos: &queue_ci,
            enabled_layer_count: 0,
            pp_enabled_layer_names: ptr::null(),
            enabled_extension_count: ext_cptrs.len() as u32,
            pp_enabled_extension_names: ext_cptrs.as_ptr(),
            p_enabled_features: ptr::null(),
            _marker: Default::default(),
        };

        let device = crate::device::LogicalDevice::new(crate::device::logical_device::LogicalDeviceCreateInfo {
            instance: instance.get_instance(),
            physical_device: self.physical_device.handle(),
            device_ci,
            queue_families: vec![self.graphics_family],
            debug_utils: self.debug_utils,
        })?;

        let queue_handle =
            unsafe { device.get_handle().get_device_queue(self.graphics_family, 0) };
        let queue = unsafe {
            crate::device::Queue::new(queue_handle, self.graphics_family, 0, vk::QueueFlags::GRAPHICS)
        };

        Ok((device, queue))
    }
}
