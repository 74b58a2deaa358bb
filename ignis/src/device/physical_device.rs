use ash::vk;

/// Represents a physical device along with the properties queried at selection time
#[derive(Debug, Clone)]
pub struct PhysicalDevice {
    handle: vk::PhysicalDevice,
    properties: vk::PhysicalDeviceProperties,
    queue_families: Vec<vk::QueueFamilyProperties>,
}

impl PhysicalDevice {
    pub fn new(instance: &ash::Instance, handle: vk::PhysicalDevice) -> Self {
        let properties = unsafe { instance.get_physical_device_properties(handle) };
        let queue_families =
            unsafe { instance.get_physical_device_queue_family_properties(handle) };
        Self {
            handle,
            properties,
            queue_families,
        }
    }

    pub fn get_handle(&self) -> &vk::PhysicalDevice {
        &self.handle
    }

    pub fn handle(&self) -> vk::PhysicalDevice {
        self.handle
    }

    pub fn get_properties(&self) -> &vk::PhysicalDeviceProperties {
        &self.properties
    }

    pub fn get_queue_families(&self) -> &[vk::QueueFamilyProperties] {
        self.queue_families.as_slice()
    }

    pub fn name(&self) -> String {
        crate::util::wrap_c_str(self.properties.device_name.as_ptr())
            .to_string_lossy()
            .to_string()
    }
}
