use std::sync::Arc;

use anyhow::Result;
use ash;
use ash::vk;
use derivative::Derivative;

use crate::traits::Destructible;

#[derive(Derivative)]
#[derivative(Debug)]
struct LogicalDeviceInner {
    #[derivative(Debug = "ignore")]
    handle: ash::Device,
    /// Queue families in use on this device
    queue_families: Vec<u32>,
    /// Debug utils
    #[derivative(Debug = "ignore")]
    debug_utils: Option<ash::ext::debug_utils::Device>,
}

impl PartialEq for LogicalDeviceInner {
    fn eq(&self, other: &Self) -> bool {
        self.handle.handle() == other.handle.handle()
    }
}

impl Eq for LogicalDeviceInner {}

/// Effectively the same as [`ash::Device`], reference counted so every wrapper can hold
/// a cheap clone. Destruction stays explicit through [`Destructible`].
#[derive(Derivative, Clone, PartialEq, Eq)]
#[derivative(Debug)]
pub struct LogicalDevice {
    #[derivative(Debug = "ignore")]
    inner: Arc<LogicalDeviceInner>,
}

pub struct LogicalDeviceCreateInfo<'a> {
    pub instance: &'a ash::Instance,
    pub physical_device: vk::PhysicalDevice,
    pub device_ci: vk::DeviceCreateInfo<'a>,
    pub queue_families: Vec<u32>,
    pub debug_utils: bool,
}

impl LogicalDevice {
    pub fn new(create_info: LogicalDeviceCreateInfo) -> Result<Self> {
        let device = unsafe {
            create_info.instance.create_device(
                create_info.physical_device,
                &create_info.device_ci,
                None,
            )?
        };

        #[cfg(feature = "log-lifetimes")]
        tracing::trace!("Creating VkDevice {:p}", device.handle());

        let debug_utils: Option<ash::ext::debug_utils::Device> = if create_info.debug_utils {
            Some(ash::ext::debug_utils::Device::new(
                create_info.instance,
                &device,
            ))
        } else {
            None
        };

        Ok(Self {
            inner: Arc::new(LogicalDeviceInner {
                handle: device,
                queue_families: create_info.queue_families,
                debug_utils,
            }),
        })
    }

    /// Get reference to the underlying [`ash::Device`]
    pub fn get_handle(&self) -> &ash::Device {
        &self.inner.handle
    }

    pub fn get_used_queue_families(&self) -> &[u32] {
        self.inner.queue_families.as_slice()
    }

    /// Get debug utils with the device
    pub fn get_debug_utils(&self) -> Option<&ash::ext::debug_utils::Device> {
        self.inner.debug_utils.as_ref()
    }

    /// Block until every queue on the device has drained
    pub fn wait_idle(&self) -> Result<()> {
        unsafe { self.inner.handle.device_wait_idle()? }
        Ok(())
    }
}

impl Destructible for LogicalDevice {
    /// **Safety:** meant to only be called once, after all device-owned resources are gone.
    fn destroy(&mut self) {
        #[cfg(feature = "log-lifetimes")]
        tracing::trace!("Destroying VkDevice {:p}", self.inner.handle.handle());

        let device = self.get_handle().clone();
        unsafe {
            device.destroy_device(None);
        }
    }
}
