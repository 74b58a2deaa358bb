use std::ptr;

use anyhow::Result;
use ash::vk;

use crate::traits::Destructible;

#[derive(Debug, Clone)]
pub struct Sampler {
    handle: vk::Sampler,
    device: crate::device::LogicalDevice,
}

impl Sampler {
    pub fn new(device: crate::device::LogicalDevice, filter: vk::Filter) -> Result<Self> {
        let mut sampler_ci = vk::SamplerCreateInfo::default();
        sampler_ci.s_type = vk::StructureType::SAMPLER_CREATE_INFO;
        sampler_ci.p_next = ptr::null();
        sampler_ci.mag_filter = filter;
        sampler_ci.min_filter = filter;
        let handle = unsafe { device.get_handle().create_sampler(&sampler_ci, None)? };

        #[cfg(feature = "log-lifetimes")]
        tracing::trace!("Creating VkSampler {:p}", handle);

        Ok(Self { handle, device })
    }

    pub fn get_handle(&self) -> &vk::Sampler {
        &self.handle
    }

    pub fn handle(&self) -> vk::Sampler {
        self.handle
    }
}

impl Destructible for Sampler {
    fn destroy(&mut self) {
        #[cfg(feature = "log-lifetimes")]
        tracing::trace!("Destroying VkSampler {:p}", self.handle);

        unsafe {
            self.device.get_handle().destroy_sampler(self.handle, None);
        }
    }
}
