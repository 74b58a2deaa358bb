use std::ptr;

use anyhow::Result;
use ash::prelude::VkResult;
use ash::vk;

use crate::traits::Destructible;

/// Allocates descriptor sets
#[derive(Debug, Clone)]
pub struct DescriptorPool {
    handle: vk::DescriptorPool,
    device: crate::device::LogicalDevice,
}

/// If you want to allocate descriptors based on a ratio
#[derive(Copy, Clone, PartialOrd, PartialEq, Debug, Default)]
pub struct PoolSizeRatio {
    pub descriptor_type: vk::DescriptorType,
    pub ratio: f32,
}

impl PoolSizeRatio {
    pub fn descriptor_type(mut self, descriptor_type: vk::DescriptorType) -> Self {
        self.descriptor_type = descriptor_type;
        self
    }

    pub fn ratio(mut self, ratio: f32) -> Self {
        self.ratio = ratio;
        self
    }
}

/// All ratios are scaled by `count` to yield the per-pool descriptor counts
pub fn scaled_pool_sizes(ratios: &[PoolSizeRatio], count: u32) -> Vec<vk::DescriptorPoolSize> {
    ratios
        .iter()
        .map(|ratio| vk::DescriptorPoolSize {
            ty: ratio.descriptor_type,
            descriptor_count: (ratio.ratio * count as f32).round() as u32,
        })
        .collect()
}

impl DescriptorPool {
    pub fn new(
        device: crate::device::LogicalDevice,
        ratios: &[PoolSizeRatio],
        max_sets: u32,
        flags: vk::DescriptorPoolCreateFlags,
    ) -> Result<Self> {
        let sizes = scaled_pool_sizes(ratios, max_sets);
        let pool_ci = vk::DescriptorPoolCreateInfo {
            s_type: vk::StructureType::DESCRIPTOR_POOL_CREATE_INFO,
            p_next: ptr::null(),
            flags,
            max_sets,
            pool_size_count: sizes.len() as u32,
            p_pool_sizes: sizes.as_ptr(),
            _marker: Default::default(),
        };
        let handle = unsafe { device.get_handle().create_descriptor_pool(&pool_ci, None)? };

        #[cfg(feature = "log-lifetimes")]
        tracing::trace!("Creating VkDescriptorPool {:p}", handle);

        Ok(Self { handle, device })
    }

    pub fn get_handle(&self) -> &vk::DescriptorPool {
        &self.handle
    }

    pub fn handle(&self) -> vk::DescriptorPool {
        self.handle
    }

    /// Allocate a single set. The raw [`vk::Result`] is surfaced so callers can react to
    /// pool exhaustion.
    pub fn allocate(&self, layout: vk::DescriptorSetLayout) -> VkResult<vk::DescriptorSet> {
        let layouts = [layout];
        let alloc_info = vk::DescriptorSetAllocateInfo {
            s_type: vk::StructureType::DESCRIPTOR_SET_ALLOCATE_INFO,
            p_next: ptr::null(),
            descriptor_pool: self.handle,
            descriptor_set_count: 1,
            p_set_layouts: layouts.as_ptr(),
            _marker: Default::default(),
        };
        unsafe {
            self.device
                .get_handle()
                .allocate_descriptor_sets(&alloc_info)
                .map(|mut sets| sets.remove(0))
        }
    }

    /// Invalidates every set handed out by this pool while keeping the pool alive
    pub fn reset(&mut self) -> Result<()> {
        unsafe {
            self.device
                .get_handle()
                .reset_descriptor_pool(self.handle, vk::DescriptorPoolResetFlags::empty())?
        };
        Ok(())
    }
}

impl Destructible for DescriptorPool {
    fn destroy(&mut self) {
        #[cfg(feature = "log-lifetimes")]
        tracing::trace!("Destroying VkDescriptorPool {:p}", self.handle);

        unsafe {
            self.device
                .get_handle()
                .destroy_descriptor_pool(self.handle, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_sizes_scale_with_set_count() {
        let ratios = [
            PoolSizeRatio::default()
                .descriptor_type(vk::DescriptorType::STORAGE_IMAGE)
                .ratio(1.0),
            PoolSizeRatio::default()
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .ratio(3.0),
        ];
        let sizes = scaled_pool_sizes(&ratios, 10);
        assert_eq!(sizes.len(), 2);
        assert_eq!(sizes[0].descriptor_count, 10);
        assert_eq!(sizes[1].descriptor_count, 30);
    }

    #[test]
    fn fractional_ratios_round() {
        let ratios = [PoolSizeRatio::default()
            .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
            .ratio(0.5)];
        let sizes = scaled_pool_sizes(&ratios, 3);
        assert_eq!(sizes[0].descriptor_count, 2);
    }
}
