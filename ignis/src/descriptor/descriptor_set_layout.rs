use std::ptr;

use anyhow::Result;
use ash::vk;

use crate::traits::Destructible;

#[derive(Debug, Clone)]
pub struct DescriptorSetLayout {
    handle: vk::DescriptorSetLayout,
    device: crate::device::LogicalDevice,
}

impl DescriptorSetLayout {
    pub fn get_handle(&self) -> &vk::DescriptorSetLayout {
        &self.handle
    }

    pub fn handle(&self) -> vk::DescriptorSetLayout {
        self.handle
    }
}

impl Destructible for DescriptorSetLayout {
    fn destroy(&mut self) {
        #[cfg(feature = "log-lifetimes")]
        tracing::trace!("Destroying VkDescriptorSetLayout {:p}", self.handle);

        unsafe {
            self.device
                .get_handle()
                .destroy_descriptor_set_layout(self.handle, None);
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct DescriptorSetLayoutBuilder<'a> {
    bindings: Vec<vk::DescriptorSetLayoutBinding<'a>>,
}

impl<'a> DescriptorSetLayoutBuilder<'a> {
    /// Adds a binding to be built
    pub fn add_binding(mut self, binding: u32, ty: vk::DescriptorType) -> Self {
        self.bindings.push(vk::DescriptorSetLayoutBinding {
            binding,
            descriptor_type: ty,
            descriptor_count: 1,
            stage_flags: vk::ShaderStageFlags::empty(),
            p_immutable_samplers: ptr::null(),
            _marker: Default::default(),
        });
        self
    }

    /// Builds the descriptor set layout with `shader_stages` applied to every binding
    pub fn build(
        mut self,
        device: crate::device::LogicalDevice,
        shader_stages: vk::ShaderStageFlags,
        flags: vk::DescriptorSetLayoutCreateFlags,
    ) -> Result<DescriptorSetLayout> {
        for binding in self.bindings.iter_mut() {
            binding.stage_flags |= shader_stages;
        }
        let layout_ci = vk::DescriptorSetLayoutCreateInfo {
            s_type: vk::StructureType::DESCRIPTOR_SET_LAYOUT_CREATE_INFO,
            p_next: ptr::null(),
            flags,
            binding_count: self.bindings.len() as u32,
            p_bindings: self.bindings.as_ptr(),
            _marker: Default::default(),
        };
        let handle = unsafe {
            device
                .get_handle()
                .create_descriptor_set_layout(&layout_ci, None)?
        };

        #[cfg(feature = "log-lifetimes")]
        tracing::trace!("Creating VkDescriptorSetLayout {:p}", handle);

        Ok(DescriptorSetLayout { handle, device })
    }
}
