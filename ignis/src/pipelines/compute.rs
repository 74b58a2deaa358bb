use std::ffi::c_char;
use std::ptr;

use anyhow::Result;
use ash::vk;

use crate::pipelines::Pipeline;

/// Builds a compute pipeline from a single shader and a layout
#[derive(Default, Debug)]
pub struct ComputePipelineBuilder {
    compute_shader: Option<vk::ShaderModule>,
    layout: Option<vk::PipelineLayout>,
}

impl ComputePipelineBuilder {
    /// The layout is only borrowed by handle; releasing it stays with the caller
    pub fn replace_layout(mut self, layout: vk::PipelineLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    /// Any previously set shader is replaced. The shader module stays owned by the caller
    /// and can be destroyed once the pipeline is built.
    pub fn replace_shader(mut self, compute_shader: &crate::shader::Shader) -> Self {
        self.compute_shader = Some(compute_shader.handle());
        self
    }

    pub fn build(self, device: crate::device::LogicalDevice) -> Result<Pipeline> {
        let shader = self
            .compute_shader
            .ok_or_else(|| anyhow::anyhow!("compute pipeline needs a shader"))?;
        let layout = self
            .layout
            .ok_or_else(|| anyhow::anyhow!("compute pipeline needs a layout"))?;
        let pipeline_ci = vk::ComputePipelineCreateInfo {
            s_type: vk::StructureType::COMPUTE_PIPELINE_CREATE_INFO,
            p_next: ptr::null(),
            flags: vk::PipelineCreateFlags::empty(),
            stage: vk::PipelineShaderStageCreateInfo {
                s_type: vk::StructureType::PIPELINE_SHADER_STAGE_CREATE_INFO,
                p_next: ptr::null(),
                flags: vk::PipelineShaderStageCreateFlags::empty(),
                stage: vk::ShaderStageFlags::COMPUTE,
                module: shader,
                p_name: "main\0".as_ptr() as *const c_char,
                p_specialization_info: ptr::null(),
                _marker: Default::default(),
            },
            layout,
            base_pipeline_handle: vk::Pipeline::null(),
            base_pipeline_index: -1,
            _marker: Default::default(),
        };
        let handle = unsafe {
            device
                .get_handle()
                .create_compute_pipelines(vk::PipelineCache::null(), &[pipeline_ci], None)
                .map_err(|e| anyhow::Error::from(e.1))?
                .pop()
                .ok_or(crate::IgnisError::VkError(
                    vk::Result::ERROR_INITIALIZATION_FAILED,
                ))?
        };

        #[cfg(feature = "log-lifetimes")]
        tracing::trace!("Creating compute VkPipeline {:p}", handle);

        Ok(Pipeline::from_parts(handle, layout, device))
    }
}
