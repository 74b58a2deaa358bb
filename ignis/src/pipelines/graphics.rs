use std::ffi::c_char;
use std::ptr;

use anyhow::Result;
use ash::vk;

use crate::pipelines::Pipeline;

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
enum BlendMode {
    #[default]
    Disabled,
    Additive,
    AlphaBlend,
}

/// Builds a graphics pipeline targeting dynamic rendering; no render pass objects are
/// involved. Viewport and scissor are left dynamic.
#[derive(Debug)]
pub struct GraphicsPipelineBuilder {
    vertex_shader: Option<vk::ShaderModule>,
    fragment_shader: Option<vk::ShaderModule>,
    topology: vk::PrimitiveTopology,
    polygon_mode: vk::PolygonMode,
    cull_mode: vk::CullModeFlags,
    front_face: vk::FrontFace,
    blend_mode: BlendMode,
    color_attachment_format: vk::Format,
    depth_format: vk::Format,
    depth_test_enable: bool,
    depth_write_enable: bool,
    depth_compare_op: vk::CompareOp,
    layout: Option<vk::PipelineLayout>,
}

impl Default for GraphicsPipelineBuilder {
    fn default() -> Self {
        Self {
            vertex_shader: None,
            fragment_shader: None,
            topology: vk::PrimitiveTopology::TRIANGLE_LIST,
            polygon_mode: vk::PolygonMode::FILL,
            cull_mode: vk::CullModeFlags::NONE,
            front_face: vk::FrontFace::CLOCKWISE,
            blend_mode: BlendMode::Disabled,
            color_attachment_format: vk::Format::UNDEFINED,
            depth_format: vk::Format::UNDEFINED,
            depth_test_enable: false,
            depth_write_enable: false,
            depth_compare_op: vk::CompareOp::NEVER,
            layout: None,
        }
    }
}

impl GraphicsPipelineBuilder {
    /// Shader modules stay owned by the caller and can be destroyed once the pipeline is
    /// built
    pub fn set_shaders(
        mut self,
        vertex_shader: &crate::shader::Shader,
        fragment_shader: &crate::shader::Shader,
    ) -> Self {
        self.vertex_shader = Some(vertex_shader.handle());
        self.fragment_shader = Some(fragment_shader.handle());
        self
    }

    pub fn set_input_topology(mut self, topology: vk::PrimitiveTopology) -> Self {
        self.topology = topology;
        self
    }

    pub fn set_polygon_mode(mut self, polygon_mode: vk::PolygonMode) -> Self {
        self.polygon_mode = polygon_mode;
        self
    }

    pub fn set_cull_mode(mut self, cull_mode: vk::CullModeFlags, front_face: vk::FrontFace) -> Self {
        self.cull_mode = cull_mode;
        self.front_face = front_face;
        self
    }

    pub fn disable_blending(mut self) -> Self {
        self.blend_mode = BlendMode::Disabled;
        self
    }

    pub fn enable_blending_additive(mut self) -> Self {
        self.blend_mode = BlendMode::Additive;
        self
    }

    pub fn enable_blending_alphablend(mut self) -> Self {
        self.blend_mode = BlendMode::AlphaBlend;
        self
    }

    pub fn set_color_attachment_format(mut self, format: vk::Format) -> Self {
        self.color_attachment_format = format;
        self
    }

    pub fn set_depth_format(mut self, format: vk::Format) -> Self {
        self.depth_format = format;
        self
    }

    pub fn disable_depthtest(mut self) -> Self {
        self.depth_test_enable = false;
        self.depth_write_enable = false;
        self.depth_compare_op = vk::CompareOp::NEVER;
        self
    }

    pub fn enable_depthtest(mut self, depth_write_enable: bool, op: vk::CompareOp) -> Self {
        self.depth_test_enable = true;
        self.depth_write_enable = depth_write_enable;
        self.depth_compare_op = op;
        self
    }

    /// The layout is only borrowed by handle; releasing it stays with the caller
    pub fn replace_layout(mut self, layout: vk::PipelineLayout) -> Self {
        self.layout = Some(layout);
        self
    }

    pub fn build(self, device: crate::device::LogicalDevice) -> Result<Pipeline> {
        let vertex_shader = self
            .vertex_shader
            .ok_or_else(|| anyhow::anyhow!("graphics pipeline needs a vertex shader"))?;
        let fragment_shader = self
            .fragment_shader
            .ok_or_else(|| anyhow::anyhow!("graphics pipeline needs a fragment shader"))?;
        let layout = self
            .layout
            .ok_or_else(|| anyhow::anyhow!("graphics pipeline needs a layout"))?;

        let shader_stages = [
            vk::PipelineShaderStageCreateInfo {
                s_type: vk::StructureType::PIPELINE_SHADER_STAGE_CREATE_INFO,
                p_next: ptr::null(),
                flags: vk::PipelineShaderStageCreateFlags::empty(),
                stage: vk::ShaderStageFlags::VERTEX,
                module: vertex_shader,
                p_name: "main\0".as_ptr() as *const c_char,
                p_specialization_info: ptr::null(),
                _marker: Default::default(),
            },
            vk::PipelineShaderStageCreateInfo {
                s_type: vk::StructureType::PIPELINE_SHADER_STAGE_CREATE_INFO,
                p_next: ptr::null(),
                flags: vk::PipelineShaderStageCreateFlags::empty(),
                stage: vk::ShaderStageFlags::FRAGMENT,
                module: fragment_shader,
                p_name: "main\0".as_ptr() as *const c_char,
                p_specialization_info: ptr::null(),
                _marker: Default::default(),
            },
        ];

        // vertex pulling through buffer device addresses, no vertex input state needed
        let vertex_input = vk::PipelineVertexInputStateCreateInfo {
            s_type: vk::StructureType::PIPELINE_VERTEX_INPUT_STATE_CREATE_INFO,
            p_next: ptr::null(),
            ..Default::default()
        };
        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo {
            s_type: vk::StructureType::PIPELINE_INPUT_ASSEMBLY_STATE_CREATE_INFO,
            p_next: ptr::null(),
            flags: vk::PipelineInputAssemblyStateCreateFlags::empty(),
            topology: self.topology,
            primitive_restart_enable: vk::FALSE,
            _marker: Default::default(),
        };
        let viewport_state = vk::PipelineViewportStateCreateInfo {
            s_type: vk::StructureType::PIPELINE_VIEWPORT_STATE_CREATE_INFO,
            p_next: ptr::null(),
            flags: vk::PipelineViewportStateCreateFlags::empty(),
            viewport_count: 1,
            p_viewports: ptr::null(),
            scissor_count: 1,
            p_scissors: ptr::null(),
            _marker: Default::default(),
        };
        let rasterizer = vk::PipelineRasterizationStateCreateInfo {
            s_type: vk::StructureType::PIPELINE_RASTERIZATION_STATE_CREATE_INFO,
            p_next: ptr::null(),
            polygon_mode: self.polygon_mode,
            cull_mode: self.cull_mode,
            front_face: self.front_face,
            line_width: 1.0,
            ..Default::default()
        };
        let multisampling = vk::PipelineMultisampleStateCreateInfo {
            s_type: vk::StructureType::PIPELINE_MULTISAMPLE_STATE_CREATE_INFO,
            p_next: ptr::null(),
            rasterization_samples: vk::SampleCountFlags::TYPE_1,
            sample_shading_enable: vk::FALSE,
            min_sample_shading: 1.0,
            ..Default::default()
        };
        let color_blend_attachment = match self.blend_mode {
            BlendMode::Disabled => vk::PipelineColorBlendAttachmentState {
                blend_enable: vk::FALSE,
                color_write_mask: vk::ColorComponentFlags::RGBA,
                ..Default::default()
            },
            BlendMode::Additive => vk::PipelineColorBlendAttachmentState {
                blend_enable: vk::TRUE,
                src_color_blend_factor: vk::BlendFactor::SRC_ALPHA,
                dst_color_blend_factor: vk::BlendFactor::ONE,
                color_blend_op: vk::BlendOp::ADD,
                src_alpha_blend_factor: vk::BlendFactor::ONE,
                dst_alpha_blend_factor: vk::BlendFactor::ZERO,
                alpha_blend_op: vk::BlendOp::ADD,
                color_write_mask: vk::ColorComponentFlags::RGBA,
            },
            BlendMode::AlphaBlend => vk::PipelineColorBlendAttachmentState {
                blend_enable: vk::TRUE,
                src_color_blend_factor: vk::BlendFactor::SRC_ALPHA,
                dst_color_blend_factor: vk::BlendFactor::ONE_MINUS_SRC_ALPHA,
                color_blend_op: vk::BlendOp::ADD,
                src_alpha_blend_factor: vk::BlendFactor::ONE,
                dst_alpha_blend_factor: vk::BlendFactor::ZERO,
                alpha_blend_op: vk::BlendOp::ADD,
                color_write_mask: vk::ColorComponentFlags::RGBA,
            },
        };
        let color_blending = vk::PipelineColorBlendStateCreateInfo {
            s_type: vk::StructureType::PIPELINE_COLOR_BLEND_STATE_CREATE_INFO,
            p_next: ptr::null(),
            logic_op_enable: vk::FALSE,
            logic_op: vk::LogicOp::COPY,
            attachment_count: 1,
            p_attachments: &color_blend_attachment,
            ..Default::default()
        };
        let depth_stencil = vk::PipelineDepthStencilStateCreateInfo {
            s_type: vk::StructureType::PIPELINE_DEPTH_STENCIL_STATE_CREATE_INFO,
            p_next: ptr::null(),
            depth_test_enable: if self.depth_test_enable {
                vk::TRUE
            } else {
                vk::FALSE
            },
            depth_write_enable: if self.depth_write_enable {
                vk::TRUE
            } else {
                vk::FALSE
            },
            depth_compare_op: self.depth_compare_op,
            depth_bounds_test_enable: vk::FALSE,
            stencil_test_enable: vk::FALSE,
            min_depth_bounds: 0.0,
            max_depth_bounds: 1.0,
            ..Default::default()
        };
        let render_info = vk::PipelineRenderingCreateInfo {
            s_type: vk::StructureType::PIPELINE_RENDERING_CREATE_INFO,
            p_next: ptr::null(),
            view_mask: 0,
            color_attachment_count: 1,
            p_color_attachment_formats: &self.color_attachment_format,
            depth_attachment_format: self.depth_format,
            stencil_attachment_format: vk::Format::UNDEFINED,
            _marker: Default::default(),
        };
        let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic_state = vk::PipelineDynamicStateCreateInfo {
            s_type: vk::StructureType::PIPELINE_DYNAMIC_STATE_CREATE_INFO,
            p_next: ptr::null(),
            flags: vk::PipelineDynamicStateCreateFlags::empty(),
            dynamic_state_count: dynamic_states.len() as u32,
            p_dynamic_states: dynamic_states.as_ptr(),
            _marker: Default::default(),
        };

        let pipeline_ci = vk::GraphicsPipelineCreateInfo {
            s_type: vk::StructureType::GRAPHICS_PIPELINE_CREATE_INFO,
            p_next: &render_info as *const _ as *const std::ffi::c_void,
            flags: vk::PipelineCreateFlags::empty(),
            stage_count: shader_stages.len() as u32,
            p_stages: shader_stages.as_ptr(),
            p_vertex_input_state: &vertex_input,
            p_input_assembly_state: &input_assembly,
            p_tessellation_state: ptr::null(),
            p_viewport_state: &viewport_state,
            p_rasterization_state: &rasterizer,
            p_multisample_state: &multisampling,
            p_depth_stencil_state: &depth_stencil,
            p_color_blend_state: &color_blending,
            p_dynamic_state: &dynamic_state,
            layout,
            render_pass: vk::RenderPass::null(),
            subpass: 0,
            base_pipeline_handle: vk::Pipeline::null(),
            base_pipeline_index: -1,
            _marker: Default::default(),
        };
        let handle = unsafe {
            device
                .get_handle()
                .create_graphics_pipelines(vk::PipelineCache::null(), &[pipeline_ci], None)
                .map_err(|e| anyhow::Error::from(e.1))?
                .pop()
                .ok_or(crate::IgnisError::VkError(
                    vk::Result::ERROR_INITIALIZATION_FAILED,
                ))?
        };

        #[cfg(feature = "log-lifetimes")]
        tracing::trace!("Creating graphics VkPipeline {:p}", handle);

        Ok(Pipeline::from_parts(handle, layout, device))
    }
}
