use std::path::Path;

use anyhow::Result;
use ash::vk;
use glam::Vec4;
use ignis::pipelines::{ComputePipelineBuilder, Pipeline};
use ignis::traits::Destructible;

/// Push constant payload shared by every background effect
#[derive(Debug, Copy, Clone)]
#[repr(C, align(16))]
pub struct ComputePushConstants {
    pub data1: Vec4,
    pub data2: Vec4,
    pub data3: Vec4,
    pub data4: Vec4,
}

impl Default for ComputePushConstants {
    fn default() -> Self {
        Self {
            data1: Vec4::ZERO,
            data2: Vec4::ZERO,
            data3: Vec4::ZERO,
            data4: Vec4::ZERO,
        }
    }
}

/// A selectable compute pass that fills the offscreen color target. The payload is
/// operator-mutable between frames and read fresh on every dispatch.
pub struct ComputeEffect {
    pub name: &'static str,
    pub pipeline: Pipeline,
    pub data: ComputePushConstants,
}

/// Builds the built-in background effects against the shared gradient pipeline layout
pub fn build_background_effects(
    device: ignis::device::LogicalDevice,
    layout: vk::PipelineLayout,
    shader_dir: &Path,
) -> Result<Vec<ComputeEffect>> {
    let mut gradient_shader =
        ignis::shader::Shader::from_file(device.clone(), shader_dir.join("gradient_color.comp.spv"))?;
    let mut sky_shader =
        ignis::shader::Shader::from_file(device.clone(), shader_dir.join("sky.comp.spv"))?;

    let gradient = ComputeEffect {
        name: "gradient",
        pipeline: ComputePipelineBuilder::default()
            .replace_layout(layout)
            .replace_shader(&gradient_shader)
            .build(device.clone())?,
        data: ComputePushConstants {
            data1: Vec4::new(1.0, 0.0, 0.0, 1.0),
            data2: Vec4::new(0.0, 0.0, 1.0, 1.0),
            ..Default::default()
        },
    };
    let sky = ComputeEffect {
        name: "sky",
        pipeline: ComputePipelineBuilder::default()
            .replace_layout(layout)
            .replace_shader(&sky_shader)
            .build(device)?,
        data: ComputePushConstants {
            data1: Vec4::new(0.1, 0.2, 0.4, 0.97),
            ..Default::default()
        },
    };

    // modules are only needed for pipeline creation
    gradient_shader.destroy();
    sky_shader.destroy();

    Ok(vec![gradient, sky])
}
