use std::path::Path;

use anyhow::Result;
use ash::vk;
use ignis::allocators::GpuAllocator;
use ignis::descriptor::{
    DescriptorAllocator, DescriptorSetLayout, DescriptorSetLayoutBuilder, DescriptorWriter,
    PoolSizeRatio,
};
use ignis::pipelines::{GraphicsPipelineBuilder, Pipeline, PipelineLayout, PipelineLayoutBuilder};
use ignis::raw_window_handle::HasDisplayHandle;
use ignis::traits::Destructible;
use ignis::util::{DeletionQueue, ImmediateSubmit, ReleaseTicket};
use tracing::{info, warn};

use crate::draw::GpuDrawPushConstants;
use crate::effects::{build_background_effects, ComputeEffect, ComputePushConstants};
use crate::frame::FrameRing;
use crate::mesh::{load_gltf_meshes, MeshAsset};
use crate::overlay::{NullOverlay, OverlayControls, OverlayRenderer};
use crate::swapchain::SwapchainContext;
use crate::textures::DefaultTextures;

pub const DEFAULT_WINDOW_EXTENT: vk::Extent2D = vk::Extent2D {
    width: 1700,
    height: 900,
};

const GLOBAL_DESCRIPTOR_SETS: u32 = 10;
const SHADER_DIR: &str = "shaders";
const MESH_ASSET_PATH: &str = "assets/basicmesh.glb";

/// The engine context. One instance owns every GPU-facing subsystem; there is no ambient
/// global state. Field groups are ordered so the shutdown path reads top to bottom as the
/// reverse of creation.
pub struct Engine {
    pub stop_rendering: bool,
    pub controls: OverlayControls,
    pub overlay: Box<dyn OverlayRenderer>,

    pub meshes: Vec<MeshAsset>,
    pub(crate) default_textures: DefaultTextures,
    pub(crate) texture_descriptor_set: vk::DescriptorSet,
    pub(crate) mesh_pipeline: Pipeline,
    pub(crate) mesh_pipeline_layout: PipelineLayout,
    pub(crate) background_effects: Vec<ComputeEffect>,
    pub(crate) gradient_pipeline_layout: PipelineLayout,

    pub(crate) draw_image_descriptor_set: vk::DescriptorSet,
    pub(crate) draw_image_descriptor_layout: DescriptorSetLayout,
    pub(crate) scene_data_descriptor_layout: DescriptorSetLayout,
    pub(crate) single_image_descriptor_layout: DescriptorSetLayout,
    pub(crate) global_descriptor_allocator: DescriptorAllocator,

    pub(crate) global_deletion_queue: DeletionQueue<ReleaseTicket>,
    pub frames: FrameRing,
    pub swapchain: SwapchainContext,
    pub(crate) immediate: ImmediateSubmit,
    pub(crate) allocator: GpuAllocator,
    pub(crate) queue: ignis::device::Queue,
    pub device: ignis::device::LogicalDevice,
    pub(crate) physical_device: ignis::device::PhysicalDevice,
    pub(crate) debug_messenger: Option<ignis::device::DebugMessenger>,
    pub(crate) instance: ignis::core::Instance,
}

impl Engine {
    pub fn new(window: &winit::window::Window) -> Result<Self> {
        let window_size = window.inner_size();
        let window_extent = vk::Extent2D {
            width: window_size.width,
            height: window_size.height,
        };

        let validation = cfg!(debug_assertions);
        let mut instance_builder = ignis::bootstrap::InstanceBuilder::new()
            .set_app_name("cinder")?
            .set_vulkan_version((1, 3, 0))
            .set_validation(validation);
        for extension in
            ignis::ash_window::enumerate_required_extensions(window.display_handle()?.as_raw())?
        {
            instance_builder = instance_builder.add_extension(*extension);
        }
        let instance = instance_builder.build()?;
        let debug_messenger = if validation {
            Some(ignis::device::DebugMessenger::new(
                instance.get_entry(),
                instance.get_instance(),
            )?)
        } else {
            None
        };

        let mut surface =
            ignis::wsi::Surface::new(instance.get_entry(), instance.get_instance(), window)?;
        let selected = ignis::bootstrap::PhysicalDeviceSelector::default()
            .set_minimum_vulkan_version((1, 3))
            .add_required_extension(ash::khr::swapchain::NAME.as_ptr())
            .select(&instance, &surface)?;
        info!("GPU used: {}", selected.physical_device.name());
        surface.query_details(selected.physical_device.handle())?;
        let physical_device = selected.physical_device.clone();

        let (device, queue) = ignis::bootstrap::LogicalDeviceBuilder::new(selected)
            .attach_feature_1_3(vk::PhysicalDeviceVulkan13Features {
                dynamic_rendering: vk::TRUE,
                synchronization2: vk::TRUE,
                ..Default::default()
            })
            .attach_feature_1_2(vk::PhysicalDeviceVulkan12Features {
                buffer_device_address: vk::TRUE,
                descriptor_indexing: vk::TRUE,
                ..Default::default()
            })
            .debug_utils(validation)
            .build(&instance)?;

        let allocator =
            GpuAllocator::new(instance.get_instance(), device.clone(), physical_device.handle())?;
        let immediate = ImmediateSubmit::new(device.clone(), queue.clone())?;
        let frames = FrameRing::new(device.clone(), &queue)?;
        let swapchain = SwapchainContext::new(
            &instance,
            surface,
            device.clone(),
            &queue,
            &allocator,
            window_extent,
        )?;

        // descriptor infrastructure
        let global_descriptor_allocator = DescriptorAllocator::new(
            device.clone(),
            GLOBAL_DESCRIPTOR_SETS,
            &[
                PoolSizeRatio::default()
                    .descriptor_type(vk::DescriptorType::STORAGE_IMAGE)
                    .ratio(1.0),
                PoolSizeRatio::default()
                    .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                    .ratio(1.0),
                PoolSizeRatio::default()
                    .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                    .ratio(1.0),
            ],
        )?;
        let draw_image_descriptor_layout = DescriptorSetLayoutBuilder::default()
            .add_binding(0, vk::DescriptorType::STORAGE_IMAGE)
            .build(
                device.clone(),
                vk::ShaderStageFlags::COMPUTE,
                vk::DescriptorSetLayoutCreateFlags::empty(),
            )?;
        let scene_data_descriptor_layout = DescriptorSetLayoutBuilder::default()
            .add_binding(0, vk::DescriptorType::UNIFORM_BUFFER)
            .build(
                device.clone(),
                vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT,
                vk::DescriptorSetLayoutCreateFlags::empty(),
            )?;
        let single_image_descriptor_layout = DescriptorSetLayoutBuilder::default()
            .add_binding(0, vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
            .build(
                device.clone(),
                vk::ShaderStageFlags::FRAGMENT,
                vk::DescriptorSetLayoutCreateFlags::empty(),
            )?;

        // the offscreen color target is bound once; it survives swapchain resizes
        let draw_image_descriptor_set =
            global_descriptor_allocator.allocate(draw_image_descriptor_layout.handle())?;
        let mut writer = DescriptorWriter::default();
        writer.write_image(
            0,
            swapchain.targets.draw_image_view.handle(),
            vk::Sampler::null(),
            vk::ImageLayout::GENERAL,
            vk::DescriptorType::STORAGE_IMAGE,
        );
        writer.update_set(&device, draw_image_descriptor_set);

        // background compute effects
        let gradient_pipeline_layout = PipelineLayoutBuilder::default()
            .push_descriptor_sets(vec![draw_image_descriptor_layout.handle()])
            .push_push_constant_struct::<ComputePushConstants>(vk::ShaderStageFlags::COMPUTE)
            .build(device.clone(), vk::PipelineLayoutCreateFlags::empty())?;
        let background_effects = build_background_effects(
            device.clone(),
            gradient_pipeline_layout.handle(),
            Path::new(SHADER_DIR),
        )?;

        // geometry pipeline
        let mesh_pipeline_layout = PipelineLayoutBuilder::default()
            .push_descriptor_sets(vec![
                scene_data_descriptor_layout.handle(),
                single_image_descriptor_layout.handle(),
            ])
            .push_push_constant_struct::<GpuDrawPushConstants>(vk::ShaderStageFlags::VERTEX)
            .build(device.clone(), vk::PipelineLayoutCreateFlags::empty())?;
        let mut mesh_vertex_shader = ignis::shader::Shader::from_file(
            device.clone(),
            Path::new(SHADER_DIR).join("mesh.vert.spv"),
        )?;
        let mut mesh_fragment_shader = ignis::shader::Shader::from_file(
            device.clone(),
            Path::new(SHADER_DIR).join("mesh.frag.spv"),
        )?;
        let mesh_pipeline = GraphicsPipelineBuilder::default()
            .set_shaders(&mesh_vertex_shader, &mesh_fragment_shader)
            .set_input_topology(vk::PrimitiveTopology::TRIANGLE_LIST)
            .set_polygon_mode(vk::PolygonMode::FILL)
            .set_cull_mode(vk::CullModeFlags::NONE, vk::FrontFace::CLOCKWISE)
            .disable_blending()
            .enable_depthtest(true, vk::CompareOp::GREATER_OR_EQUAL)
            .set_color_attachment_format(swapchain.targets.draw_image.format())
            .set_depth_format(swapchain.targets.depth_image.format())
            .replace_layout(mesh_pipeline_layout.handle())
            .build(device.clone())?;
        mesh_vertex_shader.destroy();
        mesh_fragment_shader.destroy();

        // default material inputs
        let default_textures = DefaultTextures::new(&allocator, &immediate)?;
        let texture_descriptor_set =
            global_descriptor_allocator.allocate(single_image_descriptor_layout.handle())?;
        writer.clear();
        writer.write_image(
            0,
            default_textures.error_checkerboard_image_view.handle(),
            default_textures.sampler_nearest.handle(),
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
        );
        writer.update_set(&device, texture_descriptor_set);

        let effect_names: Vec<&str> = background_effects
            .iter()
            .map(|effect| effect.name)
            .collect();
        info!("background effects: {}", effect_names.join(", "));

        let meshes = match load_gltf_meshes(&allocator, &immediate, MESH_ASSET_PATH) {
            Ok(meshes) => meshes,
            Err(err) => {
                warn!("starting with an empty scene: {err:#}");
                Vec::new()
            }
        };
        for mesh in meshes.iter() {
            info!("loaded mesh '{}' with {} surfaces", mesh.name, mesh.surfaces.len());
        }

        Ok(Self {
            stop_rendering: false,
            controls: OverlayControls::default(),
            overlay: Box::new(NullOverlay),
            meshes,
            default_textures,
            texture_descriptor_set,
            mesh_pipeline,
            mesh_pipeline_layout,
            background_effects,
            gradient_pipeline_layout,
            draw_image_descriptor_set,
            draw_image_descriptor_layout,
            scene_data_descriptor_layout,
            single_image_descriptor_layout,
            global_descriptor_allocator,
            global_deletion_queue: DeletionQueue::new(),
            frames,
            swapchain,
            immediate,
            allocator,
            queue,
            device,
            physical_device,
            debug_messenger,
            instance,
        })
    }

    /// Rebuilds the presentable chain at the window's current size
    pub fn resize_swapchain(&mut self, new_extent: vk::Extent2D) -> Result<()> {
        self.swapchain.resize(
            &self.instance,
            self.device.clone(),
            &self.queue,
            self.physical_device.handle(),
            new_extent,
        )
    }

    /// Full teardown in reverse-dependency order, after a GPU idle wait. Engine-wide
    /// resources drain through the process-lifetime deletion queue.
    pub fn shutdown(mut self) -> Result<()> {
        info!("shutting down");
        self.device.wait_idle()?;

        self.frames.destroy();
        self.swapchain.destroy();

        // defer engine-wide resources in creation order; the flush releases them LIFO
        let mut queue = self.global_deletion_queue;
        queue.push(ReleaseTicket::DescriptorSetLayout(
            self.draw_image_descriptor_layout,
        ));
        queue.push(ReleaseTicket::DescriptorSetLayout(
            self.scene_data_descriptor_layout,
        ));
        queue.push(ReleaseTicket::DescriptorSetLayout(
            self.single_image_descriptor_layout,
        ));
        queue.push(ReleaseTicket::DescriptorPool(
            self.global_descriptor_allocator.into_pool(),
        ));
        queue.push(ReleaseTicket::PipelineLayout(self.gradient_pipeline_layout));
        for effect in self.background_effects {
            queue.push(ReleaseTicket::Pipeline(effect.pipeline));
        }
        queue.push(ReleaseTicket::PipelineLayout(self.mesh_pipeline_layout));
        queue.push(ReleaseTicket::Pipeline(self.mesh_pipeline));
        self.default_textures.queue_release(&mut queue);
        for asset in self.meshes {
            queue.push(ReleaseTicket::Buffer(asset.buffers.vertex_buffer));
            queue.push(ReleaseTicket::Buffer(asset.buffers.index_buffer));
        }
        queue.flush_resources();

        self.immediate.destroy();
        // frees the remaining heaps and reports leaks while the device is still alive
        drop(self.allocator);
        self.device.destroy();
        if let Some(mut messenger) = self.debug_messenger {
            messenger.destroy();
        }
        self.instance.destroy();
        info!("shutdown complete");
        Ok(())
    }
}
