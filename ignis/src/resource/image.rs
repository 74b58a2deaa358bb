use std::ptr;

use anyhow::Result;
use ash::vk;

use crate::allocators::{Allocation, GpuAllocator, MemoryLocation};
use crate::command::CmdBuffer;
use crate::traits::Destructible;

/// A GPU image paired with its allocation and descriptive metadata.
///
/// Swapchain images are wrapped with [`ImageCreateInfo::FromVkNotManaged`]; they carry no
/// allocation and are released with the swapchain, not through [`Destructible`].
#[derive(Debug)]
pub struct Image {
    handle: vk::Image,
    format: vk::Format,
    extent: vk::Extent3D,
    usage_flags: vk::ImageUsageFlags,
    device: crate::device::LogicalDevice,
    allocator: Option<GpuAllocator>,
    allocation: Option<Allocation>,
}

pub enum ImageCreateInfo<'a> {
    /// Wrap an existing VkImage whose memory is not managed by the application
    /// (i.e. swapchain images)
    FromVkNotManaged {
        device: crate::device::LogicalDevice,
        image: vk::Image,
        format: vk::Format,
        extent: vk::Extent3D,
        usage_flags: vk::ImageUsageFlags,
    },
    /// Create a new 2D image backed by a fresh device-local allocation
    NewAllocated {
        allocator: &'a GpuAllocator,
        format: vk::Format,
        extent: vk::Extent3D,
        usage_flags: vk::ImageUsageFlags,
        location: MemoryLocation,
        name: &'a str,
    },
}

impl Image {
    pub fn new(create_info: ImageCreateInfo) -> Result<Self> {
        match create_info {
            ImageCreateInfo::FromVkNotManaged {
                device,
                image,
                format,
                extent,
                usage_flags,
            } => Ok(Self {
                handle: image,
                format,
                extent,
                usage_flags,
                device,
                allocator: None,
                allocation: None,
            }),
            ImageCreateInfo::NewAllocated {
                allocator,
                format,
                extent,
                usage_flags,
                location,
                name,
            } => {
                let device = allocator.get_device().clone();
                let handle = unsafe {
                    device.get_handle().create_image(
                        &vk::ImageCreateInfo {
                            s_type: vk::StructureType::IMAGE_CREATE_INFO,
                            p_next: ptr::null(),
                            flags: vk::ImageCreateFlags::empty(),
                            image_type: vk::ImageType::TYPE_2D,
                            format,
                            extent,
                            mip_levels: 1,
                            array_layers: 1,
                            samples: vk::SampleCountFlags::TYPE_1,
                            tiling: vk::ImageTiling::OPTIMAL,
                            usage: usage_flags,
                            sharing_mode: vk::SharingMode::EXCLUSIVE,
                            queue_family_index_count: 0,
                            p_queue_family_indices: ptr::null(),
                            initial_layout: vk::ImageLayout::UNDEFINED,
                            _marker: Default::default(),
                        },
                        None,
                    )?
                };

                #[cfg(feature = "log-lifetimes")]
                tracing::trace!("Created VkImage {:p}", handle);

                let requirements =
                    unsafe { device.get_handle().get_image_memory_requirements(handle) };
                let allocation = allocator.allocate(name, &requirements, location, false)?;
                unsafe {
                    device.get_handle().bind_image_memory(
                        handle,
                        allocation.memory(),
                        allocation.offset(),
                    )?
                }
                Ok(Self {
                    handle,
                    format,
                    extent,
                    usage_flags,
                    device,
                    allocator: Some(allocator.clone()),
                    allocation: Some(allocation),
                })
            }
        }
    }

    pub fn get_handle(&self) -> &vk::Image {
        &self.handle
    }

    pub fn handle(&self) -> vk::Image {
        self.handle
    }

    pub fn format(&self) -> vk::Format {
        self.format
    }

    pub fn extent(&self) -> vk::Extent3D {
        self.extent
    }

    pub fn extent_2d(&self) -> vk::Extent2D {
        vk::Extent2D {
            width: self.extent.width,
            height: self.extent.height,
        }
    }

    pub fn usage_flags(&self) -> vk::ImageUsageFlags {
        self.usage_flags
    }

    pub fn image_subresource_range(aspect: vk::ImageAspectFlags) -> vk::ImageSubresourceRange {
        vk::ImageSubresourceRange {
            aspect_mask: aspect,
            base_mip_level: 0,
            level_count: vk::REMAINING_MIP_LEVELS,
            base_array_layer: 0,
            layer_count: vk::REMAINING_ARRAY_LAYERS,
        }
    }

    /// Transitions the image from one layout to another layout
    pub fn transition(
        &self,
        cmd: &crate::command::CommandBufferRecording,
        current_layout: vk::ImageLayout,
        new_layout: vk::ImageLayout,
    ) {
        let aspect_mask = if new_layout == vk::ImageLayout::DEPTH_ATTACHMENT_OPTIMAL {
            vk::ImageAspectFlags::DEPTH
        } else {
            vk::ImageAspectFlags::COLOR
        };
        let image_barrier = vk::ImageMemoryBarrier2 {
            s_type: vk::StructureType::IMAGE_MEMORY_BARRIER_2,
            p_next: ptr::null(),
            src_stage_mask: vk::PipelineStageFlags2::ALL_COMMANDS,
            src_access_mask: vk::AccessFlags2::MEMORY_WRITE,
            dst_stage_mask: vk::PipelineStageFlags2::ALL_COMMANDS,
            dst_access_mask: vk::AccessFlags2::MEMORY_WRITE | vk::AccessFlags2::MEMORY_READ,
            old_layout: current_layout,
            new_layout,
            src_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
            dst_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
            image: self.handle,
            subresource_range: Self::image_subresource_range(aspect_mask),
            _marker: Default::default(),
        };
        let dependency_info = vk::DependencyInfo {
            s_type: vk::StructureType::DEPENDENCY_INFO,
            p_next: ptr::null(),
            dependency_flags: vk::DependencyFlags::empty(),
            memory_barrier_count: 0,
            p_memory_barriers: ptr::null(),
            buffer_memory_barrier_count: 0,
            p_buffer_memory_barriers: ptr::null(),
            image_memory_barrier_count: 1,
            p_image_memory_barriers: &image_barrier,
            _marker: Default::default(),
        };
        unsafe {
            self.device
                .get_handle()
                .cmd_pipeline_barrier2(cmd.handle(), &dependency_info);
        }
    }

    /// Blits `src_extent` texels of this image into `dst_extent` texels of `dst`.
    ///
    /// Extents are passed explicitly because the rendered region may be smaller than the
    /// image when the render scale is below 1; the blit is the upscale point.
    pub fn blit_to(
        &self,
        cmd: &crate::command::CommandBufferRecording,
        dst: &Image,
        src_extent: vk::Extent2D,
        dst_extent: vk::Extent2D,
    ) {
        let blit_region = vk::ImageBlit2 {
            s_type: vk::StructureType::IMAGE_BLIT_2,
            p_next: ptr::null(),
            src_subresource: vk::ImageSubresourceLayers {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                mip_level: 0,
                base_array_layer: 0,
                layer_count: 1,
            },
            src_offsets: [
                vk::Offset3D { x: 0, y: 0, z: 0 },
                vk::Offset3D {
                    x: src_extent.width as i32,
                    y: src_extent.height as i32,
                    z: 1,
                },
            ],
            dst_subresource: vk::ImageSubresourceLayers {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                mip_level: 0,
                base_array_layer: 0,
                layer_count: 1,
            },
            dst_offsets: [
                vk::Offset3D { x: 0, y: 0, z: 0 },
                vk::Offset3D {
                    x: dst_extent.width as i32,
                    y: dst_extent.height as i32,
                    z: 1,
                },
            ],
            _marker: Default::default(),
        };
        let blit_info = vk::BlitImageInfo2 {
            s_type: vk::StructureType::BLIT_IMAGE_INFO_2,
            p_next: ptr::null(),
            src_image: self.handle,
            src_image_layout: vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
            dst_image: dst.handle(),
            dst_image_layout: vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            region_count: 1,
            p_regions: &blit_region,
            filter: vk::Filter::LINEAR,
            _marker: Default::default(),
        };
        unsafe {
            self.device
                .get_handle()
                .cmd_blit_image2(cmd.handle(), &blit_info);
        }
    }
}

impl Destructible for Image {
    fn destroy(&mut self) {
        // swapchain owned images carry no allocation and are not ours to destroy
        if let Some(allocation) = self.allocation.take() {
            #[cfg(feature = "log-lifetimes")]
            tracing::trace!("Destroying VkImage {:p}", self.handle);

            unsafe {
                self.device.get_handle().destroy_image(self.handle, None);
            }
            if let Some(allocator) = self.allocator.take() {
                let _ = allocator.free(allocation);
            }
        }
    }
}
