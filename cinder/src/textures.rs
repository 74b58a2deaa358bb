use anyhow::{Context, Result};
use ash::vk;
use ignis::allocators::{GpuAllocator, MemoryLocation};
use ignis::command::CmdBuffer;
use ignis::resource::{Buffer, BufferCreateInfo, Image, ImageCreateInfo, ImageView, Sampler};
use ignis::traits::Destructible;
use ignis::util::{DeletionQueue, ImmediateSubmit, ReleaseTicket};

/// Uploads raw pixel data into a new sampled image through the immediate-submit channel
pub fn upload_image(
    allocator: &GpuAllocator,
    immediate: &ImmediateSubmit,
    data: &[u8],
    extent: vk::Extent3D,
    format: vk::Format,
    name: &str,
) -> Result<Image> {
    let image = Image::new(ImageCreateInfo::NewAllocated {
        allocator,
        format,
        extent,
        usage_flags: vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::TRANSFER_DST,
        location: MemoryLocation::GpuOnly,
        name,
    })?;

    let mut staging = Buffer::new(BufferCreateInfo {
        allocator,
        size: data.len() as vk::DeviceSize,
        usage_flags: vk::BufferUsageFlags::TRANSFER_SRC,
        location: MemoryLocation::CpuToGpu,
        name: "texture staging",
    })?;
    staging
        .mapped_slice_mut()
        .context("staging buffer is not host visible")?[..data.len()]
        .copy_from_slice(data);

    immediate.submit(|ctx| {
        image.transition(
            ctx.cmd,
            vk::ImageLayout::UNDEFINED,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
        );
        let copy_region = vk::BufferImageCopy {
            buffer_offset: 0,
            buffer_row_length: 0,
            buffer_image_height: 0,
            image_subresource: vk::ImageSubresourceLayers {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                mip_level: 0,
                base_array_layer: 0,
                layer_count: 1,
            },
            image_offset: vk::Offset3D::default(),
            image_extent: extent,
        };
        unsafe {
            ctx.device.get_handle().cmd_copy_buffer_to_image(
                ctx.cmd.handle(),
                staging.handle(),
                image.handle(),
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[copy_region],
            );
        }
        image.transition(
            ctx.cmd,
            vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        );
    })?;

    staging.destroy();

    Ok(image)
}

fn pack_color(color: [f32; 4]) -> u32 {
    let to_byte = |channel: f32| (channel.clamp(0.0, 1.0) * 255.0) as u32;
    to_byte(color[0]) | to_byte(color[1]) << 8 | to_byte(color[2]) << 16 | to_byte(color[3]) << 24
}

/// Fallback material inputs: a flat white image, the magenta/black checkerboard bound when
/// a real texture is missing, and the two shared samplers.
pub struct DefaultTextures {
    pub white_image: Image,
    pub white_image_view: ImageView,
    pub error_checkerboard_image: Image,
    pub error_checkerboard_image_view: ImageView,
    pub sampler_nearest: Sampler,
    pub sampler_linear: Sampler,
}

impl DefaultTextures {
    pub fn new(allocator: &GpuAllocator, immediate: &ImmediateSubmit) -> Result<Self> {
        let device = allocator.get_device().clone();
        let one_by_one = vk::Extent3D {
            width: 1,
            height: 1,
            depth: 1,
        };

        let white = pack_color([1.0, 1.0, 1.0, 1.0]);
        let white_image = upload_image(
            allocator,
            immediate,
            bytemuck::cast_slice(&[white]),
            one_by_one,
            vk::Format::R8G8B8A8_UNORM,
            "white texture",
        )?;
        let white_image_view =
            ImageView::from_image(device.clone(), &white_image, vk::ImageAspectFlags::COLOR)?;

        // 16x16 magenta/black checkerboard
        let magenta = pack_color([1.0, 0.0, 1.0, 1.0]);
        let black = pack_color([0.0, 0.0, 0.0, 1.0]);
        let mut pixels = [0u32; 16 * 16];
        for (index, pixel) in pixels.iter_mut().enumerate() {
            let (x, y) = (index % 16, index / 16);
            *pixel = if (x % 2) ^ (y % 2) != 0 { magenta } else { black };
        }
        let error_checkerboard_image = upload_image(
            allocator,
            immediate,
            bytemuck::cast_slice(&pixels),
            vk::Extent3D {
                width: 16,
                height: 16,
                depth: 1,
            },
            vk::Format::R8G8B8A8_UNORM,
            "error checkerboard texture",
        )?;
        let error_checkerboard_image_view = ImageView::from_image(
            device.clone(),
            &error_checkerboard_image,
            vk::ImageAspectFlags::COLOR,
        )?;

        let sampler_nearest = Sampler::new(device.clone(), vk::Filter::NEAREST)?;
        let sampler_linear = Sampler::new(device, vk::Filter::LINEAR)?;

        Ok(Self {
            white_image,
            white_image_view,
            error_checkerboard_image,
            error_checkerboard_image_view,
            sampler_nearest,
            sampler_linear,
        })
    }

    /// Defers every default resource into `queue`, in creation order
    pub fn queue_release(self, queue: &mut DeletionQueue<ReleaseTicket>) {
        queue.push(ReleaseTicket::Image(self.white_image));
        queue.push(ReleaseTicket::ImageView(self.white_image_view));
        queue.push(ReleaseTicket::Image(self.error_checkerboard_image));
        queue.push(ReleaseTicket::ImageView(self.error_checkerboard_image_view));
        queue.push(ReleaseTicket::Sampler(self.sampler_nearest));
        queue.push(ReleaseTicket::Sampler(self.sampler_linear));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_pack_to_rgba8() {
        assert_eq!(pack_color([1.0, 1.0, 1.0, 1.0]), 0xFFFFFFFF);
        assert_eq!(pack_color([0.0, 0.0, 0.0, 1.0]), 0xFF000000);
        assert_eq!(pack_color([1.0, 0.0, 1.0, 1.0]), 0xFFFF00FF);
    }

    #[test]
    fn out_of_range_channels_clamp() {
        assert_eq!(pack_color([2.0, -1.0, 0.0, 1.0]), 0xFF0000FF);
    }
}
