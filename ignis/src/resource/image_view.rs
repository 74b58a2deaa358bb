use std::ptr;

use anyhow::Result;
use ash::vk;

use crate::traits::Destructible;

#[derive(Debug, Clone)]
pub struct ImageView {
    handle: vk::ImageView,
    device: crate::device::LogicalDevice,
}

impl ImageView {
    pub fn new(
        device: crate::device::LogicalDevice,
        create_info: &vk::ImageViewCreateInfo,
    ) -> Result<Self> {
        let handle = unsafe { device.get_handle().create_image_view(create_info, None)? };

        #[cfg(feature = "log-lifetimes")]
        tracing::trace!("Creating VkImageView {:p}", handle);

        Ok(Self { handle, device })
    }

    /// Builds a full 2D view over `image`
    pub fn from_image(
        device: crate::device::LogicalDevice,
        image: &crate::resource::Image,
        aspect: vk::ImageAspectFlags,
    ) -> Result<Self> {
        Self::new(
            device,
            &vk::ImageViewCreateInfo {
                s_type: vk::StructureType::IMAGE_VIEW_CREATE_INFO,
                p_next: ptr::null(),
                flags: vk::ImageViewCreateFlags::empty(),
                image: image.handle(),
                view_type: vk::ImageViewType::TYPE_2D,
                format: image.format(),
                components: Default::default(),
                subresource_range: vk::ImageSubresourceRange {
                    aspect_mask: aspect,
                    base_mip_level: 0,
                    level_count: 1,
                    base_array_layer: 0,
                    layer_count: 1,
                },
                _marker: Default::default(),
            },
        )
    }

    pub fn get_handle(&self) -> &vk::ImageView {
        &self.handle
    }

    pub fn handle(&self) -> vk::ImageView {
        self.handle
    }
}

impl Destructible for ImageView {
    fn destroy(&mut self) {
        #[cfg(feature = "log-lifetimes")]
        tracing::trace!("Destroying VkImageView {:p}", self.handle);

        unsafe {
            self.device
                .get_handle()
                .destroy_image_view(self.handle, None);
        }
    }
}
