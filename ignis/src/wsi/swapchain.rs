use std::ptr;

use anyhow::Result;
use ash;
use ash::prelude::VkResult;
use ash::vk;
use derivative::Derivative;

use crate::traits::Destructible;

#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct Swapchain {
    handle: vk::SwapchainKHR,
    #[derivative(Debug = "ignore")]
    ext: ash::khr::swapchain::Device,
    device: crate::device::LogicalDevice,

    format: vk::Format,
    extent: vk::Extent2D,
    usage_flags: vk::ImageUsageFlags,
}

impl Swapchain {
    /// Construct a basic swapchain. For an easier build, see
    /// [`bootstrap::SwapchainBuilder`](crate::bootstrap::SwapchainBuilder).
    pub fn new(
        instance: &ash::Instance,
        device: crate::device::LogicalDevice,
        swapchain_ci: &vk::SwapchainCreateInfoKHR,
    ) -> Result<Self> {
        let ext = ash::khr::swapchain::Device::new(instance, device.get_handle());
        let handle = unsafe { ext.create_swapchain(swapchain_ci, None)? };

        #[cfg(feature = "log-lifetimes")]
        tracing::trace!("Creating VkSwapchainKHR {:p}", handle);

        Ok(Self {
            handle,
            ext,
            device,
            format: swapchain_ci.image_format,
            extent: swapchain_ci.image_extent,
            usage_flags: swapchain_ci.image_usage,
        })
    }

    pub fn get_handle(&self) -> &vk::SwapchainKHR {
        &self.handle
    }

    pub fn handle(&self) -> vk::SwapchainKHR {
        self.handle
    }

    pub fn get_ext(&self) -> &ash::khr::swapchain::Device {
        &self.ext
    }

    pub fn format(&self) -> vk::Format {
        self.format
    }

    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    /// Presentable images of the chain, wrapped without owned memory
    pub fn get_images(&self) -> Result<Vec<crate::resource::Image>> {
        Ok(unsafe { self.ext.get_swapchain_images(self.handle)? }
            .into_iter()
            .map(|image| {
                crate::resource::Image::new(crate::resource::ImageCreateInfo::FromVkNotManaged {
                    device: self.device.clone(),
                    image,
                    format: self.format,
                    extent: vk::Extent3D {
                        width: self.extent.width,
                        height: self.extent.height,
                        depth: 1,
                    },
                    usage_flags: self.usage_flags,
                })
            })
            .collect::<Result<Vec<_>>>()?)
    }

    /// One full color view per presentable image
    pub fn get_image_views(
        &self,
        images: &[crate::resource::Image],
    ) -> Result<Vec<crate::resource::ImageView>> {
        images
            .iter()
            .map(|image| {
                crate::resource::ImageView::from_image(
                    self.device.clone(),
                    image,
                    vk::ImageAspectFlags::COLOR,
                )
            })
            .collect::<Result<Vec<_>>>()
    }

    /// Acquire the next presentable image index. The raw [`vk::Result`] is surfaced so the
    /// caller can treat `ERROR_OUT_OF_DATE_KHR` as recoverable surface staleness; the `bool`
    /// is the suboptimal flag.
    pub fn acquire_next_image(
        &self,
        timeout: u64,
        semaphore: &crate::sync::BinarySemaphore,
    ) -> VkResult<(u32, bool)> {
        unsafe {
            self.ext.acquire_next_image(
                self.handle,
                timeout,
                semaphore.handle(),
                vk::Fence::null(),
            )
        }
    }

    /// Present `image_index`, waiting on `wait_semaphore`. Staleness surfaces the same way
    /// as for [`Swapchain::acquire_next_image`].
    pub fn present(
        &self,
        queue: &crate::device::Queue,
        image_index: u32,
        wait_semaphore: &crate::sync::BinarySemaphore,
    ) -> VkResult<bool> {
        let present_info = vk::PresentInfoKHR {
            s_type: vk::StructureType::PRESENT_INFO_KHR,
            p_next: ptr::null(),
            wait_semaphore_count: 1,
            p_wait_semaphores: wait_semaphore.get_handle(),
            swapchain_count: 1,
            p_swapchains: &self.handle,
            p_image_indices: &image_index,
            p_results: ptr::null_mut(),
            _marker: Default::default(),
        };
        unsafe { self.ext.queue_present(queue.handle(), &present_info) }
    }
}

impl Destructible for Swapchain {
    fn destroy(&mut self) {
        #[cfg(feature = "log-lifetimes")]
        tracing::trace!("Destroying VkSwapchainKHR {:p}", self.handle);

        unsafe {
            self.ext.destroy_swapchain(self.handle, None);
        }
    }
}
