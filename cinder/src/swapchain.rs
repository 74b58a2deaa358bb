use anyhow::Result;
use ash::vk;
use ignis::allocators::{GpuAllocator, MemoryLocation};
use ignis::resource::{Image, ImageCreateInfo, ImageView};
use ignis::traits::Destructible;
use tracing::info;

/// Offscreen images the frame is rendered into before the presentation blit. Allocated once
/// at the initial window resolution; resizes only rebuild the swapchain and the per-frame
/// render extent shrinks to fit.
pub struct DrawTargets {
    pub draw_image: Image,
    pub draw_image_view: ImageView,
    pub depth_image: Image,
    pub depth_image_view: ImageView,
}

impl DrawTargets {
    fn new(allocator: &GpuAllocator, extent: vk::Extent2D) -> Result<Self> {
        let device = allocator.get_device().clone();
        let extent_3d = vk::Extent3D {
            width: extent.width,
            height: extent.height,
            depth: 1,
        };
        let draw_image = Image::new(ImageCreateInfo::NewAllocated {
            allocator,
            format: vk::Format::R16G16B16A16_SFLOAT,
            extent: extent_3d,
            usage_flags: vk::ImageUsageFlags::TRANSFER_SRC
                | vk::ImageUsageFlags::TRANSFER_DST
                | vk::ImageUsageFlags::STORAGE
                | vk::ImageUsageFlags::COLOR_ATTACHMENT,
            location: MemoryLocation::GpuOnly,
            name: "draw image",
        })?;
        let draw_image_view =
            ImageView::from_image(device.clone(), &draw_image, vk::ImageAspectFlags::COLOR)?;
        let depth_image = Image::new(ImageCreateInfo::NewAllocated {
            allocator,
            format: vk::Format::D32_SFLOAT,
            extent: extent_3d,
            usage_flags: vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT,
            location: MemoryLocation::GpuOnly,
            name: "depth image",
        })?;
        let depth_image_view =
            ImageView::from_image(device, &depth_image, vk::ImageAspectFlags::DEPTH)?;
        Ok(Self {
            draw_image,
            draw_image_view,
            depth_image,
            depth_image_view,
        })
    }

    fn destroy(&mut self) {
        self.depth_image_view.destroy();
        self.depth_image.destroy();
        self.draw_image_view.destroy();
        self.draw_image.destroy();
    }
}

/// The per-axis render extent actually used this frame: the offscreen target is never
/// rendered beyond the presentable size, and `render_scale` shrinks it further.
pub fn scaled_render_extent(
    draw_extent: vk::Extent2D,
    swapchain_extent: vk::Extent2D,
    render_scale: f32,
) -> vk::Extent2D {
    let render_scale = render_scale.clamp(0.0, 1.0);
    vk::Extent2D {
        width: (draw_extent.width.min(swapchain_extent.width) as f32 * render_scale) as u32,
        height: (draw_extent.height.min(swapchain_extent.height) as f32 * render_scale) as u32,
    }
}

/// Owns the presentable chain plus the offscreen draw/depth targets, and handles
/// create/destroy/resize of the chain.
pub struct SwapchainContext {
    pub surface: ignis::wsi::Surface,
    pub swapchain: ignis::wsi::Swapchain,
    pub images: Vec<Image>,
    pub image_views: Vec<ImageView>,
    pub targets: DrawTargets,
    pub resize_requested: bool,
}

impl SwapchainContext {
    pub fn new(
        instance: &ignis::core::Instance,
        surface: ignis::wsi::Surface,
        device: ignis::device::LogicalDevice,
        queue: &ignis::device::Queue,
        allocator: &GpuAllocator,
        extent: vk::Extent2D,
    ) -> Result<Self> {
        let swapchain = Self::build_swapchain(instance, &surface, device, queue, extent)?;
        let images = swapchain.get_images()?;
        let image_views = swapchain.get_image_views(images.as_slice())?;
        let targets = DrawTargets::new(allocator, extent)?;
        Ok(Self {
            surface,
            swapchain,
            images,
            image_views,
            targets,
            resize_requested: false,
        })
    }

    fn build_swapchain(
        instance: &ignis::core::Instance,
        surface: &ignis::wsi::Surface,
        device: ignis::device::LogicalDevice,
        queue: &ignis::device::Queue,
        extent: vk::Extent2D,
    ) -> Result<ignis::wsi::Swapchain> {
        ignis::bootstrap::SwapchainBuilder::new(surface)
            .push_queue(queue)
            .request_image_format(vk::Format::B8G8R8A8_UNORM)
            .request_color_space(vk::ColorSpaceKHR::SRGB_NONLINEAR)
            // vsync locked
            .request_present_mode(vk::PresentModeKHR::FIFO)
            .image_usage(
                vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::TRANSFER_DST,
            )
            .set_extent(extent)?
            .build(instance.get_instance(), device)
    }

    /// Releases the chain and its views; the surface and draw targets survive
    fn destroy_swapchain(&mut self) {
        for view in self.image_views.iter_mut() {
            view.destroy();
        }
        self.image_views.clear();
        self.images.clear();
        self.swapchain.destroy();
    }

    /// Waits for the GPU to go idle, then rebuilds the chain at the current window size.
    /// The offscreen draw/depth targets are left untouched.
    pub fn resize(
        &mut self,
        instance: &ignis::core::Instance,
        device: ignis::device::LogicalDevice,
        queue: &ignis::device::Queue,
        physical_device: vk::PhysicalDevice,
        new_extent: vk::Extent2D,
    ) -> Result<()> {
        info!(
            "resizing swapchain to {}x{}",
            new_extent.width, new_extent.height
        );
        device.wait_idle()?;
        self.destroy_swapchain();
        // capabilities carry the fresh surface extent bounds
        self.surface.query_details(physical_device)?;
        self.swapchain = Self::build_swapchain(instance, &self.surface, device, queue, new_extent)?;
        self.images = self.swapchain.get_images()?;
        self.image_views = self.swapchain.get_image_views(self.images.as_slice())?;
        self.resize_requested = false;
        Ok(())
    }

    /// Render extent for this frame under the given scale factor
    pub fn render_extent(&self, render_scale: f32) -> vk::Extent2D {
        scaled_render_extent(
            self.targets.draw_image.extent_2d(),
            self.swapchain.extent(),
            render_scale,
        )
    }

    pub fn destroy(&mut self) {
        self.targets.destroy();
        self.destroy_swapchain();
        self.surface.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extent(width: u32, height: u32) -> vk::Extent2D {
        vk::Extent2D { width, height }
    }

    #[test]
    fn full_scale_uses_the_smaller_extent_per_axis() {
        let result = scaled_render_extent(extent(1700, 900), extent(1280, 1024), 1.0);
        assert_eq!((result.width, result.height), (1280, 900));
    }

    #[test]
    fn render_extent_scales_down_and_floors() {
        let result = scaled_render_extent(extent(1700, 900), extent(1700, 900), 0.5);
        assert_eq!((result.width, result.height), (850, 450));

        let result = scaled_render_extent(extent(1001, 333), extent(1001, 333), 0.33);
        assert_eq!((result.width, result.height), (330, 109));
    }

    #[test]
    fn render_extent_never_exceeds_either_extent() {
        let draw = extent(1700, 900);
        let swapchain = extent(800, 1200);
        for scale in [0.0f32, 0.1, 0.25, 0.5, 0.75, 0.99, 1.0, 1.5, 100.0] {
            let result = scaled_render_extent(draw, swapchain, scale);
            assert!(result.width <= draw.width.min(swapchain.width));
            assert!(result.height <= draw.height.min(swapchain.height));
        }
    }

    #[test]
    fn out_of_range_scales_clamp() {
        let result = scaled_render_extent(extent(100, 100), extent(100, 100), 2.0);
        assert_eq!((result.width, result.height), (100, 100));
        let result = scaled_render_extent(extent(100, 100), extent(100, 100), -1.0);
        assert_eq!((result.width, result.height), (0, 0));
    }
}
