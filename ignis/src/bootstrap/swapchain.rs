use std::collections::HashSet;
use std::fmt::Debug;
use std::ptr;

use anyhow::Result;
use ash::vk;

use crate::IgnisError;

/// A builder pattern struct to make creating a [`wsi::Swapchain`](crate::wsi::Swapchain)
/// easier, automating preference ordering and error handling.
///
/// # Image format / Color space / Present mode picking
/// Formats, color spaces and present modes inserted first have the highest priority; the
/// first preference the surface actually offers wins.
#[derive(Debug)]
pub struct SwapchainBuilder<'a> {
    surface: &'a crate::wsi::Surface,

    preferred_image_formats: Vec<vk::Format>,
    preferred_present_modes: Vec<vk::PresentModeKHR>,
    preferred_color_spaces: Vec<vk::ColorSpaceKHR>,

    family_indices: HashSet<u32>,
    image_usage: vk::ImageUsageFlags,
    image_extent: vk::Extent2D,
}

impl<'a> SwapchainBuilder<'a> {
    /// The surface must have had [`query_details`](crate::wsi::Surface::query_details)
    /// called on it beforehand.
    pub fn new(surface: &'a crate::wsi::Surface) -> Self {
        Self {
            surface,
            preferred_image_formats: Vec::new(),
            preferred_present_modes: Vec::new(),
            preferred_color_spaces: Vec::new(),
            family_indices: HashSet::new(),
            image_usage: vk::ImageUsageFlags::empty(),
            image_extent: vk::Extent2D::default(),
        }
    }

    /// Adds an image format to search for in the swapchain.
    ///
    /// **Functions like a queue meaning the first formats in get the highest priority.**
    pub fn request_image_format(mut self, format: vk::Format) -> Self {
        self.preferred_image_formats.push(format);
        self
    }

    /// Adds a present mode to search in the swapchain to use
    pub fn request_present_mode(mut self, present: vk::PresentModeKHR) -> Self {
        self.preferred_present_modes.push(present);
        self
    }

    /// Adds a color space for the swapchain to use
    pub fn request_color_space(mut self, color: vk::ColorSpaceKHR) -> Self {
        self.preferred_color_spaces.push(color);
        self
    }

    /// Adds a queue which is expected to use the swapchain
    pub fn push_queue(mut self, queue: &crate::device::Queue) -> Self {
        self.family_indices.insert(queue.get_family_index());
        self
    }

    /// Set swapchain image extents, clamped to the surface capabilities
    pub fn set_extent(mut self, extent: vk::Extent2D) -> Result<Self> {
        let capabilities = self.surface.get_capabilities().ok_or(IgnisError::NoQuery)?;
        self.image_extent = vk::Extent2D {
            width: extent.width.clamp(
                capabilities.min_image_extent.width,
                capabilities.max_image_extent.width,
            ),
            height: extent.height.clamp(
                capabilities.min_image_extent.height,
                capabilities.max_image_extent.height,
            ),
        };
        Ok(self)
    }

    /// Set image usage
    pub fn image_usage(mut self, usage: vk::ImageUsageFlags) -> Self {
        self.image_usage |= usage;
        self
    }

    /// Finds the first element of `preferences` also present in `available`
    fn find_first_occurrence<T: Clone + PartialEq + Debug>(
        preferences: &[T],
        available: &[T],
    ) -> Option<T> {
        preferences
            .iter()
            .find(|preference| available.contains(preference))
            .cloned()
    }

    /// Builds the swapchain
    pub fn build(
        self,
        instance: &ash::Instance,
        device: crate::device::LogicalDevice,
    ) -> Result<crate::wsi::Swapchain> {
        let capabilities = self.surface.get_capabilities().ok_or(IgnisError::NoQuery)?;
        let surface_formats = self.surface.get_formats().ok_or(IgnisError::NoQuery)?;
        let surface_present_modes = self
            .surface
            .get_present_modes()
            .ok_or(IgnisError::NoQuery)?;

        let available_formats: Vec<vk::Format> = surface_formats
            .iter()
            .map(|format| format.format)
            .collect();
        let available_color_spaces: Vec<vk::ColorSpaceKHR> = surface_formats
            .iter()
            .map(|format| format.color_space)
            .collect();

        let image_format = Self::find_first_occurrence(
            self.preferred_image_formats.as_slice(),
            available_formats.as_slice(),
        )
        .ok_or(IgnisError::NoSurfaceFormat)?;
        let image_color_space = Self::find_first_occurrence(
            self.preferred_color_spaces.as_slice(),
            available_color_spaces.as_slice(),
        )
        .ok_or(IgnisError::NoSurfaceFormat)?;
        let present_mode = Self::find_first_occurrence(
            self.preferred_present_modes.as_slice(),
            surface_present_modes,
        )
        .ok_or(IgnisError::NoPresentMode)?;

        let queue_family_indices: Vec<u32> = self.family_indices.iter().copied().collect();
        let swapchain_ci = vk::SwapchainCreateInfoKHR {
            s_type: vk::StructureType::SWAPCHAIN_CREATE_INFO_KHR,
            p_next: ptr::null(),
            flags: vk::SwapchainCreateFlagsKHR::empty(),
            surface: self.surface.handle(),
            min_image_count: capabilities.min_image_count,
            image_format,
            image_color_space,
            image_extent: self.image_extent,
            image_array_layers: 1,
            image_usage: self.image_usage,
            image_sharing_mode: if self.family_indices.len() > 1 {
                vk::SharingMode::CONCURRENT
            } else {
                vk::SharingMode::EXCLUSIVE
            },
            queue_family_index_count: if self.family_indices.len() <= 1 {
                0
            } else {
                self.family_indices.len() as u32
            },
            p_queue_family_indices: queue_family_indices.as_ptr(),
            pre_transform: capabilities.current_transform,
            composite_alpha: vk::CompositeAlphaFlagsKHR::OPAQUE,
            present_mode,
            clipped: vk::TRUE,
            old_swapchain: vk::SwapchainKHR::null(),
            _marker: Default::default(),
        };
        crate::wsi::Swapchain::new(instance, device, &swapchain_ci)
    }
}
