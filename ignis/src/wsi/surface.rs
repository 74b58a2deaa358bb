use anyhow::Result;
use ash;
use ash::vk;
use derivative::Derivative;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

use crate::traits::Destructible;

#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct Surface {
    handle: vk::SurfaceKHR,
    capabilities: Option<vk::SurfaceCapabilitiesKHR>,
    formats: Option<Vec<vk::SurfaceFormatKHR>>,
    present_modes: Option<Vec<vk::PresentModeKHR>>,
    #[derivative(Debug = "ignore")]
    ext: ash::khr::surface::Instance,
}

impl Surface {
    /// Construct a new [`Surface`] **without** any present modes, capabilities, and formats.
    /// See [`Surface::query_details`] to determine such.
    pub fn new<T>(entry: &ash::Entry, instance: &ash::Instance, window: &T) -> Result<Self>
    where
        T: HasWindowHandle + HasDisplayHandle,
    {
        let ext = ash::khr::surface::Instance::new(entry, instance);
        let handle = unsafe {
            ash_window::create_surface(
                entry,
                instance,
                window.display_handle()?.as_raw(),
                window.window_handle()?.as_raw(),
                None,
            )?
        };

        #[cfg(feature = "log-lifetimes")]
        tracing::trace!("Creating VkSurface {:p}", handle);

        Ok(Self {
            handle,
            capabilities: None,
            formats: None,
            present_modes: None,
            ext,
        })
    }

    /// Determine the [`vk::SurfaceCapabilitiesKHR`], [`vk::SurfaceFormatKHR`] and
    /// [`vk::PresentModeKHR`]
    pub fn query_details(&mut self, physical_device: vk::PhysicalDevice) -> Result<()> {
        self.capabilities = Some(unsafe {
            self.ext
                .get_physical_device_surface_capabilities(physical_device, self.handle)?
        });
        self.present_modes = Some(unsafe {
            self.ext
                .get_physical_device_surface_present_modes(physical_device, self.handle)?
        });
        self.formats = Some(unsafe {
            self.ext
                .get_physical_device_surface_formats(physical_device, self.handle)?
        });
        Ok(())
    }

    pub fn get_capabilities(&self) -> Option<vk::SurfaceCapabilitiesKHR> {
        self.capabilities
    }

    pub fn get_formats(&self) -> Option<&[vk::SurfaceFormatKHR]> {
        self.formats.as_deref()
    }

    pub fn get_present_modes(&self) -> Option<&[vk::PresentModeKHR]> {
        self.present_modes.as_deref()
    }

    /// Whether `family_index` on the physical device can present to this surface
    pub fn supports_queue_family(
        &self,
        physical_device: vk::PhysicalDevice,
        family_index: u32,
    ) -> Result<bool> {
        Ok(unsafe {
            self.ext.get_physical_device_surface_support(
                physical_device,
                family_index,
                self.handle,
            )?
        })
    }

    pub fn get_handle(&self) -> &vk::SurfaceKHR {
        &self.handle
    }

    pub fn handle(&self) -> vk::SurfaceKHR {
        self.handle
    }
}

impl Destructible for Surface {
    fn destroy(&mut self) {
        #[cfg(feature = "log-lifetimes")]
        tracing::trace!("Destroying VkSurface {:p}", self.handle);

        unsafe {
            self.ext.destroy_surface(self.handle, None);
        }
    }
}
