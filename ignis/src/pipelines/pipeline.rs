use ash::vk;

use crate::traits::Destructible;

/// A built pipeline and the layout it binds with.
///
/// The layout handle is a copy; layouts are shared between pipelines and released through
/// their own [`PipelineLayout`](crate::pipelines::PipelineLayout) wrapper.
#[derive(Debug)]
pub struct Pipeline {
    handle: vk::Pipeline,
    layout: vk::PipelineLayout,
    device: crate::device::LogicalDevice,
}

impl Pipeline {
    pub(crate) fn from_parts(
        handle: vk::Pipeline,
        layout: vk::PipelineLayout,
        device: crate::device::LogicalDevice,
    ) -> Self {
        Self {
            handle,
            layout,
            device,
        }
    }

    pub fn handle(&self) -> vk::Pipeline {
        self.handle
    }

    pub fn layout(&self) -> vk::PipelineLayout {
        self.layout
    }
}

impl Destructible for Pipeline {
    fn destroy(&mut self) {
        #[cfg(feature = "log-lifetimes")]
        tracing::trace!("Destroying VkPipeline {:p}", self.handle);

        unsafe {
            self.device.get_handle().destroy_pipeline(self.handle, None);
        }
    }
}
