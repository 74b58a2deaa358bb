use ash::vk;

/// Represents a [`vk::Queue`] and its family
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Queue {
    handle: vk::Queue,
    family_index: u32,
    index: u32,
    queue_flags: vk::QueueFlags,
}

impl Queue {
    /// It is undefined behavior to pass in a [`vk::Queue`] from an already existing [`Queue`]
    pub unsafe fn new(
        handle: vk::Queue,
        family_index: u32,
        index: u32,
        queue_flags: vk::QueueFlags,
    ) -> Self {
        Self {
            handle,
            family_index,
            index,
            queue_flags,
        }
    }

    pub fn get_handle(&self) -> &vk::Queue {
        &self.handle
    }

    pub fn handle(&self) -> vk::Queue {
        self.handle
    }

    pub fn get_family_index(&self) -> u32 {
        self.family_index
    }

    pub fn get_index(&self) -> u32 {
        self.index
    }

    pub fn get_queue_flags(&self) -> vk::QueueFlags {
        self.queue_flags
    }
}
