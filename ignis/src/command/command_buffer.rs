/// Command buffers are divided into [`CommandBuffer`], [`CommandBufferRecording`] and
/// [`CommandBufferExecutable`].
///
/// This type state ensures that no commands are recorded or submitted when they are not
/// supposed to be.
use std::ptr;

use anyhow::Result;
use ash::vk;

#[derive(Debug, Clone)]
pub struct CommandBuffer {
    handle: vk::CommandBuffer,
    device: crate::device::LogicalDevice,
}

impl CommandBuffer {
    pub fn new(handle: vk::CommandBuffer, device: crate::device::LogicalDevice) -> Self {
        Self { handle, device }
    }

    /// Moves the command buffer into the recording state
    pub fn begin(self, flags: vk::CommandBufferUsageFlags) -> Result<CommandBufferRecording> {
        unsafe {
            self.device.get_handle().begin_command_buffer(
                self.handle,
                &vk::CommandBufferBeginInfo {
                    s_type: vk::StructureType::COMMAND_BUFFER_BEGIN_INFO,
                    p_next: ptr::null(),
                    flags,
                    p_inheritance_info: ptr::null(),
                    _marker: Default::default(),
                },
            )?
        };
        Ok(CommandBufferRecording {
            handle: self.handle,
            device: self.device,
        })
    }

    /// Resets the current command buffer
    pub fn reset(&self, flags: vk::CommandBufferResetFlags) -> Result<()> {
        unsafe {
            self.device
                .get_handle()
                .reset_command_buffer(self.handle, flags)?
        };
        Ok(())
    }
}

#[derive(Debug)]
pub struct CommandBufferRecording {
    handle: vk::CommandBuffer,
    device: crate::device::LogicalDevice,
}

impl CommandBufferRecording {
    /// Ends recording into the command buffer
    pub fn end(self) -> Result<CommandBufferExecutable> {
        unsafe { self.device.get_handle().end_command_buffer(self.handle)? }
        Ok(CommandBufferExecutable {
            handle: self.handle,
            device: self.device,
        })
    }
}

/// Command buffer is in its executable state and can now be executed via queue submission
#[derive(Debug)]
pub struct CommandBufferExecutable {
    handle: vk::CommandBuffer,
    device: crate::device::LogicalDevice,
}

impl CommandBufferExecutable {
    /// Quickly acquire a [`VkCommandBufferSubmitInfo`](vk::CommandBufferSubmitInfo) for
    /// a single [`VkCommandBuffer`](vk::CommandBuffer).
    pub fn submit_info(&self) -> vk::CommandBufferSubmitInfo<'static> {
        vk::CommandBufferSubmitInfo {
            s_type: vk::StructureType::COMMAND_BUFFER_SUBMIT_INFO,
            p_next: ptr::null(),
            command_buffer: self.handle,
            device_mask: 0,
            _marker: Default::default(),
        }
    }

    /// Assemble a [`VkSubmitInfo2`](vk::SubmitInfo2) with synchronization primitives
    pub fn submit_info_sync<'a>(
        cmd_submit_info: &[vk::CommandBufferSubmitInfo<'a>],
        wait_semaphores: &[vk::SemaphoreSubmitInfo<'a>],
        signal_semaphores: &[vk::SemaphoreSubmitInfo<'a>],
    ) -> vk::SubmitInfo2<'a> {
        vk::SubmitInfo2 {
            s_type: vk::StructureType::SUBMIT_INFO_2,
            p_next: ptr::null(),
            flags: vk::SubmitFlags::empty(),
            wait_semaphore_info_count: wait_semaphores.len() as u32,
            p_wait_semaphore_infos: wait_semaphores.as_ptr(),
            command_buffer_info_count: cmd_submit_info.len() as u32,
            p_command_buffer_infos: cmd_submit_info.as_ptr(),
            signal_semaphore_info_count: signal_semaphores.len() as u32,
            p_signal_semaphore_infos: signal_semaphores.as_ptr(),
            _marker: Default::default(),
        }
    }

    /// Submits the current command buffer to the queue
    pub fn submit(
        self,
        queue: vk::Queue,
        submit_infos: &[vk::SubmitInfo2],
        fence: vk::Fence,
    ) -> Result<CommandBuffer> {
        unsafe {
            self.device
                .get_handle()
                .queue_submit2(queue, submit_infos, fence)?
        };
        Ok(CommandBuffer {
            handle: self.handle,
            device: self.device,
        })
    }
}

/// Traits that all command buffer states are expected to have
pub trait CmdBuffer {
    /// Get the [`LogicalDevice`](crate::device::LogicalDevice) attached
    fn get_device(&self) -> &crate::device::LogicalDevice;
    /// Get the underlying [`VkCommandBuffer`](vk::CommandBuffer) reference
    fn get_handle(&self) -> &vk::CommandBuffer;
    /// Get the underlying [`VkCommandBuffer`](vk::CommandBuffer) copy
    fn handle(&self) -> vk::CommandBuffer;
}

macro_rules! impl_cmd_buffer {
    ($state:ty) => {
        impl CmdBuffer for $state {
            fn get_device(&self) -> &crate::device::LogicalDevice {
                &self.device
            }

            fn get_handle(&self) -> &vk::CommandBuffer {
                &self.handle
            }

            fn handle(&self) -> vk::CommandBuffer {
                self.handle
            }
        }
    };
}

impl_cmd_buffer!(CommandBuffer);
impl_cmd_buffer!(CommandBufferRecording);
impl_cmd_buffer!(CommandBufferExecutable);
