use anyhow::Result;
use ash::vk;

use crate::command::CmdBuffer;
use crate::traits::Destructible;

/// Timeout for setup-time transfers; generous because asset uploads can be large
const IMMEDIATE_SUBMIT_TIMEOUT_NS: u64 = 9_999_999_999;

/// A synchronous one-shot command execution path, separate from the per-frame ring.
///
/// Blocks the calling thread until the GPU finishes, so it must never be used inside the
/// frame loop.
#[derive(Debug)]
pub struct ImmediateSubmit {
    fence: crate::sync::Fence,
    command_buffer: crate::command::CommandBuffer,
    command_pool: crate::command::CommandPool,
    device: crate::device::LogicalDevice,
    queue: crate::device::Queue,
}

#[derive(Debug)]
pub struct ImmediateSubmitContext<'a> {
    pub device: &'a crate::device::LogicalDevice,
    pub cmd: &'a crate::command::CommandBufferRecording,
    pub queue: &'a crate::device::Queue,
}

impl ImmediateSubmit {
    pub fn new(device: crate::device::LogicalDevice, queue: crate::device::Queue) -> Result<Self> {
        let fence = crate::sync::Fence::new(device.clone(), vk::FenceCreateFlags::SIGNALED)?;
        let command_pool = crate::command::CommandPool::new(
            device.clone(),
            &queue,
            vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER,
        )?;
        let command_buffer = command_pool
            .allocate(1)?
            .pop()
            .ok_or(crate::IgnisError::VkError(
                vk::Result::ERROR_OUT_OF_DEVICE_MEMORY,
            ))?;
        Ok(Self {
            fence,
            command_buffer,
            command_pool,
            device,
            queue,
        })
    }

    /// Records commands via `function` and blocks until the GPU retires them
    pub fn submit<T: FnOnce(&ImmediateSubmitContext)>(&self, function: T) -> Result<()> {
        self.fence.reset()?;
        self.command_buffer
            .reset(vk::CommandBufferResetFlags::empty())?;
        let cmd = self
            .command_buffer
            .clone()
            .begin(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT)?;
        let context = ImmediateSubmitContext {
            device: &self.device,
            cmd: &cmd,
            queue: &self.queue,
        };
        function(&context);
        let cmd = cmd.end()?;
        let cmd_submit_info = cmd.submit_info();
        let submit_info = crate::command::CommandBufferExecutable::submit_info_sync(
            &[cmd_submit_info],
            &[],
            &[],
        );
        cmd.submit(self.queue.handle(), &[submit_info], self.fence.handle())?;
        self.fence.wait(IMMEDIATE_SUBMIT_TIMEOUT_NS)?;
        Ok(())
    }

    pub fn get_device(&self) -> &crate::device::LogicalDevice {
        &self.device
    }

    pub fn get_queue(&self) -> &crate::device::Queue {
        &self.queue
    }
}

impl Destructible for ImmediateSubmit {
    fn destroy(&mut self) {
        self.fence.destroy();
        self.command_pool.destroy();
    }
}
