use anyhow::Result;
use ash::vk;
use ignis::descriptor::{DescriptorAllocatorGrowable, PoolSizeRatio};
use ignis::traits::Destructible;
use ignis::util::{DeletionQueue, ReleaseTicket};

/// Number of frames recorded ahead of the GPU. Two slots overlap the CPU recording of one
/// frame with the GPU execution of the previous one.
pub const FRAME_OVERLAP: usize = 2;

/// Sets the first per-frame descriptor pool is sized for; later pools grow on demand
const FRAME_DESCRIPTOR_SETS: u32 = 1000;

/// Which ring slot serves `frame_number`
pub fn slot_index(frame_number: u64) -> usize {
    (frame_number % FRAME_OVERLAP as u64) as usize
}

/// Per-frame synchronization, command recording and transient-resource state.
///
/// Everything here is created once and reused: the deletion queue and descriptor pools are
/// flushed/reset on every reuse of the slot, the sync objects live until shutdown.
pub struct FrameSlot {
    pub command_pool: ignis::command::CommandPool,
    pub command_buffer: ignis::command::CommandBuffer,

    pub swapchain_semaphore: ignis::sync::BinarySemaphore,
    pub render_semaphore: ignis::sync::BinarySemaphore,
    pub render_fence: ignis::sync::Fence,

    pub deletion_queue: DeletionQueue<ReleaseTicket>,
    pub descriptors: DescriptorAllocatorGrowable,
}

impl FrameSlot {
    pub fn new(
        device: ignis::device::LogicalDevice,
        queue: &ignis::device::Queue,
    ) -> Result<Self> {
        let command_pool = ignis::command::CommandPool::new(
            device.clone(),
            queue,
            vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER,
        )?;
        let command_buffer = command_pool
            .allocate(1)?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("command pool returned no buffers"))?;
        let swapchain_semaphore =
            ignis::sync::BinarySemaphore::new(device.clone(), vk::SemaphoreCreateFlags::empty())?;
        let render_semaphore =
            ignis::sync::BinarySemaphore::new(device.clone(), vk::SemaphoreCreateFlags::empty())?;
        // signaled so the first use of the slot does not wait on a submission that never was
        let render_fence = ignis::sync::Fence::new(device.clone(), vk::FenceCreateFlags::SIGNALED)?;

        let frame_ratios = vec![
            PoolSizeRatio::default()
                .descriptor_type(vk::DescriptorType::STORAGE_IMAGE)
                .ratio(3.0),
            PoolSizeRatio::default()
                .descriptor_type(vk::DescriptorType::STORAGE_BUFFER)
                .ratio(3.0),
            PoolSizeRatio::default()
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .ratio(3.0),
            PoolSizeRatio::default()
                .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                .ratio(4.0),
        ];
        let descriptors =
            DescriptorAllocatorGrowable::new(device, FRAME_DESCRIPTOR_SETS, frame_ratios)?;

        Ok(Self {
            command_pool,
            command_buffer,
            swapchain_semaphore,
            render_semaphore,
            render_fence,
            deletion_queue: DeletionQueue::new(),
            descriptors,
        })
    }

    /// Shutdown-time teardown; per-frame resources still pending are released first
    pub fn destroy(&mut self) {
        self.deletion_queue.flush_resources();
        self.descriptors.destroy_pools();
        self.command_pool.destroy();
        self.swapchain_semaphore.destroy();
        self.render_semaphore.destroy();
        self.render_fence.destroy();
    }
}

/// Fixed ring of [`FrameSlot`]s indexed by a monotonic frame counter
pub struct FrameRing {
    pub slots: Vec<FrameSlot>,
    frame_number: u64,
}

impl FrameRing {
    pub fn new(
        device: ignis::device::LogicalDevice,
        queue: &ignis::device::Queue,
    ) -> Result<Self> {
        let slots = (0..FRAME_OVERLAP)
            .map(|_| FrameSlot::new(device.clone(), queue))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            slots,
            frame_number: 0,
        })
    }

    pub fn current_index(&self) -> usize {
        slot_index(self.frame_number)
    }

    /// Monotonic; wraps only through the modulo used for slot indexing
    pub fn advance(&mut self) {
        self.frame_number += 1;
    }

    pub fn destroy(&mut self) {
        for slot in self.slots.iter_mut() {
            slot.destroy();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_alternate_under_double_buffering() {
        let indices: Vec<usize> = (0..5u64).map(slot_index).collect();
        assert_eq!(indices, vec![0, 1, 0, 1, 0]);
    }

    #[test]
    fn slot_index_stays_in_bounds_for_large_counters() {
        for frame_number in [0u64, 1, 2, u32::MAX as u64, u64::MAX - 1, u64::MAX] {
            assert!(slot_index(frame_number) < FRAME_OVERLAP);
        }
    }
}
