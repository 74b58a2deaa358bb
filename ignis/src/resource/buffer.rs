use std::ptr;

use anyhow::Result;
use ash::vk;

use crate::allocators::{Allocation, GpuAllocator, MemoryLocation};
use crate::traits::Destructible;

/// A GPU memory backed buffer. Owns its allocation; releasing goes through [`Destructible`],
/// usually deferred into a deletion queue.
#[derive(Debug)]
pub struct Buffer {
    handle: vk::Buffer,
    device: crate::device::LogicalDevice,
    allocator: GpuAllocator,
    allocation: Option<Allocation>,
    size: vk::DeviceSize,
    address: vk::DeviceAddress,
}

pub struct BufferCreateInfo<'a> {
    pub allocator: &'a GpuAllocator,
    pub size: vk::DeviceSize,
    pub usage_flags: vk::BufferUsageFlags,
    pub location: MemoryLocation,
    pub name: &'a str,
}

impl Buffer {
    pub fn new(create_info: BufferCreateInfo) -> Result<Self> {
        let device = create_info.allocator.get_device().clone();
        let handle = unsafe {
            device.get_handle().create_buffer(
                &vk::BufferCreateInfo {
                    s_type: vk::StructureType::BUFFER_CREATE_INFO,
                    p_next: ptr::null(),
                    flags: vk::BufferCreateFlags::empty(),
                    size: create_info.size,
                    usage: create_info.usage_flags,
                    sharing_mode: vk::SharingMode::EXCLUSIVE,
                    queue_family_index_count: 0,
                    p_queue_family_indices: ptr::null(),
                    _marker: Default::default(),
                },
                None,
            )?
        };

        #[cfg(feature = "log-lifetimes")]
        tracing::trace!("Creating VkBuffer {:p}", handle);

        let requirements = unsafe { device.get_handle().get_buffer_memory_requirements(handle) };
        let allocation = create_info.allocator.allocate(
            create_info.name,
            &requirements,
            create_info.location,
            true,
        )?;
        unsafe {
            device
                .get_handle()
                .bind_buffer_memory(handle, allocation.memory(), allocation.offset())?
        }

        let mut address = vk::DeviceAddress::default();
        if create_info
            .usage_flags
            .contains(vk::BufferUsageFlags::SHADER_DEVICE_ADDRESS)
        {
            address = unsafe {
                device
                    .get_handle()
                    .get_buffer_device_address(&vk::BufferDeviceAddressInfo {
                        s_type: vk::StructureType::BUFFER_DEVICE_ADDRESS_INFO,
                        p_next: ptr::null(),
                        buffer: handle,
                        _marker: Default::default(),
                    })
            };
        }

        Ok(Self {
            handle,
            device,
            allocator: create_info.allocator.clone(),
            allocation: Some(allocation),
            size: create_info.size,
            address,
        })
    }

    pub fn get_handle(&self) -> &vk::Buffer {
        &self.handle
    }

    pub fn handle(&self) -> vk::Buffer {
        self.handle
    }

    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }

    /// If the buffer was created with `SHADER_DEVICE_ADDRESS` usage, its
    /// [`VkDeviceAddress`](vk::DeviceAddress)
    pub fn address(&self) -> vk::DeviceAddress {
        self.address
    }

    /// Mapped bytes of a host visible allocation
    pub fn mapped_slice_mut(&mut self) -> Option<&mut [u8]> {
        self.allocation
            .as_mut()
            .and_then(|allocation| allocation.mapped_slice_mut())
    }
}

impl Destructible for Buffer {
    fn destroy(&mut self) {
        #[cfg(feature = "log-lifetimes")]
        tracing::trace!("Destroying VkBuffer {:p}", self.handle);

        unsafe {
            self.device.get_handle().destroy_buffer(self.handle, None);
        }
        if let Some(allocation) = self.allocation.take() {
            let _ = self.allocator.free(allocation);
        }
    }
}
