use std::sync::{Arc, Mutex};

use anyhow::Result;
use ash::vk;
use derivative::Derivative;

use crate::allocators::MemoryLocation;
use crate::IgnisError;

pub use gpu_allocator::vulkan::Allocation;

/// Shares one [`gpu_allocator::vulkan::Allocator`] between every resource that needs to
/// allocate or free device memory. Resources keep a clone so their allocations can release
/// themselves without the caller threading the allocator through.
#[derive(Derivative, Clone)]
#[derivative(Debug)]
pub struct GpuAllocator {
    #[derivative(Debug = "ignore")]
    inner: Arc<Mutex<gpu_allocator::vulkan::Allocator>>,
    device: crate::device::LogicalDevice,
}

impl GpuAllocator {
    pub fn new(
        instance: &ash::Instance,
        device: crate::device::LogicalDevice,
        physical_device: vk::PhysicalDevice,
    ) -> Result<Self> {
        let allocator =
            gpu_allocator::vulkan::Allocator::new(&gpu_allocator::vulkan::AllocatorCreateDesc {
                instance: instance.clone(),
                device: device.get_handle().clone(),
                physical_device,
                debug_settings: gpu_allocator::AllocatorDebugSettings {
                    log_memory_information: false,
                    log_leaks_on_shutdown: true,
                    store_stack_traces: false,
                    log_allocations: false,
                    log_frees: false,
                    log_stack_traces: false,
                },
                buffer_device_address: true,
                allocation_sizes: Default::default(),
            })?;
        Ok(Self {
            inner: Arc::new(Mutex::new(allocator)),
            device,
        })
    }

    /// Request a new allocation. `linear` distinguishes buffers/linear-tiled images from
    /// optimally tiled images.
    pub fn allocate(
        &self,
        name: &str,
        requirements: &vk::MemoryRequirements,
        location: MemoryLocation,
        linear: bool,
    ) -> Result<Allocation> {
        let mut allocator = self.inner.lock().map_err(IgnisError::from)?;
        Ok(
            allocator.allocate(&gpu_allocator::vulkan::AllocationCreateDesc {
                name,
                requirements: *requirements,
                location: location.into(),
                linear,
                allocation_scheme: gpu_allocator::vulkan::AllocationScheme::GpuAllocatorManaged,
            })?,
        )
    }

    /// Return an allocation to the allocator
    pub fn free(&self, allocation: Allocation) -> Result<()> {
        let mut allocator = self.inner.lock().map_err(IgnisError::from)?;
        allocator.free(allocation)?;
        Ok(())
    }

    pub fn get_device(&self) -> &crate::device::LogicalDevice {
        &self.device
    }
}
