#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum MemoryLocation {
    /// Memory useful in device accessible memory
    GpuOnly,
    /// Memory useful for uploading data to the device
    CpuToGpu,
    /// Memory useful for read back of data
    GpuToCpu,
}

impl From<MemoryLocation> for gpu_allocator::MemoryLocation {
    fn from(value: MemoryLocation) -> Self {
        match value {
            MemoryLocation::GpuOnly => gpu_allocator::MemoryLocation::GpuOnly,
            MemoryLocation::CpuToGpu => gpu_allocator::MemoryLocation::CpuToGpu,
            MemoryLocation::GpuToCpu => gpu_allocator::MemoryLocation::GpuToCpu,
        }
    }
}
