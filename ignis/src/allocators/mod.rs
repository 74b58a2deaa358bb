/// Provides the request/release contract the rest of the crate allocates GPU memory through
pub mod gpu_allocator_impl;
pub mod memory_type;

pub use gpu_allocator_impl::{Allocation, GpuAllocator};
pub use memory_type::MemoryLocation;
