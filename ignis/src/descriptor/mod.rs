pub mod allocator;
pub mod descriptor_pool;
pub mod descriptor_set_layout;
pub mod writer;

pub use allocator::{DescriptorAllocator, DescriptorAllocatorGrowable};
pub use descriptor_pool::{DescriptorPool, PoolSizeRatio};
pub use descriptor_set_layout::{DescriptorSetLayout, DescriptorSetLayoutBuilder};
pub use writer::DescriptorWriter;
