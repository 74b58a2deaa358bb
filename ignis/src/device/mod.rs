pub mod debug_utils;
pub mod logical_device;
pub mod physical_device;
pub mod queue;

pub use debug_utils::DebugMessenger;
pub use logical_device::LogicalDevice;
pub use physical_device::PhysicalDevice;
pub use queue::Queue;
