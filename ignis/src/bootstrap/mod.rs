pub mod instance;
pub mod logical_device;
pub mod physical_device;
pub mod swapchain;

pub use instance::InstanceBuilder;
pub use logical_device::LogicalDeviceBuilder;
pub use physical_device::{PhysicalDeviceSelector, SelectedDevice};
pub use swapchain::SwapchainBuilder;
