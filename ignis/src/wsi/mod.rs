/// Utilities relating to wsi and swapchain
pub mod surface;
pub mod swapchain;

pub use surface::Surface;
pub use swapchain::Swapchain;
