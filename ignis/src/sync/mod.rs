pub mod binary_semaphore;
pub mod fence;

pub use binary_semaphore::BinarySemaphore;
pub use fence::Fence;
