use std::sync::PoisonError;

use ash::vk;
/// Possible errors
use thiserror::Error;

#[derive(Debug, Error, Copy, Clone, PartialEq, Eq, Hash)]
pub enum IgnisError {
    #[error("Poisoned mutex")]
    Poisoned,

    #[error("No suitable physical device has been found")]
    NoPhysicalDevice,

    #[error("No queue family matches the requested capabilities")]
    NoSuitableQueue,

    #[error("Surface offers none of the requested formats")]
    NoSurfaceFormat,

    #[error("Surface offers none of the requested present modes")]
    NoPresentMode,

    #[error("Surface details were not queried ahead of time")]
    NoQuery,

    #[error("Descriptor pool is exhausted and cannot grow further")]
    DescriptorPoolExhausted,

    #[error("String contains null byte")]
    StringContainsNull,

    #[error(transparent)]
    VkError(#[from] vk::Result),
}

impl<T> From<PoisonError<T>> for IgnisError {
    fn from(_: PoisonError<T>) -> Self {
        IgnisError::Poisoned
    }
}
