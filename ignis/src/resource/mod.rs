pub mod buffer;
pub mod image;
pub mod image_view;
pub mod sampler;

pub use buffer::{Buffer, BufferCreateInfo};
pub use image::{Image, ImageCreateInfo};
pub use image_view::ImageView;
pub use sampler::Sampler;
