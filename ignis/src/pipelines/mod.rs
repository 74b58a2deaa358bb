pub mod compute;
pub mod graphics;
pub mod pipeline;
pub mod pipeline_layout;

pub use compute::ComputePipelineBuilder;
pub use graphics::GraphicsPipelineBuilder;
pub use pipeline::Pipeline;
pub use pipeline_layout::{PipelineLayout, PipelineLayoutBuilder};
