pub mod command_buffer;
pub mod command_pool;

pub use command_buffer::{
    CmdBuffer, CommandBuffer, CommandBufferExecutable, CommandBufferRecording,
};
pub use command_pool::CommandPool;
