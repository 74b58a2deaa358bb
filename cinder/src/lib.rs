pub mod context;
pub mod draw;
pub mod effects;
pub mod frame;
pub mod mesh;
pub mod overlay;
pub mod swapchain;
pub mod textures;

pub use context::Engine;
