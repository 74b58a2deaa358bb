pub mod shader;

pub use shader::Shader;
