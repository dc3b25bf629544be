pub mod passes;
pub mod renderer;
pub mod shaders;
pub mod targets;
pub mod uniforms;

pub use passes::*;
pub use renderer::*;
pub use shaders::{ShaderError, source_for, validate};
pub use targets::*;
pub use uniforms::*;
