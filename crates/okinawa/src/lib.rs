//! # Okinawa
//!
//! A GPU resource and render-pipeline management core over GLFW and
//! OpenGL.
//!
//! ## Features
//!
//! - **Generation-checked handles**: stale references to recycled GPU
//!   objects fail to resolve instead of aliasing the replacement
//! - **Shader program cache**: content-addressed deduplication with LRU
//!   eviction and reference-counted lifetimes
//! - **State tracking**: redundant graphics-API state transitions are
//!   diffed away, in a deterministic order
//! - **Frame orchestration**: an explicit begin/record/end state machine
//!   with a defined drain point for cross-thread uploads
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use okinawa::prelude::*;
//!
//! fn main() -> Result<(), EngineError> {
//!     env_logger::init();
//!
//!     let config = EngineConfig::default();
//!     let engine = Engine::new(config)?;
//!     engine.run(
//!         |_dt| { /* step */ },
//!         |_renderer, _dt| { /* record draw commands */ Ok(()) },
//!     )
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod assets;
pub mod context;
pub mod core;
pub mod render;

pub use self::core::{Engine, EngineError};

/// Common imports for engine users
pub mod prelude {
    pub use crate::assets::{AssetError, ImageData};
    pub use crate::context::{GlfwSurface, RenderSurface};
    pub use crate::core::config::{
        Config, EngineConfig, GraphicsConfig, ShaderConfig, WindowConfig,
    };
    pub use crate::core::{Engine, EngineError};
    pub use crate::render::{
        BlendMode, BufferUsage, DepthMode, DrawCommand, Handle, PipelineState, PixelFormat,
        Primitive, ProgramRef, RenderError, RenderResult, Renderer, ResourceDescriptor,
        ShaderSource, ShaderStage, StencilMode, TextureDesc, UniformKind, UniformWrite,
    };
}
