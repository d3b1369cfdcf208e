//! # Rendering core
//!
//! The GPU resource and render-pipeline management layer: object lifetime
//! across the CPU/GPU boundary, state-change minimization, shader program
//! lifecycle, and frame orchestration.
//!
//! ## Architecture
//!
//! - **`resources`**: generation-checked handle table owning every
//!   GPU-backed object
//! - **`shaders`**: content-addressed program cache with LRU eviction
//! - **`state`**: pipeline state diffing against the last-applied state
//! - **`frame`**: the per-frame state machine and draw submission
//! - **`api`**: the graphics backend boundary (OpenGL in production, a
//!   recording backend under test)
//!
//! All of it runs on one render thread; the API object is the explicit
//! thread-affinity token (see [`api`]).

pub mod api;
pub mod frame;
pub mod resources;
pub mod shaders;
pub mod state;


use thiserror::Error;

pub use api::{
    BlendMode, BufferUsage, ClearFlags, DepthMode, FenceStatus, GlApi, GraphicsApi,
    NativeApiError, PixelFormat, Primitive, ShaderStage, StencilMode, TextureDesc, UniformKind,
};
pub use frame::{DrawCommand, FrameError, FramePhase, Renderer, UniformWrite};
pub use resources::{Handle, Resource, ResourceDescriptor, ResourceError, ResourceTable, UploadQueue};
pub use shaders::{ProgramCache, ProgramRef, ProgramReflection, ShaderError, ShaderSource};
pub use state::{PipelineState, StateError, StateTracker, MAX_BUFFER_SLOTS, MAX_TEXTURE_SLOTS};

/// Any rendering-core failure
///
/// Component errors convert into this for callers that drive the whole
/// core; each variant keeps the component error intact, diagnostics
/// included.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Resource table failure
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Shader build failure
    #[error(transparent)]
    Shader(#[from] ShaderError),

    /// State application failure
    #[error(transparent)]
    State(#[from] StateError),

    /// Frame lifecycle failure
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// Unclassified native failure
    #[error(transparent)]
    Native(#[from] NativeApiError),
}

/// Result type for rendering operations
pub type RenderResult<T> = Result<T, RenderError>;
