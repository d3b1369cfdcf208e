//! Graphics API boundary
//!
//! This module defines the trait that graphics backends must implement
//! to provide a consistent interface for the resource table, the program
//! cache, the state tracker and the frame renderer. All native error codes
//! are translated to [`NativeApiError`] at this boundary.
//!
//! The API object doubles as the render-thread ownership token: it is not
//! `Send`, it can only be constructed from a current context, and every
//! operation that touches the graphics API takes it explicitly as
//! `&mut dyn GraphicsApi`.

mod gl_api;
mod graphics_api;

pub use gl_api::GlApi;
pub use graphics_api::{
    BlendMode, BufferUsage, ClearFlags, DepthMode, FenceStatus, GraphicsApi, NativeApiError,
    NativeBuffer, NativeProgram, NativeShader, NativeTexture, PixelFormat, Primitive, ShaderStage,
    StencilMode, TextureDesc, UniformKind,
};

#[cfg(test)]
pub(crate) mod recording;
