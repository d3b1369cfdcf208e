//! Backend trait and wire-level types shared by all graphics backends

use std::time::Duration;

use bitflags::bitflags;
use thiserror::Error;

use crate::render::shaders::ProgramReflection;

/// Native buffer object identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeBuffer(pub u32);

/// Native texture object identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeTexture(pub u32);

/// Native shader stage object identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeShader(pub u32);

/// Native linked program identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeProgram(pub u32);

/// Unclassified graphics API failure, carrying the raw error code
///
/// Escalated to the caller with no local recovery; retrying a native call
/// without understanding the cause risks corrupting GPU state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("graphics API error 0x{code:04x} during {context}")]
pub struct NativeApiError {
    /// Raw error code reported by the native API
    pub code: u32,
    /// Operation that observed the failure
    pub context: &'static str,
}

/// Upload frequency hint for buffer resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferUsage {
    /// Written once, read many times
    Static,
    /// Rewritten occasionally
    Dynamic,
    /// Rewritten every frame; uploads are deferred so they never stall
    /// the render loop
    Streaming,
}

/// Pixel layout of texture data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 8-bit RGB, tightly packed
    Rgb8,
    /// 8-bit RGBA, tightly packed
    Rgba8,
}

impl PixelFormat {
    /// Bytes per pixel for this format
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgb8 => 3,
            Self::Rgba8 => 4,
        }
    }
}

/// Dimensions and format of a texture resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureDesc {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Pixel layout
    pub format: PixelFormat,
}

impl TextureDesc {
    /// Total byte size of one full image at these dimensions
    pub fn byte_size(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }
}

/// Shader pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ShaderStage {
    /// Vertex stage
    Vertex,
    /// Fragment stage
    Fragment,
}

impl ShaderStage {
    /// Human-readable stage name for diagnostics
    pub fn name(self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
        }
    }
}

/// Framebuffer blend mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendMode {
    /// Blending disabled; source overwrites destination
    #[default]
    Disabled,
    /// Standard alpha blending (src_alpha, one_minus_src_alpha)
    Alpha,
    /// Additive blending (one, one)
    Additive,
    /// Multiplicative blending (dst_color, zero)
    Multiply,
}

/// Depth test/write mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DepthMode {
    /// Depth test disabled
    Disabled,
    /// Test against the depth buffer without writing it
    ReadOnly,
    /// Test and write
    #[default]
    ReadWrite,
}

/// Stencil mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StencilMode {
    /// Stencil test disabled
    #[default]
    Disabled,
    /// Always pass, replacing the stencil value with the reference
    Write(u8),
    /// Pass only where the stencil value equals the reference
    Test(u8),
}

/// Primitive topology for draw submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Primitive {
    /// Independent triangles
    #[default]
    Triangles,
    /// Triangle strip
    TriangleStrip,
    /// Independent line segments
    Lines,
    /// Points
    Points,
}

/// Type tag for a uniform byte span
///
/// Math collaborator values arrive as raw bytes; the tag tells the backend
/// which native upload call to issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformKind {
    /// Single f32 (4 bytes)
    Float,
    /// Single i32 (4 bytes); also used for sampler slot indices
    Int,
    /// vec2 (8 bytes)
    Vec2,
    /// vec3 (12 bytes)
    Vec3,
    /// vec4 (16 bytes)
    Vec4,
    /// Column-major 4x4 matrix (64 bytes)
    Mat4,
}

impl UniformKind {
    /// Required byte-span length for this kind
    pub fn byte_len(self) -> usize {
        match self {
            Self::Float | Self::Int => 4,
            Self::Vec2 => 8,
            Self::Vec3 => 12,
            Self::Vec4 => 16,
            Self::Mat4 => 64,
        }
    }
}

bitflags! {
    /// Framebuffer aspects affected by [`GraphicsApi::clear`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClearFlags: u32 {
        /// Color attachment
        const COLOR = 1 << 0;
        /// Depth attachment
        const DEPTH = 1 << 1;
        /// Stencil attachment
        const STENCIL = 1 << 2;
    }
}

/// Outcome of a bounded GPU wait
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FenceStatus {
    /// All prior commands completed within the timeout
    #[default]
    Signaled,
    /// The timeout elapsed first
    TimedOut,
}

/// Graphics backend contract
///
/// Native calls are synchronous-returning; failures carry an error code or
/// a compiler/linker log. Implementations are thread-affine and must only
/// be driven from the render thread.
pub trait GraphicsApi {
    // --- resource construction ---

    /// Allocate a buffer of `size` bytes with the given usage hint
    fn create_buffer(&mut self, size: usize, usage: BufferUsage)
        -> Result<NativeBuffer, NativeApiError>;

    /// Copy `bytes` into `buffer` starting at `offset`
    ///
    /// Bounds are validated by the resource table before this is reached.
    fn write_buffer(
        &mut self,
        buffer: NativeBuffer,
        offset: usize,
        bytes: &[u8],
    ) -> Result<(), NativeApiError>;

    /// Destroy a buffer object
    fn destroy_buffer(&mut self, buffer: NativeBuffer);

    /// Allocate texture storage for `desc`
    fn create_texture(&mut self, desc: &TextureDesc) -> Result<NativeTexture, NativeApiError>;

    /// Upload one full image worth of pixels to `texture`
    fn write_texture(
        &mut self,
        texture: NativeTexture,
        desc: &TextureDesc,
        pixels: &[u8],
    ) -> Result<(), NativeApiError>;

    /// Destroy a texture object
    fn destroy_texture(&mut self, texture: NativeTexture);

    // --- shader construction ---

    /// Compile a single stage; `Err` carries the full compiler log
    fn compile_stage(&mut self, stage: ShaderStage, source: &str)
        -> Result<NativeShader, String>;

    /// Destroy a compiled stage object
    fn destroy_stage(&mut self, shader: NativeShader);

    /// Link compiled stages into a program; `Err` carries the linker log
    fn link_program(&mut self, stages: &[NativeShader]) -> Result<NativeProgram, String>;

    /// Destroy a linked program
    fn destroy_program(&mut self, program: NativeProgram);

    /// Query uniform/attribute locations of a successfully linked program
    fn program_reflection(
        &mut self,
        program: NativeProgram,
    ) -> Result<ProgramReflection, NativeApiError>;

    // --- pipeline state ---

    /// Bind `program` for subsequent draws
    fn bind_program(&mut self, program: NativeProgram);

    /// Unbind the current program
    fn unbind_program(&mut self);

    /// Bind `texture` to texture unit `slot`
    fn bind_texture(&mut self, slot: u32, texture: NativeTexture);

    /// Clear the binding of texture unit `slot`
    fn unbind_texture(&mut self, slot: u32);

    /// Bind `buffer` to indexed binding point `slot`
    fn bind_buffer(&mut self, slot: u32, buffer: NativeBuffer);

    /// Clear indexed binding point `slot`
    fn unbind_buffer(&mut self, slot: u32);

    /// Set the framebuffer blend mode
    fn set_blend(&mut self, mode: BlendMode);

    /// Set the depth test/write mode
    fn set_depth(&mut self, mode: DepthMode);

    /// Set the stencil mode
    fn set_stencil(&mut self, mode: StencilMode);

    // --- frame operations ---

    /// Resize the viewport to the drawable size
    fn set_viewport(&mut self, width: u32, height: u32);

    /// Clear the selected framebuffer aspects
    fn clear(&mut self, flags: ClearFlags, color: [f32; 4]);

    /// Write a uniform value from a raw byte span
    ///
    /// The span length must match `kind.byte_len()`.
    fn set_uniform(
        &mut self,
        location: i32,
        kind: UniformKind,
        bytes: &[u8],
    ) -> Result<(), NativeApiError>;

    /// Submit a non-indexed draw over `[first_vertex, first_vertex + vertex_count)`
    fn draw(&mut self, primitive: Primitive, first_vertex: u32, vertex_count: u32);

    /// Flush queued commands to the GPU without waiting
    fn flush(&mut self);

    /// Insert a fence and wait for it, bounded by `timeout`
    fn wait_gpu(&mut self, timeout: Duration) -> Result<FenceStatus, NativeApiError>;

    // --- downcasts ---

    /// Downcast to the concrete backend type
    fn as_any(&self) -> &dyn std::any::Any;

    /// Downcast to the mutable concrete backend type
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_kind_byte_lengths_match_gl_sizes() {
        assert_eq!(UniformKind::Float.byte_len(), 4);
        assert_eq!(UniformKind::Vec3.byte_len(), 12);
        assert_eq!(UniformKind::Mat4.byte_len(), 64);
    }

    #[test]
    fn texture_desc_byte_size_accounts_for_format() {
        let rgb = TextureDesc { width: 4, height: 4, format: PixelFormat::Rgb8 };
        let rgba = TextureDesc { width: 4, height: 4, format: PixelFormat::Rgba8 };
        assert_eq!(rgb.byte_size(), 48);
        assert_eq!(rgba.byte_size(), 64);
    }
}
