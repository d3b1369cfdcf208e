//! Resource descriptors and the stored resource representation

use crate::render::api::{
    BufferUsage, NativeBuffer, NativeProgram, NativeTexture, TextureDesc,
};
use crate::render::shaders::ProgramReflection;

/// Construction request for a table-owned resource
///
/// Programs have no descriptor: they are built and registered by the
/// shader program cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceDescriptor {
    /// A buffer of `size` bytes
    Buffer {
        /// Capacity in bytes
        size: usize,
        /// Upload frequency hint
        usage: BufferUsage,
    },
    /// A 2D texture
    Texture {
        /// Dimensions and pixel format
        desc: TextureDesc,
    },
}

/// A live GPU resource owned by the table
#[derive(Debug, Clone)]
pub enum Resource {
    /// Buffer object
    Buffer {
        /// Native identifier
        native: NativeBuffer,
        /// Capacity in bytes
        size: usize,
        /// Upload frequency hint
        usage: BufferUsage,
    },
    /// Texture object
    Texture {
        /// Native identifier
        native: NativeTexture,
        /// Dimensions and pixel format
        desc: TextureDesc,
    },
    /// Linked shader program
    Program {
        /// Native identifier
        native: NativeProgram,
        /// Uniform/attribute locations, fixed at link time
        reflection: ProgramReflection,
    },
}

impl Resource {
    /// Resource kind name for diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Buffer { .. } => "buffer",
            Self::Texture { .. } => "texture",
            Self::Program { .. } => "program",
        }
    }

    /// Upload capacity in bytes, if the resource accepts byte uploads
    pub fn byte_capacity(&self) -> Option<usize> {
        match self {
            Self::Buffer { size, .. } => Some(*size),
            Self::Texture { desc, .. } => Some(desc.byte_size()),
            Self::Program { .. } => None,
        }
    }
}
