//! Draw commands recorded into a frame

use crate::render::api::{Primitive, UniformKind};
use crate::render::state::PipelineState;

/// A uniform value as a raw byte span
///
/// Math collaborator types are consumed opaquely: callers serialize a
/// matrix or vector to bytes (`bytemuck` or equivalent) and tag the span
/// with its kind.
#[derive(Debug, Clone)]
pub struct UniformWrite {
    /// Uniform location from the program's reflection data
    pub location: i32,
    /// Value type tag
    pub kind: UniformKind,
    /// Raw value bytes; length must equal `kind.byte_len()`
    pub bytes: Vec<u8>,
}

impl UniformWrite {
    /// Tag `bytes` as a `kind` value for `location`
    pub fn new(location: i32, kind: UniformKind, bytes: impl Into<Vec<u8>>) -> Self {
        Self { location, kind, bytes: bytes.into() }
    }
}

/// One draw submission: required pipeline state plus a vertex range
#[derive(Debug, Clone)]
pub struct DrawCommand {
    /// Pipeline state the draw requires
    pub state: PipelineState,
    /// Primitive topology
    pub primitive: Primitive,
    /// First vertex index
    pub first_vertex: u32,
    /// Number of vertices
    pub vertex_count: u32,
    /// Uniform writes applied after state, before the draw
    pub uniforms: Vec<UniformWrite>,
}

impl DrawCommand {
    /// Triangles over `[0, vertex_count)` with the given state
    pub fn new(state: PipelineState, vertex_count: u32) -> Self {
        Self {
            state,
            primitive: Primitive::Triangles,
            first_vertex: 0,
            vertex_count,
            uniforms: Vec::new(),
        }
    }

    /// Change the primitive topology
    pub fn with_primitive(mut self, primitive: Primitive) -> Self {
        self.primitive = primitive;
        self
    }

    /// Draw `[first_vertex, first_vertex + vertex_count)`
    pub fn with_range(mut self, first_vertex: u32, vertex_count: u32) -> Self {
        self.first_vertex = first_vertex;
        self.vertex_count = vertex_count;
        self
    }

    /// Attach a uniform write
    pub fn with_uniform(mut self, uniform: UniformWrite) -> Self {
        self.uniforms.push(uniform);
        self
    }
}
