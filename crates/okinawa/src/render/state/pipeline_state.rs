//! The pipeline state snapshot

use crate::render::api::{BlendMode, DepthMode, StencilMode};
use crate::render::resources::Handle;

/// Texture units the tracker manages
pub const MAX_TEXTURE_SLOTS: usize = 8;

/// Indexed buffer binding points the tracker manages
pub const MAX_BUFFER_SLOTS: usize = 4;

/// Everything that affects the next draw call, as a plain value
///
/// Compared structurally. Handle equality is enough to prove two states
/// bind the same native object: generations guarantee a handle never
/// aliases a recreated resource.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PipelineState {
    /// Bound program, if any
    pub program: Option<Handle>,
    /// Per-unit texture bindings
    pub textures: [Option<Handle>; MAX_TEXTURE_SLOTS],
    /// Per-point buffer bindings
    pub buffers: [Option<Handle>; MAX_BUFFER_SLOTS],
    /// Blend mode
    pub blend: BlendMode,
    /// Depth mode
    pub depth: DepthMode,
    /// Stencil mode
    pub stencil: StencilMode,
}

impl PipelineState {
    /// Snapshot with `program` bound and everything else at defaults
    pub fn with_program(program: Handle) -> Self {
        Self { program: Some(program), ..Self::default() }
    }

    /// Bind `texture` at `slot`
    ///
    /// Panics if `slot` is outside the tracked range; slot indices are
    /// fixed at build time.
    pub fn with_texture(mut self, slot: usize, texture: Handle) -> Self {
        assert!(slot < MAX_TEXTURE_SLOTS, "texture slot {slot} out of range");
        self.textures[slot] = Some(texture);
        self
    }

    /// Bind `buffer` at `slot`
    ///
    /// Panics if `slot` is outside the tracked range.
    pub fn with_buffer(mut self, slot: usize, buffer: Handle) -> Self {
        assert!(slot < MAX_BUFFER_SLOTS, "buffer slot {slot} out of range");
        self.buffers[slot] = Some(buffer);
        self
    }

    /// Set the blend mode
    pub fn with_blend(mut self, blend: BlendMode) -> Self {
        self.blend = blend;
        self
    }

    /// Set the depth mode
    pub fn with_depth(mut self, depth: DepthMode) -> Self {
        self.depth = depth;
        self
    }

    /// Set the stencil mode
    pub fn with_stencil(mut self, stencil: StencilMode) -> Self {
        self.stencil = stencil;
        self
    }

    /// Iterate over every handle the snapshot references
    pub fn referenced_handles(&self) -> impl Iterator<Item = Handle> + '_ {
        self.program
            .into_iter()
            .chain(self.textures.iter().copied().flatten())
            .chain(self.buffers.iter().copied().flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_equality_covers_every_field() {
        let handle = Handle::new(0, 0);
        let base = PipelineState::with_program(handle);
        assert_eq!(base, base.clone());
        assert_ne!(base, base.clone().with_blend(BlendMode::Alpha));
        assert_ne!(base, base.clone().with_texture(2, handle));
    }

    #[test]
    fn referenced_handles_walks_program_textures_and_buffers() {
        let program = Handle::new(0, 0);
        let texture = Handle::new(1, 0);
        let buffer = Handle::new(2, 0);
        let state = PipelineState::with_program(program)
            .with_texture(3, texture)
            .with_buffer(1, buffer);

        let handles: Vec<_> = state.referenced_handles().collect();
        assert_eq!(handles, vec![program, texture, buffer]);
    }

    #[test]
    #[should_panic(expected = "texture slot")]
    fn out_of_range_texture_slot_panics() {
        let _ = PipelineState::default().with_texture(MAX_TEXTURE_SLOTS, Handle::new(0, 0));
    }
}
