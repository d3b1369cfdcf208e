//! Redundant state-change elimination

use thiserror::Error;

use super::pipeline_state::{PipelineState, MAX_BUFFER_SLOTS, MAX_TEXTURE_SLOTS};
use crate::render::api::{GraphicsApi, NativeBuffer, NativeProgram, NativeTexture};
use crate::render::resources::{Handle, Resource, ResourceTable};

/// State application errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    /// The requested state references a handle that no longer resolves to
    /// a resource usable in that binding
    #[error("pipeline state references dead or mismatched {0:?}")]
    UnresolvedHandle(Handle),
}

/// Resolved native identifiers for a validated snapshot
struct ResolvedState {
    program: Option<NativeProgram>,
    textures: [Option<NativeTexture>; MAX_TEXTURE_SLOTS],
    buffers: [Option<NativeBuffer>; MAX_BUFFER_SLOTS],
}

/// Tracks the last-applied pipeline state and issues only the diff
///
/// Application is atomic-or-nothing: every referenced handle is resolved
/// before the first native call, so a failed `apply` leaves both the
/// recorded state and the native state untouched.
pub struct StateTracker {
    current: PipelineState,
}

impl StateTracker {
    /// Tracker over a fresh context (everything unbound, default modes)
    pub fn new() -> Self {
        Self { current: PipelineState::default() }
    }

    /// The last successfully applied state
    pub fn current(&self) -> &PipelineState {
        &self.current
    }

    /// Make the native state match `desired`
    ///
    /// Calls are issued in a fixed order: program, texture slots
    /// ascending, buffer slots ascending, blend, depth, stencil. After a
    /// successful return the recorded state equals `desired` exactly.
    /// Never blocks.
    pub fn apply(
        &mut self,
        api: &mut dyn GraphicsApi,
        table: &ResourceTable,
        desired: &PipelineState,
    ) -> Result<(), StateError> {
        let resolved = Self::resolve_all(table, desired)?;

        if desired.program != self.current.program {
            match resolved.program {
                Some(native) => api.bind_program(native),
                None => api.unbind_program(),
            }
        }

        for slot in 0..MAX_TEXTURE_SLOTS {
            if desired.textures[slot] != self.current.textures[slot] {
                match resolved.textures[slot] {
                    Some(native) => api.bind_texture(slot as u32, native),
                    None => api.unbind_texture(slot as u32),
                }
            }
        }

        for slot in 0..MAX_BUFFER_SLOTS {
            if desired.buffers[slot] != self.current.buffers[slot] {
                match resolved.buffers[slot] {
                    Some(native) => api.bind_buffer(slot as u32, native),
                    None => api.unbind_buffer(slot as u32),
                }
            }
        }

        if desired.blend != self.current.blend {
            api.set_blend(desired.blend);
        }
        if desired.depth != self.current.depth {
            api.set_depth(desired.depth);
        }
        if desired.stencil != self.current.stencil {
            api.set_stencil(desired.stencil);
        }

        self.current = desired.clone();
        Ok(())
    }

    fn resolve_all(
        table: &ResourceTable,
        desired: &PipelineState,
    ) -> Result<ResolvedState, StateError> {
        let program = match desired.program {
            Some(handle) => match table.resolve(handle) {
                Ok(Resource::Program { native, .. }) => Some(*native),
                _ => return Err(StateError::UnresolvedHandle(handle)),
            },
            None => None,
        };

        let mut textures = [None; MAX_TEXTURE_SLOTS];
        for (slot, binding) in desired.textures.iter().enumerate() {
            if let Some(handle) = binding {
                match table.resolve(*handle) {
                    Ok(Resource::Texture { native, .. }) => textures[slot] = Some(*native),
                    _ => return Err(StateError::UnresolvedHandle(*handle)),
                }
            }
        }

        let mut buffers = [None; MAX_BUFFER_SLOTS];
        for (slot, binding) in desired.buffers.iter().enumerate() {
            if let Some(handle) = binding {
                match table.resolve(*handle) {
                    Ok(Resource::Buffer { native, .. }) => buffers[slot] = Some(*native),
                    _ => return Err(StateError::UnresolvedHandle(*handle)),
                }
            }
        }

        Ok(ResolvedState { program, textures, buffers })
    }
}

impl Default for StateTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::api::recording::{ApiCall, RecordingApi};
    use crate::render::api::{
        BlendMode, BufferUsage, DepthMode, PixelFormat, ShaderStage, TextureDesc,
    };
    use crate::render::resources::ResourceDescriptor;
    use crate::render::shaders::{ProgramCache, ShaderSource};

    struct Fixture {
        api: RecordingApi,
        table: ResourceTable,
        tracker: StateTracker,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                api: RecordingApi::new(),
                table: ResourceTable::new(),
                tracker: StateTracker::new(),
            }
        }

        fn make_program(&mut self) -> Handle {
            let mut cache = ProgramCache::new(8);
            let sources = [
                ShaderSource::new(ShaderStage::Vertex, "void main() {}"),
                ShaderSource::new(ShaderStage::Fragment, "void main() {}"),
            ];
            cache
                .get_or_compile(&mut self.api, &mut self.table, &sources)
                .expect("link failed")
                .handle()
        }

        fn make_texture(&mut self) -> Handle {
            let desc = TextureDesc { width: 2, height: 2, format: PixelFormat::Rgba8 };
            self.table
                .create(&mut self.api, &ResourceDescriptor::Texture { desc })
                .expect("texture create failed")
        }

        fn make_buffer(&mut self) -> Handle {
            self.table
                .create(
                    &mut self.api,
                    &ResourceDescriptor::Buffer { size: 64, usage: BufferUsage::Static },
                )
                .expect("buffer create failed")
        }
    }

    #[test]
    fn reapplying_the_same_state_issues_zero_calls() {
        let mut fx = Fixture::new();
        let program = fx.make_program();
        let texture = fx.make_texture();
        let state = PipelineState::with_program(program)
            .with_texture(0, texture)
            .with_blend(BlendMode::Alpha);

        fx.tracker.apply(&mut fx.api, &fx.table, &state).unwrap();

        let mark = fx.api.mark();
        fx.tracker.apply(&mut fx.api, &fx.table, &state).unwrap();
        assert_eq!(fx.api.state_changes_since(mark), 0);
    }

    #[test]
    fn diff_covers_only_changed_bindings() {
        let mut fx = Fixture::new();
        let program = fx.make_program();
        let texture_a = fx.make_texture();
        let texture_b = fx.make_texture();

        let first = PipelineState::with_program(program).with_texture(0, texture_a);
        fx.tracker.apply(&mut fx.api, &fx.table, &first).unwrap();

        let second = PipelineState::with_program(program).with_texture(0, texture_b);
        let mark = fx.api.mark();
        fx.tracker.apply(&mut fx.api, &fx.table, &second).unwrap();

        // Program unchanged: only the texture rebind goes out
        assert_eq!(fx.api.state_changes_since(mark), 1);
        assert!(matches!(
            fx.api.calls_since(mark)[0],
            ApiCall::BindTexture { slot: 0, .. }
        ));
    }

    #[test]
    fn calls_are_issued_in_the_documented_order() {
        let mut fx = Fixture::new();
        let program = fx.make_program();
        let tex0 = fx.make_texture();
        let tex3 = fx.make_texture();
        let buf0 = fx.make_buffer();
        let buf2 = fx.make_buffer();

        let state = PipelineState::with_program(program)
            .with_texture(3, tex3)
            .with_texture(0, tex0)
            .with_buffer(2, buf2)
            .with_buffer(0, buf0)
            .with_blend(BlendMode::Additive)
            .with_depth(DepthMode::ReadOnly);

        let mark = fx.api.mark();
        fx.tracker.apply(&mut fx.api, &fx.table, &state).unwrap();

        let order: Vec<&ApiCall> = fx
            .api
            .calls_since(mark)
            .iter()
            .filter(|c| c.is_state_change())
            .collect();
        assert!(matches!(order[0], ApiCall::BindProgram(_)));
        assert!(matches!(order[1], ApiCall::BindTexture { slot: 0, .. }));
        assert!(matches!(order[2], ApiCall::BindTexture { slot: 3, .. }));
        assert!(matches!(order[3], ApiCall::BindBuffer { slot: 0, .. }));
        assert!(matches!(order[4], ApiCall::BindBuffer { slot: 2, .. }));
        assert!(matches!(order[5], ApiCall::SetBlend(BlendMode::Additive)));
        assert!(matches!(order[6], ApiCall::SetDepth(DepthMode::ReadOnly)));
    }

    #[test]
    fn released_handle_fails_and_leaves_state_untouched() {
        let mut fx = Fixture::new();
        let program = fx.make_program();
        let texture = fx.make_texture();

        let first = PipelineState::with_program(program).with_texture(0, texture);
        fx.tracker.apply(&mut fx.api, &fx.table, &first).unwrap();

        fx.table.release(&mut fx.api, texture);
        let second = first.clone().with_blend(BlendMode::Alpha);

        let mark = fx.api.mark();
        let err = fx.tracker.apply(&mut fx.api, &fx.table, &second).unwrap_err();
        assert_eq!(err, StateError::UnresolvedHandle(texture));
        assert_eq!(fx.api.state_changes_since(mark), 0);
        assert_eq!(fx.tracker.current(), &first);
    }

    #[test]
    fn unbinding_a_slot_issues_an_unbind_call() {
        let mut fx = Fixture::new();
        let program = fx.make_program();
        let texture = fx.make_texture();

        let bound = PipelineState::with_program(program).with_texture(1, texture);
        fx.tracker.apply(&mut fx.api, &fx.table, &bound).unwrap();

        let unbound = PipelineState::with_program(program);
        let mark = fx.api.mark();
        fx.tracker.apply(&mut fx.api, &fx.table, &unbound).unwrap();

        assert_eq!(
            fx.api.calls_since(mark),
            &[ApiCall::UnbindTexture { slot: 1 }]
        );
    }

    #[test]
    fn wrong_resource_kind_counts_as_unresolved() {
        let mut fx = Fixture::new();
        let buffer = fx.make_buffer();

        // A buffer handle in a texture slot never resolves for that binding
        let state = PipelineState::default().with_texture(0, buffer);
        let err = fx.tracker.apply(&mut fx.api, &fx.table, &state).unwrap_err();
        assert_eq!(err, StateError::UnresolvedHandle(buffer));
    }
}
