//! The frame renderer

use std::time::Duration;

use thiserror::Error;

use super::commands::DrawCommand;
use crate::context::RenderSurface;
use crate::core::config::GraphicsConfig;
use crate::render::api::{ClearFlags, FenceStatus, GraphicsApi, NativeApiError};
use crate::render::resources::{
    Handle, Resource, ResourceDescriptor, ResourceError, ResourceTable, UploadQueue,
};
use crate::render::shaders::{ProgramCache, ProgramRef, ProgramReflection, ShaderError, ShaderSource};
use crate::render::state::{StateError, StateTracker};

/// Frame lifecycle errors
#[derive(Debug, Error)]
pub enum FrameError {
    /// `begin_frame` while a frame was already in progress
    #[error("a frame is already in progress")]
    AlreadyInFrame,

    /// `record` or `end_frame` with no frame in progress
    #[error("no frame is in progress")]
    NoActiveFrame,

    /// A bounded GPU wait ran out
    #[error("GPU wait exceeded {timeout:?}")]
    Timeout {
        /// The configured bound
        timeout: Duration,
    },

    /// State application failure
    #[error(transparent)]
    State(#[from] StateError),

    /// Native failure during frame work
    #[error(transparent)]
    Native(#[from] NativeApiError),
}

/// Frame state machine phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePhase {
    /// Between frames
    Idle,
    /// `begin_frame` ran, nothing recorded yet
    Begun,
    /// At least one draw recorded
    Recording,
    /// Presentation in progress; cannot be cancelled
    Submitted,
}

/// Owns the graphics API object and the render core's components,
/// sequencing each frame
///
/// The renderer is confined to the render thread: the boxed API object is
/// the thread-affinity token, obtained from a current context, and the
/// renderer inherits its `!Send`.
pub struct Renderer {
    api: Box<dyn GraphicsApi>,
    resources: ResourceTable,
    programs: ProgramCache,
    tracker: StateTracker,
    phase: FramePhase,
    frame_index: u64,
    clear_color: [f32; 4],
    gpu_wait_timeout: Duration,
    panic_on_misuse: bool,
}

impl Renderer {
    /// Build a renderer over an API object
    pub fn new(api: Box<dyn GraphicsApi>, config: &GraphicsConfig) -> Self {
        Self {
            api,
            resources: ResourceTable::new(),
            programs: ProgramCache::new(config.max_resident_programs),
            tracker: StateTracker::new(),
            phase: FramePhase::Idle,
            frame_index: 0,
            clear_color: config.clear_color,
            gpu_wait_timeout: Duration::from_millis(config.gpu_wait_timeout_ms),
            panic_on_misuse: config.panic_on_frame_misuse,
        }
    }

    /// Current frame phase
    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    /// Frames begun since construction
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// The backend, for advanced operations and downcasts
    pub fn api(&self) -> &dyn GraphicsApi {
        self.api.as_ref()
    }

    /// The mutable backend
    pub fn api_mut(&mut self) -> &mut dyn GraphicsApi {
        self.api.as_mut()
    }

    // --- resource operations (render thread only) ---

    /// Create a buffer or texture resource
    pub fn create_resource(
        &mut self,
        descriptor: &ResourceDescriptor,
    ) -> Result<Handle, ResourceError> {
        self.resources.create(self.api.as_mut(), descriptor)
    }

    /// Release a resource; a stale handle is a no-op
    pub fn release_resource(&mut self, handle: Handle) {
        self.resources.release(self.api.as_mut(), handle);
    }

    /// Look up a live resource
    pub fn resolve(&self, handle: Handle) -> Result<&Resource, ResourceError> {
        self.resources.resolve(handle)
    }

    /// Copy bytes into a resource
    ///
    /// Uploads issued during `Recording` are visible to draws recorded
    /// later in the same frame and never to draws of an earlier frame.
    pub fn upload(
        &mut self,
        handle: Handle,
        bytes: &[u8],
        offset: usize,
    ) -> Result<(), ResourceError> {
        self.resources.upload(self.api.as_mut(), handle, bytes, offset)
    }

    /// Submission endpoint for worker threads; drained in `begin_frame`
    pub fn uploader(&self) -> UploadQueue {
        self.resources.uploader()
    }

    /// Get or build the program for the given stage sources
    pub fn get_or_compile(
        &mut self,
        sources: &[ShaderSource],
    ) -> Result<ProgramRef, ShaderError> {
        self.programs
            .get_or_compile(self.api.as_mut(), &mut self.resources, sources)
    }

    /// Reflection data of a linked program handle
    pub fn reflection(&self, handle: Handle) -> Option<&ProgramReflection> {
        match self.resources.resolve(handle) {
            Ok(Resource::Program { reflection, .. }) => Some(reflection),
            _ => None,
        }
    }

    // --- frame lifecycle ---

    /// Open a frame: drain queued uploads, run cache maintenance, clear
    pub fn begin_frame(&mut self, surface: &mut dyn RenderSurface) -> Result<(), FrameError> {
        if self.phase != FramePhase::Idle {
            return Err(self.misuse(FrameError::AlreadyInFrame));
        }
        self.phase = FramePhase::Begun;
        self.frame_index += 1;

        surface.make_current();
        let (width, height) = surface.framebuffer_size();
        self.api.set_viewport(width, height);

        // The defined drain point for cross-thread and deferred uploads
        self.resources.drain_pending(self.api.as_mut());
        self.resources.flush_deferred(self.api.as_mut());
        self.programs.maintain(self.api.as_mut(), &mut self.resources);

        self.api.clear(
            ClearFlags::COLOR | ClearFlags::DEPTH | ClearFlags::STENCIL,
            self.clear_color,
        );
        log::trace!("frame {} begun", self.frame_index);
        Ok(())
    }

    /// Record one draw: apply its state, write its uniforms, submit
    pub fn record(&mut self, command: &DrawCommand) -> Result<(), FrameError> {
        match self.phase {
            FramePhase::Begun | FramePhase::Recording => {}
            _ => return Err(self.misuse(FrameError::NoActiveFrame)),
        }
        self.phase = FramePhase::Recording;

        // Streaming copies staged earlier in the frame become visible here
        self.resources.flush_deferred(self.api.as_mut());

        self.tracker
            .apply(self.api.as_mut(), &self.resources, &command.state)?;
        for uniform in &command.uniforms {
            self.api
                .set_uniform(uniform.location, uniform.kind, &uniform.bytes)?;
        }
        self.api
            .draw(command.primitive, command.first_vertex, command.vertex_count);
        Ok(())
    }

    /// Close the frame and present
    ///
    /// Once presentation starts the frame cannot be cancelled.
    pub fn end_frame(&mut self, surface: &mut dyn RenderSurface) -> Result<(), FrameError> {
        match self.phase {
            FramePhase::Begun | FramePhase::Recording => {}
            _ => return Err(self.misuse(FrameError::NoActiveFrame)),
        }
        self.phase = FramePhase::Submitted;

        self.api.flush();
        surface.swap_buffers();

        self.phase = FramePhase::Idle;
        log::trace!("frame {} presented", self.frame_index);
        Ok(())
    }

    /// Wait for all submitted GPU work, bounded by the configured timeout
    pub fn wait_gpu(&mut self) -> Result<(), FrameError> {
        match self.api.wait_gpu(self.gpu_wait_timeout)? {
            FenceStatus::Signaled => Ok(()),
            FenceStatus::TimedOut => Err(FrameError::Timeout { timeout: self.gpu_wait_timeout }),
        }
    }

    /// Release everything the renderer owns
    ///
    /// Safe to call more than once; `Drop` calls it as well.
    pub fn shutdown(&mut self) {
        self.programs.clear(self.api.as_mut(), &mut self.resources);
        self.resources.clear(self.api.as_mut());
        self.tracker = StateTracker::new();
        self.phase = FramePhase::Idle;
    }

    fn misuse(&self, err: FrameError) -> FrameError {
        if self.panic_on_misuse {
            panic!("frame state machine misuse: {err}");
        }
        log::error!("frame state machine misuse: {err}");
        err
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
