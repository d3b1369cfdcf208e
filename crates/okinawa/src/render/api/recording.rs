//! Recording backend for tests
//!
//! Implements [`GraphicsApi`] without a GPU: every call is appended to a
//! log, object identifiers are handed out from a counter, and individual
//! operations can be made to fail. Tests assert on the log to verify call
//! ordering, redundancy elimination, and compile-counter properties.

use std::collections::HashSet;
use std::time::Duration;

use super::graphics_api::{
    BlendMode, BufferUsage, ClearFlags, DepthMode, FenceStatus, GraphicsApi, NativeApiError,
    NativeBuffer, NativeProgram, NativeShader, NativeTexture, Primitive, ShaderStage, StencilMode,
    TextureDesc, UniformKind,
};
use crate::render::shaders::ProgramReflection;

/// One recorded backend call
#[derive(Debug, Clone, PartialEq)]
pub enum ApiCall {
    CreateBuffer { size: usize, usage: BufferUsage },
    WriteBuffer { buffer: NativeBuffer, offset: usize, len: usize },
    DestroyBuffer(NativeBuffer),
    CreateTexture { desc: TextureDesc },
    WriteTexture { texture: NativeTexture, len: usize },
    DestroyTexture(NativeTexture),
    CompileStage(ShaderStage),
    DestroyStage(NativeShader),
    LinkProgram { stage_count: usize },
    DestroyProgram(NativeProgram),
    Reflect(NativeProgram),
    BindProgram(NativeProgram),
    UnbindProgram,
    BindTexture { slot: u32, texture: NativeTexture },
    UnbindTexture { slot: u32 },
    BindBuffer { slot: u32, buffer: NativeBuffer },
    UnbindBuffer { slot: u32 },
    SetBlend(BlendMode),
    SetDepth(DepthMode),
    SetStencil(StencilMode),
    SetViewport { width: u32, height: u32 },
    Clear { flags: ClearFlags },
    SetUniform { location: i32, kind: UniformKind },
    Draw { primitive: Primitive, first_vertex: u32, vertex_count: u32 },
    Flush,
    WaitGpu,
}

impl ApiCall {
    /// Whether this call mutates pipeline state (the category the state
    /// tracker is expected to minimize)
    pub fn is_state_change(&self) -> bool {
        matches!(
            self,
            Self::BindProgram(_)
                | Self::UnbindProgram
                | Self::BindTexture { .. }
                | Self::UnbindTexture { .. }
                | Self::BindBuffer { .. }
                | Self::UnbindBuffer { .. }
                | Self::SetBlend(_)
                | Self::SetDepth(_)
                | Self::SetStencil(_)
        )
    }
}

/// In-memory [`GraphicsApi`] with a call log and failure injection
#[derive(Default)]
pub struct RecordingApi {
    /// Every call issued against this backend, in order
    pub calls: Vec<ApiCall>,
    /// Stage-compile invocations
    pub compile_calls: usize,
    /// Program-link invocations
    pub link_calls: usize,
    /// Fail the next compile of this stage with the given log
    pub fail_compile: Option<(ShaderStage, String)>,
    /// Fail the next link with the given log
    pub fail_link: Option<String>,
    /// Fail the next buffer/texture creation
    pub fail_create: Option<NativeApiError>,
    /// Status reported by `wait_gpu`
    pub fence_status: FenceStatus,
    /// Reflection returned for any linked program
    pub reflection: ProgramReflection,
    live_buffers: HashSet<u32>,
    live_textures: HashSet<u32>,
    live_programs: HashSet<u32>,
    next_id: u32,
}

impl RecordingApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    /// Position marker into the call log
    pub fn mark(&self) -> usize {
        self.calls.len()
    }

    /// Calls recorded since `mark`
    pub fn calls_since(&self, mark: usize) -> &[ApiCall] {
        &self.calls[mark..]
    }

    /// Number of state-change calls recorded since `mark`
    pub fn state_changes_since(&self, mark: usize) -> usize {
        self.calls_since(mark).iter().filter(|c| c.is_state_change()).count()
    }

    /// Buffers created and not yet destroyed
    pub fn live_buffer_count(&self) -> usize {
        self.live_buffers.len()
    }

    /// Textures created and not yet destroyed
    pub fn live_texture_count(&self) -> usize {
        self.live_textures.len()
    }

    /// Programs linked and not yet destroyed
    pub fn live_program_count(&self) -> usize {
        self.live_programs.len()
    }
}

impl GraphicsApi for RecordingApi {
    fn create_buffer(
        &mut self,
        size: usize,
        usage: BufferUsage,
    ) -> Result<NativeBuffer, NativeApiError> {
        self.calls.push(ApiCall::CreateBuffer { size, usage });
        if let Some(err) = self.fail_create.take() {
            return Err(err);
        }
        let id = self.next_id();
        self.live_buffers.insert(id);
        Ok(NativeBuffer(id))
    }

    fn write_buffer(
        &mut self,
        buffer: NativeBuffer,
        offset: usize,
        bytes: &[u8],
    ) -> Result<(), NativeApiError> {
        self.calls.push(ApiCall::WriteBuffer { buffer, offset, len: bytes.len() });
        Ok(())
    }

    fn destroy_buffer(&mut self, buffer: NativeBuffer) {
        self.live_buffers.remove(&buffer.0);
        self.calls.push(ApiCall::DestroyBuffer(buffer));
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<NativeTexture, NativeApiError> {
        self.calls.push(ApiCall::CreateTexture { desc: *desc });
        if let Some(err) = self.fail_create.take() {
            return Err(err);
        }
        let id = self.next_id();
        self.live_textures.insert(id);
        Ok(NativeTexture(id))
    }

    fn write_texture(
        &mut self,
        texture: NativeTexture,
        _desc: &TextureDesc,
        pixels: &[u8],
    ) -> Result<(), NativeApiError> {
        self.calls.push(ApiCall::WriteTexture { texture, len: pixels.len() });
        Ok(())
    }

    fn destroy_texture(&mut self, texture: NativeTexture) {
        self.live_textures.remove(&texture.0);
        self.calls.push(ApiCall::DestroyTexture(texture));
    }

    fn compile_stage(
        &mut self,
        stage: ShaderStage,
        _source: &str,
    ) -> Result<NativeShader, String> {
        self.calls.push(ApiCall::CompileStage(stage));
        self.compile_calls += 1;
        if let Some((failing_stage, log)) = self.fail_compile.clone() {
            if failing_stage == stage {
                self.fail_compile = None;
                return Err(log);
            }
        }
        let id = self.next_id();
        Ok(NativeShader(id))
    }

    fn destroy_stage(&mut self, shader: NativeShader) {
        self.calls.push(ApiCall::DestroyStage(shader));
    }

    fn link_program(&mut self, stages: &[NativeShader]) -> Result<NativeProgram, String> {
        self.calls.push(ApiCall::LinkProgram { stage_count: stages.len() });
        self.link_calls += 1;
        if let Some(log) = self.fail_link.take() {
            return Err(log);
        }
        let id = self.next_id();
        self.live_programs.insert(id);
        Ok(NativeProgram(id))
    }

    fn destroy_program(&mut self, program: NativeProgram) {
        self.live_programs.remove(&program.0);
        self.calls.push(ApiCall::DestroyProgram(program));
    }

    fn program_reflection(
        &mut self,
        program: NativeProgram,
    ) -> Result<ProgramReflection, NativeApiError> {
        self.calls.push(ApiCall::Reflect(program));
        Ok(self.reflection.clone())
    }

    fn bind_program(&mut self, program: NativeProgram) {
        self.calls.push(ApiCall::BindProgram(program));
    }

    fn unbind_program(&mut self) {
        self.calls.push(ApiCall::UnbindProgram);
    }

    fn bind_texture(&mut self, slot: u32, texture: NativeTexture) {
        self.calls.push(ApiCall::BindTexture { slot, texture });
    }

    fn unbind_texture(&mut self, slot: u32) {
        self.calls.push(ApiCall::UnbindTexture { slot });
    }

    fn bind_buffer(&mut self, slot: u32, buffer: NativeBuffer) {
        self.calls.push(ApiCall::BindBuffer { slot, buffer });
    }

    fn unbind_buffer(&mut self, slot: u32) {
        self.calls.push(ApiCall::UnbindBuffer { slot });
    }

    fn set_blend(&mut self, mode: BlendMode) {
        self.calls.push(ApiCall::SetBlend(mode));
    }

    fn set_depth(&mut self, mode: DepthMode) {
        self.calls.push(ApiCall::SetDepth(mode));
    }

    fn set_stencil(&mut self, mode: StencilMode) {
        self.calls.push(ApiCall::SetStencil(mode));
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        self.calls.push(ApiCall::SetViewport { width, height });
    }

    fn clear(&mut self, flags: ClearFlags, _color: [f32; 4]) {
        self.calls.push(ApiCall::Clear { flags });
    }

    fn set_uniform(
        &mut self,
        location: i32,
        kind: UniformKind,
        bytes: &[u8],
    ) -> Result<(), NativeApiError> {
        if bytes.len() != kind.byte_len() {
            return Err(NativeApiError { code: 0x0501, context: "uniform upload" });
        }
        self.calls.push(ApiCall::SetUniform { location, kind });
        Ok(())
    }

    fn draw(&mut self, primitive: Primitive, first_vertex: u32, vertex_count: u32) {
        self.calls.push(ApiCall::Draw { primitive, first_vertex, vertex_count });
    }

    fn flush(&mut self) {
        self.calls.push(ApiCall::Flush);
    }

    fn wait_gpu(&mut self, _timeout: Duration) -> Result<FenceStatus, NativeApiError> {
        self.calls.push(ApiCall::WaitGpu);
        Ok(self.fence_status)
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}
