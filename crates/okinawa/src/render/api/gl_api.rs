//! OpenGL implementation of the graphics backend
//!
//! Talks to the system OpenGL binding through the `gl` crate. Function
//! pointers are loaded from the current context, so a [`GlApi`] can only
//! exist on the thread that owns that context; the type is `!Send` and
//! serves as the render-thread ownership token.

use std::marker::PhantomData;
use std::os::raw::c_void;
use std::ptr;
use std::time::Duration;

use gl::types::{GLchar, GLenum, GLint, GLintptr, GLsizei, GLsizeiptr, GLuint};

use super::graphics_api::{
    BlendMode, BufferUsage, ClearFlags, DepthMode, FenceStatus, GraphicsApi, NativeApiError,
    NativeBuffer, NativeProgram, NativeShader, NativeTexture, PixelFormat, Primitive, ShaderStage,
    StencilMode, TextureDesc, UniformKind,
};
use crate::render::shaders::ProgramReflection;

/// Texture unit used for upload paths, above the range the state tracker
/// manages, so uploads never invalidate tracked slot bindings.
const SCRATCH_TEXTURE_UNIT: u32 = 16;

/// OpenGL backend over a current context
///
/// Vertex data is read from slot-bound buffers by the shaders, so a single
/// shared vertex array object is bound for the lifetime of the API object.
pub struct GlApi {
    shared_vao: GLuint,
    info_log_capacity: usize,
    // Ties the object to the context-owning thread
    _not_send: PhantomData<*const ()>,
}

impl GlApi {
    /// Load function pointers from the current context and set up
    /// context-global state
    ///
    /// `loader` resolves a symbol name to a function pointer, typically the
    /// windowing library's `get_proc_address`. `info_log_capacity` bounds
    /// compiler/linker diagnostic reads.
    pub fn load<F>(mut loader: F, info_log_capacity: usize) -> Result<Self, NativeApiError>
    where
        F: FnMut(&str) -> *const c_void,
    {
        gl::load_with(|symbol| loader(symbol));

        let mut shared_vao = 0;
        unsafe {
            gl::GenVertexArrays(1, &mut shared_vao);
            gl::BindVertexArray(shared_vao);
            gl::DepthFunc(gl::LESS);
        }

        let mut api = Self {
            shared_vao,
            info_log_capacity,
            _not_send: PhantomData,
        };
        api.check("context setup")?;

        log::info!("OpenGL backend ready");
        Ok(api)
    }

    /// Translate the thread-local error flag into a [`NativeApiError`]
    fn check(&mut self, context: &'static str) -> Result<(), NativeApiError> {
        let code = unsafe { gl::GetError() };
        if code == gl::NO_ERROR {
            Ok(())
        } else {
            Err(NativeApiError { code, context })
        }
    }

    fn read_shader_log(&self, shader: GLuint) -> String {
        let mut log = vec![0u8; self.info_log_capacity];
        let mut written: GLsizei = 0;
        unsafe {
            gl::GetShaderInfoLog(
                shader,
                self.info_log_capacity as GLsizei,
                &mut written,
                log.as_mut_ptr().cast::<GLchar>(),
            );
        }
        log.truncate(written.max(0) as usize);
        String::from_utf8_lossy(&log).into_owned()
    }

    fn read_program_log(&self, program: GLuint) -> String {
        let mut log = vec![0u8; self.info_log_capacity];
        let mut written: GLsizei = 0;
        unsafe {
            gl::GetProgramInfoLog(
                program,
                self.info_log_capacity as GLsizei,
                &mut written,
                log.as_mut_ptr().cast::<GLchar>(),
            );
        }
        log.truncate(written.max(0) as usize);
        String::from_utf8_lossy(&log).into_owned()
    }
}

impl Drop for GlApi {
    fn drop(&mut self) {
        unsafe {
            gl::BindVertexArray(0);
            gl::DeleteVertexArrays(1, &self.shared_vao);
        }
    }
}

fn usage_to_gl(usage: BufferUsage) -> GLenum {
    match usage {
        BufferUsage::Static => gl::STATIC_DRAW,
        BufferUsage::Dynamic => gl::DYNAMIC_DRAW,
        BufferUsage::Streaming => gl::STREAM_DRAW,
    }
}

fn format_to_gl(format: PixelFormat) -> GLenum {
    match format {
        PixelFormat::Rgb8 => gl::RGB,
        PixelFormat::Rgba8 => gl::RGBA,
    }
}

fn stage_to_gl(stage: ShaderStage) -> GLenum {
    match stage {
        ShaderStage::Vertex => gl::VERTEX_SHADER,
        ShaderStage::Fragment => gl::FRAGMENT_SHADER,
    }
}

fn primitive_to_gl(primitive: Primitive) -> GLenum {
    match primitive {
        Primitive::Triangles => gl::TRIANGLES,
        Primitive::TriangleStrip => gl::TRIANGLE_STRIP,
        Primitive::Lines => gl::LINES,
        Primitive::Points => gl::POINTS,
    }
}

impl GraphicsApi for GlApi {
    fn create_buffer(
        &mut self,
        size: usize,
        usage: BufferUsage,
    ) -> Result<NativeBuffer, NativeApiError> {
        let mut id: GLuint = 0;
        unsafe {
            gl::GenBuffers(1, &mut id);
            gl::BindBuffer(gl::ARRAY_BUFFER, id);
            gl::BufferData(
                gl::ARRAY_BUFFER,
                size as GLsizeiptr,
                ptr::null(),
                usage_to_gl(usage),
            );
            gl::BindBuffer(gl::ARRAY_BUFFER, 0);
        }
        if let Err(err) = self.check("buffer allocation") {
            unsafe { gl::DeleteBuffers(1, &id) };
            return Err(err);
        }
        Ok(NativeBuffer(id))
    }

    fn write_buffer(
        &mut self,
        buffer: NativeBuffer,
        offset: usize,
        bytes: &[u8],
    ) -> Result<(), NativeApiError> {
        unsafe {
            gl::BindBuffer(gl::ARRAY_BUFFER, buffer.0);
            gl::BufferSubData(
                gl::ARRAY_BUFFER,
                offset as GLintptr,
                bytes.len() as GLsizeiptr,
                bytes.as_ptr().cast::<c_void>(),
            );
            gl::BindBuffer(gl::ARRAY_BUFFER, 0);
        }
        self.check("buffer upload")
    }

    fn destroy_buffer(&mut self, buffer: NativeBuffer) {
        unsafe { gl::DeleteBuffers(1, &buffer.0) };
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<NativeTexture, NativeApiError> {
        let format = format_to_gl(desc.format);
        let mut id: GLuint = 0;
        unsafe {
            gl::GenTextures(1, &mut id);
            gl::ActiveTexture(gl::TEXTURE0 + SCRATCH_TEXTURE_UNIT);
            gl::BindTexture(gl::TEXTURE_2D, id);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_S, gl::REPEAT as GLint);
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_WRAP_T, gl::REPEAT as GLint);
            gl::TexParameteri(
                gl::TEXTURE_2D,
                gl::TEXTURE_MIN_FILTER,
                gl::LINEAR_MIPMAP_LINEAR as GLint,
            );
            gl::TexParameteri(gl::TEXTURE_2D, gl::TEXTURE_MAG_FILTER, gl::LINEAR as GLint);
            gl::TexImage2D(
                gl::TEXTURE_2D,
                0,
                format as GLint,
                desc.width as GLsizei,
                desc.height as GLsizei,
                0,
                format,
                gl::UNSIGNED_BYTE,
                ptr::null(),
            );
        }
        if let Err(err) = self.check("texture allocation") {
            unsafe { gl::DeleteTextures(1, &id) };
            return Err(err);
        }
        Ok(NativeTexture(id))
    }

    fn write_texture(
        &mut self,
        texture: NativeTexture,
        desc: &TextureDesc,
        pixels: &[u8],
    ) -> Result<(), NativeApiError> {
        unsafe {
            gl::ActiveTexture(gl::TEXTURE0 + SCRATCH_TEXTURE_UNIT);
            gl::BindTexture(gl::TEXTURE_2D, texture.0);
            gl::TexSubImage2D(
                gl::TEXTURE_2D,
                0,
                0,
                0,
                desc.width as GLsizei,
                desc.height as GLsizei,
                format_to_gl(desc.format),
                gl::UNSIGNED_BYTE,
                pixels.as_ptr().cast::<c_void>(),
            );
            gl::GenerateMipmap(gl::TEXTURE_2D);
        }
        self.check("texture upload")
    }

    fn destroy_texture(&mut self, texture: NativeTexture) {
        unsafe { gl::DeleteTextures(1, &texture.0) };
    }

    fn compile_stage(
        &mut self,
        stage: ShaderStage,
        source: &str,
    ) -> Result<NativeShader, String> {
        let shader = unsafe { gl::CreateShader(stage_to_gl(stage)) };
        let src_ptr = source.as_ptr().cast::<GLchar>();
        let src_len = source.len() as GLint;
        let mut status: GLint = 0;
        unsafe {
            gl::ShaderSource(shader, 1, &src_ptr, &src_len);
            gl::CompileShader(shader);
            gl::GetShaderiv(shader, gl::COMPILE_STATUS, &mut status);
        }

        if status == gl::TRUE as GLint {
            Ok(NativeShader(shader))
        } else {
            let info_log = self.read_shader_log(shader);
            unsafe { gl::DeleteShader(shader) };
            Err(info_log)
        }
    }

    fn destroy_stage(&mut self, shader: NativeShader) {
        unsafe { gl::DeleteShader(shader.0) };
    }

    fn link_program(&mut self, stages: &[NativeShader]) -> Result<NativeProgram, String> {
        let program = unsafe { gl::CreateProgram() };
        let mut status: GLint = 0;
        unsafe {
            for stage in stages {
                gl::AttachShader(program, stage.0);
            }
            gl::LinkProgram(program);
            gl::GetProgramiv(program, gl::LINK_STATUS, &mut status);
        }

        if status == gl::TRUE as GLint {
            Ok(NativeProgram(program))
        } else {
            let info_log = self.read_program_log(program);
            unsafe { gl::DeleteProgram(program) };
            Err(info_log)
        }
    }

    fn destroy_program(&mut self, program: NativeProgram) {
        unsafe { gl::DeleteProgram(program.0) };
    }

    fn program_reflection(
        &mut self,
        program: NativeProgram,
    ) -> Result<ProgramReflection, NativeApiError> {
        let mut reflection = ProgramReflection::default();
        let mut name_buf = [0u8; 256];

        let mut uniform_count: GLint = 0;
        unsafe { gl::GetProgramiv(program.0, gl::ACTIVE_UNIFORMS, &mut uniform_count) };
        for index in 0..uniform_count as GLuint {
            let mut written: GLsizei = 0;
            let mut size: GLint = 0;
            let mut ty: GLenum = 0;
            unsafe {
                gl::GetActiveUniform(
                    program.0,
                    index,
                    name_buf.len() as GLsizei,
                    &mut written,
                    &mut size,
                    &mut ty,
                    name_buf.as_mut_ptr().cast::<GLchar>(),
                );
            }
            let name = String::from_utf8_lossy(&name_buf[..written.max(0) as usize]).into_owned();
            let location = unsafe {
                gl::GetUniformLocation(program.0, name_buf.as_ptr().cast::<GLchar>())
            };
            reflection.add_uniform(name, location);
        }

        let mut attribute_count: GLint = 0;
        unsafe { gl::GetProgramiv(program.0, gl::ACTIVE_ATTRIBUTES, &mut attribute_count) };
        for index in 0..attribute_count as GLuint {
            let mut written: GLsizei = 0;
            let mut size: GLint = 0;
            let mut ty: GLenum = 0;
            unsafe {
                gl::GetActiveAttrib(
                    program.0,
                    index,
                    name_buf.len() as GLsizei,
                    &mut written,
                    &mut size,
                    &mut ty,
                    name_buf.as_mut_ptr().cast::<GLchar>(),
                );
            }
            let name = String::from_utf8_lossy(&name_buf[..written.max(0) as usize]).into_owned();
            let location =
                unsafe { gl::GetAttribLocation(program.0, name_buf.as_ptr().cast::<GLchar>()) };
            reflection.add_attribute(name, location);
        }

        self.check("program reflection")?;
        Ok(reflection)
    }

    fn bind_program(&mut self, program: NativeProgram) {
        unsafe { gl::UseProgram(program.0) };
    }

    fn unbind_program(&mut self) {
        unsafe { gl::UseProgram(0) };
    }

    fn bind_texture(&mut self, slot: u32, texture: NativeTexture) {
        unsafe {
            gl::ActiveTexture(gl::TEXTURE0 + slot);
            gl::BindTexture(gl::TEXTURE_2D, texture.0);
        }
    }

    fn unbind_texture(&mut self, slot: u32) {
        unsafe {
            gl::ActiveTexture(gl::TEXTURE0 + slot);
            gl::BindTexture(gl::TEXTURE_2D, 0);
        }
    }

    fn bind_buffer(&mut self, slot: u32, buffer: NativeBuffer) {
        unsafe { gl::BindBufferBase(gl::UNIFORM_BUFFER, slot, buffer.0) };
    }

    fn unbind_buffer(&mut self, slot: u32) {
        unsafe { gl::BindBufferBase(gl::UNIFORM_BUFFER, slot, 0) };
    }

    fn set_blend(&mut self, mode: BlendMode) {
        unsafe {
            match mode {
                BlendMode::Disabled => gl::Disable(gl::BLEND),
                BlendMode::Alpha => {
                    gl::Enable(gl::BLEND);
                    gl::BlendFunc(gl::SRC_ALPHA, gl::ONE_MINUS_SRC_ALPHA);
                }
                BlendMode::Additive => {
                    gl::Enable(gl::BLEND);
                    gl::BlendFunc(gl::ONE, gl::ONE);
                }
                BlendMode::Multiply => {
                    gl::Enable(gl::BLEND);
                    gl::BlendFunc(gl::DST_COLOR, gl::ZERO);
                }
            }
        }
    }

    fn set_depth(&mut self, mode: DepthMode) {
        unsafe {
            match mode {
                DepthMode::Disabled => gl::Disable(gl::DEPTH_TEST),
                DepthMode::ReadOnly => {
                    gl::Enable(gl::DEPTH_TEST);
                    gl::DepthMask(gl::FALSE);
                }
                DepthMode::ReadWrite => {
                    gl::Enable(gl::DEPTH_TEST);
                    gl::DepthMask(gl::TRUE);
                }
            }
        }
    }

    fn set_stencil(&mut self, mode: StencilMode) {
        unsafe {
            match mode {
                StencilMode::Disabled => gl::Disable(gl::STENCIL_TEST),
                StencilMode::Write(reference) => {
                    gl::Enable(gl::STENCIL_TEST);
                    gl::StencilFunc(gl::ALWAYS, GLint::from(reference), 0xFF);
                    gl::StencilOp(gl::KEEP, gl::KEEP, gl::REPLACE);
                    gl::StencilMask(0xFF);
                }
                StencilMode::Test(reference) => {
                    gl::Enable(gl::STENCIL_TEST);
                    gl::StencilFunc(gl::EQUAL, GLint::from(reference), 0xFF);
                    gl::StencilOp(gl::KEEP, gl::KEEP, gl::KEEP);
                    gl::StencilMask(0x00);
                }
            }
        }
    }

    fn set_viewport(&mut self, width: u32, height: u32) {
        unsafe { gl::Viewport(0, 0, width as GLsizei, height as GLsizei) };
    }

    fn clear(&mut self, flags: ClearFlags, color: [f32; 4]) {
        let mut mask = 0;
        if flags.contains(ClearFlags::COLOR) {
            mask |= gl::COLOR_BUFFER_BIT;
        }
        if flags.contains(ClearFlags::DEPTH) {
            mask |= gl::DEPTH_BUFFER_BIT;
        }
        if flags.contains(ClearFlags::STENCIL) {
            mask |= gl::STENCIL_BUFFER_BIT;
        }
        unsafe {
            gl::ClearColor(color[0], color[1], color[2], color[3]);
            gl::Clear(mask);
        }
    }

    fn set_uniform(
        &mut self,
        location: i32,
        kind: UniformKind,
        bytes: &[u8],
    ) -> Result<(), NativeApiError> {
        if bytes.len() != kind.byte_len() {
            return Err(NativeApiError {
                code: gl::INVALID_VALUE,
                context: "uniform upload",
            });
        }

        // Byte spans arrive unaligned; stage through an aligned scratch
        let mut scratch = [0f32; 16];
        bytemuck::bytes_of_mut(&mut scratch)[..bytes.len()].copy_from_slice(bytes);

        unsafe {
            match kind {
                UniformKind::Float => gl::Uniform1fv(location, 1, scratch.as_ptr()),
                UniformKind::Int => {
                    gl::Uniform1i(location, i32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]));
                }
                UniformKind::Vec2 => gl::Uniform2fv(location, 1, scratch.as_ptr()),
                UniformKind::Vec3 => gl::Uniform3fv(location, 1, scratch.as_ptr()),
                UniformKind::Vec4 => gl::Uniform4fv(location, 1, scratch.as_ptr()),
                UniformKind::Mat4 => {
                    gl::UniformMatrix4fv(location, 1, gl::FALSE, scratch.as_ptr());
                }
            }
        }
        self.check("uniform upload")
    }

    fn draw(&mut self, primitive: Primitive, first_vertex: u32, vertex_count: u32) {
        unsafe {
            gl::DrawArrays(
                primitive_to_gl(primitive),
                first_vertex as GLint,
                vertex_count as GLsizei,
            );
        }
    }

    fn flush(&mut self) {
        unsafe { gl::Flush() };
    }

    fn wait_gpu(&mut self, timeout: Duration) -> Result<FenceStatus, NativeApiError> {
        let fence = unsafe { gl::FenceSync(gl::SYNC_GPU_COMMANDS_COMPLETE, 0) };
        if fence.is_null() {
            let code = unsafe { gl::GetError() };
            return Err(NativeApiError { code, context: "fence creation" });
        }

        let nanos = u64::try_from(timeout.as_nanos()).unwrap_or(u64::MAX);
        let status =
            unsafe { gl::ClientWaitSync(fence, gl::SYNC_FLUSH_COMMANDS_BIT, nanos) };
        unsafe { gl::DeleteSync(fence) };

        match status {
            gl::ALREADY_SIGNALED | gl::CONDITION_SATISFIED => Ok(FenceStatus::Signaled),
            gl::TIMEOUT_EXPIRED => Ok(FenceStatus::TimedOut),
            _ => {
                let code = unsafe { gl::GetError() };
                Err(NativeApiError { code, context: "fence wait" })
            }
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}
