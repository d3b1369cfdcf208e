//! GLFW-backed surface with an OpenGL context

use glfw::{Context, Glfw, GlfwReceiver, PWindow, WindowEvent};
use thiserror::Error;

use super::surface::RenderSurface;
use crate::core::config::WindowConfig;
use crate::render::api::{GlApi, NativeApiError};

/// Surface creation errors
#[derive(Debug, Error)]
pub enum SurfaceError {
    /// GLFW failed to initialize
    #[error("GLFW initialization failed")]
    InitializationFailed,

    /// Window or context creation failed
    #[error("window creation failed")]
    CreationFailed,

    /// OpenGL function loading failed
    #[error(transparent)]
    GlLoad(#[from] NativeApiError),
}

/// GLFW window with a core-profile OpenGL context
pub struct GlfwSurface {
    glfw: Glfw,
    window: PWindow,
    events: GlfwReceiver<(f64, WindowEvent)>,
}

impl GlfwSurface {
    /// Create the window and make its context current
    pub fn new(config: &WindowConfig) -> Result<Self, SurfaceError> {
        let mut glfw =
            glfw::init(glfw::fail_on_errors).map_err(|_| SurfaceError::InitializationFailed)?;

        glfw.window_hint(glfw::WindowHint::ContextVersion(4, 1));
        glfw.window_hint(glfw::WindowHint::OpenGlProfile(glfw::OpenGlProfileHint::Core));
        glfw.window_hint(glfw::WindowHint::OpenGlForwardCompat(true));
        glfw.window_hint(glfw::WindowHint::Samples(Some(config.samples)));
        glfw.window_hint(glfw::WindowHint::Resizable(config.resizable));

        let (mut window, events) = glfw
            .create_window(
                config.width,
                config.height,
                &config.title,
                glfw::WindowMode::Windowed,
            )
            .ok_or(SurfaceError::CreationFailed)?;

        window.make_current();
        window.set_framebuffer_size_polling(true);
        window.set_key_polling(true);
        window.set_close_polling(true);
        glfw.set_swap_interval(glfw::SwapInterval::Sync(1));

        log::info!(
            "created {}x{} window with OpenGL 4.1 core context",
            config.width,
            config.height
        );
        Ok(Self { glfw, window, events })
    }

    /// Load the OpenGL backend from this surface's context
    ///
    /// Must be called on the thread that owns the context; the returned
    /// API object stays pinned to it.
    pub fn load_gl(&mut self, info_log_capacity: usize) -> Result<GlApi, SurfaceError> {
        let window = &mut self.window;
        let api = GlApi::load(
            |symbol| window.get_proc_address(symbol) as *const std::os::raw::c_void,
            info_log_capacity,
        )?;
        Ok(api)
    }

    /// Whether the window was asked to close
    pub fn should_close(&self) -> bool {
        self.window.should_close()
    }

    /// Ask the window to close at the next loop iteration
    pub fn set_should_close(&mut self, should_close: bool) {
        self.window.set_should_close(should_close);
    }

    /// Pump the windowing system's event queue
    pub fn poll_events(&mut self) {
        self.glfw.poll_events();
    }

    /// Drain buffered window events
    pub fn flush_events(&self) -> glfw::FlushedMessages<'_, (f64, WindowEvent)> {
        glfw::flush_messages(&self.events)
    }

    /// Wall-clock seconds since GLFW initialization
    pub fn time(&self) -> f64 {
        self.glfw.get_time()
    }
}

impl RenderSurface for GlfwSurface {
    fn make_current(&mut self) {
        if !self.window.is_current() {
            self.window.make_current();
        }
    }

    fn swap_buffers(&mut self) {
        self.window.swap_buffers();
    }

    fn framebuffer_size(&self) -> (u32, u32) {
        let (width, height) = self.window.get_framebuffer_size();
        (width as u32, height as u32)
    }
}
