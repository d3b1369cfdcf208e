//! Engine facade
//!
//! Wires configuration, the windowing surface, the OpenGL backend and the
//! frame renderer together, and owns the main loop. Applications drive
//! frames through callbacks, the way the engine's own demo does; anything
//! scene- or input-shaped lives above this layer.

pub mod config;

use thiserror::Error;

use crate::assets::{shader_loader, AssetError};
use crate::context::{GlfwSurface, SurfaceError};
use crate::core::config::EngineConfig;
use crate::render::shaders::ProgramRef;
use crate::render::{RenderError, RenderResult, Renderer};

/// Engine lifecycle errors
#[derive(Debug, Error)]
pub enum EngineError {
    /// Surface or context bring-up failed
    #[error(transparent)]
    Surface(#[from] SurfaceError),

    /// Rendering core failure
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Shader or texture asset failure
    #[error(transparent)]
    Asset(#[from] AssetError),
}

/// The engine: one window, one render thread, one frame loop
pub struct Engine {
    // Field order matters: the renderer's teardown issues GL calls, so it
    // must drop while the surface's context is still alive.
    renderer: Renderer,
    surface: GlfwSurface,
    config: EngineConfig,
}

impl Engine {
    /// Bring up the window, load the OpenGL backend, build the renderer
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        log::info!("initializing engine...");

        let mut surface = GlfwSurface::new(&config.window)?;
        let api = surface.load_gl(config.graphics.info_log_capacity)?;
        let renderer = Renderer::new(Box::new(api), &config.graphics);

        log::info!("engine initialized");
        Ok(Self { surface, renderer, config })
    }

    /// The frame renderer
    pub fn renderer(&mut self) -> &mut Renderer {
        &mut self.renderer
    }

    /// The windowing surface
    pub fn surface(&mut self) -> &mut GlfwSurface {
        &mut self.surface
    }

    /// The active configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Compile the program named by the shader configuration
    ///
    /// Loads the configured vertex and fragment sources from the shader
    /// directory and runs them through the program cache.
    pub fn load_default_program(&mut self) -> Result<ProgramRef, EngineError> {
        let dir = shader_loader::find_shader_dir(self.config.shaders.shader_dir.as_deref())?;
        let vertex = shader_loader::load_stage(&dir, &self.config.shaders.vertex)?;
        let fragment = shader_loader::load_stage(&dir, &self.config.shaders.fragment)?;

        self.renderer
            .get_or_compile(&[vertex, fragment])
            .map_err(|err| EngineError::Render(err.into()))
    }

    /// Run the main loop until the window closes
    ///
    /// `step` runs once per frame before rendering; `draw` records the
    /// frame's commands. Pacing follows the configured FPS target, the
    /// way the original viewer loop did.
    pub fn run(
        mut self,
        mut step: impl FnMut(f32),
        mut draw: impl FnMut(&mut Renderer, f32) -> RenderResult<()>,
    ) -> Result<(), EngineError> {
        let frame_budget = self.config.graphics.time_per_frame().as_secs_f64();
        let mut last_frame = self.surface.time();

        log::info!("entering main loop");
        while !self.surface.should_close() {
            let now = self.surface.time();
            let delta = now - last_frame;
            if delta < frame_budget {
                continue;
            }
            last_frame = now;
            let dt = delta as f32;

            step(dt);

            self.renderer.begin_frame(&mut self.surface).map_err(RenderError::from)?;
            draw(&mut self.renderer, dt)?;
            self.renderer.end_frame(&mut self.surface).map_err(RenderError::from)?;

            self.surface.poll_events();
        }

        self.shutdown();
        Ok(())
    }

    /// Orderly teardown: bounded GPU drain, then resource release
    pub fn shutdown(&mut self) {
        log::info!("shutting down engine");
        if let Err(err) = self.renderer.wait_gpu() {
            log::warn!("GPU drain before shutdown failed: {err}");
        }
        self.renderer.shutdown();
    }
}
