//! Windowing context adapter
//!
//! Thin façade over the windowing collaborator. The rendering core
//! consumes exactly three operations — `make_current`, `swap_buffers`,
//! `framebuffer_size` — expressed by the [`RenderSurface`] trait; the
//! GLFW-backed implementation additionally exposes the event-pump plumbing
//! the engine loop needs.

mod glfw_surface;
mod surface;

pub use glfw_surface::{GlfwSurface, SurfaceError};
pub use surface::RenderSurface;
