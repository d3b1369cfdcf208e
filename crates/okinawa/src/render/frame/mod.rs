//! Frame orchestration
//!
//! One frame is one `begin_frame` / `record`* / `end_frame` cycle. The
//! [`Renderer`] owns the graphics API object and the three resource
//! components, sequences per-frame work (upload drains, state application,
//! draw submission, presentation), and enforces the frame state machine.

mod commands;
mod renderer;

pub use commands::{DrawCommand, UniformWrite};
pub use renderer::{FrameError, FramePhase, Renderer};
