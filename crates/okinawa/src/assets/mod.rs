//! Collaborator-facing asset loading
//!
//! Decoded pixels and shader source text enter the engine here. Image
//! decoding is delegated to the `image` crate; failures surface to the
//! caller before anything reaches the rendering core.

pub mod image_loader;
pub mod shader_loader;

use thiserror::Error;

pub use image_loader::ImageData;

/// Asset loading errors
#[derive(Debug, Error)]
pub enum AssetError {
    /// Decode or read failure, with the offending path or reason
    #[error("asset load failed: {0}")]
    LoadFailed(String),

    /// Asset or asset directory not found
    #[error("asset not found: {0}")]
    NotFound(String),

    /// Shader stage could not be inferred from a file name
    #[error("cannot infer shader stage from file name: {0}")]
    UnknownStage(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
