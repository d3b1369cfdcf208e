//! Shader source text with a precomputed content hash

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::render::api::ShaderStage;

/// One stage's source text, hashed once at construction and immutable
/// thereafter
#[derive(Debug, Clone)]
pub struct ShaderSource {
    stage: ShaderStage,
    text: String,
    content_hash: u64,
}

impl ShaderSource {
    /// Wrap source text for `stage`
    pub fn new(stage: ShaderStage, text: impl Into<String>) -> Self {
        let text = text.into();
        let mut hasher = DefaultHasher::new();
        stage.hash(&mut hasher);
        text.hash(&mut hasher);
        let content_hash = hasher.finish();
        Self { stage, text, content_hash }
    }

    /// Pipeline stage this source targets
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    /// The source text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Hash over stage and text
    pub fn content_hash(&self) -> u64 {
        self.content_hash
    }
}
