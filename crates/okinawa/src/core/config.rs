//! Engine configuration
//!
//! Serde-backed configuration with TOML and RON file support. Every
//! struct carries defaults, so partial files only override what they
//! name.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialize(String),

    /// File extension not recognized
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// File loading and saving for configuration types
///
/// The format is sniffed from the file extension; `.toml` and `.ron` are
/// supported.
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from a file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;

        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to a file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents)?;
        Ok(())
    }
}

/// Window and context settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Window width in pixels
    pub width: u32,
    /// Window height in pixels
    pub height: u32,
    /// Window title
    pub title: String,
    /// Multisample count
    pub samples: u32,
    /// Whether the window may be resized
    pub resizable: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            title: "okinawa".to_string(),
            samples: 4,
            resizable: false,
        }
    }
}

/// Rendering core settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphicsConfig {
    /// Frame pacing target
    pub target_fps: u32,
    /// Clear color applied at the start of each frame
    pub clear_color: [f32; 4],
    /// Upper bound on cached shader programs before LRU eviction
    pub max_resident_programs: usize,
    /// Bound for GPU fence waits, in milliseconds
    pub gpu_wait_timeout_ms: u64,
    /// Capacity for shader compiler/linker diagnostic reads
    pub info_log_capacity: usize,
    /// Whether frame state-machine misuse panics instead of returning an
    /// error
    pub panic_on_frame_misuse: bool,
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            target_fps: 60,
            clear_color: [0.2, 0.3, 0.3, 1.0],
            max_resident_programs: 32,
            gpu_wait_timeout_ms: 1000,
            info_log_capacity: 512,
            panic_on_frame_misuse: cfg!(debug_assertions),
        }
    }
}

impl GraphicsConfig {
    /// Frame budget derived from the FPS target
    pub fn time_per_frame(&self) -> Duration {
        let fps = if self.target_fps == 0 { 60 } else { self.target_fps };
        Duration::from_secs_f64(1.0 / f64::from(fps))
    }
}

/// Shader source file settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderConfig {
    /// Directory holding shader source files; discovered by upward search
    /// when unset
    pub shader_dir: Option<String>,
    /// Default vertex shader file name
    pub vertex: String,
    /// Default fragment shader file name
    pub fragment: String,
}

impl Default for ShaderConfig {
    fn default() -> Self {
        Self {
            shader_dir: None,
            vertex: "basic.vert.glsl".to_string(),
            fragment: "basic.frag.glsl".to_string(),
        }
    }
}

/// Top-level engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Window and context settings
    pub window: WindowConfig,
    /// Rendering core settings
    pub graphics: GraphicsConfig,
    /// Shader source file settings
    pub shaders: ShaderConfig,
}

impl Config for EngineConfig {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_reference_values() {
        let config = EngineConfig::default();
        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, 600);
        assert_eq!(config.graphics.target_fps, 60);
        assert_eq!(config.graphics.info_log_capacity, 512);
    }

    #[test]
    fn partial_toml_overrides_only_named_fields() {
        let config: EngineConfig = toml::from_str(
            "[window]\nwidth = 1280\nheight = 720\n\n[graphics]\nmax_resident_programs = 4\n",
        )
        .expect("parse failed");

        assert_eq!(config.window.width, 1280);
        assert_eq!(config.window.title, "okinawa");
        assert_eq!(config.graphics.max_resident_programs, 4);
        assert_eq!(config.graphics.target_fps, 60);
    }

    #[test]
    fn ron_round_trips() {
        let mut config = EngineConfig::default();
        config.graphics.clear_color = [0.0, 0.0, 0.0, 1.0];

        let text = ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::default())
            .expect("serialize failed");
        let parsed: EngineConfig = ron::from_str(&text).expect("parse failed");
        assert_eq!(parsed.graphics.clear_color, [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn frame_budget_follows_the_fps_target() {
        let mut graphics = GraphicsConfig::default();
        assert_eq!(graphics.time_per_frame(), Duration::from_secs_f64(1.0 / 60.0));

        graphics.target_fps = 0;
        assert_eq!(graphics.time_per_frame(), Duration::from_secs_f64(1.0 / 60.0));
    }
}
