//! Shader source file loading
//!
//! Shader text files are distributed alongside the library. The directory
//! holding them is either configured explicitly or discovered by walking
//! up from the working directory, so applications run from a build
//! subdirectory still find them.

use std::path::{Path, PathBuf};

use super::AssetError;
use crate::render::api::ShaderStage;
use crate::render::shaders::ShaderSource;

/// Locate the shader directory
///
/// An explicitly configured path must exist; otherwise each ancestor of
/// the working directory is checked for a `shaders` entry.
pub fn find_shader_dir(configured: Option<&str>) -> Result<PathBuf, AssetError> {
    if let Some(dir) = configured {
        let path = PathBuf::from(dir);
        if path.is_dir() {
            return Ok(path);
        }
        return Err(AssetError::NotFound(dir.to_string()));
    }

    let mut current = std::env::current_dir()?;
    loop {
        let candidate = current.join("shaders");
        if candidate.is_dir() {
            log::debug!("shader directory: {:?}", candidate);
            return Ok(candidate);
        }
        if !current.pop() {
            return Err(AssetError::NotFound("shaders".to_string()));
        }
    }
}

/// Infer the pipeline stage from a shader file name
///
/// Follows the `<name>.vert.glsl` / `<name>.frag.glsl` convention.
pub fn stage_from_name(name: &str) -> Result<ShaderStage, AssetError> {
    if name.contains(".vert") {
        Ok(ShaderStage::Vertex)
    } else if name.contains(".frag") {
        Ok(ShaderStage::Fragment)
    } else {
        Err(AssetError::UnknownStage(name.to_string()))
    }
}

/// Read a shader source file
pub fn load_source(dir: &Path, name: &str) -> Result<String, AssetError> {
    let path = dir.join(name);
    std::fs::read_to_string(&path)
        .map_err(|e| AssetError::LoadFailed(format!("{}: {e}", path.display())))
}

/// Read a shader source file into a hashed [`ShaderSource`]
pub fn load_stage(dir: &Path, name: &str) -> Result<ShaderSource, AssetError> {
    let stage = stage_from_name(name)?;
    let text = load_source(dir, name)?;
    Ok(ShaderSource::new(stage, text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_inference_follows_the_naming_convention() {
        assert_eq!(stage_from_name("basic.vert.glsl").unwrap(), ShaderStage::Vertex);
        assert_eq!(stage_from_name("basic.frag.glsl").unwrap(), ShaderStage::Fragment);
        assert!(matches!(
            stage_from_name("basic.glsl"),
            Err(AssetError::UnknownStage(_))
        ));
    }

    #[test]
    fn missing_files_report_their_path() {
        let err = load_source(Path::new("/nonexistent"), "missing.vert.glsl").unwrap_err();
        match err {
            AssetError::LoadFailed(msg) => assert!(msg.contains("missing.vert.glsl")),
            other => panic!("expected LoadFailed, got {other}"),
        }
    }

    #[test]
    fn configured_directory_must_exist() {
        assert!(matches!(
            find_shader_dir(Some("/definitely/not/a/dir")),
            Err(AssetError::NotFound(_))
        ));
    }

    #[test]
    fn load_stage_hashes_the_file_contents() {
        let dir = std::env::temp_dir().join("okinawa-shader-loader-test");
        std::fs::create_dir_all(&dir).expect("temp dir");
        let file = dir.join("test.vert.glsl");
        std::fs::write(&file, "void main() {}").expect("write");

        let source = load_stage(&dir, "test.vert.glsl").expect("load failed");
        assert_eq!(source.stage(), ShaderStage::Vertex);
        assert_eq!(source.text(), "void main() {}");

        std::fs::remove_file(file).ok();
    }
}
