//! Image loading for texture data
//!
//! Decodes PNG and friends into RGBA pixel buffers ready for texture
//! upload. Images are flipped vertically during decode so row order
//! matches OpenGL's bottom-left origin.

use std::path::Path;

use super::AssetError;
use crate::render::api::{PixelFormat, TextureDesc};

/// Decoded image data ready for GPU upload
#[derive(Debug, Clone)]
pub struct ImageData {
    /// Raw RGBA pixel data, bottom row first
    pub data: Vec<u8>,
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Number of color channels (always 4 after decode)
    pub channels: u8,
}

impl ImageData {
    /// Load and decode an image file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, AssetError> {
        let path = path.as_ref();
        log::debug!("loading image from {:?}", path);

        let img = image::open(path)
            .map_err(|e| AssetError::LoadFailed(format!("{}: {e}", path.display())))?;
        let rgba = img.flipv().to_rgba8();
        let (width, height) = rgba.dimensions();

        log::info!("loaded {}x{} image from {:?}", width, height, path);
        Ok(Self { data: rgba.into_raw(), width, height, channels: 4 })
    }

    /// Decode an image from memory
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AssetError> {
        let img = image::load_from_memory(bytes)
            .map_err(|e| AssetError::LoadFailed(format!("in-memory image: {e}")))?;
        let rgba = img.flipv().to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok(Self { data: rgba.into_raw(), width, height, channels: 4 })
    }

    /// A solid-color image, useful as a fallback or placeholder texture
    pub fn solid_color(width: u32, height: u32, color: [u8; 4]) -> Self {
        let pixel_count = (width * height) as usize;
        let mut data = Vec::with_capacity(pixel_count * 4);
        for _ in 0..pixel_count {
            data.extend_from_slice(&color);
        }
        Self { data, width, height, channels: 4 }
    }

    /// Texture descriptor matching this image
    pub fn texture_desc(&self) -> TextureDesc {
        TextureDesc {
            width: self.width,
            height: self.height,
            format: PixelFormat::Rgba8,
        }
    }

    /// Size of the pixel data in bytes
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solid_color_fills_every_pixel() {
        let img = ImageData::solid_color(4, 2, [255, 0, 0, 255]);
        assert_eq!(img.size_bytes(), 32);
        assert!(img.data.chunks(4).all(|px| px == [255, 0, 0, 255]));
    }

    #[test]
    fn texture_desc_matches_the_image() {
        let img = ImageData::solid_color(8, 8, [0; 4]);
        let desc = img.texture_desc();
        assert_eq!(desc.width, 8);
        assert_eq!(desc.format, PixelFormat::Rgba8);
        assert_eq!(desc.byte_size(), img.size_bytes());
    }

    #[test]
    fn png_bytes_decode_back_to_pixels() {
        let source = image::RgbaImage::from_pixel(3, 3, image::Rgba([10, 20, 30, 255]));
        let mut encoded = Vec::new();
        source
            .write_to(&mut std::io::Cursor::new(&mut encoded), image::ImageFormat::Png)
            .expect("encode failed");

        let decoded = ImageData::from_bytes(&encoded).expect("decode failed");
        assert_eq!((decoded.width, decoded.height), (3, 3));
        assert_eq!(decoded.channels, 4);
        assert_eq!(&decoded.data[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(matches!(
            ImageData::from_bytes(&[0xDE, 0xAD, 0xBE, 0xEF]),
            Err(AssetError::LoadFailed(_))
        ));
    }
}
