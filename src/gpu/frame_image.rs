//! CPU copy of a rendered frame.

use std::path::Path;
use wgpu::TextureFormat;

/// Tightly packed 4-byte texels read back from an offscreen surface.
#[derive(Debug, Clone)]
pub struct FrameImage {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub data: Vec<u8>,
}

impl FrameImage {
    pub fn new(width: u32, height: u32, format: TextureFormat, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            format,
            data,
        }
    }

    fn is_bgra(&self) -> bool {
        matches!(
            self.format,
            TextureFormat::Bgra8Unorm | TextureFormat::Bgra8UnormSrgb
        )
    }

    /// Pixel at `(x, y)` in RGBA order, regardless of the texture's channel order.
    pub fn pixel_rgba(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y * self.width + x) * 4) as usize;
        let p = self.data.get(i..i + 4)?;
        Some(if self.is_bgra() {
            [p[2], p[1], p[0], p[3]]
        } else {
            [p[0], p[1], p[2], p[3]]
        })
    }

    /// Convert to an RGBA image buffer.
    pub fn to_rgba_image(&self) -> Option<image::RgbaImage> {
        let mut data = self.data.clone();
        if self.is_bgra() {
            for texel in data.chunks_exact_mut(4) {
                texel.swap(0, 2);
            }
        }
        image::RgbaImage::from_raw(self.width, self.height, data)
    }

    /// Write the frame as a PNG file.
    pub fn save_png<P: AsRef<Path>>(&self, path: P) -> Result<(), image::ImageError> {
        let image = self.to_rgba_image().ok_or_else(|| {
            image::ImageError::Parameter(image::error::ParameterError::from_kind(
                image::error::ParameterErrorKind::DimensionMismatch,
            ))
        })?;
        image.save_with_format(path, image::ImageFormat::Png)
    }
}
