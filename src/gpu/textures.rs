//! Offscreen color target and its CPU readback.

use super::context::GpuError;
use super::frame_image::FrameImage;
use wgpu::{CommandEncoder, Device, Texture, TextureFormat, TextureUsages, TextureView};

/// Row sizes of a texel copy. wgpu requires buffer rows to be aligned to
/// [`wgpu::COPY_BYTES_PER_ROW_ALIGNMENT`], so readback rows carry padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowPitch {
    pub unpadded: u32,
    pub padded: u32,
}

impl RowPitch {
    pub fn new(width: u32, bytes_per_texel: u32) -> Self {
        let unpadded = width * bytes_per_texel;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        Self {
            unpadded,
            padded: unpadded.div_ceil(align) * align,
        }
    }

    /// Copy `rows` rows out of padded data into a tightly packed vector.
    pub fn strip_padding(&self, padded: &[u8], rows: u32) -> Vec<u8> {
        let mut packed = Vec::with_capacity((self.unpadded * rows) as usize);
        for row in padded.chunks(self.padded as usize).take(rows as usize) {
            packed.extend_from_slice(&row[..self.unpadded as usize]);
        }
        packed
    }
}

/// A color texture that frames render into, paired with a mappable buffer
/// the texture is copied to once the frame's draws are recorded.
///
/// Cloning shares the same GPU objects.
#[derive(Debug, Clone)]
pub struct OffscreenTarget {
    texture: Texture,
    view: TextureView,
    readback: wgpu::Buffer,
    pitch: RowPitch,
}

impl OffscreenTarget {
    /// Create a target with a 4-byte-per-texel `format`.
    pub fn new(device: &Device, width: u32, height: u32, format: TextureFormat) -> Self {
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("offscreen_target"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: TextureUsages::RENDER_ATTACHMENT | TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let pitch = RowPitch::new(width, 4);
        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("offscreen_readback"),
            size: pitch.padded as u64 * height as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        Self {
            texture,
            view,
            readback,
            pitch,
        }
    }

    pub fn view(&self) -> &TextureView {
        &self.view
    }

    pub fn texture(&self) -> &Texture {
        &self.texture
    }

    pub fn pitch(&self) -> RowPitch {
        self.pitch
    }

    /// Record a copy of the whole texture into the readback buffer.
    pub fn encode_readback(&self, encoder: &mut CommandEncoder) {
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.readback,
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(self.pitch.padded),
                    rows_per_image: Some(self.texture.height()),
                },
            },
            self.texture.size(),
        );
    }

    /// Block until the last submitted readback lands, then copy it out.
    pub fn read_image(&self, device: &Device) -> Result<FrameImage, GpuError> {
        let slice = self.readback.slice(..);
        let (sender, receiver) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = sender.send(result);
        });
        device.poll(wgpu::PollType::wait_indefinitely())?;
        receiver.recv().map_err(|_| GpuError::ReadbackCancelled)??;

        let height = self.texture.height();
        let data = {
            let mapped = slice.get_mapped_range();
            self.pitch.strip_padding(&mapped, height)
        };
        self.readback.unmap();

        Ok(FrameImage::new(
            self.texture.width(),
            height,
            self.texture.format(),
            data,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::GpuContext;

    #[test]
    fn test_row_pitch_alignment() {
        // 100 * 4 = 400 bytes, padded to the next multiple of 256
        assert_eq!(
            RowPitch::new(100, 4),
            RowPitch {
                unpadded: 400,
                padded: 512
            }
        );
        assert_eq!(RowPitch::new(64, 4).padded, 256);
    }

    #[test]
    fn test_strip_padding() {
        let pitch = RowPitch {
            unpadded: 2,
            padded: 4,
        };
        let padded = [1, 2, 0, 0, 3, 4, 0, 0];
        assert_eq!(pitch.strip_padding(&padded, 2), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_offscreen_target_creation() {
        let ctx = match GpuContext::new().await {
            Ok(ctx) => ctx,
            Err(_) => return,
        };

        let target = OffscreenTarget::new(&ctx.device, 100, 10, TextureFormat::Bgra8Unorm);
        assert_eq!(target.texture().width(), 100);
        assert_eq!(target.texture().height(), 10);
        assert_eq!(target.pitch().padded, 512);
    }
}
