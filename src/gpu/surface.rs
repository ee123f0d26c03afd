//! Display surfaces: where a frame's pixels end up.
//!
//! A [`DisplaySurface`] hands out one [`Drawable`] per frame. Two kinds exist:
//! - [`WindowSurface`] presents to a winit window
//! - [`OffscreenSurface`] renders into a texture that can be read back

use super::context::{GpuContext, GpuError, GpuOptions};
use super::frame::FrameError;
use super::frame_image::FrameImage;
use super::textures::OffscreenTarget;
use std::sync::Arc;
use wgpu::{CommandEncoder, Device, TextureFormat, TextureView};
use winit::window::Window;

/// Surface format used for offscreen targets and preferred for windows.
pub const PREFERRED_FORMAT: TextureFormat = TextureFormat::Bgra8Unorm;

/// Convert an RGBA float color to the wgpu clear color type.
pub fn to_wgpu_color(rgba: [f32; 4]) -> wgpu::Color {
    wgpu::Color {
        r: rgba[0] as f64,
        g: rgba[1] as f64,
        b: rgba[2] as f64,
        a: rgba[3] as f64,
    }
}

/// A target that supplies a drawable texture for each frame.
pub trait DisplaySurface {
    /// Pixel format of every drawable this surface hands out.
    fn format(&self) -> TextureFormat;

    /// Drawable size in physical pixels.
    fn size(&self) -> (u32, u32);

    /// Color used for pixels no geometry covers.
    fn clear_color(&self) -> wgpu::Color;

    /// Acquire the texture for the next frame.
    fn acquire_drawable(&mut self) -> Result<Drawable, FrameError>;
}

enum DrawableKind {
    Window(wgpu::SurfaceTexture),
    Offscreen(OffscreenTarget),
}

/// The texture one frame draws into.
pub struct Drawable {
    view: TextureView,
    format: TextureFormat,
    kind: DrawableKind,
}

impl Drawable {
    pub fn view(&self) -> &TextureView {
        &self.view
    }

    pub fn format(&self) -> TextureFormat {
        self.format
    }

    /// Record whatever must run on the GPU before the frame is shown.
    pub(crate) fn encode_present(&self, encoder: &mut CommandEncoder) {
        if let DrawableKind::Offscreen(target) = &self.kind {
            target.encode_readback(encoder);
        }
    }

    /// Show the frame. Must be called after the commands were submitted.
    pub(crate) fn present(self) {
        if let DrawableKind::Window(texture) = self.kind {
            texture.present();
        }
    }
}

/// A fixed-size offscreen surface whose frames can be read back to the CPU.
pub struct OffscreenSurface {
    device: Arc<Device>,
    target: OffscreenTarget,
    width: u32,
    height: u32,
    clear_color: wgpu::Color,
}

impl OffscreenSurface {
    /// Create a `Bgra8Unorm` surface of the given size.
    pub fn new(
        ctx: &GpuContext,
        width: u32,
        height: u32,
        clear_color: [f32; 4],
    ) -> Result<Self, GpuError> {
        ctx.check_surface_size(width, height)?;

        let target = OffscreenTarget::new(&ctx.device, width, height, PREFERRED_FORMAT);

        Ok(Self {
            device: ctx.device.clone(),
            target,
            width,
            height,
            clear_color: to_wgpu_color(clear_color),
        })
    }

    /// Wait for the last committed frame and copy its pixels to the CPU.
    pub fn read_frame(&self) -> Result<FrameImage, GpuError> {
        self.target.read_image(&self.device)
    }
}

impl DisplaySurface for OffscreenSurface {
    fn format(&self) -> TextureFormat {
        PREFERRED_FORMAT
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear_color(&self) -> wgpu::Color {
        self.clear_color
    }

    fn acquire_drawable(&mut self) -> Result<Drawable, FrameError> {
        Ok(Drawable {
            view: self.target.view().clone(),
            format: PREFERRED_FORMAT,
            kind: DrawableKind::Offscreen(self.target.clone()),
        })
    }
}

/// A surface presenting to a window.
pub struct WindowSurface {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    clear_color: wgpu::Color,
}

impl WindowSurface {
    /// Create the instance, surface and a device able to present to it.
    ///
    /// The surface is configured once at the window's current size.
    pub async fn new(
        window: Arc<Window>,
        options: &GpuOptions,
        clear_color: [f32; 4],
    ) -> Result<(GpuContext, Self), GpuError> {
        let size = window.inner_size();
        if size.width == 0 || size.height == 0 {
            return Err(GpuError::ZeroSizedSurface);
        }

        let instance = options.create_instance();
        let surface = instance.create_surface(window.clone())?;
        let ctx = GpuContext::from_instance(instance, options, Some(&surface)).await?;
        ctx.check_surface_size(size.width, size.height)?;

        let caps = surface.get_capabilities(&ctx.adapter);
        let format = choose_surface_format(&caps).ok_or(GpuError::NoSurfaceFormat)?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&ctx.device, &config);

        Ok((
            ctx,
            Self {
                window,
                surface,
                config,
                clear_color: to_wgpu_color(clear_color),
            },
        ))
    }

    pub fn window(&self) -> &Window {
        &self.window
    }
}

impl DisplaySurface for WindowSurface {
    fn format(&self) -> TextureFormat {
        self.config.format
    }

    fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    fn clear_color(&self) -> wgpu::Color {
        self.clear_color
    }

    fn acquire_drawable(&mut self) -> Result<Drawable, FrameError> {
        let texture = self.surface.get_current_texture()?;
        let view = texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        Ok(Drawable {
            view,
            format: self.config.format,
            kind: DrawableKind::Window(texture),
        })
    }
}

/// Prefer linear BGRA8, then its sRGB variant, then whatever comes first.
fn choose_surface_format(caps: &wgpu::SurfaceCapabilities) -> Option<TextureFormat> {
    let preferred = [PREFERRED_FORMAT, TextureFormat::Bgra8UnormSrgb];
    if let Some(format) = preferred.into_iter().find(|f| caps.formats.contains(f)) {
        return Some(format);
    }
    let fallback = caps.formats.first().copied()?;
    log::warn!("Surface has no BGRA8 format, falling back to {:?}", fallback);
    Some(fallback)
}
