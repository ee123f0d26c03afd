//! On-screen rendering of the single frame in a winit window.

use crate::gpu::{CommittedFrame, DisplaySurface, GpuOptions, SphereRenderer, WindowSurface};
use crate::scene::SceneConfig;
use anyhow::{Context, Result};
use std::sync::Arc;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::window::{Window, WindowId};

/// Open a window, draw the sphere once and keep it shown until closed.
///
/// Returns the committed frame, or the first error hit during setup or submission.
pub fn run_window(scene: SceneConfig, options: GpuOptions) -> Result<Option<CommittedFrame>> {
    scene.validate()?;

    let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
    let mut app = FrameApp {
        scene,
        options,
        target: None,
        committed: None,
        error: None,
    };

    event_loop
        .run_app(&mut app)
        .context("winit event loop terminated with error")?;

    match app.error {
        Some(err) => Err(err),
        None => Ok(app.committed),
    }
}

struct FrameTarget {
    surface: WindowSurface,
    renderer: SphereRenderer,
}

struct FrameApp {
    scene: SceneConfig,
    options: GpuOptions,
    target: Option<FrameTarget>,
    committed: Option<CommittedFrame>,
    error: Option<anyhow::Error>,
}

impl FrameApp {
    fn create_target(&self, event_loop: &ActiveEventLoop) -> Result<FrameTarget> {
        let attrs = Window::default_attributes()
            .with_title("sphere-frame")
            .with_inner_size(PhysicalSize::new(self.scene.width, self.scene.height))
            .with_resizable(false);
        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        let (ctx, surface) = pollster::block_on(WindowSurface::new(
            window,
            &self.options,
            self.scene.clear_color,
        ))
        .context("failed to acquire GPU for window")?;

        let format = surface.format();
        let renderer = SphereRenderer::new(ctx, &self.scene.sphere, format)
            .context("failed to prepare sphere renderer")?;

        Ok(FrameTarget { surface, renderer })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.error = Some(err);
        event_loop.exit();
    }
}

impl ApplicationHandler for FrameApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.target.is_some() {
            return;
        }

        match self.create_target(event_loop) {
            Ok(target) => {
                target.surface.window().request_redraw();
                self.target = Some(target);
            }
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::RedrawRequested if self.committed.is_none() => {
                let Some(target) = self.target.as_mut() else {
                    return;
                };
                match target.renderer.render(&mut target.surface) {
                    Ok(committed) => self.committed = Some(committed),
                    Err(err) => self.fail(event_loop, anyhow::Error::new(err).context("frame failed")),
                }
            }
            _ => {}
        }
    }
}
