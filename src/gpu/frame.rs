//! Single-frame command submission.
//!
//! A [`FrameSubmission`] walks through a fixed sequence of states. Each
//! operation is only accepted in the state directly before it; anything else
//! is rejected with [`FrameError::OutOfOrder`] and records nothing.

use super::context::GpuContext;
use super::pipeline::MeshPipeline;
use super::surface::{DisplaySurface, Drawable};
use crate::mesh::{GpuMesh, Submesh, VertexLayout};
use std::fmt;
use std::sync::Arc;
use wgpu::{CommandEncoder, Queue, RenderPass, SubmissionIndex, TextureFormat};

/// Binding slot the mesh vertex buffer is bound to.
pub const VERTEX_BUFFER_INDEX: u32 = 0;
/// Byte offset into the mesh vertex buffer.
pub const VERTEX_BUFFER_OFFSET: u64 = 0;

/// Progress of one frame, in the only order allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FrameState {
    Idle,
    BufferAcquired,
    EncodingStarted,
    PipelineBound,
    VertexBufferBound,
    DrawIssued,
    EncodingEnded,
    Presented,
    Committed,
}

impl fmt::Display for FrameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Errors that can occur while recording or submitting a frame.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("Cannot move to {operation} while in state {state}")]
    OutOfOrder {
        operation: FrameState,
        state: FrameState,
    },
    #[error("No drawable available: {0}")]
    NoDrawable(#[from] wgpu::SurfaceError),
    #[error("Pipeline renders {pipeline:?} but the drawable is {drawable:?}")]
    FormatMismatch {
        pipeline: TextureFormat,
        drawable: TextureFormat,
    },
    #[error("Mesh '{mesh}' layout does not match the bound pipeline: {diff}")]
    LayoutMismatch { mesh: String, diff: String },
}

/// A frame that has been handed to the queue.
#[derive(Debug, Clone)]
pub struct CommittedFrame {
    pub state: FrameState,
    pub submission: SubmissionIndex,
    pub draw_calls: u32,
    pub index_count: u32,
}

/// Ephemeral recording of one frame's GPU commands.
pub struct FrameSubmission {
    // Declared before `encoder` so an open pass is dropped first.
    pass: Option<RenderPass<'static>>,
    encoder: Option<CommandEncoder>,
    state: FrameState,
    queue: Arc<Queue>,
    drawable: Option<Drawable>,
    bound_layout: Option<VertexLayout>,
    draw_calls: u32,
    index_count: u32,
}

impl FrameSubmission {
    /// Obtain a fresh command encoder from the device.
    pub fn acquire(ctx: &GpuContext) -> Self {
        let encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame_encoder"),
            });
        log::debug!("frame: {} -> {}", FrameState::Idle, FrameState::BufferAcquired);

        Self {
            state: FrameState::BufferAcquired,
            queue: ctx.queue.clone(),
            encoder: Some(encoder),
            pass: None,
            drawable: None,
            bound_layout: None,
            draw_calls: 0,
            index_count: 0,
        }
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    fn require(&self, from: FrameState, operation: FrameState) -> Result<(), FrameError> {
        if self.state != from {
            return Err(FrameError::OutOfOrder {
                operation,
                state: self.state,
            });
        }
        Ok(())
    }

    fn advance(&mut self, to: FrameState) {
        log::debug!("frame: {} -> {}", self.state, to);
        self.state = to;
    }

    /// Acquire the surface's drawable and open a render pass that clears it.
    pub fn begin_encoding(&mut self, surface: &mut dyn DisplaySurface) -> Result<(), FrameError> {
        self.require(FrameState::BufferAcquired, FrameState::EncodingStarted)?;
        let Some(encoder) = self.encoder.as_mut() else {
            return Err(self.out_of_order(FrameState::EncodingStarted));
        };

        let drawable = surface.acquire_drawable()?;
        let pass = encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("frame_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: drawable.view(),
                    resolve_target: None,
                    depth_slice: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(surface.clear_color()),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            })
            .forget_lifetime();

        self.pass = Some(pass);
        self.drawable = Some(drawable);
        self.advance(FrameState::EncodingStarted);
        Ok(())
    }

    /// Bind the pipeline configuration.
    pub fn bind_pipeline(&mut self, pipeline: &MeshPipeline) -> Result<(), FrameError> {
        self.require(FrameState::EncodingStarted, FrameState::PipelineBound)?;
        if let Some(drawable) = &self.drawable {
            if drawable.format() != pipeline.color_format {
                return Err(FrameError::FormatMismatch {
                    pipeline: pipeline.color_format,
                    drawable: drawable.format(),
                });
            }
        }
        let Some(pass) = self.pass.as_mut() else {
            return Err(self.out_of_order(FrameState::PipelineBound));
        };

        pass.set_pipeline(&pipeline.pipeline);
        self.bound_layout = Some(pipeline.vertex_layout.clone());
        self.advance(FrameState::PipelineBound);
        Ok(())
    }

    /// Bind the mesh vertex buffer at [`VERTEX_BUFFER_INDEX`] / [`VERTEX_BUFFER_OFFSET`].
    pub fn bind_vertex_buffer(&mut self, mesh: &GpuMesh) -> Result<(), FrameError> {
        self.require(FrameState::PipelineBound, FrameState::VertexBufferBound)?;
        if let Some(diff) = self.bound_layout.as_ref().and_then(|l| l.diff(&mesh.layout)) {
            return Err(FrameError::LayoutMismatch {
                mesh: mesh.label.clone(),
                diff,
            });
        }
        let Some(pass) = self.pass.as_mut() else {
            return Err(self.out_of_order(FrameState::VertexBufferBound));
        };

        pass.set_vertex_buffer(
            VERTEX_BUFFER_INDEX,
            mesh.vertex_buffer.slice(VERTEX_BUFFER_OFFSET..),
        );
        self.advance(FrameState::VertexBufferBound);
        Ok(())
    }

    /// Issue one indexed draw covering the whole submesh.
    pub fn draw_submesh(&mut self, submesh: &Submesh) -> Result<(), FrameError> {
        self.require(FrameState::VertexBufferBound, FrameState::DrawIssued)?;
        let Some(pass) = self.pass.as_mut() else {
            return Err(self.out_of_order(FrameState::DrawIssued));
        };

        pass.set_index_buffer(submesh.index_buffer.slice(..), submesh.index_format);
        pass.draw_indexed(0..submesh.index_count, 0, 0..1);
        self.draw_calls += 1;
        self.index_count += submesh.index_count;
        self.advance(FrameState::DrawIssued);
        Ok(())
    }

    /// Close the render pass. No more draws can be recorded.
    pub fn end_encoding(&mut self) -> Result<(), FrameError> {
        self.require(FrameState::DrawIssued, FrameState::EncodingEnded)?;
        drop(self.pass.take());
        self.advance(FrameState::EncodingEnded);
        Ok(())
    }

    /// Schedule the drawable to be shown once the commands have executed.
    pub fn present(&mut self) -> Result<(), FrameError> {
        self.require(FrameState::EncodingEnded, FrameState::Presented)?;
        if let (Some(drawable), Some(encoder)) = (&self.drawable, self.encoder.as_mut()) {
            drawable.encode_present(encoder);
        }
        self.advance(FrameState::Presented);
        Ok(())
    }

    /// Submit the recorded commands. Returns without waiting for the GPU.
    pub fn commit(mut self) -> Result<CommittedFrame, FrameError> {
        self.require(FrameState::Presented, FrameState::Committed)?;
        let Some(encoder) = self.encoder.take() else {
            return Err(self.out_of_order(FrameState::Committed));
        };

        let submission = self.queue.submit(std::iter::once(encoder.finish()));
        if let Some(drawable) = self.drawable.take() {
            drawable.present();
        }
        self.advance(FrameState::Committed);

        Ok(CommittedFrame {
            state: self.state,
            submission,
            draw_calls: self.draw_calls,
            index_count: self.index_count,
        })
    }

    fn out_of_order(&self, operation: FrameState) -> FrameError {
        FrameError::OutOfOrder {
            operation,
            state: self.state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_states_are_ordered() {
        let order = [
            FrameState::Idle,
            FrameState::BufferAcquired,
            FrameState::EncodingStarted,
            FrameState::PipelineBound,
            FrameState::VertexBufferBound,
            FrameState::DrawIssued,
            FrameState::EncodingEnded,
            FrameState::Presented,
            FrameState::Committed,
        ];
        assert!(order.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_out_of_order_message() {
        let err = FrameError::OutOfOrder {
            operation: FrameState::DrawIssued,
            state: FrameState::EncodingStarted,
        };
        assert_eq!(
            err.to_string(),
            "Cannot move to DrawIssued while in state EncodingStarted"
        );
    }

    #[tokio::test]
    async fn test_fresh_submission_rejects_draw_steps() {
        let ctx = match GpuContext::new().await {
            Ok(ctx) => ctx,
            Err(_) => return,
        };

        let mut frame = FrameSubmission::acquire(&ctx);
        assert_eq!(frame.state(), FrameState::BufferAcquired);
        assert!(matches!(
            frame.end_encoding(),
            Err(FrameError::OutOfOrder {
                operation: FrameState::EncodingEnded,
                state: FrameState::BufferAcquired,
            })
        ));
        assert!(frame.present().is_err());
        assert_eq!(frame.state(), FrameState::BufferAcquired);
        assert!(frame.commit().is_err());
    }
}
