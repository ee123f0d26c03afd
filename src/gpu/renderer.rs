//! Sphere renderer: mesh acquisition, pipeline construction and one frame.

use super::context::{GpuContext, GpuError};
use super::frame::{CommittedFrame, FrameError, FrameSubmission};
use super::pipeline::{MeshPipeline, PipelineDescriptor, PipelineError, ShaderProgram};
use super::surface::DisplaySurface;
use crate::mesh::{generate_sphere, GpuMesh, MeshBufferAllocator, MeshError, SphereParams};
use wgpu::TextureFormat;

/// Any failure along the render sequence.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
    #[error("Mesh error: {0}")]
    Mesh(#[from] MeshError),
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),
    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),
}

/// Owns the device, the sphere mesh and its pipeline.
pub struct SphereRenderer {
    ctx: GpuContext,
    mesh: GpuMesh,
    pipeline: MeshPipeline,
}

impl SphereRenderer {
    /// Generate and upload the sphere, then build a pipeline targeting `color_format`.
    pub fn new(
        ctx: GpuContext,
        params: &SphereParams,
        color_format: TextureFormat,
    ) -> Result<Self, RenderError> {
        let cpu_mesh = generate_sphere(params)?;
        log::info!(
            "Generated sphere {:?} with {}x{} segments: {} triangles",
            params.extents,
            params.segments[0],
            params.segments[1],
            cpu_mesh.triangle_count()
        );
        let mesh = MeshBufferAllocator::new(&ctx).allocate(&cpu_mesh)?;

        let shader = ShaderProgram::sphere(&ctx)?;
        let pipeline = MeshPipeline::new(
            &ctx,
            &shader,
            &PipelineDescriptor {
                label: "sphere_pipeline".to_string(),
                vertex_layout: mesh.layout.clone(),
                color_format,
            },
            &mesh.layout,
        )?;

        Ok(Self {
            ctx,
            mesh,
            pipeline,
        })
    }

    /// Record and commit one frame to the surface.
    ///
    /// Returns as soon as the commands are queued; it does not wait for the GPU.
    pub fn render(&self, surface: &mut dyn DisplaySurface) -> Result<CommittedFrame, RenderError> {
        let submesh = self.mesh.primary_submesh()?;

        let mut frame = FrameSubmission::acquire(&self.ctx);
        frame.begin_encoding(surface)?;
        frame.bind_pipeline(&self.pipeline)?;
        frame.bind_vertex_buffer(&self.mesh)?;
        frame.draw_submesh(submesh)?;
        frame.end_encoding()?;
        frame.present()?;
        let committed = frame.commit()?;

        log::info!(
            "Committed frame: {} draw call(s), {} indices",
            committed.draw_calls,
            committed.index_count
        );
        Ok(committed)
    }

    pub fn context(&self) -> &GpuContext {
        &self.ctx
    }

    pub fn mesh(&self) -> &GpuMesh {
        &self.mesh
    }

    pub fn pipeline(&self) -> &MeshPipeline {
        &self.pipeline
    }

    /// Get GPU adapter info.
    pub fn adapter_info(&self) -> wgpu::AdapterInfo {
        self.ctx.adapter_info()
    }
}
