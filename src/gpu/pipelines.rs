//! Builder for indexed-mesh render pipelines.

use super::pipeline::{check_shader_inputs, PipelineError, ShaderProgram};
use crate::mesh::VertexLayout;
use wgpu::{BlendState, Device, Face, RenderPipeline, TextureFormat};

/// Run `create` inside a validation error scope so anything the device
/// rejects comes back as [`PipelineError::Device`] instead of reaching the
/// uncaptured error handler.
pub(crate) fn capture_validation<T>(
    device: &Device,
    label: &str,
    create: impl FnOnce() -> T,
) -> Result<T, PipelineError> {
    let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = create();
    match pollster::block_on(scope.pop()) {
        Some(err) => Err(PipelineError::Device {
            label: label.to_string(),
            message: err.to_string(),
        }),
        None => Ok(value),
    }
}

/// Triangle-list primitive state with counter-clockwise front faces.
pub fn mesh_primitive_state(cull_mode: Option<Face>) -> wgpu::PrimitiveState {
    wgpu::PrimitiveState {
        topology: wgpu::PrimitiveTopology::TriangleList,
        strip_index_format: None,
        front_face: wgpu::FrontFace::Ccw,
        cull_mode,
        ..Default::default()
    }
}

/// Collects the program, vertex layout and color target of a mesh pipeline.
///
/// No depth buffer and single sampling; one vertex buffer in slot 0.
pub struct MeshPipelineBuilder<'a> {
    label: &'a str,
    program: Option<&'a ShaderProgram>,
    vertex_layout: Option<&'a VertexLayout>,
    color_format: TextureFormat,
    blend: Option<BlendState>,
    cull_mode: Option<Face>,
}

impl<'a> MeshPipelineBuilder<'a> {
    pub fn new(label: &'a str) -> Self {
        Self {
            label,
            program: None,
            vertex_layout: None,
            color_format: TextureFormat::Bgra8Unorm,
            blend: Some(BlendState::REPLACE),
            cull_mode: None,
        }
    }

    pub fn program(mut self, program: &'a ShaderProgram) -> Self {
        self.program = Some(program);
        self
    }

    pub fn vertex_layout(mut self, layout: &'a VertexLayout) -> Self {
        self.vertex_layout = Some(layout);
        self
    }

    pub fn color_format(mut self, format: TextureFormat) -> Self {
        self.color_format = format;
        self
    }

    pub fn blend(mut self, blend: Option<BlendState>) -> Self {
        self.blend = blend;
        self
    }

    /// Faces to discard. Both sides are drawn by default.
    pub fn cull_mode(mut self, cull_mode: Option<Face>) -> Self {
        self.cull_mode = cull_mode;
        self
    }

    /// Check the program against the layout, then create the pipeline.
    pub fn build(self, device: &Device) -> Result<RenderPipeline, PipelineError> {
        let program = self.program.ok_or(PipelineError::MissingShader)?;
        let vertex_layout = self
            .vertex_layout
            .ok_or(PipelineError::MissingVertexLayout)?;
        check_shader_inputs(&program.interface, vertex_layout)?;

        let attributes = vertex_layout.wgpu_attributes();
        let buffers = [wgpu::VertexBufferLayout {
            array_stride: vertex_layout.stride,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &attributes,
        }];

        capture_validation(device, self.label, || {
            // The sphere shaders bind no resources.
            let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some(self.label),
                bind_group_layouts: &[],
                immediate_size: 0,
            });

            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(self.label),
                layout: Some(&layout),
                vertex: wgpu::VertexState {
                    module: &program.module,
                    entry_point: Some(program.vertex_entry.as_str()),
                    buffers: &buffers,
                    compilation_options: Default::default(),
                },
                fragment: Some(wgpu::FragmentState {
                    module: &program.module,
                    entry_point: Some(program.fragment_entry.as_str()),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: self.color_format,
                        blend: self.blend,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: Default::default(),
                }),
                primitive: mesh_primitive_state(self.cull_mode),
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview_mask: None,
                cache: None,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::GpuContext;

    #[test]
    fn test_mesh_primitive_state() {
        let state = mesh_primitive_state(None);
        assert_eq!(state.topology, wgpu::PrimitiveTopology::TriangleList);
        assert_eq!(state.front_face, wgpu::FrontFace::Ccw);
        assert_eq!(state.cull_mode, None);
        assert_eq!(mesh_primitive_state(Some(Face::Back)).cull_mode, Some(Face::Back));
    }

    #[tokio::test]
    async fn test_build_requires_program_and_layout() {
        let ctx = match GpuContext::new().await {
            Ok(ctx) => ctx,
            Err(_) => return,
        };

        let result = MeshPipelineBuilder::new("no_shader").build(&ctx.device);
        assert!(matches!(result, Err(PipelineError::MissingShader)));

        let program = ShaderProgram::sphere(&ctx).unwrap();
        let result = MeshPipelineBuilder::new("no_layout")
            .program(&program)
            .build(&ctx.device);
        assert!(matches!(result, Err(PipelineError::MissingVertexLayout)));
    }

    #[tokio::test]
    async fn test_device_rejection_is_returned() {
        let ctx = match GpuContext::new().await {
            Ok(ctx) => ctx,
            Err(_) => return,
        };

        // Shared-exponent formats cannot be render targets.
        let program = ShaderProgram::sphere(&ctx).unwrap();
        let layout = VertexLayout::position_normal_uv();
        let result = MeshPipelineBuilder::new("rgb9e5_target")
            .program(&program)
            .vertex_layout(&layout)
            .color_format(TextureFormat::Rgb9e5Ufloat)
            .build(&ctx.device);
        match result {
            Err(PipelineError::Device { label, message }) => {
                assert_eq!(label, "rgb9e5_target");
                assert!(!message.is_empty());
            }
            Err(other) => panic!("expected device rejection, got {other}"),
            Ok(_) => panic!("pipeline with a non-renderable target was created"),
        }
    }
}
