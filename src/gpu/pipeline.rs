//! Shader compilation and the mesh render pipeline.

use super::context::GpuContext;
use super::pipelines::MeshPipelineBuilder;
use super::pipelines::capture_validation;
use crate::mesh::VertexLayout;
use naga::ScalarKind;
use wgpu::{RenderPipeline, ShaderModule, TextureFormat, VertexFormat};

/// Embedded WGSL for the flat-colored sphere.
pub const SPHERE_SHADER: &str = include_str!("shaders/sphere.wgsl");
pub const VERTEX_ENTRY: &str = "vertex_main";
pub const FRAGMENT_ENTRY: &str = "fragment_main";

/// Color written by `fragment_main`, in linear RGBA. Keep in sync with the
/// literal in `shaders/sphere.wgsl`.
pub const SPHERE_COLOR: [f32; 4] = [0.0, 0.4, 0.21, 1.0];

/// Errors that can occur while compiling shaders or building pipelines.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Shader '{label}' failed to compile:\n{message}")]
    ShaderCompile { label: String, message: String },
    #[error("Shader '{label}' has no {stage} entry point named '{name}'")]
    MissingEntryPoint {
        label: String,
        stage: &'static str,
        name: String,
    },
    #[error("Pipeline vertex layout does not match mesh layout: {0}")]
    LayoutMismatch(String),
    #[error("Shader reads vertex location {0} which the vertex layout does not provide")]
    MissingVertexInput(u32),
    #[error("Shader reads vertex location {location} as {shader:?} but the layout provides {format:?}")]
    VertexInputType {
        location: u32,
        shader: ScalarKind,
        format: VertexFormat,
    },
    #[error("Device rejected '{label}': {message}")]
    Device { label: String, message: String },
    #[error("Pipeline builder has no shader program")]
    MissingShader,
    #[error("Pipeline builder has no vertex layout")]
    MissingVertexLayout,
}

/// One `@location` input of the vertex entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexInput {
    pub location: u32,
    pub kind: ScalarKind,
    pub components: u32,
}

/// What the pipeline needs to know about a validated shader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderInterface {
    /// Inputs of the vertex entry point, sorted by location.
    pub vertex_inputs: Vec<VertexInput>,
}

impl ShaderInterface {
    pub fn locations(&self) -> Vec<u32> {
        self.vertex_inputs.iter().map(|i| i.location).collect()
    }
}

/// Scalar kind a vertex format is read as in the shader.
pub fn vertex_format_kind(format: VertexFormat) -> ScalarKind {
    use VertexFormat as F;
    match format {
        F::Uint8
        | F::Uint8x2
        | F::Uint8x4
        | F::Uint16
        | F::Uint16x2
        | F::Uint16x4
        | F::Uint32
        | F::Uint32x2
        | F::Uint32x3
        | F::Uint32x4 => ScalarKind::Uint,
        F::Sint8
        | F::Sint8x2
        | F::Sint8x4
        | F::Sint16
        | F::Sint16x2
        | F::Sint16x4
        | F::Sint32
        | F::Sint32x2
        | F::Sint32x3
        | F::Sint32x4 => ScalarKind::Sint,
        // Normalized, half, single and double formats all read as floats.
        _ => ScalarKind::Float,
    }
}

fn vertex_input(
    module: &naga::Module,
    location: u32,
    ty: naga::Handle<naga::Type>,
) -> Option<VertexInput> {
    let (scalar, components) = match module.types[ty].inner {
        naga::TypeInner::Scalar(scalar) => (scalar, 1),
        naga::TypeInner::Vector { size, scalar } => (scalar, size as u32),
        _ => return None,
    };
    Some(VertexInput {
        location,
        kind: scalar.kind,
        components,
    })
}

/// Parse and validate WGSL, and check that both entry points exist.
///
/// Runs entirely on the CPU so compile errors surface as values instead of
/// through the device's uncaptured error handler.
pub fn validate_shader(
    label: &str,
    source: &str,
    vertex_entry: &str,
    fragment_entry: &str,
) -> Result<ShaderInterface, PipelineError> {
    let module = naga::front::wgsl::parse_str(source).map_err(|e| PipelineError::ShaderCompile {
        label: label.to_string(),
        message: e.emit_to_string(source),
    })?;

    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .map_err(|e| PipelineError::ShaderCompile {
        label: label.to_string(),
        message: e.emit_to_string(source),
    })?;

    let find_entry = |name: &str, stage: naga::ShaderStage, stage_name: &'static str| {
        module
            .entry_points
            .iter()
            .find(|ep| ep.name == name && ep.stage == stage)
            .ok_or_else(|| PipelineError::MissingEntryPoint {
                label: label.to_string(),
                stage: stage_name,
                name: name.to_string(),
            })
    };

    let vertex = find_entry(vertex_entry, naga::ShaderStage::Vertex, "vertex")?;
    find_entry(fragment_entry, naga::ShaderStage::Fragment, "fragment")?;

    let mut vertex_inputs = Vec::new();
    for arg in &vertex.function.arguments {
        match &arg.binding {
            Some(naga::Binding::Location { location, .. }) => {
                vertex_inputs.extend(vertex_input(&module, *location, arg.ty));
            }
            Some(naga::Binding::BuiltIn(_)) => {}
            None => {
                if let naga::TypeInner::Struct { members, .. } = &module.types[arg.ty].inner {
                    vertex_inputs.extend(members.iter().filter_map(|m| match m.binding {
                        Some(naga::Binding::Location { location, .. }) => {
                            vertex_input(&module, location, m.ty)
                        }
                        _ => None,
                    }));
                }
            }
        }
    }
    vertex_inputs.sort_unstable_by_key(|i| i.location);

    Ok(ShaderInterface { vertex_inputs })
}

/// A compiled vertex/fragment program pair.
pub struct ShaderProgram {
    pub module: ShaderModule,
    pub vertex_entry: String,
    pub fragment_entry: String,
    pub interface: ShaderInterface,
}

impl ShaderProgram {
    /// Compile WGSL source text.
    pub fn compile(
        ctx: &GpuContext,
        label: &str,
        source: &str,
        vertex_entry: &str,
        fragment_entry: &str,
    ) -> Result<Self, PipelineError> {
        let interface = validate_shader(label, source, vertex_entry, fragment_entry)?;

        let module = capture_validation(&ctx.device, label, || {
            ctx.device
                .create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some(label),
                    source: wgpu::ShaderSource::Wgsl(source.into()),
                })
        })?;

        Ok(Self {
            module,
            vertex_entry: vertex_entry.to_string(),
            fragment_entry: fragment_entry.to_string(),
            interface,
        })
    }

    /// Compile the embedded sphere shader.
    pub fn sphere(ctx: &GpuContext) -> Result<Self, PipelineError> {
        Self::compile(ctx, "sphere_shader", SPHERE_SHADER, VERTEX_ENTRY, FRAGMENT_ENTRY)
    }
}

/// Fixed-function state the pipeline is built with.
#[derive(Debug, Clone)]
pub struct PipelineDescriptor {
    pub label: String,
    pub vertex_layout: VertexLayout,
    pub color_format: TextureFormat,
}

/// Require the declared layout to equal the mesh's own layout.
pub fn check_vertex_layout(
    declared: &VertexLayout,
    mesh: &VertexLayout,
) -> Result<(), PipelineError> {
    match declared.diff(mesh) {
        Some(diff) => Err(PipelineError::LayoutMismatch(diff)),
        None => Ok(()),
    }
}

/// Require every location the shader reads to exist in the layout with a
/// format of the same scalar kind. Component counts may differ; missing
/// components read as defaults.
pub fn check_shader_inputs(
    interface: &ShaderInterface,
    declared: &VertexLayout,
) -> Result<(), PipelineError> {
    for input in &interface.vertex_inputs {
        let attribute = declared
            .attribute_at(input.location)
            .ok_or(PipelineError::MissingVertexInput(input.location))?;
        if vertex_format_kind(attribute.format) != input.kind {
            return Err(PipelineError::VertexInputType {
                location: input.location,
                shader: input.kind,
                format: attribute.format,
            });
        }
    }
    Ok(())
}

/// Immutable bundle of shaders, vertex layout and output format.
#[derive(Debug, Clone)]
pub struct MeshPipeline {
    pub pipeline: RenderPipeline,
    pub color_format: TextureFormat,
    pub vertex_layout: VertexLayout,
}

impl MeshPipeline {
    /// Build a pipeline for meshes with `mesh_layout`.
    pub fn new(
        ctx: &GpuContext,
        shader: &ShaderProgram,
        desc: &PipelineDescriptor,
        mesh_layout: &VertexLayout,
    ) -> Result<Self, PipelineError> {
        check_vertex_layout(&desc.vertex_layout, mesh_layout)?;

        let pipeline = MeshPipelineBuilder::new(&desc.label)
            .program(shader)
            .vertex_layout(&desc.vertex_layout)
            .color_format(desc.color_format)
            .build(&ctx.device)?;

        log::info!(
            "Built pipeline '{}' for {:?} with {} vertex attributes",
            desc.label,
            desc.color_format,
            desc.vertex_layout.attributes.len()
        );

        Ok(Self {
            pipeline,
            color_format: desc.color_format,
            vertex_layout: desc.vertex_layout.clone(),
        })
    }
}
