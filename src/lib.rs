//! Sphere Frame
//!
//! Draws one frame of a flat-colored sphere with wgpu.
//!
//! # Phases
//!
//! - Device & surface acquisition: [`GpuContext`], [`WindowSurface`], [`OffscreenSurface`]
//! - Mesh acquisition: [`mesh::generate_sphere`] and [`MeshBufferAllocator`]
//! - Pipeline construction: [`ShaderProgram`] and [`MeshPipeline`]
//! - Command submission: [`FrameSubmission`], driven by [`SphereRenderer::render`]
//!
//! Every failure is returned as a value; nothing in the library aborts the process.

pub mod gpu;
pub mod mesh;
pub mod scene;
pub mod window;

// Re-export commonly used types
pub use gpu::{
    CommittedFrame, DisplaySurface, FrameError, FrameImage, FrameState, FrameSubmission,
    GpuContext, GpuError, GpuOptions, MeshPipeline, OffscreenSurface, PipelineDescriptor,
    PipelineError, RenderError, ShaderProgram, SphereRenderer, WindowSurface, SPHERE_COLOR,
};
pub use mesh::{
    generate_sphere, GpuMesh, MeshBufferAllocator, MeshError, SphereParams, Submesh, VertexLayout,
};
pub use scene::{parse_hex_color, render_offscreen, render_to_png, SceneConfig, SceneError};
pub use window::run_window;
