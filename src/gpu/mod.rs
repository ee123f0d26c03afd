//! GPU rendering using wgpu.
//!
//! Device and surface setup, WGSL pipelines, and ordered command submission
//! to a window or an offscreen target. Mesh data lives in [`crate::mesh`].

pub mod context;
pub mod frame;
pub mod frame_image;
pub mod pipeline;
pub mod pipelines;
pub mod renderer;
pub mod surface;
pub mod textures;

pub use context::{GpuContext, GpuError, GpuOptions};
pub use frame::{CommittedFrame, FrameError, FrameState, FrameSubmission};
pub use frame_image::FrameImage;
pub use pipeline::{
    MeshPipeline, PipelineDescriptor, PipelineError, ShaderInterface, ShaderProgram, VertexInput,
    SPHERE_COLOR,
};
pub use pipelines::MeshPipelineBuilder;
pub use renderer::{RenderError, SphereRenderer};
pub use surface::{DisplaySurface, Drawable, OffscreenSurface, WindowSurface};
