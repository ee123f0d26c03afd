//! Mesh generation and GPU upload.
//!
//! This module provides:
//! - Vertex layout descriptions shared with pipeline construction
//! - Procedural UV sphere generation on the CPU
//! - A buffer allocator that turns CPU meshes into GPU-resident buffers

pub mod allocator;
pub mod layout;
pub mod sphere;

pub use allocator::{GpuMesh, MeshBufferAllocator, Submesh};
pub use layout::{VertexAttribute, VertexLayout};
pub use sphere::{generate_sphere, SphereParams};

/// Errors that can occur while generating or allocating meshes.
#[derive(Debug, thiserror::Error)]
pub enum MeshError {
    #[error("Invalid mesh parameters: {0}")]
    InvalidParams(String),
    #[error("Mesh '{0}' has no vertices or indices")]
    Empty(String),
    #[error("Mesh '{0}' has no submesh")]
    NoSubmesh(String),
    #[error("Buffer '{label}' needs {size} bytes, device allows {max}")]
    AllocationTooLarge { label: String, size: u64, max: u64 },
}

/// Interleaved vertex matching [`VertexLayout::position_normal_uv`].
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

/// A contiguous range of the index list drawn as one primitive group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmeshRange {
    pub start: u32,
    pub count: u32,
}

/// Mesh data on the CPU, before upload.
#[derive(Debug, Clone)]
pub struct CpuMesh {
    pub label: String,
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
    pub layout: VertexLayout,
    pub submeshes: Vec<SubmeshRange>,
}

impl CpuMesh {
    /// Narrowest index format able to address every vertex.
    pub fn index_format(&self) -> wgpu::IndexFormat {
        if self.vertices.len() <= u16::MAX as usize {
            wgpu::IndexFormat::Uint16
        } else {
            wgpu::IndexFormat::Uint32
        }
    }

    /// Indices of one submesh, or `None` if the range is out of bounds.
    pub fn submesh_indices(&self, range: SubmeshRange) -> Option<&[u32]> {
        let start = range.start as usize;
        self.indices.get(start..start + range.count as usize)
    }

    /// Total number of triangles across all submeshes.
    pub fn triangle_count(&self) -> u32 {
        self.submeshes.iter().map(|s| s.count / 3).sum()
    }
}
