//! Upload of CPU meshes into GPU vertex and index buffers.

use super::{CpuMesh, MeshError, VertexLayout};
use crate::gpu::GpuContext;
use std::sync::Arc;
use wgpu::util::DeviceExt;
use wgpu::{Buffer, Device, IndexFormat};

/// One drawable primitive group: its own index buffer plus count and width.
#[derive(Debug, Clone)]
pub struct Submesh {
    pub index_buffer: Buffer,
    pub index_count: u32,
    pub index_format: IndexFormat,
}

impl Submesh {
    /// Size in bytes of a single index.
    pub fn index_width(&self) -> u64 {
        if self.index_format == IndexFormat::Uint16 {
            2
        } else {
            4
        }
    }
}

/// A mesh resident in GPU memory. Immutable after allocation.
#[derive(Debug, Clone)]
pub struct GpuMesh {
    pub label: String,
    pub vertex_buffer: Buffer,
    pub vertex_count: u32,
    pub layout: VertexLayout,
    pub submeshes: Vec<Submesh>,
}

impl GpuMesh {
    /// The first submesh; a sphere has exactly one.
    pub fn primary_submesh(&self) -> Result<&Submesh, MeshError> {
        self.submeshes
            .first()
            .ok_or_else(|| MeshError::NoSubmesh(self.label.clone()))
    }
}

/// Allocates vertex and index buffers on a device.
pub struct MeshBufferAllocator {
    device: Arc<Device>,
    max_buffer_size: u64,
}

impl MeshBufferAllocator {
    /// Create an allocator bound to the context's device.
    pub fn new(ctx: &GpuContext) -> Self {
        Self {
            device: ctx.device.clone(),
            max_buffer_size: ctx.device.limits().max_buffer_size,
        }
    }

    /// Upload a CPU mesh.
    pub fn allocate(&self, mesh: &CpuMesh) -> Result<GpuMesh, MeshError> {
        if mesh.vertices.is_empty() || mesh.indices.is_empty() {
            return Err(MeshError::Empty(mesh.label.clone()));
        }
        if mesh.submeshes.is_empty() {
            return Err(MeshError::NoSubmesh(mesh.label.clone()));
        }

        let vertex_label = format!("{}_vertices", mesh.label);
        let vertex_bytes: &[u8] = bytemuck::cast_slice(&mesh.vertices);
        self.check_size(&vertex_label, vertex_bytes.len() as u64)?;
        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&vertex_label),
                contents: vertex_bytes,
                usage: wgpu::BufferUsages::VERTEX,
            });

        let index_format = mesh.index_format();
        let mut submeshes = Vec::with_capacity(mesh.submeshes.len());
        for (i, range) in mesh.submeshes.iter().enumerate() {
            let indices = mesh.submesh_indices(*range).ok_or_else(|| {
                MeshError::InvalidParams(format!(
                    "submesh {i} range {}..{} exceeds {} indices",
                    range.start,
                    range.start + range.count,
                    mesh.indices.len()
                ))
            })?;

            let index_label = format!("{}_indices_{i}", mesh.label);
            let index_bytes: Vec<u8> = if index_format == IndexFormat::Uint16 {
                let narrow: Vec<u16> = indices.iter().map(|&i| i as u16).collect();
                bytemuck::cast_slice(&narrow).to_vec()
            } else {
                bytemuck::cast_slice(indices).to_vec()
            };
            self.check_size(&index_label, index_bytes.len() as u64)?;

            let index_buffer = self
                .device
                .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&index_label),
                    contents: &index_bytes,
                    usage: wgpu::BufferUsages::INDEX,
                });

            submeshes.push(Submesh {
                index_buffer,
                index_count: range.count,
                index_format,
            });
        }

        log::info!(
            "Allocated mesh '{}': {} vertices, {} submesh(es), {:?} indices",
            mesh.label,
            mesh.vertices.len(),
            submeshes.len(),
            index_format
        );

        Ok(GpuMesh {
            label: mesh.label.clone(),
            vertex_buffer,
            vertex_count: mesh.vertices.len() as u32,
            layout: mesh.layout.clone(),
            submeshes,
        })
    }

    fn check_size(&self, label: &str, size: u64) -> Result<(), MeshError> {
        if size > self.max_buffer_size {
            return Err(MeshError::AllocationTooLarge {
                label: label.to_string(),
                size,
                max: self.max_buffer_size,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{generate_sphere, SphereParams};

    #[tokio::test]
    async fn test_allocate_sphere() {
        let ctx = match GpuContext::new().await {
            Ok(ctx) => ctx,
            Err(_) => return,
        };

        let cpu = generate_sphere(&SphereParams::default()).unwrap();
        let mesh = MeshBufferAllocator::new(&ctx).allocate(&cpu).unwrap();

        assert_eq!(mesh.vertex_count, 101 * 101);
        let submesh = mesh.primary_submesh().unwrap();
        assert_eq!(submesh.index_count, 60_000);
        assert_eq!(submesh.index_width(), 2);
        assert_eq!(mesh.vertex_buffer.size(), 101 * 101 * 32);
    }

    #[tokio::test]
    async fn test_allocate_empty_mesh_fails() {
        let ctx = match GpuContext::new().await {
            Ok(ctx) => ctx,
            Err(_) => return,
        };

        let mut cpu = generate_sphere(&SphereParams::default()).unwrap();
        cpu.indices.clear();
        let result = MeshBufferAllocator::new(&ctx).allocate(&cpu);
        assert!(matches!(result, Err(MeshError::Empty(_))));
    }
}
