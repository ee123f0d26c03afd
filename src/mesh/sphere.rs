//! Procedural UV sphere generation.

use super::{CpuMesh, MeshError, MeshVertex, SubmeshRange, VertexLayout};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Parameters for [`generate_sphere`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SphereParams {
    /// Bounding box size along x, y and z. Radii are half of these.
    pub extents: [f32; 3],
    /// Radial (longitude) and vertical (latitude) segment counts.
    pub segments: [u32; 2],
    /// Point normals toward the center and flip triangle winding.
    pub inward_normals: bool,
}

impl Default for SphereParams {
    fn default() -> Self {
        Self {
            extents: [0.2, 0.2, 0.2],
            segments: [100, 100],
            inward_normals: false,
        }
    }
}

impl SphereParams {
    /// Check that the parameters describe a closed, non-degenerate sphere.
    pub fn validate(&self) -> Result<(), MeshError> {
        if self.extents.iter().any(|e| !e.is_finite() || *e <= 0.0) {
            return Err(MeshError::InvalidParams(format!(
                "extents must be positive, got {:?}",
                self.extents
            )));
        }
        let [radial, vertical] = self.segments;
        if radial < 3 || vertical < 2 {
            return Err(MeshError::InvalidParams(format!(
                "need at least 3 radial and 2 vertical segments, got {radial}x{vertical}"
            )));
        }
        Ok(())
    }

    /// Number of indices the generator will emit.
    pub fn index_count(&self) -> u64 {
        self.segments[0] as u64 * self.segments[1] as u64 * 6
    }
}

/// Generate a UV sphere (ellipsoid when extents differ).
///
/// Vertices form a `(radial + 1) x (vertical + 1)` grid so the texture seam
/// is duplicated. Every grid quad becomes two triangles, including the
/// degenerate ones touching the poles, so the index count is always
/// `radial * vertical * 6`. Outward-facing triangles wind counter-clockwise.
pub fn generate_sphere(params: &SphereParams) -> Result<CpuMesh, MeshError> {
    params.validate()?;

    let [radial, vertical] = params.segments;
    let radii = params.extents.map(|e| e * 0.5);
    let normal_sign = if params.inward_normals { -1.0 } else { 1.0 };

    let mut vertices = Vec::with_capacity(((radial + 1) * (vertical + 1)) as usize);
    for ring in 0..=vertical {
        let theta = ring as f32 * PI / vertical as f32;
        let (sin_theta, cos_theta) = theta.sin_cos();

        for segment in 0..=radial {
            let phi = segment as f32 * 2.0 * PI / radial as f32;
            let (sin_phi, cos_phi) = phi.sin_cos();

            let unit = [sin_theta * cos_phi, cos_theta, sin_theta * sin_phi];
            let position = [unit[0] * radii[0], unit[1] * radii[1], unit[2] * radii[2]];

            // Ellipsoid surface gradient, which reduces to `unit` for a sphere.
            let gradient = [unit[0] / radii[0], unit[1] / radii[1], unit[2] / radii[2]];
            let len = gradient.iter().map(|g| g * g).sum::<f32>().sqrt();
            let normal = gradient.map(|g| normal_sign * g / len);

            vertices.push(MeshVertex {
                position,
                normal,
                uv: [
                    segment as f32 / radial as f32,
                    ring as f32 / vertical as f32,
                ],
            });
        }
    }

    let mut indices = Vec::with_capacity(params.index_count() as usize);
    for ring in 0..vertical {
        for segment in 0..radial {
            let current = ring * (radial + 1) + segment;
            let next = current + radial + 1;

            let quad = [
                [current, current + 1, next],
                [current + 1, next + 1, next],
            ];
            for [a, b, c] in quad {
                if params.inward_normals {
                    indices.extend_from_slice(&[a, c, b]);
                } else {
                    indices.extend_from_slice(&[a, b, c]);
                }
            }
        }
    }

    let index_count = indices.len() as u32;
    Ok(CpuMesh {
        label: "sphere".to_string(),
        vertices,
        indices,
        layout: VertexLayout::position_normal_uv(),
        submeshes: vec![SubmeshRange {
            start: 0,
            count: index_count,
        }],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params() {
        let params = SphereParams::default();
        assert_eq!(params.extents, [0.2, 0.2, 0.2]);
        assert_eq!(params.segments, [100, 100]);
        assert!(!params.inward_normals);
        assert_eq!(params.index_count(), 60_000);
    }

    #[test]
    fn test_small_sphere_counts() {
        let mesh = generate_sphere(&SphereParams {
            segments: [8, 4],
            ..Default::default()
        })
        .unwrap();
        assert_eq!(mesh.vertices.len(), 9 * 5);
        assert_eq!(mesh.indices.len(), 8 * 4 * 6);
        assert_eq!(mesh.submeshes.len(), 1);
    }

    #[test]
    fn test_rejects_bad_params() {
        let zero_extent = SphereParams {
            extents: [0.2, 0.0, 0.2],
            ..Default::default()
        };
        assert!(matches!(
            generate_sphere(&zero_extent),
            Err(MeshError::InvalidParams(_))
        ));

        let nan_extent = SphereParams {
            extents: [f32::NAN, 0.2, 0.2],
            ..Default::default()
        };
        assert!(nan_extent.validate().is_err());

        let too_few = SphereParams {
            segments: [2, 10],
            ..Default::default()
        };
        assert!(too_few.validate().is_err());
    }

    #[test]
    fn test_params_from_partial_json() {
        let params: SphereParams = serde_json::from_str(r#"{"segments": [16, 8]}"#).unwrap();
        assert_eq!(params.segments, [16, 8]);
        assert_eq!(params.extents, [0.2, 0.2, 0.2]);
    }
}
