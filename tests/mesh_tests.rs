//! Integration tests for sphere generation.

use sphere_frame::mesh::{CpuMesh, MeshError, SphereParams};
use sphere_frame::generate_sphere;

fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn cross(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn dot(a: [f32; 3], b: [f32; 3]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn sphere(radial: u32, vertical: u32) -> CpuMesh {
    generate_sphere(&SphereParams {
        segments: [radial, vertical],
        ..Default::default()
    })
    .unwrap()
}

#[test]
fn test_default_sphere_golden_counts() {
    let mesh = generate_sphere(&SphereParams::default()).unwrap();

    assert_eq!(mesh.submeshes.len(), 1);
    assert_eq!(mesh.submeshes[0].count, 60_000);
    assert_eq!(mesh.indices.len(), 100 * 100 * 6);
    assert_eq!(mesh.vertices.len(), 101 * 101);
    assert_eq!(mesh.triangle_count(), 20_000);
    assert_eq!(mesh.index_format(), wgpu::IndexFormat::Uint16);
}

#[test]
fn test_index_count_divisible_by_three() {
    for (radial, vertical) in [(3, 2), (3, 3), (7, 5), (32, 16), (64, 64)] {
        let mesh = sphere(radial, vertical);
        assert_eq!(mesh.submeshes.len(), 1);
        let count = mesh.submeshes[0].count;
        assert!(count > 0);
        assert_eq!(count % 3, 0, "{radial}x{vertical} gave {count} indices");
    }
}

#[test]
fn test_indices_address_existing_vertices() {
    let mesh = sphere(12, 9);
    let max = *mesh.indices.iter().max().unwrap();
    assert!((max as usize) < mesh.vertices.len());
}

#[test]
fn test_generation_is_deterministic() {
    let a = sphere(24, 12);
    let b = sphere(24, 12);
    assert_eq!(a.indices, b.indices);
    assert_eq!(a.vertices, b.vertices);
}

#[test]
fn test_positions_stay_within_extents() {
    let params = SphereParams {
        extents: [0.4, 0.2, 0.1],
        segments: [20, 10],
        inward_normals: false,
    };
    let mesh = generate_sphere(&params).unwrap();

    for v in &mesh.vertices {
        for axis in 0..3 {
            assert!(v.position[axis].abs() <= params.extents[axis] * 0.5 + 1e-6);
        }
    }

    let max_x = mesh.vertices.iter().map(|v| v.position[0]).fold(f32::MIN, f32::max);
    let max_y = mesh.vertices.iter().map(|v| v.position[1]).fold(f32::MIN, f32::max);
    assert!((max_x - 0.2).abs() < 1e-6);
    assert!((max_y - 0.1).abs() < 1e-6);
}

#[test]
fn test_normals_are_unit_and_outward() {
    let mesh = sphere(16, 8);
    for v in &mesh.vertices {
        let len = dot(v.normal, v.normal).sqrt();
        assert!((len - 1.0).abs() < 1e-4);
        assert!(dot(v.normal, v.position) > 0.0);
    }
}

#[test]
fn test_inward_normals_point_to_center() {
    let mesh = generate_sphere(&SphereParams {
        segments: [16, 8],
        inward_normals: true,
        ..Default::default()
    })
    .unwrap();
    assert!(mesh
        .vertices
        .iter()
        .all(|v| dot(v.normal, v.position) < 0.0));
}

#[test]
fn test_winding_agrees_with_normals() {
    for inward_normals in [false, true] {
        let mesh = generate_sphere(&SphereParams {
            segments: [16, 8],
            inward_normals,
            ..Default::default()
        })
        .unwrap();

        // Both triangles of the first quad on the equator ring.
        let first = (4 * 16) * 6;
        for tri in mesh.indices[first..first + 6].chunks_exact(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| mesh.vertices[i as usize]);
            let face = cross(sub(b.position, a.position), sub(c.position, a.position));
            assert!(
                dot(face, a.normal) > 0.0,
                "triangle {:?} winds against its normal (inward = {})",
                tri,
                inward_normals
            );
        }
    }
}

#[test]
fn test_seam_vertices_are_duplicated() {
    let mesh = sphere(8, 4);
    // First and last vertex of an equator row share a position but not a texcoord.
    let row = 2 * 9;
    let first = mesh.vertices[row];
    let last = mesh.vertices[row + 8];
    for axis in 0..3 {
        assert!((first.position[axis] - last.position[axis]).abs() < 1e-6);
    }
    assert_eq!(first.uv[0], 0.0);
    assert_eq!(last.uv[0], 1.0);
}

#[test]
fn test_invalid_params_are_rejected() {
    let cases = [
        SphereParams {
            extents: [0.0, 0.2, 0.2],
            ..Default::default()
        },
        SphereParams {
            extents: [0.2, -0.2, 0.2],
            ..Default::default()
        },
        SphereParams {
            extents: [0.2, 0.2, f32::INFINITY],
            ..Default::default()
        },
        SphereParams {
            segments: [2, 10],
            ..Default::default()
        },
        SphereParams {
            segments: [10, 1],
            ..Default::default()
        },
    ];
    for params in cases {
        assert!(
            matches!(generate_sphere(&params), Err(MeshError::InvalidParams(_))),
            "{:?} should be rejected",
            params
        );
    }
}
