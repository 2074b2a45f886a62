//! # Primitive Shape Generation
//!
//! Quad and cube builders for the city scene. Quad corners are passed
//! counter-clockwise as seen from the front face; the normal follows from
//! the winding and the tangent follows the texture-space u direction.

use cgmath::{InnerSpace, Vector3};

use super::GeometryData;

/// Appends one textured quad to `data`
///
/// Corners `a, b, c, d` are counter-clockwise viewed from the front; UVs map
/// a=(0,0), b=(0,1), c=(1,1), d=(1,0).
fn push_quad(data: &mut GeometryData, a: [f32; 3], b: [f32; 3], c: [f32; 3], d: [f32; 3]) {
    let va = Vector3::from(a);
    let vb = Vector3::from(b);
    let vc = Vector3::from(c);
    let vd = Vector3::from(d);

    let normal: [f32; 3] = (vb - va).cross(vc - va).normalize().into();
    let tangent: [f32; 3] = (vd - va).normalize().into();

    let base = data.positions.len() as u32;
    data.positions.extend_from_slice(&[a, b, c, d]);
    data.normals.extend_from_slice(&[normal; 4]);
    data.tangents.extend_from_slice(&[tangent; 4]);
    data.tex_coords
        .extend_from_slice(&[[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0]]);
    data.indices
        .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
}

/// Generate a single quad from four corners
pub fn quad(a: [f32; 3], b: [f32; 3], c: [f32; 3], d: [f32; 3]) -> GeometryData {
    let mut data = GeometryData::new();
    push_quad(&mut data, a, b, c, d);
    data
}

/// Generate a cube spanning -1 to 1 on all axes
///
/// One quad per face with outward normals; building footprints are made by
/// scaling this unit cube.
pub fn cube() -> GeometryData {
    let mut data = GeometryData::new();

    // Front (+Z)
    push_quad(
        &mut data,
        [-1.0, -1.0, 1.0],
        [1.0, -1.0, 1.0],
        [1.0, 1.0, 1.0],
        [-1.0, 1.0, 1.0],
    );
    // Back (-Z)
    push_quad(
        &mut data,
        [1.0, -1.0, -1.0],
        [-1.0, -1.0, -1.0],
        [-1.0, 1.0, -1.0],
        [1.0, 1.0, -1.0],
    );
    // Left (-X)
    push_quad(
        &mut data,
        [-1.0, -1.0, -1.0],
        [-1.0, -1.0, 1.0],
        [-1.0, 1.0, 1.0],
        [-1.0, 1.0, -1.0],
    );
    // Right (+X)
    push_quad(
        &mut data,
        [1.0, -1.0, 1.0],
        [1.0, -1.0, -1.0],
        [1.0, 1.0, -1.0],
        [1.0, 1.0, 1.0],
    );
    // Top (+Y)
    push_quad(
        &mut data,
        [-1.0, 1.0, 1.0],
        [1.0, 1.0, 1.0],
        [1.0, 1.0, -1.0],
        [-1.0, 1.0, -1.0],
    );
    // Bottom (-Y)
    push_quad(
        &mut data,
        [-1.0, -1.0, -1.0],
        [1.0, -1.0, -1.0],
        [1.0, -1.0, 1.0],
        [-1.0, -1.0, 1.0],
    );

    data
}

/// Generate a square ground plane in the XZ plane facing up
///
/// Spans `-half_size` to `half_size` with UVs tiled `uv_repeat` times.
pub fn terrain(half_size: f32, uv_repeat: f32) -> GeometryData {
    let mut data = quad(
        [-half_size, 0.0, half_size],
        [half_size, 0.0, half_size],
        [half_size, 0.0, -half_size],
        [-half_size, 0.0, -half_size],
    );
    for uv in &mut data.tex_coords {
        uv[0] *= uv_repeat;
        uv[1] *= uv_repeat;
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cube_generation() {
        let cube = cube();
        assert_eq!(cube.positions.len(), 24); // 6 faces * 4 vertices
        assert_eq!(cube.indices.len(), 36); // 6 faces * 2 triangles * 3 indices
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.triangle_count(), 12);
    }

    #[test]
    fn cube_normals_point_outward() {
        let cube = cube();
        for (position, normal) in cube.positions.iter().zip(&cube.normals) {
            let p = Vector3::from(*position);
            let n = Vector3::from(*normal);
            assert!(p.dot(n) > 0.0, "normal {:?} points into the cube", normal);
        }
    }

    #[test]
    fn terrain_faces_up() {
        let ground = terrain(40.0, 8.0);
        assert_eq!(ground.vertex_count(), 4);
        for normal in &ground.normals {
            assert_relative_eq!(normal[1], 1.0, epsilon = 1e-6);
        }
        assert_eq!(ground.tex_coords[2], [8.0, 8.0]);
    }

    #[test]
    fn quad_tangent_follows_u_direction() {
        let q = quad(
            [0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [2.0, 1.0, 0.0],
            [2.0, 0.0, 0.0],
        );
        assert_relative_eq!(q.tangents[0][0], 1.0, epsilon = 1e-6);
    }
}
