//! Geometry of the unit cube.
//!
//! Eight corners at ±0.5 on each axis, colored by position so that each
//! corner maps to one vertex of the RGB color cube. Triangles wind
//! counter-clockwise seen from outside the cube.

use glam::Vec3;
use vkspin_rhi::vertex::Vertex;

/// Corner `i` sits at `-0.5 + bit` on each axis, with bit 0 for X, bit 1 for
/// Y and bit 2 for Z.
const fn corner(i: u32) -> Vertex {
    let x = (i & 1) as f32;
    let y = ((i >> 1) & 1) as f32;
    let z = ((i >> 2) & 1) as f32;
    Vertex::new(Vec3::new(x - 0.5, y - 0.5, z - 0.5), Vec3::new(x, y, z))
}

pub const CUBE_VERTICES: [Vertex; 8] = [
    corner(0),
    corner(1),
    corner(2),
    corner(3),
    corner(4),
    corner(5),
    corner(6),
    corner(7),
];

#[rustfmt::skip]
pub const CUBE_INDICES: [u16; 36] = [
    4, 5, 7, 7, 6, 4, // +Z
    0, 2, 3, 3, 1, 0, // -Z
    1, 3, 7, 7, 5, 1, // +X
    2, 0, 4, 4, 6, 2, // -X
    3, 2, 6, 6, 7, 3, // +Y
    0, 1, 5, 5, 4, 0, // -Y
];

/// Number of indices drawn per cube.
pub const CUBE_INDEX_COUNT: u32 = CUBE_INDICES.len() as u32;

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle(t: usize) -> [Vec3; 3] {
        let i = &CUBE_INDICES[t * 3..t * 3 + 3];
        [
            CUBE_VERTICES[i[0] as usize].position,
            CUBE_VERTICES[i[1] as usize].position,
            CUBE_VERTICES[i[2] as usize].position,
        ]
    }

    #[test]
    fn test_corners() {
        assert_eq!(CUBE_VERTICES[0].position, Vec3::splat(-0.5));
        assert_eq!(CUBE_VERTICES[7].position, Vec3::splat(0.5));
        assert_eq!(CUBE_VERTICES[5].position, Vec3::new(0.5, -0.5, 0.5));
        assert_eq!(CUBE_VERTICES[5].color, Vec3::new(1.0, 0.0, 1.0));
    }

    #[test]
    fn test_indices_in_range() {
        assert_eq!(CUBE_INDEX_COUNT, 36);
        assert!(
            CUBE_INDICES
                .iter()
                .all(|&i| (i as usize) < CUBE_VERTICES.len())
        );
    }

    #[test]
    fn test_triangles_face_outward() {
        for t in 0..12 {
            let [a, b, c] = triangle(t);
            let normal = (b - a).cross(c - a);
            let center = (a + b + c) / 3.0;
            assert!(
                normal.dot(center) > 0.0,
                "triangle {} winds inward: {:?}",
                t,
                [a, b, c]
            );
        }
    }

    #[test]
    fn test_every_face_covered_twice() {
        // Each axis-aligned face contributes exactly two triangles.
        let mut counts = std::collections::HashMap::new();
        for t in 0..12 {
            let [a, b, c] = triangle(t);
            let normal = (b - a).cross(c - a).normalize();
            let key = (
                normal.x.round() as i32,
                normal.y.round() as i32,
                normal.z.round() as i32,
            );
            *counts.entry(key).or_insert(0) += 1;
        }
        assert_eq!(counts.len(), 6);
        assert!(counts.values().all(|&n| n == 2));
    }
}
