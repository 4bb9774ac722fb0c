//! Closed primitive meshes with outward-facing winding.

use super::{Triangle, TriangleMesh};
use crate::float_types::Real;
use nalgebra::{Point3, Vector3};

/// Corner `n` of a box has bit 0 → max x, bit 1 → max y, bit 2 → max z.
const CUBOID_TRIANGLES: [[usize; 3]; 12] = [
    // -X
    [0, 4, 6],
    [0, 6, 2],
    // +X
    [1, 3, 7],
    [1, 7, 5],
    // -Y
    [0, 1, 5],
    [0, 5, 4],
    // +Y
    [2, 6, 7],
    [2, 7, 3],
    // -Z
    [0, 2, 3],
    [0, 3, 1],
    // +Z
    [4, 5, 7],
    [4, 7, 6],
];

impl TriangleMesh {
    /// Axis-aligned box spanning `min..max`: 8 vertices, 12 triangles,
    /// counter-clockwise when seen from outside, vertex normals populated.
    pub fn cuboid(min: Point3<Real>, max: Point3<Real>) -> TriangleMesh {
        let vertices = (0..8)
            .map(|n| {
                Point3::new(
                    if n & 1 == 0 { min.x } else { max.x },
                    if n & 2 == 0 { min.y } else { max.y },
                    if n & 4 == 0 { min.z } else { max.z },
                )
            })
            .collect();
        let triangles = CUBOID_TRIANGLES.iter().map(|&[a, b, c]| Triangle::new(a, b, c)).collect();

        let mut mesh = TriangleMesh::from_parts(vertices, triangles);
        mesh.update_vertex_normals();
        mesh
    }

    /// Cube of edge `size` with one corner at the origin.
    ///
    /// ```rust
    /// # use tricell::mesh::TriangleMesh;
    /// let cube = TriangleMesh::cube(2.0);
    /// assert_eq!(cube.num_triangles(), 12);
    /// assert!((cube.volume() - 8.0).abs() < 1e-9);
    /// ```
    pub fn cube(size: Real) -> TriangleMesh {
        TriangleMesh::cuboid(Point3::origin(), Point3::from(Vector3::repeat(size)))
    }

    /// Regular-ish tetrahedron with corners at the origin and on the three axes
    /// at distance `size`.
    pub fn tetrahedron(size: Real) -> TriangleMesh {
        let vertices = vec![
            Point3::origin(),
            Point3::new(size, 0.0, 0.0),
            Point3::new(0.0, size, 0.0),
            Point3::new(0.0, 0.0, size),
        ];
        let triangles = vec![
            Triangle::new(0, 2, 1),
            Triangle::new(0, 1, 3),
            Triangle::new(0, 3, 2),
            Triangle::new(1, 2, 3),
        ];
        let mut mesh = TriangleMesh::from_parts(vertices, triangles);
        mesh.update_vertex_normals();
        mesh
    }

    /// The same surface with every triangle's winding reversed.
    pub fn flipped(&self) -> TriangleMesh {
        let mut mesh = TriangleMesh::from_parts(
            self.vertices.clone(),
            self.triangles.iter().map(Triangle::flipped).collect(),
        );
        mesh.colors = self.colors.clone();
        mesh.update_vertex_normals();
        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn cuboid_faces_point_outward() {
        let mesh = TriangleMesh::cuboid(Point3::new(-1.0, -1.0, -1.0), Point3::new(1.0, 1.0, 1.0));
        for t in 0..mesh.num_triangles() {
            let outward = mesh.triangle_center(t).coords;
            assert!(mesh.face_normal(t).dot(&outward) > 0.0, "triangle {t} faces inward");
        }
        assert!(mesh.validate().is_empty());
        assert_eq!(mesh.edge_adjacency().boundary_edge_count(), 0);
    }

    #[test]
    fn tetrahedron_faces_point_outward() {
        let mesh = TriangleMesh::tetrahedron(1.0);
        let centroid = Point3::new(0.25, 0.25, 0.25);
        for t in 0..mesh.num_triangles() {
            let outward = mesh.triangle_center(t) - centroid;
            assert!(mesh.face_normal(t).dot(&outward) > 0.0, "triangle {t} faces inward");
        }
        assert_relative_eq!(mesh.volume(), 1.0 / 6.0, epsilon = 1e-12);
    }

    #[test]
    fn flipped_reverses_normals() {
        let cube = TriangleMesh::cube(1.0);
        let inverted = cube.flipped();
        for t in 0..cube.num_triangles() {
            assert_relative_eq!(cube.face_normal(t), -inverted.face_normal(t));
        }
    }
}
