//! Test support library
//! Provides various helper functions & utilities for tests.
#![allow(dead_code)]

use nalgebra::{Point3, Vector3};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tricell::float_types::Real;
use tricell::mesh::{Triangle, TriangleMesh};

/// Quick helper to compare floating-point results with an acceptable tolerance.
pub fn approx_eq(a: Real, b: Real, eps: Real) -> bool {
    (a - b).abs() < eps
}

/// Axis-aligned cube of edge `size` whose minimum corner is `min`.
pub fn cube_at(min: [Real; 3], size: Real) -> TriangleMesh {
    let min = Point3::new(min[0], min[1], min[2]);
    TriangleMesh::cuboid(min, min + Vector3::repeat(size))
}

/// Deterministic generator for classification tests.
pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// A single triangle in the z = 0 plane.
pub fn single_triangle() -> TriangleMesh {
    TriangleMesh::from_parts(
        vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)],
        vec![Triangle::new(0, 1, 2)],
    )
}

/// Open strip of `n` quads along x (2n triangles, 2(n+1) vertices).
pub fn strip(n: usize) -> TriangleMesh {
    let mut vertices = Vec::new();
    for i in 0..=n {
        vertices.push(Point3::new(i as Real, 0.0, 0.0));
        vertices.push(Point3::new(i as Real, 1.0, 0.0));
    }
    let mut triangles = Vec::new();
    for i in 0..n {
        let (a, b, c, d) = (2 * i, 2 * i + 1, 2 * i + 2, 2 * i + 3);
        triangles.push(Triangle::new(a, c, d));
        triangles.push(Triangle::new(a, d, b));
    }
    TriangleMesh::from_parts(vertices, triangles)
}

/// Smallest distance between two distinct vertices of `mesh`.
pub fn min_vertex_spacing(mesh: &TriangleMesh) -> Real {
    let v = mesh.vertices();
    let mut best = Real::MAX;
    for i in 0..v.len() {
        for j in i + 1..v.len() {
            best = best.min((v[i] - v[j]).norm());
        }
    }
    best
}
