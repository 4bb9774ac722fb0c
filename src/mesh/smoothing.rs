//! Laplacian smoothing over the vertex → triangle incidence table

use super::TriangleMesh;
use crate::float_types::Real;
use nalgebra::{Point3, Vector3};

impl TriangleMesh {
    /// **Mathematical Foundation: Umbrella-Operator Laplacian Smoothing**
    ///
    /// For each selected vertex `v`, the target is the mean of the other corners
    /// of every incident triangle (a corner shared by two triangles counts twice):
    ///
    /// ```text
    /// avg(v) = (1/|C(v)|) · Σ_{c ∈ C(v)} c
    /// v' = v + λ · (avg(v) - v),   λ ∈ [0, 1]
    /// ```
    ///
    /// All vertices of one iteration read the positions of the previous one
    /// (Jacobi update). Vertex normals are recomputed at the end.
    ///
    /// # Parameters
    /// - `value`: smoothing factor λ, clamped into `[0, 1]`
    /// - `iterations`: number of smoothing passes
    pub fn smooth(&mut self, value: Real, iterations: usize) {
        let all: Vec<usize> = (0..self.vertices.len()).collect();
        self.smooth_vertices(value, iterations, &all);
    }

    /// Like [`smooth`](Self::smooth) but only moves the listed vertices; the
    /// rest stay fixed and still act as neighbours. Out-of-range indices are ignored.
    pub fn smooth_vertices(&mut self, value: Real, iterations: usize, verts: &[usize]) {
        let lambda = value.clamp(0.0, 1.0);

        let mut selected = vec![false; self.vertices.len()];
        for &v in verts {
            if let Some(flag) = selected.get_mut(v) {
                *flag = true;
            }
        }

        let incidence = self.vertex_triangles().clone();
        for _iteration in 0..iterations {
            let previous = self.vertices.clone();
            for (v, moving) in selected.iter().enumerate() {
                if !moving {
                    continue;
                }

                let mut sum = Vector3::zeros();
                let mut count = 0usize;
                for &t in incidence.triangles_of(v) {
                    for &corner in &self.triangles[t].0 {
                        if corner != v {
                            sum += previous[corner].coords;
                            count += 1;
                        }
                    }
                }
                if count == 0 {
                    continue;
                }

                let avg = Point3::from(sum / count as Real);
                self.vertices[v] = previous[v] + (avg - previous[v]) * lambda;
            }
        }

        self.invalidate_geometry();
        self.update_vertex_normals();
    }
}
