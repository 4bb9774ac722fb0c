//! Connected components ("polyhedra"), enclosed volume, inverted-shell
//! detection and the pruning passes built on them.

use super::TriangleMesh;
use crate::float_types::Real;
use nalgebra::{Point3, Vector3};
use std::collections::VecDeque;
use tracing::info;

/// A connected component of the face adjacency graph, as triangle indices.
pub type Polyhedron = Vec<usize>;

/// **Mathematical Foundation: Surface Topology Summary**
///
/// ## **Topological Invariants**
/// - **Euler Characteristic**: χ = V - E + F (2 per closed genus-0 shell)
/// - **Boundary Edges**: edges with a single incident triangle (0 when watertight)
/// - **Components**: edge-connected triangle sets
#[derive(Debug, Clone, PartialEq)]
pub struct TopologyAnalysis {
    /// Number of edge-connected triangle components
    pub components: usize,
    /// Number of edges used by exactly one triangle
    pub boundary_edges: usize,
    /// Number of edges shared by more than two triangles
    pub non_manifold_edges: usize,
    /// Vertices referenced by no triangle
    pub isolated_vertices: usize,
    /// Whether every manifold edge is traversed in opposite directions by its two triangles
    pub consistent_orientation: bool,
    /// Euler characteristic (V - E + F)
    pub euler_characteristic: i64,
    /// No boundary and no non-manifold edges
    pub is_closed: bool,
}

impl TriangleMesh {
    /// Partition all triangles into edge-connected components.
    ///
    /// Components are discovered in ascending order of their lowest triangle
    /// index; every triangle belongs to exactly one of them.
    pub fn polyhedra(&self) -> Vec<Polyhedron> {
        let n = self.num_triangles();
        let mut visited = vec![false; n];
        let mut polyhedra = Vec::new();

        for seed in 0..n {
            if visited[seed] {
                continue;
            }

            let mut polyhedron = Vec::new();
            let mut queue = VecDeque::from([seed]);
            visited[seed] = true;

            while let Some(t) = queue.pop_front() {
                polyhedron.push(t);
                for neighbour in self.face_neighbours(t) {
                    if !visited[neighbour] {
                        visited[neighbour] = true;
                        queue.push_back(neighbour);
                    }
                }
            }

            polyhedra.push(polyhedron);
        }

        polyhedra
    }

    /// Signed volume of the tetrahedron spanned by the origin and triangle `t`:
    /// `p₁ · (p₂ × p₃) / 6`. Positive for triangles wound counter-clockwise
    /// when seen from the side away from the origin.
    pub fn signed_triangle_volume(&self, t: usize) -> Real {
        let [a, b, c] = self.triangle_positions(t);
        a.coords.dot(&b.coords.cross(&c.coords)) / 6.0
    }

    /// **Mathematical Foundation: Divergence Theorem for Closed Shells**
    ///
    /// ```text
    /// V = | Σ_{t ∈ P} (p₁ · (p₂ × p₃)) / 6 |
    /// ```
    ///
    /// Exact for a closed, consistently wound component; the absolute value
    /// makes the result independent of the winding direction.
    pub fn polyhedron_volume(&self, polyhedron: &[usize]) -> Real {
        polyhedron.iter().map(|&t| self.signed_triangle_volume(t)).sum::<Real>().abs()
    }

    /// Total enclosed volume: the sum of every component's volume.
    pub fn volume(&self) -> Real {
        self.polyhedra().iter().map(|p| self.polyhedron_volume(p)).sum()
    }

    /// Mean of the component's triangle centres.
    fn polyhedron_centroid(&self, polyhedron: &[usize]) -> Point3<Real> {
        let sum = polyhedron
            .iter()
            .fold(Vector3::zeros(), |acc, &t| acc + self.triangle_center(t).coords);
        Point3::from(sum / polyhedron.len() as Real)
    }

    /// A component is a hole (an inward-facing shell, such as a cavity surface)
    /// when its face normals point, on balance, towards its own centroid:
    ///
    /// ```text
    /// Σ_{t ∈ P} (center(t) - centroid) · n̂(t) < 0
    /// ```
    pub fn is_polyhedron_hole(&self, polyhedron: &[usize]) -> bool {
        if polyhedron.is_empty() {
            return false;
        }
        let centroid = self.polyhedron_centroid(polyhedron);
        let outwardness: Real = polyhedron
            .iter()
            .map(|&t| (self.triangle_center(t) - centroid).dot(&self.face_normal(t)))
            .sum();
        outwardness < 0.0
    }

    /// Remove the triangles of the selected components, then unreferenced
    /// vertices (recomputing normals). Returns the number of triangles removed.
    fn remove_polyhedra_where<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&TriangleMesh, &[usize]) -> bool,
    {
        let doomed: Vec<usize> = {
            let mesh: &TriangleMesh = self;
            mesh.polyhedra()
                .into_iter()
                .filter(|p| predicate(mesh, p.as_slice()))
                .flatten()
                .collect()
        };
        if doomed.is_empty() {
            return 0;
        }

        let removed = self.remove_triangles(&doomed);
        self.remove_extraneous_vertices();
        removed
    }

    /// Remove every component whose enclosed volume is at most `volume`.
    /// No-op for non-positive thresholds.
    pub fn remove_minimum_volume_polyhedra(&mut self, volume: Real) -> usize {
        if volume <= 0.0 {
            return 0;
        }
        let removed = self.remove_polyhedra_where(|mesh, p| mesh.polyhedron_volume(p) <= volume);
        if removed > 0 {
            info!(removed, threshold = volume, "removed small-volume polyhedra");
        }
        removed
    }

    /// Remove every component made of at most `count` triangles.
    /// No-op for `count == 0`.
    pub fn remove_minimum_triangle_count_polyhedra(&mut self, count: usize) -> usize {
        if count == 0 {
            return 0;
        }
        let removed = self.remove_polyhedra_where(|_, p| p.len() <= count);
        if removed > 0 {
            info!(removed, threshold = count, "removed small polyhedra");
        }
        removed
    }

    /// Remove every component classified as a hole by [`is_polyhedron_hole`](Self::is_polyhedron_hole).
    pub fn remove_holes(&mut self) -> usize {
        let removed = self.remove_polyhedra_where(|mesh, p| mesh.is_polyhedron_hole(p));
        if removed > 0 {
            info!(removed, "removed inverted polyhedra");
        }
        removed
    }

    /// Edge-based topology summary of the whole mesh.
    pub fn analyze_topology(&self) -> TopologyAnalysis {
        let adjacency = self.edge_adjacency();
        let boundary_edges = adjacency.boundary_edge_count();
        let non_manifold_edges = adjacency.non_manifold_edge_count();

        let consistent_orientation = adjacency.iter().all(|(&(a, b), faces)| {
            if faces.len() != 2 {
                return true;
            }
            let forward = |t: usize| self.triangle(t).edges().contains(&(a, b));
            forward(faces[0]) != forward(faces[1])
        });

        let euler_characteristic = self.num_vertices() as i64 - adjacency.edge_count() as i64
            + self.num_triangles() as i64;

        TopologyAnalysis {
            components: self.polyhedra().len(),
            boundary_edges,
            non_manifold_edges,
            isolated_vertices: self.vertex_triangles().isolated_vertices(),
            consistent_orientation,
            euler_characteristic,
            is_closed: boundary_edges == 0 && non_manifold_edges == 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn cube_topology_is_closed_sphere() {
        let analysis = TriangleMesh::cube(1.0).analyze_topology();
        assert_eq!(
            analysis,
            TopologyAnalysis {
                components: 1,
                boundary_edges: 0,
                non_manifold_edges: 0,
                isolated_vertices: 0,
                consistent_orientation: true,
                euler_characteristic: 2,
                is_closed: true,
            }
        );
    }

    #[test]
    fn flipped_single_triangle_breaks_orientation() {
        let mut cube = TriangleMesh::cube(1.0);
        let first = cube.triangle(0).flipped();
        cube.remove_triangles(&[0]);
        cube.push_triangle(first);
        assert!(!cube.analyze_topology().consistent_orientation);
    }

    #[test]
    fn signed_volume_follows_winding() {
        let cube = TriangleMesh::cube(1.0);
        let signed: Real = (0..cube.num_triangles()).map(|t| cube.signed_triangle_volume(t)).sum();
        assert_relative_eq!(signed, 1.0, epsilon = 1e-12);
        let inverted = cube.flipped();
        let signed: Real = (0..inverted.num_triangles()).map(|t| inverted.signed_triangle_volume(t)).sum();
        assert_relative_eq!(signed, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn thresholds_at_zero_are_no_ops() {
        let mut cube = TriangleMesh::cube(1.0);
        assert_eq!(cube.remove_minimum_volume_polyhedra(0.0), 0);
        assert_eq!(cube.remove_minimum_volume_polyhedra(-1.0), 0);
        assert_eq!(cube.remove_minimum_triangle_count_polyhedra(0), 0);
        assert_eq!(cube.num_triangles(), 12);
    }
}
