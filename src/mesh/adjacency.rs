//! Vertex → triangle and edge → triangle incidence tables.
//!
//! Both tables are derived data: [`TriangleMesh`](super::TriangleMesh) builds
//! them lazily and drops them whenever its triangle list changes.

use super::Triangle;
use hashbrown::HashMap;

/// Edge key with the smaller vertex index first.
#[inline]
pub const fn normalize_edge(a: usize, b: usize) -> (usize, usize) {
    if a < b { (a, b) } else { (b, a) }
}

/// For every vertex, the triangles that reference it (ascending triangle index).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VertexTriangles {
    lists: Vec<Vec<usize>>,
}

impl VertexTriangles {
    pub fn build(num_vertices: usize, triangles: &[Triangle]) -> Self {
        let mut lists = vec![Vec::new(); num_vertices];
        for (t, tri) in triangles.iter().enumerate() {
            for &v in &tri.0 {
                if let Some(list) = lists.get_mut(v) {
                    list.push(t);
                }
            }
        }
        Self { lists }
    }

    /// Triangles incident to `v`; empty for isolated or unknown vertices.
    #[inline]
    pub fn triangles_of(&self, v: usize) -> &[usize] {
        self.lists.get(v).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn num_vertices(&self) -> usize {
        self.lists.len()
    }

    /// Vertices referenced by no triangle.
    pub fn isolated_vertices(&self) -> usize {
        self.lists.iter().filter(|l| l.is_empty()).count()
    }
}

/// **Mathematical Foundation: Edge-Based Face Adjacency**
///
/// Each undirected edge `{a, b}` maps to every triangle containing it. Two
/// triangles are neighbours iff they share an edge, which makes the relation
/// symmetric by construction.
///
/// ## **Edge Classification**
/// - **Boundary**: exactly one incident triangle
/// - **Manifold**: exactly two incident triangles
/// - **Non-manifold**: three or more incident triangles
#[derive(Debug, Clone, Default)]
pub struct EdgeAdjacency {
    edge_to_faces: HashMap<(usize, usize), Vec<usize>>,
}

impl EdgeAdjacency {
    pub fn build(triangles: &[Triangle]) -> Self {
        let mut edge_to_faces: HashMap<(usize, usize), Vec<usize>> =
            HashMap::with_capacity(triangles.len() * 3 / 2);

        for (t, tri) in triangles.iter().enumerate() {
            for (a, b) in tri.edges() {
                let faces = edge_to_faces.entry(normalize_edge(a, b)).or_default();
                // A triangle lists an edge once even if it repeats a vertex.
                if faces.last() != Some(&t) {
                    faces.push(t);
                }
            }
        }

        Self { edge_to_faces }
    }

    /// Triangles sharing the undirected edge `{a, b}`.
    pub fn faces_for_edge(&self, a: usize, b: usize) -> &[usize] {
        self.edge_to_faces.get(&normalize_edge(a, b)).map(Vec::as_slice).unwrap_or_default()
    }

    /// Triangles sharing at least one edge with triangle `t`, ascending, excluding `t`.
    pub fn neighbours_of(&self, t: usize, tri: &Triangle) -> Vec<usize> {
        let mut out: Vec<usize> = tri
            .edges()
            .iter()
            .flat_map(|&(a, b)| self.faces_for_edge(a, b).iter().copied())
            .filter(|&other| other != t)
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    pub fn edge_count(&self) -> usize {
        self.edge_to_faces.len()
    }

    pub fn boundary_edge_count(&self) -> usize {
        self.edge_to_faces.values().filter(|f| f.len() == 1).count()
    }

    pub fn non_manifold_edge_count(&self) -> usize {
        self.edge_to_faces.values().filter(|f| f.len() > 2).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&(usize, usize), &Vec<usize>)> {
        self.edge_to_faces.iter()
    }
}
