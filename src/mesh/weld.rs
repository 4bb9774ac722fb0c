//! Vertex welding: merging a second mesh into this one with shared seam
//! vertices, and collapsing near-duplicate vertices of a single mesh.

use super::TriangleMesh;
use crate::aabb::{aabb_contains_point, aabb_intersection, expanded};
use crate::float_types::{DUPLICATE_EPSILON, JOIN_CELL_SIZE, Real, tolerance};
use crate::grid::CellGrid;
use crate::grid::point_grid::SpatialPointGrid;
use tracing::{debug, info, warn};

/// How matched vertex pairs are turned into merges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WeldMode {
    /// Every vertex takes part in at most one pair. A cluster of three or more
    /// coincident vertices therefore only loses one member per pass, but every
    /// merged pair is guaranteed to lie within the tolerance.
    #[default]
    Pairwise,
    /// All vertices connected through within-tolerance matches collapse onto
    /// the lowest index of their group. Chains may span several tolerances.
    Transitive,
}

/// Parameters for [`TriangleMesh::join_with`] and
/// [`TriangleMesh::remove_duplicate_vertices_with`].
#[derive(Debug, Clone, PartialEq)]
pub struct WeldParams {
    /// Match distance between the two meshes of a join.
    pub tolerance: Real,
    /// Match distance between vertices of the same mesh.
    pub duplicate_epsilon: Real,
    /// Cell size of the hash grid built over the seam region of a join.
    pub join_cell_size: Real,
    pub mode: WeldMode,
}

impl Default for WeldParams {
    fn default() -> Self {
        Self {
            tolerance: tolerance(),
            duplicate_epsilon: DUPLICATE_EPSILON,
            join_cell_size: JOIN_CELL_SIZE,
            mode: WeldMode::Pairwise,
        }
    }
}

impl WeldParams {
    #[must_use]
    pub const fn with_tolerance(mut self, tolerance: Real) -> Self {
        self.tolerance = tolerance;
        self
    }

    #[must_use]
    pub const fn with_duplicate_epsilon(mut self, epsilon: Real) -> Self {
        self.duplicate_epsilon = epsilon;
        self
    }

    #[must_use]
    pub const fn with_join_cell_size(mut self, cell_size: Real) -> Self {
        self.join_cell_size = cell_size;
        self
    }

    #[must_use]
    pub const fn with_mode(mut self, mode: WeldMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Union-find whose representatives are always the smallest member.
struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(n: usize) -> Self {
        Self { parent: (0..n).collect() }
    }

    fn find(&mut self, mut x: usize) -> usize {
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            let (low, high) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[high] = low;
        }
    }
}

impl TriangleMesh {
    /// [`join_with`](Self::join_with) using the default parameters and the
    /// given match `tolerance`.
    pub fn join(&mut self, other: &TriangleMesh, tolerance: Real) -> usize {
        self.join_with(other, &WeldParams::default().with_tolerance(tolerance))
    }

    /// **Mathematical Foundation: Seam Welding by Region-Restricted Nearest Neighbour**
    ///
    /// Appends `other` and merges each of its vertices onto a vertex of this
    /// mesh lying within `params.tolerance`.
    ///
    /// ## **Algorithm**
    /// 1. **Seam Region**: intersect both bounding boxes, each grown by `2·tolerance`;
    ///    only vertices inside it can match
    /// 2. **Hashing**: the incoming seam vertices go into a point grid over the
    ///    region with cell size `join_cell_size`
    /// 3. **Matching**: every receiving seam vertex looks up the nearest incoming
    ///    vertex within the tolerance
    /// 4. **Remapping**: incoming indices are rewritten to their match, except in
    ///    triangles that would lose a corner, which keep their original indices
    /// 5. **Cleanup**: unreferenced vertices are dropped and normals recomputed
    ///
    /// Returns the number of vertices that disappeared in the merge.
    pub fn join_with(&mut self, other: &TriangleMesh, params: &WeldParams) -> usize {
        if other.vertices.is_empty() {
            return 0;
        }
        if self.vertices.is_empty() {
            self.append(other);
            return 0;
        }

        let tol = params.tolerance;
        let region = match (self.bounding_box(), other.bounding_box()) {
            (Some(a), Some(b)) => aabb_intersection(&expanded(&a, 2.0 * tol), &expanded(&b, 2.0 * tol)),
            _ => None,
        };

        let offset = self.vertices.len();
        self.append(other);

        let Some(region) = region else {
            debug!("meshes do not overlap; appended without welding");
            return 0;
        };

        let in_region = |v: &usize| aabb_contains_point(&region, &self.vertices[*v]);
        let receivers: Vec<usize> = (0..offset).filter(in_region).collect();
        let incoming: Vec<usize> = (offset..self.vertices.len()).filter(in_region).collect();
        if receivers.is_empty() || incoming.is_empty() {
            return 0;
        }

        let grid = match CellGrid::covering(&region, params.join_cell_size) {
            Ok(grid) => grid,
            Err(err) => {
                warn!(%err, "cannot hash seam region; appended without welding");
                return 0;
            }
        };
        let mut points = SpatialPointGrid::new(grid);
        for &v in &incoming {
            points.insert(self.vertices[v]);
        }

        let mut pairs = Vec::new();
        match params.mode {
            WeldMode::Pairwise => {
                let mut claimed = vec![false; incoming.len()];
                for &a in &receivers {
                    if let Some((id, _)) = points.nearest_within(&self.vertices[a], tol, |id| !claimed[id]) {
                        claimed[id] = true;
                        pairs.push((a, incoming[id]));
                    }
                }
            }
            WeldMode::Transitive => {
                for &a in &receivers {
                    for id in points.query_inside_sphere(&self.vertices[a], tol) {
                        pairs.push((a, incoming[id]));
                    }
                }
            }
        }

        let merged = self.apply_vertex_pairs(&pairs, params.mode);
        info!(merged, seam_vertices = receivers.len() + incoming.len(), "joined meshes");
        merged
    }

    /// [`remove_duplicate_vertices_with`](Self::remove_duplicate_vertices_with)
    /// using the default parameters.
    pub fn remove_duplicate_vertices(&mut self, grid: &CellGrid) -> usize {
        self.remove_duplicate_vertices_with(grid, &WeldParams::default())
    }

    /// Merge vertices of this mesh closer than `params.duplicate_epsilon`.
    ///
    /// Vertices are hashed into `grid` (points outside it fall into the border
    /// cells). In [`WeldMode::Pairwise`] each still unpaired vertex is paired
    /// with its nearest unpaired neighbour; pairs `(low, high)` are applied in
    /// order of `low`, mapping `high` onto `low`. Triangles that would become
    /// degenerate keep their original indices. Returns the number of vertices
    /// removed; a vertex whose every triangle refused the merge survives.
    pub fn remove_duplicate_vertices_with(&mut self, grid: &CellGrid, params: &WeldParams) -> usize {
        let n = self.vertices.len();
        if n < 2 || grid.is_empty() {
            return 0;
        }

        let eps = params.duplicate_epsilon;
        let mut points = SpatialPointGrid::new(*grid);
        points.insert_all(&self.vertices);

        let mut pairs = Vec::new();
        match params.mode {
            WeldMode::Pairwise => {
                let mut paired = vec![false; n];
                for v in 0..n {
                    if paired[v] {
                        continue;
                    }
                    let nearest =
                        points.nearest_within(&self.vertices[v], eps, |id| id != v && !paired[id]);
                    if let Some((other, _)) = nearest {
                        paired[v] = true;
                        paired[other] = true;
                        pairs.push((v.min(other), v.max(other)));
                    }
                }
                pairs.sort_unstable_by_key(|&(low, _)| low);
            }
            WeldMode::Transitive => {
                for v in 0..n {
                    for other in points.query_inside_sphere(&self.vertices[v], eps) {
                        if other > v {
                            pairs.push((v, other));
                        }
                    }
                }
            }
        }

        let merged = self.apply_vertex_pairs(&pairs, params.mode);
        if merged > 0 {
            info!(merged, "removed duplicate vertices");
        }
        merged
    }

    /// Rewrite triangles through the merge table built from `pairs`
    /// (`(keep, drop)` with `keep < drop`), skip rewrites that would collapse a
    /// triangle, then prune unreferenced vertices. Returns the number of
    /// vertices pruned.
    fn apply_vertex_pairs(&mut self, pairs: &[(usize, usize)], mode: WeldMode) -> usize {
        if pairs.is_empty() {
            return 0;
        }

        let n = self.vertices.len();
        let table: Vec<usize> = match mode {
            WeldMode::Pairwise => {
                let mut table: Vec<usize> = (0..n).collect();
                for &(keep, drop) in pairs {
                    debug_assert!(keep < drop, "pair ({keep}, {drop}) is not ordered");
                    table[drop] = keep;
                }
                table
            }
            WeldMode::Transitive => {
                let mut sets = DisjointSet::new(n);
                for &(a, b) in pairs {
                    sets.union(a, b);
                }
                (0..n).map(|v| sets.find(v)).collect()
            }
        };

        let mut kept_apart = 0usize;
        for tri in &mut self.triangles {
            let remapped = tri.remapped(&table);
            if remapped.is_degenerate() {
                kept_apart += 1;
            } else {
                *tri = remapped;
            }
        }
        if kept_apart > 0 {
            debug!(kept_apart, "left triangles unwelded to avoid collapsing them");
        }

        self.invalidate_topology();
        self.remove_extraneous_vertices()
    }
}
