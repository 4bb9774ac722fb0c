//! `TriangleMesh` storage: parallel vertex arrays, indexed triangles and the
//! lazily built caches derived from them.

use crate::aabb::points_aabb;
use crate::collision;
use crate::errors::ValidationError;
use crate::float_types::{NORMAL_EPSILON, Real, parry3d::bounding_volume::Aabb};
use hashbrown::HashSet;
use nalgebra::{Point3, Vector3};
use std::sync::OnceLock;

pub mod adjacency;
pub mod classify;
pub mod shapes;
pub mod smoothing;
pub mod spatial_index;
pub mod topology;
pub mod weld;

use adjacency::{EdgeAdjacency, VertexTriangles};

/// Three vertex indices in winding order.
///
/// Equality, hashing and ordering are on the ordered triple, so `(0, 1, 2)` and
/// `(1, 2, 0)` are different triangles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Triangle(pub [usize; 3]);

impl Triangle {
    #[inline]
    pub const fn new(a: usize, b: usize, c: usize) -> Self {
        Self([a, b, c])
    }

    #[inline]
    pub const fn indices(&self) -> [usize; 3] {
        self.0
    }

    /// `true` if any vertex index repeats.
    #[inline]
    pub const fn is_degenerate(&self) -> bool {
        let [a, b, c] = self.0;
        a == b || b == c || a == c
    }

    #[inline]
    pub fn contains(&self, v: usize) -> bool {
        self.0.contains(&v)
    }

    /// Directed edges `(a, b)`, `(b, c)`, `(c, a)`.
    #[inline]
    pub const fn edges(&self) -> [(usize, usize); 3] {
        let [a, b, c] = self.0;
        [(a, b), (b, c), (c, a)]
    }

    /// Same triangle with every index shifted by `offset`.
    #[inline]
    pub const fn offset(&self, offset: usize) -> Self {
        let [a, b, c] = self.0;
        Self([a + offset, b + offset, c + offset])
    }

    /// Same triangle with every index passed through `table`.
    #[inline]
    pub fn remapped(&self, table: &[usize]) -> Self {
        Self(self.0.map(|v| table[v]))
    }

    /// Opposite winding.
    #[inline]
    pub const fn flipped(&self) -> Self {
        let [a, b, c] = self.0;
        Self([a, c, b])
    }
}

/// An indexed triangle mesh.
///
/// Positions, normals and colors are parallel arrays; normals and colors are
/// either empty or exactly as long as `vertices`. Everything that depends on
/// the triangle list (incidence tables, areas, bounds) is cached lazily and
/// reset by every mutating method, so the caches can never go stale.
#[derive(Clone, Debug, Default)]
pub struct TriangleMesh {
    vertices: Vec<Point3<Real>>,
    normals: Vec<Vector3<Real>>,
    colors: Vec<Vector3<Real>>,
    triangles: Vec<Triangle>,

    /// Lazily built vertex → incident triangles table.
    vertex_triangles: OnceLock<VertexTriangles>,
    /// Lazily built edge → triangles table.
    edge_adjacency: OnceLock<EdgeAdjacency>,
    /// Lazily calculated per-triangle areas.
    triangle_areas: OnceLock<Vec<Real>>,
    /// Lazily calculated AABB that spans `vertices`.
    bounding_box: OnceLock<Option<Aabb>>,
}

impl TriangleMesh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mesh from positions and triangles, without normals or colors.
    pub fn from_parts(vertices: Vec<Point3<Real>>, triangles: Vec<Triangle>) -> Self {
        Self { vertices, triangles, ..Self::default() }
    }

    /// Replace the per-vertex colors (components in `0.0..=1.0`).
    /// An empty vector removes them.
    pub fn set_colors(&mut self, colors: Vec<Vector3<Real>>) -> Result<(), ValidationError> {
        if !colors.is_empty() && colors.len() != self.vertices.len() {
            return Err(ValidationError::ColorCount {
                colors: colors.len(),
                vertices: self.vertices.len(),
            });
        }
        self.colors = colors;
        Ok(())
    }

    /// Replace the per-vertex normals. An empty vector removes them.
    pub fn set_normals(&mut self, normals: Vec<Vector3<Real>>) -> Result<(), ValidationError> {
        if !normals.is_empty() && normals.len() != self.vertices.len() {
            return Err(ValidationError::NormalCount {
                normals: normals.len(),
                vertices: self.vertices.len(),
            });
        }
        self.normals = normals;
        Ok(())
    }

    pub fn vertices(&self) -> &[Point3<Real>] {
        &self.vertices
    }

    pub fn normals(&self) -> &[Vector3<Real>] {
        &self.normals
    }

    pub fn colors(&self) -> &[Vector3<Real>] {
        &self.colors
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    #[inline]
    pub fn vertex(&self, v: usize) -> Point3<Real> {
        self.vertices[v]
    }

    #[inline]
    pub fn triangle(&self, t: usize) -> Triangle {
        self.triangles[t]
    }

    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn num_triangles(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.triangles.is_empty()
    }

    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty() && self.normals.len() == self.vertices.len()
    }

    pub fn has_colors(&self) -> bool {
        !self.colors.is_empty() && self.colors.len() == self.vertices.len()
    }

    /// Drop every cache that depends on the triangle list or positions.
    fn invalidate_topology(&mut self) {
        self.vertex_triangles = OnceLock::new();
        self.edge_adjacency = OnceLock::new();
        self.invalidate_geometry();
    }

    /// Drop every cache that depends on vertex positions only.
    fn invalidate_geometry(&mut self) {
        self.triangle_areas = OnceLock::new();
        self.bounding_box = OnceLock::new();
    }

    /// Remove all vertices, attributes and triangles.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.normals.clear();
        self.colors.clear();
        self.triangles.clear();
        self.invalidate_topology();
    }

    /// Add a vertex, returning its index. Normals and colors are dropped
    /// because they no longer cover every vertex.
    pub fn push_vertex(&mut self, p: Point3<Real>) -> usize {
        self.vertices.push(p);
        self.normals.clear();
        self.colors.clear();
        self.invalidate_geometry();
        self.vertices.len() - 1
    }

    /// Add a triangle, returning its index.
    pub fn push_triangle(&mut self, tri: Triangle) -> usize {
        debug_assert!(tri.0.iter().all(|&v| v < self.vertices.len()), "triangle {tri:?} out of range");
        self.triangles.push(tri);
        self.invalidate_topology();
        self.triangles.len() - 1
    }

    /// Append `other`, offsetting its triangle indices by the current vertex
    /// count. Normals and colors survive only if both meshes carry them.
    pub fn append(&mut self, other: &TriangleMesh) {
        let offset = self.vertices.len();
        let keep_normals =
            self.normals.len() == self.vertices.len() && other.normals.len() == other.vertices.len();
        let keep_colors =
            self.colors.len() == self.vertices.len() && other.colors.len() == other.vertices.len();

        self.vertices.extend_from_slice(&other.vertices);
        if keep_normals {
            self.normals.extend_from_slice(&other.normals);
        } else {
            self.normals.clear();
        }
        if keep_colors {
            self.colors.extend_from_slice(&other.colors);
        } else {
            self.colors.clear();
        }
        self.triangles.extend(other.triangles.iter().map(|t| t.offset(offset)));
        self.invalidate_topology();
    }

    /// Move every vertex by `v`.
    pub fn translate(&mut self, v: Vector3<Real>) {
        for p in &mut self.vertices {
            *p += v;
        }
        self.bounding_box = OnceLock::new();
    }

    /// Remove the listed triangles; the remaining ones keep their relative order.
    /// Out-of-range and repeated indices are ignored. Returns the number removed.
    pub fn remove_triangles(&mut self, indices: &[usize]) -> usize {
        let mut doomed = vec![false; self.triangles.len()];
        for &t in indices {
            if let Some(flag) = doomed.get_mut(t) {
                *flag = true;
            }
        }

        let before = self.triangles.len();
        self.triangles = self
            .triangles
            .iter()
            .zip(&doomed)
            .filter(|&(_, &gone)| !gone)
            .map(|(t, _)| *t)
            .collect();
        let removed = before - self.triangles.len();
        if removed > 0 {
            self.invalidate_topology();
        }
        removed
    }

    /// Drop vertices referenced by no triangle, compacting positions and colors
    /// and rewriting triangle indices. Vertex normals are recomputed afterwards.
    /// Returns the number of vertices removed; a second call returns 0.
    pub fn remove_extraneous_vertices(&mut self) -> usize {
        let mut used = vec![false; self.vertices.len()];
        for tri in &self.triangles {
            for &v in &tri.0 {
                used[v] = true;
            }
        }

        let unused = used.iter().filter(|u| !**u).count();
        if unused == 0 {
            return 0;
        }

        let carry_colors = self.has_colors();
        let mut table = vec![usize::MAX; self.vertices.len()];
        let mut vertices = Vec::with_capacity(self.vertices.len() - unused);
        let mut colors = Vec::with_capacity(if carry_colors { vertices.capacity() } else { 0 });

        for (old, keep) in used.iter().enumerate() {
            if !keep {
                continue;
            }
            table[old] = vertices.len();
            vertices.push(self.vertices[old]);
            if carry_colors {
                colors.push(self.colors[old]);
            }
        }

        for tri in &mut self.triangles {
            *tri = tri.remapped(&table);
            debug_assert!(tri.0.iter().all(|&v| v != usize::MAX), "unmapped vertex in {tri:?}");
        }

        self.vertices = vertices;
        self.colors = colors;
        self.invalidate_topology();
        self.update_vertex_normals();
        unused
    }

    /// Remove exact duplicate triangles (same ordered index triple), keeping the
    /// first occurrence of each. Returns the number removed.
    pub fn remove_duplicate_triangles(&mut self) -> usize {
        let before = self.triangles.len();
        let mut seen = HashSet::with_capacity(before);
        self.triangles.retain(|t| seen.insert(*t));
        let removed = before - self.triangles.len();
        if removed > 0 {
            self.invalidate_topology();
        }
        removed
    }

    /// Positions of triangle `t`'s corners.
    #[inline]
    pub fn triangle_positions(&self, t: usize) -> [Point3<Real>; 3] {
        self.triangles[t].0.map(|v| self.vertices[v])
    }

    /// Unit geometric normal of triangle `t` from its winding.
    #[inline]
    pub fn face_normal(&self, t: usize) -> Vector3<Real> {
        collision::triangle_face_normal(&self.triangle_positions(t))
    }

    /// **Mathematical Foundation: Unweighted Vertex Normal Averaging**
    ///
    /// ```text
    /// n(v) = normalize( (1/|T(v)|) · Σ_{t ∈ T(v)} n̂(t) )
    /// ```
    ///
    /// Every incident face contributes its unit normal with equal weight,
    /// independent of area or corner angle. Isolated vertices receive a zero
    /// normal.
    pub fn update_vertex_normals(&mut self) {
        let mut sums = vec![Vector3::zeros(); self.vertices.len()];
        let mut counts = vec![0usize; self.vertices.len()];

        for t in 0..self.triangles.len() {
            let n = self.face_normal(t);
            for &v in &self.triangles[t].0 {
                sums[v] += n;
                counts[v] += 1;
            }
        }

        self.normals = sums
            .into_iter()
            .zip(counts)
            .map(|(sum, count)| {
                if count == 0 {
                    return Vector3::zeros();
                }
                (sum / count as Real).try_normalize(NORMAL_EPSILON).unwrap_or_else(Vector3::zeros)
            })
            .collect();
    }

    /// Sum of the three stored vertex normals of `t`, not normalized.
    pub fn triangle_face_direction(&self, t: usize) -> Vector3<Real> {
        if !self.has_normals() {
            return self.face_normal(t);
        }
        self.triangles[t].0.iter().map(|&v| self.normals[v]).sum()
    }

    /// Renormalized average of the three vertex normals of `t`.
    /// Falls back to [`face_normal`](Self::face_normal) when normals are absent.
    pub fn triangle_normal(&self, t: usize) -> Vector3<Real> {
        if !self.has_normals() {
            return self.face_normal(t);
        }
        self.triangle_face_direction(t)
            .try_normalize(NORMAL_EPSILON)
            .unwrap_or_else(Vector3::zeros)
    }

    /// Centroid of triangle `t`.
    pub fn triangle_center(&self, t: usize) -> Point3<Real> {
        let [a, b, c] = self.triangle_positions(t);
        Point3::from((a.coords + b.coords + c.coords) / 3.0)
    }

    /// Area of triangle `t`, read from the area cache when it is built.
    pub fn triangle_area(&self, t: usize) -> Real {
        match self.triangle_areas.get() {
            Some(areas) => areas[t],
            None => collision::triangle_area(&self.triangle_positions(t)),
        }
    }

    /// Per-triangle areas, computing the cache on first use.
    pub fn triangle_areas(&self) -> &[Real] {
        self.triangle_areas.get_or_init(|| {
            (0..self.triangles.len())
                .map(|t| collision::triangle_area(&self.triangle_positions(t)))
                .collect()
        })
    }

    pub fn update_triangle_areas(&mut self) {
        self.triangle_areas = OnceLock::new();
        let _ = self.triangle_areas();
    }

    pub fn clear_triangle_areas(&mut self) {
        self.triangle_areas = OnceLock::new();
    }

    /// Barycentric weights of `p` with respect to triangle `t`.
    pub fn barycentric_coordinates(&self, t: usize, p: &Point3<Real>) -> Vector3<Real> {
        collision::barycentric_coordinates(&self.triangle_positions(t), p)
    }

    /// Vertex normals of `t` interpolated at `p` and normalized.
    pub fn smooth_normal_at(&self, t: usize, p: &Point3<Real>) -> Vector3<Real> {
        if !self.has_normals() {
            return self.face_normal(t);
        }
        let w = self.barycentric_coordinates(t, p);
        let [a, b, c] = self.triangles[t].0;
        (self.normals[a] * w.x + self.normals[b] * w.y + self.normals[c] * w.z)
            .try_normalize(NORMAL_EPSILON)
            .unwrap_or_else(|| self.face_normal(t))
    }

    /// Bounding box of all vertices; `None` for a mesh without vertices.
    pub fn bounding_box(&self) -> Option<Aabb> {
        *self.bounding_box.get_or_init(|| points_aabb(&self.vertices))
    }

    /// Vertex → triangle table, built on first use.
    pub fn vertex_triangles(&self) -> &VertexTriangles {
        self.vertex_triangles
            .get_or_init(|| VertexTriangles::build(self.vertices.len(), &self.triangles))
    }

    /// Force a rebuild of the vertex → triangle table.
    pub fn update_vertex_triangles(&mut self) {
        self.vertex_triangles = OnceLock::new();
        let _ = self.vertex_triangles();
    }

    pub fn clear_vertex_triangles(&mut self) {
        self.vertex_triangles = OnceLock::new();
    }

    /// Edge → triangle table, built on first use.
    pub fn edge_adjacency(&self) -> &EdgeAdjacency {
        self.edge_adjacency.get_or_init(|| EdgeAdjacency::build(&self.triangles))
    }

    /// Triangles incident to vertex `v`.
    pub fn vertex_neighbours(&self, v: usize) -> &[usize] {
        self.vertex_triangles().triangles_of(v)
    }

    /// Triangles sharing an edge with triangle `t` (never `t` itself).
    pub fn face_neighbours(&self, t: usize) -> Vec<usize> {
        self.edge_adjacency().neighbours_of(t, &self.triangles[t])
    }

    /// `true` if triangles `a` and `b` share an edge.
    pub fn is_neighbours(&self, a: usize, b: usize) -> bool {
        if a == b {
            return false;
        }
        self.triangles[a]
            .edges()
            .iter()
            .any(|&(p, q)| self.edge_adjacency().faces_for_edge(p, q).contains(&b))
    }

    /// Report every broken invariant: out-of-range or repeated triangle
    /// indices, attribute arrays of the wrong length and non-finite positions.
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut issues = Vec::new();
        let n = self.vertices.len();

        for p in &self.vertices {
            if !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()) {
                issues.push(ValidationError::InvalidCoordinate(*p));
            }
        }
        for (t, tri) in self.triangles.iter().enumerate() {
            for &index in &tri.0 {
                if index >= n {
                    issues.push(ValidationError::IndexOutOfRange { triangle: t, index });
                }
            }
            if tri.is_degenerate() {
                issues.push(ValidationError::DegenerateTriangle { triangle: t });
            }
        }
        if !self.normals.is_empty() && self.normals.len() != n {
            issues.push(ValidationError::NormalCount { normals: self.normals.len(), vertices: n });
        }
        if !self.colors.is_empty() && self.colors.len() != n {
            issues.push(ValidationError::ColorCount { colors: self.colors.len(), vertices: n });
        }
        issues
    }
}
