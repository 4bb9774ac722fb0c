//! Triangle-to-cell index over a uniform grid.

use super::TriangleMesh;
use crate::aabb::{triangle_aabb, triangle_overlaps_aabb};
use crate::grid::{Array3d, CellGrid, GridIndex};
use tracing::debug;

/// For every grid cell, the triangles whose surface touches that cell.
///
/// Built once per analysis pass and discarded afterwards; it does not track
/// later changes to the mesh.
#[derive(Debug, Clone)]
pub struct SpatialTriangleIndex {
    grid: CellGrid,
    cells: Array3d<Vec<usize>>,
}

impl SpatialTriangleIndex {
    /// **Algorithm**
    /// 1. **Broad phase**: the triangle's bounding box selects a clamped block of cells
    /// 2. **Narrow phase**: each candidate cell box is kept only if the
    ///    separating-axis test finds no gap between it and the triangle
    ///
    /// Triangles (or parts of them) outside the grid are not indexed.
    pub fn build(mesh: &TriangleMesh, grid: &CellGrid) -> Self {
        let mut cells = Array3d::for_grid(grid, Vec::new());

        for t in 0..mesh.num_triangles() {
            let tri = mesh.triangle_positions(t);
            let Some(range) = grid.cells_overlapping(&triangle_aabb(&tri)) else {
                continue;
            };
            for g in range.iter() {
                if triangle_overlaps_aabb(&grid.cell_aabb(g), &tri) {
                    cells[g].push(t);
                }
            }
        }

        let index = Self { grid: *grid, cells };
        debug!(
            triangles = mesh.num_triangles(),
            surface_cells = index.surface_cell_count(),
            "built spatial triangle index"
        );
        index
    }

    pub const fn grid(&self) -> &CellGrid {
        &self.grid
    }

    /// Triangles touching cell `g`; empty for cells outside the grid.
    pub fn triangles_in(&self, g: GridIndex) -> &[usize] {
        self.cells.get(g).map(Vec::as_slice).unwrap_or_default()
    }

    /// `true` if any triangle touches `g`.
    pub fn is_surface_cell(&self, g: GridIndex) -> bool {
        !self.triangles_in(g).is_empty()
    }

    /// Every cell touched by at least one triangle, `i` fastest.
    pub fn surface_cells(&self) -> Vec<GridIndex> {
        self.cells
            .iter_indexed()
            .filter(|(_, tris)| !tris.is_empty())
            .map(|(g, _)| g)
            .collect()
    }

    pub fn surface_cell_count(&self) -> usize {
        self.cells.iter_indexed().filter(|(_, tris)| !tris.is_empty()).count()
    }

    /// Release the per-cell lists early. The index stays usable and reports
    /// every cell as empty.
    pub fn clear(&mut self) {
        self.cells = Array3d::new(0, 0, 0, Vec::new());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    #[test]
    fn cube_faces_mark_only_the_shell() {
        let cube = TriangleMesh::cuboid(Point3::new(1.5, 1.5, 1.5), Point3::new(4.5, 4.5, 4.5));
        let grid = CellGrid::new(6, 6, 6, 1.0).unwrap();
        let index = SpatialTriangleIndex::build(&cube, &grid);

        // Shell of the 4x4x4 block of cells 1..=4 on each axis.
        assert_eq!(index.surface_cell_count(), 4 * 4 * 4 - 2 * 2 * 2);
        assert!(!index.is_surface_cell(GridIndex::new(2, 2, 2)));
        assert!(!index.is_surface_cell(GridIndex::new(0, 2, 2)));
        assert!(index.is_surface_cell(GridIndex::new(1, 2, 2)));
        // Both triangles of the -X face cross the middle of that face.
        assert_eq!(index.triangles_in(GridIndex::new(1, 2, 2)).len(), 2);
        assert!(index.triangles_in(GridIndex::new(-1, 0, 0)).is_empty());
    }

    #[test]
    fn triangle_on_a_cell_face_is_indexed_in_both_cells() {
        let tri = TriangleMesh::from_parts(
            vec![Point3::new(2.0, 0.2, 0.2), Point3::new(2.0, 0.8, 0.2), Point3::new(2.0, 0.2, 0.8)],
            vec![crate::mesh::Triangle::new(0, 1, 2)],
        );
        let grid = CellGrid::new(4, 4, 4, 1.0).unwrap();
        let index = SpatialTriangleIndex::build(&tri, &grid);

        assert_eq!(index.surface_cells(), vec![GridIndex::new(1, 0, 0), GridIndex::new(2, 0, 0)]);
    }

    #[test]
    fn clear_releases_cells() {
        let cube = TriangleMesh::cube(1.0);
        let grid = CellGrid::new(2, 2, 2, 1.0).unwrap();
        let mut index = SpatialTriangleIndex::build(&cube, &grid);
        assert!(index.surface_cell_count() > 0);
        index.clear();
        assert_eq!(index.surface_cell_count(), 0);
        assert!(index.surface_cells().is_empty());
    }
}
