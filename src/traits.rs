use crate::aabb::{aabb_contains_point, expanded};
use crate::errors::MeshError;
use crate::float_types::{Real, parry3d::bounding_volume::Aabb};
use crate::grid::{CellGrid, GridIndex};
use crate::mesh::TriangleMesh;
use crate::mesh::classify::ClassifyParams;
use nalgebra::Point3;
use rand::RngCore;

/// Shapes that can report which cells of a grid they enclose.
///
/// The trait is object safe so that heterogeneous shapes can be voxelized
/// through `&dyn CellVolume`; randomness is therefore passed as
/// `&mut dyn RngCore`.
pub trait CellVolume {
    /// Axis-aligned bounds of the enclosed volume, `None` when it is empty.
    fn bounds(&self) -> Option<Aabb>;

    /// Cells of `grid` inside the shape, ordered with `i` fastest.
    fn cells_inside_grid(
        &self,
        grid: &CellGrid,
        params: &ClassifyParams,
        rng: &mut dyn RngCore,
    ) -> Vec<GridIndex>;

    /// Whether `p` lies inside the shape.
    fn encloses(&self, p: &Point3<Real>) -> Result<bool, MeshError>;

    /// Voxelize on a grid of cell size `dx` fitted around [`bounds`](Self::bounds)
    /// with one cell of padding on every side.
    fn voxelize(
        &self,
        dx: Real,
        params: &ClassifyParams,
        rng: &mut dyn RngCore,
    ) -> Result<(CellGrid, Vec<GridIndex>), MeshError> {
        let bounds = self.bounds().ok_or_else(|| MeshError::InvalidGrid {
            message: "cannot fit a grid around an empty shape".into(),
        })?;
        let grid = CellGrid::covering(&expanded(&bounds, dx), dx)?;
        let cells = self.cells_inside_grid(&grid, params, rng);
        Ok((grid, cells))
    }
}

impl CellVolume for TriangleMesh {
    fn bounds(&self) -> Option<Aabb> {
        self.bounding_box()
    }

    fn cells_inside_grid(
        &self,
        grid: &CellGrid,
        params: &ClassifyParams,
        mut rng: &mut dyn RngCore,
    ) -> Vec<GridIndex> {
        self.cells_inside(grid, params, &mut rng)
    }

    fn encloses(&self, p: &Point3<Real>) -> Result<bool, MeshError> {
        self.contains_point(p, ClassifyParams::default().edge_epsilon_fraction)
    }
}

/// Boxes classify exactly: a cell is inside when it lies entirely within the
/// box, and a surface cell when it only overlaps it.
impl CellVolume for Aabb {
    fn bounds(&self) -> Option<Aabb> {
        Some(*self)
    }

    fn cells_inside_grid(
        &self,
        grid: &CellGrid,
        params: &ClassifyParams,
        _rng: &mut dyn RngCore,
    ) -> Vec<GridIndex> {
        let Some(range) = grid.cells_overlapping(self) else {
            return Vec::new();
        };
        range
            .iter()
            .filter(|&g| {
                let cell = grid.cell_aabb(g);
                let interior = aabb_contains_point(self, &cell.mins) && aabb_contains_point(self, &cell.maxs);
                let overlaps = (0..3).all(|a| cell.mins[a] < self.maxs[a] && cell.maxs[a] > self.mins[a]);
                interior || (params.include_surface_cells && overlaps)
            })
            .collect()
    }

    fn encloses(&self, p: &Point3<Real>) -> Result<bool, MeshError> {
        Ok(aabb_contains_point(self, p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn mesh_and_box_agree_on_a_cube() {
        let mins = Point3::new(1.5, 1.5, 1.5);
        let maxs = Point3::new(5.5, 5.5, 5.5);
        let shapes: [Box<dyn CellVolume>; 2] =
            [Box::new(TriangleMesh::cuboid(mins, maxs)), Box::new(Aabb::new(mins, maxs))];
        let grid = CellGrid::new(7, 7, 7, 1.0).unwrap();
        let mut rng = StdRng::seed_from_u64(3);

        let results: Vec<Vec<GridIndex>> = shapes
            .iter()
            .map(|s| s.cells_inside_grid(&grid, &ClassifyParams::default(), &mut rng))
            .collect();
        assert_eq!(results[0].len(), 27);
        assert_eq!(results[0], results[1]);

        for shape in &shapes {
            assert!(shape.encloses(&Point3::new(3.3, 3.2, 3.1)).unwrap());
            assert!(!shape.encloses(&Point3::new(6.3, 3.2, 3.1)).unwrap());
        }
    }

    #[test]
    fn voxelize_fits_a_padded_grid() {
        let cube = TriangleMesh::cuboid(Point3::new(0.25, 0.25, 0.25), Point3::new(2.25, 2.25, 2.25));
        let mut rng = StdRng::seed_from_u64(11);
        let (grid, cells) = cube.voxelize(0.5, &ClassifyParams::default(), &mut rng).unwrap();
        assert_eq!(grid.dims(), [6, 6, 6]);
        assert_eq!(grid.origin, Point3::new(-0.25, -0.25, -0.25));
        assert!(!cells.is_empty());
        assert!(TriangleMesh::new().voxelize(0.5, &ClassifyParams::default(), &mut rng).is_err());
    }
}
