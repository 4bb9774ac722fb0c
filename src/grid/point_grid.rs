//! Bucketed point lookup over a [`CellGrid`].
//!
//! Points are hashed into the cell containing them (clamped to the grid, so
//! points outside the extent land in a border cell). Radius queries visit only
//! the clamped cell range of the query sphere's bounding box.

use super::{CellGrid, GridIndex};
use crate::float_types::{Real, parry3d::bounding_volume::Aabb};
use hashbrown::HashMap;
use nalgebra::{Point3, Vector3};

/// Identifier of a point stored in a [`SpatialPointGrid`], assigned in insertion order.
pub type PointRef = usize;

#[derive(Debug, Clone)]
pub struct SpatialPointGrid {
    grid: CellGrid,
    points: Vec<Point3<Real>>,
    buckets: HashMap<GridIndex, Vec<PointRef>>,
}

impl SpatialPointGrid {
    /// The grid must have at least one cell.
    pub fn new(grid: CellGrid) -> Self {
        debug_assert!(!grid.is_empty(), "point grid needs a non-empty cell grid");
        Self { grid, points: Vec::new(), buckets: HashMap::new() }
    }

    pub const fn grid(&self) -> &CellGrid {
        &self.grid
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn point(&self, id: PointRef) -> Point3<Real> {
        self.points[id]
    }

    fn bucket_of(&self, p: &Point3<Real>) -> GridIndex {
        self.grid.clamp(self.grid.position_to_index(p))
    }

    pub fn insert(&mut self, p: Point3<Real>) -> PointRef {
        let id = self.points.len();
        let key = self.bucket_of(&p);
        self.points.push(p);
        self.buckets.entry(key).or_default().push(id);
        id
    }

    /// Inserts every point and returns their references in input order.
    pub fn insert_all(&mut self, points: &[Point3<Real>]) -> Vec<PointRef> {
        self.points.reserve(points.len());
        points.iter().map(|p| self.insert(*p)).collect()
    }

    /// Calls `visit(id, squared_distance)` for every stored point within `radius` of `center`.
    fn for_each_within<F>(&self, center: &Point3<Real>, radius: Real, mut visit: F)
    where
        F: FnMut(PointRef, Real),
    {
        let r = Vector3::repeat(radius);
        let query = Aabb::new(center - r, center + r);
        let lo = self.bucket_of(&query.mins);
        let hi = self.bucket_of(&query.maxs);
        let radius_sq = radius * radius;

        for k in lo.k..=hi.k {
            for j in lo.j..=hi.j {
                for i in lo.i..=hi.i {
                    let Some(bucket) = self.buckets.get(&GridIndex::new(i, j, k)) else {
                        continue;
                    };
                    for &id in bucket {
                        let d2 = (self.points[id] - center).norm_squared();
                        if d2 <= radius_sq {
                            visit(id, d2);
                        }
                    }
                }
            }
        }
    }

    /// All points within `radius` of `center` (inclusive), in ascending id order.
    pub fn query_inside_sphere(&self, center: &Point3<Real>, radius: Real) -> Vec<PointRef> {
        let mut found = Vec::new();
        self.for_each_within(center, radius, |id, _| found.push(id));
        found.sort_unstable();
        found
    }

    /// Closest point within `radius` of `center` accepted by `filter`, with its
    /// squared distance. Ties go to the lower id.
    pub fn nearest_within<F>(
        &self,
        center: &Point3<Real>,
        radius: Real,
        mut filter: F,
    ) -> Option<(PointRef, Real)>
    where
        F: FnMut(PointRef) -> bool,
    {
        let mut best: Option<(PointRef, Real)> = None;
        self.for_each_within(center, radius, |id, d2| {
            if !filter(id) {
                return;
            }
            let better = match best {
                None => true,
                Some((best_id, best_d2)) => d2 < best_d2 || (d2 == best_d2 && id < best_id),
            };
            if better {
                best = Some((id, d2));
            }
        });
        best
    }
}
