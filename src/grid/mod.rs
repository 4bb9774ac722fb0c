//! Uniform cell grids: integer cell indices, the index <-> world mapping and a
//! dense 3-D array keyed by cell.

pub mod point_grid;

use crate::errors::MeshError;
use crate::float_types::{Real, parry3d::bounding_volume::Aabb};
use nalgebra::{Point3, Vector3};
use std::fmt;
use std::ops::{Index, IndexMut};

/// Integer coordinates of a grid cell. Components may be negative or exceed the
/// grid extent; use [`CellGrid::contains`] before indexing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct GridIndex {
    pub i: i32,
    pub j: i32,
    pub k: i32,
}

impl GridIndex {
    #[inline]
    pub const fn new(i: i32, j: i32, k: i32) -> Self {
        Self { i, j, k }
    }

    /// The six face-adjacent cells: -i, +i, -j, +j, -k, +k.
    #[inline]
    pub const fn neighbours6(&self) -> [GridIndex; 6] {
        let GridIndex { i, j, k } = *self;
        [
            GridIndex::new(i - 1, j, k),
            GridIndex::new(i + 1, j, k),
            GridIndex::new(i, j - 1, k),
            GridIndex::new(i, j + 1, k),
            GridIndex::new(i, j, k - 1),
            GridIndex::new(i, j, k + 1),
        ]
    }

    /// Cell reached by stepping `steps` cells along `axis` (0 = i, 1 = j, 2 = k).
    #[inline]
    pub const fn offset(&self, axis: usize, steps: i32) -> GridIndex {
        let mut out = *self;
        match axis {
            0 => out.i += steps,
            1 => out.j += steps,
            _ => out.k += steps,
        }
        out
    }

    #[inline]
    pub const fn component(&self, axis: usize) -> i32 {
        match axis {
            0 => self.i,
            1 => self.j,
            _ => self.k,
        }
    }
}

impl fmt::Display for GridIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.i, self.j, self.k)
    }
}

/// Inclusive block of cells, iterated with `i` fastest and `k` slowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub min: GridIndex,
    pub max: GridIndex,
}

impl CellRange {
    pub fn iter(self) -> impl Iterator<Item = GridIndex> {
        let (lo, hi) = (self.min, self.max);
        (lo.k..=hi.k).flat_map(move |k| {
            (lo.j..=hi.j).flat_map(move |j| (lo.i..=hi.i).map(move |i| GridIndex::new(i, j, k)))
        })
    }

    pub const fn len(&self) -> usize {
        let di = (self.max.i - self.min.i + 1) as usize;
        let dj = (self.max.j - self.min.j + 1) as usize;
        let dk = (self.max.k - self.min.k + 1) as usize;
        di * dj * dk
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A uniform grid of `ni × nj × nk` cubic cells of edge `dx`, anchored at `origin`.
///
/// Cell `(i, j, k)` spans `origin + [i, i+1)·dx` on each axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellGrid {
    pub ni: usize,
    pub nj: usize,
    pub nk: usize,
    pub dx: Real,
    pub origin: Point3<Real>,
}

impl CellGrid {
    /// Grid anchored at the world origin.
    pub fn new(ni: usize, nj: usize, nk: usize, dx: Real) -> Result<Self, MeshError> {
        if !(dx.is_finite() && dx > 0.0) {
            return Err(MeshError::InvalidGrid {
                message: format!("cell size must be positive and finite, got {dx}"),
            });
        }
        let max = i32::MAX as usize;
        if ni > max || nj > max || nk > max {
            return Err(MeshError::InvalidGrid {
                message: format!("dimensions {ni}x{nj}x{nk} exceed the addressable range"),
            });
        }
        Ok(Self { ni, nj, nk, dx, origin: Point3::origin() })
    }

    /// Smallest grid of cell size `dx` whose origin is `aabb.mins` and that
    /// covers the whole box. Always at least one cell per axis.
    pub fn covering(aabb: &Aabb, dx: Real) -> Result<Self, MeshError> {
        let extent = aabb.maxs - aabb.mins;
        let cells = |len: Real| ((len / dx).ceil().max(1.0)) as usize;
        let grid = Self::new(cells(extent.x), cells(extent.y), cells(extent.z), dx)?;
        Ok(grid.with_origin(aabb.mins))
    }

    #[must_use]
    pub const fn with_origin(mut self, origin: Point3<Real>) -> Self {
        self.origin = origin;
        self
    }

    pub const fn dims(&self) -> [usize; 3] {
        [self.ni, self.nj, self.nk]
    }

    pub const fn cell_count(&self) -> usize {
        self.ni * self.nj * self.nk
    }

    /// `true` when any dimension is zero.
    pub const fn is_empty(&self) -> bool {
        self.cell_count() == 0
    }

    #[inline]
    pub const fn contains(&self, g: GridIndex) -> bool {
        g.i >= 0
            && g.j >= 0
            && g.k >= 0
            && (g.i as usize) < self.ni
            && (g.j as usize) < self.nj
            && (g.k as usize) < self.nk
    }

    /// Row-major offset `(k·nj + j)·ni + i`. Caller guarantees `contains(g)`.
    #[inline]
    pub const fn linear_index(&self, g: GridIndex) -> usize {
        (g.k as usize * self.nj + g.j as usize) * self.ni + g.i as usize
    }

    /// Minimum corner of cell `g`.
    #[inline]
    pub fn cell_min(&self, g: GridIndex) -> Point3<Real> {
        self.origin + Vector3::new(g.i as Real, g.j as Real, g.k as Real) * self.dx
    }

    #[inline]
    pub fn cell_center(&self, g: GridIndex) -> Point3<Real> {
        self.cell_min(g) + Vector3::repeat(0.5 * self.dx)
    }

    pub fn cell_aabb(&self, g: GridIndex) -> Aabb {
        let mins = self.cell_min(g);
        Aabb::new(mins, mins + Vector3::repeat(self.dx))
    }

    /// Cell containing `p`; may lie outside the grid.
    #[inline]
    pub fn position_to_index(&self, p: &Point3<Real>) -> GridIndex {
        let local = (p - self.origin) / self.dx;
        GridIndex::new(local.x.floor() as i32, local.y.floor() as i32, local.z.floor() as i32)
    }

    /// Nearest in-range cell. Caller guarantees the grid is not empty.
    #[inline]
    pub fn clamp(&self, g: GridIndex) -> GridIndex {
        GridIndex::new(
            g.i.clamp(0, self.ni as i32 - 1),
            g.j.clamp(0, self.nj as i32 - 1),
            g.k.clamp(0, self.nk as i32 - 1),
        )
    }

    /// Lowest cell whose closed extent `[i, i+1]·dx` reaches `p` on each axis.
    /// Differs from [`position_to_index`](Self::position_to_index) only when `p`
    /// lies exactly on a cell boundary.
    #[inline]
    fn lowest_touching_index(&self, p: &Point3<Real>) -> GridIndex {
        let local = (p - self.origin) / self.dx;
        GridIndex::new(
            (local.x.ceil() - 1.0) as i32,
            (local.y.ceil() - 1.0) as i32,
            (local.z.ceil() - 1.0) as i32,
        )
    }

    /// In-range cells whose closed extent touches `aabb`, or `None` when the box
    /// misses the grid. A box face lying on a cell boundary selects the cells on
    /// both sides of it.
    pub fn cells_overlapping(&self, aabb: &Aabb) -> Option<CellRange> {
        if self.is_empty() {
            return None;
        }
        let lo = self.lowest_touching_index(&aabb.mins);
        let hi = self.position_to_index(&aabb.maxs);
        let outside = hi.i < 0
            || hi.j < 0
            || hi.k < 0
            || lo.i >= self.ni as i32
            || lo.j >= self.nj as i32
            || lo.k >= self.nk as i32;
        if outside {
            return None;
        }
        Some(CellRange { min: self.clamp(lo), max: self.clamp(hi) })
    }

    /// Face neighbours of `g` that lie inside the grid.
    pub fn neighbours_in_range(&self, g: GridIndex) -> impl Iterator<Item = GridIndex> + '_ {
        g.neighbours6().into_iter().filter(move |n| self.contains(*n))
    }

    /// Every cell, `i` fastest.
    pub fn cells(&self) -> impl Iterator<Item = GridIndex> {
        let range = CellRange {
            min: GridIndex::new(0, 0, 0),
            max: GridIndex::new(self.ni as i32 - 1, self.nj as i32 - 1, self.nk as i32 - 1),
        };
        range.iter()
    }
}

/// Dense storage of one value per grid cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Array3d<T> {
    ni: usize,
    nj: usize,
    nk: usize,
    data: Vec<T>,
}

impl<T: Clone> Array3d<T> {
    pub fn new(ni: usize, nj: usize, nk: usize, fill: T) -> Self {
        Self { ni, nj, nk, data: vec![fill; ni * nj * nk] }
    }

    /// Array shaped like `grid`.
    pub fn for_grid(grid: &CellGrid, fill: T) -> Self {
        Self::new(grid.ni, grid.nj, grid.nk, fill)
    }

    pub fn fill(&mut self, value: T) {
        self.data.fill(value);
    }
}

impl<T> Array3d<T> {
    pub const fn dims(&self) -> [usize; 3] {
        [self.ni, self.nj, self.nk]
    }

    pub const fn len(&self) -> usize {
        self.data.len()
    }

    pub const fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub const fn in_range(&self, g: GridIndex) -> bool {
        g.i >= 0
            && g.j >= 0
            && g.k >= 0
            && (g.i as usize) < self.ni
            && (g.j as usize) < self.nj
            && (g.k as usize) < self.nk
    }

    #[inline]
    const fn offset(&self, g: GridIndex) -> usize {
        (g.k as usize * self.nj + g.j as usize) * self.ni + g.i as usize
    }

    pub fn get(&self, g: GridIndex) -> Option<&T> {
        if self.in_range(g) { self.data.get(self.offset(g)) } else { None }
    }

    pub fn get_mut(&mut self, g: GridIndex) -> Option<&mut T> {
        if self.in_range(g) {
            let offset = self.offset(g);
            self.data.get_mut(offset)
        } else {
            None
        }
    }

    /// Values with their cell index, `i` fastest.
    pub fn iter_indexed(&self) -> impl Iterator<Item = (GridIndex, &T)> {
        let (ni, nj) = (self.ni, self.nj);
        self.data.iter().enumerate().map(move |(n, value)| {
            let i = n % ni;
            let j = (n / ni) % nj;
            let k = n / (ni * nj);
            (GridIndex::new(i as i32, j as i32, k as i32), value)
        })
    }
}

impl<T> Index<GridIndex> for Array3d<T> {
    type Output = T;

    fn index(&self, g: GridIndex) -> &T {
        assert!(self.in_range(g), "grid index {g} out of range {:?}", self.dims());
        &self.data[self.offset(g)]
    }
}

impl<T> IndexMut<GridIndex> for Array3d<T> {
    fn index_mut(&mut self, g: GridIndex) -> &mut T {
        assert!(self.in_range(g), "grid index {g} out of range {:?}", self.dims());
        let offset = self.offset(g);
        &mut self.data[offset]
    }
}
