//! Axis-aligned box helpers built on parry's [`Aabb`].
//!
//! Besides construction from point sets this module hosts the separating-axis
//! overlap test between a box and a triangle, which decides whether a grid cell
//! really touches a triangle once the broad phase has found it.

use crate::float_types::{
    Real,
    parry3d::bounding_volume::{Aabb, BoundingVolume},
};
use nalgebra::{Point3, Vector3};

/// Smallest box containing every point, or `None` for an empty iterator.
pub fn points_aabb<'a, I>(points: I) -> Option<Aabb>
where
    I: IntoIterator<Item = &'a Point3<Real>>,
{
    let mut iter = points.into_iter();
    let first = iter.next()?;
    let mut mins = *first;
    let mut maxs = *first;

    for p in iter {
        mins = mins.inf(p);
        maxs = maxs.sup(p);
    }

    Some(Aabb::new(mins, maxs))
}

/// Bounding box of a single triangle.
#[inline]
pub fn triangle_aabb(tri: &[Point3<Real>; 3]) -> Aabb {
    Aabb::new(tri[0].inf(&tri[1]).inf(&tri[2]), tri[0].sup(&tri[1]).sup(&tri[2]))
}

/// Overlapping region of two boxes; `None` when they are disjoint.
/// Boxes that only touch produce a flat (zero-thickness) box.
pub fn aabb_intersection(a: &Aabb, b: &Aabb) -> Option<Aabb> {
    if !a.intersects(b) {
        return None;
    }
    Some(Aabb::new(a.mins.sup(&b.mins), a.maxs.inf(&b.maxs)))
}

/// Returns `true` if `p` lies inside `aabb` or on its boundary.
#[inline]
pub fn aabb_contains_point(aabb: &Aabb, p: &Point3<Real>) -> bool {
    (0..3).all(|axis| p[axis] >= aabb.mins[axis] && p[axis] <= aabb.maxs[axis])
}

/// **Mathematical Foundation: Separating Axis Theorem for Box/Triangle Overlap**
///
/// Two convex shapes are disjoint iff some axis exists on which their projections
/// do not overlap. For a box and a triangle it suffices to test 13 axes:
///
/// ## **Candidate Axes**
/// 1. **Box Faces**: the three coordinate axes
/// 2. **Triangle Plane**: the triangle normal `n = e₀ × e₁`
/// 3. **Edge Pairs**: `aᵢ × eⱼ` for every box axis and triangle edge
///
/// The triangle is translated so the box is centred at the origin; the box then
/// projects onto axis `a` as `[-r, r]` with `r = Σ hᵢ·|aᵢ|`.
///
/// Touching counts as overlap, so a triangle lying exactly on a cell face is
/// reported for both cells sharing that face.
pub fn triangle_overlaps_aabb(aabb: &Aabb, tri: &[Point3<Real>; 3]) -> bool {
    let center = aabb.center();
    let half = aabb.half_extents();
    let v = [tri[0] - center, tri[1] - center, tri[2] - center];

    // Box face normals: plain interval test per axis.
    for axis in 0..3 {
        let min = v[0][axis].min(v[1][axis]).min(v[2][axis]);
        let max = v[0][axis].max(v[1][axis]).max(v[2][axis]);
        if min > half[axis] || max < -half[axis] {
            return false;
        }
    }

    let edges = [v[1] - v[0], v[2] - v[1], v[0] - v[2]];

    if separated_on_axis(&v, &half, &edges[0].cross(&edges[1]), edges[0].norm_squared()) {
        return false;
    }

    for edge in &edges {
        for unit in [Vector3::x(), Vector3::y(), Vector3::z()] {
            let axis = unit.cross(edge);
            if separated_on_axis(&v, &half, &axis, edge.norm_squared()) {
                return false;
            }
        }
    }

    true
}

/// Projects triangle and centred box onto `axis`; degenerate axes never separate.
fn separated_on_axis(
    v: &[Vector3<Real>; 3],
    half: &Vector3<Real>,
    axis: &Vector3<Real>,
    scale: Real,
) -> bool {
    if axis.norm_squared() <= Real::EPSILON * Real::EPSILON * scale.max(1.0) {
        return false;
    }

    let p0 = v[0].dot(axis);
    let p1 = v[1].dot(axis);
    let p2 = v[2].dot(axis);
    let radius = half.x * axis.x.abs() + half.y * axis.y.abs() + half.z * axis.z.abs();

    p0.min(p1).min(p2) > radius || p0.max(p1).max(p2) < -radius
}

/// Box grown by `margin` on every side.
#[inline]
pub fn expanded(aabb: &Aabb, margin: Real) -> Aabb {
    aabb.loosened(margin)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Aabb {
        Aabb::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn triangle_crossing_box_overlaps() {
        let tri = [
            Point3::new(-1.0, 0.5, -1.0),
            Point3::new(2.0, 0.5, -1.0),
            Point3::new(0.5, 0.5, 2.0),
        ];
        assert!(triangle_overlaps_aabb(&unit_box(), &tri));
    }

    #[test]
    fn triangle_with_overlapping_bounds_but_outside_is_rejected() {
        // Diagonal triangle whose bounding box covers the unit box but whose
        // plane x + y + z = 4 misses it.
        let tri = [
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(0.0, 4.0, 0.0),
            Point3::new(0.0, 0.0, 4.0),
        ];
        assert!(triangle_aabb(&tri).intersects(&unit_box()));
        assert!(!triangle_overlaps_aabb(&unit_box(), &tri));
    }

    #[test]
    fn triangle_on_face_touches() {
        let tri = [
            Point3::new(1.0, 0.2, 0.2),
            Point3::new(1.0, 0.8, 0.2),
            Point3::new(1.0, 0.2, 0.8),
        ];
        assert!(triangle_overlaps_aabb(&unit_box(), &tri));
    }

    #[test]
    fn sliver_near_box_edge_is_rejected() {
        // Sliver passing near the (1,1,z) edge without entering the box.
        let tri = [
            Point3::new(1.6, 0.9, 0.0),
            Point3::new(0.9, 1.6, 0.0),
            Point3::new(1.25, 1.25, 1.0),
        ];
        assert!(!triangle_overlaps_aabb(&unit_box(), &tri));
    }

    #[test]
    fn intersection_of_disjoint_boxes_is_none() {
        let far = Aabb::new(Point3::new(2.0, 2.0, 2.0), Point3::new(3.0, 3.0, 3.0));
        assert!(aabb_intersection(&unit_box(), &far).is_none());

        let half = Aabb::new(Point3::new(0.5, 0.5, 0.5), Point3::new(3.0, 3.0, 3.0));
        let overlap = aabb_intersection(&unit_box(), &half).unwrap();
        assert_eq!(overlap.mins, Point3::new(0.5, 0.5, 0.5));
        assert_eq!(overlap.maxs, Point3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn points_aabb_bounds_all_points() {
        let pts = [Point3::new(1.0, -2.0, 0.0), Point3::new(-1.0, 3.0, 0.5)];
        let aabb = points_aabb(&pts).unwrap();
        assert_eq!(aabb.mins, Point3::new(-1.0, -2.0, 0.0));
        assert_eq!(aabb.maxs, Point3::new(1.0, 3.0, 0.5));
        assert!(points_aabb(std::iter::empty::<&Point3<Real>>()).is_none());
    }
}
