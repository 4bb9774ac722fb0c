//! Line/triangle intersection and related triangle primitives.

use crate::float_types::{NORMAL_EPSILON, Real};
use nalgebra::{Point3, Vector3};

/// Where an infinite line `origin + t·dir` crosses a triangle.
///
/// `u` and `v` are the barycentric weights of the second and third vertex, so
/// the hit lies on an edge when `u`, `v` or `u + v - 1` is zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineHit {
    pub point: Point3<Real>,
    pub t: Real,
    pub u: Real,
    pub v: Real,
}

impl LineHit {
    /// Distance (in barycentric units) from the hit to the nearest triangle
    /// edge line.
    #[inline]
    pub fn edge_distance(&self) -> Real {
        self.u.abs().min(self.v.abs()).min((self.u + self.v - 1.0).abs())
    }

    /// `u ≥ 0`, `v ≥ 0`, `u + v ≤ 1`.
    #[inline]
    pub fn is_inside_triangle(&self) -> bool {
        self.u >= 0.0 && self.v >= 0.0 && self.u + self.v <= 1.0
    }

    /// `true` if the hit lies within `epsilon` (barycentric units) of a triangle
    /// edge or vertex, on either side of it.
    #[inline]
    pub fn grazes_edge(&self, epsilon: Real) -> bool {
        let within = self.u >= -epsilon && self.v >= -epsilon && self.u + self.v <= 1.0 + epsilon;
        within && self.edge_distance() < epsilon
    }
}

/// **Mathematical Foundation: Möller–Trumbore Line/Triangle Intersection**
///
/// Solves `origin + t·dir = (1-u-v)·a + u·b + v·c` with Cramer's rule:
///
/// ```text
/// e₁ = b - a,  e₂ = c - a,  p = dir × e₂,  det = e₁ · p
/// s = origin - a,  u = (s · p)/det,  q = s × e₁,  v = (dir · q)/det,  t = (e₂ · q)/det
/// ```
///
/// This returns the crossing with the triangle's *plane* together with its
/// barycentric coordinates, whether or not it lies inside the triangle. The
/// line is unbounded in both directions, so `t` may be negative. Returns
/// `None` only when the line is parallel to the plane.
pub fn line_plane_hit(
    origin: &Point3<Real>,
    dir: &Vector3<Real>,
    tri: &[Point3<Real>; 3],
) -> Option<LineHit> {
    let e1 = tri[1] - tri[0];
    let e2 = tri[2] - tri[0];
    let p = dir.cross(&e2);
    let det = e1.dot(&p);

    let scale = e1.norm() * e2.norm() * dir.norm();
    if det.abs() <= Real::EPSILON * scale {
        return None;
    }

    let inv_det = 1.0 / det;
    let s = origin - tri[0];
    let u = s.dot(&p) * inv_det;
    let q = s.cross(&e1);
    let v = dir.dot(&q) * inv_det;
    let t = e2.dot(&q) * inv_det;

    Some(LineHit { point: origin + dir * t, t, u, v })
}

/// Crossing of the line with the triangle itself (edges included), or `None`
/// when the line misses it or is parallel to it.
pub fn line_triangle_intersection(
    origin: &Point3<Real>,
    dir: &Vector3<Real>,
    tri: &[Point3<Real>; 3],
) -> Option<LineHit> {
    line_plane_hit(origin, dir, tri).filter(LineHit::is_inside_triangle)
}

/// Unit geometric normal from the winding `a → b → c`; zero for degenerate triangles.
#[inline]
pub fn triangle_face_normal(tri: &[Point3<Real>; 3]) -> Vector3<Real> {
    let n = (tri[1] - tri[0]).cross(&(tri[2] - tri[0]));
    n.try_normalize(NORMAL_EPSILON).unwrap_or_else(Vector3::zeros)
}

#[inline]
pub fn triangle_area(tri: &[Point3<Real>; 3]) -> Real {
    0.5 * (tri[1] - tri[0]).cross(&(tri[2] - tri[0])).norm()
}

/// Barycentric weights `(w₀, w₁, w₂)` of `p` projected onto the triangle plane.
/// Degenerate triangles yield equal weights.
pub fn barycentric_coordinates(tri: &[Point3<Real>; 3], p: &Point3<Real>) -> Vector3<Real> {
    let v0 = tri[1] - tri[0];
    let v1 = tri[2] - tri[0];
    let v2 = p - tri[0];
    let d00 = v0.dot(&v0);
    let d01 = v0.dot(&v1);
    let d11 = v1.dot(&v1);
    let d20 = v2.dot(&v0);
    let d21 = v2.dot(&v1);
    let denom = d00 * d11 - d01 * d01;
    if denom.abs() <= Real::EPSILON * d00 * d11 {
        return Vector3::repeat(1.0 / 3.0);
    }
    let v = (d11 * d20 - d01 * d21) / denom;
    let w = (d00 * d21 - d01 * d20) / denom;
    Vector3::new(1.0 - v - w, v, w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn tri() -> [Point3<Real>; 3] {
        [Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0), Point3::new(0.0, 0.0, 1.0)]
    }

    #[test]
    fn line_hits_on_both_sides() {
        let dir = Vector3::x();
        let ahead = line_triangle_intersection(&Point3::new(-2.0, 0.25, 0.25), &dir, &tri()).unwrap();
        assert_relative_eq!(ahead.t, 2.0);
        assert_relative_eq!(ahead.u, 0.25);
        assert_relative_eq!(ahead.v, 0.25);
        assert_relative_eq!(ahead.point, Point3::new(0.0, 0.25, 0.25));

        let behind = line_triangle_intersection(&Point3::new(3.0, 0.25, 0.25), &dir, &tri()).unwrap();
        assert_relative_eq!(behind.t, -3.0);
    }

    #[test]
    fn line_misses_outside_and_parallel() {
        let dir = Vector3::x();
        assert!(line_triangle_intersection(&Point3::new(-1.0, 0.8, 0.8), &dir, &tri()).is_none());
        assert!(line_triangle_intersection(&Point3::new(-1.0, 0.2, 0.2), &Vector3::y(), &tri()).is_none());
    }

    #[test]
    fn edge_grazes_are_flagged_from_both_sides() {
        let dir = Vector3::x();
        let on_edge = line_plane_hit(&Point3::new(-1.0, 0.5, 0.5), &dir, &tri()).unwrap();
        assert!(on_edge.grazes_edge(1e-9));
        let just_outside = line_plane_hit(&Point3::new(-1.0, 0.5, 0.5 + 1e-12), &dir, &tri()).unwrap();
        assert!(!just_outside.is_inside_triangle());
        assert!(just_outside.grazes_edge(1e-9));

        let centre = line_plane_hit(&Point3::new(-1.0, 0.3, 0.3), &dir, &tri()).unwrap();
        assert_relative_eq!(centre.edge_distance(), 0.3, epsilon = 1e-12);
        assert!(!centre.grazes_edge(1e-9));
        // On the extension of an edge but far from the triangle.
        let far = line_plane_hit(&Point3::new(-1.0, 0.0, 5.0), &dir, &tri()).unwrap();
        assert!(!far.grazes_edge(1e-9));
    }

    #[test]
    fn face_normal_and_area() {
        assert_relative_eq!(triangle_face_normal(&tri()), Vector3::x());
        assert_relative_eq!(triangle_area(&tri()), 0.5);
        let flat = [Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0)];
        assert_eq!(triangle_face_normal(&flat), Vector3::zeros());
    }

    #[test]
    fn barycentric_weights_reconstruct_point() {
        let t = tri();
        let p = Point3::new(0.0, 0.2, 0.7);
        let w = barycentric_coordinates(&t, &p);
        let rebuilt = t[0].coords * w.x + t[1].coords * w.y + t[2].coords * w.z;
        assert_relative_eq!(rebuilt, p.coords, epsilon = 1e-12);
        assert_relative_eq!(w.sum(), 1.0, epsilon = 1e-12);
    }
}
