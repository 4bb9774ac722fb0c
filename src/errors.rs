//! Mesh and validation errors

use crate::float_types::Real;
use crate::grid::GridIndex;
use nalgebra::Point3;

/// Errors raised by analysis passes over an in-memory mesh.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeshError {
    /// A ray-parity probe hit a triangle edge or vertex, or the two probe
    /// directions disagreed, so the cell could not be classified.
    #[error("inside/outside classification of cell {cell} is indeterminate")]
    ClassificationIndeterminate { cell: GridIndex },

    /// Every probe axis through a point grazed an edge or gave inconsistent parity.
    #[error("containment of point {point} is indeterminate")]
    ContainmentIndeterminate { point: Point3<Real> },

    /// The grid description cannot be used (non-positive or non-finite spacing).
    #[error("invalid grid: {message}")]
    InvalidGrid { message: String },
}

/// All the possible consistency issues [`TriangleMesh::validate`](crate::mesh::TriangleMesh::validate)
/// may report
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// A triangle references a vertex that does not exist
    #[error("(IndexOutOfRange) Triangle {triangle} references missing vertex {index}")]
    IndexOutOfRange { triangle: usize, index: usize },
    /// A triangle references the same vertex twice
    #[error("(DegenerateTriangle) Triangle {triangle} repeats a vertex index")]
    DegenerateTriangle { triangle: usize },
    /// Normals exist but their count differs from the vertex count
    #[error("(NormalCount) {normals} normals for {vertices} vertices")]
    NormalCount { normals: usize, vertices: usize },
    /// Colors exist but their count differs from the vertex count
    #[error("(ColorCount) {colors} colors for {vertices} vertices")]
    ColorCount { colors: usize, vertices: usize },
    /// The coordinate has a NaN or infinite component
    #[error("(InvalidCoordinate) The coordinate ({0}) has a NaN or infinite")]
    InvalidCoordinate(Point3<Real>),
}
