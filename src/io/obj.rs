//! Wavefront OBJ text format.
//!
//! Only `v`, `vn` and triangular `f` records are read; every other record
//! (comments, groups, texture coordinates, materials) is skipped. Faces may
//! use any of the grammars
//!
//! ```text
//! f 1 2 3
//! f 1//1 2//2 3//3
//! f 1/1/1 2/2/2 3/3/3
//! ```
//!
//! and are written back as `f a//a b//b c//c`.

use super::{IoError, read_file};
use crate::float_types::Real;
use crate::mesh::{Triangle, TriangleMesh};
use nalgebra::{Point3, Vector3};
use std::path::Path;
use tracing::debug;

/// Parse the three components following a `v` or `vn` keyword.
fn parse_vector<'a, I>(fields: I, line_number: usize) -> Result<Vector3<Real>, IoError>
where
    I: Iterator<Item = &'a str>,
{
    let mut xyz = [0.0; 3];
    let mut count = 0;
    for field in fields.take(3) {
        xyz[count] = field.parse::<Real>()?;
        count += 1;
    }
    if count != 3 {
        return Err(IoError::format(format!("line {line_number}: expected three coordinates")));
    }
    Ok(Vector3::new(xyz[0], xyz[1], xyz[2]))
}

/// Vertex index of one face corner under a given grammar, or `None` when the
/// corner does not follow it.
fn corner_index(corner: &str, slashes: usize) -> Option<i64> {
    let parts: Vec<&str> = corner.split('/').collect();
    match (slashes, parts.as_slice()) {
        (0, [v]) => v.parse().ok(),
        (2, [v, "", n]) if n.parse::<i64>().is_ok() => v.parse().ok(),
        (3, [v, t, n]) if t.parse::<i64>().is_ok() && n.parse::<i64>().is_ok() => v.parse().ok(),
        _ => None,
    }
}

/// Try `a b c`, then `a//n`, then `a/t/n`; the first grammar that fits all
/// three corners wins.
fn parse_face(corners: &[&str], line_number: usize) -> Result<[i64; 3], IoError> {
    let unreadable = || IoError::format(format!("line {line_number}: unsupported face record"));
    if corners.len() != 3 {
        return Err(unreadable());
    }

    for slashes in [0, 2, 3] {
        let parsed: Option<Vec<i64>> = corners.iter().map(|c| corner_index(c, slashes)).collect();
        if let Some(&[a, b, c]) = parsed.as_deref() {
            return Ok([a, b, c]);
        }
    }
    Err(unreadable())
}

/// One-based on-disk index to zero-based vertex index.
fn to_vertex_index(index: i64, vertex_count: usize) -> Result<usize, IoError> {
    if index < 1 || index as u64 > vertex_count as u64 {
        return Err(IoError::IndexOutOfRange { index, vertex_count });
    }
    Ok(index as usize - 1)
}

impl TriangleMesh {
    /// Parse OBJ text.
    pub fn from_obj_str(text: &str) -> Result<Self, IoError> {
        Self::from_obj_str_transformed(text, Vector3::zeros(), 1.0)
    }

    /// Parse OBJ text, mapping every position `p` to `scale·p + offset`.
    ///
    /// Exact duplicate triangles are dropped. Normals read from the file are
    /// kept when there is exactly one per vertex; otherwise vertex normals are
    /// computed from the faces.
    pub fn from_obj_str_transformed(
        text: &str,
        offset: Vector3<Real>,
        scale: Real,
    ) -> Result<Self, IoError> {
        let mut vertices = Vec::new();
        let mut normals = Vec::new();
        let mut faces = Vec::new();

        for (i, line) in text.lines().enumerate() {
            let line_number = i + 1;
            let mut fields = line.split_whitespace();
            match fields.next() {
                Some("v") => {
                    let p = parse_vector(fields, line_number)?;
                    vertices.push(Point3::from(p * scale + offset));
                }
                Some("vn") => normals.push(parse_vector(fields, line_number)?),
                Some("f") => {
                    let corners: Vec<&str> = fields.collect();
                    faces.push((line_number, parse_face(&corners, line_number)?));
                }
                _ => {}
            }
        }

        let triangles = faces
            .into_iter()
            .map(|(line_number, [a, b, c])| {
                let n = vertices.len();
                let tri = Triangle::new(to_vertex_index(a, n)?, to_vertex_index(b, n)?, to_vertex_index(c, n)?);
                if tri.is_degenerate() {
                    return Err(IoError::format(format!("line {line_number}: face repeats a vertex")));
                }
                Ok(tri)
            })
            .collect::<Result<Vec<_>, IoError>>()?;

        let mut mesh = TriangleMesh::from_parts(vertices, triangles);
        let duplicates = mesh.remove_duplicate_triangles();
        if normals.len() == mesh.num_vertices() && !normals.is_empty() {
            mesh.set_normals(normals)
                .map_err(|err| IoError::format(err.to_string()))?;
        } else {
            mesh.update_vertex_normals();
        }

        debug!(
            vertices = mesh.num_vertices(),
            triangles = mesh.num_triangles(),
            duplicates,
            "parsed OBJ"
        );
        Ok(mesh)
    }

    /// Load an OBJ file.
    pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<Self, IoError> {
        Self::load_obj_transformed(path, Vector3::zeros(), 1.0)
    }

    /// Load an OBJ file, mapping every position `p` to `scale·p + offset`.
    pub fn load_obj_transformed<P: AsRef<Path>>(
        path: P,
        offset: Vector3<Real>,
        scale: Real,
    ) -> Result<Self, IoError> {
        let bytes = read_file(path.as_ref())?;
        let text = String::from_utf8_lossy(&bytes);
        Self::from_obj_str_transformed(&text, offset, scale)
    }

    /// Serialize as OBJ text. Requires one normal per vertex.
    ///
    /// ```rust
    /// # use tricell::TriangleMesh;
    /// let obj = TriangleMesh::cube(1.0).to_obj_string().unwrap();
    /// assert!(obj.starts_with("# OBJ file format with ext .obj\n"));
    /// assert!(obj.contains("f 1//1"));
    /// ```
    pub fn to_obj_string(&self) -> Result<String, IoError> {
        if self.normals().len() != self.num_vertices() {
            return Err(IoError::MissingNormals {
                normals: self.normals().len(),
                vertices: self.num_vertices(),
            });
        }

        let mut out = String::new();
        out.push_str("# OBJ file format with ext .obj\n");
        out.push_str(&format!("# vertex count = {}\n", self.num_vertices()));
        out.push_str(&format!("# face count = {}\n", self.num_triangles()));

        for p in self.vertices() {
            out.push_str(&format!("v {} {} {}\n", p.x, p.y, p.z));
        }
        for n in self.normals() {
            out.push_str(&format!("vn {} {} {}\n", n.x, n.y, n.z));
        }
        for tri in self.triangles() {
            let [a, b, c] = tri.0.map(|v| v + 1);
            out.push_str(&format!("f {a}//{a} {b}//{b} {c}//{c}\n"));
        }
        Ok(out)
    }

    /// Write the mesh to an OBJ file, replacing any existing content.
    pub fn write_obj<P: AsRef<Path>>(&self, path: P) -> Result<(), IoError> {
        let text = self.to_obj_string()?;
        std::fs::write(path.as_ref(), text)?;
        debug!(path = %path.as_ref().display(), triangles = self.num_triangles(), "wrote OBJ");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_grammars() {
        assert_eq!(parse_face(&["1", "2", "3"], 1).unwrap(), [1, 2, 3]);
        assert_eq!(parse_face(&["1//4", "2//5", "3//6"], 1).unwrap(), [1, 2, 3]);
        assert_eq!(parse_face(&["1/7/4", "2/8/5", "3/9/6"], 1).unwrap(), [1, 2, 3]);
    }

    #[test]
    fn mixed_or_polygon_faces_are_rejected() {
        assert!(matches!(parse_face(&["1", "2//2", "3"], 4), Err(IoError::Format { .. })));
        assert!(matches!(parse_face(&["1", "2", "3", "4"], 4), Err(IoError::Format { .. })));
        assert!(matches!(parse_face(&["1/2", "2/3", "3/4"], 4), Err(IoError::Format { .. })));
    }

    #[test]
    fn format_error_names_the_line() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2\n";
        let err = TriangleMesh::from_obj_str(text).unwrap_err();
        assert!(err.to_string().contains("line 4"), "{err}");
    }

    #[test]
    fn index_bounds() {
        assert!(matches!(to_vertex_index(0, 3), Err(IoError::IndexOutOfRange { index: 0, .. })));
        assert!(matches!(to_vertex_index(4, 3), Err(IoError::IndexOutOfRange { index: 4, .. })));
        assert_eq!(to_vertex_index(3, 3).unwrap(), 2);
    }

    #[test]
    fn transform_and_normals() {
        let text = "\
# a triangle
o tri
v 0 0 0
v 1 0 0
v 0 1 0
vt 0 0
f 1 2 3
f 1 2 3
";
        let mesh = TriangleMesh::from_obj_str_transformed(text, Vector3::new(1.0, 0.0, 0.0), 2.0).unwrap();
        assert_eq!(mesh.num_triangles(), 1);
        assert_eq!(mesh.vertex(1), Point3::new(3.0, 0.0, 0.0));
        assert_eq!(mesh.normals().len(), 3);
        assert!((mesh.normals()[0] - Vector3::z()).norm() < 1e-12);
    }

    #[test]
    fn loaded_normals_are_kept_when_complete() {
        let text = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvn 1 0 0\nvn 1 0 0\nvn 1 0 0\nf 1//1 2//2 3//3\n";
        let mesh = TriangleMesh::from_obj_str(text).unwrap();
        assert_eq!(mesh.normals(), &[Vector3::x(); 3]);
    }

    #[test]
    fn saving_without_normals_fails() {
        let mesh = TriangleMesh::from_parts(
            vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)],
            vec![Triangle::new(0, 1, 2)],
        );
        assert!(matches!(
            mesh.to_obj_string(),
            Err(IoError::MissingNormals { normals: 0, vertices: 3 })
        ));
    }
}
