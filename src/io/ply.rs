//! Binary little-endian PLY.
//!
//! ```text
//! ply
//! format binary_little_endian 1.0
//! element vertex N
//! property float x
//! property float y
//! property float z
//! [property uchar red
//!  property uchar green
//!  property uchar blue]
//! element face M
//! property list uchar int vertex_index
//! end_header
//! ```
//!
//! followed by `N` vertex records (12 bytes, or 15 with colors) and `M` face
//! records of one count byte (always 3) and three `i32` indices.

use super::{IoError, read_file};
use crate::float_types::Real;
use crate::mesh::{Triangle, TriangleMesh};
use nalgebra::{Point3, Vector3};
use ply_rs::parser::Parser;
use ply_rs::ply::{
    Addable, DefaultElement, ElementDef, Encoding, Header, Property, PropertyDef, PropertyType,
    ScalarType,
};
use ply_rs::writer::Writer;
use std::path::Path;
use tracing::debug;

/// The header must end within this many bytes.
pub const MAX_HEADER_SIZE: usize = 2048;

const END_HEADER: &[u8] = b"end_header\n";
const COLOR_PROPERTIES: &str = "property uchar red\nproperty uchar green\nproperty uchar blue\n";
const FACE_RECORD_SIZE: usize = 1 + 3 * 4;

/// Byte length of the header including the terminating `end_header\n`.
fn header_length(bytes: &[u8]) -> Option<usize> {
    let window = &bytes[..bytes.len().min(MAX_HEADER_SIZE)];
    window
        .windows(END_HEADER.len())
        .position(|w| w == END_HEADER)
        .map(|start| start + END_HEADER.len())
}

/// Declared count of the element `name`.
fn element_count(header: &Header, name: &str) -> Result<usize, IoError> {
    header
        .elements
        .get(name)
        .map(|element| element.count)
        .ok_or_else(|| IoError::format(format!("PLY header has no '{name}' element")))
}

fn scalar(element: &DefaultElement, key: &str, record: usize) -> Result<f32, IoError> {
    match element.get(key) {
        Some(Property::Float(v)) => Ok(*v),
        #[allow(clippy::cast_possible_truncation)]
        Some(Property::Double(v)) => Ok(*v as f32),
        _ => Err(IoError::format(format!("vertex {record} has no float property '{key}'"))),
    }
}

fn color_channel(element: &DefaultElement, key: &str, record: usize) -> Result<Real, IoError> {
    match element.get(key) {
        Some(Property::UChar(c)) => Ok(Real::from(*c) / 255.0),
        _ => Err(IoError::format(format!("vertex {record} has no uchar property '{key}'"))),
    }
}

/// Validated corners of face `f`: exactly three distinct in-range indices.
fn face_corners(element: &DefaultElement, f: usize, vertex_count: usize) -> Result<Triangle, IoError> {
    let indices: Vec<i64> = match element.get("vertex_index").or_else(|| element.get("vertex_indices")) {
        Some(Property::ListInt(v)) => v.iter().map(|&i| i64::from(i)).collect(),
        Some(Property::ListUInt(v)) => v.iter().map(|&i| i64::from(i)).collect(),
        _ => return Err(IoError::format(format!("face {f} has no vertex index list"))),
    };
    let &[a, b, c] = indices.as_slice() else {
        return Err(IoError::format(format!(
            "face {f} has {} vertices, only triangles are supported",
            indices.len()
        )));
    };

    let corner = |index: i64| {
        usize::try_from(index)
            .ok()
            .filter(|&i| i < vertex_count)
            .ok_or(IoError::IndexOutOfRange { index, vertex_count })
    };
    let tri = Triangle::new(corner(a)?, corner(b)?, corner(c)?);
    if tri.is_degenerate() {
        return Err(IoError::format(format!("face {f} repeats a vertex")));
    }
    Ok(tri)
}

/// Header describing `vertices` float positions (plus `uchar` colors) and
/// `triangles` index lists.
fn binary_header(vertices: usize, triangles: usize, has_colors: bool) -> Header {
    let mut header = Header::new();
    header.encoding = Encoding::BinaryLittleEndian;

    let mut vertex = ElementDef::new("vertex".to_string());
    for axis in ["x", "y", "z"] {
        vertex
            .properties
            .add(PropertyDef::new(axis.to_string(), PropertyType::Scalar(ScalarType::Float)));
    }
    if has_colors {
        for channel in ["red", "green", "blue"] {
            vertex
                .properties
                .add(PropertyDef::new(channel.to_string(), PropertyType::Scalar(ScalarType::UChar)));
        }
    }
    vertex.count = vertices;
    header.elements.add(vertex);

    let mut face = ElementDef::new("face".to_string());
    face.properties.add(PropertyDef::new(
        "vertex_index".to_string(),
        PropertyType::List(ScalarType::UChar, ScalarType::Int),
    ));
    face.count = triangles;
    header.elements.add(face);

    header
}

impl TriangleMesh {
    /// Parse a binary PLY image. Vertex normals are computed after loading.
    ///
    /// # Errors
    ///
    /// [`IoError::Format`] when the header does not end within
    /// [`MAX_HEADER_SIZE`] bytes, the encoding is not binary little-endian,
    /// the body is short, or a face is not a triangle of three distinct
    /// vertices; [`IoError::IndexOutOfRange`] for indices outside the vertex
    /// list.
    pub fn from_ply_bytes(bytes: &[u8]) -> Result<Self, IoError> {
        let header_len = header_length(bytes).ok_or_else(|| {
            IoError::format(format!("no end_header within the first {MAX_HEADER_SIZE} bytes"))
        })?;
        let header_text = String::from_utf8_lossy(&bytes[..header_len]);
        if !header_text.starts_with("ply\n") {
            return Err(IoError::format("missing 'ply' magic line"));
        }
        let has_colors = header_text.contains(COLOR_PROPERTIES);

        let parser = Parser::<DefaultElement>::new();
        let mut reader = bytes;
        let header = parser
            .read_header(&mut reader)
            .map_err(|e| IoError::format(format!("failed to parse PLY header: {e}")))?;
        if !matches!(header.encoding, Encoding::BinaryLittleEndian) {
            return Err(IoError::format("only binary_little_endian PLY is supported"));
        }
        let vertex_count = element_count(&header, "vertex")?;
        let face_count = element_count(&header, "face")?;

        let payload = parser
            .read_payload(&mut reader, &header)
            .map_err(|e| IoError::format(format!("failed to read PLY payload: {e}")))?;

        let mut vertices = Vec::with_capacity(vertex_count);
        let mut colors = Vec::with_capacity(if has_colors { vertex_count } else { 0 });
        for (v, element) in payload.get("vertex").into_iter().flatten().enumerate() {
            #[allow(clippy::unnecessary_cast)]
            vertices.push(Point3::new(
                scalar(element, "x", v)? as Real,
                scalar(element, "y", v)? as Real,
                scalar(element, "z", v)? as Real,
            ));
            if has_colors {
                colors.push(Vector3::new(
                    color_channel(element, "red", v)?,
                    color_channel(element, "green", v)?,
                    color_channel(element, "blue", v)?,
                ));
            }
        }
        if vertices.len() != vertex_count {
            return Err(IoError::format(format!(
                "PLY declares {vertex_count} vertices but holds {}",
                vertices.len()
            )));
        }

        let triangles = payload
            .get("face")
            .into_iter()
            .flatten()
            .enumerate()
            .map(|(f, element)| face_corners(element, f, vertex_count))
            .collect::<Result<Vec<_>, IoError>>()?;

        let mut mesh = TriangleMesh::from_parts(vertices, triangles);
        if has_colors {
            mesh.set_colors(colors).map_err(|err| IoError::format(err.to_string()))?;
        }
        mesh.update_vertex_normals();

        debug!(vertices = vertex_count, triangles = face_count, colors = has_colors, "parsed PLY");
        Ok(mesh)
    }

    /// Load a binary PLY file.
    pub fn load_ply<P: AsRef<Path>>(path: P) -> Result<Self, IoError> {
        let bytes = read_file(path.as_ref())?;
        Self::from_ply_bytes(&bytes)
    }

    /// Serialize as binary PLY. Colors are written when the mesh has one per
    /// vertex, each component as `⌊clamp(c, 0, 1) · 255⌋`.
    ///
    /// # Errors
    ///
    /// [`IoError::Format`] if a vertex index does not fit the format's `i32`.
    pub fn to_ply_bytes(&self) -> Result<Vec<u8>, IoError> {
        let has_colors = self.has_colors();
        let vertex_record = if has_colors { 15 } else { 12 };
        let mut out = Vec::with_capacity(
            256 + self.num_vertices() * vertex_record + self.num_triangles() * FACE_RECORD_SIZE,
        );

        let header = binary_header(self.num_vertices(), self.num_triangles(), has_colors);
        Writer::<DefaultElement>::new().write_header(&mut out, &header)?;

        // ply-rs writes the element count in place of a binary list length, so
        // records are laid out directly.
        for (v, p) in self.vertices().iter().enumerate() {
            #[allow(clippy::unnecessary_cast, clippy::cast_possible_truncation)]
            for x in [p.x as f32, p.y as f32, p.z as f32] {
                out.extend_from_slice(&x.to_le_bytes());
            }
            if has_colors {
                let c = self.colors()[v];
                out.extend([c.x, c.y, c.z].map(|x| (x.clamp(0.0, 1.0) * 255.0) as u8));
            }
        }

        for tri in self.triangles() {
            out.push(3);
            for v in tri.0 {
                let index = i32::try_from(v)
                    .map_err(|_| IoError::format(format!("vertex index {v} exceeds the PLY index range")))?;
                out.extend_from_slice(&index.to_le_bytes());
            }
        }

        Ok(out)
    }

    /// Write the mesh to a binary PLY file, replacing any existing content.
    pub fn write_ply<P: AsRef<Path>>(&self, path: P) -> Result<(), IoError> {
        let bytes = self.to_ply_bytes()?;
        std::fs::write(path.as_ref(), &bytes)?;
        debug!(path = %path.as_ref().display(), bytes = bytes.len(), "wrote PLY");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> TriangleMesh {
        TriangleMesh::from_parts(
            vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0), Point3::new(0.0, 1.0, 0.0)],
            vec![Triangle::new(0, 1, 2)],
        )
    }

    fn parse_header(text: &str) -> Header {
        Parser::<DefaultElement>::new().read_header(&mut text.as_bytes()).unwrap()
    }

    #[test]
    fn header_is_found_only_within_limit() {
        assert_eq!(header_length(b"ply\nend_header\nXYZ"), Some(15));
        let mut late = vec![b' '; MAX_HEADER_SIZE];
        late.extend_from_slice(END_HEADER);
        assert_eq!(header_length(&late), None);
    }

    #[test]
    fn element_counts_are_read_from_the_header() {
        let header = parse_header(
            "ply\nformat binary_little_endian 1.0\nelement vertex 42\nproperty float x\n\
             element face 7\nproperty list uchar int vertex_index\nend_header\n",
        );
        assert_eq!(element_count(&header, "vertex").unwrap(), 42);
        assert_eq!(element_count(&header, "face").unwrap(), 7);
        assert!(matches!(element_count(&header, "edge"), Err(IoError::Format { .. })));
    }

    #[test]
    fn written_header_matches_the_layout() {
        let mut mesh = triangle();
        mesh.set_colors(vec![Vector3::zeros(); 3]).unwrap();
        let bytes = mesh.to_ply_bytes().unwrap();
        let header_len = header_length(&bytes).unwrap();
        let text = std::str::from_utf8(&bytes[..header_len]).unwrap();
        assert_eq!(
            text,
            "ply\nformat binary_little_endian 1.0\nelement vertex 3\n\
             property float x\nproperty float y\nproperty float z\n\
             property uchar red\nproperty uchar green\nproperty uchar blue\n\
             element face 1\nproperty list uchar int vertex_index\nend_header\n"
        );
    }

    #[test]
    fn malformed_or_ascii_headers_are_rejected() {
        let bad_count = b"ply\nformat binary_little_endian 1.0\nelement face x\nend_header\n";
        assert!(matches!(TriangleMesh::from_ply_bytes(bad_count), Err(IoError::Format { .. })));

        let ascii = b"ply\nformat ascii 1.0\nelement vertex 0\nproperty float x\n\
                      element face 0\nproperty list uchar int vertex_index\nend_header\n";
        assert!(matches!(TriangleMesh::from_ply_bytes(ascii), Err(IoError::Format { .. })));
    }

    #[test]
    fn colors_are_truncated_and_clamped() {
        let mut mesh = triangle();
        mesh.set_colors(vec![
            Vector3::new(1.0, 0.5, 0.0),
            Vector3::new(2.0, -1.0, 0.999),
            Vector3::new(0.25, 0.75, 1.0),
        ])
        .unwrap();
        let bytes = mesh.to_ply_bytes().unwrap();
        let header_len = header_length(&bytes).unwrap();
        let body = &bytes[header_len..];
        assert_eq!(&body[12..15], &[255, 127, 0]);
        assert_eq!(&body[27..30], &[255, 0, 254]);
        assert_eq!(body.len(), 3 * 15 + FACE_RECORD_SIZE);
    }

    #[test]
    fn non_triangle_faces_are_rejected() {
        let mut bytes = triangle().to_ply_bytes().unwrap();
        let face_start = bytes.len() - FACE_RECORD_SIZE;
        bytes[face_start] = 2;
        bytes.truncate(bytes.len() - 4);
        assert!(matches!(TriangleMesh::from_ply_bytes(&bytes), Err(IoError::Format { .. })));
    }

    #[test]
    fn out_of_range_indices_are_rejected() {
        let mut bytes = triangle().to_ply_bytes().unwrap();
        let last = bytes.len() - 4;
        bytes[last..].copy_from_slice(&3i32.to_le_bytes());
        assert!(matches!(
            TriangleMesh::from_ply_bytes(&bytes),
            Err(IoError::IndexOutOfRange { index: 3, vertex_count: 3 })
        ));
        bytes[last..].copy_from_slice(&(-1i32).to_le_bytes());
        assert!(matches!(
            TriangleMesh::from_ply_bytes(&bytes),
            Err(IoError::IndexOutOfRange { index: -1, .. })
        ));
    }

    #[test]
    fn truncated_body_is_rejected() {
        let bytes = triangle().to_ply_bytes().unwrap();
        assert!(matches!(
            TriangleMesh::from_ply_bytes(&bytes[..bytes.len() - 1]),
            Err(IoError::Format { .. })
        ));
    }
}
