//! Mesh file formats.
//!
//! - **OBJ**: Wavefront text format, positions, normals and triangular faces
//! - **PLY**: binary little-endian PLY with optional per-vertex `uchar` colors
//! - **STL**: binary STL, write only (feature `stl-io`)
//!
//! Loaders parse into local buffers and only build a [`TriangleMesh`] once the
//! whole input has been accepted, so a failed load never yields a partial mesh.

pub mod obj;
pub mod ply;

#[cfg(feature = "stl-io")]
pub mod stl;

use crate::mesh::TriangleMesh;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while reading or writing mesh files.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// The input does not follow the expected grammar or layout.
    #[error("malformed input: {message}")]
    Format { message: String },

    /// A face references a vertex that does not exist.
    #[error("vertex index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: i64, vertex_count: usize },

    /// The format stores one normal per vertex but the mesh does not carry them.
    #[error("{normals} normals for {vertices} vertices")]
    MissingNormals { normals: usize, vertices: usize },

    #[error("unsupported mesh format: {extension:?}")]
    UnknownFormat { extension: String },

    #[error("could not parse float: {0}")]
    ParseFloat(#[from] std::num::ParseFloatError),
}

impl IoError {
    pub(crate) fn format(message: impl Into<String>) -> Self {
        Self::Format { message: message.into() }
    }
}

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshFormat {
    Obj,
    Ply,
    /// Binary STL; saving only.
    Stl,
}

impl MeshFormat {
    /// Detects the format from a file extension (case-insensitive).
    ///
    /// ```
    /// use tricell::io::MeshFormat;
    ///
    /// assert_eq!(MeshFormat::from_extension("PLY"), Some(MeshFormat::Ply));
    /// assert_eq!(MeshFormat::from_extension("xyz"), None);
    /// ```
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "obj" => Some(Self::Obj),
            "ply" => Some(Self::Ply),
            "stl" => Some(Self::Stl),
            _ => None,
        }
    }

    /// Detects the format from a file path.
    #[must_use]
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    fn require<P: AsRef<Path>>(path: P) -> Result<Self, IoError> {
        let path = path.as_ref();
        Self::from_path(path).ok_or_else(|| IoError::UnknownFormat {
            extension: path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or_default()
                .to_string(),
        })
    }
}

/// Read a whole file, mapping a missing file to [`IoError::FileNotFound`].
pub(crate) fn read_file(path: &Path) -> Result<Vec<u8>, IoError> {
    std::fs::read(path).map_err(|err| match err.kind() {
        std::io::ErrorKind::NotFound => IoError::FileNotFound { path: path.to_path_buf() },
        _ => IoError::Io(err),
    })
}

impl TriangleMesh {
    /// Load a mesh, choosing the reader from the file extension.
    ///
    /// # Errors
    ///
    /// [`IoError::UnknownFormat`] for unsupported extensions (including `.stl`,
    /// which is write only), otherwise whatever the format reader reports.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, IoError> {
        let path = path.as_ref();
        match MeshFormat::require(path)? {
            MeshFormat::Obj => Self::load_obj(path),
            MeshFormat::Ply => Self::load_ply(path),
            MeshFormat::Stl => Err(IoError::UnknownFormat { extension: "stl (write only)".into() }),
        }
    }

    /// Save the mesh, choosing the writer from the file extension.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), IoError> {
        let path = path.as_ref();
        match MeshFormat::require(path)? {
            MeshFormat::Obj => self.write_obj(path),
            MeshFormat::Ply => self.write_ply(path),
            #[cfg(feature = "stl-io")]
            MeshFormat::Stl => self.write_stl(path),
            #[cfg(not(feature = "stl-io"))]
            MeshFormat::Stl => Err(IoError::UnknownFormat { extension: "stl (feature `stl-io` disabled)".into() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_from_path() {
        assert_eq!(MeshFormat::from_path("a/b/mesh.obj"), Some(MeshFormat::Obj));
        assert_eq!(MeshFormat::from_path("mesh.Stl"), Some(MeshFormat::Stl));
        assert_eq!(MeshFormat::from_path("mesh"), None);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let result = TriangleMesh::load("mesh.xyz");
        assert!(matches!(result, Err(IoError::UnknownFormat { ref extension }) if extension == "xyz"));
    }

    #[test]
    fn missing_file_is_reported() {
        let result = TriangleMesh::load("definitely/not/here.ply");
        assert!(matches!(result, Err(IoError::FileNotFound { .. })));
    }

    #[test]
    fn error_display() {
        let err = IoError::IndexOutOfRange { index: 9, vertex_count: 3 };
        assert_eq!(err.to_string(), "vertex index 9 out of range for 3 vertices");
    }
}
