use super::IoError;
use crate::mesh::TriangleMesh;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

impl TriangleMesh {
    /// Export to **binary STL**: an 80 byte zero header, the triangle count as
    /// little-endian `u32`, then 50 bytes per triangle (normal, three corners,
    /// zero attribute word).
    ///
    /// The facet normal is [`triangle_normal`](Self::triangle_normal), i.e. the
    /// mean of the stored vertex normals when present.
    ///
    /// ```rust
    /// # use tricell::TriangleMesh;
    /// # use std::error::Error;
    /// # fn main() -> Result<(), Box<dyn Error>> {
    /// let bytes = TriangleMesh::cube(1.0).to_stl_bytes()?;
    /// assert_eq!(bytes.len(), 84 + 12 * 50);
    /// # Ok(())
    /// # }
    /// ```
    pub fn to_stl_bytes(&self) -> std::io::Result<Vec<u8>> {
        use stl_io::{Normal, Triangle, Vertex, write_stl};

        let triangles: Vec<Triangle> = (0..self.num_triangles())
            .map(|t| {
                let n = self.triangle_normal(t);
                #[allow(clippy::unnecessary_cast)]
                Triangle {
                    normal: Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                    vertices: self
                        .triangle_positions(t)
                        .map(|p| Vertex::new([p.x as f32, p.y as f32, p.z as f32])),
                }
            })
            .collect();

        let mut cursor = Cursor::new(Vec::new());
        write_stl(&mut cursor, triangles.iter())?;
        Ok(cursor.into_inner())
    }

    /// Write the mesh to a binary STL file, replacing any existing content.
    pub fn write_stl<P: AsRef<Path>>(&self, path: P) -> Result<(), IoError> {
        let bytes = self.to_stl_bytes()?;
        std::fs::write(path.as_ref(), &bytes)?;
        debug!(path = %path.as_ref().display(), triangles = self.num_triangles(), "wrote STL");
        Ok(())
    }
}
