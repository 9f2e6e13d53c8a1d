//! STL (stereolithography) format support.
//!
//! Binary and ASCII STL are read through `stl_io`, which merges coincident
//! corners into shared vertices. Both encodings can be written; polygon faces
//! are fan-triangulated.

use std::fs::File;
use std::io::{BufWriter, Cursor, Read, Write};
use std::path::Path;

use nalgebra::{Point3, Vector3};

use super::Encoding;
use crate::error::{MeshError, Result};
use crate::mesh::{build_from_triangles, to_face_vertex, HalfEdgeMesh, MeshIndex};

/// Load a mesh from an STL file.
///
/// Automatically detects binary vs ASCII format.
///
/// # Example
///
/// ```no_run
/// use lsmooth::io::stl;
/// use lsmooth::mesh::HalfEdgeMesh;
///
/// let mesh: HalfEdgeMesh = stl::load("model.stl").unwrap();
/// ```
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<HalfEdgeMesh<I>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    read(file).map_err(|e| match e {
        MeshError::Io(_) => e,
        other => MeshError::LoadError {
            path: path.to_path_buf(),
            message: other.to_string(),
        },
    })
}

/// Read a mesh in STL format.
pub fn read<R: Read, I: MeshIndex>(reader: R) -> Result<HalfEdgeMesh<I>> {
    read_encoded(reader).map(|(mesh, _)| mesh)
}

/// Read a mesh in STL format along with the encoding it was stored in.
pub fn read_encoded<R: Read, I: MeshIndex>(mut reader: R) -> Result<(HalfEdgeMesh<I>, Encoding)> {
    // stl_io needs to seek to tell binary from ASCII
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    let encoding = detect_encoding(&bytes);
    let stl = stl_io::read_stl(&mut Cursor::new(bytes))?;

    let vertices: Vec<Point3<f64>> = stl
        .vertices
        .iter()
        .map(|v| Point3::new(v[0] as f64, v[1] as f64, v[2] as f64))
        .collect();

    // Corners that collapsed onto one vertex leave degenerate triangles
    let faces: Vec<[usize; 3]> = stl
        .faces
        .iter()
        .map(|tri| tri.vertices)
        .filter(|[a, b, c]| a != b && b != c && a != c)
        .collect();

    if faces.is_empty() {
        return Err(MeshError::ParseError {
            line: 0,
            message: "STL file contains no valid triangles".to_string(),
        });
    }

    let mesh = build_from_triangles(&vertices, &faces)?;
    Ok((mesh, encoding))
}

/// Guess the encoding of STL data.
///
/// Binary STL is an 80-byte header, a little-endian triangle count and 50
/// bytes per triangle. Binary headers may also start with `solid`, so the
/// size check wins over the keyword.
pub fn detect_encoding(bytes: &[u8]) -> Encoding {
    if bytes.len() >= 84 {
        let count = u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]]) as u64;
        if 84 + 50 * count == bytes.len() as u64 {
            return Encoding::Binary;
        }
    }

    let text = bytes.iter().skip_while(|b| b.is_ascii_whitespace());
    if text.take(5).copied().eq(*b"solid") {
        Encoding::Ascii
    } else {
        Encoding::Binary
    }
}

/// Save a mesh to a binary STL file.
///
/// # Example
///
/// ```no_run
/// use lsmooth::io::stl;
/// use lsmooth::mesh::HalfEdgeMesh;
///
/// let mesh: HalfEdgeMesh = HalfEdgeMesh::new();
/// stl::save(&mesh, "output.stl").unwrap();
/// ```
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write(mesh, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Write a mesh in binary STL format.
pub fn write<W: Write, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, writer: &mut W) -> Result<()> {
    let to_vertex = |p: &Point3<f32>| stl_io::Vertex::new([p.x, p.y, p.z]);

    let triangles: Vec<stl_io::Triangle> = triangulate(mesh)
        .iter()
        .map(|(n, [p0, p1, p2])| stl_io::Triangle {
            normal: stl_io::Normal::new([n.x, n.y, n.z]),
            vertices: [to_vertex(p0), to_vertex(p1), to_vertex(p2)],
        })
        .collect();

    stl_io::write_stl(writer, triangles.iter())?;
    Ok(())
}

/// Write a mesh in ASCII STL format.
pub fn write_ascii<W: Write, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, writer: &mut W) -> Result<()> {
    writeln!(writer, "solid lsmooth")?;
    for (n, corners) in triangulate(mesh) {
        writeln!(writer, "  facet normal {} {} {}", n.x, n.y, n.z)?;
        writeln!(writer, "    outer loop")?;
        for p in &corners {
            writeln!(writer, "      vertex {} {} {}", p.x, p.y, p.z)?;
        }
        writeln!(writer, "    endloop")?;
        writeln!(writer, "  endfacet")?;
    }
    writeln!(writer, "endsolid lsmooth")?;
    Ok(())
}

/// Fan-triangulate every face into single-precision normal and corners.
fn triangulate<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> Vec<(Vector3<f32>, [Point3<f32>; 3])> {
    let (vertices, faces) = to_face_vertex(mesh);

    faces
        .iter()
        .flat_map(|f| (1..f.len() - 1).map(move |i| [f[0], f[i], f[i + 1]]))
        .map(|[a, b, c]| {
            let (p0, p1, p2) = (&vertices[a], &vertices[b], &vertices[c]);
            let n = (p1 - p0)
                .cross(&(p2 - p0))
                .try_normalize(0.0)
                .unwrap_or_else(Vector3::zeros);
            (n.cast::<f32>(), [p0.cast::<f32>(), p1.cast::<f32>(), p2.cast::<f32>()])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_from_quads;

    #[test]
    fn test_write_then_read_shares_vertices() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mesh: HalfEdgeMesh = build_from_quads(&vertices, &[[0, 1, 2, 3]]).unwrap();

        let mut out = Vec::new();
        write(&mesh, &mut out).unwrap();
        // 80-byte header, count, then 50 bytes per triangle
        assert_eq!(out.len(), 84 + 2 * 50);

        let (again, encoding): (HalfEdgeMesh, _) = read_encoded(out.as_slice()).unwrap();
        assert_eq!(encoding, Encoding::Binary);
        assert_eq!(again.num_vertices(), 4);
        assert_eq!(again.num_faces(), 2);
        assert!(again.is_valid());
    }

    #[test]
    fn test_ascii_write_then_read() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.5),
        ];
        let mesh: HalfEdgeMesh = build_from_quads(&vertices, &[[0, 1, 2, 3]]).unwrap();

        let mut out = Vec::new();
        write_ascii(&mesh, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("solid lsmooth\n"));
        assert!(text.ends_with("endsolid lsmooth\n"));
        assert_eq!(text.matches("endfacet").count(), 2);

        let (again, encoding): (HalfEdgeMesh, _) = read_encoded(text.as_bytes()).unwrap();
        assert_eq!(encoding, Encoding::Ascii);
        assert_eq!(again.num_vertices(), 4);
        assert_eq!(again.num_faces(), 2);
    }

    #[test]
    fn test_detect_encoding() {
        assert_eq!(detect_encoding(b"  solid part\nendsolid part\n"), Encoding::Ascii);
        assert_eq!(detect_encoding(b"\x00\x01garbage"), Encoding::Binary);

        // Binary header that happens to start with the ASCII keyword
        let mut bytes = b"solid exported".to_vec();
        bytes.resize(80, b' ');
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.resize(84 + 50, 0);
        assert_eq!(detect_encoding(&bytes), Encoding::Binary);
    }

    #[test]
    fn test_read_ascii() {
        let text = "\
solid tri
  facet normal 0 0 1
    outer loop
      vertex 0 0 0
      vertex 1 0 0
      vertex 0 1 0
    endloop
  endfacet
endsolid tri
";
        let mesh: HalfEdgeMesh = read(text.as_bytes()).unwrap();
        assert_eq!(mesh.num_vertices(), 3);
        assert_eq!(mesh.num_faces(), 1);
    }
}
