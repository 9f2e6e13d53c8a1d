//! PLY (Stanford polygon) format support.
//!
//! Reads ASCII and binary PLY through `ply-rs`; polygon faces are kept as
//! polygons. Writes ASCII or binary little-endian PLY with double-precision
//! coordinates. The binary writer is hand-rolled because `ply-rs` writes a
//! wrong length prefix for binary lists.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use nalgebra::Point3;
use ply_rs::parser::Parser;
use ply_rs::ply::{DefaultElement, Property};

use super::Encoding;
use crate::error::{MeshError, Result};
use crate::mesh::{build_from_polygons, to_face_vertex, HalfEdgeMesh, MeshIndex};

/// Load a mesh from a PLY file.
///
/// # Example
///
/// ```no_run
/// use lsmooth::io::ply;
/// use lsmooth::mesh::HalfEdgeMesh;
///
/// let mesh: HalfEdgeMesh = ply::load("model.ply").unwrap();
/// ```
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<HalfEdgeMesh<I>> {
    let path = path.as_ref();
    let file = File::open(path)?;
    read(BufReader::new(file)).map_err(|e| match e {
        MeshError::Io(_) => e,
        other => MeshError::LoadError {
            path: path.to_path_buf(),
            message: other.to_string(),
        },
    })
}

/// Read a mesh in PLY format.
pub fn read<R: BufRead, I: MeshIndex>(reader: R) -> Result<HalfEdgeMesh<I>> {
    read_encoded(reader).map(|(mesh, _)| mesh)
}

/// Read a mesh in PLY format along with the encoding declared in its header.
///
/// Both binary byte orders report [`Encoding::Binary`].
pub fn read_encoded<R: BufRead, I: MeshIndex>(mut reader: R) -> Result<(HalfEdgeMesh<I>, Encoding)> {
    let parser = Parser::<DefaultElement>::new();
    let ply = parser.read_ply(&mut reader)?;
    let encoding = match ply.header.encoding {
        ply_rs::ply::Encoding::Ascii => Encoding::Ascii,
        ply_rs::ply::Encoding::BinaryLittleEndian | ply_rs::ply::Encoding::BinaryBigEndian => Encoding::Binary,
    };

    let malformed = |message: &str| MeshError::ParseError {
        line: 0,
        message: message.to_string(),
    };

    let vertex_element = ply
        .payload
        .get("vertex")
        .ok_or_else(|| malformed("PLY file has no vertex element"))?;

    let vertices = vertex_element
        .iter()
        .map(|vertex| {
            let x = get_float_property(vertex, "x").ok_or_else(|| malformed("vertex missing x coordinate"))?;
            let y = get_float_property(vertex, "y").ok_or_else(|| malformed("vertex missing y coordinate"))?;
            let z = get_float_property(vertex, "z").ok_or_else(|| malformed("vertex missing z coordinate"))?;
            Ok(Point3::new(x, y, z))
        })
        .collect::<Result<Vec<_>>>()?;

    let face_element = ply
        .payload
        .get("face")
        .ok_or_else(|| malformed("PLY file has no face element"))?;

    let faces = face_element
        .iter()
        .map(|face| {
            get_list_property(face, "vertex_indices")
                .or_else(|| get_list_property(face, "vertex_index"))
                .ok_or_else(|| malformed("face missing vertex_indices property"))
        })
        .collect::<Result<Vec<_>>>()?;

    let mesh = build_from_polygons(&vertices, &faces)?;
    Ok((mesh, encoding))
}

fn get_float_property(element: &DefaultElement, name: &str) -> Option<f64> {
    match element.get(name)? {
        Property::Float(v) => Some(*v as f64),
        Property::Double(v) => Some(*v),
        Property::Int(v) => Some(*v as f64),
        Property::UInt(v) => Some(*v as f64),
        Property::Short(v) => Some(*v as f64),
        Property::UShort(v) => Some(*v as f64),
        Property::Char(v) => Some(*v as f64),
        Property::UChar(v) => Some(*v as f64),
        _ => None,
    }
}

fn get_list_property(element: &DefaultElement, name: &str) -> Option<Vec<usize>> {
    match element.get(name)? {
        Property::ListInt(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUInt(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListShort(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUShort(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListChar(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUChar(v) => Some(v.iter().map(|&x| x as usize).collect()),
        _ => None,
    }
}

/// Save a mesh to a PLY file (ASCII format).
///
/// # Example
///
/// ```no_run
/// use lsmooth::io::ply;
/// use lsmooth::mesh::HalfEdgeMesh;
///
/// let mesh: HalfEdgeMesh = HalfEdgeMesh::new();
/// ply::save(&mesh, "output.ply").unwrap();
/// ```
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write(mesh, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Write a mesh in ASCII PLY format.
pub fn write<W: Write, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, writer: &mut W) -> Result<()> {
    let (vertices, faces) = to_face_vertex(mesh);
    write_header(writer, "ascii", vertices.len(), faces.len())?;

    for v in &vertices {
        writeln!(writer, "{} {} {}", v.x, v.y, v.z)?;
    }

    for face in &faces {
        write!(writer, "{}", list_len(face)?)?;
        for &i in face {
            write!(writer, " {}", list_index(i)?)?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

/// Write a mesh in binary little-endian PLY format.
pub fn write_binary<W: Write, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, writer: &mut W) -> Result<()> {
    let (vertices, faces) = to_face_vertex(mesh);
    write_header(writer, "binary_little_endian", vertices.len(), faces.len())?;

    for v in &vertices {
        writer.write_all(&v.x.to_le_bytes())?;
        writer.write_all(&v.y.to_le_bytes())?;
        writer.write_all(&v.z.to_le_bytes())?;
    }

    for face in &faces {
        writer.write_all(&[list_len(face)?])?;
        for &i in face {
            writer.write_all(&list_index(i)?.to_le_bytes())?;
        }
    }

    Ok(())
}

fn write_header<W: Write>(writer: &mut W, format: &str, num_vertices: usize, num_faces: usize) -> Result<()> {
    writeln!(writer, "ply")?;
    writeln!(writer, "format {} 1.0", format)?;
    writeln!(writer, "comment Generated by lsmooth")?;
    writeln!(writer, "element vertex {}", num_vertices)?;
    writeln!(writer, "property double x")?;
    writeln!(writer, "property double y")?;
    writeln!(writer, "property double z")?;
    writeln!(writer, "element face {}", num_faces)?;
    writeln!(writer, "property list uchar int vertex_indices")?;
    writeln!(writer, "end_header")?;
    Ok(())
}

// Faces are stored as `list uchar int`
fn list_len(face: &[usize]) -> Result<u8> {
    u8::try_from(face.len())
        .map_err(|_| MeshError::invalid_param("face degree", face.len(), "PLY face lists hold at most 255 vertices"))
}

fn list_index(i: usize) -> Result<i32> {
    i32::try_from(i).map_err(|_| MeshError::invalid_param("vertex index", i, "PLY face indices are 32-bit signed"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::FaceId;

    const QUAD_AND_TRIANGLE: &str = "\
ply
format ascii 1.0
element vertex 5
property float x
property float y
property float z
element face 2
property list uchar int vertex_indices
end_header
0 0 0
1 0 0
1 1 0
0 1 0
2 0.5 0
4 0 1 2 3
3 1 4 2
";

    #[test]
    fn test_read_keeps_polygons() {
        let mesh: HalfEdgeMesh = read(QUAD_AND_TRIANGLE.as_bytes()).unwrap();
        assert_eq!(mesh.num_vertices(), 5);
        assert_eq!(mesh.num_faces(), 2);
        assert_eq!(mesh.face_degree(FaceId::new(0)), 4);
        assert_eq!(mesh.face_degree(FaceId::new(1)), 3);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_write_then_read() {
        let mesh: HalfEdgeMesh = read(QUAD_AND_TRIANGLE.as_bytes()).unwrap();
        let mut out = Vec::new();
        write(&mesh, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("element face 2\n"));
        assert!(text.ends_with("4 0 1 2 3\n3 1 4 2\n"));

        let again: HalfEdgeMesh = read(text.as_bytes()).unwrap();
        assert_eq!(again.positions(), mesh.positions());
    }

    #[test]
    fn test_binary_write_then_read() {
        let mesh: HalfEdgeMesh = read(QUAD_AND_TRIANGLE.as_bytes()).unwrap();
        let mut out = Vec::new();
        write_binary(&mesh, &mut out).unwrap();

        let header_end = b"end_header\n";
        let body = out
            .windows(header_end.len())
            .position(|w| w == header_end)
            .map(|p| p + header_end.len())
            .unwrap();
        assert!(out.starts_with(b"ply\nformat binary_little_endian 1.0\n"));
        // 5 vertices of three doubles, then a quad and a triangle
        assert_eq!(out.len() - body, 5 * 24 + (1 + 4 * 4) + (1 + 3 * 4));

        let (again, encoding): (HalfEdgeMesh, _) = read_encoded(out.as_slice()).unwrap();
        assert_eq!(encoding, Encoding::Binary);
        assert_eq!(again.positions(), mesh.positions());
        assert_eq!(again.face_degree(FaceId::new(0)), 4);
        assert_eq!(again.face_degree(FaceId::new(1)), 3);
    }

    #[test]
    fn test_ascii_encoding_is_reported() {
        let (_, encoding): (HalfEdgeMesh, _) = read_encoded(QUAD_AND_TRIANGLE.as_bytes()).unwrap();
        assert_eq!(encoding, Encoding::Ascii);
    }

    #[test]
    fn test_missing_faces() {
        let text = "ply\nformat ascii 1.0\nelement vertex 1\nproperty float x\nproperty float y\nproperty float z\nend_header\n0 0 0\n";
        let result: Result<HalfEdgeMesh> = read(text.as_bytes());
        assert!(matches!(result, Err(MeshError::ParseError { .. })));
    }
}
