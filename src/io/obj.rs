//! Wavefront OBJ format support.
//!
//! Only geometry is read: `v` records and polygonal `f` records. Face
//! corners may be written as `i`, `i/t`, `i//n` or `i/t/n`, and negative
//! indices count back from the last vertex read. Every other record
//! (normals, texture coordinates, groups, materials) is skipped.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use nalgebra::Point3;

use crate::error::{MeshError, Result};
use crate::mesh::{build_from_polygons, to_face_vertex, HalfEdgeMesh, MeshIndex};

/// Load a mesh from an OBJ file.
///
/// # Example
///
/// ```no_run
/// use lsmooth::io::obj;
/// use lsmooth::mesh::HalfEdgeMesh;
///
/// let mesh: HalfEdgeMesh = obj::load("model.obj").unwrap();
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

/// Read a mesh in OBJ format.
pub fn read<R: BufRead, I: MeshIndex>(reader: R) -> Result<HalfEdgeMesh<I>> {
    let mut vertices: Vec<Point3<f64>> = Vec::new();
    let mut faces: Vec<Vec<usize>> = Vec::new();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = i + 1;
        let mut tokens = line.split_whitespace();

        match tokens.next() {
            Some("v") => {
                let mut coords = [0.0; 3];
                for c in &mut coords {
                    let token = tokens.next().ok_or_else(|| MeshError::ParseError {
                        line: line_no,
                        message: "vertex needs three coordinates".to_string(),
                    })?;
                    *c = token.parse().map_err(|_| MeshError::ParseError {
                        line: line_no,
                        message: format!("invalid coordinate '{}'", token),
                    })?;
                }
                vertices.push(Point3::from(coords));
            }
            Some("f") => {
                let face = tokens
                    .map(|token| parse_corner(token, vertices.len(), line_no))
                    .collect::<Result<Vec<_>>>()?;
                faces.push(face);
            }
            _ => {}
        }
    }

    build_from_polygons(&vertices, &faces)
}

/// Resolve the vertex index of one face corner to a 0-based index.
fn parse_corner(token: &str, num_vertices: usize, line: usize) -> Result<usize> {
    let index = token.split('/').next().unwrap_or_default();
    let value: i64 = index.parse().map_err(|_| MeshError::ParseError {
        line,
        message: format!("invalid face index '{}'", token),
    })?;

    let resolved = match value {
        v if v > 0 => Some(v as usize - 1),
        v if v < 0 => num_vertices.checked_sub(v.unsigned_abs() as usize),
        _ => None,
    };

    resolved.ok_or_else(|| MeshError::ParseError {
        line,
        message: format!("face index {} out of range", value),
    })
}

/// Save a mesh to an OBJ file.
///
/// # Example
///
/// ```no_run
/// use lsmooth::io::obj;
/// use lsmooth::mesh::HalfEdgeMesh;
///
/// let mesh: HalfEdgeMesh = HalfEdgeMesh::new();
/// obj::save(&mesh, "output.obj").unwrap();
/// ```
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write(mesh, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Write a mesh in OBJ format: `v` records, then 1-based `f` records.
pub fn write<W: Write, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, writer: &mut W) -> Result<()> {
    let (vertices, faces) = to_face_vertex(mesh);

    for v in &vertices {
        writeln!(writer, "v {} {} {}", v.x, v.y, v.z)?;
    }
    for face in &faces {
        write!(writer, "f")?;
        for &i in face {
            write!(writer, " {}", i + 1)?;
        }
        writeln!(writer)?;
    }

    Ok(())
}
