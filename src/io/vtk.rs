//! Legacy VTK output.
//!
//! Writes an ASCII `UNSTRUCTURED_GRID` that ParaView and VisIt open
//! directly, optionally with one scalar value per vertex. Reading is not
//! supported.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{MeshError, Result};
use crate::mesh::{to_face_vertex, HalfEdgeMesh, MeshIndex};

const VTK_TRIANGLE: u8 = 5;
const VTK_QUAD: u8 = 9;
const VTK_POLYGON: u8 = 7;

/// Save a mesh to a legacy VTK file.
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, path: P) -> Result<()> {
    let file = File::create(path.as_ref())?;
    let mut writer = BufWriter::new(file);
    write(mesh, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Write a mesh as a legacy VTK unstructured grid.
pub fn write<W: Write, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, writer: &mut W) -> Result<()> {
    write_grid(mesh, None, writer)
}

/// Write a mesh with a named per-vertex scalar field.
///
/// # Errors
/// [`MeshError::InvalidParameter`] if `values` does not have one entry per
/// vertex.
pub fn write_with_scalars<W: Write, I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    name: &str,
    values: &[f64],
    writer: &mut W,
) -> Result<()> {
    if values.len() != mesh.num_vertices() {
        return Err(MeshError::invalid_param(
            "values",
            values.len(),
            "need one scalar per vertex",
        ));
    }
    write_grid(mesh, Some((name, values)), writer)
}

fn write_grid<W: Write, I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    scalars: Option<(&str, &[f64])>,
    writer: &mut W,
) -> Result<()> {
    let (vertices, faces) = to_face_vertex(mesh);

    writeln!(writer, "# vtk DataFile Version 3.0")?;
    writeln!(writer, "lsmooth")?;
    writeln!(writer, "ASCII")?;
    writeln!(writer, "DATASET UNSTRUCTURED_GRID")?;

    writeln!(writer, "POINTS {} double", vertices.len())?;
    for v in &vertices {
        writeln!(writer, "{} {} {}", v.x, v.y, v.z)?;
    }

    let size: usize = faces.iter().map(|f| f.len() + 1).sum();
    writeln!(writer, "CELLS {} {}", faces.len(), size)?;
    for face in &faces {
        write!(writer, "{}", face.len())?;
        for i in face {
            write!(writer, " {}", i)?;
        }
        writeln!(writer)?;
    }

    writeln!(writer, "CELL_TYPES {}", faces.len())?;
    for face in &faces {
        let cell_type = match face.len() {
            3 => VTK_TRIANGLE,
            4 => VTK_QUAD,
            _ => VTK_POLYGON,
        };
        writeln!(writer, "{}", cell_type)?;
    }

    if let Some((name, values)) = scalars {
        writeln!(writer, "POINT_DATA {}", values.len())?;
        writeln!(writer, "SCALARS {} double 1", name)?;
        writeln!(writer, "LOOKUP_TABLE default")?;
        for value in values {
            writeln!(writer, "{}", value)?;
        }
    }

    Ok(())
}
