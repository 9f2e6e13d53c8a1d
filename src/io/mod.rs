//! Mesh file I/O.
//!
//! # Supported Formats
//!
//! | Format | Extension | Load | Save | Notes |
//! |--------|-----------|------|------|-------|
//! | Wavefront OBJ | `.obj` | ✓ | ✓ | Polygons, negative indices |
//! | STL | `.stl` | ✓ | ✓ | Binary and ASCII |
//! | PLY | `.ply` | ✓ | ✓ | Stanford polygon format, ASCII and binary |
//! | Legacy VTK | `.vtk` | ✗ | ✓ | Unstructured grid for visualization |
//!
//! # Usage
//!
//! ```no_run
//! use lsmooth::io::{load, save};
//! use lsmooth::mesh::HalfEdgeMesh;
//!
//! // Load with automatic format detection
//! let mesh: HalfEdgeMesh = load("model.obj").unwrap();
//!
//! // Save with automatic format detection
//! save(&mesh, "output.ply").unwrap();
//! ```
//!
//! [`read`] and [`write`] work on any reader or writer, e.g. standard output:
//!
//! ```no_run
//! use lsmooth::io::{write, Format};
//! use lsmooth::mesh::HalfEdgeMesh;
//!
//! let mesh: HalfEdgeMesh = HalfEdgeMesh::new();
//! write(&mesh, Format::Obj, &mut std::io::stdout().lock()).unwrap();
//! ```
//!
//! [`load_encoded`] also reports whether the file was ASCII or binary, so
//! [`write_encoded`] can answer in kind.

pub mod obj;
pub mod ply;
pub mod stl;
pub mod vtk;

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{MeshError, Result};
use crate::mesh::{HalfEdgeMesh, MeshIndex};

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Wavefront OBJ format.
    Obj,
    /// STL (stereolithography) format.
    Stl,
    /// PLY (Stanford polygon) format.
    Ply,
    /// Legacy VTK format (write only).
    Vtk,
}

impl Format {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Format> {
        match ext.to_lowercase().as_str() {
            "obj" => Some(Format::Obj),
            "stl" => Some(Format::Stl),
            "ply" => Some(Format::Ply),
            "vtk" => Some(Format::Vtk),
            _ => None,
        }
    }

    /// Detect format from file path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Format> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Format::from_extension)
    }

    /// Detect format from file path, failing for unknown extensions.
    pub fn detect<P: AsRef<Path>>(path: P) -> Result<Format> {
        let path = path.as_ref();
        Format::from_path(path).ok_or_else(|| MeshError::UnsupportedFormat {
            extension: path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("(none)")
                .to_string(),
        })
    }

    /// Canonical file extension.
    pub fn extension(self) -> &'static str {
        match self {
            Format::Obj => "obj",
            Format::Stl => "stl",
            Format::Ply => "ply",
            Format::Vtk => "vtk",
        }
    }

    /// Whether meshes can be read in this format.
    pub fn can_read(self) -> bool {
        !matches!(self, Format::Vtk)
    }

    /// Encoding used by [`write`] and [`save`].
    pub fn default_encoding(self) -> Encoding {
        match self {
            Format::Stl => Encoding::Binary,
            Format::Obj | Format::Ply | Format::Vtk => Encoding::Ascii,
        }
    }
}

/// Payload encoding of a mesh file.
///
/// OBJ and VTK are text-only and ignore [`Encoding::Binary`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Human-readable text.
    Ascii,
    /// Binary payload (little-endian when written).
    Binary,
}

/// Load a mesh from a file with automatic format detection.
///
/// The format is determined by the file extension.
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<HalfEdgeMesh<I>> {
    load_encoded(path).map(|(mesh, _)| mesh)
}

/// Load a mesh and report the encoding it was stored in.
pub fn load_encoded<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<(HalfEdgeMesh<I>, Encoding)> {
    let path = path.as_ref();
    let format = Format::detect(path)?;
    if !format.can_read() {
        return Err(MeshError::UnsupportedFormat {
            extension: format.extension().to_string(),
        });
    }

    let file = File::open(path)?;
    read_encoded(format, BufReader::new(file)).map_err(|e| match e {
        MeshError::Io(_) => e,
        other => MeshError::LoadError {
            path: path.to_path_buf(),
            message: other.to_string(),
        },
    })
}

/// Save a mesh to a file with automatic format detection.
///
/// The format is determined by the file extension.
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, path: P) -> Result<()> {
    let path = path.as_ref();
    let format = Format::detect(path)?;

    let file = File::create(path).map_err(|e| MeshError::SaveError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    let mut writer = BufWriter::new(file);
    write(mesh, format, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Read a mesh in the given format.
pub fn read<R: BufRead, I: MeshIndex>(format: Format, reader: R) -> Result<HalfEdgeMesh<I>> {
    read_encoded(format, reader).map(|(mesh, _)| mesh)
}

/// Read a mesh in the given format along with its encoding.
pub fn read_encoded<R: BufRead, I: MeshIndex>(format: Format, reader: R) -> Result<(HalfEdgeMesh<I>, Encoding)> {
    match format {
        Format::Obj => Ok((obj::read(reader)?, Encoding::Ascii)),
        Format::Stl => stl::read_encoded(reader),
        Format::Ply => ply::read_encoded(reader),
        Format::Vtk => Err(MeshError::UnsupportedFormat {
            extension: format.extension().to_string(),
        }),
    }
}

/// Write a mesh in the given format with its default encoding.
pub fn write<W: Write, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, format: Format, writer: &mut W) -> Result<()> {
    write_encoded(mesh, format, format.default_encoding(), writer)
}

/// Write a mesh in the given format and encoding.
pub fn write_encoded<W: Write, I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    format: Format,
    encoding: Encoding,
    writer: &mut W,
) -> Result<()> {
    match (format, encoding) {
        (Format::Obj, _) => obj::write(mesh, writer),
        (Format::Stl, Encoding::Ascii) => stl::write_ascii(mesh, writer),
        (Format::Stl, Encoding::Binary) => stl::write(mesh, writer),
        (Format::Ply, Encoding::Ascii) => ply::write(mesh, writer),
        (Format::Ply, Encoding::Binary) => ply::write_binary(mesh, writer),
        (Format::Vtk, _) => vtk::write(mesh, writer),
    }
}
