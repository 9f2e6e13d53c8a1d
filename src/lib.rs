//! # lsmooth
//!
//! Least-squares Laplacian smoothing of polygon meshes.
//!
//! Each coordinate axis is smoothed by solving a sparse over-determined
//! system: one smoothness row per interior edge pulls the two endpoints
//! together, and one weighted anchor row per constrained vertex pulls it
//! toward a target. The axes are independent and are solved in parallel.
//!
//! ## Features
//!
//! - **Half-edge data structure**: boundary half-edges have no twin, with
//!   type-safe indices over 16-, 32- or 64-bit integers
//! - **Two constraint modes**: boundary vertices anchored in place, or an
//!   explicit list of pinned vertices and target values
//! - **Pluggable solver**: a begin/end row-building [`algo::solver::LinearSolver`]
//!   interface with a built-in sparse least-squares backend
//! - **File formats**: OBJ, STL and PLY in and out, legacy VTK out
//!
//! ## Quick Start
//!
//! ```no_run
//! use lsmooth::prelude::*;
//! use lsmooth::algo::smooth::least_squares_smooth;
//!
//! let mut mesh: HalfEdgeMesh = lsmooth::io::load("scan.obj").unwrap();
//!
//! // Boundary vertices stay put, the interior relaxes
//! least_squares_smooth(&mut mesh, &SmoothOptions::default()).unwrap();
//!
//! lsmooth::io::save(&mesh, "smoothed.ply").unwrap();
//! ```
//!
//! ## Building Meshes Programmatically
//!
//! ```
//! use lsmooth::prelude::*;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//!     Point3::new(0.5, 0.5, 1.0),
//! ];
//!
//! let faces = vec![
//!     [0, 2, 1],  // bottom
//!     [0, 1, 3],  // front
//!     [1, 2, 3],  // right
//!     [2, 0, 3],  // left
//! ];
//!
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//! assert_eq!(mesh.num_vertices(), 4);
//! assert_eq!(mesh.num_faces(), 4);
//! ```
//!
//! ## Pinned Smoothing
//!
//! ```
//! use lsmooth::prelude::*;
//! use lsmooth::algo::smooth::least_squares_smooth_pinned;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.3),
//!     Point3::new(2.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 3], [1, 2, 3]];
//! let mut mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//!
//! // Height field: pin the z of two vertices, let the rest follow
//! let pins = [PinnedSample::new(0, 0.0), PinnedSample::new(2, 1.0)];
//! let options = SmoothOptions::default().with_axes(&[Axis::Z]);
//! least_squares_smooth_pinned(&mut mesh, &pins, &options).unwrap();
//!
//! // x and y are untouched
//! assert_eq!(mesh.position(VertexId::new(1)).x, 1.0);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod io;
pub mod mesh;

pub use error::{MeshError, Result};

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use lsmooth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::smooth::{Axis, ConstraintSet, PinnedSample, SmoothOptions};
    pub use crate::error::{MeshError, Result};
    pub use crate::mesh::{
        build_from_polygons, build_from_triangles, to_face_vertex, Face, FaceId, HalfEdge,
        HalfEdgeId, HalfEdgeMesh, HalfEdgeTable, HalfEdgeTopology, MeshIndex, Vertex, VertexId,
    };
}

// Re-export nalgebra types for convenience
pub use nalgebra;
