//! Core mesh data structures.
//!
//! # Overview
//!
//! [`HalfEdgeMesh`] stores a polygon mesh as a half-edge structure in which
//! boundary half-edges simply have no twin. [`HalfEdgeTopology`] is the narrow
//! read-only view the smoothing code consumes, implemented by the mesh and by
//! [`HalfEdgeTable`] for topology that does not come from faces.
//!
//! # Index Types
//!
//! Mesh elements are identified by type-safe wrappers ([`VertexId`],
//! [`HalfEdgeId`], [`FaceId`]) generic over a [`MeshIndex`] integer width.
//!
//! # Construction
//!
//! ```
//! use lsmooth::mesh::{HalfEdgeMesh, build_from_triangles};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2]];
//!
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//! ```

mod builder;
mod halfedge;
mod index;
mod topology;

pub use builder::{build_from_polygons, build_from_quads, build_from_triangles, to_face_vertex};
pub use halfedge::{Face, FaceHalfEdgeIter, HalfEdge, HalfEdgeMesh, Vertex};
pub use index::{FaceId, HalfEdgeId, MeshIndex, VertexId};
pub use topology::{
    neighbor_lists, validate_topology, HalfEdgeTable, HalfEdgeTopology, RawHalfEdge,
};
