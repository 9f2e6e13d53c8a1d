//! Error types for lsmooth.
//!
//! All fallible operations in the library return [`Result`], which carries a
//! [`MeshError`].

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur while loading, smoothing, or saving a mesh.
#[derive(Error, Debug)]
pub enum MeshError {
    /// The mesh has no faces.
    #[error("mesh has no faces")]
    EmptyMesh,

    /// A face references an invalid vertex index.
    #[error("face {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The face index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A face has fewer than three vertices or repeats a vertex.
    #[error("face {face} is degenerate (fewer than 3 vertices or a repeated vertex)")]
    DegenerateFace {
        /// The face index.
        face: usize,
    },

    /// The same directed edge appears in two faces.
    #[error("directed edge ({v0}, {v1}) is used by more than one face")]
    NonManifoldEdge {
        /// First vertex of the edge.
        v0: usize,
        /// Second vertex of the edge.
        v1: usize,
    },

    /// A half-edge references a vertex or opposite half-edge out of range.
    #[error("half-edge {halfedge} has invalid topology: {reason}")]
    InvalidTopology {
        /// The offending half-edge index.
        halfedge: usize,
        /// What is wrong with it.
        reason: String,
    },

    /// The least-squares solve for one axis did not produce a usable result.
    #[error("solver failed on axis {axis}")]
    SolverFailure {
        /// The coordinate axis being solved (`x`, `y` or `z`).
        axis: char,
        /// The error reported by the solver backend.
        #[source]
        source: Box<MeshError>,
    },

    /// A solver context was driven out of order.
    #[error("solver state error: expected {expected}, found {found}")]
    SolverState {
        /// The state the operation requires.
        expected: &'static str,
        /// The state the context was in.
        found: &'static str,
    },

    /// No input mesh was supplied.
    #[error("no input mesh given")]
    MissingInput,

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A line of a text mesh file could not be parsed.
    #[error("parse error on line {line}: {message}")]
    ParseError {
        /// 1-based line number.
        line: usize,
        /// What went wrong.
        message: String,
    },

    /// Error loading mesh from file.
    #[error("failed to load mesh from {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Error saving mesh to file.
    #[error("failed to save mesh to {path}: {message}")]
    SaveError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Unsupported file format.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },

    /// Iterative solver failed to converge.
    #[error("algorithm failed to converge after {iterations} iterations")]
    ConvergenceFailed {
        /// Number of iterations attempted.
        iterations: usize,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl MeshError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        MeshError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    /// Create an invalid topology error for a half-edge.
    pub fn invalid_topology(halfedge: usize, reason: impl Into<String>) -> Self {
        MeshError::InvalidTopology {
            halfedge,
            reason: reason.into(),
        }
    }
}
