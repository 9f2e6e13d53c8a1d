//! Least-squares Laplacian smoothing.
//!
//! Every vertex coordinate is recomputed so that the two endpoints of each
//! interior edge agree as closely as possible, while anchored vertices are
//! held near a target by heavily weighted penalty rows. The three coordinate
//! axes give three independent sparse least-squares systems, solved in
//! parallel by default.
//!
//! # Anchors
//!
//! - **Boundary** ([`classify_boundary`]): every endpoint of a half-edge
//!   without an opposite is anchored to its current position.
//! - **Pinned** ([`ConstraintSet::pinned`]): explicit `(vertex, value)`
//!   pairs, the value applied on every solved axis.
//!
//! # Example
//!
//! ```
//! use lsmooth::prelude::*;
//! use lsmooth::algo::smooth::{least_squares_smooth, SmoothOptions};
//! use nalgebra::Point3;
//!
//! // A fan of four triangles around a raised center vertex
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.5),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//!     Point3::new(-1.0, 0.0, 0.0),
//!     Point3::new(0.0, -1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2], [0, 2, 3], [0, 3, 4], [0, 4, 1]];
//! let mut mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
//!
//! least_squares_smooth(&mut mesh, &SmoothOptions::default()).unwrap();
//!
//! // The rim is anchored, the center drops into its plane
//! assert!(mesh.position(VertexId::new(0)).z.abs() < 1e-3);
//! ```

mod constraints;
mod system;

pub use constraints::{classify_boundary, ConstraintSet, PinnedSample};
pub use system::solve_axis;

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use nalgebra::Point3;
use rayon::prelude::*;

use crate::algo::solver::{SolverBackend, SparseBackend};
use crate::error::{MeshError, Result};
use crate::mesh::{validate_topology, HalfEdgeMesh, HalfEdgeTopology, MeshIndex};

use super::Progress;

/// A coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Axis {
    /// The x axis.
    X,
    /// The y axis.
    Y,
    /// The z axis.
    Z,
}

impl Axis {
    /// All three axes in order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// Component index into a point.
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    /// Lowercase axis letter.
    #[inline]
    pub fn name(self) -> char {
        match self {
            Axis::X => 'x',
            Axis::Y => 'y',
            Axis::Z => 'z',
        }
    }

    /// Parse a single axis letter, case-insensitive.
    pub fn from_char(c: char) -> Option<Axis> {
        match c.to_ascii_lowercase() {
            'x' => Some(Axis::X),
            'y' => Some(Axis::Y),
            'z' => Some(Axis::Z),
            _ => None,
        }
    }

    /// Parse a list of axis letters such as `"xz"`.
    ///
    /// Repeated letters are ignored; the result is in x, y, z order.
    pub fn parse_list(s: &str) -> Result<Vec<Axis>> {
        let mut axes = s
            .chars()
            .map(|c| {
                Axis::from_char(c)
                    .ok_or_else(|| MeshError::invalid_param("axes", s, "expected letters x, y, z"))
            })
            .collect::<Result<Vec<_>>>()?;
        axes.sort_unstable();
        axes.dedup();
        if axes.is_empty() {
            return Err(MeshError::invalid_param("axes", s, "at least one axis required"));
        }
        Ok(axes)
    }

    /// Wrap a solver error for this axis.
    pub fn failure(self, source: MeshError) -> MeshError {
        MeshError::SolverFailure {
            axis: self.name(),
            source: Box::new(source),
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Options for least-squares smoothing.
#[derive(Debug, Clone)]
pub struct SmoothOptions {
    /// Weight of anchor rows. Larger values hold anchors closer to their
    /// targets.
    pub anchor_scale: f64,

    /// Weight of edge smoothness rows.
    pub smoothness_weight: f64,

    /// Axes to solve. Coordinates on other axes are left as they are.
    pub axes: Vec<Axis>,

    /// Whether to solve the axes in parallel (default: true).
    pub parallel: bool,

    /// Iteration limit of the sparse solver.
    pub max_iterations: usize,

    /// Relative residual tolerance of the sparse solver.
    pub tolerance: f64,
}

impl Default for SmoothOptions {
    fn default() -> Self {
        let backend = SparseBackend::default();
        Self {
            anchor_scale: 100.0,
            smoothness_weight: 1.0,
            axes: Axis::ALL.to_vec(),
            parallel: true,
            max_iterations: backend.max_iterations,
            tolerance: backend.tolerance,
        }
    }
}

impl SmoothOptions {
    /// Set the anchor row weight.
    pub fn with_anchor_scale(mut self, scale: f64) -> Self {
        self.anchor_scale = scale;
        self
    }

    /// Set the smoothness row weight.
    pub fn with_smoothness_weight(mut self, weight: f64) -> Self {
        self.smoothness_weight = weight;
        self
    }

    /// Solve only the given axes.
    pub fn with_axes(mut self, axes: &[Axis]) -> Self {
        self.axes = axes.to_vec();
        self
    }

    /// Set whether to use parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Create options for single-threaded execution.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Set the solver iteration limit.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the solver tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Check every option.
    ///
    /// # Errors
    /// [`MeshError::InvalidParameter`] naming the first bad option.
    pub fn validate(&self) -> Result<()> {
        if !(self.anchor_scale.is_finite() && self.anchor_scale > 0.0) {
            return Err(MeshError::invalid_param(
                "anchor_scale",
                self.anchor_scale,
                "must be positive and finite",
            ));
        }
        if !(self.smoothness_weight.is_finite() && self.smoothness_weight > 0.0) {
            return Err(MeshError::invalid_param(
                "smoothness_weight",
                self.smoothness_weight,
                "must be positive and finite",
            ));
        }
        if self.axes.is_empty() {
            return Err(MeshError::invalid_param("axes", "[]", "at least one axis required"));
        }
        if self.max_iterations == 0 {
            return Err(MeshError::invalid_param(
                "max_iterations",
                self.max_iterations,
                "must be at least 1",
            ));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(MeshError::invalid_param(
                "tolerance",
                self.tolerance,
                "must be positive and finite",
            ));
        }
        Ok(())
    }

    /// The sparse solver backend configured by these options.
    pub fn backend(&self) -> SparseBackend {
        SparseBackend::new(self.max_iterations, self.tolerance)
    }

    fn unique_axes(&self) -> Vec<Axis> {
        let mut axes = self.axes.clone();
        axes.sort_unstable();
        axes.dedup();
        axes
    }
}

/// Smooth a position array over arbitrary half-edge topology.
///
/// Each requested axis is solved with its own context from `backend` into
/// its own buffer. Only when every axis has succeeded are the buffers copied
/// into `positions`; on any error `positions` is left untouched.
///
/// # Errors
///
/// - [`MeshError::InvalidParameter`] for bad options or mismatched lengths
/// - [`MeshError::InvalidTopology`] before any solve
/// - [`MeshError::SolverFailure`] for the first axis that failed
pub fn smooth_positions<T, B>(
    topology: &T,
    positions: &mut [Point3<f64>],
    constraints: &ConstraintSet,
    options: &SmoothOptions,
    backend: &B,
    progress: &Progress,
) -> Result<()>
where
    T: HalfEdgeTopology + Sync + ?Sized,
    B: SolverBackend,
{
    options.validate()?;
    validate_topology(topology)?;
    system::check_lengths(topology, positions, constraints)?;

    let axes = options.unique_axes();
    let total = axes.len();
    let done = AtomicUsize::new(0);
    let current: &[Point3<f64>] = &*positions;

    progress.report(0, total, "Least-squares smoothing");

    let solve = |axis: Axis| -> Result<(Axis, Vec<f64>)> {
        let mut solver = backend.create();
        let values = solve_axis(topology, current, constraints, axis, options, &mut solver)?;
        let step = done.fetch_add(1, Ordering::Relaxed) + 1;
        progress.report(step, total, "Least-squares smoothing");
        Ok((axis, values))
    };

    let solutions: Vec<(Axis, Vec<f64>)> = if options.parallel {
        axes.par_iter().map(|&axis| solve(axis)).collect::<Result<_>>()?
    } else {
        axes.iter().map(|&axis| solve(axis)).collect::<Result<_>>()?
    };

    for (axis, values) in solutions {
        let k = axis.index();
        for (p, value) in positions.iter_mut().zip(values) {
            p[k] = value;
        }
    }

    Ok(())
}

/// Smooth a mesh with the given anchors.
///
/// The mesh is only modified if every axis solves.
pub fn smooth_mesh<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    constraints: &ConstraintSet,
    options: &SmoothOptions,
    progress: &Progress,
) -> Result<()> {
    let mut positions = mesh.positions();
    smooth_positions(&*mesh, &mut positions, constraints, options, &options.backend(), progress)?;
    mesh.set_positions(&positions);

    log::info!(
        "smoothed {} vertices on axes {} ({} anchored)",
        mesh.num_vertices(),
        options.unique_axes().iter().map(|a| a.name()).collect::<String>(),
        constraints.num_anchored()
    );
    Ok(())
}

/// Least-squares smoothing with boundary vertices anchored in place.
///
/// # Arguments
///
/// * `mesh` - The mesh to smooth (modified in place)
/// * `options` - Smoothing parameters
///
/// # Algorithm
///
/// 1. Anchor every vertex on a boundary half-edge to its current position
/// 2. For each axis, solve `min Σ scale²(x_v - t_v)² + Σ w²(x_i - x_j)²`
///    over anchors `v` and interior edges `(i, j)`
/// 3. Write all axes back at once
///
/// A closed mesh has no anchors: every connected component contracts to a
/// single point.
pub fn least_squares_smooth<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>, options: &SmoothOptions) -> Result<()> {
    least_squares_smooth_with_progress(mesh, options, &Progress::none())
}

/// Least-squares smoothing with explicitly pinned vertices.
///
/// Boundary vertices are free unless pinned.
///
/// # Example
///
/// ```
/// use lsmooth::prelude::*;
/// use lsmooth::algo::smooth::{least_squares_smooth_pinned, PinnedSample, SmoothOptions};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(1.0, 1.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// ];
/// let faces = vec![[0, 1, 2], [0, 2, 3]];
/// let mut mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
///
/// let pins = [PinnedSample::new(0, 0.0)];
/// let options = SmoothOptions::default().with_axes(&[Axis::Z]);
/// least_squares_smooth_pinned(&mut mesh, &pins, &options).unwrap();
/// ```
pub fn least_squares_smooth_pinned<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    pins: &[PinnedSample],
    options: &SmoothOptions,
) -> Result<()> {
    let constraints = ConstraintSet::pinned(mesh.num_vertices(), pins.iter().copied())?;
    smooth_mesh(mesh, &constraints, options, &Progress::none())
}

/// Boundary-anchored least-squares smoothing with progress reporting.
pub fn least_squares_smooth_with_progress<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    options: &SmoothOptions,
    progress: &Progress,
) -> Result<()> {
    let constraints = classify_boundary(&*mesh)?;
    smooth_mesh(mesh, &constraints, options, progress)
}
