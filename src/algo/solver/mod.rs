//! Linear least-squares solver interface.
//!
//! The smoothing code describes its system one row at a time through the
//! [`LinearSolver`] trait, in the same begin/end style as OpenNL:
//!
//! ```text
//! set_variable_count, set_least_squares
//! begin_system
//!     set_variable*            (initial guess)
//!     begin_matrix
//!         (begin_row, add_coefficient*, set_right_hand_side, end_row)*
//!     end_matrix
//! end_system
//! solve
//! variable*
//! ```
//!
//! Calls made out of that order fail with [`MeshError::SolverState`].
//! A [`SolverBackend`] hands out fresh, independent contexts so that the
//! three coordinate axes can be solved concurrently.
//!
//! [`MeshError::SolverState`]: crate::error::MeshError::SolverState

mod least_squares;
mod sparse;

pub use least_squares::{SparseBackend, SparseLeastSquares};
pub use sparse::{least_squares_cg, CsrMatrix};

use crate::error::Result;

/// Row-by-row builder and solver for one linear system.
pub trait LinearSolver {
    /// Declare the number of unknowns. Only valid before [`begin_system`].
    ///
    /// [`begin_system`]: LinearSolver::begin_system
    fn set_variable_count(&mut self, count: usize) -> Result<()>;

    /// Select least-squares mode. When disabled the system must be square.
    fn set_least_squares(&mut self, enabled: bool) -> Result<()>;

    /// Open the system.
    fn begin_system(&mut self) -> Result<()>;

    /// Set the current value of an unknown, used as the initial guess.
    fn set_variable(&mut self, index: usize, value: f64) -> Result<()>;

    /// Start emitting rows.
    fn begin_matrix(&mut self) -> Result<()>;

    /// Open a new row.
    fn begin_row(&mut self) -> Result<()>;

    /// Add `value` to the coefficient of unknown `index` in the open row.
    fn add_coefficient(&mut self, index: usize, value: f64) -> Result<()>;

    /// Set the right-hand side of the open row.
    fn set_right_hand_side(&mut self, value: f64) -> Result<()>;

    /// Close the open row.
    fn end_row(&mut self) -> Result<()>;

    /// Stop emitting rows.
    fn end_matrix(&mut self) -> Result<()>;

    /// Close the system.
    fn end_system(&mut self) -> Result<()>;

    /// Solve the closed system.
    fn solve(&mut self) -> Result<()>;

    /// Value of unknown `index`: the solution after [`solve`], the initial
    /// guess before.
    ///
    /// [`solve`]: LinearSolver::solve
    fn variable(&self, index: usize) -> f64;
}

/// Factory for independent solver contexts.
pub trait SolverBackend: Sync {
    /// The context type produced.
    type Context: LinearSolver + Send;

    /// Create a fresh context in its initial state.
    fn create(&self) -> Self::Context;
}
