//! Sparse least-squares context backed by conjugate gradients.

use nalgebra::DVector;

use super::sparse::{least_squares_cg, CsrMatrix};
use super::{LinearSolver, SolverBackend};
use crate::error::{MeshError, Result};

/// Where a [`SparseLeastSquares`] context is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Initial,
    System,
    Matrix,
    Row,
    MatrixClosed,
    SystemClosed,
    Solved,
}

impl State {
    fn name(self) -> &'static str {
        match self {
            State::Initial => "initial",
            State::System => "system",
            State::Matrix => "matrix",
            State::Row => "row",
            State::MatrixClosed => "matrix closed",
            State::SystemClosed => "system closed",
            State::Solved => "solved",
        }
    }
}

/// A [`LinearSolver`] that accumulates rows into a sparse matrix and solves
/// with [`least_squares_cg`].
///
/// Unknowns start at zero unless set through
/// [`set_variable`](LinearSolver::set_variable). Components of the solution
/// the rows do not determine keep that starting value.
///
/// # Example
/// ```
/// use lsmooth::algo::solver::{LinearSolver, SparseLeastSquares};
///
/// // x ≈ 1, x ≈ 3 in the least-squares sense
/// let mut solver = SparseLeastSquares::new(100, 1e-12);
/// solver.set_variable_count(1)?;
/// solver.set_least_squares(true)?;
/// solver.begin_system()?;
/// solver.begin_matrix()?;
/// for rhs in [1.0, 3.0] {
///     solver.begin_row()?;
///     solver.add_coefficient(0, 1.0)?;
///     solver.set_right_hand_side(rhs)?;
///     solver.end_row()?;
/// }
/// solver.end_matrix()?;
/// solver.end_system()?;
/// solver.solve()?;
/// assert!((solver.variable(0) - 2.0).abs() < 1e-9);
/// # Ok::<(), lsmooth::MeshError>(())
/// ```
#[derive(Debug, Clone)]
pub struct SparseLeastSquares {
    state: State,
    num_variables: Option<usize>,
    least_squares: bool,
    values: Vec<f64>,
    triplets: Vec<(usize, usize, f64)>,
    rhs: Vec<f64>,
    row_rhs: f64,
    max_iterations: usize,
    tolerance: f64,
}

impl SparseLeastSquares {
    /// Create a context with the given conjugate gradient limits.
    pub fn new(max_iterations: usize, tolerance: f64) -> Self {
        Self {
            state: State::Initial,
            num_variables: None,
            least_squares: false,
            values: Vec::new(),
            triplets: Vec::new(),
            rhs: Vec::new(),
            row_rhs: 0.0,
            max_iterations,
            tolerance,
        }
    }

    /// Number of rows emitted so far.
    pub fn num_rows(&self) -> usize {
        self.rhs.len()
    }

    fn require(&self, expected: State) -> Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(MeshError::SolverState {
                expected: expected.name(),
                found: self.state.name(),
            })
        }
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.values.len() {
            Ok(())
        } else {
            Err(MeshError::invalid_param(
                "variable",
                index,
                "index exceeds the declared variable count",
            ))
        }
    }
}

impl Default for SparseLeastSquares {
    fn default() -> Self {
        let backend = SparseBackend::default();
        Self::new(backend.max_iterations, backend.tolerance)
    }
}

impl LinearSolver for SparseLeastSquares {
    fn set_variable_count(&mut self, count: usize) -> Result<()> {
        self.require(State::Initial)?;
        self.num_variables = Some(count);
        Ok(())
    }

    fn set_least_squares(&mut self, enabled: bool) -> Result<()> {
        self.require(State::Initial)?;
        self.least_squares = enabled;
        Ok(())
    }

    fn begin_system(&mut self) -> Result<()> {
        self.require(State::Initial)?;
        let n = self.num_variables.ok_or(MeshError::SolverState {
            expected: "variable count",
            found: self.state.name(),
        })?;
        self.values = vec![0.0; n];
        self.triplets.clear();
        self.rhs.clear();
        self.state = State::System;
        Ok(())
    }

    fn set_variable(&mut self, index: usize, value: f64) -> Result<()> {
        self.require(State::System)?;
        self.check_index(index)?;
        self.values[index] = value;
        Ok(())
    }

    fn begin_matrix(&mut self) -> Result<()> {
        self.require(State::System)?;
        self.state = State::Matrix;
        Ok(())
    }

    fn begin_row(&mut self) -> Result<()> {
        self.require(State::Matrix)?;
        self.row_rhs = 0.0;
        self.state = State::Row;
        Ok(())
    }

    fn add_coefficient(&mut self, index: usize, value: f64) -> Result<()> {
        self.require(State::Row)?;
        self.check_index(index)?;
        if value != 0.0 {
            self.triplets.push((self.rhs.len(), index, value));
        }
        Ok(())
    }

    fn set_right_hand_side(&mut self, value: f64) -> Result<()> {
        self.require(State::Row)?;
        self.row_rhs = value;
        Ok(())
    }

    fn end_row(&mut self) -> Result<()> {
        self.require(State::Row)?;
        self.rhs.push(self.row_rhs);
        self.state = State::Matrix;
        Ok(())
    }

    fn end_matrix(&mut self) -> Result<()> {
        self.require(State::Matrix)?;
        self.state = State::MatrixClosed;
        Ok(())
    }

    fn end_system(&mut self) -> Result<()> {
        self.require(State::MatrixClosed)?;
        self.state = State::SystemClosed;
        Ok(())
    }

    fn solve(&mut self) -> Result<()> {
        self.require(State::SystemClosed)?;

        let n = self.values.len();
        let m = self.rhs.len();
        if !self.least_squares && m != n {
            return Err(MeshError::invalid_param(
                "rows",
                m,
                "a square system needs one row per variable",
            ));
        }

        let a = CsrMatrix::from_triplets(m, n, std::mem::take(&mut self.triplets));
        let b = DVector::from_column_slice(&self.rhs);
        let x0 = DVector::from_column_slice(&self.values);

        let x = least_squares_cg(&a, &b, x0, self.max_iterations, self.tolerance)?;
        if x.iter().any(|v| !v.is_finite()) {
            return Err(MeshError::ConvergenceFailed {
                iterations: self.max_iterations,
            });
        }

        log::trace!("solved {} x {} system with {} entries", m, n, a.nnz());
        self.values = x.iter().copied().collect();
        self.state = State::Solved;
        Ok(())
    }

    fn variable(&self, index: usize) -> f64 {
        self.values[index]
    }
}

/// Creates [`SparseLeastSquares`] contexts sharing the same limits.
#[derive(Debug, Clone, Copy)]
pub struct SparseBackend {
    /// Conjugate gradient iteration limit.
    pub max_iterations: usize,
    /// Relative residual tolerance.
    pub tolerance: f64,
}

impl SparseBackend {
    /// Create a backend with the given limits.
    pub fn new(max_iterations: usize, tolerance: f64) -> Self {
        Self {
            max_iterations,
            tolerance,
        }
    }
}

impl Default for SparseBackend {
    fn default() -> Self {
        Self {
            max_iterations: 10_000,
            tolerance: 1e-10,
        }
    }
}

impl SolverBackend for SparseBackend {
    type Context = SparseLeastSquares;

    fn create(&self) -> SparseLeastSquares {
        SparseLeastSquares::new(self.max_iterations, self.tolerance)
    }
}
