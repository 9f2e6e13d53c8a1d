//! Sparse matrix storage and a conjugate gradient least-squares solver.
//!
//! Over-determined systems `A x ≈ b` are solved through the normal equations
//! `AᵀA x = Aᵀb` without ever forming `AᵀA`: every product goes through `A`
//! and `Aᵀ` in CSR form. A Jacobi (diagonal) preconditioner compensates for
//! the very different row weights of penalty and smoothness equations.

use nalgebra::DVector;

use crate::error::{MeshError, Result};

/// Compressed Sparse Row (CSR) matrix.
#[derive(Debug, Clone)]
pub struct CsrMatrix {
    rows: usize,
    cols: usize,
    /// `row_ptr[i]..row_ptr[i + 1]` indexes the entries of row `i`.
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<f64>,
}

impl CsrMatrix {
    /// Create a CSR matrix from `(row, col, value)` triplets.
    ///
    /// Duplicate entries at the same position are summed. Rows without any
    /// entry are allowed.
    ///
    /// # Panics
    /// Panics if a triplet lies outside `rows x cols`.
    pub fn from_triplets(rows: usize, cols: usize, mut triplets: Vec<(usize, usize, f64)>) -> Self {
        triplets.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

        let mut row_ptr = vec![0usize; rows + 1];
        let mut col_idx: Vec<usize> = Vec::with_capacity(triplets.len());
        let mut values: Vec<f64> = Vec::with_capacity(triplets.len());
        let mut last: Option<(usize, usize)> = None;

        for (row, col, val) in triplets {
            assert!(row < rows && col < cols, "triplet ({}, {}) out of bounds", row, col);
            match (last, values.last_mut()) {
                (Some(prev), Some(acc)) if prev == (row, col) => *acc += val,
                _ => {
                    col_idx.push(col);
                    values.push(val);
                    row_ptr[row + 1] += 1;
                    last = Some((row, col));
                }
            }
        }

        // Per-row counts to offsets
        for r in 0..rows {
            row_ptr[r + 1] += row_ptr[r];
        }

        Self {
            rows,
            cols,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Number of rows.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.cols
    }

    /// Number of stored entries.
    #[inline]
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Iterate over the `(col, value)` entries of a row.
    pub fn row(&self, i: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let range = self.row_ptr[i]..self.row_ptr[i + 1];
        self.col_idx[range.clone()]
            .iter()
            .copied()
            .zip(self.values[range].iter().copied())
    }

    /// `y = A x`.
    pub fn mul_vec(&self, x: &DVector<f64>) -> DVector<f64> {
        assert_eq!(x.len(), self.cols, "Vector dimension mismatch");

        DVector::from_iterator(
            self.rows,
            (0..self.rows).map(|i| self.row(i).map(|(j, a)| a * x[j]).sum::<f64>()),
        )
    }

    /// `y = Aᵀ x`.
    pub fn transpose_mul_vec(&self, x: &DVector<f64>) -> DVector<f64> {
        assert_eq!(x.len(), self.rows, "Vector dimension mismatch");

        let mut y = DVector::zeros(self.cols);
        for i in 0..self.rows {
            let xi = x[i];
            if xi == 0.0 {
                continue;
            }
            for (j, a) in self.row(i) {
                y[j] += a * xi;
            }
        }
        y
    }

    /// `y = AᵀA x`.
    pub fn normal_mul_vec(&self, x: &DVector<f64>) -> DVector<f64> {
        self.transpose_mul_vec(&self.mul_vec(x))
    }

    /// Diagonal of `AᵀA`, i.e. the squared norm of every column.
    pub fn column_norms_squared(&self) -> DVector<f64> {
        let mut d = DVector::zeros(self.cols);
        for (&j, &a) in self.col_idx.iter().zip(&self.values) {
            d[j] += a * a;
        }
        d
    }
}

/// Solve `min ||A x - b||²` with Jacobi-preconditioned conjugate gradients on
/// the normal equations.
///
/// Starting from `x0`, components of the solution in the null space of `A`
/// are never touched, so an under-determined system returns the solution
/// closest to `x0`.
///
/// # Arguments
///
/// * `a` - The (possibly rectangular) system matrix
/// * `b` - Right-hand side, one entry per row of `a`
/// * `x0` - Initial guess, one entry per column of `a`
/// * `max_iter` - Maximum number of iterations
/// * `tolerance` - Relative tolerance on the normal-equation residual
///
/// # Errors
///
/// [`MeshError::ConvergenceFailed`] if the tolerance is not reached.
pub fn least_squares_cg(
    a: &CsrMatrix,
    b: &DVector<f64>,
    x0: DVector<f64>,
    max_iter: usize,
    tolerance: f64,
) -> Result<DVector<f64>> {
    assert_eq!(a.nrows(), b.len(), "Matrix-vector dimension mismatch");
    assert_eq!(a.ncols(), x0.len(), "Initial guess dimension mismatch");

    let mut x = x0;

    // Columns with no entries get a unit preconditioner; their residual is
    // identically zero so they keep their initial value.
    let inv_diag = a
        .column_norms_squared()
        .map(|d| if d > 0.0 { 1.0 / d } else { 1.0 });

    let rhs = a.transpose_mul_vec(b);
    let mut r = &rhs - a.normal_mul_vec(&x);

    let scale = rhs.norm().max(r.norm());
    if scale < 1e-300 {
        return Ok(x);
    }
    let threshold = tolerance * scale;
    if r.norm() <= threshold {
        return Ok(x);
    }

    let mut z = r.component_mul(&inv_diag);
    let mut p = z.clone();
    let mut rz = r.dot(&z);

    for iter in 0..max_iter {
        let ap = a.normal_mul_vec(&p);
        let p_ap = p.dot(&ap);
        if p_ap <= 0.0 || !p_ap.is_finite() {
            // The search direction left the range of AᵀA
            log::debug!("conjugate gradient breakdown at iteration {}", iter);
            break;
        }

        let alpha = rz / p_ap;
        x.axpy(alpha, &p, 1.0);
        r.axpy(-alpha, &ap, 1.0);

        if r.norm() <= threshold {
            log::trace!("conjugate gradient converged in {} iterations", iter + 1);
            return Ok(x);
        }

        z = r.component_mul(&inv_diag);
        let rz_new = r.dot(&z);
        let beta = rz_new / rz;
        p = &z + beta * &p;
        rz = rz_new;
    }

    Err(MeshError::ConvergenceFailed {
        iterations: max_iter,
    })
}
