//! Smoothing algorithms.
//!
//! - **Smoothing**: least-squares Laplacian smoothing with boundary or pinned
//!   anchors ([`smooth`])
//! - **Solvers**: the row-by-row least-squares interface and its sparse
//!   conjugate gradient backend ([`solver`])

mod progress;
pub mod smooth;
pub mod solver;

pub use progress::Progress;
