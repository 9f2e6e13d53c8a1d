//! Per-axis least-squares system.
//!
//! For one coordinate axis the unknowns are the vertex coordinates and the
//! rows are:
//!
//! ```text
//! anchor      scale * x_v           = scale * target_v     one per anchor
//! smoothness  w * x_origin - w * x_dest = 0                one per interior edge
//! ```
//!
//! An interior edge is emitted from the half-edge `h` with
//! `h < opposite(h)`, so each undirected edge appears exactly once.

use nalgebra::Point3;

use super::constraints::ConstraintSet;
use super::{Axis, SmoothOptions};
use crate::algo::solver::LinearSolver;
use crate::error::{MeshError, Result};
use crate::mesh::{validate_topology, HalfEdgeTopology};

/// Check that positions and constraints cover every vertex.
pub(super) fn check_lengths<T: HalfEdgeTopology + ?Sized>(
    topology: &T,
    positions: &[Point3<f64>],
    constraints: &ConstraintSet,
) -> Result<()> {
    let n = topology.num_vertices();
    if positions.len() != n {
        return Err(MeshError::invalid_param(
            "positions",
            positions.len(),
            "length must equal the vertex count",
        ));
    }
    if constraints.len() != n {
        return Err(MeshError::invalid_param(
            "constraints",
            constraints.len(),
            "length must equal the vertex count",
        ));
    }
    Ok(())
}

/// Assemble and solve the system for one axis.
///
/// `solver` must be a fresh context. Every unknown starts at its current
/// coordinate, which the solver keeps for any component the rows leave
/// undetermined. Returns one value per vertex; `positions` is not modified.
///
/// # Errors
///
/// - [`MeshError::InvalidTopology`] before any solver call if a half-edge
///   reference is out of range
/// - [`MeshError::InvalidParameter`] if `positions` or `constraints` do not
///   match the vertex count
/// - [`MeshError::SolverFailure`] wrapping whatever the solver reported
pub fn solve_axis<T, S>(
    topology: &T,
    positions: &[Point3<f64>],
    constraints: &ConstraintSet,
    axis: Axis,
    options: &SmoothOptions,
    solver: &mut S,
) -> Result<Vec<f64>>
where
    T: HalfEdgeTopology + ?Sized,
    S: LinearSolver + ?Sized,
{
    validate_topology(topology)?;
    check_lengths(topology, positions, constraints)?;

    let fail = |source: MeshError| axis.failure(source);
    let n = topology.num_vertices();
    let k = axis.index();
    let scale = options.anchor_scale;
    let weight = options.smoothness_weight;

    solver.set_variable_count(n).map_err(fail)?;
    solver.set_least_squares(true).map_err(fail)?;
    solver.begin_system().map_err(fail)?;
    for (v, p) in positions.iter().enumerate() {
        solver.set_variable(v, p[k]).map_err(fail)?;
    }
    solver.begin_matrix().map_err(fail)?;

    let anchors = constraints.anchor_targets(positions, axis);
    for &(v, target) in &anchors {
        solver.begin_row().map_err(fail)?;
        solver.add_coefficient(v, scale).map_err(fail)?;
        solver.set_right_hand_side(scale * target).map_err(fail)?;
        solver.end_row().map_err(fail)?;
    }

    let mut edges = 0;
    for h in 0..topology.num_halfedges() {
        match topology.he_opposite(h) {
            Some(o) if h < o => {}
            _ => continue,
        }
        solver.begin_row().map_err(fail)?;
        solver.add_coefficient(topology.he_origin(h), weight).map_err(fail)?;
        solver.add_coefficient(topology.he_dest(h), -weight).map_err(fail)?;
        solver.set_right_hand_side(0.0).map_err(fail)?;
        solver.end_row().map_err(fail)?;
        edges += 1;
    }

    solver.end_matrix().map_err(fail)?;
    solver.end_system().map_err(fail)?;

    if anchors.is_empty() {
        log::warn!(
            "axis {}: no anchor rows, solution is only determined up to a constant",
            axis
        );
    }
    log::debug!(
        "axis {}: {} variables, {} anchor rows, {} smoothness rows",
        axis,
        n,
        anchors.len(),
        edges
    );

    solver.solve().map_err(fail)?;

    Ok((0..n).map(|v| solver.variable(v)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::smooth::PinnedSample;
    use crate::mesh::{build_from_triangles, HalfEdgeMesh, HalfEdgeTable, RawHalfEdge};

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        coefficients: Vec<(usize, f64)>,
        rhs: f64,
    }

    /// Records everything it is told and "solves" by returning the initial
    /// guess shifted by `offset`.
    #[derive(Debug, Default)]
    struct RecordingSolver {
        calls: Vec<&'static str>,
        variable_count: usize,
        least_squares: bool,
        guess: Vec<f64>,
        rows: Vec<Row>,
        offset: f64,
        fail_solve: bool,
    }

    impl LinearSolver for RecordingSolver {
        fn set_variable_count(&mut self, count: usize) -> Result<()> {
            self.calls.push("set_variable_count");
            self.variable_count = count;
            self.guess = vec![0.0; count];
            Ok(())
        }

        fn set_least_squares(&mut self, enabled: bool) -> Result<()> {
            self.calls.push("set_least_squares");
            self.least_squares = enabled;
            Ok(())
        }

        fn begin_system(&mut self) -> Result<()> {
            self.calls.push("begin_system");
            Ok(())
        }

        fn set_variable(&mut self, index: usize, value: f64) -> Result<()> {
            self.guess[index] = value;
            Ok(())
        }

        fn begin_matrix(&mut self) -> Result<()> {
            self.calls.push("begin_matrix");
            Ok(())
        }

        fn begin_row(&mut self) -> Result<()> {
            self.rows.push(Row {
                coefficients: Vec::new(),
                rhs: 0.0,
            });
            Ok(())
        }

        fn add_coefficient(&mut self, index: usize, value: f64) -> Result<()> {
            if let Some(row) = self.rows.last_mut() {
                row.coefficients.push((index, value));
            }
            Ok(())
        }

        fn set_right_hand_side(&mut self, value: f64) -> Result<()> {
            if let Some(row) = self.rows.last_mut() {
                row.rhs = value;
            }
            Ok(())
        }

        fn end_row(&mut self) -> Result<()> {
            Ok(())
        }

        fn end_matrix(&mut self) -> Result<()> {
            self.calls.push("end_matrix");
            Ok(())
        }

        fn end_system(&mut self) -> Result<()> {
            self.calls.push("end_system");
            Ok(())
        }

        fn solve(&mut self) -> Result<()> {
            self.calls.push("solve");
            if self.fail_solve {
                return Err(MeshError::ConvergenceFailed { iterations: 3 });
            }
            Ok(())
        }

        fn variable(&self, index: usize) -> f64 {
            self.guess[index] + self.offset
        }
    }

    fn two_triangles() -> (Vec<Point3<f64>>, HalfEdgeMesh) {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 2.0),
            Point3::new(0.5, 1.0, 4.0),
            Point3::new(0.5, -1.0, 6.0),
        ];
        let mesh = build_from_triangles(&vertices, &[[0, 1, 2], [1, 0, 3]]).unwrap();
        (vertices, mesh)
    }

    #[test]
    fn test_call_sequence() {
        let (positions, mesh) = two_triangles();
        let constraints = ConstraintSet::free(4);
        let mut solver = RecordingSolver::default();

        solve_axis(&mesh, &positions, &constraints, Axis::X, &SmoothOptions::default(), &mut solver)
            .unwrap();

        assert_eq!(
            solver.calls,
            vec![
                "set_variable_count",
                "set_least_squares",
                "begin_system",
                "begin_matrix",
                "end_matrix",
                "end_system",
                "solve",
            ]
        );
        assert_eq!(solver.variable_count, 4);
        assert!(solver.least_squares);
    }

    #[test]
    fn test_anchor_and_smoothness_rows() {
        let (positions, mesh) = two_triangles();
        let constraints = ConstraintSet::from_flags(vec![true, true, true, true]);
        let options = SmoothOptions::default().with_anchor_scale(10.0);
        let mut solver = RecordingSolver::default();

        solve_axis(&mesh, &positions, &constraints, Axis::Z, &options, &mut solver).unwrap();

        // Four anchors on z, then the shared edge: half-edge 0 (0 -> 1) has
        // opposite 3, so only half-edge 0 emits it.
        assert_eq!(
            solver.rows,
            vec![
                Row { coefficients: vec![(0, 10.0)], rhs: 0.0 },
                Row { coefficients: vec![(1, 10.0)], rhs: 20.0 },
                Row { coefficients: vec![(2, 10.0)], rhs: 40.0 },
                Row { coefficients: vec![(3, 10.0)], rhs: 60.0 },
                Row { coefficients: vec![(0, 1.0), (1, -1.0)], rhs: 0.0 },
            ]
        );
    }

    #[test]
    fn test_chain_rows_each_edge_once() {
        let table = HalfEdgeTable::chain(5);
        let positions = vec![Point3::origin(); 5];
        let constraints =
            ConstraintSet::pinned(5, [PinnedSample::new(0, 1.0), PinnedSample::new(4, 3.0)]).unwrap();
        let options = SmoothOptions::default().with_smoothness_weight(0.5);
        let mut solver = RecordingSolver::default();

        solve_axis(&table, &positions, &constraints, Axis::Y, &options, &mut solver).unwrap();

        assert_eq!(solver.rows.len(), 2 + 4);
        assert_eq!(solver.rows[0], Row { coefficients: vec![(0, 100.0)], rhs: 100.0 });
        assert_eq!(solver.rows[1], Row { coefficients: vec![(4, 100.0)], rhs: 300.0 });
        for (i, row) in solver.rows[2..].iter().enumerate() {
            assert_eq!(row.coefficients, vec![(i, 0.5), (i + 1, -0.5)]);
            assert_eq!(row.rhs, 0.0);
        }
    }

    #[test]
    fn test_boundary_halfedges_emit_no_rows() {
        // Two boundary half-edges and one interior pair, listed with the
        // higher index first.
        let table = HalfEdgeTable::new(
            3,
            vec![
                RawHalfEdge::new(0, 1, None),
                RawHalfEdge::new(2, 1, Some(2)),
                RawHalfEdge::new(1, 2, Some(1)),
                RawHalfEdge::new(2, 0, None),
            ],
        );
        let positions = vec![Point3::origin(); 3];
        let mut solver = RecordingSolver::default();

        solve_axis(
            &table,
            &positions,
            &ConstraintSet::free(3),
            Axis::X,
            &SmoothOptions::default(),
            &mut solver,
        )
        .unwrap();

        // Emitted from half-edge 1 (1 < 2), oriented 2 -> 1
        assert_eq!(solver.rows.len(), 1);
        assert_eq!(solver.rows[0].coefficients, vec![(2, 1.0), (1, -1.0)]);
    }

    #[test]
    fn test_initial_guess_and_result() {
        let (positions, mesh) = two_triangles();
        let mut solver = RecordingSolver {
            offset: 0.25,
            ..Default::default()
        };

        let values = solve_axis(
            &mesh,
            &positions,
            &ConstraintSet::free(4),
            Axis::Z,
            &SmoothOptions::default(),
            &mut solver,
        )
        .unwrap();

        assert_eq!(solver.guess, vec![0.0, 2.0, 4.0, 6.0]);
        assert_eq!(values, vec![0.25, 2.25, 4.25, 6.25]);
    }

    #[test]
    fn test_invalid_topology_before_any_call() {
        let table = HalfEdgeTable::new(
            2,
            vec![RawHalfEdge::new(0, 1, Some(1)), RawHalfEdge::new(1, 0, Some(2))],
        );
        let positions = vec![Point3::origin(); 2];
        let mut solver = RecordingSolver::default();

        let result = solve_axis(
            &table,
            &positions,
            &ConstraintSet::free(2),
            Axis::X,
            &SmoothOptions::default(),
            &mut solver,
        );

        assert!(matches!(result, Err(MeshError::InvalidTopology { halfedge: 1, .. })));
        assert!(solver.calls.is_empty());
        assert!(solver.rows.is_empty());
    }

    #[test]
    fn test_length_mismatch() {
        let table = HalfEdgeTable::chain(3);
        let mut solver = RecordingSolver::default();

        let result = solve_axis(
            &table,
            &[Point3::origin(); 2],
            &ConstraintSet::free(3),
            Axis::X,
            &SmoothOptions::default(),
            &mut solver,
        );
        assert!(matches!(result, Err(MeshError::InvalidParameter { name: "positions", .. })));
    }

    #[test]
    fn test_solver_failure_names_axis() {
        let table = HalfEdgeTable::chain(3);
        let mut solver = RecordingSolver {
            fail_solve: true,
            ..Default::default()
        };

        let result = solve_axis(
            &table,
            &[Point3::origin(); 3],
            &ConstraintSet::free(3),
            Axis::Y,
            &SmoothOptions::default(),
            &mut solver,
        );

        match result {
            Err(MeshError::SolverFailure { axis, source }) => {
                assert_eq!(axis, 'y');
                assert!(matches!(*source, MeshError::ConvergenceFailed { iterations: 3 }));
            }
            other => panic!("expected SolverFailure, got {:?}", other),
        }
    }
}
