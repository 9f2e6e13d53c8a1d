//! Anchor classification.
//!
//! A [`ConstraintSet`] decides which vertices receive an anchor row and what
//! value each anchor pulls toward. It comes either from topology (every
//! endpoint of a boundary half-edge is anchored to its current position) or
//! from an explicit list of [`PinnedSample`]s.

use nalgebra::Point3;

use super::Axis;
use crate::error::{MeshError, Result};
use crate::mesh::{validate_topology, HalfEdgeTopology};

/// A vertex anchored to an explicit target value.
///
/// The target is used on every axis being solved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinnedSample {
    /// Vertex index.
    pub vertex: usize,
    /// Target value.
    pub target: f64,
}

impl PinnedSample {
    /// Create a pinned sample.
    pub fn new(vertex: usize, target: f64) -> Self {
        Self { vertex, target }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Targets {
    /// Anchored vertices pull toward their current coordinate.
    Current,
    /// Anchors listed explicitly, in caller order.
    Pinned(Vec<PinnedSample>),
}

/// Per-vertex anchor flags plus the target of every anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintSet {
    anchored: Vec<bool>,
    targets: Targets,
}

impl ConstraintSet {
    /// No vertex anchored.
    pub fn free(num_vertices: usize) -> Self {
        Self::from_flags(vec![false; num_vertices])
    }

    /// Anchor the flagged vertices to their current coordinates.
    pub fn from_flags(anchored: Vec<bool>) -> Self {
        Self {
            anchored,
            targets: Targets::Current,
        }
    }

    /// Anchor explicitly listed vertices to explicit targets.
    ///
    /// A vertex listed more than once gets one anchor row per listing.
    ///
    /// # Errors
    /// [`MeshError::InvalidParameter`] for a vertex out of range or a
    /// non-finite target.
    pub fn pinned<S>(num_vertices: usize, samples: S) -> Result<Self>
    where
        S: IntoIterator<Item = PinnedSample>,
    {
        let samples: Vec<PinnedSample> = samples.into_iter().collect();
        let mut anchored = vec![false; num_vertices];

        for sample in &samples {
            if sample.vertex >= num_vertices {
                return Err(MeshError::invalid_param(
                    "pin",
                    sample.vertex,
                    "vertex index out of range",
                ));
            }
            if !sample.target.is_finite() {
                return Err(MeshError::invalid_param(
                    "pin",
                    sample.target,
                    "target must be finite",
                ));
            }
            anchored[sample.vertex] = true;
        }

        Ok(Self {
            anchored,
            targets: Targets::Pinned(samples),
        })
    }

    /// Number of vertices covered.
    #[inline]
    pub fn len(&self) -> usize {
        self.anchored.len()
    }

    /// Whether the set covers no vertices.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.anchored.is_empty()
    }

    /// Whether vertex `v` is anchored.
    #[inline]
    pub fn is_anchored(&self, v: usize) -> bool {
        self.anchored[v]
    }

    /// Per-vertex anchor flags.
    pub fn flags(&self) -> &[bool] {
        &self.anchored
    }

    /// Number of distinct anchored vertices.
    pub fn num_anchored(&self) -> usize {
        self.anchored.iter().filter(|&&a| a).count()
    }

    /// Whether targets were given explicitly.
    pub fn is_pinned(&self) -> bool {
        matches!(self.targets, Targets::Pinned(_))
    }

    /// The `(vertex, target)` pair of every anchor row on `axis`, in emission
    /// order: ascending vertex order for current-position anchors, caller
    /// order for pinned samples.
    pub fn anchor_targets(&self, positions: &[Point3<f64>], axis: Axis) -> Vec<(usize, f64)> {
        match &self.targets {
            Targets::Current => self
                .anchored
                .iter()
                .enumerate()
                .filter(|(_, &a)| a)
                .map(|(v, _)| (v, positions[v][axis.index()]))
                .collect(),
            Targets::Pinned(samples) => samples.iter().map(|s| (s.vertex, s.target)).collect(),
        }
    }
}

/// Anchor every endpoint of a half-edge without an opposite.
///
/// The result depends on topology only. A closed mesh yields no anchors.
///
/// # Errors
/// [`MeshError::InvalidTopology`] if any half-edge references are out of
/// range.
pub fn classify_boundary<T: HalfEdgeTopology + ?Sized>(topology: &T) -> Result<ConstraintSet> {
    validate_topology(topology)?;

    let mut anchored = vec![false; topology.num_vertices()];
    for h in 0..topology.num_halfedges() {
        if topology.he_opposite(h).is_none() {
            anchored[topology.he_origin(h)] = true;
            anchored[topology.he_dest(h)] = true;
        }
    }

    log::debug!(
        "classified {} of {} vertices as boundary",
        anchored.iter().filter(|&&a| a).count(),
        anchored.len()
    );

    Ok(ConstraintSet::from_flags(anchored))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{build_from_triangles, HalfEdgeMesh, HalfEdgeTable, RawHalfEdge};

    fn two_triangles() -> HalfEdgeMesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, -1.0, 0.0),
        ];
        build_from_triangles(&vertices, &[[0, 1, 2], [1, 0, 3]]).unwrap()
    }

    #[test]
    fn test_open_mesh_all_boundary() {
        let mesh = two_triangles();
        let constraints = classify_boundary(&mesh).unwrap();

        assert_eq!(constraints.len(), 4);
        assert_eq!(constraints.flags(), &[true, true, true, true]);
        assert!(!constraints.is_pinned());
    }

    #[test]
    fn test_closed_mesh_no_anchors() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];
        let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
        let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();

        let constraints = classify_boundary(&mesh).unwrap();
        assert_eq!(constraints.num_anchored(), 0);
        assert!(constraints.anchor_targets(&vertices, Axis::X).is_empty());
    }

    #[test]
    fn test_boundary_endpoints_only() {
        // Interior chain 0-1-2 plus a dangling boundary half-edge 2->3.
        // Vertex 4 is isolated.
        let table = HalfEdgeTable::new(
            5,
            vec![
                RawHalfEdge::new(0, 1, Some(1)),
                RawHalfEdge::new(1, 0, Some(0)),
                RawHalfEdge::new(1, 2, Some(3)),
                RawHalfEdge::new(2, 1, Some(2)),
                RawHalfEdge::new(2, 3, None),
            ],
        );

        let constraints = classify_boundary(&table).unwrap();
        assert_eq!(constraints.flags(), &[false, false, true, true, false]);
    }

    #[test]
    fn test_invalid_topology() {
        let table = HalfEdgeTable::new(2, vec![RawHalfEdge::new(0, 1, Some(4))]);
        assert!(matches!(
            classify_boundary(&table),
            Err(MeshError::InvalidTopology { halfedge: 0, .. })
        ));
    }

    #[test]
    fn test_current_targets_follow_axis() {
        let positions = vec![
            Point3::new(1.0, 2.0, 3.0),
            Point3::new(4.0, 5.0, 6.0),
            Point3::new(7.0, 8.0, 9.0),
        ];
        let constraints = ConstraintSet::from_flags(vec![true, false, true]);

        assert_eq!(constraints.anchor_targets(&positions, Axis::Y), vec![(0, 2.0), (2, 8.0)]);
        assert_eq!(constraints.anchor_targets(&positions, Axis::Z), vec![(0, 3.0), (2, 9.0)]);
    }

    #[test]
    fn test_pinned_targets_keep_order() {
        let positions = vec![Point3::origin(); 32];
        let constraints = ConstraintSet::pinned(
            32,
            [
                PinnedSample::new(18, 2.0),
                PinnedSample::new(0, 1.0),
                PinnedSample::new(31, 1.0),
            ],
        )
        .unwrap();

        assert!(constraints.is_pinned());
        assert_eq!(constraints.num_anchored(), 3);
        assert!(constraints.is_anchored(18));
        assert!(!constraints.is_anchored(17));
        assert_eq!(
            constraints.anchor_targets(&positions, Axis::X),
            vec![(18, 2.0), (0, 1.0), (31, 1.0)]
        );
    }

    #[test]
    fn test_pinned_rejects_bad_samples() {
        assert!(matches!(
            ConstraintSet::pinned(3, [PinnedSample::new(3, 0.0)]),
            Err(MeshError::InvalidParameter { name: "pin", .. })
        ));
        assert!(matches!(
            ConstraintSet::pinned(3, [PinnedSample::new(0, f64::NAN)]),
            Err(MeshError::InvalidParameter { name: "pin", .. })
        ));
    }
}
