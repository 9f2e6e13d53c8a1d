//! Read-only half-edge topology.
//!
//! The smoothing core never walks faces. It only needs, for every half-edge,
//! its two endpoints and its opposite half-edge. [`HalfEdgeTopology`] captures
//! exactly that, so the same code runs on a [`HalfEdgeMesh`] and on a bare
//! [`HalfEdgeTable`] such as a polyline.

use crate::error::{MeshError, Result};

use super::halfedge::HalfEdgeMesh;
use super::index::{HalfEdgeId, MeshIndex};

/// Dense half-edge connectivity with raw `usize` indices.
///
/// Half-edge indices are `0..num_halfedges()` and vertex indices are
/// `0..num_vertices()`. Implementations are not required to be well formed;
/// [`validate_topology`] checks every reference.
pub trait HalfEdgeTopology {
    /// Number of vertices.
    fn num_vertices(&self) -> usize;

    /// Number of half-edges.
    fn num_halfedges(&self) -> usize;

    /// Origin vertex of half-edge `h`.
    fn he_origin(&self, h: usize) -> usize;

    /// Destination vertex of half-edge `h`.
    fn he_dest(&self, h: usize) -> usize;

    /// Opposite half-edge of `h`, or `None` when `h` lies on the boundary.
    fn he_opposite(&self, h: usize) -> Option<usize>;
}

impl<I: MeshIndex> HalfEdgeTopology for HalfEdgeMesh<I> {
    fn num_vertices(&self) -> usize {
        HalfEdgeMesh::num_vertices(self)
    }

    fn num_halfedges(&self) -> usize {
        HalfEdgeMesh::num_halfedges(self)
    }

    fn he_origin(&self, h: usize) -> usize {
        self.origin(HalfEdgeId::new(h)).index()
    }

    fn he_dest(&self, h: usize) -> usize {
        self.dest(HalfEdgeId::new(h)).index()
    }

    fn he_opposite(&self, h: usize) -> Option<usize> {
        self.twin(HalfEdgeId::new(h)).valid().map(|t| t.index())
    }
}

/// Check that every half-edge references valid vertices and a valid opposite.
///
/// # Errors
/// [`MeshError::InvalidTopology`] naming the first offending half-edge.
pub fn validate_topology<T: HalfEdgeTopology + ?Sized>(topology: &T) -> Result<()> {
    let nv = topology.num_vertices();
    let nh = topology.num_halfedges();

    for h in 0..nh {
        let origin = topology.he_origin(h);
        if origin >= nv {
            return Err(MeshError::invalid_topology(
                h,
                format!("origin vertex {} out of range (vertex count {})", origin, nv),
            ));
        }
        let dest = topology.he_dest(h);
        if dest >= nv {
            return Err(MeshError::invalid_topology(
                h,
                format!("destination vertex {} out of range (vertex count {})", dest, nv),
            ));
        }
        if let Some(o) = topology.he_opposite(h) {
            if o >= nh {
                return Err(MeshError::invalid_topology(
                    h,
                    format!("opposite half-edge {} out of range (half-edge count {})", o, nh),
                ));
            }
        }
    }

    Ok(())
}

/// Unique neighbors of every vertex, sorted by index.
///
/// Both endpoints of every half-edge see each other, so boundary edges are
/// included from either side.
pub fn neighbor_lists<T: HalfEdgeTopology + ?Sized>(topology: &T) -> Vec<Vec<usize>> {
    let mut neighbors = vec![Vec::new(); topology.num_vertices()];
    for h in 0..topology.num_halfedges() {
        let (a, b) = (topology.he_origin(h), topology.he_dest(h));
        neighbors[a].push(b);
        neighbors[b].push(a);
    }
    for list in &mut neighbors {
        list.sort_unstable();
        list.dedup();
    }
    neighbors
}

/// One record of a [`HalfEdgeTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawHalfEdge {
    /// Origin vertex.
    pub origin: usize,
    /// Destination vertex.
    pub dest: usize,
    /// Opposite half-edge, `None` on the boundary.
    pub opposite: Option<usize>,
}

impl RawHalfEdge {
    /// Create a half-edge record.
    pub fn new(origin: usize, dest: usize, opposite: Option<usize>) -> Self {
        Self {
            origin,
            dest,
            opposite,
        }
    }
}

/// Topology given directly as a list of half-edge records.
///
/// Useful for inputs that are not face meshes, such as curves, and for
/// topology handed over from another program.
///
/// # Example
/// ```
/// use lsmooth::mesh::{HalfEdgeTable, HalfEdgeTopology};
///
/// let chain = HalfEdgeTable::chain(4);
/// assert_eq!(chain.num_vertices(), 4);
/// assert_eq!(chain.num_halfedges(), 6);
/// assert_eq!(chain.he_opposite(0), Some(1));
/// ```
#[derive(Debug, Clone, Default)]
pub struct HalfEdgeTable {
    num_vertices: usize,
    halfedges: Vec<RawHalfEdge>,
}

impl HalfEdgeTable {
    /// Create a table over `num_vertices` vertices. References are not
    /// checked here; see [`validate_topology`].
    pub fn new(num_vertices: usize, halfedges: Vec<RawHalfEdge>) -> Self {
        Self {
            num_vertices,
            halfedges,
        }
    }

    /// Create a table from `(origin, dest, opposite)` triples where the
    /// opposite uses `-1` as the boundary sentinel.
    ///
    /// # Errors
    /// [`MeshError::InvalidTopology`] for an opposite below `-1`.
    pub fn from_signed(num_vertices: usize, records: &[(usize, usize, i64)]) -> Result<Self> {
        let halfedges = records
            .iter()
            .enumerate()
            .map(|(h, &(origin, dest, opposite))| {
                let opposite = match opposite {
                    -1 => None,
                    o if o < -1 => {
                        return Err(MeshError::invalid_topology(
                            h,
                            format!("opposite half-edge {} is negative", o),
                        ))
                    }
                    o => Some(o as usize),
                };
                Ok(RawHalfEdge::new(origin, dest, opposite))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(num_vertices, halfedges))
    }

    /// An open chain `0 - 1 - ... - (n-1)`.
    ///
    /// Edge `i -> i+1` is half-edge `2i` and its opposite `i+1 -> i` is
    /// half-edge `2i + 1`, so every chain edge is interior.
    pub fn chain(num_vertices: usize) -> Self {
        let halfedges = (0..num_vertices.saturating_sub(1))
            .flat_map(|i| {
                [
                    RawHalfEdge::new(i, i + 1, Some(2 * i + 1)),
                    RawHalfEdge::new(i + 1, i, Some(2 * i)),
                ]
            })
            .collect();
        Self::new(num_vertices, halfedges)
    }

    /// Extract the topology of any [`HalfEdgeTopology`].
    pub fn from_topology<T: HalfEdgeTopology + ?Sized>(topology: &T) -> Self {
        let halfedges = (0..topology.num_halfedges())
            .map(|h| RawHalfEdge::new(topology.he_origin(h), topology.he_dest(h), topology.he_opposite(h)))
            .collect();
        Self::new(topology.num_vertices(), halfedges)
    }

    /// The half-edge records.
    pub fn halfedges(&self) -> &[RawHalfEdge] {
        &self.halfedges
    }
}

impl HalfEdgeTopology for HalfEdgeTable {
    fn num_vertices(&self) -> usize {
        self.num_vertices
    }

    fn num_halfedges(&self) -> usize {
        self.halfedges.len()
    }

    fn he_origin(&self, h: usize) -> usize {
        self.halfedges[h].origin
    }

    fn he_dest(&self, h: usize) -> usize {
        self.halfedges[h].dest
    }

    fn he_opposite(&self, h: usize) -> Option<usize> {
        self.halfedges[h].opposite
    }
}
