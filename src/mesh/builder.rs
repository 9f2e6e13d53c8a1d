//! Mesh construction utilities.
//!
//! Builds half-edge meshes from face-vertex lists as found in mesh files, and
//! converts them back.

use std::collections::HashMap;

use nalgebra::Point3;

use super::halfedge::{Face, HalfEdge, HalfEdgeMesh};
use super::index::{FaceId, HalfEdgeId, MeshIndex, VertexId};
use crate::error::{MeshError, Result};

/// Build a half-edge mesh from vertices and polygonal faces.
///
/// Each face lists its vertex indices in winding order and must have at least
/// three distinct vertices. Faces of different degrees may be mixed.
///
/// # Example
/// ```
/// use lsmooth::mesh::{build_from_polygons, HalfEdgeMesh};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(1.0, 1.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
///     Point3::new(2.0, 0.5, 0.0),
/// ];
/// let faces: Vec<Vec<usize>> = vec![vec![0, 1, 2, 3], vec![1, 4, 2]];
///
/// let mesh: HalfEdgeMesh = build_from_polygons(&vertices, &faces).unwrap();
/// assert_eq!(mesh.num_faces(), 2);
/// assert_eq!(mesh.num_halfedges(), 7);
/// ```
pub fn build_from_polygons<I, F>(vertices: &[Point3<f64>], faces: &[F]) -> Result<HalfEdgeMesh<I>>
where
    I: MeshIndex,
    F: AsRef<[usize]>,
{
    if faces.is_empty() {
        return Err(MeshError::EmptyMesh);
    }
    check_capacity::<I>("vertices", vertices.len())?;
    check_capacity::<I>("faces", faces.len())?;

    let mut num_halfedges = 0;
    for (fi, face) in faces.iter().enumerate() {
        let face = face.as_ref();
        if face.len() < 3 {
            return Err(MeshError::DegenerateFace { face: fi });
        }
        for (k, &vi) in face.iter().enumerate() {
            if vi >= vertices.len() {
                return Err(MeshError::InvalidVertexIndex { face: fi, vertex: vi });
            }
            if face[..k].contains(&vi) {
                return Err(MeshError::DegenerateFace { face: fi });
            }
        }
        num_halfedges += face.len();
    }
    check_capacity::<I>("halfedges", num_halfedges)?;

    let mut mesh = HalfEdgeMesh::with_capacity(vertices.len(), num_halfedges, faces.len());
    for &p in vertices {
        mesh.add_vertex(p);
    }

    // Directed edge (origin, dest) -> half-edge
    let mut edge_map: HashMap<(usize, usize), HalfEdgeId<I>> =
        HashMap::with_capacity(num_halfedges);

    // First pass: lay out each face loop on consecutive half-edges
    for face in faces {
        let face = face.as_ref();
        let first = mesh.halfedges.len();
        let degree = face.len();
        let face_id = FaceId::<I>::new(mesh.faces.len());
        mesh.faces.push(Face {
            halfedge: HalfEdgeId::new(first),
            degree,
        });

        for (k, &v) in face.iter().enumerate() {
            let id = HalfEdgeId::<I>::new(first + k);
            let w = face[(k + 1) % degree];

            mesh.halfedges.push(HalfEdge {
                origin: VertexId::new(v),
                twin: HalfEdgeId::invalid(),
                next: HalfEdgeId::new(first + (k + 1) % degree),
                prev: HalfEdgeId::new(first + (k + degree - 1) % degree),
                face: face_id,
            });
            mesh.vertices[v].halfedge = id;

            if edge_map.insert((v, w), id).is_some() {
                return Err(MeshError::NonManifoldEdge { v0: v, v1: w });
            }
        }
    }

    // Second pass: link twins; unmatched half-edges stay on the boundary
    for (&(v0, v1), &he) in &edge_map {
        if let Some(&twin) = edge_map.get(&(v1, v0)) {
            mesh.halfedges[he.index()].twin = twin;
        }
    }

    log::trace!(
        "built mesh: {} vertices, {} half-edges, {} faces",
        mesh.num_vertices(),
        mesh.num_halfedges(),
        mesh.num_faces()
    );

    Ok(mesh)
}

/// Every element index must be storable below the index type's sentinel.
fn check_capacity<I: MeshIndex>(name: &'static str, count: usize) -> Result<()> {
    if count > I::MAX.to_usize().saturating_add(1) {
        return Err(MeshError::invalid_param(
            name,
            count,
            "too many elements for the mesh index type",
        ));
    }
    Ok(())
}

/// Build a half-edge mesh from vertices and triangle faces.
///
/// # Example
/// ```
/// use lsmooth::mesh::{build_from_triangles, HalfEdgeMesh};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
/// ];
/// let faces = vec![[0, 1, 2]];
///
/// let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
/// assert_eq!(mesh.num_vertices(), 3);
/// assert_eq!(mesh.num_faces(), 1);
/// ```
pub fn build_from_triangles<I: MeshIndex>(
    vertices: &[Point3<f64>],
    faces: &[[usize; 3]],
) -> Result<HalfEdgeMesh<I>> {
    build_from_polygons(vertices, faces)
}

/// Build a half-edge mesh from vertices and quad faces.
pub fn build_from_quads<I: MeshIndex>(
    vertices: &[Point3<f64>],
    faces: &[[usize; 4]],
) -> Result<HalfEdgeMesh<I>> {
    build_from_polygons(vertices, faces)
}

/// Convert a half-edge mesh back to a face-vertex representation.
///
/// Returns `(vertices, faces)` with faces in their original winding order.
pub fn to_face_vertex<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> (Vec<Point3<f64>>, Vec<Vec<usize>>) {
    let faces = mesh
        .face_ids()
        .map(|f| mesh.face_vertices(f).map(|v| v.index()).collect())
        .collect();

    (mesh.positions(), faces)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_triangle() -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
        ];
        (vertices, vec![[0, 1, 2]])
    }

    fn two_triangles() -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
        // Two triangles sharing edge 0-1
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, -1.0, 0.0),
        ];
        (vertices, vec![[0, 1, 2], [1, 0, 3]])
    }

    #[test]
    fn test_single_triangle() {
        let (vertices, faces) = single_triangle();
        let mesh: HalfEdgeMesh<u32> = build_from_triangles(&vertices, &faces).unwrap();

        assert_eq!(mesh.num_vertices(), 3);
        assert_eq!(mesh.num_faces(), 1);
        // Only face half-edges are stored
        assert_eq!(mesh.num_halfedges(), 3);
        assert!(mesh.is_valid());

        for he in mesh.halfedge_ids() {
            assert!(mesh.is_boundary_halfedge(he));
        }
        for v in mesh.vertex_ids() {
            assert!(mesh.is_boundary_vertex(v));
        }
    }

    #[test]
    fn test_two_triangles_share_twins() {
        let (vertices, faces) = two_triangles();
        let mesh: HalfEdgeMesh<u32> = build_from_triangles(&vertices, &faces).unwrap();

        assert_eq!(mesh.num_halfedges(), 6);
        assert!(mesh.is_valid());

        // Half-edge 0 is 0->1 in face 0, half-edge 3 is 1->0 in face 1
        let he0 = HalfEdgeId::<u32>::new(0);
        assert_eq!(mesh.twin(he0), HalfEdgeId::new(3));
        assert_eq!(mesh.dest(he0), VertexId::new(1));

        let interior = mesh
            .halfedge_ids()
            .filter(|&he| !mesh.is_boundary_halfedge(he))
            .count();
        assert_eq!(interior, 2);
        assert!(!mesh.is_closed());
    }

    #[test]
    fn test_closed_tetrahedron() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];
        let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
        let mesh: HalfEdgeMesh<u32> = build_from_triangles(&vertices, &faces).unwrap();

        assert_eq!(mesh.num_halfedges(), 12);
        assert!(mesh.is_valid());
        assert!(mesh.is_closed());
        for v in mesh.vertex_ids() {
            assert!(!mesh.is_boundary_vertex(v), "{:?} should be interior", v);
        }
    }

    #[test]
    fn test_mixed_polygons_roundtrip() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(2.0, 0.5, 0.0),
        ];
        let faces: Vec<Vec<usize>> = vec![vec![0, 1, 2, 3], vec![1, 4, 2]];
        let mesh: HalfEdgeMesh<u32> = build_from_polygons(&vertices, &faces).unwrap();
        assert!(mesh.is_valid());
        assert!(!mesh.is_triangle_mesh());

        let (out_vertices, out_faces) = to_face_vertex(&mesh);
        assert_eq!(out_vertices, vertices);
        assert_eq!(out_faces, faces);
    }

    #[test]
    fn test_quads() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2, 3], [1, 4, 5, 2]];
        let mesh: HalfEdgeMesh<u32> = build_from_quads(&vertices, &faces).unwrap();

        assert_eq!(mesh.num_halfedges(), 8);
        assert_eq!(mesh.face_degree(FaceId::new(1)), 4);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_invalid_vertex_index() {
        let vertices = vec![Point3::new(0.0, 0.0, 0.0)];
        let result: Result<HalfEdgeMesh<u32>> = build_from_triangles(&vertices, &[[0, 1, 2]]);
        assert!(matches!(result, Err(MeshError::InvalidVertexIndex { face: 0, vertex: 1 })));
    }

    #[test]
    fn test_degenerate_faces() {
        let (vertices, _) = single_triangle();

        let repeated: Result<HalfEdgeMesh<u32>> = build_from_triangles(&vertices, &[[0, 0, 2]]);
        assert!(matches!(repeated, Err(MeshError::DegenerateFace { face: 0 })));

        let too_short: Result<HalfEdgeMesh<u32>> = build_from_polygons(&vertices, &[vec![0usize, 1]]);
        assert!(matches!(too_short, Err(MeshError::DegenerateFace { face: 0 })));
    }

    #[test]
    fn test_duplicate_directed_edge() {
        let (vertices, _) = two_triangles();
        // Both faces traverse 0->1
        let result: Result<HalfEdgeMesh<u32>> =
            build_from_triangles(&vertices, &[[0, 1, 2], [0, 1, 3]]);
        assert!(matches!(result, Err(MeshError::NonManifoldEdge { v0: 0, v1: 1 })));
    }

    #[test]
    fn test_index_type_capacity() {
        // Two polygons over the same ring, wound in opposite directions:
        // few enough vertices for u16 but 80,000 half-edges.
        let n = 40_000;
        let vertices: Vec<Point3<f64>> = (0..n)
            .map(|i| {
                let t = i as f64 / n as f64 * std::f64::consts::TAU;
                Point3::new(t.cos(), t.sin(), 0.0)
            })
            .collect();
        let front: Vec<usize> = (0..n).collect();
        let back: Vec<usize> = (0..n).rev().collect();
        let faces = vec![front, back];

        let narrow: Result<HalfEdgeMesh<u16>> = build_from_polygons(&vertices, &faces);
        assert!(matches!(
            narrow,
            Err(MeshError::InvalidParameter { name: "halfedges", .. })
        ));

        let wide: HalfEdgeMesh<u32> = build_from_polygons(&vertices, &faces).unwrap();
        assert_eq!(wide.num_halfedges(), 2 * n);
        assert!(wide.is_closed());
        assert_eq!(wide.origin(HalfEdgeId::new(n + 1)).index(), n - 2);
    }

    #[test]
    fn test_too_many_vertices_for_index_type() {
        let vertices = vec![Point3::origin(); 70_000];
        let faces = vec![[0, 1, 69_999]];
        let result: Result<HalfEdgeMesh<u16>> = build_from_triangles(&vertices, &faces);
        assert!(matches!(
            result,
            Err(MeshError::InvalidParameter { name: "vertices", .. })
        ));
    }

    #[test]
    fn test_empty_faces() {
        let (vertices, _) = single_triangle();
        let result: Result<HalfEdgeMesh<u32>> = build_from_triangles(&vertices, &[]);
        assert!(matches!(result, Err(MeshError::EmptyMesh)));
    }
}
