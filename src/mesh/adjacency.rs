//! Precomputed adjacency for the 3D mesh and the auxiliary quad mesh.
//!
//! [`AdjacencyIndex`] is built once per mesh load and is read-only afterwards.
//! Neighbor lists keep first-discovery order (faces in index order, corners in
//! winding order), which is what makes seam path tie-breaking deterministic.

use std::collections::HashMap;

use super::edge::{triangle_edges, MeshEdge};
use super::index::{FaceId, VertexId};
use super::quad::QuadMesh;
use super::trimesh::Mesh;
use crate::error::{EditorError, Result};

/// Vertex/face adjacency lookups.
#[derive(Debug, Clone)]
pub struct AdjacencyIndex {
    /// Vertex -> adjacent vertices over triangle edges.
    vertex_neighbors: Vec<Vec<VertexId>>,
    /// Vertex -> incident faces.
    vertex_faces: Vec<Vec<FaceId>>,
    /// Edge -> incident faces (canonical edge key).
    edge_faces: HashMap<MeshEdge, Vec<FaceId>>,
    /// Vertex -> adjacent vertices over quad edges, if a quad mesh is attached.
    quad_neighbors: Option<Vec<Vec<VertexId>>>,
}

fn push_unique(list: &mut Vec<VertexId>, v: VertexId) {
    if !list.contains(&v) {
        list.push(v);
    }
}

impl AdjacencyIndex {
    /// Build adjacency for a triangle mesh.
    pub fn build(mesh: &Mesh) -> Self {
        let n = mesh.num_vertices();
        let mut vertex_neighbors = vec![Vec::new(); n];
        let mut vertex_faces = vec![Vec::new(); n];
        let mut edge_faces: HashMap<MeshEdge, Vec<FaceId>> = HashMap::new();

        for f in mesh.face_ids() {
            let tri = mesh.face(f);
            for k in 0..3 {
                let v = tri[k];
                vertex_faces[v.index()].push(f);
                push_unique(&mut vertex_neighbors[v.index()], tri[(k + 1) % 3]);
                push_unique(&mut vertex_neighbors[v.index()], tri[(k + 2) % 3]);
            }
            for e in triangle_edges(tri) {
                edge_faces.entry(e).or_default().push(f);
            }
        }

        Self {
            vertex_neighbors,
            vertex_faces,
            edge_faces,
            quad_neighbors: None,
        }
    }

    /// Attach quad adjacency. The quad mesh must share the vertex set.
    pub fn with_quads(mut self, quads: &QuadMesh) -> Result<Self> {
        if quads.num_vertices() != self.vertex_neighbors.len() {
            return Err(EditorError::invalid_param(
                "quad_mesh",
                quads.num_vertices(),
                "vertex count must match the triangle mesh",
            ));
        }

        let mut neighbors = vec![Vec::new(); quads.num_vertices()];
        for quad in quads.faces() {
            for k in 0..4 {
                let v = quad[k];
                push_unique(&mut neighbors[v.index()], quad[(k + 1) % 4]);
                push_unique(&mut neighbors[v.index()], quad[(k + 3) % 4]);
            }
        }
        self.quad_neighbors = Some(neighbors);
        Ok(self)
    }

    /// Number of vertices covered by the index.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertex_neighbors.len()
    }

    /// Vertices sharing a triangle edge with `v`.
    #[inline]
    pub fn neighbors(&self, v: VertexId) -> &[VertexId] {
        &self.vertex_neighbors[v.index()]
    }

    /// Vertices sharing a quad edge with `v`, if a quad mesh is attached.
    pub fn quad_neighbors(&self, v: VertexId) -> Option<&[VertexId]> {
        self.quad_neighbors
            .as_ref()
            .map(|lists| lists[v.index()].as_slice())
    }

    /// Whether a quad mesh is attached.
    pub fn has_quads(&self) -> bool {
        self.quad_neighbors.is_some()
    }

    /// Faces incident to `v`, in face index order.
    #[inline]
    pub fn faces_of_vertex(&self, v: VertexId) -> &[FaceId] {
        &self.vertex_faces[v.index()]
    }

    /// Faces incident to an edge; empty if the edge is not in the mesh.
    pub fn faces_of_edge(&self, edge: MeshEdge) -> &[FaceId] {
        self.edge_faces
            .get(&edge)
            .map(|faces| faces.as_slice())
            .unwrap_or(&[])
    }

    /// Whether the edge exists in the mesh.
    pub fn contains_edge(&self, edge: MeshEdge) -> bool {
        self.edge_faces.contains_key(&edge)
    }

    /// Whether the edge has exactly one incident face.
    pub fn is_boundary_edge(&self, edge: MeshEdge) -> bool {
        self.faces_of_edge(edge).len() == 1
    }

    /// Count boundary edges.
    pub fn boundary_edge_count(&self) -> usize {
        self.edge_faces.values().filter(|faces| faces.len() == 1).count()
    }

    /// Label every vertex with the index of its connected component.
    ///
    /// Components are numbered in order of their smallest vertex.
    pub fn connected_components(&self) -> (usize, Vec<usize>) {
        let n = self.num_vertices();
        let mut label = vec![usize::MAX; n];
        let mut count = 0;
        let mut stack = Vec::new();

        for start in 0..n {
            if label[start] != usize::MAX {
                continue;
            }
            label[start] = count;
            stack.push(start);
            while let Some(u) = stack.pop() {
                for w in &self.vertex_neighbors[u] {
                    if label[w.index()] == usize::MAX {
                        label[w.index()] = count;
                        stack.push(w.index());
                    }
                }
            }
            count += 1;
        }

        (count, label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn two_triangles() -> Mesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, -1.0, 0.0),
        ];
        Mesh::from_triangles(&vertices, &[[0, 1, 2], [1, 0, 3]]).unwrap()
    }

    #[test]
    fn test_neighbors_in_discovery_order() {
        let adj = AdjacencyIndex::build(&two_triangles());
        assert_eq!(
            adj.neighbors(VertexId::new(0)),
            &[VertexId::new(1), VertexId::new(2), VertexId::new(3)]
        );
        assert_eq!(adj.faces_of_vertex(VertexId::new(2)), &[FaceId::new(0)]);
    }

    #[test]
    fn test_edge_faces() {
        let adj = AdjacencyIndex::build(&two_triangles());
        let shared = MeshEdge::new(VertexId::new(1), VertexId::new(0));
        assert_eq!(adj.faces_of_edge(shared), &[FaceId::new(0), FaceId::new(1)]);
        assert!(!adj.is_boundary_edge(shared));
        assert!(adj.is_boundary_edge(MeshEdge::new(VertexId::new(0), VertexId::new(2))));
        assert_eq!(adj.boundary_edge_count(), 4);
        assert!(adj
            .faces_of_edge(MeshEdge::new(VertexId::new(2), VertexId::new(3)))
            .is_empty());
    }

    #[test]
    fn test_components() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(5.0, 0.0, 0.0),
            Point3::new(6.0, 0.0, 0.0),
            Point3::new(5.0, 1.0, 0.0),
        ];
        let mesh = Mesh::from_triangles(&vertices, &[[0, 1, 2], [3, 4, 5]]).unwrap();
        let (count, label) = AdjacencyIndex::build(&mesh).connected_components();
        assert_eq!(count, 2);
        assert_eq!(label, vec![0, 0, 0, 1, 1, 1]);
    }

    #[test]
    fn test_quad_neighbors() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mesh = Mesh::from_triangles(&vertices, &[[0, 1, 2], [0, 2, 3]]).unwrap();
        let quads = QuadMesh::from_quads(&vertices, &[[0, 1, 2, 3]]).unwrap();
        let adj = AdjacencyIndex::build(&mesh).with_quads(&quads).unwrap();

        // The triangle diagonal 0-2 is not a quad edge.
        assert!(adj.neighbors(VertexId::new(0)).contains(&VertexId::new(2)));
        let quad = adj.quad_neighbors(VertexId::new(0)).unwrap();
        assert_eq!(quad, &[VertexId::new(1), VertexId::new(3)]);
    }

    #[test]
    fn test_quads_must_share_vertices() {
        let adj = AdjacencyIndex::build(&two_triangles());
        let vertices = vec![Point3::origin(); 5];
        let quads = QuadMesh::from_quads(&vertices, &[[0, 1, 2, 3]]).unwrap();
        assert!(adj.with_quads(&quads).is_err());
    }
}
