//! Split ("soup") representation of a mesh cut along seams.
//!
//! Every original vertex is split into one soup copy per seam-separated fan
//! of incident triangles. Soup faces correspond 1:1 to mesh faces, so a
//! [`FaceId`] addresses both. Each soup vertex carries a back-reference to its
//! original vertex, and each original vertex owns the list of its copies.
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeSet;
//! use seamstress::mesh::{build_soup, AdjacencyIndex, Mesh, MeshEdge, VertexId};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let mesh = Mesh::from_triangles(&vertices, &[[0, 1, 2], [0, 2, 3]]).unwrap();
//! let adjacency = AdjacencyIndex::build(&mesh);
//!
//! let seam: BTreeSet<_> = [MeshEdge::new(VertexId::new(0), VertexId::new(2))].into();
//! let soup = build_soup(&mesh, &adjacency, &seam).unwrap();
//! assert_eq!(soup.copies_of(VertexId::new(0)).len(), 2);
//! assert_eq!(soup.copies_of(VertexId::new(1)).len(), 1);
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};

use nalgebra::Point3;

use super::adjacency::AdjacencyIndex;
use super::edge::{triangle_edges, EdgeKey, MeshEdge, UvEdge};
use super::index::{FaceId, SoupVertexId, VertexId};
use super::trimesh::Mesh;
use crate::error::{EditorError, Result};

/// One copy of an original vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoupVertex {
    /// The original vertex this copy was split from.
    pub orig: VertexId,
    /// 3D position (same as the original vertex).
    pub position: Point3<f64>,
}

/// The mesh split along a seam.
#[derive(Debug, Clone)]
pub struct SoupMesh {
    vertices: Vec<SoupVertex>,
    /// Corner table: soup vertex at each corner of each face.
    faces: Vec<[SoupVertexId; 3]>,
    /// Original vertex at each corner of each face.
    orig_faces: Vec<[VertexId; 3]>,
    /// Original vertex -> its soup copies, in cluster order.
    copies: Vec<Vec<SoupVertexId>>,
    /// Vertices touched by at least one seam edge.
    split_map: BTreeMap<VertexId, Vec<SoupVertexId>>,
    seam: BTreeSet<MeshEdge>,
}

/// Disjoint-set over the incident faces of one vertex.
struct FanClusters {
    parent: Vec<usize>,
}

impl FanClusters {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    fn union(&mut self, a: usize, b: usize) {
        let ra = self.find(a);
        let rb = self.find(b);
        if ra != rb {
            // Keep the smaller root so clusters are ordered by their first face.
            let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[hi] = lo;
        }
    }
}

/// Split `mesh` along `seam` and build the soup mesh.
///
/// Vertices untouched by the seam keep exactly one copy. Soup ids are
/// assigned in original vertex order, so with an empty seam every soup id
/// equals its original vertex id.
///
/// Fails with [`EditorError::DegenerateMesh`] if the mesh has degenerate or
/// duplicate faces, and with [`EditorError::InvalidParameter`] if a seam edge
/// is not an edge of the mesh.
pub fn build_soup(
    mesh: &Mesh,
    adjacency: &AdjacencyIndex,
    seam: &BTreeSet<MeshEdge>,
) -> Result<SoupMesh> {
    mesh.validate()?;
    if adjacency.num_vertices() != mesh.num_vertices() {
        return Err(EditorError::invalid_param(
            "adjacency",
            adjacency.num_vertices(),
            "vertex count must match the mesh",
        ));
    }
    if let Some(edge) = seam.iter().find(|e| !adjacency.contains_edge(**e)) {
        return Err(EditorError::invalid_param(
            "seam",
            format!("{:?}", edge),
            "edge is not part of the mesh",
        ));
    }

    let orig_faces = mesh.faces().to_vec();
    let mut vertices = Vec::with_capacity(mesh.num_vertices());
    let mut faces = vec![[SoupVertexId::invalid(); 3]; mesh.num_faces()];
    let mut copies = Vec::with_capacity(mesh.num_vertices());
    let mut split_map = BTreeMap::new();

    for v in mesh.vertex_ids() {
        let fan = adjacency.faces_of_vertex(v);
        let mut own = Vec::new();

        if fan.is_empty() {
            own.push(SoupVertexId::new(vertices.len()));
            vertices.push(SoupVertex {
                orig: v,
                position: *mesh.position(v),
            });
            copies.push(own);
            continue;
        }

        let local: HashMap<FaceId, usize> =
            fan.iter().enumerate().map(|(i, &f)| (f, i)).collect();
        let mut clusters = FanClusters::new(fan.len());
        let mut touches_seam = false;

        for &w in adjacency.neighbors(v) {
            let edge = MeshEdge::new(v, w);
            if seam.contains(&edge) {
                touches_seam = true;
                continue;
            }
            let shared = adjacency.faces_of_edge(edge);
            for pair in shared.windows(2) {
                clusters.union(local[&pair[0]], local[&pair[1]]);
            }
        }

        let mut root_to_soup: HashMap<usize, SoupVertexId> = HashMap::new();
        for (i, &f) in fan.iter().enumerate() {
            let root = clusters.find(i);
            let id = *root_to_soup.entry(root).or_insert_with(|| {
                let id = SoupVertexId::new(vertices.len());
                vertices.push(SoupVertex {
                    orig: v,
                    position: *mesh.position(v),
                });
                own.push(id);
                id
            });
            let corner = orig_faces[f.index()]
                .iter()
                .position(|&c| c == v)
                .unwrap_or(0);
            faces[f.index()][corner] = id;
        }

        if touches_seam {
            split_map.insert(v, own.clone());
        }
        copies.push(own);
    }

    Ok(SoupMesh {
        vertices,
        faces,
        orig_faces,
        copies,
        split_map,
        seam: seam.clone(),
    })
}

impl SoupMesh {
    /// Number of soup vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Number of faces (same as the original mesh).
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Get a soup vertex.
    #[inline]
    pub fn vertex(&self, s: SoupVertexId) -> &SoupVertex {
        &self.vertices[s.index()]
    }

    /// All soup vertices.
    pub fn vertices(&self) -> &[SoupVertex] {
        &self.vertices
    }

    /// Soup vertices at the corners of a face.
    #[inline]
    pub fn face(&self, f: FaceId) -> [SoupVertexId; 3] {
        self.faces[f.index()]
    }

    /// All soup faces.
    pub fn faces(&self) -> &[[SoupVertexId; 3]] {
        &self.faces
    }

    /// Original vertices at the corners of a face.
    #[inline]
    pub fn orig_face(&self, f: FaceId) -> [VertexId; 3] {
        self.orig_faces[f.index()]
    }

    /// Iterate over all face IDs.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId> + '_ {
        (0..self.faces.len()).map(FaceId::new)
    }

    /// Iterate over all soup vertex IDs.
    pub fn vertex_ids(&self) -> impl Iterator<Item = SoupVertexId> + '_ {
        (0..self.vertices.len()).map(SoupVertexId::new)
    }

    /// The soup copy of `v` used by face `f`, or `None` if `f` does not
    /// contain `v`.
    #[inline]
    pub fn orig_to_soup(&self, v: VertexId, f: FaceId) -> Option<SoupVertexId> {
        let tri = self.orig_faces.get(f.index())?;
        let corner = tri.iter().position(|&c| c == v)?;
        Some(self.faces[f.index()][corner])
    }

    /// The original vertex a soup vertex was split from.
    #[inline]
    pub fn soup_to_orig(&self, s: SoupVertexId) -> VertexId {
        self.vertices[s.index()].orig
    }

    /// All soup copies of an original vertex.
    #[inline]
    pub fn copies_of(&self, v: VertexId) -> &[SoupVertexId] {
        &self.copies[v.index()]
    }

    /// Vertices touched by a seam edge, with their copies.
    pub fn split_map(&self) -> &BTreeMap<VertexId, Vec<SoupVertexId>> {
        &self.split_map
    }

    /// Whether `v` has more than one soup copy.
    pub fn is_split(&self, v: VertexId) -> bool {
        self.copies[v.index()].len() > 1
    }

    /// The seam this soup was built with.
    pub fn seam(&self) -> &BTreeSet<MeshEdge> {
        &self.seam
    }

    /// The UV edges a mesh edge maps to: one for an interior edge, two for an
    /// interior edge on the seam. Empty if the edge is not in the mesh.
    pub fn uv_edges_of(&self, edge: MeshEdge, adjacency: &AdjacencyIndex) -> Vec<UvEdge> {
        let mut out = Vec::with_capacity(2);
        for &f in adjacency.faces_of_edge(edge) {
            let (Some(a), Some(b)) = (
                self.orig_to_soup(edge.lo(), f),
                self.orig_to_soup(edge.hi(), f),
            ) else {
                continue;
            };
            let uv = UvEdge::new(a, b);
            if !out.contains(&uv) {
                out.push(uv);
            }
        }
        out
    }

    /// The mesh edge a UV edge came from.
    pub fn mesh_edge_of(&self, uv: UvEdge) -> MeshEdge {
        uv.map(|s| self.soup_to_orig(s))
    }

    /// All UV edges, each once, in first-seen order.
    pub fn uv_edges(&self) -> Vec<UvEdge> {
        let mut seen = BTreeSet::new();
        let mut edges = Vec::new();
        for face in &self.faces {
            for e in triangle_edges(*face) {
                if seen.insert(e) {
                    edges.push(e);
                }
            }
        }
        edges
    }

    /// Flatten to an indexed triangle mesh over the soup vertices.
    pub fn to_cut_mesh(&self) -> CutMesh {
        CutMesh {
            vertices: self.vertices.iter().map(|sv| sv.position).collect(),
            faces: self
                .faces
                .iter()
                .map(|f| [f[0].index(), f[1].index(), f[2].index()])
                .collect(),
        }
    }
}

/// The mesh after a seam has been applied: vertices on the seam are
/// duplicated, so the seam is a boundary.
#[derive(Debug, Clone)]
pub struct CutMesh {
    /// Vertex positions (one per soup vertex).
    pub vertices: Vec<Point3<f64>>,
    /// Triangle index triples into `vertices`.
    pub faces: Vec<[usize; 3]>,
}

impl CutMesh {
    /// Edges used by exactly one face.
    pub fn boundary_edges(&self) -> Vec<EdgeKey<usize>> {
        let mut count: BTreeMap<EdgeKey<usize>, usize> = BTreeMap::new();
        for &f in &self.faces {
            for edge in triangle_edges(f) {
                *count.entry(edge).or_insert(0) += 1;
            }
        }
        count
            .into_iter()
            .filter(|&(_, n)| n == 1)
            .map(|(e, _)| e)
            .collect()
    }
}
