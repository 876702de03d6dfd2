//! Seam path finding between two marked vertices.
//!
//! The path is a shortest path in edge count over the mesh edge graph (or the
//! quad edge graph when one is attached), found with breadth-first search.
//! Ties are broken by adjacency order, so the result is deterministic for a
//! given mesh.

use std::collections::VecDeque;

use log::debug;

use crate::error::{EditorError, Result};
use crate::mesh::{AdjacencyIndex, MeshEdge, VertexId};

/// Which edge graph the search walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathGraph {
    /// Edges of the triangle mesh.
    #[default]
    Triangles,
    /// Edges of the attached quad mesh.
    Quads,
}

/// Options for seam path finding.
#[derive(Debug, Clone, Default)]
pub struct SeamPathOptions {
    /// Edge graph to search.
    pub graph: PathGraph,
}

impl SeamPathOptions {
    /// Set the edge graph.
    pub fn with_graph(mut self, graph: PathGraph) -> Self {
        self.graph = graph;
        self
    }
}

/// An ordered vertex path from the start to the end vertex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeamPath {
    vertices: Vec<VertexId>,
}

impl SeamPath {
    /// The vertices along the path, start first.
    pub fn vertices(&self) -> &[VertexId] {
        &self.vertices
    }

    /// The edges along the path.
    pub fn edges(&self) -> Vec<MeshEdge> {
        self.vertices
            .windows(2)
            .map(|w| MeshEdge::new(w[0], w[1]))
            .collect()
    }

    /// Number of edges on the path.
    pub fn len(&self) -> usize {
        self.vertices.len().saturating_sub(1)
    }

    /// Whether the path has no edges (start equals end).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// First vertex.
    pub fn start(&self) -> VertexId {
        self.vertices[0]
    }

    /// Last vertex.
    pub fn end(&self) -> VertexId {
        self.vertices[self.vertices.len() - 1]
    }
}

/// Breadth-first seam path search over an [`AdjacencyIndex`].
#[derive(Debug, Clone)]
pub struct SeamPathFinder<'a> {
    adjacency: &'a AdjacencyIndex,
    options: SeamPathOptions,
}

impl<'a> SeamPathFinder<'a> {
    /// Create a finder over the triangle edge graph.
    pub fn new(adjacency: &'a AdjacencyIndex) -> Self {
        Self {
            adjacency,
            options: SeamPathOptions::default(),
        }
    }

    /// Set the search options.
    pub fn with_options(mut self, options: SeamPathOptions) -> Self {
        self.options = options;
        self
    }

    fn neighbors(&self, v: VertexId) -> Result<&'a [VertexId]> {
        match self.options.graph {
            PathGraph::Triangles => Ok(self.adjacency.neighbors(v)),
            PathGraph::Quads => self.adjacency.quad_neighbors(v).ok_or_else(|| {
                EditorError::InvalidState("quad path requested without a quad mesh".into())
            }),
        }
    }

    /// Find a shortest path from `start` to `end`.
    ///
    /// Returns [`EditorError::NoPath`] if the vertices are in different
    /// connected components.
    ///
    /// # Example
    ///
    /// ```
    /// use seamstress::algo::SeamPathFinder;
    /// use seamstress::mesh::{AdjacencyIndex, Mesh, VertexId};
    /// use nalgebra::Point3;
    ///
    /// let vertices = vec![
    ///     Point3::new(0.0, 0.0, 0.0),
    ///     Point3::new(1.0, 0.0, 0.0),
    ///     Point3::new(1.0, 1.0, 0.0),
    ///     Point3::new(0.0, 1.0, 0.0),
    /// ];
    /// let mesh = Mesh::from_triangles(&vertices, &[[0, 1, 2], [0, 2, 3]]).unwrap();
    /// let adjacency = AdjacencyIndex::build(&mesh);
    ///
    /// let path = SeamPathFinder::new(&adjacency)
    ///     .find_path(VertexId::new(1), VertexId::new(3))
    ///     .unwrap();
    /// assert_eq!(path.len(), 2);
    /// ```
    pub fn find_path(&self, start: VertexId, end: VertexId) -> Result<SeamPath> {
        let n = self.adjacency.num_vertices();
        for v in [start, end] {
            if !v.is_valid() || v.index() >= n {
                return Err(EditorError::invalid_param(
                    "vertex",
                    v.index(),
                    "out of range for the mesh",
                ));
            }
        }

        if start == end {
            return Ok(SeamPath {
                vertices: vec![start],
            });
        }

        let mut predecessors: Vec<Option<VertexId>> = vec![None; n];
        let mut visited = vec![false; n];
        let mut queue = VecDeque::new();
        visited[start.index()] = true;
        queue.push_back(start);

        while let Some(u) = queue.pop_front() {
            for &w in self.neighbors(u)? {
                if visited[w.index()] {
                    continue;
                }
                visited[w.index()] = true;
                predecessors[w.index()] = Some(u);
                if w == end {
                    let path = Self::reconstruct(&predecessors, start, end);
                    debug!("seam path {:?} -> {:?}: {} edges", start, end, path.len());
                    return Ok(path);
                }
                queue.push_back(w);
            }
        }

        Err(EditorError::NoPath {
            from: start.index(),
            to: end.index(),
        })
    }

    fn reconstruct(predecessors: &[Option<VertexId>], start: VertexId, end: VertexId) -> SeamPath {
        let mut vertices = vec![end];
        let mut current = end;
        while current != start {
            match predecessors[current.index()] {
                Some(prev) => {
                    vertices.push(prev);
                    current = prev;
                }
                None => break,
            }
        }
        vertices.reverse();
        SeamPath { vertices }
    }
}
