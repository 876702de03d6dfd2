//! Core mesh data structures.
//!
//! This module provides the connected 3D mesh, its adjacency index, and the
//! split ("soup") representation used for the UV domain.
//!
//! # Overview
//!
//! - [`Mesh`] is the validated triangle mesh the user edits.
//! - [`AdjacencyIndex`] holds vertex/face adjacency, built once per load.
//! - [`SoupMesh`] splits vertices along a seam so each side of a cut can
//!   take an independent UV position. [`build_soup`] constructs it.
//! - [`QuadMesh`] is an optional quad mesh over the same vertices.
//!
//! # Index Types
//!
//! Mesh elements are identified by type-safe index wrappers:
//! - [`VertexId`] - Identifies a vertex of the connected mesh
//! - [`SoupVertexId`] - Identifies a copy of a vertex in the soup mesh
//! - [`FaceId`] - Identifies a face (shared by mesh and soup)
//!
//! Edges are keyed by [`EdgeKey`], which canonicalizes its endpoints.
//!
//! # Construction
//!
//! ```
//! use seamstress::mesh::{AdjacencyIndex, Mesh};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let mesh = Mesh::from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
//! let adjacency = AdjacencyIndex::build(&mesh);
//! assert_eq!(adjacency.boundary_edge_count(), 3);
//! ```

mod adjacency;
mod edge;
mod index;
mod quad;
mod soup;
mod trimesh;

pub use adjacency::AdjacencyIndex;
pub use edge::{triangle_edges, EdgeKey, MeshEdge, UvEdge};
pub use index::{FaceId, SoupVertexId, VertexId};
pub use quad::QuadMesh;
pub use soup::{build_soup, CutMesh, SoupMesh, SoupVertex};
pub use trimesh::{Mesh, MIN_FACE_AREA};
