//! # Seamstress
//!
//! The editing core of an interactive seam cutting and UV parametrization
//! tool.
//!
//! A triangle mesh is cut along user-chosen seams into a "soup" where every
//! side of a cut owns its own UV vertices, while the 3D mesh stays
//! watertight. A background solver relaxes the UV layout under pins, painted
//! face targets and seam separation weights, and the interactive thread
//! reads whatever layout it published last.
//!
//! ## Features
//!
//! - **Typed ids and canonical edges**: [`mesh::VertexId`], [`mesh::SoupVertexId`],
//!   [`mesh::FaceId`] and [`mesh::EdgeKey`]
//! - **Soup mapping**: O(1) vertex lookups between the mesh and the soup
//! - **Seam paths**: breadth-first cuts over the triangle or quad graph
//! - **Mirrored highlights**: one tracker owns the 3D and UV edge states
//! - **Interaction modes**: move, edge cutting, face positioning, painting,
//!   vertex pinning and box selection
//! - **Background solver**: an idempotent start/stop controller with
//!   message-passing handoff
//! - **File formats**: OBJ and STL
//!
//! ## Quick Start
//!
//! ```no_run
//! use seamstress::prelude::*;
//!
//! let mut editor = Editor::new();
//! editor.initialize().unwrap();
//! if editor.load("model.obj") {
//!     editor.set_mode(Mode::EdgeCutting).unwrap();
//!     editor.start_solver_thread().unwrap();
//!     editor.tick().unwrap();
//!     editor.stop_solver_thread().unwrap();
//! }
//! ```
//!
//! ## Cutting a Mesh
//!
//! ```
//! use std::collections::BTreeSet;
//! use seamstress::prelude::*;
//! use nalgebra::Point3;
//!
//! // Two quads sharing the edge (2, 3).
//! let vertices: Vec<_> = (0..6)
//!     .map(|i| Point3::new((i % 2) as f64, (i / 2) as f64, 0.0))
//!     .collect();
//! let faces = [[0, 1, 3], [0, 3, 2], [2, 3, 5], [2, 5, 4]];
//! let mesh = Mesh::from_triangles(&vertices, &faces).unwrap();
//! let adjacency = AdjacencyIndex::build(&mesh);
//!
//! let seam: BTreeSet<_> = [MeshEdge::new(VertexId::new(2), VertexId::new(3))].into();
//! let soup = build_soup(&mesh, &adjacency, &seam).unwrap();
//! assert_eq!(soup.num_vertices(), 8);
//! assert_eq!(soup.copies_of(VertexId::new(2)).len(), 2);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod editor;
pub mod error;
pub mod interaction;
pub mod io;
pub mod mesh;
pub mod scene;
pub mod seam;
pub mod settings;
pub mod snapshot;
pub mod solver;
pub mod view;

pub use nalgebra;

/// Prelude module for convenient imports.
///
/// ```
/// use seamstress::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::{SeamPath, SeamPathFinder};
    pub use crate::editor::{Editor, Frame};
    pub use crate::error::{EditorError, Result, SolverFailure};
    pub use crate::interaction::{
        InteractionModeMachine, Key, Mode, Modifiers, MouseButton, PainterMode, Panel, PointerPos,
    };
    pub use crate::mesh::{
        build_soup, AdjacencyIndex, CutMesh, EdgeKey, FaceId, Mesh, MeshEdge, SoupMesh,
        SoupVertexId, UvEdge, VertexId,
    };
    pub use crate::scene::Scene;
    pub use crate::seam::SeamHighlightTracker;
    pub use crate::settings::EditorSettings;
    pub use crate::solver::{SolverOptions, SolverThreadController, UvLayout};
}
