//! Mesh algorithms used by the editor.
//!
//! - **Seam paths**: breadth-first shortest paths between two marked vertices
//! - **Picking**: ray/point vs triangle hit testing and nearest edge/vertex

pub mod pick;
mod seam_path;

pub use seam_path::{PathGraph, SeamPath, SeamPathFinder, SeamPathOptions};
