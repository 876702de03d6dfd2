//! Auxiliary quad mesh.
//!
//! A quad mesh over the same vertex set as the triangle mesh can be attached
//! to a scene; its edges give a coarser graph for seam path finding.

use nalgebra::Point3;

use super::index::VertexId;
use crate::error::{DegenerateReason, EditorError, Result};

/// A quad mesh with counter-clockwise faces.
#[derive(Debug, Clone)]
pub struct QuadMesh {
    positions: Vec<Point3<f64>>,
    faces: Vec<[VertexId; 4]>,
}

impl QuadMesh {
    /// Build a quad mesh from vertices and quad index lists.
    pub fn from_quads(vertices: &[Point3<f64>], faces: &[[usize; 4]]) -> Result<Self> {
        if faces.is_empty() {
            return Err(EditorError::EmptyMesh);
        }

        for (fi, face) in faces.iter().enumerate() {
            for &vi in face {
                if vi >= vertices.len() {
                    return Err(EditorError::InvalidVertexIndex { face: fi, vertex: vi });
                }
            }
            if face[0] == face[1]
                || face[1] == face[2]
                || face[2] == face[3]
                || face[3] == face[0]
                || face[0] == face[2]
                || face[1] == face[3]
            {
                return Err(EditorError::DegenerateMesh {
                    face: fi,
                    reason: DegenerateReason::RepeatedVertex,
                });
            }
        }

        Ok(Self {
            positions: vertices.to_vec(),
            faces: faces
                .iter()
                .map(|f| f.map(VertexId::new))
                .collect(),
        })
    }

    /// Get the number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.positions.len()
    }

    /// Get the number of faces.
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// All vertex positions.
    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    /// All quad faces.
    pub fn faces(&self) -> &[[VertexId; 4]] {
        &self.faces
    }
}
