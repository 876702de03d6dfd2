//! Indexed triangle mesh.
//!
//! [`Mesh`] is the connected 3D mesh the user edits: an ordered list of vertex
//! positions and triangle index triples. It is validated on construction and
//! only changes through [`Mesh::set_positions`].

use std::collections::HashMap;

use nalgebra::{Point3, Vector3};

use super::edge::{triangle_edges, MeshEdge};
use super::index::{FaceId, VertexId};
use crate::error::{DegenerateReason, EditorError, Result};

/// Faces with an area below this are rejected as degenerate.
pub const MIN_FACE_AREA: f64 = 1e-12;

/// A validated triangle mesh.
#[derive(Debug, Clone)]
pub struct Mesh {
    positions: Vec<Point3<f64>>,
    faces: Vec<[VertexId; 3]>,
}

impl Mesh {
    /// Build a mesh from vertex positions and triangle index triples.
    ///
    /// Fails with [`EditorError::DegenerateMesh`] if any face repeats a vertex,
    /// has zero area, or uses the same vertex set as an earlier face.
    ///
    /// # Example
    /// ```
    /// use seamstress::mesh::Mesh;
    /// use nalgebra::Point3;
    ///
    /// let vertices = vec![
    ///     Point3::new(0.0, 0.0, 0.0),
    ///     Point3::new(1.0, 0.0, 0.0),
    ///     Point3::new(0.5, 1.0, 0.0),
    /// ];
    /// let mesh = Mesh::from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
    /// assert_eq!(mesh.num_faces(), 1);
    /// ```
    pub fn from_triangles(vertices: &[Point3<f64>], faces: &[[usize; 3]]) -> Result<Self> {
        if faces.is_empty() {
            return Err(EditorError::EmptyMesh);
        }

        for (fi, face) in faces.iter().enumerate() {
            for &vi in face {
                if vi >= vertices.len() {
                    return Err(EditorError::InvalidVertexIndex { face: fi, vertex: vi });
                }
            }
        }

        let mesh = Self {
            positions: vertices.to_vec(),
            faces: faces
                .iter()
                .map(|f| [VertexId::new(f[0]), VertexId::new(f[1]), VertexId::new(f[2])])
                .collect(),
        };
        mesh.validate()?;
        Ok(mesh)
    }

    /// Check every face for repeated vertices, zero area and duplicates.
    pub fn validate(&self) -> Result<()> {
        let mut seen: HashMap<[VertexId; 3], usize> = HashMap::with_capacity(self.faces.len());

        for (fi, face) in self.faces.iter().enumerate() {
            if face[0] == face[1] || face[1] == face[2] || face[0] == face[2] {
                return Err(EditorError::DegenerateMesh {
                    face: fi,
                    reason: DegenerateReason::RepeatedVertex,
                });
            }

            if self.face_area(FaceId::new(fi)) < MIN_FACE_AREA {
                return Err(EditorError::DegenerateMesh {
                    face: fi,
                    reason: DegenerateReason::ZeroArea,
                });
            }

            let mut sorted = *face;
            sorted.sort();
            if let Some(&of) = seen.get(&sorted) {
                return Err(EditorError::DegenerateMesh {
                    face: fi,
                    reason: DegenerateReason::Duplicate { of },
                });
            }
            seen.insert(sorted, fi);
        }

        Ok(())
    }

    // ==================== Accessors ====================

    /// Get the number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.positions.len()
    }

    /// Get the number of faces.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Get the position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId) -> &Point3<f64> {
        &self.positions[v.index()]
    }

    /// All vertex positions.
    #[inline]
    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    /// Get the three vertices of a face.
    #[inline]
    pub fn face(&self, f: FaceId) -> [VertexId; 3] {
        self.faces[f.index()]
    }

    /// All faces.
    #[inline]
    pub fn faces(&self) -> &[[VertexId; 3]] {
        &self.faces
    }

    /// Iterate over all vertex IDs.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        (0..self.positions.len()).map(VertexId::new)
    }

    /// Iterate over all face IDs.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId> + '_ {
        (0..self.faces.len()).map(FaceId::new)
    }

    /// Iterate over each undirected edge once, in first-seen order.
    pub fn edges(&self) -> Vec<MeshEdge> {
        let mut seen = std::collections::HashSet::new();
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

    /// Replace all vertex positions, keeping the connectivity.
    ///
    /// The new positions must keep every face non-degenerate; on failure the
    /// old positions are restored.
    pub fn set_positions(&mut self, positions: Vec<Point3<f64>>) -> Result<()> {
        if positions.len() != self.positions.len() {
            return Err(EditorError::invalid_param(
                "positions",
                positions.len(),
                "must match the vertex count",
            ));
        }
        let old = std::mem::replace(&mut self.positions, positions);
        if let Err(e) = self.validate() {
            self.positions = old;
            return Err(e);
        }
        Ok(())
    }

    // ==================== Geometry ====================

    /// Get the positions of the three corners of a face.
    pub fn face_positions(&self, f: FaceId) -> [Point3<f64>; 3] {
        let [v0, v1, v2] = self.face(f);
        [*self.position(v0), *self.position(v1), *self.position(v2)]
    }

    /// Compute the area of a face.
    pub fn face_area(&self, f: FaceId) -> f64 {
        let [p0, p1, p2] = self.face_positions(f);
        0.5 * (p1 - p0).cross(&(p2 - p0)).norm()
    }

    /// Compute the unit normal of a face.
    pub fn face_normal(&self, f: FaceId) -> Vector3<f64> {
        let [p0, p1, p2] = self.face_positions(f);
        (p1 - p0).cross(&(p2 - p0)).normalize()
    }

    /// Compute the centroid of a face.
    pub fn face_centroid(&self, f: FaceId) -> Point3<f64> {
        let [p0, p1, p2] = self.face_positions(f);
        Point3::from((p0.coords + p1.coords + p2.coords) / 3.0)
    }

    /// Area-weighted vertex normals.
    pub fn vertex_normals(&self) -> Vec<Vector3<f64>> {
        let mut normals = vec![Vector3::zeros(); self.positions.len()];
        for (fi, face) in self.faces.iter().enumerate() {
            let [p0, p1, p2] = self.face_positions(FaceId::new(fi));
            let n = (p1 - p0).cross(&(p2 - p0));
            for v in face {
                normals[v.index()] += n;
            }
        }
        for n in &mut normals {
            let len = n.norm();
            if len > 0.0 {
                *n /= len;
            }
        }
        normals
    }

    /// Compute the bounding box of the mesh.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = self.positions.first()?;
        let mut min = *first;
        let mut max = *first;

        for p in &self.positions {
            for i in 0..3 {
                min[i] = min[i].min(p[i]);
                max[i] = max[i].max(p[i]);
            }
        }

        Some((min, max))
    }

    /// Length of the bounding box diagonal; pick tolerances scale with it.
    pub fn extent(&self) -> f64 {
        self.bounding_box()
            .map(|(min, max)| (max - min).norm())
            .unwrap_or(0.0)
    }
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

    #[test]
    fn test_single_triangle() {
        let (vertices, faces) = single_triangle();
        let mesh = Mesh::from_triangles(&vertices, &faces).unwrap();

        assert_eq!(mesh.num_vertices(), 3);
        assert_eq!(mesh.num_faces(), 1);
        assert_eq!(mesh.edges().len(), 3);
        assert!((mesh.face_area(FaceId::new(0)) - 0.5).abs() < 1e-12);
        assert!(mesh.face_normal(FaceId::new(0)).z > 0.99);
    }

    #[test]
    fn test_empty_mesh() {
        let result = Mesh::from_triangles(&[], &[]);
        assert!(matches!(result, Err(EditorError::EmptyMesh)));
    }

    #[test]
    fn test_invalid_vertex_index() {
        let vertices = vec![Point3::new(0.0, 0.0, 0.0)];
        let result = Mesh::from_triangles(&vertices, &[[0, 1, 2]]);
        assert!(matches!(
            result,
            Err(EditorError::InvalidVertexIndex { face: 0, vertex: 1 })
        ));
    }

    #[test]
    fn test_repeated_vertex() {
        let (vertices, _) = single_triangle();
        let result = Mesh::from_triangles(&vertices, &[[0, 0, 2]]);
        assert!(matches!(
            result,
            Err(EditorError::DegenerateMesh {
                face: 0,
                reason: DegenerateReason::RepeatedVertex
            })
        ));
    }

    #[test]
    fn test_zero_area() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        let result = Mesh::from_triangles(&vertices, &[[0, 1, 2]]);
        assert!(matches!(
            result,
            Err(EditorError::DegenerateMesh {
                reason: DegenerateReason::ZeroArea,
                ..
            })
        ));
    }

    #[test]
    fn test_duplicate_face_any_winding() {
        let (vertices, _) = single_triangle();
        let result = Mesh::from_triangles(&vertices, &[[0, 1, 2], [2, 1, 0]]);
        assert!(matches!(
            result,
            Err(EditorError::DegenerateMesh {
                face: 1,
                reason: DegenerateReason::Duplicate { of: 0 }
            })
        ));
    }

    #[test]
    fn test_set_positions_rolls_back() {
        let (vertices, faces) = single_triangle();
        let mut mesh = Mesh::from_triangles(&vertices, &faces).unwrap();

        let flat = vec![Point3::origin(); 3];
        assert!(mesh.set_positions(flat).is_err());
        assert_eq!(mesh.position(VertexId::new(2)), &Point3::new(0.5, 1.0, 0.0));

        let moved: Vec<_> = vertices.iter().map(|p| p * 2.0).collect();
        mesh.set_positions(moved).unwrap();
        assert_eq!(mesh.position(VertexId::new(1)), &Point3::new(2.0, 0.0, 0.0));
    }

    #[test]
    fn test_vertex_normals_are_unit() {
        let (vertices, faces) = single_triangle();
        let mesh = Mesh::from_triangles(&vertices, &faces).unwrap();
        for n in mesh.vertex_normals() {
            assert!((n.norm() - 1.0).abs() < 1e-12);
        }
    }
}
