//! Per-soup-vertex UV positions.

use nalgebra::{Point2, Vector2};

use crate::mesh::{FaceId, SoupMesh, SoupVertexId};

/// UV position of every soup vertex.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UvLayout {
    positions: Vec<Point2<f64>>,
}

impl UvLayout {
    /// Create a layout from positions indexed by soup vertex.
    pub fn new(positions: Vec<Point2<f64>>) -> Self {
        Self { positions }
    }

    /// Project the soup onto the two axes along which its bounding box is
    /// largest, scaled so the longer side spans `[0, 1]`.
    pub fn planar_projection(soup: &SoupMesh) -> Self {
        let Some(first) = soup.vertices().first() else {
            return Self::default();
        };
        let mut min = first.position;
        let mut max = first.position;
        for sv in soup.vertices() {
            for i in 0..3 {
                min[i] = min[i].min(sv.position[i]);
                max[i] = max[i].max(sv.position[i]);
            }
        }

        let extent = max - min;
        let mut axes = [0usize, 1, 2];
        axes.sort_by(|&a, &b| extent[b].total_cmp(&extent[a]));
        let (u, v) = (axes[0], axes[1]);

        let mut scale = extent[u].max(extent[v]);
        if scale <= 0.0 {
            scale = 1.0;
        }

        let positions = soup
            .vertices()
            .iter()
            .map(|sv| {
                Point2::new(
                    (sv.position[u] - min[u]) / scale,
                    (sv.position[v] - min[v]) / scale,
                )
            })
            .collect();
        Self { positions }
    }

    /// Number of positions.
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Whether the layout is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// UV position of a soup vertex.
    #[inline]
    pub fn position(&self, s: SoupVertexId) -> Point2<f64> {
        self.positions[s.index()]
    }

    /// All positions.
    #[inline]
    pub fn positions(&self) -> &[Point2<f64>] {
        &self.positions
    }

    /// Mutable access to all positions.
    #[inline]
    pub fn positions_mut(&mut self) -> &mut [Point2<f64>] {
        &mut self.positions
    }

    /// Set the UV position of a soup vertex.
    #[inline]
    pub fn set_position(&mut self, s: SoupVertexId, p: Point2<f64>) {
        self.positions[s.index()] = p;
    }

    /// UV positions of a face's corners.
    pub fn face_positions(&self, soup: &SoupMesh, f: FaceId) -> [Point2<f64>; 3] {
        soup.face(f).map(|s| self.positions[s.index()])
    }

    /// Move every corner of the given faces by `offset`. Shared corners move
    /// once.
    pub fn translate_faces(
        &mut self,
        soup: &SoupMesh,
        faces: impl IntoIterator<Item = FaceId>,
        offset: Vector2<f64>,
    ) {
        let mut moved = vec![false; self.positions.len()];
        for f in faces {
            for s in soup.face(f) {
                if !moved[s.index()] {
                    moved[s.index()] = true;
                    self.positions[s.index()] += offset;
                }
            }
        }
    }

    /// Carry this layout over from `old` to `new`, two soups of the same
    /// mesh. Each new vertex takes the mean UV of the old corners it
    /// replaces.
    pub fn remap(&self, old: &SoupMesh, new: &SoupMesh) -> Self {
        let mut sum = vec![Vector2::zeros(); new.num_vertices()];
        let mut count = vec![0usize; new.num_vertices()];

        for f in new.face_ids() {
            let old_face = old.face(f);
            let new_face = new.face(f);
            for k in 0..3 {
                sum[new_face[k].index()] += self.positions[old_face[k].index()].coords;
                count[new_face[k].index()] += 1;
            }
        }

        let positions = new
            .vertex_ids()
            .map(|s| {
                if count[s.index()] > 0 {
                    Point2::from(sum[s.index()] / count[s.index()] as f64)
                } else {
                    let orig = new.soup_to_orig(s);
                    old.copies_of(orig)
                        .first()
                        .map(|&c| self.positions[c.index()])
                        .unwrap_or_else(Point2::origin)
                }
            })
            .collect();
        Self { positions }
    }

    /// Bounding box of the layout.
    pub fn bounding_box(&self) -> Option<(Point2<f64>, Point2<f64>)> {
        let first = self.positions.first()?;
        let mut min = *first;
        let mut max = *first;
        for p in &self.positions {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }
        Some((min, max))
    }
}
