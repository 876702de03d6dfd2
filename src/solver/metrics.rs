//! Per-face error measures drawn over a layout.
//!
//! Separation error is the widest gap between a face corner and its seam
//! partner. Distortion error compares each face's UV map with its flattened
//! rest shape: `(s1 - 1)^2 + (s2 - 1)^2` over the singular values of the
//! Jacobian, after the rest shapes are scaled to the layout's total area.
//! Overlap marks flipped faces and faces whose interiors intersect another
//! face they share no soup vertex with.

use nalgebra::{Matrix2, Point2, Point3, Vector2};

use super::relax::{flatten, rest_scale, signed_area_2x};
use super::{flipped_faces, SeparationPair, UvLayout};
use crate::mesh::{SoupMesh, SoupVertexId};

/// Interior overlap below this, per unit of axis length, counts as touching.
const OVERLAP_TOLERANCE: f64 = 1e-9;

/// Error measures of every face of a layout, indexed by face.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaceErrors {
    /// Widest gap between a corner and its seam partner, in UV units.
    pub separation: Vec<f64>,
    /// Distortion of the face against its rest shape.
    pub distortion: Vec<f64>,
    /// Whether the face is flipped or overlaps another face.
    pub overlapping: Vec<bool>,
}

impl FaceErrors {
    /// Measure `layout` over `soup`. Overlaps are only searched for when
    /// `detect_overlaps` is set; otherwise no face is marked.
    pub fn compute(
        soup: &SoupMesh,
        layout: &UvLayout,
        pairs: &[SeparationPair],
        detect_overlaps: bool,
    ) -> Self {
        let faces = soup.faces();
        if layout.len() != soup.num_vertices() {
            return Self {
                separation: vec![0.0; faces.len()],
                distortion: vec![0.0; faces.len()],
                overlapping: vec![false; faces.len()],
            };
        }
        let overlapping = if detect_overlaps {
            overlapping_faces(layout, faces)
        } else {
            vec![false; faces.len()]
        };
        Self {
            separation: separation_errors(layout, faces, pairs),
            distortion: distortion_errors(soup, layout),
            overlapping,
        }
    }

    /// Number of faces marked as overlapping.
    pub fn overlap_count(&self) -> usize {
        self.overlapping.iter().filter(|&&o| o).count()
    }
}

/// Widest seam gap at the corners of each face.
pub fn separation_errors(
    layout: &UvLayout,
    faces: &[[SoupVertexId; 3]],
    pairs: &[SeparationPair],
) -> Vec<f64> {
    let n = layout.len();
    let mut gap = vec![0.0f64; n];
    for pair in pairs {
        let (a, b) = (pair.a.index(), pair.b.index());
        if a >= n || b >= n {
            continue;
        }
        let d = (layout.position(pair.a) - layout.position(pair.b)).norm();
        gap[a] = gap[a].max(d);
        gap[b] = gap[b].max(d);
    }
    faces
        .iter()
        .map(|f| f.iter().map(|s| gap[s.index()]).fold(0.0, f64::max))
        .collect()
}

/// Distortion of each face against its flattened rest shape. Faces without
/// a usable rest shape report zero.
pub fn distortion_errors(soup: &SoupMesh, layout: &UvLayout) -> Vec<f64> {
    let faces = soup.faces();
    let rest: Vec<[Point3<f64>; 3]> = faces
        .iter()
        .map(|f| f.map(|s| soup.vertex(s).position))
        .collect();
    let scale = rest_scale(&rest, faces, layout);

    faces
        .iter()
        .zip(&rest)
        .map(|(face, r)| {
            let Some(flat) = flatten(r, scale) else {
                return 0.0;
            };
            let c = flat.corners;
            let q = Matrix2::from_columns(&[c[1] - c[0], c[2] - c[0]]);
            let Some(q_inv) = q.try_inverse() else {
                return 0.0;
            };
            let p = face.map(|s| layout.position(s));
            let uv = Matrix2::from_columns(&[p[1] - p[0], p[2] - p[0]]);
            let sigma = (uv * q_inv).svd(false, false).singular_values;
            (sigma[0] - 1.0).powi(2) + (sigma[1] - 1.0).powi(2)
        })
        .collect()
}

/// Faces that are flipped against the majority orientation or whose
/// interior intersects a face they share no vertex with.
pub fn overlapping_faces(layout: &UvLayout, faces: &[[SoupVertexId; 3]]) -> Vec<bool> {
    let mut marked = vec![false; faces.len()];
    for f in flipped_faces(layout, faces) {
        marked[f.index()] = true;
    }

    let triangles: Vec<[Point2<f64>; 3]> = faces
        .iter()
        .map(|f| f.map(|s| layout.position(s)))
        .collect();
    let bounds: Vec<(Point2<f64>, Point2<f64>)> = triangles.iter().map(bounds_of).collect();
    let mut order: Vec<usize> = (0..faces.len()).collect();
    order.sort_by(|&a, &b| bounds[a].0.x.total_cmp(&bounds[b].0.x));

    // Sweep along u; only faces whose u-ranges meet are compared.
    for (k, &i) in order.iter().enumerate() {
        let (min_i, max_i) = bounds[i];
        for &j in &order[k + 1..] {
            let (min_j, max_j) = bounds[j];
            if min_j.x >= max_i.x {
                break;
            }
            if min_j.y >= max_i.y || min_i.y >= max_j.y {
                continue;
            }
            if faces[i].iter().any(|s| faces[j].contains(s)) {
                continue;
            }
            if triangles_overlap(&triangles[i], &triangles[j]) {
                marked[i] = true;
                marked[j] = true;
            }
        }
    }
    marked
}

fn bounds_of(tri: &[Point2<f64>; 3]) -> (Point2<f64>, Point2<f64>) {
    let mut min = tri[0];
    let mut max = tri[0];
    for p in &tri[1..] {
        min = Point2::new(min.x.min(p.x), min.y.min(p.y));
        max = Point2::new(max.x.max(p.x), max.y.max(p.y));
    }
    (min, max)
}

/// Separating-axis test between two triangles. Shared edges and vertices
/// do not count as overlap.
fn triangles_overlap(a: &[Point2<f64>; 3], b: &[Point2<f64>; 3]) -> bool {
    if signed_area_2x(a) == 0.0 || signed_area_2x(b) == 0.0 {
        return false;
    }
    for tri in [a, b] {
        for k in 0..3 {
            let edge = tri[(k + 1) % 3] - tri[k];
            let axis = Vector2::new(-edge.y, edge.x);
            let slack = OVERLAP_TOLERANCE * axis.norm();
            let (a_min, a_max) = project(a, &axis);
            let (b_min, b_max) = project(b, &axis);
            if a_max <= b_min + slack || b_max <= a_min + slack {
                return false;
            }
        }
    }
    true
}

fn project(tri: &[Point2<f64>; 3], axis: &Vector2<f64>) -> (f64, f64) {
    tri.iter()
        .map(|p| p.coords.dot(axis))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), d| {
            (lo.min(d), hi.max(d))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{build_soup, AdjacencyIndex, FaceId, Mesh, MeshEdge, VertexId};
    use crate::seam::SeparationWeightTable;
    use std::collections::BTreeSet;

    /// Three stacked unit quads, two triangles each.
    fn ladder() -> Mesh {
        let vertices: Vec<_> = (0..8)
            .map(|i| Point3::new((i % 2) as f64, (i / 2) as f64, 0.0))
            .collect();
        let faces = [[0, 1, 3], [0, 3, 2], [2, 3, 5], [2, 5, 4], [4, 5, 7], [4, 7, 6]];
        Mesh::from_triangles(&vertices, &faces).unwrap()
    }

    fn cut_ladder() -> (SoupMesh, UvLayout, Vec<SeparationPair>) {
        let mesh = ladder();
        let adj = AdjacencyIndex::build(&mesh);
        let seam: BTreeSet<_> = [MeshEdge::new(VertexId::new(2), VertexId::new(3))].into();
        let soup = build_soup(&mesh, &adj, &seam).unwrap();
        let layout = UvLayout::planar_projection(&soup);
        let pairs = SeparationWeightTable::new().separation_pairs(&soup, &adj, 1.0);
        (soup, layout, pairs)
    }

    fn upper(soup: &SoupMesh) -> Vec<FaceId> {
        (2..soup.num_faces()).map(FaceId::new).collect()
    }

    #[test]
    fn test_closed_seam_has_no_separation_error() {
        let (soup, layout, pairs) = cut_ladder();
        let errors = FaceErrors::compute(&soup, &layout, &pairs, true);
        assert!(errors.separation.iter().all(|&e| e == 0.0));
        assert!(errors.distortion.iter().all(|&e| e < 1e-12));
        assert_eq!(errors.overlap_count(), 0);
    }

    #[test]
    fn test_open_seam_reports_gap_on_adjacent_faces() {
        let (soup, mut layout, pairs) = cut_ladder();
        layout.translate_faces(&soup, upper(&soup), Vector2::new(0.2, 0.0));

        let errors = separation_errors(&layout, soup.faces(), &pairs);
        for f in 0..4 {
            assert!((errors[f] - 0.2).abs() < 1e-12, "face {}", f);
        }
        assert_eq!(errors[4], 0.0);
        assert_eq!(errors[5], 0.0);
        // A rigid move does not distort.
        assert!(distortion_errors(&soup, &layout).iter().all(|&e| e < 1e-12));
    }

    #[test]
    fn test_stretch_is_distortion() {
        let (soup, mut layout, _) = cut_ladder();
        for p in layout.positions_mut() {
            p.x *= 2.0;
        }
        let errors = distortion_errors(&soup, &layout);
        // Area grows by two, so the stretch splits into sqrt(2) and 1/sqrt(2).
        let expected = (2f64.sqrt() - 1.0).powi(2) + (0.5f64.sqrt() - 1.0).powi(2);
        for e in errors {
            assert!((e - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_stacked_pieces_overlap() {
        let (soup, mut layout, pairs) = cut_ladder();
        // Drop the upper piece so its bottom row lands on the lower piece.
        let from = layout.position(soup.orig_to_soup(VertexId::new(2), FaceId::new(2)).unwrap());
        let to = layout.position(soup.orig_to_soup(VertexId::new(0), FaceId::new(0)).unwrap());
        layout.translate_faces(&soup, upper(&soup), to - from);

        let errors = FaceErrors::compute(&soup, &layout, &pairs, true);
        assert_eq!(errors.overlapping, vec![true, true, true, true, false, false]);
        assert_eq!(errors.overlap_count(), 4);

        let unchecked = FaceErrors::compute(&soup, &layout, &pairs, false);
        assert_eq!(unchecked.overlap_count(), 0);
    }

    #[test]
    fn test_flipped_face_is_marked() {
        let mesh = ladder();
        let adj = AdjacencyIndex::build(&mesh);
        let soup = build_soup(&mesh, &adj, &BTreeSet::new()).unwrap();
        let mut layout = UvLayout::planar_projection(&soup);
        let v6 = soup.copies_of(VertexId::new(6))[0];
        let p = layout.position(v6);
        // Mirror vertex 6 across the diagonal of the top quad.
        layout.set_position(v6, Point2::new(p.x + 1.0 / 3.0, p.y - 1.0 / 6.0));

        let overlapping = overlapping_faces(&layout, soup.faces());
        assert!(overlapping[5]);
        assert!(!overlapping[0]);
    }

    #[test]
    fn test_touching_triangles_do_not_overlap() {
        let a = [Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(0.0, 1.0)];
        let b = [Point2::new(1.0, 0.0), Point2::new(1.0, 1.0), Point2::new(0.0, 1.0)];
        assert!(!triangles_overlap(&a, &b));
        let c = [Point2::new(0.2, 0.2), Point2::new(2.0, 0.2), Point2::new(0.2, 2.0)];
        assert!(triangles_overlap(&a, &c));
    }
}
