//! Hit testing in the 3D and UV panels.
//!
//! A pointer event is resolved to a triangle first (ray cast in 3D, point
//! containment in UV), then to the nearest corner or edge of that triangle.
//! A miss is `None`, never an error.

use nalgebra::{Point2, Point3, Vector3};

use crate::mesh::{triangle_edges, FaceId, Mesh, MeshEdge, SoupMesh, SoupVertexId, UvEdge, VertexId};
use crate::solver::UvLayout;

const EPSILON: f64 = 1e-12;

/// A ray in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Ray origin.
    pub origin: Point3<f64>,
    /// Ray direction (not necessarily unit length).
    pub direction: Vector3<f64>,
}

impl Ray {
    /// Create a ray.
    pub fn new(origin: Point3<f64>, direction: Vector3<f64>) -> Self {
        Self { origin, direction }
    }

    /// Point at parameter `t`.
    pub fn at(&self, t: f64) -> Point3<f64> {
        self.origin + self.direction * t
    }
}

/// Ray/triangle intersection parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Ray parameter of the hit.
    pub t: f64,
    /// Barycentric weight of the second corner.
    pub u: f64,
    /// Barycentric weight of the third corner.
    pub v: f64,
}

/// A triangle under the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceHit {
    /// The hit face.
    pub face: FaceId,
    /// Barycentric coordinates of the hit point in corner order.
    pub barycentric: [f64; 3],
    /// Ray parameter for 3D hits, 0 for UV hits.
    pub t: f64,
}

/// Möller–Trumbore ray/triangle intersection. Hits behind the origin are
/// ignored; both windings are accepted.
pub fn ray_triangle(ray: &Ray, tri: &[Point3<f64>; 3]) -> Option<RayHit> {
    let edge1 = tri[1] - tri[0];
    let edge2 = tri[2] - tri[0];

    let h = ray.direction.cross(&edge2);
    let a = edge1.dot(&h);
    if a.abs() < EPSILON {
        return None;
    }

    let f = 1.0 / a;
    let s = ray.origin - tri[0];
    let u = f * s.dot(&h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(&edge1);
    let v = f * ray.direction.dot(&q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(&q);
    (t > EPSILON).then_some(RayHit { t, u, v })
}

/// Barycentric coordinates of `p` in a 2D triangle, or `None` if the
/// triangle is degenerate.
pub fn barycentric_2d(p: &Point2<f64>, tri: &[Point2<f64>; 3]) -> Option<[f64; 3]> {
    let v0 = tri[1] - tri[0];
    let v1 = tri[2] - tri[0];
    let v2 = p - tri[0];
    let det = v0.x * v1.y - v1.x * v0.y;
    if det.abs() < EPSILON {
        return None;
    }
    let b1 = (v2.x * v1.y - v1.x * v2.y) / det;
    let b2 = (v0.x * v2.y - v2.x * v0.y) / det;
    Some([1.0 - b1 - b2, b1, b2])
}

/// Whether `p` lies inside (or on the boundary of) a 2D triangle.
pub fn point_in_triangle_2d(p: &Point2<f64>, tri: &[Point2<f64>; 3]) -> bool {
    barycentric_2d(p, tri).is_some_and(|b| b.iter().all(|&w| w >= -1e-9))
}

fn segment_distance_3d(p: &Point3<f64>, a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    let ab = b - a;
    let len2 = ab.norm_squared();
    if len2 < EPSILON {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&ab) / len2).clamp(0.0, 1.0);
    (p - (a + ab * t)).norm()
}

fn segment_distance_2d(p: &Point2<f64>, a: &Point2<f64>, b: &Point2<f64>) -> f64 {
    let ab = b - a;
    let len2 = ab.norm_squared();
    if len2 < EPSILON {
        return (p - a).norm();
    }
    let t = ((p - a).dot(&ab) / len2).clamp(0.0, 1.0);
    (p - (a + ab * t)).norm()
}

/// Nearest face hit by a ray.
pub fn pick_face_3d(mesh: &Mesh, ray: &Ray) -> Option<FaceHit> {
    let mut best: Option<FaceHit> = None;
    for f in mesh.face_ids() {
        let Some(hit) = ray_triangle(ray, &mesh.face_positions(f)) else {
            continue;
        };
        if best.map_or(true, |b| hit.t < b.t) {
            best = Some(FaceHit {
                face: f,
                barycentric: [1.0 - hit.u - hit.v, hit.u, hit.v],
                t: hit.t,
            });
        }
    }
    best
}

/// First face of the UV layout containing `point`.
pub fn pick_face_uv(soup: &SoupMesh, layout: &UvLayout, point: &Point2<f64>) -> Option<FaceHit> {
    soup.face_ids().find_map(|f| {
        let tri = layout.face_positions(soup, f);
        let b = barycentric_2d(point, &tri)?;
        b.iter().all(|&w| w >= -1e-9).then_some(FaceHit {
            face: f,
            barycentric: b,
            t: 0.0,
        })
    })
}

/// Edge of the hit face nearest to `point`, if within `tolerance`.
pub fn nearest_edge_3d(
    mesh: &Mesh,
    face: FaceId,
    point: &Point3<f64>,
    tolerance: f64,
) -> Option<MeshEdge> {
    triangle_edges(mesh.face(face))
        .into_iter()
        .map(|e| {
            let d = segment_distance_3d(point, mesh.position(e.lo()), mesh.position(e.hi()));
            (e, d)
        })
        .filter(|&(_, d)| d <= tolerance)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(e, _)| e)
}

/// Corner of the hit face nearest to `point`, if within `tolerance`.
pub fn nearest_vertex_3d(
    mesh: &Mesh,
    face: FaceId,
    point: &Point3<f64>,
    tolerance: f64,
) -> Option<VertexId> {
    mesh.face(face)
        .into_iter()
        .map(|v| (v, (mesh.position(v) - point).norm()))
        .filter(|&(_, d)| d <= tolerance)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(v, _)| v)
}

/// UV edge of the hit face nearest to `point`, if within `tolerance`.
pub fn nearest_edge_uv(
    soup: &SoupMesh,
    layout: &UvLayout,
    face: FaceId,
    point: &Point2<f64>,
    tolerance: f64,
) -> Option<UvEdge> {
    triangle_edges(soup.face(face))
        .into_iter()
        .map(|e| {
            let d = segment_distance_2d(point, &layout.position(e.lo()), &layout.position(e.hi()));
            (e, d)
        })
        .filter(|&(_, d)| d <= tolerance)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(e, _)| e)
}

/// Soup corner of the hit face nearest to `point`, if within `tolerance`.
pub fn nearest_vertex_uv(
    soup: &SoupMesh,
    layout: &UvLayout,
    face: FaceId,
    point: &Point2<f64>,
    tolerance: f64,
) -> Option<SoupVertexId> {
    soup.face(face)
        .into_iter()
        .map(|s| (s, (layout.position(s) - point).norm()))
        .filter(|&(_, d)| d <= tolerance)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(s, _)| s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{build_soup, AdjacencyIndex};
    use std::collections::BTreeSet;

    fn unit_square() -> Mesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        Mesh::from_triangles(&vertices, &[[0, 1, 2], [0, 2, 3]]).unwrap()
    }

    #[test]
    fn test_ray_hits_triangle() {
        let tri = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let ray = Ray::new(Point3::new(0.25, 0.25, 1.0), Vector3::new(0.0, 0.0, -1.0));
        let hit = ray_triangle(&ray, &tri).unwrap();
        assert!((hit.t - 1.0).abs() < 1e-12);
        assert!((hit.u - 0.25).abs() < 1e-12);
        assert!((hit.v - 0.25).abs() < 1e-12);

        let behind = Ray::new(Point3::new(0.25, 0.25, 1.0), Vector3::new(0.0, 0.0, 1.0));
        assert!(ray_triangle(&behind, &tri).is_none());
        let outside = Ray::new(Point3::new(2.0, 2.0, 1.0), Vector3::new(0.0, 0.0, -1.0));
        assert!(ray_triangle(&outside, &tri).is_none());
    }

    #[test]
    fn test_pick_face_3d_takes_nearest() {
        let mesh = unit_square();
        let ray = Ray::new(Point3::new(0.8, 0.2, 5.0), Vector3::new(0.0, 0.0, -1.0));
        let hit = pick_face_3d(&mesh, &ray).unwrap();
        assert_eq!(hit.face, FaceId::new(0));

        let ray = Ray::new(Point3::new(0.2, 0.8, 5.0), Vector3::new(0.0, 0.0, -1.0));
        assert_eq!(pick_face_3d(&mesh, &ray).unwrap().face, FaceId::new(1));

        let miss = Ray::new(Point3::new(3.0, 3.0, 5.0), Vector3::new(0.0, 0.0, -1.0));
        assert!(pick_face_3d(&mesh, &miss).is_none());
    }

    #[test]
    fn test_nearest_edge_and_vertex_3d() {
        let mesh = unit_square();
        let near_bottom = Point3::new(0.5, 0.01, 0.0);
        assert_eq!(
            nearest_edge_3d(&mesh, FaceId::new(0), &near_bottom, 0.05),
            Some(MeshEdge::new(VertexId::new(0), VertexId::new(1)))
        );
        let center = Point3::new(0.6, 0.3, 0.0);
        assert_eq!(nearest_edge_3d(&mesh, FaceId::new(0), &center, 0.05), None);

        let near_corner = Point3::new(0.98, 0.01, 0.0);
        assert_eq!(
            nearest_vertex_3d(&mesh, FaceId::new(0), &near_corner, 0.05),
            Some(VertexId::new(1))
        );
        assert_eq!(nearest_vertex_3d(&mesh, FaceId::new(0), &center, 0.05), None);
    }

    #[test]
    fn test_point_in_triangle_2d() {
        let tri = [Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(0.0, 1.0)];
        assert!(point_in_triangle_2d(&Point2::new(0.2, 0.2), &tri));
        assert!(point_in_triangle_2d(&Point2::new(0.5, 0.0), &tri));
        assert!(!point_in_triangle_2d(&Point2::new(0.8, 0.8), &tri));

        let flat = [Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(2.0, 0.0)];
        assert!(!point_in_triangle_2d(&Point2::new(0.5, 0.0), &flat));
    }

    #[test]
    fn test_uv_picks() {
        let mesh = unit_square();
        let adj = AdjacencyIndex::build(&mesh);
        let soup = build_soup(&mesh, &adj, &BTreeSet::new()).unwrap();
        let layout = UvLayout::planar_projection(&soup);

        let hit = pick_face_uv(&soup, &layout, &Point2::new(0.9, 0.1)).unwrap();
        assert_eq!(hit.face, FaceId::new(0));
        assert!(pick_face_uv(&soup, &layout, &Point2::new(1.5, 0.5)).is_none());

        let edge = nearest_edge_uv(&soup, &layout, hit.face, &Point2::new(0.99, 0.5), 0.02);
        assert_eq!(
            edge,
            Some(UvEdge::new(SoupVertexId::new(1), SoupVertexId::new(2)))
        );
        let corner = nearest_vertex_uv(&soup, &layout, hit.face, &Point2::new(0.0, 0.01), 0.02);
        assert_eq!(corner, Some(SoupVertexId::new(0)));
    }
}
