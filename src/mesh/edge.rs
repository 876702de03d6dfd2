//! Canonical undirected edges.
//!
//! Every map or set keyed by an edge uses [`EdgeKey`]. The only way to build
//! one is [`EdgeKey::new`], which orders the endpoints, so `(i, j)` and
//! `(j, i)` always produce the same key.

use std::fmt::{self, Debug};

use super::index::{SoupVertexId, VertexId};

/// An undirected edge stored as `(min, max)`.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct EdgeKey<V> {
    lo: V,
    hi: V,
}

/// An edge of the connected 3D mesh.
pub type MeshEdge = EdgeKey<VertexId>;

/// An edge of the soup mesh, i.e. an edge in the UV domain.
pub type UvEdge = EdgeKey<SoupVertexId>;

impl<V: Copy + Ord> EdgeKey<V> {
    /// Build the canonical key for the edge between `a` and `b`.
    #[inline]
    pub fn new(a: V, b: V) -> Self {
        if a <= b {
            Self { lo: a, hi: b }
        } else {
            Self { lo: b, hi: a }
        }
    }

    /// The smaller endpoint.
    #[inline]
    pub fn lo(&self) -> V {
        self.lo
    }

    /// The larger endpoint.
    #[inline]
    pub fn hi(&self) -> V {
        self.hi
    }

    /// Both endpoints, smaller first.
    #[inline]
    pub fn vertices(&self) -> [V; 2] {
        [self.lo, self.hi]
    }

    /// Whether `v` is an endpoint of this edge.
    #[inline]
    pub fn contains(&self, v: V) -> bool {
        self.lo == v || self.hi == v
    }

    /// The endpoint opposite to `v`, or `None` if `v` is not on the edge.
    pub fn opposite(&self, v: V) -> Option<V> {
        if self.lo == v {
            Some(self.hi)
        } else if self.hi == v {
            Some(self.lo)
        } else {
            None
        }
    }

    /// Map both endpoints and re-canonicalize.
    pub fn map<W: Copy + Ord>(&self, mut f: impl FnMut(V) -> W) -> EdgeKey<W> {
        EdgeKey::new(f(self.lo), f(self.hi))
    }
}

impl<V: Debug> Debug for EdgeKey<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E({:?}, {:?})", self.lo, self.hi)
    }
}

/// The three edges of a triangle, in corner order `(0,1) (1,2) (2,0)`.
pub fn triangle_edges<V: Copy + Ord>(tri: [V; 3]) -> [EdgeKey<V>; 3] {
    [
        EdgeKey::new(tri[0], tri[1]),
        EdgeKey::new(tri[1], tri[2]),
        EdgeKey::new(tri[2], tri[0]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_canonical_order() {
        let a = MeshEdge::new(VertexId::new(5), VertexId::new(2));
        let b = MeshEdge::new(VertexId::new(2), VertexId::new(5));
        assert_eq!(a, b);
        assert_eq!(a.lo(), VertexId::new(2));
        assert_eq!(a.hi(), VertexId::new(5));
    }

    #[test]
    fn test_set_dedupes_reversed_edges() {
        let mut set = BTreeSet::new();
        set.insert(UvEdge::new(SoupVertexId::new(1), SoupVertexId::new(0)));
        set.insert(UvEdge::new(SoupVertexId::new(0), SoupVertexId::new(1)));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_opposite() {
        let e = MeshEdge::new(VertexId::new(3), VertexId::new(8));
        assert_eq!(e.opposite(VertexId::new(3)), Some(VertexId::new(8)));
        assert_eq!(e.opposite(VertexId::new(8)), Some(VertexId::new(3)));
        assert_eq!(e.opposite(VertexId::new(4)), None);
    }

    #[test]
    fn test_map_recanonicalizes() {
        let e = MeshEdge::new(VertexId::new(1), VertexId::new(2));
        let mapped = e.map(|v| SoupVertexId::new(10 - v.index()));
        assert_eq!(mapped.lo(), SoupVertexId::new(8));
        assert_eq!(mapped.hi(), SoupVertexId::new(9));
    }

    #[test]
    fn test_triangle_edges() {
        let edges = triangle_edges([VertexId::new(2), VertexId::new(0), VertexId::new(1)]);
        assert_eq!(edges[0], MeshEdge::new(VertexId::new(0), VertexId::new(2)));
        assert_eq!(edges[1], MeshEdge::new(VertexId::new(0), VertexId::new(1)));
        assert_eq!(edges[2], MeshEdge::new(VertexId::new(1), VertexId::new(2)));
    }
}
