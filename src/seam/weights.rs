//! Separation-energy weights for seam edges.
//!
//! The solver pulls the two UV copies of a seam edge together unless the
//! edge has been fixed as a deliberate cut. Fixing an edge zeroes its weight
//! columns; un-fixing restores them.

use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use crate::mesh::{AdjacencyIndex, MeshEdge, SoupMesh, UvEdge};
use crate::solver::SeparationPair;

/// Receiver of weight-column updates triggered by fixing seam edges.
pub trait SeparationWeights {
    /// Zero the separation weights of `edge`, which maps to `uv_edges`.
    fn zero_columns(&mut self, edge: MeshEdge, uv_edges: &[UvEdge]);

    /// Restore the separation weights of `edge`.
    fn restore_columns(&mut self, edge: MeshEdge, uv_edges: &[UvEdge]);
}

/// Per-edge separation weight table.
#[derive(Debug, Clone, Default)]
pub struct SeparationWeightTable {
    zeroed: BTreeMap<MeshEdge, Vec<UvEdge>>,
}

impl SeparationWeights for SeparationWeightTable {
    fn zero_columns(&mut self, edge: MeshEdge, uv_edges: &[UvEdge]) {
        self.zeroed.insert(edge, uv_edges.to_vec());
    }

    fn restore_columns(&mut self, edge: MeshEdge, _uv_edges: &[UvEdge]) {
        self.zeroed.remove(&edge);
    }
}

impl SeparationWeightTable {
    /// Create a table with every weight at 1.
    pub fn new() -> Self {
        Self::default()
    }

    /// Relative weight of an edge: 0 when zeroed, 1 otherwise.
    pub fn weight(&self, edge: MeshEdge) -> f64 {
        if self.zeroed.contains_key(&edge) {
            0.0
        } else {
            1.0
        }
    }

    /// Whether the edge's columns are zeroed.
    pub fn is_zeroed(&self, edge: MeshEdge) -> bool {
        self.zeroed.contains_key(&edge)
    }

    /// All edges with zeroed columns.
    pub fn zeroed_edges(&self) -> BTreeSet<MeshEdge> {
        self.zeroed.keys().copied().collect()
    }

    /// The UV edges recorded when an edge was zeroed.
    pub fn zeroed_uv_edges(&self, edge: MeshEdge) -> Option<&[UvEdge]> {
        self.zeroed.get(&edge).map(|v| v.as_slice())
    }

    /// Restore every weight.
    pub fn clear(&mut self) {
        self.zeroed.clear();
    }

    /// Build the solver's separation pairs for the soup's seam.
    ///
    /// Every seam edge that maps to two UV edges contributes the pairs of
    /// copies of each endpoint, weighted by `lambda` times the edge weight.
    /// Pairs shared by adjacent seam edges are emitted once.
    pub fn separation_pairs(
        &self,
        soup: &SoupMesh,
        adjacency: &AdjacencyIndex,
        lambda: f64,
    ) -> Vec<SeparationPair> {
        let mut seen: BTreeSet<UvEdge> = BTreeSet::new();
        let mut pairs = Vec::new();

        for &edge in soup.seam() {
            let weight = lambda * self.weight(edge);
            if weight <= 0.0 {
                continue;
            }
            let uv = soup.uv_edges_of(edge, adjacency);
            let [first, second] = match uv.as_slice() {
                [a, b] => [*a, *b],
                _ => continue,
            };
            for first_copy in first.vertices() {
                let orig = soup.soup_to_orig(first_copy);
                let Some(second_copy) = second
                    .vertices()
                    .into_iter()
                    .find(|&s| soup.soup_to_orig(s) == orig)
                else {
                    continue;
                };
                if first_copy == second_copy {
                    continue;
                }
                let key = UvEdge::new(first_copy, second_copy);
                if seen.insert(key) {
                    pairs.push(SeparationPair {
                        a: key.lo(),
                        b: key.hi(),
                        weight,
                    });
                }
            }
        }

        debug!("{} separation pairs", pairs.len());
        pairs
    }
}
