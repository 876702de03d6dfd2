//! Hovered and fixed seam edges, mirrored between the 3D and UV domains.
//!
//! Each mesh edge that has been interacted with has one [`SeamEdgeState`]
//! holding its flags and the 1 or 2 UV edges it maps to. The UV-side index
//! points back at the owning mesh edge, and both are only ever changed
//! together, so a fixed mesh edge and its UV mirrors cannot disagree.
//!
//! Colours are not stored; [`highlight_color`] derives them from state.

use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use super::weights::SeparationWeights;
use crate::mesh::{AdjacencyIndex, MeshEdge, SoupMesh, UvEdge};

/// An RGB colour with components in `[0, 1]`.
pub type Rgb = [f32; 3];

/// Highlight state of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgeHighlight {
    /// Not highlighted.
    #[default]
    Cleared,
    /// Under the pointer.
    Hovered,
    /// Confirmed as a seam.
    Fixed,
}

/// Colours used for edge and face highlights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HighlightPalette {
    /// Hovered edge.
    pub hover: Rgb,
    /// Fixed edge.
    pub fixed: Rgb,
    /// Fixed edge whose two UV mirrors merged after a rebuild.
    pub merge: Rgb,
    /// Face pinned in place.
    pub pinned_face: Rgb,
    /// Face being moved.
    pub active_face: Rgb,
    /// Face with no constraint.
    pub face: Rgb,
    /// Tint of a face at the separation color clamp.
    pub separation_error: Rgb,
    /// Tint of a face at the distortion color clamp.
    pub distortion_error: Rgb,
    /// Flipped or overlapping face.
    pub overlap: Rgb,
}

impl Default for HighlightPalette {
    fn default() -> Self {
        Self {
            hover: [0.0, 0.8, 1.0],
            fixed: [1.0, 0.0, 0.0],
            merge: [1.0, 0.55, 0.0],
            pinned_face: [0.25, 0.45, 1.0],
            active_face: [0.3, 0.85, 0.3],
            face: [1.0, 1.0, 1.0],
            separation_error: [0.9, 0.1, 0.6],
            distortion_error: [1.0, 0.8, 0.0],
            overlap: [0.15, 0.15, 0.15],
        }
    }
}

/// Linear blend from `from` towards `to`; `t` is clamped to `[0, 1]`.
pub fn mix_color(from: Rgb, to: Rgb, t: f64) -> Rgb {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) as f32 };
    [0, 1, 2].map(|i| from[i] + (to[i] - from[i]) * t)
}

/// Colour of an edge in a given state; `None` when it is not drawn.
pub fn highlight_color(
    highlight: EdgeHighlight,
    merged: bool,
    palette: &HighlightPalette,
) -> Option<Rgb> {
    match highlight {
        EdgeHighlight::Cleared => None,
        EdgeHighlight::Hovered => Some(palette.hover),
        EdgeHighlight::Fixed if merged => Some(palette.merge),
        EdgeHighlight::Fixed => Some(palette.fixed),
    }
}

/// Tracked state of one mesh edge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeamEdgeState {
    /// The edge is under the pointer.
    pub hovered: bool,
    /// The edge is a confirmed seam.
    pub fixed: bool,
    /// The edge lost a UV mirror in the last rebuild.
    pub merged: bool,
    /// The UV edges this edge maps to (1 or 2).
    pub uv_edges: Vec<UvEdge>,
}

impl SeamEdgeState {
    /// The highlight this state draws as.
    pub fn highlight(&self) -> EdgeHighlight {
        if self.fixed {
            EdgeHighlight::Fixed
        } else if self.hovered {
            EdgeHighlight::Hovered
        } else {
            EdgeHighlight::Cleared
        }
    }
}

/// Hover/fix bookkeeping for seam edges.
#[derive(Debug, Clone, Default)]
pub struct SeamHighlightTracker {
    edges: BTreeMap<MeshEdge, SeamEdgeState>,
    uv_index: BTreeMap<UvEdge, MeshEdge>,
    hovered: Option<MeshEdge>,
}

impl SeamHighlightTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    fn index_uv(&mut self, edge: MeshEdge) {
        if let Some(state) = self.edges.get(&edge) {
            for &uv in &state.uv_edges {
                self.uv_index.insert(uv, edge);
            }
        }
    }

    fn drop_if_cleared(&mut self, edge: MeshEdge) {
        let cleared = self
            .edges
            .get(&edge)
            .is_some_and(|s| s.highlight() == EdgeHighlight::Cleared);
        if cleared {
            if let Some(state) = self.edges.remove(&edge) {
                for uv in state.uv_edges {
                    self.uv_index.remove(&uv);
                }
            }
        }
    }

    /// Mark `edge` as hovered, clearing the previous hover. Returns whether
    /// anything changed.
    pub fn hover(&mut self, edge: MeshEdge, uv_edges: Vec<UvEdge>) -> bool {
        if self.hovered == Some(edge) {
            return false;
        }
        self.clear_hover();

        let state = self.edges.entry(edge).or_default();
        state.hovered = true;
        if !state.fixed {
            state.uv_edges = uv_edges;
        }
        self.index_uv(edge);
        self.hovered = Some(edge);
        true
    }

    /// Hover the mesh edge behind a UV edge.
    pub fn hover_uv(&mut self, uv: UvEdge, soup: &SoupMesh, adjacency: &AdjacencyIndex) -> bool {
        let edge = soup.mesh_edge_of(uv);
        self.hover(edge, soup.uv_edges_of(edge, adjacency))
    }

    /// Clear the current hover, if any. Returns whether anything changed.
    pub fn clear_hover(&mut self) -> bool {
        let Some(edge) = self.hovered.take() else {
            return false;
        };
        if let Some(state) = self.edges.get_mut(&edge) {
            state.hovered = false;
        }
        self.drop_if_cleared(edge);
        true
    }

    /// The hovered edge.
    pub fn hovered(&self) -> Option<MeshEdge> {
        self.hovered
    }

    /// Fix `edge` and all of its UV mirrors, zeroing its separation weights.
    /// Returns whether the edge was newly fixed.
    pub fn fix(
        &mut self,
        edge: MeshEdge,
        uv_edges: Vec<UvEdge>,
        weights: &mut dyn SeparationWeights,
    ) -> bool {
        let state = self.edges.entry(edge).or_default();
        if state.fixed {
            return false;
        }
        let stale = std::mem::replace(&mut state.uv_edges, uv_edges);
        state.fixed = true;
        state.merged = false;
        weights.zero_columns(edge, &state.uv_edges);
        for uv in stale {
            if self.uv_index.get(&uv) == Some(&edge) {
                self.uv_index.remove(&uv);
            }
        }
        self.index_uv(edge);
        true
    }

    /// Fix the mesh edge behind a UV edge.
    pub fn fix_uv(
        &mut self,
        uv: UvEdge,
        soup: &SoupMesh,
        adjacency: &AdjacencyIndex,
        weights: &mut dyn SeparationWeights,
    ) -> bool {
        let edge = soup.mesh_edge_of(uv);
        self.fix(edge, soup.uv_edges_of(edge, adjacency), weights)
    }

    /// Un-fix `edge` and all of its UV mirrors, restoring its separation
    /// weights. Returns whether the edge was fixed.
    pub fn unfix(&mut self, edge: MeshEdge, weights: &mut dyn SeparationWeights) -> bool {
        let Some(state) = self.edges.get_mut(&edge) else {
            return false;
        };
        if !state.fixed {
            return false;
        }
        state.fixed = false;
        state.merged = false;
        weights.restore_columns(edge, &state.uv_edges);
        self.drop_if_cleared(edge);
        true
    }

    /// Toggle the fixed state of `edge`. Returns the new fixed state.
    pub fn toggle_fixed(
        &mut self,
        edge: MeshEdge,
        uv_edges: Vec<UvEdge>,
        weights: &mut dyn SeparationWeights,
    ) -> bool {
        if self.is_fixed(edge) {
            self.unfix(edge, weights);
            false
        } else {
            self.fix(edge, uv_edges, weights);
            true
        }
    }

    /// Whether `edge` is fixed.
    pub fn is_fixed(&self, edge: MeshEdge) -> bool {
        self.edges.get(&edge).is_some_and(|s| s.fixed)
    }

    /// Highlight of a mesh edge.
    pub fn state(&self, edge: MeshEdge) -> EdgeHighlight {
        self.edges
            .get(&edge)
            .map(SeamEdgeState::highlight)
            .unwrap_or_default()
    }

    /// Highlight of a UV edge, mirrored from its mesh edge.
    pub fn uv_state(&self, uv: UvEdge) -> EdgeHighlight {
        self.uv_index
            .get(&uv)
            .map(|edge| self.state(*edge))
            .unwrap_or_default()
    }

    /// Full tracked state of an edge.
    pub fn edge_state(&self, edge: MeshEdge) -> Option<&SeamEdgeState> {
        self.edges.get(&edge)
    }

    /// Iterate over every tracked edge.
    pub fn iter(&self) -> impl Iterator<Item = (MeshEdge, &SeamEdgeState)> + '_ {
        self.edges.iter().map(|(e, s)| (*e, s))
    }

    /// UV edges recorded for a mesh edge.
    pub fn uv_edges_of(&self, edge: MeshEdge) -> &[UvEdge] {
        self.edges
            .get(&edge)
            .map(|s| s.uv_edges.as_slice())
            .unwrap_or(&[])
    }

    /// All fixed mesh edges.
    pub fn fixed_edges(&self) -> BTreeSet<MeshEdge> {
        self.edges
            .iter()
            .filter(|(_, s)| s.fixed)
            .map(|(e, _)| *e)
            .collect()
    }

    /// All fixed UV edges, read from the UV-side index.
    pub fn fixed_uv_edges(&self) -> BTreeSet<UvEdge> {
        self.uv_index
            .iter()
            .filter(|(_, edge)| self.is_fixed(**edge))
            .map(|(uv, _)| *uv)
            .collect()
    }

    /// Recompute UV mirrors after the soup was rebuilt.
    ///
    /// Fixed edges move their zeroed weight columns to the new mirrors. An
    /// edge that lost a mirror is flagged merged, and one that regained it
    /// is un-flagged.
    pub fn remap(
        &mut self,
        soup: &SoupMesh,
        adjacency: &AdjacencyIndex,
        weights: &mut dyn SeparationWeights,
    ) {
        self.uv_index.clear();
        let mut merged = 0;
        for (&edge, state) in self.edges.iter_mut() {
            let new_uv = soup.uv_edges_of(edge, adjacency);
            if state.fixed {
                weights.restore_columns(edge, &state.uv_edges);
                weights.zero_columns(edge, &new_uv);
                if new_uv.len() < state.uv_edges.len() {
                    state.merged = true;
                } else if new_uv.len() > state.uv_edges.len() {
                    state.merged = false;
                }
                if state.merged {
                    merged += 1;
                }
            }
            state.uv_edges = new_uv;
        }
        let keys: Vec<MeshEdge> = self.edges.keys().copied().collect();
        for edge in keys {
            self.index_uv(edge);
        }
        debug!("remapped {} seam edges ({} merged)", self.edges.len(), merged);
    }

    /// Whether the mesh-side and UV-side fixed sets mirror each other.
    pub fn domains_agree(&self) -> bool {
        let from_mesh: BTreeSet<UvEdge> = self
            .edges
            .values()
            .filter(|s| s.fixed)
            .flat_map(|s| s.uv_edges.iter().copied())
            .collect();
        if from_mesh != self.fixed_uv_edges() {
            return false;
        }
        self.uv_index.iter().all(|(uv, edge)| {
            self.edges
                .get(edge)
                .is_some_and(|s| s.uv_edges.contains(uv))
        })
    }

    /// Un-fix everything and forget all state.
    pub fn clear(&mut self, weights: &mut dyn SeparationWeights) {
        for (edge, state) in &self.edges {
            if state.fixed {
                weights.restore_columns(*edge, &state.uv_edges);
            }
        }
        self.edges.clear();
        self.uv_index.clear();
        self.hovered = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{build_soup, Mesh, SoupVertexId, VertexId};
    use crate::seam::SeparationWeightTable;
    use nalgebra::Point3;
    use proptest::prelude::*;

    fn ladder() -> Mesh {
        let vertices: Vec<_> = (0..8)
            .map(|i| Point3::new((i % 2) as f64, (i / 2) as f64, 0.0))
            .collect();
        let faces = [
            [0, 1, 3],
            [0, 3, 2],
            [2, 3, 5],
            [2, 5, 4],
            [4, 5, 7],
            [4, 7, 6],
        ];
        Mesh::from_triangles(&vertices, &faces).unwrap()
    }

    fn edge(a: usize, b: usize) -> MeshEdge {
        MeshEdge::new(VertexId::new(a), VertexId::new(b))
    }

    #[test]
    fn test_mix_color_clamps() {
        let (white, red) = ([1.0, 1.0, 1.0], [1.0, 0.0, 0.0]);
        assert_eq!(mix_color(white, red, 0.0), white);
        assert_eq!(mix_color(white, red, 0.5), [1.0, 0.5, 0.5]);
        assert_eq!(mix_color(white, red, 4.0), red);
        assert_eq!(mix_color(white, red, f64::NAN), white);
    }

    #[test]
    fn test_hover_moves() {
        let mut tracker = SeamHighlightTracker::new();
        let uv = |a, b| UvEdge::new(SoupVertexId::new(a), SoupVertexId::new(b));

        assert!(tracker.hover(edge(0, 1), vec![uv(0, 1)]));
        assert!(!tracker.hover(edge(0, 1), vec![uv(0, 1)]));
        assert_eq!(tracker.state(edge(0, 1)), EdgeHighlight::Hovered);
        assert_eq!(tracker.uv_state(uv(0, 1)), EdgeHighlight::Hovered);

        tracker.hover(edge(1, 3), vec![uv(1, 3)]);
        assert_eq!(tracker.state(edge(0, 1)), EdgeHighlight::Cleared);
        assert_eq!(tracker.uv_state(uv(0, 1)), EdgeHighlight::Cleared);
        assert!(tracker.edge_state(edge(0, 1)).is_none());

        assert!(tracker.clear_hover());
        assert!(!tracker.clear_hover());
        assert_eq!(tracker.iter().count(), 0);
    }

    #[test]
    fn test_fix_mirrors_to_both_uv_edges() {
        let mesh = ladder();
        let adj = AdjacencyIndex::build(&mesh);
        let seam = [edge(2, 3)].into_iter().collect();
        let soup = build_soup(&mesh, &adj, &seam).unwrap();
        let mut weights = SeparationWeightTable::new();
        let mut tracker = SeamHighlightTracker::new();

        let uv = soup.uv_edges_of(edge(2, 3), &adj);
        assert_eq!(uv.len(), 2);
        assert!(tracker.fix(edge(2, 3), uv.clone(), &mut weights));
        for e in &uv {
            assert_eq!(tracker.uv_state(*e), EdgeHighlight::Fixed);
        }
        assert!(weights.is_zeroed(edge(2, 3)));
        assert!(tracker.domains_agree());

        assert!(tracker.unfix(edge(2, 3), &mut weights));
        for e in &uv {
            assert_eq!(tracker.uv_state(*e), EdgeHighlight::Cleared);
        }
        assert!(!weights.is_zeroed(edge(2, 3)));
        assert!(tracker.fixed_uv_edges().is_empty());
    }

    #[test]
    fn test_fix_from_uv_side() {
        let mesh = ladder();
        let adj = AdjacencyIndex::build(&mesh);
        let seam = [edge(2, 3)].into_iter().collect();
        let soup = build_soup(&mesh, &adj, &seam).unwrap();
        let mut weights = SeparationWeightTable::new();
        let mut tracker = SeamHighlightTracker::new();

        let uv = soup.uv_edges_of(edge(2, 3), &adj);
        tracker.fix_uv(uv[1], &soup, &adj, &mut weights);
        assert!(tracker.is_fixed(edge(2, 3)));
        assert_eq!(tracker.uv_state(uv[0]), EdgeHighlight::Fixed);
    }

    #[test]
    fn test_toggle_twice_is_identity() {
        let mut weights = SeparationWeightTable::new();
        let mut tracker = SeamHighlightTracker::new();
        let uv = vec![UvEdge::new(SoupVertexId::new(0), SoupVertexId::new(1))];

        assert!(tracker.toggle_fixed(edge(0, 1), uv.clone(), &mut weights));
        assert!(!tracker.toggle_fixed(edge(0, 1), uv, &mut weights));
        assert_eq!(tracker.state(edge(0, 1)), EdgeHighlight::Cleared);
        assert!(weights.zeroed_edges().is_empty());
        assert_eq!(tracker.iter().count(), 0);
    }

    #[test]
    fn test_hovered_fixed_edge_stays_fixed() {
        let mut weights = SeparationWeightTable::new();
        let mut tracker = SeamHighlightTracker::new();
        let uv = vec![UvEdge::new(SoupVertexId::new(0), SoupVertexId::new(1))];

        tracker.hover(edge(0, 1), uv.clone());
        tracker.fix(edge(0, 1), uv, &mut weights);
        tracker.clear_hover();
        assert_eq!(tracker.state(edge(0, 1)), EdgeHighlight::Fixed);
    }

    #[test]
    fn test_merge_flag_after_rebuild() {
        let mesh = ladder();
        let adj = AdjacencyIndex::build(&mesh);
        let cut = build_soup(&mesh, &adj, &[edge(2, 3)].into_iter().collect()).unwrap();
        let uncut = build_soup(&mesh, &adj, &BTreeSet::new()).unwrap();
        let mut weights = SeparationWeightTable::new();
        let mut tracker = SeamHighlightTracker::new();

        tracker.fix(edge(2, 3), cut.uv_edges_of(edge(2, 3), &adj), &mut weights);
        tracker.remap(&uncut, &adj, &mut weights);
        let state = tracker.edge_state(edge(2, 3)).unwrap();
        assert!(state.merged);
        assert_eq!(state.uv_edges.len(), 1);
        assert_eq!(weights.zeroed_uv_edges(edge(2, 3)).map(|e| e.len()), Some(1));

        // Rebuilding with the same topology keeps the flag.
        tracker.remap(&uncut, &adj, &mut weights);
        assert!(tracker.edge_state(edge(2, 3)).unwrap().merged);

        tracker.remap(&cut, &adj, &mut weights);
        assert!(!tracker.edge_state(edge(2, 3)).unwrap().merged);
        assert!(tracker.domains_agree());
    }

    #[test]
    fn test_colors_follow_state() {
        let palette = HighlightPalette::default();
        assert_eq!(highlight_color(EdgeHighlight::Cleared, false, &palette), None);
        assert_eq!(
            highlight_color(EdgeHighlight::Hovered, false, &palette),
            Some(palette.hover)
        );
        assert_eq!(
            highlight_color(EdgeHighlight::Fixed, false, &palette),
            Some(palette.fixed)
        );
        assert_eq!(
            highlight_color(EdgeHighlight::Fixed, true, &palette),
            Some(palette.merge)
        );
    }

    #[derive(Debug, Clone)]
    enum Op {
        Hover(usize),
        HoverUv(usize),
        Fix(usize),
        FixUv(usize),
        Unfix(usize),
        Toggle(usize),
        ClearHover,
        Rebuild(Vec<bool>),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0..13usize).prop_map(Op::Hover),
            (0..32usize).prop_map(Op::HoverUv),
            (0..13usize).prop_map(Op::Fix),
            (0..32usize).prop_map(Op::FixUv),
            (0..13usize).prop_map(Op::Unfix),
            (0..13usize).prop_map(Op::Toggle),
            Just(Op::ClearHover),
            proptest::collection::vec(any::<bool>(), 13).prop_map(Op::Rebuild),
        ]
    }

    proptest! {
        #[test]
        fn prop_fix_unfix_churn_keeps_domains_in_sync(
            ops in proptest::collection::vec(op_strategy(), 1..60)
        ) {
            let mesh = ladder();
            let adj = AdjacencyIndex::build(&mesh);
            let edges = mesh.edges();
            let mut soup = build_soup(&mesh, &adj, &BTreeSet::new()).unwrap();
            let mut weights = SeparationWeightTable::new();
            let mut tracker = SeamHighlightTracker::new();

            for op in ops {
                match op {
                    Op::Hover(i) => {
                        let e = edges[i % edges.len()];
                        tracker.hover(e, soup.uv_edges_of(e, &adj));
                    }
                    Op::HoverUv(i) => {
                        let uv = soup.uv_edges();
                        tracker.hover_uv(uv[i % uv.len()], &soup, &adj);
                    }
                    Op::Fix(i) => {
                        let e = edges[i % edges.len()];
                        tracker.fix(e, soup.uv_edges_of(e, &adj), &mut weights);
                    }
                    Op::FixUv(i) => {
                        let uv = soup.uv_edges();
                        tracker.fix_uv(uv[i % uv.len()], &soup, &adj, &mut weights);
                    }
                    Op::Unfix(i) => {
                        tracker.unfix(edges[i % edges.len()], &mut weights);
                    }
                    Op::Toggle(i) => {
                        let e = edges[i % edges.len()];
                        tracker.toggle_fixed(e, soup.uv_edges_of(e, &adj), &mut weights);
                    }
                    Op::ClearHover => {
                        tracker.clear_hover();
                    }
                    Op::Rebuild(mask) => {
                        let seam: BTreeSet<_> = edges
                            .iter()
                            .zip(mask)
                            .filter(|(_, keep)| *keep)
                            .map(|(e, _)| *e)
                            .collect();
                        soup = build_soup(&mesh, &adj, &seam).unwrap();
                        tracker.remap(&soup, &adj, &mut weights);
                    }
                }
                prop_assert!(tracker.domains_agree());
                prop_assert_eq!(tracker.fixed_edges(), weights.zeroed_edges());
                for uv in tracker.fixed_uv_edges() {
                    prop_assert!(tracker.is_fixed(soup.mesh_edge_of(uv)));
                }
            }
        }
    }
}
