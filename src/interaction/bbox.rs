//! Rectangle selection of UV triangles.
//!
//! Boxes live in UV coordinates, so they stay attached to the layout when the
//! UV panel is panned or zoomed.

use std::collections::BTreeSet;

use log::debug;
use nalgebra::Point2;

use crate::mesh::{FaceId, SoupMesh};
use crate::solver::UvLayout;

/// One of the two draggable corners of a box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    /// The corner placed first.
    First,
    /// The corner placed second.
    Second,
}

/// An axis-aligned box and the faces currently inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundingBox {
    /// First corner.
    pub corner1: Point2<f64>,
    /// Second corner.
    pub corner2: Point2<f64>,
    /// Faces classified inside at the last classification.
    pub members: BTreeSet<FaceId>,
}

impl BoundingBox {
    /// Create a box with no members.
    pub fn new(corner1: Point2<f64>, corner2: Point2<f64>) -> Self {
        Self {
            corner1,
            corner2,
            members: BTreeSet::new(),
        }
    }

    /// Lower-left and upper-right corners, regardless of placement order.
    pub fn bounds(&self) -> (Point2<f64>, Point2<f64>) {
        (
            Point2::new(
                self.corner1.x.min(self.corner2.x),
                self.corner1.y.min(self.corner2.y),
            ),
            Point2::new(
                self.corner1.x.max(self.corner2.x),
                self.corner1.y.max(self.corner2.y),
            ),
        )
    }

    /// Whether the box has zero area.
    pub fn is_degenerate(&self) -> bool {
        let (min, max) = self.bounds();
        max.x - min.x <= 0.0 || max.y - min.y <= 0.0
    }

    /// Whether `p` lies inside the closed box.
    pub fn contains(&self, p: &Point2<f64>) -> bool {
        let (min, max) = self.bounds();
        p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y
    }

    /// Position of a corner.
    pub fn corner(&self, corner: Corner) -> Point2<f64> {
        match corner {
            Corner::First => self.corner1,
            Corner::Second => self.corner2,
        }
    }

    fn set_corner(&mut self, corner: Corner, p: Point2<f64>) {
        match corner {
            Corner::First => self.corner1 = p,
            Corner::Second => self.corner2 = p,
        }
    }
}

/// Whether all three corners of a triangle lie inside the closed box. A
/// degenerate box contains nothing.
pub fn triangle_in_box(triangle: &[Point2<f64>; 3], bbox: &BoundingBox) -> bool {
    !bbox.is_degenerate() && triangle.iter().all(|p| bbox.contains(p))
}

/// Every face of the layout inside `bbox`.
pub fn classify_all(soup: &SoupMesh, layout: &UvLayout, bbox: &BoundingBox) -> BTreeSet<FaceId> {
    if bbox.is_degenerate() {
        return BTreeSet::new();
    }
    soup.face_ids()
        .filter(|&f| triangle_in_box(&layout.face_positions(soup, f), bbox))
        .collect()
}

/// Persistent list of boxes with at most one selected.
#[derive(Debug, Clone, Default)]
pub struct BoundingBoxSelector {
    boxes: Vec<BoundingBox>,
    selected: Option<usize>,
}

impl BoundingBoxSelector {
    /// Create an empty selector.
    pub fn new() -> Self {
        Self::default()
    }

    /// All boxes, in creation order.
    pub fn boxes(&self) -> &[BoundingBox] {
        &self.boxes
    }

    /// Box by index.
    pub fn get(&self, index: usize) -> Option<&BoundingBox> {
        self.boxes.get(index)
    }

    /// Number of boxes.
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    /// Whether there are no boxes.
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Add a box and classify it. Returns its index.
    pub fn add(
        &mut self,
        corner1: Point2<f64>,
        corner2: Point2<f64>,
        soup: &SoupMesh,
        layout: &UvLayout,
    ) -> usize {
        let mut bbox = BoundingBox::new(corner1, corner2);
        bbox.members = classify_all(soup, layout, &bbox);
        debug!("box {} holds {} faces", self.boxes.len(), bbox.members.len());
        self.boxes.push(bbox);
        self.boxes.len() - 1
    }

    /// Corner within `tolerance` of `p`, nearest first.
    pub fn corner_near(&self, p: &Point2<f64>, tolerance: f64) -> Option<(usize, Corner)> {
        self.boxes
            .iter()
            .enumerate()
            .flat_map(|(i, b)| {
                [Corner::First, Corner::Second]
                    .into_iter()
                    .map(move |c| ((i, c), (b.corner(c) - p).norm()))
            })
            .filter(|&(_, d)| d <= tolerance)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(hit, _)| hit)
    }

    /// Most recently added box containing `p`.
    pub fn box_at(&self, p: &Point2<f64>) -> Option<usize> {
        self.boxes.iter().rposition(|b| b.contains(p))
    }

    /// Move a corner and reclassify the box.
    pub fn move_corner(
        &mut self,
        index: usize,
        corner: Corner,
        p: Point2<f64>,
        soup: &SoupMesh,
        layout: &UvLayout,
    ) {
        let Some(bbox) = self.boxes.get_mut(index) else {
            return;
        };
        bbox.set_corner(corner, p);
        bbox.members = classify_all(soup, layout, bbox);
    }

    /// Reclassify every box against a new layout.
    pub fn reclassify(&mut self, soup: &SoupMesh, layout: &UvLayout) {
        for bbox in &mut self.boxes {
            bbox.members = classify_all(soup, layout, bbox);
        }
    }

    /// Remove a box. The selection follows the remaining boxes.
    pub fn remove(&mut self, index: usize) -> Option<BoundingBox> {
        if index >= self.boxes.len() {
            return None;
        }
        self.selected = match self.selected {
            Some(s) if s == index => None,
            Some(s) if s > index => Some(s - 1),
            other => other,
        };
        Some(self.boxes.remove(index))
    }

    /// Select a box, or clear the selection with `None`.
    pub fn select(&mut self, index: Option<usize>) {
        self.selected = index.filter(|&i| i < self.boxes.len());
    }

    /// Index of the selected box.
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Members of the selected box.
    pub fn selected_members(&self) -> Option<&BTreeSet<FaceId>> {
        self.selected
            .and_then(|i| self.boxes.get(i))
            .map(|b| &b.members)
    }

    /// Remove every box.
    pub fn clear(&mut self) {
        self.boxes.clear();
        self.selected = None;
    }
}
