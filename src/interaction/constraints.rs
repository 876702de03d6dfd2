//! Face and vertex constraints accumulated from user edits.

use std::collections::{BTreeMap, BTreeSet};

use log::debug;
use nalgebra::{Point2, Vector2};

use super::PaintBatch;
use crate::mesh::{FaceId, SoupMesh, SoupVertexId, VertexId};
use crate::solver::{FaceTarget, SolverConstraints, UvLayout};

/// Fixed faces, active faces and pinned vertices.
///
/// Faces are keyed by [`FaceId`], which survives soup rebuilds. Vertex pins
/// are kept per original vertex and resolved to soup copies with
/// [`repin`](FaceConstraints::repin) after every rebuild.
#[derive(Debug, Clone, Default)]
pub struct FaceConstraints {
    fixed: BTreeMap<FaceId, [Point2<f64>; 3]>,
    /// Positions at commit time, before `offset`.
    active: BTreeMap<FaceId, [Point2<f64>; 3]>,
    offset: Vector2<f64>,
    pinned_vertices: BTreeSet<VertexId>,
    pins: BTreeMap<SoupVertexId, Point2<f64>>,
}

impl FaceConstraints {
    /// Create an empty constraint set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a committed paint or box batch, capturing face positions from
    /// `layout`.
    pub fn apply(&mut self, batch: &PaintBatch, soup: &SoupMesh, layout: &UvLayout) {
        for &f in &batch.fixed {
            self.active.remove(&f);
            self.fixed.insert(f, layout.face_positions(soup, f));
        }
        for &f in &batch.active {
            self.fixed.remove(&f);
            let down = layout.face_positions(soup, f).map(|p| p - self.offset);
            self.active.insert(f, down);
        }
        for f in &batch.erased {
            self.fixed.remove(f);
            self.active.remove(f);
        }
        debug!(
            "face constraints: {} fixed, {} active",
            self.fixed.len(),
            self.active.len()
        );
    }

    /// Mark one face active at the given corner positions.
    pub fn set_active(&mut self, face: FaceId, positions: [Point2<f64>; 3]) {
        self.fixed.remove(&face);
        self.active.insert(face, positions.map(|p| p - self.offset));
    }

    /// Translate every active face.
    pub fn translate_active(&mut self, delta: Vector2<f64>) {
        self.offset += delta;
    }

    /// Active faces.
    pub fn active_faces(&self) -> impl Iterator<Item = FaceId> + '_ {
        self.active.keys().copied()
    }

    /// Fixed faces.
    pub fn fixed_faces(&self) -> impl Iterator<Item = FaceId> + '_ {
        self.fixed.keys().copied()
    }

    /// Whether a face is fixed.
    pub fn is_fixed(&self, face: FaceId) -> bool {
        self.fixed.contains_key(&face)
    }

    /// Whether a face is active.
    pub fn is_active(&self, face: FaceId) -> bool {
        self.active.contains_key(&face)
    }

    /// Target corner positions of an active face.
    pub fn active_target(&self, face: FaceId) -> Option<[Point2<f64>; 3]> {
        self.active
            .get(&face)
            .map(|down| down.map(|p| p + self.offset))
    }

    /// Toggle the pin on `v`, capturing every copy at its current position.
    /// Returns the new pinned state.
    pub fn toggle_pin(&mut self, v: VertexId, soup: &SoupMesh, layout: &UvLayout) -> bool {
        let pinned = if self.pinned_vertices.remove(&v) {
            for s in soup.copies_of(v) {
                self.pins.remove(s);
            }
            false
        } else {
            self.pinned_vertices.insert(v);
            for &s in soup.copies_of(v) {
                self.pins.insert(s, layout.position(s));
            }
            true
        };
        debug!("vertex {:?} pinned: {}", v, pinned);
        pinned
    }

    /// Whether `v` is pinned.
    pub fn is_pinned(&self, v: VertexId) -> bool {
        self.pinned_vertices.contains(&v)
    }

    /// Pinned original vertices.
    pub fn pinned_vertices(&self) -> &BTreeSet<VertexId> {
        &self.pinned_vertices
    }

    /// Resolve vertex pins against a rebuilt soup.
    pub fn repin(&mut self, soup: &SoupMesh, layout: &UvLayout) {
        self.pins = self
            .pinned_vertices
            .iter()
            .flat_map(|&v| soup.copies_of(v).iter().copied())
            .filter(|s| s.index() < layout.len())
            .map(|s| (s, layout.position(s)))
            .collect();
    }

    /// Drop every constraint.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Build the solver constraints. `separation` is filled in by the caller.
    pub fn to_solver_constraints(&self, position_weight: f64) -> SolverConstraints {
        let mut face_targets = BTreeMap::new();
        for (&f, &positions) in &self.fixed {
            face_targets.insert(
                f,
                FaceTarget {
                    positions,
                    weight: position_weight,
                },
            );
        }
        for &f in self.active.keys() {
            if let Some(positions) = self.active_target(f) {
                face_targets.insert(
                    f,
                    FaceTarget {
                        positions,
                        weight: position_weight,
                    },
                );
            }
        }
        SolverConstraints {
            revision: 0,
            pinned: self.pins.clone(),
            face_targets,
            separation: Vec::new(),
        }
    }
}
