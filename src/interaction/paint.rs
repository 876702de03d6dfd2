//! Paint gestures over faces.

use std::collections::BTreeSet;

use crate::mesh::FaceId;

/// What a paint stroke does to the faces it touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PainterMode {
    /// Pin faces at their current UV position.
    #[default]
    Fix,
    /// Mark faces as active (moving).
    Move,
    /// Remove faces from the fixed and active sets.
    Erase,
}

impl PainterMode {
    /// Painter mode bound to a key, if any.
    pub fn from_key(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'F' => Some(PainterMode::Fix),
            'M' => Some(PainterMode::Move),
            'E' => Some(PainterMode::Erase),
            _ => None,
        }
    }
}

/// Faces touched during one paint gesture, in stroke order.
#[derive(Debug, Clone, Default)]
pub struct PaintSet {
    strokes: Vec<(FaceId, PainterMode)>,
}

impl PaintSet {
    /// Create an empty paint set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `face` was painted with `mode`. Returns false if this
    /// repeats the previous stroke.
    pub fn paint(&mut self, face: FaceId, mode: PainterMode) -> bool {
        if self.strokes.last() == Some(&(face, mode)) {
            return false;
        }
        self.strokes.push((face, mode));
        true
    }

    /// Number of recorded strokes.
    pub fn len(&self) -> usize {
        self.strokes.len()
    }

    /// Whether nothing was painted.
    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty()
    }

    /// Forget every stroke.
    pub fn clear(&mut self) {
        self.strokes.clear();
    }

    /// Deduplicate the strokes into a batch and clear the set. A face painted
    /// more than once lands in the set of its last stroke.
    pub fn commit(&mut self) -> PaintBatch {
        let mut batch = PaintBatch::default();
        for (face, mode) in self.strokes.drain(..) {
            batch.insert(face, mode);
        }
        batch
    }
}

/// Deduplicated result of a paint gesture or a box action. The three sets
/// are disjoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaintBatch {
    /// Faces to pin.
    pub fixed: BTreeSet<FaceId>,
    /// Faces to mark active.
    pub active: BTreeSet<FaceId>,
    /// Faces to release.
    pub erased: BTreeSet<FaceId>,
}

impl PaintBatch {
    /// A batch applying `mode` to every face in `faces`.
    pub fn uniform(faces: impl IntoIterator<Item = FaceId>, mode: PainterMode) -> Self {
        let mut batch = Self::default();
        for face in faces {
            batch.insert(face, mode);
        }
        batch
    }

    fn insert(&mut self, face: FaceId, mode: PainterMode) {
        self.fixed.remove(&face);
        self.active.remove(&face);
        self.erased.remove(&face);
        match mode {
            PainterMode::Fix => self.fixed.insert(face),
            PainterMode::Move => self.active.insert(face),
            PainterMode::Erase => self.erased.insert(face),
        };
    }

    /// Whether the batch touches no face.
    pub fn is_empty(&self) -> bool {
        self.fixed.is_empty() && self.active.is_empty() && self.erased.is_empty()
    }

    /// Total number of faces in the batch.
    pub fn len(&self) -> usize {
        self.fixed.len() + self.active.len() + self.erased.len()
    }
}
