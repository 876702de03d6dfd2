//! Interaction modes and their transient state.

use std::fmt;

use nalgebra::Point2;

use super::bbox::Corner;
use super::{PaintSet, PainterMode};
use crate::mesh::{FaceId, VertexId};

/// The active interaction mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Camera navigation only.
    Move,
    /// Hover, fix and cut seam edges.
    EdgeCutting,
    /// Drag single UV triangles.
    FacePositioning,
    /// Paint faces fixed, active or erased.
    Painting,
    /// Toggle vertex pins.
    VertexClicking,
    /// Draw and edit selection boxes.
    BBoxDrawing,
}

impl Mode {
    /// Every mode.
    pub const ALL: [Mode; 6] = [
        Mode::Move,
        Mode::EdgeCutting,
        Mode::FacePositioning,
        Mode::Painting,
        Mode::VertexClicking,
        Mode::BBoxDrawing,
    ];
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Move => "move",
            Mode::EdgeCutting => "edge cutting",
            Mode::FacePositioning => "face positioning",
            Mode::Painting => "painting",
            Mode::VertexClicking => "vertex clicking",
            Mode::BBoxDrawing => "box drawing",
        };
        f.write_str(name)
    }
}

/// Endpoints of an initial cut being placed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CutState {
    /// First endpoint, once clicked.
    pub first: Option<VertexId>,
}

/// A UV triangle being dragged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceDrag {
    /// Dragged face.
    pub face: FaceId,
    /// UV position of the pointer at the last event.
    pub last: Point2<f64>,
}

/// Face positioning state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PositionState {
    /// The drag in progress.
    pub drag: Option<FaceDrag>,
}

/// Painting state.
#[derive(Debug, Clone, Default)]
pub struct PaintState {
    /// Current painter mode.
    pub painter: PainterMode,
    /// Strokes of the gesture in progress.
    pub strokes: PaintSet,
    /// Whether the left button is down.
    pub painting: bool,
    /// UV pointer position of a right-drag translating active faces.
    pub translating: Option<Point2<f64>>,
}

/// A drag in box drawing mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoxDrag {
    /// Placing a new box whose first corner is fixed.
    NewBox {
        /// First corner.
        start: Point2<f64>,
        /// Pointer position.
        current: Point2<f64>,
    },
    /// Moving one corner of an existing box.
    Corner {
        /// Box index.
        index: usize,
        /// Dragged corner.
        corner: Corner,
    },
}

/// Box drawing state.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxState {
    /// Whether the next press places the first corner of a new box.
    pub is_adding_first_corner: bool,
    /// The drag in progress.
    pub drag: Option<BoxDrag>,
}

impl Default for BoxState {
    fn default() -> Self {
        Self {
            is_adding_first_corner: true,
            drag: None,
        }
    }
}

/// The active mode together with the state only that mode owns.
#[derive(Debug, Clone)]
pub enum ModeState {
    /// See [`Mode::Move`].
    Move,
    /// See [`Mode::EdgeCutting`].
    EdgeCutting(CutState),
    /// See [`Mode::FacePositioning`].
    FacePositioning(PositionState),
    /// See [`Mode::Painting`].
    Painting(PaintState),
    /// See [`Mode::VertexClicking`].
    VertexClicking,
    /// See [`Mode::BBoxDrawing`].
    BBoxDrawing(BoxState),
}

impl ModeState {
    /// Fresh state for entering `mode`.
    pub fn enter(mode: Mode) -> Self {
        match mode {
            Mode::Move => ModeState::Move,
            Mode::EdgeCutting => ModeState::EdgeCutting(CutState::default()),
            Mode::FacePositioning => ModeState::FacePositioning(PositionState::default()),
            Mode::Painting => ModeState::Painting(PaintState::default()),
            Mode::VertexClicking => ModeState::VertexClicking,
            Mode::BBoxDrawing => ModeState::BBoxDrawing(BoxState::default()),
        }
    }

    /// The mode this state belongs to.
    pub fn mode(&self) -> Mode {
        match self {
            ModeState::Move => Mode::Move,
            ModeState::EdgeCutting(_) => Mode::EdgeCutting,
            ModeState::FacePositioning(_) => Mode::FacePositioning,
            ModeState::Painting(_) => Mode::Painting,
            ModeState::VertexClicking => Mode::VertexClicking,
            ModeState::BBoxDrawing(_) => Mode::BBoxDrawing,
        }
    }

    /// Whether a drag that edits the layout is in progress.
    pub fn is_dragging(&self) -> bool {
        match self {
            ModeState::FacePositioning(s) => s.drag.is_some(),
            ModeState::Painting(s) => s.translating.is_some(),
            _ => false,
        }
    }
}

impl Default for ModeState {
    fn default() -> Self {
        ModeState::enter(Mode::FacePositioning)
    }
}
