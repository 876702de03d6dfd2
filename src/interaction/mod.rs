//! Pointer and key interpretation.
//!
//! The [`InteractionModeMachine`] holds exactly one [`ModeState`] at a time
//! and routes raw events to it. Picks resolve through the scene's soup, so a
//! hit on a UV triangle names the same [`FaceId`](crate::mesh::FaceId) as the
//! 3D triangle it came from.

mod bbox;
mod constraints;
mod input;
mod machine;
mod mode;
mod paint;

pub use bbox::{classify_all, triangle_in_box, BoundingBox, BoundingBoxSelector, Corner};
pub use constraints::FaceConstraints;
pub use input::{Key, Modifiers, MouseButton, Panel, PointerPos};
pub use machine::{EventContext, InteractionModeMachine, Outcome};
pub use mode::{BoxDrag, BoxState, CutState, FaceDrag, Mode, ModeState, PaintState, PositionState};
pub use paint::{PaintBatch, PaintSet, PainterMode};
