//! Seam edge highlighting and separation-weight bookkeeping.

mod highlight;
mod weights;

pub use highlight::{
    highlight_color, mix_color, EdgeHighlight, HighlightPalette, Rgb, SeamEdgeState,
    SeamHighlightTracker,
};
pub use weights::{SeparationWeightTable, SeparationWeights};
