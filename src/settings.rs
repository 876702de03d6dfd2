//! Editor settings.

use crate::error::{EditorError, Result};
use crate::seam::HighlightPalette;

/// Tunable editor parameters.
///
/// # Example
///
/// ```
/// use seamstress::settings::EditorSettings;
///
/// let settings = EditorSettings::default()
///     .with_separation_weight(2.0)
///     .with_position_weight(5000.0);
/// assert!(settings.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EditorSettings {
    /// Edge pick distance in the 3D panel, as a fraction of the mesh extent.
    pub edge_pick_tolerance: f64,
    /// Vertex pick distance in the 3D panel, as a fraction of the mesh extent.
    pub vertex_pick_tolerance: f64,
    /// Pick distance in the UV panel, in UV units.
    pub uv_pick_tolerance: f64,
    /// Separation energy weight (lambda).
    pub separation_weight: f64,
    /// Weight of painted and dragged face targets.
    pub position_weight: f64,
    /// Increment used by hosts that step the position weight.
    pub position_weight_step: f64,
    /// Camera rotation in radians per NDC unit of drag.
    pub rotation_sensitivity: f64,
    /// Zoom change per scroll notch.
    pub zoom_step: f64,
    /// Whether snapshots capture the 3D mesh rather than the UV layout.
    pub store_3d_mesh: bool,
    /// Tint faces by their seam separation gap.
    pub show_separation_error: bool,
    /// Separation gap at which the tint saturates, in UV units.
    pub separation_color_clamp: f64,
    /// Tint faces by their distortion error.
    pub show_distortion_error: bool,
    /// Distortion error at which the tint saturates.
    pub distortion_color_clamp: f64,
    /// Mark flipped and overlapping faces.
    pub show_overlaps: bool,
    /// Highlight colors.
    pub palette: HighlightPalette,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            edge_pick_tolerance: 0.05,
            vertex_pick_tolerance: 0.05,
            uv_pick_tolerance: 0.02,
            separation_weight: 1.0,
            position_weight: 10000.0,
            position_weight_step: 1000.0,
            rotation_sensitivity: 2.0,
            zoom_step: 0.1,
            store_3d_mesh: true,
            show_separation_error: true,
            separation_color_clamp: 0.5,
            show_distortion_error: false,
            distortion_color_clamp: 0.5,
            show_overlaps: false,
            palette: HighlightPalette::default(),
        }
    }
}

impl EditorSettings {
    /// Set the 3D edge pick tolerance.
    pub fn with_edge_pick_tolerance(mut self, tolerance: f64) -> Self {
        self.edge_pick_tolerance = tolerance;
        self
    }

    /// Set the 3D vertex pick tolerance.
    pub fn with_vertex_pick_tolerance(mut self, tolerance: f64) -> Self {
        self.vertex_pick_tolerance = tolerance;
        self
    }

    /// Set the UV pick tolerance.
    pub fn with_uv_pick_tolerance(mut self, tolerance: f64) -> Self {
        self.uv_pick_tolerance = tolerance;
        self
    }

    /// Set the separation weight.
    pub fn with_separation_weight(mut self, weight: f64) -> Self {
        self.separation_weight = weight;
        self
    }

    /// Set the position weight.
    pub fn with_position_weight(mut self, weight: f64) -> Self {
        self.position_weight = weight;
        self
    }

    /// Set the rotation sensitivity.
    pub fn with_rotation_sensitivity(mut self, sensitivity: f64) -> Self {
        self.rotation_sensitivity = sensitivity;
        self
    }

    /// Set the zoom step.
    pub fn with_zoom_step(mut self, step: f64) -> Self {
        self.zoom_step = step;
        self
    }

    /// Choose what snapshots capture.
    pub fn with_store_3d_mesh(mut self, store: bool) -> Self {
        self.store_3d_mesh = store;
        self
    }

    /// Toggle the separation error tint.
    pub fn with_separation_error(mut self, show: bool) -> Self {
        self.show_separation_error = show;
        self
    }

    /// Set the separation gap at which the tint saturates.
    pub fn with_separation_color_clamp(mut self, clamp: f64) -> Self {
        self.separation_color_clamp = clamp;
        self
    }

    /// Toggle the distortion error tint.
    pub fn with_distortion_error(mut self, show: bool) -> Self {
        self.show_distortion_error = show;
        self
    }

    /// Set the distortion error at which the tint saturates.
    pub fn with_distortion_color_clamp(mut self, clamp: f64) -> Self {
        self.distortion_color_clamp = clamp;
        self
    }

    /// Toggle overlap marking.
    pub fn with_overlaps(mut self, show: bool) -> Self {
        self.show_overlaps = show;
        self
    }

    /// Set the highlight palette.
    pub fn with_palette(mut self, palette: HighlightPalette) -> Self {
        self.palette = palette;
        self
    }

    /// Step the position weight up by one increment.
    pub fn increase_position_weight(&mut self) {
        self.position_weight += self.position_weight_step;
    }

    /// Step the position weight down by one increment, stopping at one step.
    pub fn decrease_position_weight(&mut self) {
        self.position_weight =
            (self.position_weight - self.position_weight_step).max(self.position_weight_step);
    }

    /// Check that every tolerance and weight is usable.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("edge_pick_tolerance", self.edge_pick_tolerance),
            ("vertex_pick_tolerance", self.vertex_pick_tolerance),
            ("uv_pick_tolerance", self.uv_pick_tolerance),
            ("position_weight", self.position_weight),
            ("position_weight_step", self.position_weight_step),
            ("rotation_sensitivity", self.rotation_sensitivity),
            ("separation_color_clamp", self.separation_color_clamp),
            ("distortion_color_clamp", self.distortion_color_clamp),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(EditorError::invalid_param(name, value, "must be positive"));
            }
        }
        if !(self.separation_weight.is_finite() && self.separation_weight >= 0.0) {
            return Err(EditorError::invalid_param(
                "separation_weight",
                self.separation_weight,
                "must be non-negative",
            ));
        }
        if !(self.zoom_step.is_finite() && self.zoom_step > 0.0 && self.zoom_step < 1.0) {
            return Err(EditorError::invalid_param(
                "zoom_step",
                self.zoom_step,
                "must be in (0, 1)",
            ));
        }
        Ok(())
    }
}
