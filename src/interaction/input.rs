//! Host-independent input events.

use nalgebra::Point2;

/// Panel an event originated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    /// The 3D mesh view.
    Mesh,
    /// The UV view.
    Uv,
}

/// Pointer position in a panel, in normalized device coordinates
/// (`[-1, 1]` on both axes, y up).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerPos {
    /// Panel under the pointer.
    pub panel: Panel,
    /// Position within the panel.
    pub ndc: Point2<f64>,
}

impl PointerPos {
    /// Pointer in the 3D panel.
    pub fn mesh(x: f64, y: f64) -> Self {
        Self {
            panel: Panel::Mesh,
            ndc: Point2::new(x, y),
        }
    }

    /// Pointer in the UV panel.
    pub fn uv(x: f64, y: f64) -> Self {
        Self {
            panel: Panel::Uv,
            ndc: Point2::new(x, y),
        }
    }
}

/// Mouse button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    /// Primary button.
    Left,
    /// Wheel button.
    Middle,
    /// Secondary button.
    Right,
}

/// Modifier keys held during an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[allow(missing_docs)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    /// No modifiers.
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
    };

    /// Only Ctrl.
    pub const CTRL: Self = Self {
        shift: false,
        ctrl: true,
        alt: false,
    };

    /// Only Alt.
    pub const ALT: Self = Self {
        shift: false,
        ctrl: false,
        alt: true,
    };
}

/// Keys the editor reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// A letter key, upper case.
    Char(char),
    /// A digit key.
    Digit(u8),
    /// Return / Enter.
    Enter,
    /// Escape.
    Escape,
    /// Delete or Backspace.
    Delete,
}
