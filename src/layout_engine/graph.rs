use serde::{Deserialize, Serialize};

use crate::sys::geometry::Size;

/// Axis along which a split divides its rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// Children arranged left/right.
    Horizontal,
    /// Children arranged top/bottom.
    Vertical,
}

impl Orientation {
    /// Wider-than-tall splits side by side; anything else, squares included,
    /// splits top/bottom.
    pub fn for_size(size: Size) -> Orientation {
        if size.width > size.height {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        }
    }

    pub fn perpendicular(self) -> Orientation {
        match self {
            Orientation::Horizontal => Orientation::Vertical,
            Orientation::Vertical => Orientation::Horizontal,
        }
    }
}
