//! Integer screen geometry shared by the layout strategies and the hosts.

use serde::{Deserialize, Serialize};

use crate::layout_engine::Orientation;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self { Point { x, y } }

    /// Coordinate along the axis an orientation splits.
    pub fn along(&self, orientation: Orientation) -> f64 {
        match orientation {
            Orientation::Horizontal => self.x,
            Orientation::Vertical => self.y,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self { Size { width, height } }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Rect { x, y, width, height }
    }

    pub fn size(&self) -> Size { Size::new(self.width, self.height) }

    pub fn max_x(&self) -> i32 { self.x + self.width }

    pub fn max_y(&self) -> i32 { self.y + self.height }

    /// Inclusive on every edge, so a point on a shared border matches the
    /// first rectangle tested.
    pub fn contains(&self, point: Point) -> bool {
        (self.x as f64..=self.max_x() as f64).contains(&point.x)
            && (self.y as f64..=self.max_y() as f64).contains(&point.y)
    }

    /// Extent of the rectangle along the axis an orientation splits.
    pub fn extent(&self, orientation: Orientation) -> i32 {
        match orientation {
            Orientation::Horizontal => self.width,
            Orientation::Vertical => self.height,
        }
    }

    pub fn origin_along(&self, orientation: Orientation) -> i32 {
        match orientation {
            Orientation::Horizontal => self.x,
            Orientation::Vertical => self.y,
        }
    }

    /// Splits the rectangle in two along `orientation`.
    ///
    /// The first part gets `floor(extent * ratio)`; the second part gets the
    /// exact remainder, so the two parts always tile `self` with no gap or
    /// overlap.
    pub fn split(&self, orientation: Orientation, ratio: f32) -> (Rect, Rect) {
        let first = (self.extent(orientation) as f64 * ratio as f64).floor() as i32;
        match orientation {
            Orientation::Horizontal => (
                Rect::new(self.x, self.y, first, self.height),
                Rect::new(self.x + first, self.y, self.width - first, self.height),
            ),
            Orientation::Vertical => (
                Rect::new(self.x, self.y, self.width, first),
                Rect::new(self.x, self.y + first, self.width, self.height - first),
            ),
        }
    }

    /// Shrinks the rectangle by `inset` on all sides, never letting either
    /// dimension drop below `min_size`.
    pub fn inset(&self, inset: i32, min_size: i32) -> Rect {
        Rect {
            x: self.x + inset,
            y: self.y + inset,
            width: (self.width - inset * 2).max(min_size),
            height: (self.height - inset * 2).max(min_size),
        }
    }
}
