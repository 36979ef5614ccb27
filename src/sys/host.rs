//! Boundary to the compositor. The engine never talks to a display server
//! directly; it drives these traits and the embedding compositor implements
//! them.

use serde::{Deserialize, Serialize};

use crate::model::WindowId;
use crate::sys::geometry::{Point, Rect, Size};

/// Render layers, bottom to top. The order is significant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderLayer {
    Background,
    Tiled,
    Floating,
    Lockscreen,
    Overlay,
}

/// The window/output layer.
pub trait WindowHost {
    fn set_position(&mut self, window: WindowId, x: i32, y: i32);
    fn set_size(&mut self, window: WindowId, width: i32, height: i32);
    /// Whether the window currently has a mapped, visible surface.
    fn is_mapped(&self, window: WindowId) -> bool;
    /// Size of the window as currently shown on screen, if known.
    fn window_size(&self, window: WindowId) -> Option<Size>;
    fn pointer_position(&self) -> Point;
    /// Usable area of the output bound to `workspace`.
    fn output_geometry(&self, workspace: usize) -> Option<Rect>;
    /// Ends any interactive drag of `window`, reverting whatever the drag
    /// has not committed yet.
    fn stop_move_session(&mut self, _window: WindowId) {}
}

/// The scene/rendering layer.
pub trait RenderHost {
    fn reparent(&mut self, window: WindowId, layer: RenderLayer);
    fn raise_to_top(&mut self, window: WindowId);
    fn set_visible(&mut self, window: WindowId, visible: bool);
}
