//! An in-memory host that records what the engine asked of it.
//!
//! Used by the `tiley` driver to replay scenarios without a display server,
//! and by the test suites as the double for both host traits.

use serde::{Deserialize, Serialize};

use crate::common::collections::HashMap;
use crate::model::WindowId;
use crate::sys::geometry::{Point, Rect, Size};
use crate::sys::host::{RenderHost, RenderLayer, WindowHost};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HeadlessWindow {
    pub position: Option<(i32, i32)>,
    pub size: Option<Size>,
    pub mapped: bool,
    pub visible: bool,
    pub layer: RenderLayer,
}

impl Default for HeadlessWindow {
    fn default() -> Self {
        Self {
            position: None,
            size: None,
            mapped: true,
            visible: true,
            layer: RenderLayer::Tiled,
        }
    }
}

/// One render-layer instruction, in the order it was issued.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderCommand {
    Reparent(WindowId, RenderLayer),
    Raise(WindowId),
    SetVisible(WindowId, bool),
    StopMove(WindowId),
}

#[derive(Debug, Default)]
pub struct HeadlessHost {
    pointer: Point,
    output: Option<Rect>,
    per_workspace_output: HashMap<usize, Rect>,
    windows: HashMap<WindowId, HeadlessWindow>,
    commands: Vec<RenderCommand>,
}

impl HeadlessHost {
    /// A host with a single output used by every workspace.
    pub fn with_output(output: Rect) -> Self {
        HeadlessHost { output: Some(output), ..Default::default() }
    }

    pub fn set_output(&mut self, output: Option<Rect>) { self.output = output; }

    pub fn bind_output(&mut self, workspace: usize, output: Rect) {
        self.per_workspace_output.insert(workspace, output);
    }

    pub fn move_pointer(&mut self, point: Point) { self.pointer = point; }

    /// Registers a mapped window. Windows the host has never seen, and
    /// windows hidden through [`RenderHost::set_visible`], are treated as
    /// unmapped.
    pub fn map_window(&mut self, window: WindowId) {
        self.windows.entry(window).or_default().mapped = true;
    }

    pub fn unmap_window(&mut self, window: WindowId) {
        self.windows.entry(window).or_default().mapped = false;
    }

    pub fn destroy_window(&mut self, window: WindowId) { self.windows.remove(&window); }

    pub fn window(&self, window: WindowId) -> Option<&HeadlessWindow> { self.windows.get(&window) }

    /// Frame last pushed to the window, as the window itself sees it.
    pub fn frame(&self, window: WindowId) -> Option<Rect> {
        let w = self.windows.get(&window)?;
        let (x, y) = w.position?;
        let size = w.size?;
        Some(Rect::new(x, y, size.width, size.height))
    }

    pub fn layer(&self, window: WindowId) -> Option<RenderLayer> {
        self.windows.get(&window).map(|w| w.layer)
    }

    pub fn commands(&self) -> &[RenderCommand] { &self.commands }

    pub fn take_commands(&mut self) -> Vec<RenderCommand> { std::mem::take(&mut self.commands) }
}

impl WindowHost for HeadlessHost {
    fn set_position(&mut self, window: WindowId, x: i32, y: i32) {
        self.windows.entry(window).or_default().position = Some((x, y));
    }

    fn set_size(&mut self, window: WindowId, width: i32, height: i32) {
        self.windows.entry(window).or_default().size = Some(Size::new(width, height));
    }

    fn is_mapped(&self, window: WindowId) -> bool {
        self.windows.get(&window).is_some_and(|w| w.mapped && w.visible)
    }

    fn window_size(&self, window: WindowId) -> Option<Size> {
        self.windows.get(&window).and_then(|w| w.size)
    }

    fn pointer_position(&self) -> Point { self.pointer }

    fn output_geometry(&self, workspace: usize) -> Option<Rect> {
        self.per_workspace_output.get(&workspace).copied().or(self.output)
    }

    fn stop_move_session(&mut self, window: WindowId) {
        self.commands.push(RenderCommand::StopMove(window));
    }
}

impl RenderHost for HeadlessHost {
    fn reparent(&mut self, window: WindowId, layer: RenderLayer) {
        self.windows.entry(window).or_default().layer = layer;
        self.commands.push(RenderCommand::Reparent(window, layer));
    }

    fn raise_to_top(&mut self, window: WindowId) {
        self.commands.push(RenderCommand::Raise(window));
    }

    fn set_visible(&mut self, window: WindowId, visible: bool) {
        self.windows.entry(window).or_default().visible = visible;
        self.commands.push(RenderCommand::SetVisible(window, visible));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_windows_are_unmapped() {
        let mut host = HeadlessHost::default();
        assert!(!host.is_mapped(WindowId::new(1)));
        host.map_window(WindowId::new(1));
        assert!(host.is_mapped(WindowId::new(1)));
    }

    #[test]
    fn hidden_windows_count_as_unmapped() {
        let mut host = HeadlessHost::default();
        let w = WindowId::new(2);
        host.map_window(w);
        host.set_visible(w, false);
        assert!(!host.is_mapped(w));
        host.set_visible(w, true);
        assert!(host.is_mapped(w));
    }

    #[test]
    fn per_workspace_output_overrides_default() {
        let mut host = HeadlessHost::with_output(Rect::new(0, 0, 1920, 1080));
        host.bind_output(2, Rect::new(1920, 0, 1280, 1024));
        assert_eq!(host.output_geometry(0), Some(Rect::new(0, 0, 1920, 1080)));
        assert_eq!(host.output_geometry(2), Some(Rect::new(1920, 0, 1280, 1024)));
    }

    #[test]
    fn frame_combines_position_and_size() {
        let mut host = HeadlessHost::default();
        let w = WindowId::new(3);
        assert_eq!(host.frame(w), None);
        host.set_position(w, 5, 5);
        host.set_size(w, 950, 1070);
        assert_eq!(host.frame(w), Some(Rect::new(5, 5, 950, 1070)));
    }
}
