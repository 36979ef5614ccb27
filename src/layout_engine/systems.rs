use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};

use crate::common::config::{LayoutMode, LayoutSettings};
use crate::layout_engine::{FloatingReason, Orientation, Placement};
use crate::model::WindowId;
use crate::sys::geometry::{Point, Rect};
use crate::sys::host::WindowHost;

/// Outcome of taking a window out of a tiled layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Removal {
    /// The window was not part of the tiled layout.
    NotFound,
    /// The layout is now empty.
    Emptied,
    /// The window that should receive focus next.
    Focus(WindowId),
}

impl Removal {
    pub fn succeeded(self) -> bool { !matches!(self, Removal::NotFound) }

    pub fn focus(self) -> Option<WindowId> {
        match self {
            Removal::Focus(window) => Some(window),
            _ => None,
        }
    }
}

/// Values every strategy needs when it pushes geometry to windows.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TileSettings {
    pub gap: i32,
    pub min_size: i32,
    pub default_ratio: f32,
}

impl Default for TileSettings {
    fn default() -> Self { TileSettings::from(&LayoutSettings::default()) }
}

impl From<&LayoutSettings> for TileSettings {
    fn from(settings: &LayoutSettings) -> Self {
        TileSettings {
            gap: settings.window_gap,
            min_size: settings.min_window_size,
            default_ratio: settings.default_split_ratio,
        }
    }
}

impl TileSettings {
    /// The frame actually pushed to a window occupying `area`.
    pub fn window_frame(&self, area: Rect) -> Rect { area.inset(self.gap, self.min_size) }
}

/// The contract every per-workspace placement strategy implements.
///
/// Mutating operations report precondition failures as `false` (or
/// [`Removal::NotFound`]) and never leave a partial mutation behind.
#[enum_dispatch]
pub trait LayoutSystem: Serialize + for<'de> Deserialize<'de> {
    fn draw_tree(&self) -> String;

    /// Places a newly created window, choosing the target from the pointer
    /// position, then an empty layout, then the active window.
    fn insert(&mut self, window: WindowId, host: &dyn WindowHost) -> bool;

    /// Places `window` next to `target` explicitly.
    fn insert_at(
        &mut self,
        window: WindowId,
        target: WindowId,
        orientation: Orientation,
        ratio: f32,
        reference: Point,
    ) -> bool;

    /// Unregisters a tiled window and compacts the layout around it.
    fn remove(&mut self, window: WindowId) -> Removal;

    /// Takes a tiled window out of the layout but keeps it registered as
    /// floating with `reason`.
    fn detach(&mut self, window: WindowId, reason: FloatingReason) -> bool;

    /// Puts a floating window back into the layout, next to `target` or
    /// wherever window creation would have placed it.
    fn attach(&mut self, window: WindowId, target: Option<WindowId>, host: &dyn WindowHost)
    -> bool;

    /// Registers a window that could not be tiled as floating.
    fn add_floating(&mut self, window: WindowId, reason: FloatingReason) -> bool;

    /// Changes why an already floating window floats.
    fn set_floating_reason(&mut self, window: WindowId, reason: FloatingReason) -> bool;

    /// Unregisters a floating window.
    fn forget(&mut self, window: WindowId) -> bool;

    /// Assigns geometry to every tiled window inside `area` and pushes the
    /// resulting frames to the host. Returns false when the structural
    /// invariant check fails.
    fn reflow(&mut self, area: Rect, host: &mut dyn WindowHost) -> bool;

    /// Reflows against the output bound to `workspace`. Fails without
    /// touching anything when no output is bound.
    fn recalculate(&mut self, workspace: usize, host: &mut dyn WindowHost) -> bool {
        match host.output_geometry(workspace) {
            Some(area) => self.reflow(area, host),
            None => false,
        }
    }

    /// Drags the boundary next to the active window to `cursor`.
    fn resize(&mut self, cursor: Point) -> bool;

    fn set_active(&mut self, window: WindowId) -> bool;
    fn active_window(&self) -> Option<WindowId>;

    /// Whether `window` is currently part of the tiled layout.
    fn contains_window(&self, window: WindowId) -> bool;
    fn placement(&self, window: WindowId) -> Option<Placement>;
    fn window_at(&self, point: Point) -> Option<WindowId>;
    fn tiled_windows(&self) -> Vec<WindowId>;
    fn floating_windows(&self) -> Vec<WindowId>;
    fn geometry_of(&self, window: WindowId) -> Option<Rect>;
    fn live_count(&self) -> usize;
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[enum_dispatch(LayoutSystem)]
pub enum LayoutSystemKind {
    Dynamic(DynamicLayoutSystem),
    Grid(GridLayoutSystem),
}

impl LayoutSystemKind {
    pub fn new(mode: LayoutMode, settings: &LayoutSettings) -> Self {
        match mode {
            LayoutMode::Dynamic => DynamicLayoutSystem::new(settings.into()).into(),
            LayoutMode::Grid => GridLayoutSystem::new(&settings.grid, settings.into()).into(),
        }
    }

    pub fn mode(&self) -> LayoutMode {
        match self {
            LayoutSystemKind::Dynamic(_) => LayoutMode::Dynamic,
            LayoutSystemKind::Grid(_) => LayoutMode::Grid,
        }
    }

    /// Every window the layout knows about, tiled first.
    pub fn windows(&self) -> Vec<WindowId> {
        let mut windows = self.tiled_windows();
        windows.extend(self.floating_windows());
        windows
    }
}

mod dynamic;
mod grid;

pub use dynamic::DynamicLayoutSystem;
pub use grid::GridLayoutSystem;
