use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::{LayoutSystem, Removal, TileSettings};
use crate::common::collections::BTreeMap;
use crate::common::config::{GridFlow, GridSettings};
use crate::layout_engine::{FloatingReason, Orientation, Placement};
use crate::model::WindowId;
use crate::sys::geometry::{Point, Rect};
use crate::sys::host::WindowHost;

/// Position and extent of a cell, in grid units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellSpan {
    pub column: u32,
    pub row: u32,
    pub columns: u32,
    pub rows: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct GridCell {
    window: WindowId,
    span: CellSpan,
    geometry: Option<Rect>,
}

/// Fixed-capacity grid placement. Windows occupy cells in insertion order
/// and the last cells stretch so the grid always fills the output.
#[derive(Serialize, Deserialize, Debug)]
pub struct GridLayoutSystem {
    rows: u32,
    columns: u32,
    flow: GridFlow,
    cells: Vec<GridCell>,
    floating: BTreeMap<WindowId, FloatingReason>,
    active: Option<WindowId>,
    settings: TileSettings,
}

impl Default for GridLayoutSystem {
    fn default() -> Self { GridLayoutSystem::new(&GridSettings::default(), TileSettings::default()) }
}

impl GridLayoutSystem {
    pub fn new(grid: &GridSettings, settings: TileSettings) -> Self {
        GridLayoutSystem {
            rows: grid.rows.max(1),
            columns: grid.columns.max(1),
            flow: grid.flow,
            cells: Vec::new(),
            floating: BTreeMap::new(),
            active: None,
            settings,
        }
    }

    pub fn capacity(&self) -> usize { self.rows as usize * self.columns as usize }

    pub fn is_full(&self) -> bool { self.cells.len() >= self.capacity() }

    /// The cell the next window will occupy, or `None` at capacity.
    pub fn cursor(&self) -> Option<(u32, u32)> {
        if self.is_full() {
            return None;
        }
        let span = self.span_at(self.cells.len(), self.cells.len() + 1);
        Some((span.column, span.row))
    }

    pub fn span_of(&self, window: WindowId) -> Option<CellSpan> {
        self.index_of(window).map(|i| self.cells[i].span)
    }

    fn index_of(&self, window: WindowId) -> Option<usize> {
        self.cells.iter().position(|cell| cell.window == window)
    }

    fn is_registered(&self, window: WindowId) -> bool {
        self.index_of(window).is_some() || self.floating.contains_key(&window)
    }

    /// Cell of the `index`th window when `count` windows are tiled.
    ///
    /// Cells of the last occupied row stretch to the bottom edge and the last
    /// cell stretches to the right edge (transposed for vertical flow).
    fn span_at(&self, index: usize, count: usize) -> CellSpan {
        let index = index as u32;
        let last = count.saturating_sub(1) as u32;
        match self.flow {
            GridFlow::Horizontal => {
                let (row, column) = (index / self.columns, index % self.columns);
                let last_row = last / self.columns;
                CellSpan {
                    column,
                    row,
                    columns: if index == last { self.columns - column } else { 1 },
                    rows: if row == last_row { self.rows - row } else { 1 },
                }
            }
            GridFlow::Vertical => {
                let (column, row) = (index / self.rows, index % self.rows);
                let last_column = last / self.rows;
                CellSpan {
                    column,
                    row,
                    columns: if column == last_column { self.columns - column } else { 1 },
                    rows: if index == last { self.rows - row } else { 1 },
                }
            }
        }
    }

    /// Re-assigns every cell from its position in the insertion order, so
    /// the cells in use are always the first `len` cells of the flow.
    fn repack(&mut self) {
        let count = self.cells.len();
        let spans: Vec<CellSpan> = (0..count).map(|i| self.span_at(i, count)).collect();
        for (cell, span) in self.cells.iter_mut().zip(spans) {
            cell.span = span;
        }
    }

    fn place(&mut self, window: WindowId, index: usize) -> bool {
        if self.is_full() {
            debug!(%window, capacity = self.capacity(), "grid is full");
            return false;
        }
        let index = index.min(self.cells.len());
        self.cells.insert(index, GridCell {
            window,
            span: CellSpan::default(),
            geometry: None,
        });
        self.floating.remove(&window);
        self.repack();
        self.active = Some(window);
        true
    }

    fn take_cell(&mut self, window: WindowId) -> Removal {
        let Some(index) = self.index_of(window) else {
            return Removal::NotFound;
        };
        self.cells.remove(index);
        self.repack();

        let focus = self.cells.get(index).or_else(|| self.cells.last()).map(|c| c.window);
        if self.active == Some(window) {
            self.active = focus;
        }
        match focus {
            Some(window) => Removal::Focus(window),
            None => Removal::Emptied,
        }
    }
}

/// Offset and length of `span` tracks starting at `start`, when `total` is
/// divided into `tracks` tracks and the last track absorbs the remainder.
fn track_range(origin: i32, total: i32, tracks: u32, start: u32, span: u32) -> (i32, i32) {
    let base = total / tracks as i32;
    let begin = origin + base * start as i32;
    let end = if start + span >= tracks {
        origin + total
    } else {
        begin + base * span as i32
    };
    (begin, end - begin)
}

impl LayoutSystem for GridLayoutSystem {
    fn draw_tree(&self) -> String {
        let mut s = format!("Grid {}x{} {:?}\n", self.columns, self.rows, self.flow);
        for cell in &self.cells {
            let span = cell.span;
            s.push_str(&format!(
                "  Cell {} ({},{}) {}x{}\n",
                cell.window, span.column, span.row, span.columns, span.rows
            ));
        }
        for (window, reason) in &self.floating {
            s.push_str(&format!("Floating {window} {:?}\n", reason));
        }
        s
    }

    fn insert(&mut self, window: WindowId, _host: &dyn WindowHost) -> bool {
        if self.is_registered(window) {
            debug!(%window, "window is already registered");
            return false;
        }
        self.place(window, self.cells.len())
    }

    /// The grid has no notion of splitting; the window takes the cell right
    /// after `target` and later windows shift along the flow.
    fn insert_at(
        &mut self,
        window: WindowId,
        target: WindowId,
        _orientation: Orientation,
        ratio: f32,
        _reference: Point,
    ) -> bool {
        if window == target || !(ratio.is_finite() && (0.0..1.0).contains(&ratio)) {
            return false;
        }
        if self.index_of(window).is_some() {
            debug!(%window, "window is already tiled");
            return false;
        }
        match self.index_of(target) {
            Some(index) => self.place(window, index + 1),
            None => false,
        }
    }

    fn remove(&mut self, window: WindowId) -> Removal { self.take_cell(window) }

    fn detach(&mut self, window: WindowId, reason: FloatingReason) -> bool {
        if !self.take_cell(window).succeeded() {
            return false;
        }
        self.floating.insert(window, reason);
        true
    }

    fn attach(
        &mut self,
        window: WindowId,
        target: Option<WindowId>,
        _host: &dyn WindowHost,
    ) -> bool {
        if !self.floating.contains_key(&window) {
            return false;
        }
        let index = match target {
            Some(target) => match self.index_of(target) {
                Some(index) => index + 1,
                None => return false,
            },
            None => self.cells.len(),
        };
        self.place(window, index)
    }

    fn add_floating(&mut self, window: WindowId, reason: FloatingReason) -> bool {
        if self.is_registered(window) {
            return false;
        }
        self.floating.insert(window, reason);
        true
    }

    fn set_floating_reason(&mut self, window: WindowId, reason: FloatingReason) -> bool {
        match self.floating.get_mut(&window) {
            Some(current) => {
                *current = reason;
                true
            }
            None => false,
        }
    }

    fn forget(&mut self, window: WindowId) -> bool { self.floating.remove(&window).is_some() }

    fn reflow(&mut self, area: Rect, host: &mut dyn WindowHost) -> bool {
        let (columns, rows) = (self.columns, self.rows);
        let frame_of = |span: CellSpan| {
            let (x, width) = track_range(area.x, area.width, columns, span.column, span.columns);
            let (y, height) = track_range(area.y, area.height, rows, span.row, span.rows);
            Rect::new(x, y, width, height)
        };

        for cell in &mut self.cells {
            let geometry = frame_of(cell.span);
            cell.geometry = Some(geometry);
            trace!(window = %cell.window, ?geometry, "cell geometry");
            if host.is_mapped(cell.window) {
                let frame = self.settings.window_frame(geometry);
                host.set_position(cell.window, frame.x, frame.y);
                host.set_size(cell.window, frame.width, frame.height);
            }
        }
        debug!(cells = self.cells.len(), "grid reflow finished");
        true
    }

    fn resize(&mut self, _cursor: Point) -> bool { false }

    fn set_active(&mut self, window: WindowId) -> bool {
        if self.index_of(window).is_none() {
            return false;
        }
        self.active = Some(window);
        true
    }

    fn active_window(&self) -> Option<WindowId> { self.active }

    fn contains_window(&self, window: WindowId) -> bool { self.index_of(window).is_some() }

    fn placement(&self, window: WindowId) -> Option<Placement> {
        if self.index_of(window).is_some() {
            return Some(Placement::Tiled);
        }
        self.floating.get(&window).map(|&reason| Placement::Floating(reason))
    }

    fn window_at(&self, point: Point) -> Option<WindowId> {
        self.cells
            .iter()
            .find(|cell| cell.geometry.is_some_and(|g| g.contains(point)))
            .map(|cell| cell.window)
    }

    fn tiled_windows(&self) -> Vec<WindowId> { self.cells.iter().map(|c| c.window).collect() }

    fn floating_windows(&self) -> Vec<WindowId> { self.floating.keys().copied().collect() }

    fn geometry_of(&self, window: WindowId) -> Option<Rect> {
        self.index_of(window).and_then(|i| self.cells[i].geometry)
    }

    fn live_count(&self) -> usize { self.cells.len() }
}
