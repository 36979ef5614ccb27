use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::{
    FloatingManager, FloatingReason, LayoutError, LayoutSystem, LayoutSystemKind, Orientation,
    Placement, Removal, WORKSPACES, WorkspaceLayouts,
};
use crate::actor::broadcast::{BroadcastEvent, BroadcastSender};
use crate::common::collections::HashMap;
use crate::common::config::Config;
use crate::model::WindowId;
use crate::sys::geometry::{Point, Rect};
use crate::sys::host::{RenderHost, RenderLayer, WindowHost};

#[non_exhaustive]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum LayoutCommand {
    /// Floats the focused window, or tiles it again if it already floats.
    ToggleFloating,
    SwitchToWorkspace(usize),
    /// Drags the split boundary next to the active window to a point.
    ResizeTo(Point),
    BeginMove(WindowId),
    EndMove,
}

#[non_exhaustive]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum LayoutEvent {
    WindowCreated(WindowId),
    WindowDestroyed(WindowId),
    WindowFocused(WindowId),
    PointerMoved(Point),
    PointerButton { pressed: bool },
    Command(LayoutCommand),
}

#[must_use]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventResponse {
    pub raise_windows: Vec<WindowId>,
    pub focus_window: Option<WindowId>,
    pub workspace_changed_to: Option<usize>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct LayoutEngine {
    workspaces: WorkspaceLayouts,
    floating: FloatingManager,
    window_workspace: HashMap<WindowId, usize>,
    current: usize,
    #[serde(skip)]
    focused_window: Option<WindowId>,
    #[serde(skip)]
    broadcast_tx: Option<BroadcastSender>,
}

impl LayoutEngine {
    pub fn new(config: &Config, broadcast_tx: Option<BroadcastSender>) -> Self {
        LayoutEngine {
            workspaces: WorkspaceLayouts::new(config),
            floating: FloatingManager::new(),
            window_workspace: HashMap::default(),
            current: 0,
            focused_window: None,
            broadcast_tx,
        }
    }

    pub fn set_broadcast_sender(&mut self, broadcast_tx: Option<BroadcastSender>) {
        self.broadcast_tx = broadcast_tx;
    }

    pub fn current_workspace(&self) -> usize { self.current }

    pub fn workspace_count(&self) -> usize { self.workspaces.len() }

    pub fn workspace_name(&self, workspace: usize) -> Option<&str> {
        self.workspaces.get(workspace).map(|ws| ws.name.as_str())
    }

    pub fn layout(&self, workspace: usize) -> Option<&LayoutSystemKind> {
        self.workspaces.get(workspace).map(|ws| &ws.layout)
    }

    fn layout_mut(&mut self, workspace: usize) -> Option<&mut LayoutSystemKind> {
        self.workspaces.get_mut(workspace).map(|ws| &mut ws.layout)
    }

    fn window_layout_mut(&mut self, window: WindowId) -> Option<(usize, &mut LayoutSystemKind)> {
        let workspace = self.workspace_of(window)?;
        self.layout_mut(workspace).map(|layout| (workspace, layout))
    }

    pub fn workspace_of(&self, window: WindowId) -> Option<usize> {
        self.window_workspace.get(&window).copied()
    }

    pub fn placement(&self, window: WindowId) -> Option<Placement> {
        self.layout(self.workspace_of(window)?)?.placement(window)
    }

    pub fn focused_window(&self) -> Option<WindowId> { self.focused_window }

    /// Floating windows of a workspace, bottom to top.
    pub fn stacking_order(&self, workspace: usize) -> &[WindowId] { self.floating.stack(workspace) }

    pub fn moving_window(&self) -> Option<WindowId> { self.floating.moving().map(|s| s.window) }

    pub fn draw_tree(&self, workspace: usize) -> Option<String> {
        self.layout(workspace).map(|layout| layout.draw_tree())
    }

    pub fn debug_tree(&self, workspace: usize) {
        if let Some(tree) = self.draw_tree(workspace) {
            debug!("Tree of workspace {workspace}:\n{}", tree.trim_end());
        }
    }

    /// Places a new window into `workspace`'s tiled layout.
    pub fn insert(
        &mut self,
        workspace: usize,
        window: WindowId,
        host: &dyn WindowHost,
    ) -> bool {
        if self.window_workspace.contains_key(&window) {
            debug!(%window, "window is already managed");
            return false;
        }
        let Some(layout) = self.layout_mut(workspace) else {
            return false;
        };
        if !layout.insert(window, host) {
            return false;
        }
        self.window_workspace.insert(window, workspace);
        true
    }

    /// Splits `target` to make room for a window the engine does not manage
    /// yet.
    pub fn insert_at(
        &mut self,
        window: WindowId,
        target: WindowId,
        orientation: Orientation,
        ratio: f32,
        reference: Point,
    ) -> bool {
        if self.window_workspace.contains_key(&window) {
            debug!(%window, "window is already managed, floating windows go through attach");
            return false;
        }
        let Some(workspace) = self.workspace_of(target) else {
            return false;
        };
        let Some(layout) = self.layout_mut(workspace) else {
            return false;
        };
        if !layout.insert_at(window, target, orientation, ratio, reference) {
            return false;
        }
        self.window_workspace.insert(window, workspace);
        true
    }

    /// Unregisters a window, tiled or floating.
    pub fn remove(&mut self, window: WindowId) -> Removal {
        let Some((workspace, layout)) = self.window_layout_mut(window) else {
            return Removal::NotFound;
        };
        let removal = match layout.placement(window) {
            Some(Placement::Tiled) => layout.remove(window),
            Some(Placement::Floating(_)) => {
                if layout.forget(window) {
                    layout.active_window().map_or(Removal::Emptied, Removal::Focus)
                } else {
                    Removal::NotFound
                }
            }
            None => Removal::NotFound,
        };
        if removal.succeeded() {
            debug!(%window, workspace, ?removal, "removed window");
            self.window_workspace.remove(&window);
            self.floating.remove(window);
            if self.focused_window == Some(window) {
                self.focused_window = removal.focus();
            }
        }
        removal
    }

    /// Takes a tiled window out of its tree and floats it above the tiled
    /// layer.
    pub fn detach<H: WindowHost + RenderHost>(
        &mut self,
        window: WindowId,
        reason: FloatingReason,
        host: &mut H,
    ) -> bool {
        let Some((workspace, layout)) = self.window_layout_mut(window) else {
            return false;
        };
        if !layout.detach(window, reason) {
            return false;
        }
        debug!(%window, ?reason, "detached window");
        self.float_above(workspace, window, host);
        self.recalculate_logged(workspace, host);
        true
    }

    /// Grafts a floating window back into its tree, next to `target` or
    /// wherever a new window would go.
    pub fn attach<H: WindowHost + RenderHost>(
        &mut self,
        window: WindowId,
        target: Option<WindowId>,
        host: &mut H,
    ) -> bool {
        let Some((workspace, layout)) = self.window_layout_mut(window) else {
            return false;
        };
        if !layout.attach(window, target, host) {
            return false;
        }
        debug!(%window, ?target, "attached window");
        self.floating.remove(window);
        host.reparent(window, RenderLayer::Tiled);
        self.recalculate_logged(workspace, host);
        true
    }

    fn float_above<H: RenderHost>(&mut self, workspace: usize, window: WindowId, host: &mut H) {
        host.reparent(window, RenderLayer::Floating);
        host.raise_to_top(window);
        self.floating.raise(workspace, window);
    }

    /// Reflows `workspace` into `area`.
    pub fn reflow(
        &mut self,
        workspace: usize,
        area: Rect,
        host: &mut dyn WindowHost,
    ) -> Result<(), LayoutError> {
        let layout = self.layout_mut(workspace).ok_or(LayoutError::InvalidWorkspace(workspace))?;
        if layout.reflow(area, host) {
            Ok(())
        } else {
            Err(LayoutError::ReflowMismatch { workspace, live: layout.live_count() })
        }
    }

    /// Reflows `workspace` into the output the host binds to it.
    pub fn recalculate(
        &mut self,
        workspace: usize,
        host: &mut dyn WindowHost,
    ) -> Result<(), LayoutError> {
        let layout = self.layout_mut(workspace).ok_or(LayoutError::InvalidWorkspace(workspace))?;
        if host.output_geometry(workspace).is_none() {
            return Err(LayoutError::NoOutput(workspace));
        }
        if layout.recalculate(workspace, host) {
            Ok(())
        } else {
            Err(LayoutError::ReflowMismatch { workspace, live: layout.live_count() })
        }
    }

    fn recalculate_logged(&mut self, workspace: usize, host: &mut dyn WindowHost) {
        match self.recalculate(workspace, host) {
            Ok(()) => {}
            Err(e @ LayoutError::NoOutput(_)) => warn!("Skipping recalculation: {e}"),
            Err(e) => error!("Recalculation failed: {e}"),
        }
    }

    pub fn switch_workspace<H: WindowHost + RenderHost>(
        &mut self,
        workspace: usize,
        host: &mut H,
    ) -> Result<bool, LayoutError> {
        if workspace >= WORKSPACES {
            return Err(LayoutError::InvalidWorkspace(workspace));
        }
        if workspace == self.current {
            return Ok(false);
        }
        if self.floating.moving().is_some() {
            self.end_move(host);
        }

        let previous = self.current;
        for window in self.layout(previous).map(|l| l.windows()).unwrap_or_default() {
            host.set_visible(window, false);
        }
        self.current = workspace;
        for window in self.layout(workspace).map(|l| l.windows()).unwrap_or_default() {
            host.set_visible(window, true);
        }
        for &window in self.floating.stack(workspace) {
            host.raise_to_top(window);
        }
        self.focused_window = self.layout(workspace).and_then(|l| l.active_window());

        info!(from = previous, to = workspace, "switched workspace");
        self.recalculate_logged(workspace, host);
        self.broadcast_workspace_changed();
        Ok(true)
    }

    pub fn begin_move<H: WindowHost + RenderHost>(&mut self, window: WindowId, host: &mut H) -> bool {
        if self.placement(window) != Some(Placement::Tiled) {
            debug!(%window, "only tiled windows start a move session");
            return false;
        }
        if self.floating.moving().is_some() {
            self.end_move(host);
        }
        let Some(workspace) = self.workspace_of(window) else {
            return false;
        };
        if !self.detach(window, FloatingReason::Moving, host) {
            return false;
        }
        self.floating.begin_move(window, workspace);
        true
    }

    /// Drops the moving window back into its tree at the pointer. A window
    /// that cannot be tiled again stays floating as stacking.
    pub fn end_move<H: WindowHost + RenderHost>(&mut self, host: &mut H) -> bool {
        let Some(session) = self.floating.end_move() else {
            return false;
        };
        if self.attach(session.window, None, host) {
            return true;
        }
        warn!(window = %session.window, "could not re-tile moved window, stacking it");
        if let Some((workspace, layout)) = self.window_layout_mut(session.window) {
            layout.set_floating_reason(session.window, FloatingReason::Stacking);
            self.float_above(workspace, session.window, host);
        }
        false
    }

    /// Floats a tiled window as stacking, or tiles a stacking one again. A
    /// window that is being moved stops moving and becomes stacking.
    pub fn toggle_stacking<H: WindowHost + RenderHost>(
        &mut self,
        window: WindowId,
        host: &mut H,
    ) -> bool {
        match self.placement(window) {
            Some(Placement::Tiled) => self.detach(window, FloatingReason::Stacking, host),
            Some(Placement::Floating(FloatingReason::Moving)) => {
                host.stop_move_session(window);
                self.floating.cancel_move(window);
                let Some((workspace, layout)) = self.window_layout_mut(window) else {
                    return false;
                };
                layout.set_floating_reason(window, FloatingReason::Stacking);
                self.float_above(workspace, window, host);
                true
            }
            Some(Placement::Floating(FloatingReason::Stacking)) => self.attach(window, None, host),
            None => false,
        }
    }

    /// Moves the boundary next to the active window of the current
    /// workspace to `cursor`.
    pub fn resize(&mut self, cursor: Point, host: &mut dyn WindowHost) -> bool {
        let workspace = self.current;
        let Some(layout) = self.layout_mut(workspace) else {
            return false;
        };
        if !layout.resize(cursor) {
            return false;
        }
        self.recalculate_logged(workspace, host);
        true
    }

    pub fn set_active(&mut self, window: WindowId) -> bool {
        let Some((_, layout)) = self.window_layout_mut(window) else {
            return false;
        };
        let tiled = layout.set_active(window);
        self.focused_window = Some(window);
        tiled
    }

    /// The tiled window of the current workspace under `point`.
    pub fn window_at(&self, point: Point) -> Option<WindowId> {
        self.layout(self.current)?.window_at(point)
    }

    fn window_created<H: WindowHost + RenderHost>(
        &mut self,
        window: WindowId,
        host: &mut H,
    ) -> EventResponse {
        let workspace = self.current;
        if self.insert(workspace, window, host) {
            self.recalculate_logged(workspace, host);
        } else if self.window_workspace.contains_key(&window) {
            return EventResponse::default();
        } else {
            let Some(layout) = self.layout_mut(workspace) else {
                return EventResponse::default();
            };
            if !layout.add_floating(window, FloatingReason::Stacking) {
                return EventResponse::default();
            }
            info!(%window, workspace, "no room to tile window, stacking it");
            self.window_workspace.insert(window, workspace);
            self.float_above(workspace, window, host);
        }
        self.focused_window = Some(window);
        self.broadcast_windows_changed(workspace);
        EventResponse {
            raise_windows: vec![window],
            focus_window: Some(window),
            ..Default::default()
        }
    }

    pub fn handle_event<H: WindowHost + RenderHost>(
        &mut self,
        event: LayoutEvent,
        host: &mut H,
    ) -> EventResponse {
        debug!(?event);
        let response = match event {
            LayoutEvent::WindowCreated(window) => self.window_created(window, host),
            LayoutEvent::WindowDestroyed(window) => {
                let workspace = self.workspace_of(window);
                let removal = self.remove(window);
                if let Some(workspace) = workspace.filter(|_| removal.succeeded()) {
                    self.recalculate_logged(workspace, host);
                    self.broadcast_windows_changed(workspace);
                }
                EventResponse {
                    focus_window: removal.focus(),
                    ..Default::default()
                }
            }
            LayoutEvent::WindowFocused(window) => {
                if self.set_active(window) || self.placement(window).is_some() {
                    EventResponse {
                        focus_window: Some(window),
                        ..Default::default()
                    }
                } else {
                    EventResponse::default()
                }
            }
            LayoutEvent::PointerMoved(point) => {
                if self.floating.moving().is_none()
                    && let Some(window) = self.window_at(point)
                {
                    _ = self.set_active(window);
                }
                EventResponse::default()
            }
            LayoutEvent::PointerButton { pressed } => {
                if !pressed && self.floating.moving().is_some() {
                    let window = self.moving_window();
                    self.end_move(host);
                    EventResponse {
                        focus_window: window,
                        ..Default::default()
                    }
                } else {
                    EventResponse::default()
                }
            }
            LayoutEvent::Command(command) => self.handle_command(command, host),
        };
        self.debug_tree(self.current);
        response
    }

    pub fn handle_command<H: WindowHost + RenderHost>(
        &mut self,
        command: LayoutCommand,
        host: &mut H,
    ) -> EventResponse {
        match command {
            LayoutCommand::ToggleFloating => {
                let Some(window) = self.focused_window.or_else(|| {
                    self.layout(self.current).and_then(|layout| layout.active_window())
                }) else {
                    return EventResponse::default();
                };
                if !self.toggle_stacking(window, host) {
                    return EventResponse::default();
                }
                let floating = self.placement(window).is_some_and(Placement::is_floating);
                self.broadcast_windows_changed(self.current);
                EventResponse {
                    raise_windows: if floating { vec![window] } else { vec![] },
                    focus_window: Some(window),
                    ..Default::default()
                }
            }
            LayoutCommand::SwitchToWorkspace(workspace) => {
                match self.switch_workspace(workspace, host) {
                    Ok(true) => EventResponse {
                        focus_window: self.focused_window,
                        workspace_changed_to: Some(workspace),
                        ..Default::default()
                    },
                    Ok(false) => EventResponse::default(),
                    Err(e) => {
                        warn!("Cannot switch workspace: {e}");
                        EventResponse::default()
                    }
                }
            }
            LayoutCommand::ResizeTo(cursor) => {
                _ = self.resize(cursor, host);
                EventResponse::default()
            }
            LayoutCommand::BeginMove(window) => {
                if self.begin_move(window, host) {
                    EventResponse {
                        raise_windows: vec![window],
                        ..Default::default()
                    }
                } else {
                    EventResponse::default()
                }
            }
            LayoutCommand::EndMove => {
                let window = self.moving_window();
                if self.end_move(host) {
                    EventResponse {
                        focus_window: window,
                        ..Default::default()
                    }
                } else {
                    EventResponse::default()
                }
            }
        }
    }

    /// The broadcast channel, if someone is still listening on it.
    fn listener(&self) -> Option<&BroadcastSender> {
        self.broadcast_tx.as_ref().filter(|tx| !tx.is_closed())
    }

    pub fn broadcast_workspace_changed(&self) {
        if let Some(broadcast_tx) = self.listener() {
            broadcast_tx.send(BroadcastEvent::WorkspaceChanged {
                workspace: self.current,
                workspace_name: self.workspace_name(self.current).unwrap_or_default().to_string(),
            });
        }
    }

    pub fn broadcast_windows_changed(&self, workspace: usize) {
        if let Some(broadcast_tx) = self.listener()
            && let Some(layout) = self.layout(workspace)
        {
            broadcast_tx.send(BroadcastEvent::WindowsChanged {
                workspace,
                workspace_name: self.workspace_name(workspace).unwrap_or_default().to_string(),
                windows: layout.windows(),
            });
        }
    }
}
