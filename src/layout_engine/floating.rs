use serde::{Deserialize, Serialize};

use crate::common::collections::BTreeMap;
use crate::model::WindowId;

/// An interactive drag of a window that was detached from its tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveSession {
    pub window: WindowId,
    pub workspace: usize,
}

/// Tracks the move session and the stacking order of floating windows.
///
/// Each workspace keeps its own order, bottom to top.
#[derive(Serialize, Deserialize, Default, Debug)]
pub(crate) struct FloatingManager {
    moving: Option<MoveSession>,
    stacks: BTreeMap<usize, Vec<WindowId>>,
}

impl FloatingManager {
    pub(crate) fn new() -> Self { Self::default() }

    pub(crate) fn moving(&self) -> Option<MoveSession> { self.moving }

    pub(crate) fn is_moving(&self, window: WindowId) -> bool {
        self.moving.is_some_and(|s| s.window == window)
    }

    /// Starts a session, returning the one it replaced.
    pub(crate) fn begin_move(&mut self, window: WindowId, workspace: usize) -> Option<MoveSession> {
        self.moving.replace(MoveSession { window, workspace })
    }

    pub(crate) fn end_move(&mut self) -> Option<MoveSession> { self.moving.take() }

    /// Drops the session if it belongs to `window`.
    pub(crate) fn cancel_move(&mut self, window: WindowId) -> bool {
        if self.is_moving(window) {
            self.moving = None;
            true
        } else {
            false
        }
    }

    /// Puts `window` on top of its workspace's stacking order.
    pub(crate) fn raise(&mut self, workspace: usize, window: WindowId) {
        let stack = self.stacks.entry(workspace).or_default();
        stack.retain(|&w| w != window);
        stack.push(window);
    }

    /// Forgets `window` everywhere, including an active move session.
    pub(crate) fn remove(&mut self, window: WindowId) {
        for stack in self.stacks.values_mut() {
            stack.retain(|&w| w != window);
        }
        self.stacks.retain(|_, stack| !stack.is_empty());
        self.cancel_move(window);
    }

    pub(crate) fn stack(&self, workspace: usize) -> &[WindowId] {
        self.stacks.get(&workspace).map(Vec::as_slice).unwrap_or_default()
    }
}
