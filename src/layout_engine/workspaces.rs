use serde::{Deserialize, Serialize};

use super::LayoutSystemKind;
use crate::common::config::Config;

/// Number of independent workspaces.
pub const WORKSPACES: usize = 10;

#[derive(Serialize, Deserialize, Debug)]
pub struct Workspace {
    pub name: String,
    pub layout: LayoutSystemKind,
}

/// One layout per workspace, each with the strategy configured for it.
#[derive(Serialize, Deserialize, Debug)]
pub(crate) struct WorkspaceLayouts {
    workspaces: [Workspace; WORKSPACES],
}

impl WorkspaceLayouts {
    pub(crate) fn new(config: &Config) -> Self {
        let workspaces = std::array::from_fn(|index| {
            let mode = config.mode_for(index);
            tracing::debug!(index, ?mode, "creating workspace layout");
            Workspace {
                name: config.workspaces.name(index),
                layout: LayoutSystemKind::new(mode, &config.layout),
            }
        });
        WorkspaceLayouts { workspaces }
    }

    pub(crate) fn get(&self, index: usize) -> Option<&Workspace> { self.workspaces.get(index) }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Workspace> {
        self.workspaces.get_mut(index)
    }

    pub(crate) fn len(&self) -> usize { self.workspaces.len() }
}
