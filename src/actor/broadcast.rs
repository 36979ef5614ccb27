//! Events pushed to the query/event socket.

use serde::{Deserialize, Serialize};

use crate::model::WindowId;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
#[serde(tag = "type")]
pub enum BroadcastEvent {
    WorkspaceChanged {
        workspace: usize,
        workspace_name: String,
    },
    WindowsChanged {
        workspace: usize,
        workspace_name: String,
        windows: Vec<WindowId>,
    },
}

impl BroadcastEvent {
    pub fn to_json(&self) -> serde_json::Result<String> { serde_json::to_string(self) }
}

pub type BroadcastSender = crate::actor::Sender<BroadcastEvent>;
pub type BroadcastReceiver = crate::actor::Receiver<BroadcastEvent>;
