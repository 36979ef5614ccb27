use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("No output bound to workspace {0}")]
    NoOutput(usize),
    #[error("Reflow of workspace {workspace} did not visit all {live} live containers")]
    ReflowMismatch { workspace: usize, live: usize },
    #[error("Workspace {0} does not exist")]
    InvalidWorkspace(usize),
}
