use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

/// An identifier representing a window owned by the windowing layer.
///
/// The engine never manages the window itself; it only associates the id
/// with a container. Destroying a container never destroys the window.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(NonZeroU32);

impl WindowId {
    /// Panics if `idx` is zero.
    #[track_caller]
    pub fn new(idx: u32) -> WindowId {
        WindowId(NonZeroU32::new(idx).expect("window ids start at 1"))
    }

    pub fn get(self) -> u32 { self.0.get() }
}

impl std::fmt::Display for WindowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "window#{}", self.0)
    }
}
