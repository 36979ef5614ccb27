pub mod container;
pub mod engine;
mod error;
mod floating;
pub(crate) mod graph;
pub mod systems;
mod workspaces;

pub use container::{Container, ContainerId, ContainerKind, FloatingReason, Parent, Placement};
pub use engine::{EventResponse, LayoutCommand, LayoutEngine, LayoutEvent};
pub use error::LayoutError;
pub(crate) use floating::FloatingManager;
pub use floating::MoveSession;
pub use graph::Orientation;
pub use systems::{
    DynamicLayoutSystem, GridLayoutSystem, LayoutSystem, LayoutSystemKind, Removal, TileSettings,
};
pub(crate) use workspaces::WorkspaceLayouts;
pub use workspaces::{WORKSPACES, Workspace};

#[cfg(test)]
mod tests;
