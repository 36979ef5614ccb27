//! The tree node type shared by every workspace tree.

use serde::{Deserialize, Serialize};

use crate::layout_engine::Orientation;
use crate::model::WindowId;
use crate::sys::geometry::Rect;

slotmap::new_key_type! { pub struct ContainerId; }

/// Why a leaf is currently outside its workspace tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FloatingReason {
    /// Temporarily detached while following the pointer.
    Moving,
    /// Explicitly floated above the tiled layer.
    Stacking,
}

/// Where a registered window currently lives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    Tiled,
    Floating(FloatingReason),
}

impl Placement {
    pub fn is_floating(self) -> bool { matches!(self, Placement::Floating(_)) }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum ContainerKind {
    Leaf {
        window: WindowId,
        floating: Option<FloatingReason>,
    },
    /// Owns exactly two children. `ratio` is the first child's share of the
    /// split axis; the second child always receives the remainder.
    Split {
        orientation: Orientation,
        ratio: f32,
        first: ContainerId,
        second: ContainerId,
    },
}

/// Non-owning back reference to whatever holds a container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Parent {
    /// The container is the workspace root's content.
    Root,
    Split(ContainerId),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub kind: ContainerKind,
    /// `None` while the container is not linked into a tree.
    pub parent: Option<Parent>,
    /// Last rectangle assigned by reflow. Stale between reflows.
    pub geometry: Option<Rect>,
}

impl Container {
    pub fn leaf(window: WindowId) -> Self {
        Container {
            kind: ContainerKind::Leaf { window, floating: None },
            parent: None,
            geometry: None,
        }
    }

    pub fn split(
        orientation: Orientation,
        ratio: f32,
        first: ContainerId,
        second: ContainerId,
    ) -> Self {
        Container {
            kind: ContainerKind::Split { orientation, ratio, first, second },
            parent: None,
            geometry: None,
        }
    }

    pub fn window(&self) -> Option<WindowId> {
        match self.kind {
            ContainerKind::Leaf { window, .. } => Some(window),
            ContainerKind::Split { .. } => None,
        }
    }

    pub fn is_leaf(&self) -> bool { matches!(self.kind, ContainerKind::Leaf { .. }) }

    pub fn floating(&self) -> Option<FloatingReason> {
        match self.kind {
            ContainerKind::Leaf { floating, .. } => floating,
            ContainerKind::Split { .. } => None,
        }
    }

    pub fn set_floating(&mut self, reason: Option<FloatingReason>) {
        if let ContainerKind::Leaf { floating, .. } = &mut self.kind {
            *floating = reason;
        }
    }

    pub fn children(&self) -> Option<(ContainerId, ContainerId)> {
        match self.kind {
            ContainerKind::Split { first, second, .. } => Some((first, second)),
            ContainerKind::Leaf { .. } => None,
        }
    }

    /// Points whichever child slot currently holds `old` at `new`.
    /// Returns false if `old` is not a child of this container.
    pub fn replace_child(&mut self, old: ContainerId, new: ContainerId) -> bool {
        match &mut self.kind {
            ContainerKind::Split { first, .. } if *first == old => {
                *first = new;
                true
            }
            ContainerKind::Split { second, .. } if *second == old => {
                *second = new;
                true
            }
            _ => false,
        }
    }

    /// The other child of this split, given one of them.
    pub fn sibling_of(&self, child: ContainerId) -> Option<ContainerId> {
        let (first, second) = self.children()?;
        if first == child {
            Some(second)
        } else if second == child {
            Some(first)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use slotmap::SlotMap;

    use super::*;

    #[test]
    fn leaf_starts_detached_and_tiled() {
        let leaf = Container::leaf(WindowId::new(1));
        assert_eq!(leaf.window(), Some(WindowId::new(1)));
        assert_eq!(leaf.parent, None);
        assert_eq!(leaf.floating(), None);
        assert!(leaf.children().is_none());
    }

    #[test]
    fn split_tracks_children() {
        let mut arena = SlotMap::<ContainerId, Container>::with_key();
        let a = arena.insert(Container::leaf(WindowId::new(1)));
        let b = arena.insert(Container::leaf(WindowId::new(2)));
        let c = arena.insert(Container::leaf(WindowId::new(3)));

        let mut split = Container::split(Orientation::Horizontal, 0.5, a, b);
        assert_eq!(split.window(), None);
        assert_eq!(split.sibling_of(a), Some(b));
        assert_eq!(split.sibling_of(c), None);

        assert!(split.replace_child(b, c));
        assert_eq!(split.children(), Some((a, c)));
        assert!(!split.replace_child(b, a));
    }

    #[test]
    fn floating_reason_only_applies_to_leaves() {
        let mut arena = SlotMap::<ContainerId, Container>::with_key();
        let a = arena.insert(Container::leaf(WindowId::new(1)));
        let b = arena.insert(Container::leaf(WindowId::new(2)));

        let mut split = Container::split(Orientation::Vertical, 0.5, a, b);
        split.set_floating(Some(FloatingReason::Stacking));
        assert_eq!(split.floating(), None);

        let mut leaf = Container::leaf(WindowId::new(1));
        leaf.set_floating(Some(FloatingReason::Moving));
        assert_eq!(leaf.floating(), Some(FloatingReason::Moving));
    }
}
