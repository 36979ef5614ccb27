use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use tracing::{debug, error, trace};

use super::{LayoutSystem, Removal, TileSettings};
use crate::common::collections::HashMap;
use crate::layout_engine::{
    Container, ContainerId, ContainerKind, FloatingReason, Orientation, Parent, Placement,
};
use crate::model::WindowId;
use crate::sys::geometry::{Point, Rect};
use crate::sys::host::WindowHost;

const MIN_RATIO: f32 = 0.05;
const MAX_RATIO: f32 = 0.95;

/// Binary split tiling. Every container of the workspace lives in one arena;
/// tree links are arena keys.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct DynamicLayoutSystem {
    containers: SlotMap<ContainerId, Container>,
    root: Option<ContainerId>,
    window_to_container: HashMap<WindowId, ContainerId>,
    live_count: usize,
    active: Option<ContainerId>,
    settings: TileSettings,
}

impl DynamicLayoutSystem {
    pub fn new(settings: TileSettings) -> Self { Self { settings, ..Default::default() } }

    pub fn root(&self) -> Option<ContainerId> { self.root }

    pub fn container(&self, id: ContainerId) -> Option<&Container> { self.containers.get(id) }

    pub fn container_of(&self, window: WindowId) -> Option<ContainerId> {
        self.window_to_container.get(&window).copied()
    }

    fn preorder(&self) -> impl Iterator<Item = ContainerId> + '_ {
        let mut stack: Vec<ContainerId> = self.root.into_iter().collect();
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            if let Some((first, second)) = self.containers.get(node).and_then(Container::children)
            {
                stack.push(second);
                stack.push(first);
            }
            Some(node)
        })
    }

    /// Whether `target` is linked anywhere in the tree.
    pub fn contains(&self, target: ContainerId) -> bool { self.preorder().any(|n| n == target) }

    /// Replaces the leaf `target` with a new split holding `target` and `new`.
    ///
    /// `reference` decides the child order: when it lies before the split
    /// point of `target`'s cached geometry, `new` becomes the first child.
    /// Without cached geometry `new` is always first.
    pub fn insert_container(
        &mut self,
        new: ContainerId,
        target: ContainerId,
        orientation: Orientation,
        ratio: f32,
        reference: Point,
    ) -> bool {
        if new == target {
            debug!(?new, "refusing to split a container with itself");
            return false;
        }
        if !(ratio.is_finite() && (0.0..1.0).contains(&ratio)) {
            debug!(ratio, "refusing to split with an invalid ratio");
            return false;
        }
        let Some(target_node) = self.containers.get(target) else {
            return false;
        };
        if !target_node.is_leaf() {
            debug!(?target, "cannot split on top of a split container");
            return false;
        }
        let Some(parent) = target_node.parent else {
            debug!(?target, "split target is not part of the tree");
            return false;
        };
        if !self.containers.get(new).is_some_and(Container::is_leaf) {
            return false;
        }
        if self.contains(new) {
            debug!(?new, "container is already part of the tree");
            return false;
        }

        let geometry = target_node.geometry;
        let new_first = match geometry {
            Some(geometry) => {
                let split_point = geometry.origin_along(orientation) as f64
                    + geometry.extent(orientation) as f64 * ratio as f64;
                reference.along(orientation) < split_point
            }
            None => true,
        };
        let (first, second) = if new_first { (new, target) } else { (target, new) };

        let mut split = Container::split(orientation, ratio, first, second);
        split.parent = Some(parent);
        split.geometry = geometry;
        let split = self.containers.insert(split);

        self.replace_in_parent(parent, target, split);
        self.containers[target].parent = Some(Parent::Split(split));
        let leaf = &mut self.containers[new];
        leaf.parent = Some(Parent::Split(split));
        leaf.set_floating(None);

        self.live_count += 2;
        true
    }

    /// Makes `new` the sole content of an empty tree.
    pub fn insert_into_empty(&mut self, new: ContainerId) -> bool {
        if self.root.is_some() {
            return false;
        }
        let Some(leaf) = self.containers.get_mut(new) else {
            return false;
        };
        if !leaf.is_leaf() || leaf.parent.is_some() {
            return false;
        }
        leaf.parent = Some(Parent::Root);
        leaf.set_floating(None);
        self.root = Some(new);
        self.live_count += 1;
        true
    }

    fn replace_in_parent(&mut self, parent: Parent, old: ContainerId, new: ContainerId) {
        match parent {
            Parent::Root => self.root = Some(new),
            Parent::Split(split) => {
                self.containers[split].replace_child(old, new);
            }
        }
    }

    fn first_leaf(&self, mut node: ContainerId) -> ContainerId {
        while let Some((first, _)) = self.containers.get(node).and_then(Container::children) {
            node = first;
        }
        node
    }

    /// Takes `leaf` out of the tree, promoting its sibling into the place of
    /// their parent split. The leaf itself stays in the arena, detached.
    fn unlink(&mut self, leaf: ContainerId) -> Removal {
        let Some(parent) = self.containers.get(leaf).and_then(|c| c.parent) else {
            return Removal::NotFound;
        };

        let focus = match parent {
            Parent::Root => {
                self.root = None;
                self.live_count = self.live_count.saturating_sub(1);
                None
            }
            Parent::Split(split) => {
                let split_node = &self.containers[split];
                let (Some(sibling), Some(grandparent)) =
                    (split_node.sibling_of(leaf), split_node.parent)
                else {
                    error!(?leaf, ?split, "parent split is not linked correctly");
                    return Removal::NotFound;
                };
                self.replace_in_parent(grandparent, split, sibling);
                self.containers[sibling].parent = Some(grandparent);
                self.containers.remove(split);
                self.live_count = self.live_count.saturating_sub(2);
                Some(self.first_leaf(sibling))
            }
        };

        self.containers[leaf].parent = None;
        if self.active == Some(leaf) {
            self.active = focus;
        }

        match focus.and_then(|f| self.containers.get(f)).and_then(Container::window) {
            Some(window) => Removal::Focus(window),
            None => Removal::Emptied,
        }
    }

    /// Pre-order hit test over cached geometry.
    ///
    /// If no leaf matches, the last container visited is returned instead of
    /// nothing; this only happens while the tree and its cached geometry
    /// disagree.
    pub fn container_at(&self, point: Point) -> Option<ContainerId> {
        let mut last = None;
        for node in self.preorder() {
            if self.leaf_hit(node, point) {
                return Some(node);
            }
            last = Some(node);
        }
        last
    }

    fn leaf_at(&self, point: Point) -> Option<ContainerId> {
        self.preorder().find(|&node| self.leaf_hit(node, point))
    }

    fn leaf_hit(&self, node: ContainerId, point: Point) -> bool {
        let container = &self.containers[node];
        container.is_leaf() && container.geometry.is_some_and(|g| g.contains(point))
    }

    /// Wider-than-tall targets split side by side, using the window's
    /// on-screen size when the host knows it.
    fn split_orientation(&self, target: ContainerId, host: &dyn WindowHost) -> Orientation {
        let container = &self.containers[target];
        container
            .window()
            .and_then(|window| host.window_size(window))
            .or_else(|| container.geometry.map(|g| g.size()))
            .map(Orientation::for_size)
            .unwrap_or(Orientation::Horizontal)
    }

    /// Resolves a target for `leaf` and links it into the tree.
    fn place(&mut self, leaf: ContainerId, host: &dyn WindowHost) -> bool {
        let pointer = host.pointer_position();
        let ratio = self.settings.default_ratio;

        if let Some(target) = self.leaf_at(pointer).filter(|&t| t != leaf) {
            let orientation = self.split_orientation(target, host);
            trace!(?target, ?orientation, "placing under pointer");
            return self.insert_container(leaf, target, orientation, ratio, pointer);
        }
        if self.root.is_none() {
            return self.insert_into_empty(leaf);
        }
        if let Some(active) = self.active.filter(|&a| a != leaf && self.contains(a)) {
            let orientation = self.split_orientation(active, host);
            trace!(container = ?active, ?orientation, "placing next to active container");
            return self.insert_container(leaf, active, orientation, ratio, pointer);
        }

        debug!(?leaf, "no insertion target");
        false
    }

    fn register(&mut self, window: WindowId) -> ContainerId {
        let leaf = self.containers.insert(Container::leaf(window));
        self.window_to_container.insert(window, leaf);
        leaf
    }

    fn unregister(&mut self, window: WindowId, leaf: ContainerId) {
        self.containers.remove(leaf);
        self.window_to_container.remove(&window);
    }

    /// The registered leaf of `window` if it is floating.
    fn floating_leaf(&self, window: WindowId) -> Option<ContainerId> {
        let leaf = self.container_of(window)?;
        let container = &self.containers[leaf];
        (container.parent.is_none() && container.floating().is_some()).then_some(leaf)
    }

    fn reflow_node(
        &mut self,
        node: ContainerId,
        area: Rect,
        host: &mut dyn WindowHost,
        visited: &mut usize,
    ) {
        let Some(container) = self.containers.get_mut(node) else {
            return;
        };
        container.geometry = Some(area);
        *visited += 1;

        match container.kind {
            ContainerKind::Leaf { window, .. } => {
                trace!(%window, ?area, "leaf geometry");
                if host.is_mapped(window) {
                    let frame = self.settings.window_frame(area);
                    host.set_position(window, frame.x, frame.y);
                    host.set_size(window, frame.width, frame.height);
                }
            }
            ContainerKind::Split { orientation, ratio, first, second } => {
                let (first_area, second_area) = area.split(orientation, ratio);
                self.reflow_node(first, first_area, host, visited);
                self.reflow_node(second, second_area, host, visited);
            }
        }
    }
}

impl LayoutSystem for DynamicLayoutSystem {
    fn draw_tree(&self) -> String {
        fn write_node(
            this: &DynamicLayoutSystem,
            node: ContainerId,
            out: &mut String,
            indent: usize,
        ) {
            for _ in 0..indent {
                out.push_str("  ");
            }
            match this.containers.get(node).map(|c| c.kind) {
                Some(ContainerKind::Leaf { window, .. }) => {
                    out.push_str(&format!("Leaf {window}\n"));
                }
                Some(ContainerKind::Split { orientation, ratio, first, second }) => {
                    out.push_str(&format!("Split {:?} {:.2}\n", orientation, ratio));
                    write_node(this, first, out, indent + 1);
                    write_node(this, second, out, indent + 1);
                }
                None => {}
            }
        }

        let mut s = String::new();
        match self.root {
            Some(root) => write_node(self, root, &mut s, 0),
            None => s.push_str("<empty>\n"),
        }
        for container in self.containers.values() {
            if let (Some(window), Some(reason)) = (container.window(), container.floating()) {
                s.push_str(&format!("Floating {window} {:?}\n", reason));
            }
        }
        s
    }

    fn insert(&mut self, window: WindowId, host: &dyn WindowHost) -> bool {
        if self.window_to_container.contains_key(&window) {
            debug!(%window, "window is already registered");
            return false;
        }
        let leaf = self.register(window);
        if self.place(leaf, host) {
            self.active = Some(leaf);
            true
        } else {
            self.unregister(window, leaf);
            false
        }
    }

    fn insert_at(
        &mut self,
        window: WindowId,
        target: WindowId,
        orientation: Orientation,
        ratio: f32,
        reference: Point,
    ) -> bool {
        let Some(target) = self.container_of(target) else {
            debug!(%window, "insert target is not registered");
            return false;
        };
        let (leaf, created) = match self.container_of(window) {
            Some(existing) => (existing, false),
            None => (self.register(window), true),
        };
        if self.insert_container(leaf, target, orientation, ratio, reference) {
            self.active = Some(leaf);
            true
        } else {
            if created {
                self.unregister(window, leaf);
            }
            false
        }
    }

    fn remove(&mut self, window: WindowId) -> Removal {
        let Some(leaf) = self.container_of(window) else {
            return Removal::NotFound;
        };
        let removal = self.unlink(leaf);
        if removal.succeeded() {
            self.unregister(window, leaf);
        } else {
            debug!(%window, "window is not tiled");
        }
        removal
    }

    fn detach(&mut self, window: WindowId, reason: FloatingReason) -> bool {
        let Some(leaf) = self.container_of(window) else {
            return false;
        };
        if !self.unlink(leaf).succeeded() {
            debug!(%window, "window is not tiled, nothing to detach");
            return false;
        }
        self.containers[leaf].set_floating(Some(reason));
        true
    }

    fn attach(
        &mut self,
        window: WindowId,
        target: Option<WindowId>,
        host: &dyn WindowHost,
    ) -> bool {
        let Some(leaf) = self.floating_leaf(window) else {
            debug!(%window, "window is not floating, nothing to attach");
            return false;
        };
        match target {
            Some(target) => {
                let Some(target) = self.container_of(target) else {
                    return false;
                };
                let orientation = self.split_orientation(target, host);
                let ratio = self.settings.default_ratio;
                if !self.insert_container(leaf, target, orientation, ratio, host.pointer_position())
                {
                    return false;
                }
            }
            None => {
                if !self.place(leaf, host) {
                    return false;
                }
            }
        }
        self.active = Some(leaf);
        true
    }

    fn add_floating(&mut self, window: WindowId, reason: FloatingReason) -> bool {
        if self.window_to_container.contains_key(&window) {
            return false;
        }
        let leaf = self.register(window);
        self.containers[leaf].set_floating(Some(reason));
        true
    }

    fn set_floating_reason(&mut self, window: WindowId, reason: FloatingReason) -> bool {
        let Some(leaf) = self.floating_leaf(window) else {
            return false;
        };
        self.containers[leaf].set_floating(Some(reason));
        true
    }

    fn forget(&mut self, window: WindowId) -> bool {
        let Some(leaf) = self.floating_leaf(window) else {
            return false;
        };
        self.unregister(window, leaf);
        true
    }

    fn reflow(&mut self, area: Rect, host: &mut dyn WindowHost) -> bool {
        let mut visited = 0;
        if let Some(root) = self.root {
            self.reflow_node(root, area, host, &mut visited);
        }

        let live = self.live_count;
        debug!(visited, live, "reflow finished");
        if visited != live {
            error!(visited, live, "count of reflowed containers differs from live containers");
            return false;
        }
        true
    }

    fn resize(&mut self, cursor: Point) -> bool {
        let Some(active) = self.active else {
            return false;
        };
        let Some(Parent::Split(split)) = self.containers.get(active).and_then(|c| c.parent) else {
            debug!("active container has no parent split to resize");
            return false;
        };
        let container = &mut self.containers[split];
        let Some(geometry) = container.geometry else {
            return false;
        };
        let ContainerKind::Split { orientation, ratio, .. } = &mut container.kind else {
            return false;
        };
        let extent = geometry.extent(*orientation);
        if extent <= 0 {
            return false;
        }

        let offset = cursor.along(*orientation) - geometry.origin_along(*orientation) as f64;
        *ratio = ((offset / extent as f64) as f32).clamp(MIN_RATIO, MAX_RATIO);
        trace!(?split, ratio = *ratio, "resized split");
        true
    }

    fn set_active(&mut self, window: WindowId) -> bool {
        match self.container_of(window) {
            Some(leaf) if self.containers[leaf].parent.is_some() => {
                self.active = Some(leaf);
                true
            }
            _ => false,
        }
    }

    fn active_window(&self) -> Option<WindowId> {
        self.active.and_then(|a| self.containers.get(a)).and_then(Container::window)
    }

    fn contains_window(&self, window: WindowId) -> bool {
        self.container_of(window).is_some_and(|leaf| self.containers[leaf].parent.is_some())
    }

    fn placement(&self, window: WindowId) -> Option<Placement> {
        let leaf = self.container_of(window)?;
        Some(match self.containers[leaf].floating() {
            Some(reason) => Placement::Floating(reason),
            None => Placement::Tiled,
        })
    }

    fn window_at(&self, point: Point) -> Option<WindowId> {
        self.leaf_at(point).and_then(|leaf| self.containers[leaf].window())
    }

    fn tiled_windows(&self) -> Vec<WindowId> {
        self.preorder().filter_map(|node| self.containers[node].window()).collect()
    }

    fn floating_windows(&self) -> Vec<WindowId> {
        self.containers
            .values()
            .filter(|c| c.floating().is_some())
            .filter_map(Container::window)
            .collect()
    }

    fn geometry_of(&self, window: WindowId) -> Option<Rect> {
        self.container_of(window).and_then(|leaf| self.containers[leaf].geometry)
    }

    fn live_count(&self) -> usize { self.live_count }
}
