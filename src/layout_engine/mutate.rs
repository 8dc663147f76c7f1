//! Structural edits. Each operation either applies completely or leaves the
//! tree untouched and reports the refusal through its return value.

use tracing::debug;

use crate::common::config::TilingConfig;
use crate::layout_engine::container::Container;
use crate::layout_engine::graph::{Orientation, Rotation};
use crate::layout_engine::tree::{Leaf, LeafKind, LayoutTree, NodeKind};
use crate::model::stack::{EntryId, StackId};
use crate::model::tree::NodeId;
use crate::model::window::WindowId;

impl LayoutTree {
    /// Turns leaf `node` into a split whose children are the leaf's previous
    /// contents and a new leaf holding `window` (None leaves a pseudo slot).
    ///
    /// The previous contents go to the first child unless
    /// `spawn_as_left_child` is set. Returns the new leaf. Passing no
    /// orientation clears the whole tree when `node` is the root and is
    /// refused anywhere else.
    pub fn create_leaf_pair(
        &mut self,
        node: NodeId,
        window: Option<WindowId>,
        orientation: Option<Orientation>,
        cfg: &TilingConfig,
    ) -> Option<NodeId> {
        let Some(orientation) = orientation else {
            if self.root == Some(node) {
                debug!("clearing layout");
                self.destroy();
            } else {
                debug!(?node, "refusing to clear a non-root node");
            }
            return None;
        };
        let Some(NodeKind::Leaf(existing)) = self.kind(node) else {
            debug!(?node, "refusing to split a node that is not a leaf");
            return None;
        };
        let container = self.container(node)?;
        let ratio = cfg.split_ratio;
        let [first, second] = container.split(orientation, ratio, cfg.gap(orientation));

        let fresh = Leaf::Partitioned(window);
        let (left_leaf, right_leaf) = if cfg.spawn_as_left_child {
            (fresh, existing)
        } else {
            (existing, fresh)
        };
        let left = self.make_node(NodeKind::Leaf(left_leaf), first);
        let right = self.make_node(NodeKind::Leaf(right_leaf), second);
        if !self.map.attach_pair(node, left, right) {
            for id in [left, right] {
                self.map.remove_subtree(id);
                self.kind.remove(id);
                self.containers.remove(id);
            }
            return None;
        }
        self.kind.insert(node, NodeKind::Split { orientation, ratio });

        let (kept, added) = if cfg.spawn_as_left_child { (right, left) } else { (left, right) };
        if let Some(marker) = self.pending.remove(node) {
            self.pending.insert(kept, marker);
        }
        if let Leaf::Stacked(stack) = existing
            && let Some(container) = self.container(kept)
        {
            self.stacks.set_container(stack, container);
        }
        debug!(?node, ?orientation, ratio, ?window, "created leaf pair");
        Some(added)
    }

    /// Splits `leaf` along the orientation its rectangle calls for.
    fn split_leaf(
        &mut self,
        leaf: NodeId,
        window: Option<WindowId>,
        cfg: &TilingConfig,
    ) -> Option<NodeId> {
        let rect = self.container(leaf)?.rect;
        self.create_leaf_pair(leaf, window, Some(cfg.orientation_for(rect)), cfg)
    }

    /// Places `window` by splitting the insertion leaf, seeding the root when
    /// the tree is empty.
    pub(super) fn split_insertion_leaf(
        &mut self,
        window: WindowId,
        cfg: &TilingConfig,
    ) -> Option<NodeId> {
        match self.insertion_leaf() {
            Some(leaf) => self.split_leaf(leaf, Some(window), cfg),
            None => {
                let root = self.make_node(
                    NodeKind::Leaf(Leaf::Partitioned(Some(window))),
                    Container::root(self.area),
                );
                self.root = Some(root);
                Some(root)
            }
        }
    }

    /// Adds a window to a partitioned layout. An empty pseudo slot is used
    /// before any leaf is split.
    pub fn insert_window(&mut self, window: WindowId, cfg: &TilingConfig) -> Option<NodeId> {
        if self.contains_window(window) {
            debug!(?window, "window already in layout");
            return None;
        }
        if let Some(slot) = self.first_pseudo_leaf() {
            self.kind.insert(slot, NodeKind::Leaf(Leaf::Partitioned(Some(window))));
            self.pending.remove(slot);
            return Some(slot);
        }
        self.split_insertion_leaf(window, cfg)
    }

    /// Appends a window to the stack at the root of a monocle layout.
    pub fn insert_stacked(&mut self, window: WindowId) -> bool {
        if self.contains_window(window) {
            return false;
        }
        match self.root.and_then(|root| self.leaf(root)) {
            Some(Leaf::Stacked(stack)) => self.stacks.push_back(stack, window).is_some(),
            Some(_) => {
                debug!(?window, "root is not stacked");
                false
            }
            None => {
                let container = Container::root(self.area);
                let Some(stack) = self.stacks.create(&[window], container) else {
                    return false;
                };
                self.root = Some(self.make_node(NodeKind::Leaf(Leaf::Stacked(stack)), container));
                true
            }
        }
    }

    /// Splits a window's leaf into the window and an empty slot.
    pub fn insert_pseudo(&mut self, node: NodeId, cfg: &TilingConfig) -> Option<NodeId> {
        let Some(Leaf::Partitioned(Some(_))) = self.leaf(node) else {
            debug!(?node, "refusing pseudo insert: not a window leaf");
            return None;
        };
        let pseudo = self.split_leaf(node, None, cfg)?;
        debug!(?node, ?pseudo, "inserted pseudo leaf");
        Some(pseudo)
    }

    /// Collapses `node` and its empty sibling back into their parent, which
    /// takes over `node`'s contents. Refused when the sibling is anything but
    /// an empty leaf.
    pub fn remove_pseudo(&mut self, node: NodeId, cfg: &TilingConfig) -> bool {
        if self.leaf(node).is_none() {
            return false;
        }
        let (Some(parent), Some(sibling)) = (node.parent(&self.map), node.sibling(&self.map)) else {
            debug!(?node, "refusing pseudo removal on the root");
            return false;
        };
        if !self.is_pseudo(sibling) {
            debug!(?node, ?sibling, "refusing pseudo removal: sibling is occupied");
            return false;
        }
        self.collapse_into(parent, node, cfg);
        debug!(?node, "removed pseudo leaf");
        true
    }

    /// Replaces `parent` with its child `survivor`, which inherits the
    /// parent's slot and container. The other child is freed.
    fn collapse_into(&mut self, parent: NodeId, survivor: NodeId, cfg: &TilingConfig) {
        let Some([left, right]) = self.map.detach_children(parent) else {
            return;
        };
        let other = if left == survivor { right } else { left };
        if self.root == Some(parent) {
            self.root = Some(survivor);
        } else {
            self.map.replace(parent, survivor);
        }
        if let Some(container) = self.container(parent) {
            self.containers.insert(survivor, container);
        }
        self.discard_subtree(parent);
        self.discard_subtree(other);
        self.recompute_from(survivor, cfg, false);
    }

    /// Exchanges the contents of two leaves. Containers stay in place.
    pub fn swap_nodes(&mut self, a: NodeId, b: NodeId) -> bool {
        if a == b {
            return false;
        }
        let (Some(leaf_a), Some(leaf_b)) = (self.leaf(a), self.leaf(b)) else {
            debug!(?a, ?b, "refusing to swap non-leaf nodes");
            return false;
        };
        self.kind.insert(a, NodeKind::Leaf(leaf_b));
        self.kind.insert(b, NodeKind::Leaf(leaf_a));
        let pending = (self.pending.remove(a), self.pending.remove(b));
        if let Some(marker) = pending.0 {
            self.pending.insert(b, marker);
        }
        if let Some(marker) = pending.1 {
            self.pending.insert(a, marker);
        }
        for node in [a, b] {
            if let Some(Leaf::Stacked(stack)) = self.leaf(node)
                && let Some(container) = self.container(node)
            {
                self.stacks.set_container(stack, container);
            }
        }
        true
    }

    /// Exchanges the windows of two stack entries.
    pub fn swap_entries(&mut self, a: EntryId, b: EntryId) -> bool { self.stacks.swap_windows(a, b) }

    /// Mirrors the layout so it appears turned by `rotation`. Ratios of
    /// swapped splits are inverted so every divider keeps its position.
    pub fn rotate(&mut self, rotation: Rotation, cfg: &TilingConfig) {
        let Some(root) = self.root else { return };
        let splits: Vec<NodeId> = root.traverse_preorder(&self.map).collect();
        for node in splits {
            let Some(NodeKind::Split { orientation, mut ratio }) = self.kind(node) else {
                continue;
            };
            if rotation.swaps(orientation) && self.map.swap_children(node) {
                ratio = 1.0 - ratio;
            }
            let orientation = if rotation.flips_orientation() {
                orientation.flipped()
            } else {
                orientation
            };
            self.kind.insert(node, NodeKind::Split { orientation, ratio });
        }
        debug!(degrees = rotation.degrees(), "rotated layout");
        self.recompute(cfg, false);
    }

    /// Switches a leaf between holding one window and holding a stack.
    /// Unstacking keeps the head in the leaf and splits the rest into it.
    pub fn toggle_leaf_kind(&mut self, node: NodeId, cfg: &TilingConfig) -> bool {
        if self.root == Some(node) && node.is_leaf(&self.map) {
            debug!("refusing to toggle the kind of a single-leaf root");
            return false;
        }
        match self.leaf(node) {
            Some(Leaf::Partitioned(Some(window))) => {
                let Some(container) = self.container(node) else {
                    return false;
                };
                let Some(stack) = self.stacks.create(&[window], container) else {
                    return false;
                };
                self.kind.insert(node, NodeKind::Leaf(Leaf::Stacked(stack)));
                debug!(?node, ?window, "stacked leaf");
                true
            }
            Some(Leaf::Stacked(stack)) => {
                self.unstack(node, stack, cfg);
                true
            }
            other => {
                debug!(?node, ?other, "refusing to toggle leaf kind");
                false
            }
        }
    }

    fn unstack(&mut self, node: NodeId, stack: StackId, cfg: &TilingConfig) {
        let windows = self.stacks.destroy(stack);
        let Some((&head, rest)) = windows.split_first() else {
            self.kind.insert(node, NodeKind::Leaf(Leaf::Partitioned(None)));
            return;
        };
        self.kind.insert(node, NodeKind::Leaf(Leaf::Partitioned(Some(head))));
        for &window in rest {
            if let Some(leaf) = self.insertion_leaf_from(node) {
                self.split_leaf(leaf, Some(window), cfg);
            }
        }
        debug!(?node, windows = windows.len(), "unstacked leaf");
    }

    pub fn set_leaf_kind(&mut self, node: NodeId, kind: LeafKind, cfg: &TilingConfig) -> bool {
        match self.leaf(node) {
            Some(leaf) if leaf.kind() != kind => self.toggle_leaf_kind(node, cfg),
            _ => false,
        }
    }

    /// Flips the orientation of a split, or of a leaf's parent split, and
    /// recomputes that subtree.
    pub fn toggle_split_orientation(&mut self, node: NodeId, cfg: &TilingConfig) -> bool {
        let target = if node.is_leaf(&self.map) { node.parent(&self.map) } else { Some(node) };
        let Some(target) = target else { return false };
        let Some(NodeKind::Split { orientation, ratio }) = self.kind(target) else {
            return false;
        };
        self.kind.insert(target, NodeKind::Split {
            orientation: orientation.flipped(),
            ratio,
        });
        self.recompute_from(target, cfg, false);
        true
    }

    /// Takes a window out of the layout. A tree leaf collapses its parent onto
    /// the sibling; a stack entry is unlinked, and a stack left empty turns
    /// its leaf into a pseudo slot. Removing the last window clears the tree.
    pub fn remove_window(&mut self, window: WindowId, cfg: &TilingConfig) -> bool {
        let removed = if let Some(node) = self.find_node(window) {
            self.remove_leaf(node, cfg)
        } else if let Some(entry) = self.find_entry(window) {
            self.remove_stack_entry(entry)
        } else {
            false
        };
        if removed {
            debug!(?window, "removed window");
            self.clear_if_windowless();
        }
        removed
    }

    pub(super) fn remove_leaf(&mut self, node: NodeId, cfg: &TilingConfig) -> bool {
        if self.leaf(node).is_none() {
            return false;
        }
        match (node.parent(&self.map), node.sibling(&self.map)) {
            (Some(parent), Some(sibling)) => self.collapse_into(parent, sibling, cfg),
            _ => self.destroy(),
        }
        true
    }

    pub(super) fn remove_stack_entry(&mut self, entry: EntryId) -> bool {
        let owner = self.owner_of_entry(entry);
        let Some((_, emptied)) = self.stacks.remove_entry(entry) else {
            return false;
        };
        if emptied && let Some(owner) = owner {
            self.kind.insert(owner, NodeKind::Leaf(Leaf::Partitioned(None)));
        }
        true
    }

    pub(super) fn clear_if_windowless(&mut self) {
        if !self.is_empty() && self.frames().is_empty() {
            self.destroy();
        }
    }
}
