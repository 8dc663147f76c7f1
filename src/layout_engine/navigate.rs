//! Leaf traversal and lookups over a [`LayoutTree`].

use crate::layout_engine::tree::{Leaf, LayoutTree, NodeKind};
use crate::model::stack::EntryId;
use crate::model::tree::{NodeId, Side};
use crate::model::window::WindowId;

/// First or last position inside a subtree: a tree leaf, or the head/tail
/// entry of a stacked leaf.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LeafRef {
    Node(NodeId),
    Entry(EntryId),
}

impl LayoutTree {
    pub fn first_leaf(&self, node: NodeId) -> Option<LeafRef> { self.outermost(node, Side::Left) }

    pub fn last_leaf(&self, node: NodeId) -> Option<LeafRef> { self.outermost(node, Side::Right) }

    fn outermost(&self, node: NodeId, side: Side) -> Option<LeafRef> {
        if !self.map.contains(node) {
            return None;
        }
        let leaf = node.outermost_leaf(&self.map, side);
        match self.leaf(leaf)? {
            Leaf::Stacked(stack) => {
                let entry = match side {
                    Side::Left => self.stacks.head(stack),
                    Side::Right => self.stacks.tail(stack),
                };
                entry.map(LeafRef::Entry)
            }
            Leaf::Partitioned(_) => Some(LeafRef::Node(leaf)),
        }
    }

    /// The in-order successor leaf, or None at the right edge of the tree.
    pub fn nearest_right(&self, node: NodeId) -> Option<NodeId> { node.next_leaf(&self.map) }

    /// The in-order predecessor leaf, or None at the left edge of the tree.
    pub fn nearest_left(&self, node: NodeId) -> Option<NodeId> { node.prev_leaf(&self.map) }

    /// A left child's right neighbour, otherwise the left neighbour.
    pub fn nearest_leaf_neighbour(&self, node: NodeId) -> Option<NodeId> {
        if !node.is_leaf(&self.map) {
            return None;
        }
        if self.is_left_child(node) {
            self.nearest_right(node)
        } else {
            self.nearest_left(node)
        }
    }

    pub fn is_left_child(&self, node: NodeId) -> bool {
        node.is_leaf(&self.map) && node.side(&self.map) == Some(Side::Left)
    }

    pub fn is_right_child(&self, node: NodeId) -> bool {
        node.is_leaf(&self.map) && node.side(&self.map) == Some(Side::Right)
    }

    pub fn is_pseudo(&self, node: NodeId) -> bool { self.leaf(node).is_some_and(Leaf::is_pseudo) }

    /// The partitioned leaf holding `window`.
    pub fn find_node(&self, window: WindowId) -> Option<NodeId> {
        self.leaves().into_iter().find(|&n| self.leaf(n) == Some(Leaf::Partitioned(Some(window))))
    }

    /// The stack entry holding `window`, searching stacked leaves in order.
    pub fn find_entry(&self, window: WindowId) -> Option<EntryId> {
        self.leaves().into_iter().find_map(|n| match self.leaf(n)? {
            Leaf::Stacked(stack) => self.stacks.find(stack, window),
            Leaf::Partitioned(_) => None,
        })
    }

    /// The leaf whose stack contains `entry`.
    pub fn owner_of_entry(&self, entry: EntryId) -> Option<NodeId> {
        let stack = self.stacks.entry(entry)?.stack();
        self.leaves().into_iter().find(|&n| self.leaf(n) == Some(Leaf::Stacked(stack)))
    }

    /// Tree leaves first, then the leaf owning a matching stack entry.
    pub fn find_node_or_owner(&self, window: WindowId) -> Option<NodeId> {
        self.find_node(window)
            .or_else(|| self.find_entry(window).and_then(|e| self.owner_of_entry(e)))
    }

    pub fn contains_window(&self, window: WindowId) -> bool {
        self.find_node_or_owner(window).is_some()
    }

    pub fn first_pseudo_leaf(&self) -> Option<NodeId> {
        self.leaves().into_iter().find(|&n| self.is_pseudo(n))
    }

    /// Where the next window goes: from the root, step right while the left
    /// child is a leaf, otherwise step left, until reaching a leaf.
    pub fn insertion_leaf(&self) -> Option<NodeId> { self.insertion_leaf_from(self.root?) }

    pub(super) fn insertion_leaf_from(&self, top: NodeId) -> Option<NodeId> {
        if !self.map.contains(top) {
            return None;
        }
        let mut node = top;
        while let Some(NodeKind::Split { .. }) = self.kind(node) {
            let [left, right] = node.children(&self.map)?;
            node = if left.is_leaf(&self.map) { right } else { left };
        }
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::config::TilingConfig;
    use crate::layout_engine::graph::LayoutMode;
    use crate::model::geometry::Rect;

    fn w(idx: u32) -> WindowId { WindowId::new(idx) }

    fn build(windows: &[WindowId]) -> LayoutTree {
        LayoutTree::build(
            LayoutMode::Bsp,
            Rect::new(0.0, 0.0, 1000.0, 1000.0),
            windows,
            &TilingConfig::default(),
        )
    }

    mod traversal {
        use pretty_assertions::assert_eq;

        use super::*;

        #[test]
        fn nearest_left_and_right() {
            let tree = build(&[w(1), w(2), w(3), w(4)]);
            let leaves = tree.leaves();
            assert_eq!(leaves.len(), 4);
            assert_eq!(tree.nearest_left(leaves[0]), None);
            assert_eq!(tree.nearest_right(leaves[3]), None);
            for pair in leaves.windows(2) {
                assert_eq!(tree.nearest_right(pair[0]), Some(pair[1]));
                assert_eq!(tree.nearest_left(pair[1]), Some(pair[0]));
            }
        }

        #[test]
        fn first_and_last_leaf() {
            let tree = build(&[w(1), w(2), w(3)]);
            let root = tree.root().unwrap();
            let first = tree.find_node(w(1)).unwrap();
            let last = tree.find_node(w(3)).unwrap();
            assert_eq!(tree.first_leaf(root), Some(LeafRef::Node(first)));
            assert_eq!(tree.last_leaf(root), Some(LeafRef::Node(last)));
        }

        #[test]
        fn first_and_last_of_stack_are_entries() {
            let tree = LayoutTree::build(
                LayoutMode::Monocle,
                Rect::new(0.0, 0.0, 100.0, 100.0),
                &[w(1), w(2)],
                &TilingConfig::default(),
            );
            let root = tree.root().unwrap();
            assert_eq!(
                tree.first_leaf(root),
                tree.find_entry(w(1)).map(LeafRef::Entry)
            );
            assert_eq!(
                tree.last_leaf(root),
                tree.find_entry(w(2)).map(LeafRef::Entry)
            );
        }

        #[test]
        fn neighbour_depends_on_side() {
            let tree = build(&[w(1), w(2), w(3)]);
            let one = tree.find_node(w(1)).unwrap();
            let two = tree.find_node(w(2)).unwrap();
            let three = tree.find_node(w(3)).unwrap();
            assert!(tree.is_left_child(one));
            assert!(tree.is_right_child(three));
            assert_eq!(tree.nearest_leaf_neighbour(one), Some(two));
            assert_eq!(tree.nearest_leaf_neighbour(two), Some(three));
            assert_eq!(tree.nearest_leaf_neighbour(three), Some(two));
            assert_eq!(tree.nearest_leaf_neighbour(tree.root().unwrap()), None);
        }
    }

    mod lookup {
        use pretty_assertions::assert_eq;

        use super::*;

        #[test]
        fn find_node_and_entry() {
            let tree = build(&[w(1), w(2)]);
            assert!(tree.find_node(w(2)).is_some());
            assert_eq!(tree.find_entry(w(2)), None);
            assert_eq!(tree.find_node(w(9)), None);
            assert!(!tree.contains_window(w(9)));
        }

        #[test]
        fn owner_of_stacked_window() {
            let tree = LayoutTree::build(
                LayoutMode::Monocle,
                Rect::new(0.0, 0.0, 100.0, 100.0),
                &[w(4), w(5), w(6)],
                &TilingConfig::default(),
            );
            assert_eq!(tree.find_node(w(5)), None);
            let entry = tree.find_entry(w(5)).unwrap();
            assert_eq!(tree.owner_of_entry(entry), tree.root());
            assert_eq!(tree.find_node_or_owner(w(5)), tree.root());
        }

        #[test]
        fn insertion_leaf_prefers_right_spine() {
            let tree = build(&[w(1), w(2), w(3)]);
            // root: {1 | {2 / 3}}; left of the right split is a leaf
            assert_eq!(tree.insertion_leaf(), tree.find_node(w(3)));
            let single = build(&[w(1)]);
            assert_eq!(single.insertion_leaf(), single.root());
            assert_eq!(build(&[]).insertion_leaf(), None);
        }
    }
}
