use std::ops::Index;

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Represents a node somewhere in the tree.
    pub struct NodeId;
}

/// Map that holds the structure of binary trees.
///
/// Multiple trees can be contained within a map; any node without a parent is
/// the root of its own tree. A node has either no children or exactly two, so
/// a partially split node cannot be represented. Payloads are kept by the
/// owner in secondary maps keyed by [`NodeId`].
#[derive(Default, Serialize, Deserialize)]
pub struct NodeMap {
    map: SlotMap<NodeId, Node>,
}

#[derive(Default, PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Node {
    parent: Option<NodeId>,
    children: Option<[NodeId; 2]>,
}

/// Which child slot a node occupies under its parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }
}

impl NodeMap {
    pub fn new() -> NodeMap { NodeMap { map: SlotMap::default() } }

    pub fn len(&self) -> usize { self.map.len() }

    pub fn is_empty(&self) -> bool { self.map.is_empty() }

    pub fn contains(&self, id: NodeId) -> bool { self.map.contains_key(id) }

    pub fn mk_node(&mut self) -> NodeId { self.map.insert(Node::default()) }

    /// Hangs two detached roots under a childless node.
    ///
    /// Returns false without touching anything if `parent` already has
    /// children, if either child is attached elsewhere, or if ids repeat.
    #[track_caller]
    pub fn attach_pair(&mut self, parent: NodeId, left: NodeId, right: NodeId) -> bool {
        if parent == left || parent == right || left == right {
            return false;
        }
        let attachable = |id: NodeId| self.map.get(id).is_some_and(|n| n.parent.is_none());
        if !attachable(left) || !attachable(right) {
            return false;
        }
        match self.map.get(parent) {
            Some(node) if node.children.is_none() => {}
            _ => return false,
        }
        if parent.ancestors(self).any(|a| a == left || a == right) {
            return false;
        }

        if let Some(node) = self.map.get_mut(parent) {
            node.children = Some([left, right]);
        }
        for child in [left, right] {
            if let Some(node) = self.map.get_mut(child) {
                node.parent = Some(parent);
            }
        }
        true
    }

    /// Unlinks both children of `parent`, leaving each as the root of its own
    /// detached tree. `parent` becomes a leaf.
    pub fn detach_children(&mut self, parent: NodeId) -> Option<[NodeId; 2]> {
        let children = self.map.get_mut(parent)?.children.take()?;
        for child in children {
            if let Some(node) = self.map.get_mut(child) {
                node.parent = None;
            }
        }
        Some(children)
    }

    pub fn swap_children(&mut self, parent: NodeId) -> bool {
        match self.map.get_mut(parent).and_then(|n| n.children.as_mut()) {
            Some(children) => {
                children.swap(0, 1);
                true
            }
            None => false,
        }
    }

    /// Puts `replacement` (a detached root) into the slot `node` occupies and
    /// leaves `node` detached.
    pub fn replace(&mut self, node: NodeId, replacement: NodeId) -> bool {
        if node == replacement
            || !self.contains(node)
            || !self.map.get(replacement).is_some_and(|n| n.parent.is_none())
        {
            return false;
        }
        let parent = node.parent(self);
        if let Some(parent) = parent {
            let side = node.side(self);
            if let (Some(side), Some(children)) =
                (side, self.map.get_mut(parent).and_then(|n| n.children.as_mut()))
            {
                children[side.index()] = replacement;
            }
        }
        if let Some(n) = self.map.get_mut(replacement) {
            n.parent = parent;
        }
        if let Some(n) = self.map.get_mut(node) {
            n.parent = None;
        }
        true
    }

    /// Removes the tree rooted at `root` and returns the removed ids in
    /// post-order, so callers can drop their payloads.
    #[track_caller]
    pub fn remove_subtree(&mut self, root: NodeId) -> Vec<NodeId> {
        assert!(root.parent(self).is_none(), "remove_subtree called on attached node");
        let ids: Vec<_> = root.traverse_postorder(self).collect();
        for id in &ids {
            self.map.remove(*id);
        }
        ids
    }
}

impl Index<NodeId> for NodeMap {
    type Output = Node;

    fn index(&self, index: NodeId) -> &Self::Output { &self.map[index] }
}

impl NodeId {
    pub fn parent(self, map: &NodeMap) -> Option<NodeId> {
        map.map.get(self).and_then(|n| n.parent)
    }

    pub fn children(self, map: &NodeMap) -> Option<[NodeId; 2]> {
        map.map.get(self).and_then(|n| n.children)
    }

    pub fn child(self, map: &NodeMap, side: Side) -> Option<NodeId> {
        self.children(map).map(|c| c[side.index()])
    }

    pub fn left(self, map: &NodeMap) -> Option<NodeId> { self.child(map, Side::Left) }

    pub fn right(self, map: &NodeMap) -> Option<NodeId> { self.child(map, Side::Right) }

    pub fn is_leaf(self, map: &NodeMap) -> bool {
        map.map.get(self).is_some_and(|n| n.children.is_none())
    }

    pub fn is_root(self, map: &NodeMap) -> bool {
        map.map.get(self).is_some_and(|n| n.parent.is_none())
    }

    /// The slot this node occupies under its parent, or None for a root.
    pub fn side(self, map: &NodeMap) -> Option<Side> {
        let [left, _] = self.parent(map)?.children(map)?;
        Some(if left == self { Side::Left } else { Side::Right })
    }

    pub fn sibling(self, map: &NodeMap) -> Option<NodeId> {
        let side = self.side(map)?;
        self.parent(map)?.child(map, side.opposite())
    }

    /// Returns an iterator over all ancestors of the current node, including itself.
    pub fn ancestors(self, map: &NodeMap) -> impl Iterator<Item = NodeId> + '_ {
        let mut next = Some(self).filter(|n| map.contains(*n));
        std::iter::from_fn(move || {
            let node = next;
            next = node.and_then(|n| n.parent(map));
            node
        })
    }

    pub fn depth(self, map: &NodeMap) -> usize { self.ancestors(map).count().saturating_sub(1) }

    pub fn traverse_preorder(self, map: &NodeMap) -> impl Iterator<Item = NodeId> + '_ {
        PreorderTraversal::new(map, self)
    }

    pub fn traverse_postorder(self, map: &NodeMap) -> impl Iterator<Item = NodeId> + '_ {
        PostorderTraversal::new(map, self)
    }

    /// Descends from this node towards `side` until reaching a leaf.
    pub fn outermost_leaf(self, map: &NodeMap, side: Side) -> NodeId {
        let mut node = self;
        while let Some(child) = node.child(map, side) {
            node = child;
        }
        node
    }

    /// The leaf that follows this node in an in-order walk, without leaving
    /// the tree this node belongs to.
    pub fn next_leaf(self, map: &NodeMap) -> Option<NodeId> { self.adjacent_leaf(map, Side::Right) }

    /// The leaf that precedes this node in an in-order walk.
    pub fn prev_leaf(self, map: &NodeMap) -> Option<NodeId> { self.adjacent_leaf(map, Side::Left) }

    fn adjacent_leaf(self, map: &NodeMap, towards: Side) -> Option<NodeId> {
        let mut node = self;
        loop {
            let parent = node.parent(map)?;
            if node.side(map) == Some(towards) {
                node = parent;
                continue;
            }
            let other = parent.child(map, towards)?;
            return Some(other.outermost_leaf(map, towards.opposite()));
        }
    }

    /// In-order iterator over the leaves of the subtree rooted at this node.
    pub fn leaves(self, map: &NodeMap) -> impl Iterator<Item = NodeId> + '_ {
        let last = map.contains(self).then(|| self.outermost_leaf(map, Side::Right));
        let mut cur = map.contains(self).then(|| self.outermost_leaf(map, Side::Left));
        std::iter::from_fn(move || {
            let node = cur?;
            cur = if Some(node) == last { None } else { node.next_leaf(map) };
            Some(node)
        })
    }
}

struct PostorderTraversal<'a> {
    cur: Option<NodeId>,
    top: NodeId,
    map: &'a NodeMap,
}

impl<'a> PostorderTraversal<'a> {
    fn new(map: &'a NodeMap, root: NodeId) -> Self {
        Self {
            top: root,
            cur: map.contains(root).then(|| root.outermost_leaf(map, Side::Left)),
            map,
        }
    }
}

impl<'a> Iterator for PostorderTraversal<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.cur?;
        self.cur = None;
        if node != self.top {
            match node.side(self.map) {
                Some(Side::Left) => {
                    self.cur = node
                        .sibling(self.map)
                        .map(|s| s.outermost_leaf(self.map, Side::Left));
                }
                _ => self.cur = node.parent(self.map),
            }
        }
        Some(node)
    }
}

struct PreorderTraversal<'a> {
    top: NodeId,
    cur: Option<NodeId>,
    map: &'a NodeMap,
}

impl<'a> PreorderTraversal<'a> {
    fn new(map: &'a NodeMap, root: NodeId) -> Self {
        Self {
            top: root,
            cur: Some(root).filter(|r| map.contains(*r)),
            map,
        }
    }
}

impl<'a> Iterator for PreorderTraversal<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.cur?;
        if let Some(left) = node.left(self.map) {
            self.cur = Some(left);
        } else {
            self.cur = None;
            for ancestor in node.ancestors(self.map) {
                if ancestor == self.top {
                    break;
                }
                if ancestor.side(self.map) == Some(Side::Left) {
                    self.cur = ancestor.sibling(self.map);
                    break;
                }
            }
        }
        Some(node)
    }
}
