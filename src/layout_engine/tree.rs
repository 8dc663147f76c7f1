//! Node payloads and whole-tree passes: construction, container recompute,
//! apply, teardown and drawing.

use serde::{Deserialize, Serialize};
use slotmap::SecondaryMap;
use tracing::{debug, trace};

use crate::common::config::TilingConfig;
use crate::layout_engine::container::{Container, optimal_orientation};
use crate::layout_engine::engine::ApplyContainer;
use crate::layout_engine::graph::{LayoutMode, Orientation};
use crate::model::geometry::Rect;
use crate::model::stack::{StackId, StackMap};
use crate::model::tree::{NodeId, NodeMap};
use crate::model::window::WindowId;

/// Contents of a leaf.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub enum Leaf {
    /// A single window, or an empty slot reserved for a future window.
    Partitioned(Option<WindowId>),
    /// A chain of windows sharing the leaf's rectangle.
    Stacked(StackId),
}

impl Leaf {
    pub fn window(self) -> Option<WindowId> {
        match self {
            Leaf::Partitioned(window) => window,
            Leaf::Stacked(_) => None,
        }
    }

    pub fn is_pseudo(self) -> bool { matches!(self, Leaf::Partitioned(None)) }

    pub fn kind(self) -> LeafKind {
        match self {
            Leaf::Partitioned(_) => LeafKind::Partitioned,
            Leaf::Stacked(_) => LeafKind::Stacked,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LeafKind {
    Partitioned,
    Stacked,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub enum NodeKind {
    Split { orientation: Orientation, ratio: f64 },
    Leaf(Leaf),
}

/// The spatial partition of one screen.
///
/// Structure lives in the [`NodeMap`]; every node carries a [`NodeKind`] and a
/// [`Container`] in secondary maps. A node has a `Split` payload exactly when
/// it has two children.
#[derive(Serialize, Deserialize, Default)]
pub struct LayoutTree {
    pub(super) area: Rect,
    pub(super) map: NodeMap,
    pub(super) kind: SecondaryMap<NodeId, NodeKind>,
    pub(super) containers: SecondaryMap<NodeId, Container>,
    pub(super) stacks: StackMap,
    pub(super) root: Option<NodeId>,
    /// Empty leaves restored from a saved shape, with what they held when
    /// the shape was taken.
    pub(super) pending: SecondaryMap<NodeId, PendingLeaf>,
}

/// What a restored leaf held before it was saved.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum PendingLeaf {
    Window,
    /// A stack, with the number of windows it held.
    Stacked(usize),
}

static_assertions::assert_impl_all!(LayoutTree: Send, Sync);

impl LayoutTree {
    /// An empty tree covering `area`.
    pub fn new(area: Rect) -> LayoutTree { LayoutTree { area, ..Default::default() } }

    /// Lays out `windows` on `area`, which should already exclude the outer
    /// gaps. Every split takes its rectangle's optimal orientation, whatever
    /// the split mode says. Floating screens and empty window lists produce an empty tree.
    pub fn build(
        mode: LayoutMode,
        area: Rect,
        windows: &[WindowId],
        cfg: &TilingConfig,
    ) -> LayoutTree {
        let mut tree = LayoutTree::new(area);
        match mode {
            LayoutMode::Float => {}
            LayoutMode::Monocle => {
                let container = Container::root(area);
                if let Some(stack) = tree.stacks.create(windows, container) {
                    tree.root = Some(tree.make_node(NodeKind::Leaf(Leaf::Stacked(stack)), container));
                }
            }
            LayoutMode::Bsp => {
                let cfg = cfg.optimal();
                for &window in windows {
                    tree.split_insertion_leaf(window, &cfg);
                }
            }
        }
        debug!(%mode, windows = windows.len(), leaves = tree.leaf_count(), "built layout");
        tree
    }

    pub fn root(&self) -> Option<NodeId> { self.root }

    pub fn area(&self) -> Rect { self.area }

    pub fn map(&self) -> &NodeMap { &self.map }

    pub fn stacks(&self) -> &StackMap { &self.stacks }

    pub fn is_empty(&self) -> bool { self.root.is_none() }

    pub fn kind(&self, node: NodeId) -> Option<NodeKind> { self.kind.get(node).copied() }

    pub fn leaf(&self, node: NodeId) -> Option<Leaf> {
        match self.kind.get(node)? {
            NodeKind::Leaf(leaf) => Some(*leaf),
            NodeKind::Split { .. } => None,
        }
    }

    pub fn window(&self, node: NodeId) -> Option<WindowId> { self.leaf(node)?.window() }

    pub fn container(&self, node: NodeId) -> Option<Container> { self.containers.get(node).copied() }

    pub fn orientation(&self, node: NodeId) -> Option<Orientation> {
        match self.kind.get(node)? {
            NodeKind::Split { orientation, .. } => Some(*orientation),
            NodeKind::Leaf(_) => None,
        }
    }

    pub fn ratio(&self, node: NodeId) -> Option<f64> {
        match self.kind.get(node)? {
            NodeKind::Split { ratio, .. } => Some(*ratio),
            NodeKind::Leaf(_) => None,
        }
    }

    /// Leaves of the whole tree, in order.
    pub fn leaves(&self) -> Vec<NodeId> {
        self.root.map(|root| root.leaves(&self.map).collect()).unwrap_or_default()
    }

    pub fn leaf_count(&self) -> usize { self.leaves().len() }

    pub fn pseudo_count(&self) -> usize {
        self.leaves().into_iter().filter(|&n| self.leaf(n).is_some_and(Leaf::is_pseudo)).count()
    }

    pub(super) fn make_node(&mut self, kind: NodeKind, container: Container) -> NodeId {
        let id = self.map.mk_node();
        self.kind.insert(id, kind);
        self.containers.insert(id, container);
        id
    }

    /// Frees a detached subtree together with any stacks its leaves own.
    pub(super) fn discard_subtree(&mut self, node: NodeId) {
        for id in self.map.remove_subtree(node) {
            if let Some(NodeKind::Leaf(Leaf::Stacked(stack))) = self.kind.remove(id) {
                self.stacks.destroy(stack);
            }
            self.containers.remove(id);
            self.pending.remove(id);
        }
    }

    /// Tears down every node and stack.
    pub fn destroy(&mut self) {
        if let Some(root) = self.root.take() {
            trace!(?root, "destroying layout");
            self.discard_subtree(root);
        }
    }

    /// Re-roots the tree on a new usable area and recomputes every container
    /// with the stored orientations.
    pub fn set_area(&mut self, area: Rect, cfg: &TilingConfig) {
        self.area = area;
        if let Some(root) = self.root {
            self.containers.insert(root, Container::root(area));
            self.recompute(cfg, false);
        }
    }

    /// Derives every container top-down from the root's. With `optimal` set,
    /// each split first takes the orientation its current aspect ratio calls
    /// for.
    pub fn recompute(&mut self, cfg: &TilingConfig, optimal: bool) {
        if let Some(root) = self.root {
            self.recompute_from(root, cfg, optimal);
        }
    }

    pub(super) fn recompute_from(&mut self, top: NodeId, cfg: &TilingConfig, optimal: bool) {
        let order: Vec<NodeId> = top.traverse_preorder(&self.map).collect();
        for node in order {
            let Some(container) = self.containers.get(node).copied() else {
                continue;
            };
            match self.kind.get(node).copied() {
                Some(NodeKind::Split { orientation, ratio }) => {
                    let orientation = if optimal {
                        optimal_orientation(container.rect, cfg.optimal_ratio)
                    } else {
                        orientation
                    };
                    self.kind.insert(node, NodeKind::Split { orientation, ratio });
                    if let Some(children) = node.children(&self.map) {
                        let halves = container.split(orientation, ratio, cfg.gap(orientation));
                        for (child, half) in children.into_iter().zip(halves) {
                            self.containers.insert(child, half);
                        }
                    }
                }
                Some(NodeKind::Leaf(Leaf::Stacked(stack))) => {
                    self.stacks.set_container(stack, container);
                }
                _ => {}
            }
        }
    }

    /// Every window with its final container: tree leaves in order, stack
    /// entries front to back. Pseudo leaves are skipped.
    pub fn frames(&self) -> Vec<(WindowId, Container)> {
        let mut out = Vec::new();
        for leaf in self.leaves() {
            let Some(container) = self.container(leaf) else { continue };
            match self.leaf(leaf) {
                Some(Leaf::Partitioned(Some(window))) => out.push((window, container)),
                Some(Leaf::Stacked(stack)) => {
                    out.extend(self.stacks.iter(stack).map(|(_, e)| (e.window, e.container)));
                }
                _ => {}
            }
        }
        out
    }

    /// Hands every window's container to `sink`.
    pub fn apply<S: ApplyContainer + ?Sized>(&self, sink: &mut S) {
        for (window, container) in self.frames() {
            sink.apply(window, &container);
        }
    }

    pub fn windows(&self) -> Vec<WindowId> { self.frames().into_iter().map(|(w, _)| w).collect() }

    pub fn draw_tree(&self) -> String {
        let Some(root) = self.root else {
            return "<empty layout>".to_string();
        };
        let tree = self.get_ascii_tree(root);
        let mut out = String::new();
        let _ = ascii_tree::write_tree(&mut out, &tree);
        out
    }

    fn get_ascii_tree(&self, node: NodeId) -> ascii_tree::Tree {
        let rect = self.container(node).map(|c| c.rect).unwrap_or_default();
        let at = format!(
            "@ {:.0},{:.0} {:.0}x{:.0}",
            rect.x, rect.y, rect.width, rect.height
        );
        match self.kind(node) {
            Some(NodeKind::Split { orientation, ratio }) => {
                let children = node
                    .children(&self.map)
                    .into_iter()
                    .flatten()
                    .map(|c| self.get_ascii_tree(c))
                    .collect();
                ascii_tree::Tree::Node(format!("{orientation:?} {ratio:.2} {at}"), children)
            }
            Some(NodeKind::Leaf(Leaf::Partitioned(Some(window)))) => {
                ascii_tree::Tree::Leaf(vec![format!("window {window} {at}")])
            }
            Some(NodeKind::Leaf(Leaf::Partitioned(None))) => {
                ascii_tree::Tree::Leaf(vec![format!("pseudo {at}")])
            }
            Some(NodeKind::Leaf(Leaf::Stacked(stack))) => {
                ascii_tree::Tree::Leaf(vec![format!("stack {:?} {at}", self.stacks.windows(stack))])
            }
            None => ascii_tree::Tree::Leaf(vec![format!("{node:?}")]),
        }
    }
}

#[cfg(test)]
impl LayoutTree {
    /// Panics if payloads and structure disagree anywhere in the tree.
    #[track_caller]
    pub(crate) fn assert_consistent(&self) {
        let Some(root) = self.root else {
            assert!(self.map.is_empty(), "empty tree still holds nodes");
            return;
        };
        assert!(root.is_root(&self.map), "root has a parent");
        let nodes: Vec<_> = root.traverse_preorder(&self.map).collect();
        assert_eq!(nodes.len(), self.map.len(), "detached nodes left in the map");
        for node in nodes {
            assert!(self.containers.contains_key(node), "{node:?} has no container");
            match (self.kind(node), node.children(&self.map)) {
                (Some(NodeKind::Split { ratio, .. }), Some(_)) => {
                    assert!(ratio > 0.0 && ratio < 1.0, "ratio {ratio} out of range");
                }
                (Some(NodeKind::Leaf(Leaf::Stacked(stack))), None) => {
                    assert!(self.stacks.len(stack) > 0, "empty stack on {node:?}");
                    let container = self.container(node);
                    for (_, entry) in self.stacks.iter(stack) {
                        assert_eq!(Some(entry.container), container, "stack entry container");
                    }
                }
                (Some(NodeKind::Leaf(_)), None) => {}
                (kind, children) => panic!("{node:?} has {kind:?} with children {children:?}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::layout_engine::container::SplitKind;

    fn w(idx: u32) -> WindowId { WindowId::new(idx) }

    fn area() -> Rect { Rect::new(0.0, 0.0, 1000.0, 1000.0) }

    #[test]
    fn build_empty_is_inert() {
        let cfg = TilingConfig::default();
        let mut tree = LayoutTree::build(LayoutMode::Bsp, area(), &[], &cfg);
        assert!(tree.is_empty());
        assert!(tree.frames().is_empty());
        tree.recompute(&cfg, true);
        tree.destroy();
        assert_eq!(tree.draw_tree(), "<empty layout>");
        tree.assert_consistent();
    }

    #[test]
    fn build_float_produces_nothing() {
        let cfg = TilingConfig::default();
        let tree = LayoutTree::build(LayoutMode::Float, area(), &[w(1), w(2)], &cfg);
        assert!(tree.is_empty());
    }

    #[test]
    fn build_single_window_spans_area() {
        let cfg = TilingConfig::default();
        let tree = LayoutTree::build(LayoutMode::Bsp, area(), &[w(1)], &cfg);
        assert_eq!(tree.frames(), vec![(w(1), Container::root(area()))]);
        tree.assert_consistent();
    }

    #[test]
    fn build_monocle_uses_one_stack() {
        let cfg = TilingConfig::default();
        let tree = LayoutTree::build(LayoutMode::Monocle, area(), &[w(4), w(5), w(6)], &cfg);
        let root = tree.root().unwrap();
        let Some(Leaf::Stacked(stack)) = tree.leaf(root) else {
            panic!("root is not stacked");
        };
        assert_eq!(tree.stacks().windows(stack), vec![w(4), w(5), w(6)]);
        assert_eq!(tree.windows(), vec![w(4), w(5), w(6)]);
        tree.assert_consistent();
    }

    #[test]
    fn set_area_moves_everything() {
        let cfg = TilingConfig::default();
        let mut tree = LayoutTree::build(LayoutMode::Bsp, area(), &[w(1), w(2)], &cfg);
        tree.set_area(Rect::new(100.0, 0.0, 2000.0, 1000.0), &cfg);
        assert_eq!(tree.frames(), vec![
            (w(1), Container {
                rect: Rect::new(100.0, 0.0, 1000.0, 1000.0),
                kind: SplitKind::LeftVertical,
            }),
            (w(2), Container {
                rect: Rect::new(1100.0, 0.0, 1000.0, 1000.0),
                kind: SplitKind::RightVertical,
            }),
        ]);
    }

    #[test]
    fn optimal_recompute_reorients_splits() {
        let cfg = TilingConfig::default();
        let mut tree = LayoutTree::build(LayoutMode::Bsp, area(), &[w(1), w(2)], &cfg);
        let root = tree.root().unwrap();
        assert_eq!(tree.orientation(root), Some(Orientation::Vertical));

        tree.set_area(Rect::new(0.0, 0.0, 500.0, 1000.0), &cfg);
        assert_eq!(tree.orientation(root), Some(Orientation::Vertical));
        tree.recompute(&cfg, true);
        assert_eq!(tree.orientation(root), Some(Orientation::Horizontal));
        assert_eq!(tree.container(tree.leaves()[1]).unwrap().rect, Rect::new(
            0.0, 500.0, 500.0, 500.0
        ));
    }

    #[test]
    fn apply_reaches_every_window() {
        let cfg = TilingConfig::default();
        let tree = LayoutTree::build(LayoutMode::Bsp, area(), &[w(1), w(2), w(3)], &cfg);
        let mut seen = Vec::new();
        tree.apply(&mut |window: WindowId, _: &Container| seen.push(window));
        assert_eq!(seen, vec![w(1), w(2), w(3)]);
    }

    #[test]
    fn destroy_releases_nodes_and_stacks() {
        let cfg = TilingConfig::default();
        let mut tree = LayoutTree::build(LayoutMode::Monocle, area(), &[w(1), w(2)], &cfg);
        let Some(Leaf::Stacked(stack)) = tree.root().and_then(|r| tree.leaf(r)) else {
            panic!("root is not stacked");
        };
        tree.destroy();
        assert!(tree.is_empty());
        assert!(tree.map().is_empty());
        assert!(!tree.stacks().contains(stack));
    }

    #[test]
    fn draw_tree_lists_leaves() {
        let cfg = TilingConfig::default();
        let tree = LayoutTree::build(LayoutMode::Bsp, area(), &[w(1), w(2), w(3)], &cfg);
        let drawing = tree.draw_tree();
        assert!(drawing.contains("Vertical 0.50"), "{drawing}");
        assert!(drawing.contains("Horizontal 0.50"), "{drawing}");
        for window in ["window 1", "window 2", "window 3"] {
            assert!(drawing.contains(window), "{drawing}");
        }
    }
}
