use crate::common::config::{InnerGaps, TilingConfig};
use crate::layout_engine::{
    Container, LayoutMode, LayoutTree, Leaf, NodeKind, Orientation, Rotation, SplitKind, SplitMode,
};
use crate::model::geometry::{IsWithin, Rect};
use crate::model::tree::NodeId;
use crate::model::window::WindowId;

fn w(idx: u32) -> WindowId { WindowId::new(idx) }

fn ws(ids: impl IntoIterator<Item = u32>) -> Vec<WindowId> { ids.into_iter().map(w).collect() }

fn screen() -> Rect { Rect::new(0.0, 0.0, 1000.0, 1000.0) }

fn bsp(windows: &[WindowId], cfg: &TilingConfig) -> LayoutTree {
    LayoutTree::build(LayoutMode::Bsp, screen(), windows, cfg)
}

fn gapped() -> TilingConfig {
    TilingConfig {
        inner: InnerGaps { horizontal: 8.0, vertical: 12.0 },
        ..TilingConfig::default()
    }
}

/// Every split, with its orientation, ratio and children, in preorder.
fn splits(tree: &LayoutTree) -> Vec<(NodeId, Orientation, f64, [NodeId; 2])> {
    let Some(root) = tree.root() else { return Vec::new() };
    root.traverse_preorder(tree.map())
        .filter_map(|node| match tree.kind(node)? {
            NodeKind::Split { orientation, ratio } => {
                Some((node, orientation, ratio, node.children(tree.map())?))
            }
            NodeKind::Leaf(_) => None,
        })
        .collect()
}

fn assert_gap_identities(tree: &LayoutTree, cfg: &TilingConfig) {
    for (node, orientation, _, [first, second]) in splits(tree) {
        let parent = tree.container(node).unwrap().rect;
        let a = tree.container(first).unwrap().rect;
        let b = tree.container(second).unwrap().rect;
        let gap = cfg.gap(orientation);
        match orientation {
            Orientation::Vertical => {
                assert!(parent.width.is_within(1e-9, a.width + b.width + gap), "{node:?}");
                assert_eq!((a.height, b.height), (parent.height, parent.height));
            }
            Orientation::Horizontal => {
                assert!(parent.height.is_within(1e-9, a.height + b.height + gap), "{node:?}");
                assert_eq!((a.width, b.width), (parent.width, parent.width));
            }
        }
    }
}

mod structure {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;

    #[test]
    fn real_plus_pseudo_leaves_equals_leaves() {
        let cfg = TilingConfig::default();
        let mut tree = bsp(&ws(1..=6), &cfg);
        for window in [w(2), w(5)] {
            let node = tree.find_node(window).unwrap();
            tree.insert_pseudo(node, &cfg);
        }
        let leaves = tree.leaf_count();
        let real = tree
            .leaves()
            .into_iter()
            .filter(|&n| matches!(tree.leaf(n), Some(Leaf::Partitioned(Some(_)))))
            .count();
        assert_eq!(leaves, 8);
        assert_eq!(real + tree.pseudo_count(), leaves);
        for (_, _, _, [first, second]) in splits(&tree) {
            assert_ne!(first, second);
        }
        tree.assert_consistent();
    }

    #[test]
    fn leaf_order_survives_recompute() {
        let cfg = gapped();
        let mut tree = bsp(&ws(1..=7), &cfg);
        let order = tree.leaves();
        let windows = tree.windows();
        tree.set_area(Rect::new(0.0, 0.0, 400.0, 1600.0), &cfg);
        tree.recompute(&cfg, true);
        tree.recompute(&cfg, false);
        assert_eq!(tree.leaves(), order);
        assert_eq!(tree.windows(), windows);
        assert_eq!(windows, ws(1..=7));
    }

    #[test]
    fn nearest_neighbours_are_inverse() {
        let tree = bsp(&ws(1..=9), &TilingConfig::default());
        let leaves = tree.leaves();
        assert_eq!(tree.nearest_left(leaves[0]), None);
        assert_eq!(tree.nearest_right(*leaves.last().unwrap()), None);
        for &leaf in &leaves {
            if let Some(right) = tree.nearest_right(leaf) {
                assert_eq!(tree.nearest_left(right), Some(leaf));
            }
            if let Some(left) = tree.nearest_left(leaf) {
                assert_eq!(tree.nearest_right(left), Some(leaf));
            }
        }
    }
}

mod rotation {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;

    fn rotated_back(first: Rotation, second: Rotation) {
        let mut cfg = TilingConfig::default();
        cfg.split_ratio = 0.25;
        let mut tree = bsp(&ws(1..=6), &cfg);
        let before = splits(&tree);
        let frames = tree.frames();
        tree.rotate(first, &cfg);
        assert_ne!(tree.frames(), frames);
        tree.rotate(second, &cfg);
        assert_eq!(splits(&tree), before);
        assert_eq!(tree.frames(), frames);
        tree.assert_consistent();
    }

    #[test]
    fn quarter_turn_and_back() { rotated_back(Rotation::Deg90, Rotation::Deg270); }

    #[test]
    fn three_quarter_turn_and_back() { rotated_back(Rotation::Deg270, Rotation::Deg90); }

    #[test]
    fn half_turn_twice() { rotated_back(Rotation::Deg180, Rotation::Deg180); }

    #[test]
    fn rotation_keeps_gap_identities() {
        let cfg = gapped();
        let mut tree = bsp(&ws(1..=5), &cfg);
        for rotation in [Rotation::Deg90, Rotation::Deg180, Rotation::Deg270] {
            tree.rotate(rotation, &cfg);
            assert_gap_identities(&tree, &cfg);
        }
    }
}

mod geometry {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;

    #[test]
    fn children_plus_gap_fill_parent() {
        let cfg = gapped();
        let mut tree = bsp(&ws(1..=8), &cfg);
        assert_gap_identities(&tree, &cfg);
        tree.set_area(Rect::new(30.0, 40.0, 1920.0, 1080.0), &cfg);
        assert_gap_identities(&tree, &cfg);
        tree.recompute(&cfg, true);
        assert_gap_identities(&tree, &cfg);
    }

    #[test]
    fn three_windows_on_a_square() {
        let tree = bsp(&ws(1..=3), &TilingConfig::default());
        assert_eq!(tree.frames(), vec![
            (w(1), Container {
                rect: Rect::new(0.0, 0.0, 500.0, 1000.0),
                kind: SplitKind::LeftVertical,
            }),
            (w(2), Container {
                rect: Rect::new(500.0, 0.0, 500.0, 500.0),
                kind: SplitKind::UpperHorizontal,
            }),
            (w(3), Container {
                rect: Rect::new(500.0, 500.0, 500.0, 500.0),
                kind: SplitKind::LowerHorizontal,
            }),
        ]);
    }

    #[test]
    fn build_ignores_fixed_split_mode() {
        let cfg = TilingConfig { split_mode: SplitMode::Horizontal, ..TilingConfig::default() };
        let mut tree = bsp(&ws(1..=3), &cfg);
        let orientations: Vec<Orientation> = splits(&tree).into_iter().map(|s| s.1).collect();
        assert_eq!(orientations, vec![Orientation::Vertical, Orientation::Horizontal]);

        // single insertions still follow the configured mode
        let three = tree.find_node(w(3)).unwrap();
        tree.insert_window(w(4), &cfg);
        let parent = tree.find_node(w(4)).unwrap().parent(tree.map()).unwrap();
        assert_eq!(parent, three);
        assert_eq!(tree.orientation(parent), Some(Orientation::Horizontal));
    }

    #[test]
    fn insertion_fills_right_spine_first() {
        let tree = bsp(&ws(1..=5), &TilingConfig::default());
        // {1 | {2 / {3 | {4 / 5}}}}
        let rects: Vec<Rect> = tree.frames().into_iter().map(|(_, c)| c.rect).collect();
        assert_eq!(rects, vec![
            Rect::new(0.0, 0.0, 500.0, 1000.0),
            Rect::new(500.0, 0.0, 500.0, 500.0),
            Rect::new(500.0, 500.0, 250.0, 500.0),
            Rect::new(750.0, 500.0, 250.0, 250.0),
            Rect::new(750.0, 750.0, 250.0, 250.0),
        ]);
    }
}

mod pseudo {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;

    #[test]
    fn insert_then_remove_restores_single_leaf() {
        let cfg = TilingConfig::default();
        let mut tree = bsp(&[w(1)], &cfg);
        let frames = tree.frames();
        let root = tree.root().unwrap();
        let slot = tree.insert_pseudo(root, &cfg).unwrap();
        assert!(tree.is_pseudo(slot));
        assert_eq!(tree.leaf_count(), 2);

        let one = tree.find_node(w(1)).unwrap();
        assert!(tree.remove_pseudo(one, &cfg));
        assert_eq!(tree.leaf_count(), 1);
        assert_eq!(tree.frames(), frames);
        tree.assert_consistent();
    }

    #[test]
    fn removal_refused_when_sibling_holds_a_window() {
        let cfg = TilingConfig::default();
        let mut tree = bsp(&ws(1..=2), &cfg);
        let frames = tree.frames();
        let leaves = tree.leaves();
        let one = tree.find_node(w(1)).unwrap();
        assert!(!tree.remove_pseudo(one, &cfg));
        assert_eq!(tree.frames(), frames);
        assert_eq!(tree.leaves(), leaves);
    }
}

mod stacked {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;

    #[test]
    fn monocle_builds_one_consistent_chain() {
        let cfg = TilingConfig::default();
        let tree = LayoutTree::build(LayoutMode::Monocle, screen(), &ws(4..=6), &cfg);
        let root = tree.root().unwrap();
        let Some(Leaf::Stacked(stack)) = tree.leaf(root) else {
            panic!("root is not stacked");
        };
        let entries: Vec<_> = tree.stacks().iter(stack).map(|(id, _)| id).collect();
        assert_eq!(entries.len(), 3);
        assert_eq!(tree.stacks().windows(stack), ws(4..=6));

        for (i, &id) in entries.iter().enumerate() {
            let entry = tree.stacks().entry(id).unwrap();
            assert_eq!(entry.container, Container::root(screen()));
            assert_eq!(entry.prev(), i.checked_sub(1).map(|p| entries[p]));
            assert_eq!(entry.next(), entries.get(i + 1).copied());
            if let Some(next) = entry.next() {
                assert_eq!(tree.stacks().entry(next).unwrap().prev(), Some(id));
            }
        }
    }

    #[test]
    fn empty_monocle_has_no_root() {
        let tree = LayoutTree::build(LayoutMode::Monocle, screen(), &[], &TilingConfig::default());
        assert!(tree.is_empty());
        assert!(tree.frames().is_empty());
    }
}

mod lifecycle {
    use pretty_assertions::assert_eq;
    use test_log::test;

    use super::*;

    #[test]
    fn add_and_remove_many_windows() {
        let cfg = gapped();
        let mut tree = LayoutTree::new(screen());
        for window in ws(1..=10) {
            tree.insert_window(window, &cfg);
            tree.assert_consistent();
        }
        assert_eq!(tree.windows(), ws(1..=10));
        for window in [3, 9, 1, 10, 5] {
            assert!(tree.remove_window(w(window), &cfg));
            tree.assert_consistent();
            assert_gap_identities(&tree, &cfg);
        }
        assert_eq!(tree.windows(), ws([2, 4, 6, 7, 8]));
        for window in [2, 4, 6, 7, 8] {
            tree.remove_window(w(window), &cfg);
        }
        assert!(tree.is_empty());
        tree.assert_consistent();
    }

    #[test]
    fn shape_survives_rebuild_with_new_windows() {
        let cfg = TilingConfig::default();
        let mut tree = bsp(&ws(1..=4), &cfg);
        tree.rotate(Rotation::Deg90, &cfg);
        let shape = tree.shape().unwrap();

        let mut restored = LayoutTree::from_shape(&shape, screen(), &cfg).unwrap();
        restored.fill(&ws(11..=14), &cfg);
        let rects = |t: &LayoutTree| t.frames().into_iter().map(|(_, c)| c).collect::<Vec<_>>();
        assert_eq!(rects(&restored), rects(&tree));
        assert_eq!(restored.windows(), ws(11..=14));
    }
}
