//! Window-free description of a tree, used to carry a layout across
//! restarts.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::common::config::{TilingConfig, is_valid_ratio};
use crate::layout_engine::container::Container;
use crate::layout_engine::error::LayoutError;
use crate::layout_engine::graph::Orientation;
use crate::layout_engine::tree::{Leaf, LayoutTree, NodeKind, PendingLeaf};
use crate::model::geometry::Rect;
use crate::model::tree::NodeId;

/// The shape of a layout: split orientations and ratios plus leaf markers.
/// Window handles are deliberately left out.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum TreeShape {
    Split {
        orientation: Orientation,
        ratio: f64,
        first: Box<TreeShape>,
        second: Box<TreeShape>,
    },
    Window,
    Pseudo,
    Stacked { windows: usize },
}

impl TreeShape {
    pub fn leaf_count(&self) -> usize {
        match self {
            TreeShape::Split { first, second, .. } => first.leaf_count() + second.leaf_count(),
            _ => 1,
        }
    }

    /// Rejects shapes carrying a ratio outside (0, 1).
    pub fn validate(&self) -> Result<(), LayoutError> {
        match self {
            TreeShape::Split { ratio, first, second, .. } => {
                if !is_valid_ratio(*ratio) {
                    return Err(LayoutError::InvalidRatio(*ratio));
                }
                first.validate()?;
                second.validate()
            }
            _ => Ok(()),
        }
    }

    pub fn to_ron(&self) -> Result<String, LayoutError> { to_ron_string(self) }

    pub fn from_ron(buf: &str) -> Result<TreeShape, LayoutError> {
        let shape: TreeShape = ron::from_str(buf)?;
        shape.validate()?;
        Ok(shape)
    }

    pub fn to_json(&self) -> Result<String, LayoutError> { Ok(serde_json::to_string_pretty(self)?) }

    pub fn from_json(buf: &str) -> Result<TreeShape, LayoutError> {
        let shape: TreeShape = serde_json::from_str(buf)?;
        shape.validate()?;
        Ok(shape)
    }

    pub fn save(&self, path: &Path) -> Result<(), LayoutError> { write_ron(path, self) }

    pub fn load(path: &Path) -> Result<TreeShape, LayoutError> {
        let shape: TreeShape = read_ron(path)?;
        shape.validate()?;
        Ok(shape)
    }
}

fn to_ron_string<T: Serialize + ?Sized>(value: &T) -> Result<String, LayoutError> {
    Ok(ron::ser::to_string_pretty(value, ron::ser::PrettyConfig::default())?)
}

pub(crate) fn write_ron<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), LayoutError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    File::create(path)?.write_all(to_ron_string(value)?.as_bytes())?;
    Ok(())
}

pub(crate) fn read_ron<T: DeserializeOwned>(path: &Path) -> Result<T, LayoutError> {
    let mut buf = String::new();
    File::open(path)?.read_to_string(&mut buf)?;
    Ok(ron::from_str(&buf)?)
}

impl LayoutTree {
    /// Captures the current shape, or None for an empty tree. Leaves restored
    /// from a shape but never filled keep their saved marker.
    pub fn shape(&self) -> Option<TreeShape> { Some(self.shape_of(self.root?)) }

    fn shape_of(&self, node: NodeId) -> TreeShape {
        match self.kind(node) {
            Some(NodeKind::Split { orientation, ratio }) => {
                let [first, second] = node
                    .children(&self.map)
                    .map(|children| children.map(|child| self.shape_of(child)))
                    .unwrap_or([TreeShape::Pseudo, TreeShape::Pseudo]);
                TreeShape::Split {
                    orientation,
                    ratio,
                    first: Box::new(first),
                    second: Box::new(second),
                }
            }
            Some(NodeKind::Leaf(Leaf::Stacked(stack))) => TreeShape::Stacked {
                windows: self.stacks.len(stack),
            },
            Some(NodeKind::Leaf(Leaf::Partitioned(Some(_)))) => TreeShape::Window,
            _ => match self.pending.get(node) {
                Some(&PendingLeaf::Stacked(windows)) => TreeShape::Stacked { windows },
                Some(PendingLeaf::Window) => TreeShape::Window,
                None => TreeShape::Pseudo,
            },
        }
    }

    /// Rebuilds a tree with the given shape covering `area`. Every leaf starts
    /// out empty; [`LayoutTree::fill`] hands windows back to them.
    pub fn from_shape(
        shape: &TreeShape,
        area: Rect,
        cfg: &TilingConfig,
    ) -> Result<LayoutTree, LayoutError> {
        shape.validate()?;
        let mut tree = LayoutTree::new(area);
        let root = tree.make_node(NodeKind::Leaf(Leaf::Partitioned(None)), Container::root(area));
        tree.root = Some(root);
        let mut pending = vec![(root, shape)];
        while let Some((node, shape)) = pending.pop() {
            match shape {
                TreeShape::Split { orientation, ratio, first, second } => {
                    let placeholder = Container::root(area);
                    let left =
                        tree.make_node(NodeKind::Leaf(Leaf::Partitioned(None)), placeholder);
                    let right =
                        tree.make_node(NodeKind::Leaf(Leaf::Partitioned(None)), placeholder);
                    tree.map.attach_pair(node, left, right);
                    tree.kind.insert(node, NodeKind::Split {
                        orientation: *orientation,
                        ratio: *ratio,
                    });
                    pending.push((left, first));
                    pending.push((right, second));
                }
                TreeShape::Stacked { windows } => {
                    tree.pending.insert(node, PendingLeaf::Stacked(*windows));
                }
                TreeShape::Window => {
                    tree.pending.insert(node, PendingLeaf::Window);
                }
                TreeShape::Pseudo => {}
            }
        }
        tree.recompute(cfg, false);
        debug!(leaves = shape.leaf_count(), "restored layout shape");
        Ok(tree)
    }
}
