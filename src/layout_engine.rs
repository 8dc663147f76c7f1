mod container;
pub mod engine;
mod error;
pub(crate) mod graph;
mod mutate;
mod navigate;
mod reconcile;
mod shape;
mod tree;

pub use container::{
    Container, SplitKind, left_vertical, lower_horizontal, optimal_orientation, right_vertical,
    upper_horizontal,
};
pub use engine::{
    ApplyContainer, EventResponse, LayoutCommand, LayoutEngine, LayoutEvent, LayoutHost,
    MemoryHost, ScreenContext, ScreenId, ScreenInfo, WindowSnapshot,
};
pub use error::LayoutError;
pub use graph::{LayoutMode, Orientation, Rotation, SplitMode};
pub use navigate::LeafRef;
pub use shape::TreeShape;
pub use tree::{LayoutTree, Leaf, LeafKind, NodeKind};

#[cfg(test)]
mod tests;
