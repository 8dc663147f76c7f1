pub mod geometry;
pub mod stack;
pub mod tree;
pub mod window;

pub use stack::{EntryId, StackId, StackMap};
pub use tree::{NodeId, NodeMap, Side};
pub use window::WindowId;
