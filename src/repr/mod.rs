//! Canonical model representation: compact trees and in-memory forests.

mod forest;
mod tree;

pub use forest::Forest;
pub use tree::{DecisionTree, TreeValidationError};

/// Node identifier within a tree. Row 0 is the root; a left child id of 0
/// marks a leaf (the root is never a child).
pub type NodeId = u32;
