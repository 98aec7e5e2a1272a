//! Compact decision tree storage.
//!
//! A finalized tree is stored as five parallel columns indexed by node id.
//! The column layout keeps the hot classification path cache-friendly; the
//! training-form node table is discarded on finalize.

use crate::data::{Feature, FeatureId, Label};

use super::NodeId;

/// Structural validation errors for [`DecisionTree`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeValidationError {
    #[error("tree has no nodes")]
    Empty,

    #[error("column length mismatch: {0} nodes expected")]
    ColumnLengthMismatch(usize),

    #[error("node {node}: child {child} out of range ({nodes} nodes)")]
    ChildOutOfRange {
        node: NodeId,
        child: NodeId,
        nodes: usize,
    },

    #[error("node {node}: child {child} does not follow its parent")]
    ChildOrder { node: NodeId, child: NodeId },

    #[error("node {node}: interior node with a missing child")]
    MissingChild { node: NodeId },

    #[error("node {node}: split feature {feature} out of range ({features} features)")]
    SplitFeatureOutOfRange {
        node: NodeId,
        feature: FeatureId,
        features: u32,
    },

    #[error("node {node}: leaf label {label} out of range ({classes} classes)")]
    LabelOutOfRange {
        node: NodeId,
        label: Label,
        classes: u32,
    },
}

/// A read-only decision tree over parallel column tables.
///
/// Interior rows have `left > 0`; points go left iff
/// `value[split_feature] < split_value`. Rows are in depth-first preorder,
/// so every child id is strictly greater than its parent's id.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionTree<F: Feature> {
    class_count: u32,
    feature_count: u32,
    left: Vec<NodeId>,
    right: Vec<NodeId>,
    split_feature: Vec<FeatureId>,
    split_value: Vec<F>,
    leaf_label: Vec<Label>,
}

impl<F: Feature> DecisionTree<F> {
    /// Assemble a tree from its columns, checking all structural invariants.
    #[allow(clippy::too_many_arguments)]
    pub fn from_columns(
        class_count: u32,
        feature_count: u32,
        left: Vec<NodeId>,
        right: Vec<NodeId>,
        split_feature: Vec<FeatureId>,
        split_value: Vec<F>,
        leaf_label: Vec<Label>,
    ) -> Result<Self, TreeValidationError> {
        let tree = Self::new_unchecked(
            class_count,
            feature_count,
            left,
            right,
            split_feature,
            split_value,
            leaf_label,
        );
        tree.validate()?;
        Ok(tree)
    }

    /// Assemble a tree from columns the builder has already proven valid.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new_unchecked(
        class_count: u32,
        feature_count: u32,
        left: Vec<NodeId>,
        right: Vec<NodeId>,
        split_feature: Vec<FeatureId>,
        split_value: Vec<F>,
        leaf_label: Vec<Label>,
    ) -> Self {
        Self {
            class_count,
            feature_count,
            left,
            right,
            split_feature,
            split_value,
            leaf_label,
        }
    }

    /// Number of classes distinguished by this tree.
    #[inline]
    pub fn class_count(&self) -> u32 {
        self.class_count
    }

    /// Number of features the tree expects per point.
    #[inline]
    pub fn feature_count(&self) -> u32 {
        self.feature_count
    }

    /// Number of nodes.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.left.len()
    }

    /// A node is a leaf iff it has no left child.
    #[inline]
    pub fn is_leaf(&self, node: NodeId) -> bool {
        self.left[node as usize] == 0
    }

    /// Left child id of an interior node.
    #[inline]
    pub fn left(&self, node: NodeId) -> NodeId {
        self.left[node as usize]
    }

    /// Right child id of an interior node.
    #[inline]
    pub fn right(&self, node: NodeId) -> NodeId {
        self.right[node as usize]
    }

    /// Split feature of an interior node.
    #[inline]
    pub fn split_feature(&self, node: NodeId) -> FeatureId {
        self.split_feature[node as usize]
    }

    /// Split threshold of an interior node.
    #[inline]
    pub fn split_value(&self, node: NodeId) -> F {
        self.split_value[node as usize]
    }

    /// Majority label of a node.
    #[inline]
    pub fn leaf_label(&self, node: NodeId) -> Label {
        self.leaf_label[node as usize]
    }

    /// Check the structural invariants.
    ///
    /// Used on every tree decoded from a persisted model: child ids must be
    /// in range and strictly greater than the parent row, an interior node
    /// must have both children, split features must be in range, and leaf
    /// labels must be below the class count.
    pub fn validate(&self) -> Result<(), TreeValidationError> {
        let nodes = self.left.len();
        if nodes == 0 {
            return Err(TreeValidationError::Empty);
        }
        if self.right.len() != nodes
            || self.split_feature.len() != nodes
            || self.split_value.len() != nodes
            || self.leaf_label.len() != nodes
        {
            return Err(TreeValidationError::ColumnLengthMismatch(nodes));
        }

        for node in 0..nodes as NodeId {
            let left = self.left[node as usize];
            let right = self.right[node as usize];
            if left == 0 {
                if right != 0 {
                    return Err(TreeValidationError::MissingChild { node });
                }
                let label = self.leaf_label[node as usize];
                if label as u32 >= self.class_count {
                    return Err(TreeValidationError::LabelOutOfRange {
                        node,
                        label,
                        classes: self.class_count,
                    });
                }
                continue;
            }
            if right == 0 {
                return Err(TreeValidationError::MissingChild { node });
            }
            for child in [left, right] {
                if child as usize >= nodes {
                    return Err(TreeValidationError::ChildOutOfRange { node, child, nodes });
                }
                if child <= node {
                    return Err(TreeValidationError::ChildOrder { node, child });
                }
            }
            let feature = self.split_feature[node as usize];
            if feature >= self.feature_count {
                return Err(TreeValidationError::SplitFeatureOutOfRange {
                    node,
                    feature,
                    features: self.feature_count,
                });
            }
        }
        Ok(())
    }

    /// Borrow all five columns at once, for serialization.
    pub(crate) fn columns(&self) -> (&[NodeId], &[NodeId], &[FeatureId], &[F], &[Label]) {
        (
            &self.left,
            &self.right,
            &self.split_feature,
            &self.split_value,
            &self.leaf_label,
        )
    }
}
