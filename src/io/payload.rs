//! Serializable tree payloads.
//!
//! Payload structs mirror the runtime tree columns and are encoded with
//! Postcard, one frame per tree. Structural validation happens when a
//! payload is turned back into a [`DecisionTree`].

use serde::{Deserialize, Serialize};

use crate::data::{Feature, FeatureId, Label};
use crate::repr::{DecisionTree, NodeId, TreeValidationError};

/// The five column tables of one compact tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreePayload<F> {
    pub left: Vec<NodeId>,
    pub right: Vec<NodeId>,
    pub split_feature: Vec<FeatureId>,
    pub split_value: Vec<F>,
    pub leaf_label: Vec<Label>,
}

impl<F: Feature> TreePayload<F> {
    /// Snapshot a tree's columns.
    pub fn from_tree(tree: &DecisionTree<F>) -> Self {
        let (left, right, split_feature, split_value, leaf_label) = tree.columns();
        Self {
            left: left.to_vec(),
            right: right.to_vec(),
            split_feature: split_feature.to_vec(),
            split_value: split_value.to_vec(),
            leaf_label: leaf_label.to_vec(),
        }
    }

    /// Rebuild and validate a tree against the model header's counts.
    pub fn into_tree(
        self,
        class_count: u32,
        feature_count: u32,
    ) -> Result<DecisionTree<F>, TreeValidationError> {
        DecisionTree::from_columns(
            class_count,
            feature_count,
            self.left,
            self.right,
            self.split_feature,
            self.split_value,
            self.leaf_label,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_round_trips_through_postcard() {
        let tree: DecisionTree<f32> = DecisionTree::from_columns(
            2,
            1,
            vec![1, 0, 0],
            vec![2, 0, 0],
            vec![0, 0, 0],
            vec![0.5, 0.0, 0.0],
            vec![0, 0, 1],
        )
        .unwrap();

        let bytes = postcard::to_allocvec(&TreePayload::from_tree(&tree)).unwrap();
        let payload: TreePayload<f32> = postcard::from_bytes(&bytes).unwrap();
        let rebuilt = payload.into_tree(2, 1).unwrap();
        assert_eq!(rebuilt, tree);
    }

    #[test]
    fn malformed_payload_is_rejected() {
        let payload = TreePayload::<f32> {
            left: vec![1, 0],
            right: vec![0, 0],
            split_feature: vec![0, 0],
            split_value: vec![0.5, 0.0],
            leaf_label: vec![0, 0],
        };
        assert!(payload.into_tree(2, 1).is_err());
    }
}
