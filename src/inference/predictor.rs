//! Bulk classification over a compact tree.
//!
//! Instead of routing points one by one, the whole point-id list is
//! partitioned in place down the tree: at an interior node the current
//! sub-range is split into the `< threshold` prefix and the `>= threshold`
//! suffix, and both halves descend into the respective child. At a leaf,
//! every point id in the range votes for the leaf label.

use crate::data::{DataPointId, DatasetError, Feature, PointsView};
use crate::repr::{DecisionTree, NodeId};

use super::votes::VoteTable;

impl<F: Feature> DecisionTree<F> {
    /// Bulk-classify a sequence of points.
    pub fn classify(&self, points: PointsView<'_, F>) -> Result<Vec<crate::data::Label>, DatasetError> {
        let mut table = VoteTable::new(points.point_count(), self.class_count() as usize);
        self.classify_and_vote(points, &mut table)?;
        Ok((0..points.point_count()).map(|p| table.row_argmax(p)).collect())
    }

    /// Bulk-classify a set of points, adding one vote per point to the table
    /// entry of its predicted class. Returns the number of voters (1).
    pub fn classify_and_vote(
        &self,
        points: PointsView<'_, F>,
        table: &mut VoteTable,
    ) -> Result<u32, DatasetError> {
        if points.feature_count() != self.feature_count() as usize {
            return Err(DatasetError::FeatureCountMismatch {
                expected: self.feature_count() as usize,
                got: points.feature_count(),
            });
        }
        debug_assert_eq!(table.point_count(), points.point_count());
        debug_assert_eq!(table.class_count(), self.class_count() as usize);
        self.vote_into(points, table);
        Ok(1)
    }

    /// Voting core; the input shape must have been validated.
    pub(crate) fn vote_into(&self, points: PointsView<'_, F>, table: &mut VoteTable) {
        let point_count = points.point_count();
        let mut ids: Vec<DataPointId> = (0..point_count as DataPointId).collect();

        let mut stack: Vec<(NodeId, usize, usize)> = vec![(0, 0, point_count)];
        while let Some((node, start, end)) = stack.pop() {
            if self.is_leaf(node) {
                let label = self.leaf_label(node);
                for &point in &ids[start..end] {
                    table.add_vote(point, label);
                }
                continue;
            }
            let feature = self.split_feature(node);
            let threshold = self.split_value(node);
            let mid = start
                + partition_in_place(&mut ids[start..end], |point| {
                    points.value(point, feature) < threshold
                });
            stack.push((self.right(node), mid, end));
            stack.push((self.left(node), start, mid));
        }
    }
}

/// Partition a slice so that elements satisfying the predicate come first.
/// Returns the length of the first half. Order within halves is unspecified.
fn partition_in_place<T: Copy>(slice: &mut [T], pred: impl Fn(T) -> bool) -> usize {
    let mut first = 0;
    for i in 0..slice.len() {
        if pred(slice[i]) {
            slice.swap(first, i);
            first += 1;
        }
    }
    first
}
