//! Per-feature sorted point indices.
//!
//! For each feature the index holds one entry per point, sorted ascending by
//! feature value. Entries belonging to one tree node occupy a contiguous
//! range at the same offset in every feature's sequence; splitting a node
//! stably partitions each range in place, so both halves stay sorted.

use std::cmp::Ordering;

use crate::data::{DataPointId, DatasetError, Feature, FeatureId, Label, PointsView};

/// One point in a single-feature sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct IndexEntry<F> {
    pub value: F,
    pub point: DataPointId,
    pub label: Label,
}

/// Sorted point indices for every feature of a dataset.
///
/// Building the index pays the full sort cost; cloning it is a flat copy.
/// The ensemble trainer builds one index for the template tree and clones it
/// per ensemble member.
#[derive(Debug, Clone)]
pub struct FeatureIndex<F: Feature> {
    columns: Vec<Vec<IndexEntry<F>>>,
    point_count: usize,
}

impl<F: Feature> FeatureIndex<F> {
    /// Enumerate and sort all points once per feature.
    ///
    /// Fails with [`DatasetError::NotANumber`] on the first NaN encountered.
    pub fn build(points: &PointsView<'_, F>, labels: &[Label]) -> Result<Self, DatasetError> {
        let point_count = points.point_count();
        let feature_count = points.feature_count();
        debug_assert_eq!(labels.len(), point_count);

        let mut columns = Vec::with_capacity(feature_count);
        for feature in 0..feature_count as FeatureId {
            let mut column = Vec::with_capacity(point_count);
            for point in 0..point_count as DataPointId {
                let value = points.value(point, feature);
                if value.is_nan() {
                    return Err(DatasetError::NotANumber { point, feature });
                }
                column.push(IndexEntry {
                    value,
                    point,
                    label: labels[point as usize],
                });
            }
            // NaN is rejected above, so the value order is total.
            column.sort_by(|a, b| a.value.partial_cmp(&b.value).unwrap_or(Ordering::Equal));
            columns.push(column);
        }

        Ok(Self {
            columns,
            point_count,
        })
    }

    /// Number of features.
    #[inline]
    pub fn feature_count(&self) -> usize {
        self.columns.len()
    }

    /// Number of points per feature sequence.
    #[inline]
    pub fn point_count(&self) -> usize {
        self.point_count
    }

    /// The contiguous range of one node in one feature's sequence.
    #[inline]
    pub(crate) fn range(&self, feature: FeatureId, offset: usize, len: usize) -> &[IndexEntry<F>] {
        &self.columns[feature as usize][offset..offset + len]
    }

    /// Stably partition a node's range in one feature's sequence.
    ///
    /// Entries satisfying the predicate (on their point id) move to the front
    /// of the range; relative order is preserved on both sides. Returns the
    /// size of the first half.
    pub(crate) fn partition_range(
        &mut self,
        feature: FeatureId,
        offset: usize,
        len: usize,
        goes_left: impl Fn(DataPointId) -> bool,
    ) -> usize {
        let range = &mut self.columns[feature as usize][offset..offset + len];
        let mut left = Vec::with_capacity(len);
        let mut right = Vec::with_capacity(len);
        for &entry in range.iter() {
            if goes_left(entry.point) {
                left.push(entry);
            } else {
                right.push(entry);
            }
        }
        let left_len = left.len();
        range[..left_len].copy_from_slice(&left);
        range[left_len..].copy_from_slice(&right);
        left_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_sorted_columns() {
        let data = [3.0f64, 10.0, 1.0, 30.0, 2.0, 20.0];
        let points = PointsView::new(&data, 2).unwrap();
        let index = FeatureIndex::build(&points, &[0, 1, 1]).unwrap();

        assert_eq!(index.feature_count(), 2);
        assert_eq!(index.point_count(), 3);

        let first: Vec<_> = index.range(0, 0, 3).iter().map(|e| e.point).collect();
        assert_eq!(first, vec![1, 2, 0]);
        let second: Vec<_> = index.range(1, 0, 3).iter().map(|e| e.point).collect();
        assert_eq!(second, vec![0, 1, 2]);
    }

    #[test]
    fn equal_values_preserve_point_order() {
        let data = [5.0f64, 5.0, 5.0, 5.0];
        let points = PointsView::new(&data, 1).unwrap();
        let index = FeatureIndex::build(&points, &[0, 0, 1, 1]).unwrap();
        let order: Vec<_> = index.range(0, 0, 4).iter().map(|e| e.point).collect();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn rejects_nan() {
        let data = [1.0f64, f64::NAN];
        let points = PointsView::new(&data, 1).unwrap();
        let err = FeatureIndex::build(&points, &[0, 1]).unwrap_err();
        assert_eq!(err, DatasetError::NotANumber { point: 1, feature: 0 });
    }

    #[test]
    fn partition_is_stable_and_keeps_ranges_sorted() {
        // Feature 0 decides the side; feature 1 carries duplicate values so
        // stability is observable.
        let data = [
            0.0f64, 1.0, //
            1.0, 1.0, //
            0.0, 2.0, //
            1.0, 2.0, //
        ];
        let points = PointsView::new(&data, 2).unwrap();
        let mut index = FeatureIndex::build(&points, &[0, 1, 0, 1]).unwrap();

        let left_len = index.partition_range(1, 0, 4, |p| points.value(p, 0) < 1.0);
        assert_eq!(left_len, 2);

        let column: Vec<_> = index.range(1, 0, 4).iter().map(|e| (e.point, e.value)).collect();
        // Left half: points 0 and 2, still ordered by feature 1.
        assert_eq!(column[0], (0, 1.0));
        assert_eq!(column[1], (2, 2.0));
        // Right half: points 1 and 3, still ordered by feature 1.
        assert_eq!(column[2], (1, 1.0));
        assert_eq!(column[3], (3, 2.0));
    }
}
