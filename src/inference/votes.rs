//! Vote accumulation tables.

use std::ops::AddAssign;

use ndarray::Array2;

use crate::data::{DataPointId, Label};

/// A `point_count x class_count` table of vote counters.
///
/// Each voter adds `+1` to the entry of its predicted class per point. Vote
/// aggregation is associative and commutative, so worker-private tables can
/// be summed in any order without changing the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteTable {
    counts: Array2<u32>,
}

impl VoteTable {
    /// Create a zeroed table.
    pub fn new(point_count: usize, class_count: usize) -> Self {
        Self {
            counts: Array2::zeros((point_count, class_count)),
        }
    }

    /// Number of points (rows).
    #[inline]
    pub fn point_count(&self) -> usize {
        self.counts.nrows()
    }

    /// Number of classes (columns).
    #[inline]
    pub fn class_count(&self) -> usize {
        self.counts.ncols()
    }

    /// Add one vote for a point's class.
    #[inline]
    pub fn add_vote(&mut self, point: DataPointId, label: Label) {
        self.counts[[point as usize, label as usize]] += 1;
    }

    /// The vote count of one cell.
    #[inline]
    pub fn count(&self, point: usize, class: usize) -> u32 {
        self.counts[[point, class]]
    }

    /// The smallest class id attaining the row maximum.
    pub fn row_argmax(&self, point: usize) -> Label {
        let row = self.counts.row(point);
        let mut best = 0usize;
        let mut best_count = 0u32;
        for (class, &count) in row.iter().enumerate() {
            if count > best_count {
                best = class;
                best_count = count;
            }
        }
        best as Label
    }

    /// The smallest class id maximizing `weights[class] * votes[point, class]`.
    pub fn weighted_row_argmax(&self, point: usize, weights: &[f32]) -> Label {
        debug_assert_eq!(weights.len(), self.class_count());
        let row = self.counts.row(point);
        let mut best = 0usize;
        let mut best_score = f64::NEG_INFINITY;
        for (class, &count) in row.iter().enumerate() {
            let score = weights[class] as f64 * count as f64;
            if score > best_score {
                best = class;
                best_score = score;
            }
        }
        best as Label
    }
}

impl AddAssign<&VoteTable> for VoteTable {
    /// Element-wise merge of another table of identical shape.
    fn add_assign(&mut self, rhs: &VoteTable) {
        debug_assert_eq!(self.counts.dim(), rhs.counts.dim());
        self.counts += &rhs.counts;
    }
}
