//! Per-class label counts.

use std::fmt;

use crate::data::Label;

/// A frequency table over consecutive label values.
///
/// Supports the O(1) increment/decrement used by the split search when
/// sweeping points from the right side of a candidate split to the left.
///
/// Invariant: the sum of all counts equals `total()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelFrequencyTable {
    counts: Vec<u32>,
    total: u32,
}

impl LabelFrequencyTable {
    /// An empty table able to count labels in `[0, class_count)`.
    pub fn with_classes(class_count: usize) -> Self {
        Self {
            counts: vec![0; class_count],
            total: 0,
        }
    }

    /// Count a list of labels in one pass, sizing the table to `max(label) + 1`.
    pub fn from_labels(labels: &[Label]) -> Self {
        let mut table = Self {
            counts: Vec::new(),
            total: 0,
        };
        for &label in labels {
            if label as usize >= table.counts.len() {
                table.counts.resize(label as usize + 1, 0);
            }
            table.counts[label as usize] += 1;
        }
        table.total = labels.len() as u32;
        table
    }

    /// Increment the count of a label by 1.
    #[inline]
    pub fn increment(&mut self, label: Label) {
        self.counts[label as usize] += 1;
        self.total += 1;
    }

    /// Subtract 1 from the count of a label.
    #[inline]
    pub fn decrement(&mut self, label: Label) {
        debug_assert!(self.counts[label as usize] > 0);
        self.counts[label as usize] -= 1;
        self.total -= 1;
    }

    /// The stored count of a particular label.
    #[inline]
    pub fn count(&self, label: Label) -> u32 {
        self.counts[label as usize]
    }

    /// The sum of all counts.
    #[inline]
    pub fn total(&self) -> u32 {
        self.total
    }

    /// Number of distinct, consecutive label values this table can count.
    #[inline]
    pub fn class_count(&self) -> usize {
        self.counts.len()
    }

    /// The smallest label among those tied for the maximum count.
    pub fn most_frequent(&self) -> Label {
        let mut best = 0;
        let mut best_count = 0;
        for (label, &count) in self.counts.iter().enumerate() {
            if count > best_count {
                best = label;
                best_count = count;
            }
        }
        best as Label
    }

    /// Gini impurity of the counted distribution: `1 - sum(count^2) / total^2`.
    ///
    /// Returns 0 for an empty table.
    pub fn gini(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let squared_sum: u64 = self.counts.iter().map(|&c| c as u64 * c as u64).sum();
        let total = self.total as u64;
        1.0 - squared_sum as f64 / (total * total) as f64
    }

    /// Debug check: the counts must sum to the stored total.
    pub(crate) fn invariant(&self) -> bool {
        self.counts.iter().map(|&c| c as u64).sum::<u64>() == self.total as u64
    }
}

impl fmt::Display for LabelFrequencyTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, count) in self.counts.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{count}")?;
        }
        write!(f, "]")
    }
}
