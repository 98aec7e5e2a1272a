//! Indexed tree builder.
//!
//! Grows one decision tree over a [`FeatureIndex`] by repeatedly splitting
//! the best growable leaf, FIFO over a growable-leaf queue. Splitting a node
//! stably partitions its contiguous range in every feature sequence, so
//! child nodes again own contiguous sorted ranges and no re-sorting is ever
//! needed.
//!
//! Building a tree from scratch pays the full sort cost in
//! [`IndexedTreeBuilder::new`]. When training an ensemble on the same data,
//! construct one template builder and [`Clone`] it per tree; each clone is
//! reseeded before growing.

use std::collections::VecDeque;
use std::io::Write;

use crate::data::{Feature, FeatureId, Label, PointsView};
use crate::repr::{DecisionTree, NodeId};

use super::coin::WeightedCoin;
use super::frequency::LabelFrequencyTable;
use super::index::FeatureIndex;

// =============================================================================
// Parameters
// =============================================================================

/// Parameters for growing a single tree.
#[derive(Clone, Copy, Debug)]
pub struct TreeBuilderParams {
    /// Number of randomly selected features to consider per split.
    /// Must be in `[1, feature_count]`.
    pub features_to_consider: usize,

    /// Inclusive cap on the distance of a node to the root.
    /// `u32::MAX` means unlimited.
    pub max_depth: u32,

    /// A leaf with Gini impurity at or below this threshold is not grown.
    /// `0.0` grows while any impurity remains; values at or above
    /// `(classes - 1) / classes` grow nothing.
    pub impurity_threshold: f64,
}

impl Default for TreeBuilderParams {
    fn default() -> Self {
        Self {
            features_to_consider: 1,
            max_depth: u32::MAX,
            impurity_threshold: 0.0,
        }
    }
}

// =============================================================================
// Splits and candidates
// =============================================================================

/// An axis-aligned division: a point goes left iff `value[feature] < value`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Split<F> {
    pub feature: FeatureId,
    pub value: F,
}

/// A split candidate plus the label counts of both resulting halves.
///
/// The default candidate is invalid: its impurity is infinite, so any real
/// split replaces it.
#[derive(Clone, Debug)]
struct SplitCandidate<F> {
    split: Split<F>,
    left_counts: LabelFrequencyTable,
    right_counts: LabelFrequencyTable,
    impurity: f64,
}

impl<F: Feature> SplitCandidate<F> {
    fn invalid() -> Self {
        Self {
            split: Split {
                feature: 0,
                value: F::default(),
            },
            left_counts: LabelFrequencyTable::with_classes(0),
            right_counts: LabelFrequencyTable::with_classes(0),
            impurity: f64::INFINITY,
        }
    }

    fn new(
        split: Split<F>,
        left_counts: LabelFrequencyTable,
        right_counts: LabelFrequencyTable,
    ) -> Self {
        let left_total = left_counts.total() as f64;
        let right_total = right_counts.total() as f64;
        let impurity = (left_counts.gini() * left_total + right_counts.gini() * right_total)
            / (left_total + right_total);
        Self {
            split,
            left_counts,
            right_counts,
            impurity,
        }
    }

    /// Any real split has an impurity of at most 1.
    fn is_valid(&self) -> bool {
        self.impurity <= 1.0
    }
}

// =============================================================================
// Training nodes
// =============================================================================

/// A node of the tree under construction.
///
/// Nodes live in a single dense array owned by the builder; child links are
/// indices into that array. `left == 0` discriminates leaves (node 0 is the
/// root, which is never a child).
#[derive(Clone, Debug)]
struct TrainingNode<F> {
    left: NodeId,
    right: NodeId,
    /// Offset of this node's range in every feature sequence.
    index_offset: u32,
    distance_to_root: u32,
    counts: LabelFrequencyTable,
    split: Split<F>,
}

impl<F: Feature> TrainingNode<F> {
    fn new(counts: LabelFrequencyTable, index_offset: u32, distance_to_root: u32) -> Self {
        Self {
            left: 0,
            right: 0,
            index_offset,
            distance_to_root,
            counts,
            split: Split {
                feature: 0,
                value: F::default(),
            },
        }
    }

    #[inline]
    fn is_leaf(&self) -> bool {
        self.left == 0
    }

    #[inline]
    fn point_count(&self) -> u32 {
        self.counts.total()
    }
}

// =============================================================================
// IndexedTreeBuilder
// =============================================================================

/// A decision tree with an internal search index for fast training.
#[derive(Clone, Debug)]
pub struct IndexedTreeBuilder<'a, F: Feature> {
    points: PointsView<'a, F>,
    params: TreeBuilderParams,
    index: FeatureIndex<F>,
    nodes: Vec<TrainingNode<F>>,
    growable: VecDeque<NodeId>,
    coin: WeightedCoin,
    class_count: usize,
}

impl<'a, F: Feature> IndexedTreeBuilder<'a, F> {
    /// Create a builder with one root node covering all points.
    ///
    /// This is the expensive operation: it builds and sorts the per-feature
    /// point index. Clone the result to start additional trees on the same
    /// data without re-sorting.
    pub fn new(
        points: PointsView<'a, F>,
        labels: &[Label],
        params: TreeBuilderParams,
    ) -> Result<Self, crate::data::DatasetError> {
        debug_assert!(
            params.features_to_consider >= 1
                && params.features_to_consider <= points.feature_count()
        );
        debug_assert!((0.0..=1.0).contains(&params.impurity_threshold));

        let index = FeatureIndex::build(&points, labels)?;
        let counts = LabelFrequencyTable::from_labels(labels);
        debug_assert!(counts.invariant());
        let class_count = counts.class_count();

        let mut builder = Self {
            points,
            params,
            index,
            nodes: vec![TrainingNode::new(counts, 0, 0)],
            growable: VecDeque::new(),
            coin: WeightedCoin::seed_from_u64(0),
            class_count,
        };
        if builder.is_growable_node(0) {
            builder.growable.push_back(0);
        }
        Ok(builder)
    }

    /// Number of classes distinguished by this tree.
    pub fn class_count(&self) -> usize {
        self.class_count
    }

    /// Number of nodes created so far.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Reinitialize the random engine that selects features per split.
    pub fn reseed(&mut self, seed: u64) {
        self.coin.reseed(seed);
    }

    /// True iff there are any growable leaves left.
    pub fn is_growable(&self) -> bool {
        !self.growable.is_empty()
    }

    /// Grow the entire tree until no more progress is possible.
    pub fn grow(&mut self) {
        while let Some(leaf) = self.growable.pop_front() {
            self.grow_leaf(leaf);
        }
    }

    /// Grow one of the remaining growable leaves.
    ///
    /// Returns false when no growable leaf remains.
    pub fn grow_next_leaf(&mut self) -> bool {
        match self.growable.pop_front() {
            Some(leaf) => {
                self.grow_leaf(leaf);
                true
            }
            None => false,
        }
    }

    fn grow_leaf(&mut self, node: NodeId) {
        debug_assert!(self.nodes[node as usize].is_leaf());
        let candidate = self.find_best_split(node);
        // A leaf without a valid split is closed; it keeps its majority label.
        if candidate.is_valid() {
            self.apply_split(node, candidate);
        }
    }

    /// Find the best split over a random subset of features, falling back to
    /// the skipped features when the subset yields nothing valid.
    fn find_best_split(&mut self, node: NodeId) -> SplitCandidate<F> {
        let feature_count = self.index.feature_count() as FeatureId;
        let mut remaining = self.params.features_to_consider as u32;
        let mut skipped = Vec::with_capacity(feature_count as usize);
        let mut best = SplitCandidate::invalid();

        for feature in 0..feature_count {
            let features_left = feature_count - feature;
            if !self.coin.flip(remaining, features_left) {
                skipped.push(feature);
                continue;
            }
            remaining -= 1;
            best = self.best_split_for_feature(node, feature, best);
        }
        debug_assert_eq!(
            skipped.len(),
            self.index.feature_count() - self.params.features_to_consider
        );

        if best.is_valid() {
            return best;
        }

        // No valid split among the considered features: scan the skipped ones
        // in id order and take the first valid candidate.
        for feature in skipped {
            best = self.best_split_for_feature(node, feature, best);
            if best.is_valid() {
                return best;
            }
        }

        // All points in this node share identical feature vectors. The node
        // cannot be split; differing labels fall back to the majority.
        best
    }

    /// Scan one feature's range for a split better than the incumbent.
    ///
    /// Walks the node's sorted range once, keeping running left/right label
    /// counts. A candidate is evaluated at every block boundary, i.e. between
    /// two distinct feature values; blocks of equal values are never split.
    fn best_split_for_feature(
        &self,
        node: NodeId,
        feature: FeatureId,
        incumbent: SplitCandidate<F>,
    ) -> SplitCandidate<F> {
        let node = &self.nodes[node as usize];
        let entries = self
            .index
            .range(feature, node.index_offset as usize, node.point_count() as usize);
        debug_assert!(!entries.is_empty());

        let mut best = incumbent;
        let mut block_value = entries[0].value;
        let mut left_counts = LabelFrequencyTable::with_classes(self.class_count);
        let mut right_counts = node.counts.clone();

        for entry in entries {
            if entry.value > block_value {
                let candidate = SplitCandidate::new(
                    Split {
                        feature,
                        value: entry.value,
                    },
                    left_counts.clone(),
                    right_counts.clone(),
                );
                if candidate.impurity < best.impurity {
                    best = candidate;
                }
            }
            block_value = entry.value;
            left_counts.increment(entry.label);
            right_counts.decrement(entry.label);
        }

        best
    }

    /// Apply a split to a leaf node.
    ///
    /// Partitions the node's range in every non-split feature sequence (the
    /// split feature's range is already partitioned by construction), then
    /// allocates both children and enqueues the growable ones.
    fn apply_split(&mut self, node_id: NodeId, candidate: SplitCandidate<F>) {
        let (offset, count, depth) = {
            let node = &self.nodes[node_id as usize];
            debug_assert!(node.is_leaf());
            (node.index_offset, node.point_count(), node.distance_to_root)
        };

        let left_total = candidate.left_counts.total();
        debug_assert!(left_total > 0 && left_total < count);

        let points = self.points;
        let split = candidate.split;
        for feature in 0..self.index.feature_count() as FeatureId {
            if feature == split.feature {
                continue;
            }
            let left_len = self.index.partition_range(
                feature,
                offset as usize,
                count as usize,
                |point| points.value(point, split.feature) < split.value,
            );
            debug_assert_eq!(left_len as u32, left_total);
        }

        let left_id = self.nodes.len() as NodeId;
        let right_id = left_id + 1;
        self.nodes.push(TrainingNode::new(
            candidate.left_counts,
            offset,
            depth + 1,
        ));
        self.nodes.push(TrainingNode::new(
            candidate.right_counts,
            offset + left_total,
            depth + 1,
        ));

        let parent = &mut self.nodes[node_id as usize];
        parent.left = left_id;
        parent.right = right_id;
        parent.split = split;

        if self.is_growable_node(left_id) {
            self.growable.push_back(left_id);
        }
        if self.is_growable_node(right_id) {
            self.growable.push_back(right_id);
        }
    }

    /// True iff it is still meaningful to grow the given leaf.
    fn is_growable_node(&self, node: NodeId) -> bool {
        let node = &self.nodes[node as usize];
        debug_assert!(node.is_leaf());
        node.distance_to_root < self.params.max_depth
            && node.counts.gini() > self.params.impurity_threshold
    }

    /// Convert to a compact tree.
    ///
    /// Nodes are renumbered in depth-first preorder, so row 0 is the root and
    /// every child row follows its parent. Leaf labels are recomputed from
    /// the label counts.
    pub fn finalize(&self) -> DecisionTree<F> {
        let node_count = self.nodes.len();
        let mut order = Vec::with_capacity(node_count);
        let mut remap = vec![0 as NodeId; node_count];
        let mut stack = vec![0 as NodeId];
        while let Some(id) = stack.pop() {
            remap[id as usize] = order.len() as NodeId;
            order.push(id);
            let node = &self.nodes[id as usize];
            if !node.is_leaf() {
                stack.push(node.right);
                stack.push(node.left);
            }
        }

        let mut left = Vec::with_capacity(node_count);
        let mut right = Vec::with_capacity(node_count);
        let mut split_feature = Vec::with_capacity(node_count);
        let mut split_value = Vec::with_capacity(node_count);
        let mut leaf_label = Vec::with_capacity(node_count);
        for &id in &order {
            let node = &self.nodes[id as usize];
            if node.is_leaf() {
                left.push(0);
                right.push(0);
            } else {
                left.push(remap[node.left as usize]);
                right.push(remap[node.right as usize]);
            }
            split_feature.push(node.split.feature);
            split_value.push(node.split.value);
            leaf_label.push(node.counts.most_frequent());
        }

        DecisionTree::new_unchecked(
            self.class_count as u32,
            self.points.feature_count() as u32,
            left,
            right,
            split_feature,
            split_value,
            leaf_label,
        )
    }

    /// Write the tree under construction as a Graphviz digraph.
    pub fn write_graphviz<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "digraph G")?;
        writeln!(out, "{{")?;
        for (id, node) in self.nodes.iter().enumerate() {
            writeln!(
                out,
                "    node{id}[shape=box label=\"N{id} = {} counts: {}\"]",
                node.counts.most_frequent(),
                node.counts
            )?;
            if !node.is_leaf() {
                writeln!(
                    out,
                    "    node{id} -> node{} [label=\"F{} < {}\"];",
                    node.left, node.split.feature, node.split.value
                )?;
                writeln!(out, "    node{id} -> node{};", node.right)?;
            }
        }
        writeln!(out, "}}")
    }
}
