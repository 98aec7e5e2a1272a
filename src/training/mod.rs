//! Tree induction and ensemble training.
//!
//! ## Components
//!
//! - [`LabelFrequencyTable`]: per-class counts with incremental update and
//!   Gini impurity
//! - [`WeightedCoin`]: deterministic feature sampling without replacement
//! - [`FeatureIndex`]: per-feature sorted point indices with contiguous-range
//!   partitioning
//! - [`IndexedTreeBuilder`]: grows one tree by repeatedly splitting the best
//!   growable leaf
//! - [`ForestTrainer`]: clones a template tree per ensemble member and grows
//!   them in parallel, streaming finished trees out in completion order
//! - [`TrainingLogger`], [`Verbosity`]: progress logging

mod builder;
mod coin;
mod frequency;
mod index;
mod logger;
mod trainer;

pub use builder::{IndexedTreeBuilder, Split, TreeBuilderParams};
pub use coin::WeightedCoin;
pub use frequency::LabelFrequencyTable;
pub use index::FeatureIndex;
pub use logger::{TrainingLogger, Verbosity};
pub use trainer::{ForestTrainer, ForestTrainerParams, TrainError};
