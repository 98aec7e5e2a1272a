//! canopy: a random-forest training and classification engine for tabular data.
//!
//! The crate builds an ensemble of axis-aligned decision trees from a numeric
//! feature matrix plus integer class labels, persists the trees to a stream,
//! and later applies the ensemble to score unseen points by majority vote.
//!
//! # Key Types
//!
//! - [`ForestTrainer`] / [`ForestTrainerParams`] - Ensemble training with per-tree fan-out
//! - [`IndexedTreeBuilder`] - Single-tree induction over sorted feature indices
//! - [`EnsembleClassifier`] - Vote-based classification over a classifier stream
//! - [`DecisionTree`] - Compact read-only tree in column form
//! - [`Forest`], [`ForestFileReader`], [`ForestFileWriter`] - Classifier streams
//! - [`PointsView`] - Borrowed row-major feature matrix
//!
//! # Training
//!
//! Build a [`PointsView`] over your feature data, pick [`ForestTrainerParams`],
//! and call [`ForestTrainer::train`] with an output stream. The trainer pays
//! the feature-index sort cost once on a template tree and clones it per tree.
//!
//! # Classification
//!
//! Bind an [`EnsembleClassifier`] to any [`ClassifierInputStream`] and call
//! `classify`. With worker threads enabled, trees are fanned out over a job
//! queue and per-worker vote tables are reduced after the workers join.

pub mod data;
pub mod explainability;
pub mod inference;
pub mod io;
pub mod repr;
pub mod training;
pub mod utils;

// =============================================================================
// Convenience Re-exports
// =============================================================================

// Data types (for preparing training and classification inputs)
pub use data::{DataPointId, DatasetError, Feature, FeatureId, Label, PointsView, ScalarKind};

// Tree representation
pub use repr::{DecisionTree, Forest, NodeId, TreeValidationError};

// Training
pub use training::{
    ForestTrainer, ForestTrainerParams, IndexedTreeBuilder, LabelFrequencyTable, TrainError,
    TreeBuilderParams, Verbosity,
};

// Classification
pub use inference::{ClassifyError, EnsembleClassifier, VoteTable};

// Streams and persistence
pub use io::{
    ClassifierInputStream, ClassifierOutputStream, ForestFileReader, ForestFileWriter, StreamError,
};

// Explainability
pub use explainability::feature_importances;

// Shared utilities
pub use utils::{run_with_threads, Parallelism};
