//! Classification: single-tree voting and the ensemble worker pool.

mod ensemble;
mod predictor;
mod votes;

pub use ensemble::{ClassifyError, EnsembleClassifier};
pub use votes::VoteTable;
