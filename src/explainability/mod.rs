//! Model explainability.

mod importance;

pub use importance::feature_importances;
