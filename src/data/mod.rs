//! Data handling: feature scalars, borrowed matrices, and table loading.
//!
//! The engine works on borrowed row-major feature data. Callers own the
//! storage; [`PointsView`] wraps it with shape validation and indexed access.

mod dataset;
mod scalar;

pub mod tables;

pub use dataset::{DatasetError, PointsView};
pub use scalar::{Feature, ScalarKind};

/// Dense integer identifying a row of the feature matrix.
pub type DataPointId = u32;

/// Dense integer identifying a feature column.
pub type FeatureId = u32;

/// Class index of a data point. Class counts are derived as `max(label) + 1`.
pub type Label = u8;
