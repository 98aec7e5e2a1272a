//! Borrowed row-major feature matrices.

use super::scalar::Feature;
use super::{DataPointId, FeatureId};

/// Contract violations in caller-supplied data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DatasetError {
    /// The feature count is zero.
    #[error("dataset has zero features")]
    NoFeatures,

    /// The raw entry count is not a multiple of the feature count.
    #[error("data length {len} is not a multiple of the feature count {features}")]
    RaggedData { len: usize, features: usize },

    /// A feature value is NaN.
    #[error("feature value at point {point}, feature {feature} is not a number")]
    NotANumber { point: DataPointId, feature: FeatureId },

    /// Point and label counts differ.
    #[error("point count {points} does not match label count {labels}")]
    LabelCountMismatch { points: usize, labels: usize },

    /// The supplied points have a different feature count than the model.
    #[error("feature count {got} does not match the expected feature count {expected}")]
    FeatureCountMismatch { expected: usize, got: usize },
}

/// A borrowed row-major matrix of `point_count * feature_count` values.
///
/// The caller owns the storage for the duration of training or
/// classification; mutation while a view is in use is a contract violation.
#[derive(Debug, Clone, Copy)]
pub struct PointsView<'a, F: Feature> {
    values: &'a [F],
    feature_count: usize,
}

impl<'a, F: Feature> PointsView<'a, F> {
    /// Wrap a row-major slice.
    ///
    /// Fails when `feature_count` is zero or the slice length is not a
    /// multiple of it.
    pub fn new(values: &'a [F], feature_count: usize) -> Result<Self, DatasetError> {
        if feature_count == 0 {
            return Err(DatasetError::NoFeatures);
        }
        if values.len() % feature_count != 0 {
            return Err(DatasetError::RaggedData {
                len: values.len(),
                features: feature_count,
            });
        }
        Ok(Self {
            values,
            feature_count,
        })
    }

    /// Number of features per point.
    #[inline]
    pub fn feature_count(&self) -> usize {
        self.feature_count
    }

    /// Number of points.
    #[inline]
    pub fn point_count(&self) -> usize {
        self.values.len() / self.feature_count
    }

    /// One feature value of one point.
    #[inline]
    pub fn value(&self, point: DataPointId, feature: FeatureId) -> F {
        self.values[point as usize * self.feature_count + feature as usize]
    }

    /// The underlying row-major slice.
    #[inline]
    pub fn values(&self) -> &'a [F] {
        self.values
    }
}
