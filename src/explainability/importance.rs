//! Permutation-based feature importance.
//!
//! The importance of a feature is the mean drop in classification accuracy
//! when that feature's column is shuffled across rows, averaged over a
//! number of repeats. The shared dataset is never written; shuffling happens
//! on a privately owned copy.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::data::{Feature, Label, PointsView};
use crate::inference::{ClassifyError, EnsembleClassifier};

/// Per-feature importance scores for a trained ensemble.
///
/// `repeats` must be at least 1. The ensemble sees each perturbed dataset
/// through a fresh classification pass; larger repeat counts smooth out the
/// shuffle noise.
pub fn feature_importances<F: Feature>(
    ensemble: &mut EnsembleClassifier<'_, F>,
    points: PointsView<'_, F>,
    labels: &[Label],
    repeats: usize,
    seed: u64,
) -> Result<Vec<f64>, ClassifyError> {
    assert!(repeats >= 1, "repeat count must be at least 1");
    if labels.len() != points.point_count() {
        return Err(crate::data::DatasetError::LabelCountMismatch {
            points: points.point_count(),
            labels: labels.len(),
        }
        .into());
    }

    let baseline = accuracy(&ensemble.classify(points)?, labels);

    let point_count = points.point_count();
    let feature_count = points.feature_count();
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let mut perturbed = points.values().to_vec();
    let mut importances = vec![0.0; feature_count];

    for feature in 0..feature_count {
        let mut drop_sum = 0.0;
        for _ in 0..repeats {
            let mut column: Vec<F> = (0..point_count)
                .map(|point| perturbed[point * feature_count + feature])
                .collect();
            column.shuffle(&mut rng);
            for (point, value) in column.into_iter().enumerate() {
                perturbed[point * feature_count + feature] = value;
            }

            let view = PointsView::new(&perturbed, feature_count)?;
            drop_sum += baseline - accuracy(&ensemble.classify(view)?, labels);
        }

        // Restore the column before moving on to the next feature.
        for point in 0..point_count {
            perturbed[point * feature_count + feature] =
                points.value(point as u32, feature as u32);
        }
        importances[feature] = drop_sum / repeats as f64;
    }

    Ok(importances)
}

fn accuracy(predicted: &[Label], truth: &[Label]) -> f64 {
    debug_assert_eq!(predicted.len(), truth.len());
    if predicted.is_empty() {
        return 0.0;
    }
    let correct = predicted
        .iter()
        .zip(truth)
        .filter(|(a, b)| a == b)
        .count();
    correct as f64 / predicted.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repr::{DecisionTree, Forest};

    #[test]
    fn accuracy_counts_matches() {
        assert_eq!(accuracy(&[0, 1, 1], &[0, 1, 0]), 2.0 / 3.0);
        assert_eq!(accuracy(&[], &[]), 0.0);
    }

    /// A model that only uses feature 1 of two: shuffling feature 1 hurts,
    /// shuffling feature 0 cannot.
    #[test]
    fn informative_feature_scores_higher() {
        let mut forest = Forest::new(2, 2);
        forest.push_tree(
            DecisionTree::from_columns(
                2,
                2,
                vec![1, 0, 0],
                vec![2, 0, 0],
                vec![1, 0, 0],
                vec![0.5, 0.0, 0.0],
                vec![0, 0, 1],
            )
            .unwrap(),
        );

        // Feature 0 is constant; feature 1 alternates around the threshold.
        let mut data = Vec::new();
        let mut labels = Vec::new();
        for i in 0..40 {
            let x = if i % 2 == 0 { 0.0 } else { 1.0 };
            data.extend([7.0, x]);
            labels.push(u8::from(x >= 0.5));
        }
        let points = PointsView::new(&data, 2).unwrap();

        let mut ensemble = EnsembleClassifier::new(&mut forest, 0);
        let scores = feature_importances(&mut ensemble, points, &labels, 5, 123).unwrap();

        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0], 0.0);
        assert!(scores[1] > 0.2, "importance {} too small", scores[1]);
    }

    #[test]
    fn rejects_label_count_mismatch() {
        let mut forest = Forest::new(2, 1);
        forest.push_tree(
            DecisionTree::from_columns(2, 1, vec![0], vec![0], vec![0], vec![0.0], vec![0])
                .unwrap(),
        );
        let data = [0.0, 1.0];
        let points = PointsView::new(&data, 1).unwrap();
        let mut ensemble = EnsembleClassifier::new(&mut forest, 0);
        assert!(feature_importances(&mut ensemble, points, &[0], 1, 0).is_err());
    }
}
