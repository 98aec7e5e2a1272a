//! Permutation feature importance over a trained ensemble.

use canopy::{
    feature_importances, EnsembleClassifier, Forest, ForestTrainer, ForestTrainerParams,
    PointsView, Verbosity,
};

#[test]
fn informative_feature_dominates_noise_feature() {
    // Feature 0 decides the label; feature 1 is uncorrelated noise.
    let point_count = 200;
    let mut data = Vec::with_capacity(point_count * 2);
    let mut labels = Vec::with_capacity(point_count);
    for i in 0..point_count {
        let signal = ((i * 13) % 100) as f64 / 100.0;
        let noise = ((i * 89) % 97) as f64 / 97.0;
        data.extend([signal, noise]);
        labels.push(u8::from(signal > 0.5));
    }
    let points = PointsView::new(&data, 2).unwrap();

    let mut forest = Forest::new(2, 2);
    let trainer = ForestTrainer::new(ForestTrainerParams {
        tree_count: 25,
        seed: 3,
        verbosity: Verbosity::Silent,
        ..Default::default()
    });
    trainer.train(points, &labels, &mut forest).unwrap();

    let mut ensemble = EnsembleClassifier::new(&mut forest, 0);
    let scores = feature_importances(&mut ensemble, points, &labels, 5, 7).unwrap();

    assert_eq!(scores.len(), 2);
    assert!(
        scores[0] > scores[1] + 0.1,
        "signal {} should clearly beat noise {}",
        scores[0],
        scores[1]
    );
}

#[test]
fn repeats_average_the_accuracy_drop() {
    // With a single constant feature the model cannot be hurt by shuffling,
    // so every importance is exactly zero regardless of repeat count.
    let data = [5.0f64; 30];
    let labels = [1u8; 30];
    let points = PointsView::new(&data, 1).unwrap();

    let mut forest = Forest::new(2, 1);
    let trainer = ForestTrainer::new(ForestTrainerParams {
        tree_count: 4,
        verbosity: Verbosity::Silent,
        ..Default::default()
    });
    trainer.train(points, &labels, &mut forest).unwrap();

    let mut ensemble = EnsembleClassifier::new(&mut forest, 0);
    for repeats in [1, 3] {
        let scores = feature_importances(&mut ensemble, points, &labels, repeats, 0).unwrap();
        assert_eq!(scores, vec![0.0]);
    }
}
