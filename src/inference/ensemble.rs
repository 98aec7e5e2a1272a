//! Ensemble classification over a classifier stream.
//!
//! The ensemble rewinds its stream per classification pass and lets every
//! tree vote. In parallel mode a fixed pool of worker threads drains a
//! shared job queue of trees; each worker accumulates votes in a private
//! table, so no locking happens during accumulation. The main thread feeds
//! the queue, joins the workers, and reduces the private tables into the
//! caller's table. Vote aggregation is associative and commutative, so the
//! result does not depend on worker scheduling.

use std::sync::mpsc;
use std::sync::Arc;
use std::sync::Mutex;
use std::thread;

use crate::data::{DatasetError, Feature, Label, PointsView};
use crate::io::{ClassifierInputStream, StreamError};
use crate::repr::DecisionTree;

use super::votes::VoteTable;

/// Errors surfaced during ensemble classification.
#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    /// Contract violation in the supplied points or weights.
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    /// Failure while reading the classifier stream.
    #[error(transparent)]
    Stream(#[from] StreamError),

    /// Class weight vector has the wrong length.
    #[error("expected {expected} class weights, got {got}")]
    WeightCountMismatch { expected: usize, got: usize },

    /// Class weights must be non-negative.
    #[error("class weight for class {class} is negative: {weight}")]
    NegativeWeight { class: usize, weight: f32 },
}

/// A classifier that lets multiple underlying tree classifiers come to a
/// vote-based decision.
///
/// Holds exclusive access to its classifier stream: every classification
/// pass rewinds the stream and consumes it in full.
pub struct EnsembleClassifier<'a, F: Feature> {
    stream: &'a mut dyn ClassifierInputStream<F>,
    max_worker_threads: usize,
    class_weights: Vec<f32>,
}

impl<'a, F: Feature> EnsembleClassifier<'a, F> {
    /// Create an ensemble classifier.
    ///
    /// `max_worker_threads` is the number of threads created in addition to
    /// the calling thread; 0 classifies inline.
    pub fn new(stream: &'a mut dyn ClassifierInputStream<F>, max_worker_threads: usize) -> Self {
        let class_count = stream.class_count();
        Self {
            stream,
            max_worker_threads,
            class_weights: vec![1.0; class_count],
        }
    }

    /// Number of classes distinguished by this classifier.
    pub fn class_count(&self) -> usize {
        self.stream.class_count()
    }

    /// Number of features the classifier expects.
    pub fn feature_count(&self) -> usize {
        self.stream.feature_count()
    }

    /// Set the relative weight of each class.
    ///
    /// Weights multiply the vote totals before the final argmax. There must
    /// be one non-negative weight per class.
    pub fn set_class_weights(&mut self, weights: Vec<f32>) -> Result<(), ClassifyError> {
        if weights.len() != self.class_weights.len() {
            return Err(ClassifyError::WeightCountMismatch {
                expected: self.class_weights.len(),
                got: weights.len(),
            });
        }
        if let Some((class, &weight)) = weights.iter().enumerate().find(|(_, &w)| w < 0.0) {
            return Err(ClassifyError::NegativeWeight { class, weight });
        }
        self.class_weights = weights;
        Ok(())
    }

    /// Bulk-classify a sequence of points.
    pub fn classify(&mut self, points: PointsView<'_, F>) -> Result<Vec<Label>, ClassifyError> {
        let mut votes = VoteTable::new(points.point_count(), self.class_count());
        self.classify_and_vote(points, &mut votes)?;
        Ok((0..points.point_count())
            .map(|point| votes.weighted_row_argmax(point, &self.class_weights))
            .collect())
    }

    /// Let every classifier in the stream vote on the points.
    ///
    /// Returns the number of classifiers that voted. The vote table must
    /// have one row per point and one column per class.
    pub fn classify_and_vote(
        &mut self,
        points: PointsView<'_, F>,
        table: &mut VoteTable,
    ) -> Result<u32, ClassifyError> {
        if points.feature_count() != self.stream.feature_count() {
            return Err(DatasetError::FeatureCountMismatch {
                expected: self.stream.feature_count(),
                got: points.feature_count(),
            }
            .into());
        }
        debug_assert_eq!(table.point_count(), points.point_count());
        debug_assert_eq!(table.class_count(), self.class_count());

        self.stream.rewind()?;
        if self.max_worker_threads == 0 {
            self.vote_single_threaded(points, table)
        } else {
            self.vote_multi_threaded(points, table)
        }
    }

    fn vote_single_threaded(
        &mut self,
        points: PointsView<'_, F>,
        table: &mut VoteTable,
    ) -> Result<u32, ClassifyError> {
        let mut voters = 0;
        while let Some(tree) = self.stream.next_classifier()? {
            tree.vote_into(points, table);
            voters += 1;
        }
        Ok(voters)
    }

    fn vote_multi_threaded(
        &mut self,
        points: PointsView<'_, F>,
        table: &mut VoteTable,
    ) -> Result<u32, ClassifyError> {
        let point_count = points.point_count();
        let class_count = self.class_count();

        let (sender, receiver) = mpsc::channel::<Arc<DecisionTree<F>>>();
        let queue = Mutex::new(receiver);

        let mut voters = 0u32;
        let mut feed_result: Result<(), StreamError> = Ok(());
        let mut worker_tables = Vec::with_capacity(self.max_worker_threads);

        thread::scope(|scope| {
            let handles: Vec<_> = (0..self.max_worker_threads)
                .map(|_| {
                    let queue = &queue;
                    scope.spawn(move || {
                        let mut votes = VoteTable::new(point_count, class_count);
                        loop {
                            // Closing the sender ends the stream of jobs and
                            // shuts the workers down.
                            let job = match queue.lock() {
                                Ok(guard) => guard.recv(),
                                Err(_) => break,
                            };
                            match job {
                                Ok(tree) => tree.vote_into(points, &mut votes),
                                Err(_) => break,
                            }
                        }
                        votes
                    })
                })
                .collect();

            loop {
                match self.stream.next_classifier() {
                    Ok(Some(tree)) => {
                        if sender.send(tree).is_err() {
                            break;
                        }
                        voters += 1;
                    }
                    Ok(None) => break,
                    Err(err) => {
                        feed_result = Err(err);
                        break;
                    }
                }
            }
            drop(sender);

            worker_tables = handles
                .into_iter()
                .map(|handle| handle.join().expect("classification worker panicked"))
                .collect();
        });

        feed_result?;
        for votes in &worker_tables {
            *table += votes;
        }
        Ok(voters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repr::{DecisionTree, Forest};

    /// Two stumps agreeing on feature 0 plus one single-leaf tree voting 0.
    fn forest() -> Forest<f64> {
        let mut forest = Forest::new(2, 1);
        for threshold in [0.5, 0.5] {
            forest.push_tree(
                DecisionTree::from_columns(
                    2,
                    1,
                    vec![1, 0, 0],
                    vec![2, 0, 0],
                    vec![0, 0, 0],
                    vec![threshold, 0.0, 0.0],
                    vec![0, 0, 1],
                )
                .unwrap(),
            );
        }
        forest.push_tree(
            DecisionTree::from_columns(2, 1, vec![0], vec![0], vec![0], vec![0.0], vec![0])
                .unwrap(),
        );
        forest
    }

    #[test]
    fn majority_vote_decides() {
        let mut forest = forest();
        let mut ensemble = EnsembleClassifier::new(&mut forest, 0);
        let data = [0.25, 0.75];
        let points = PointsView::new(&data, 1).unwrap();
        // Point 0: three votes for 0. Point 1: two votes for 1, one for 0.
        assert_eq!(ensemble.classify(points).unwrap(), vec![0, 1]);
    }

    #[test]
    fn single_and_multi_threaded_votes_are_identical() {
        let data = [0.1, 0.4, 0.6, 0.9];
        let points = PointsView::new(&data, 1).unwrap();

        let mut forest_a = forest();
        let mut sequential = EnsembleClassifier::new(&mut forest_a, 0);
        let mut votes_a = VoteTable::new(4, 2);
        let voters_a = sequential.classify_and_vote(points, &mut votes_a).unwrap();

        for workers in [1, 2, 5] {
            let mut forest_b = forest();
            let mut parallel = EnsembleClassifier::new(&mut forest_b, workers);
            let mut votes_b = VoteTable::new(4, 2);
            let voters_b = parallel.classify_and_vote(points, &mut votes_b).unwrap();
            assert_eq!(voters_a, voters_b);
            assert_eq!(votes_a, votes_b);
        }
    }

    #[test]
    fn class_weights_shift_the_argmax() {
        let mut forest = forest();
        let mut ensemble = EnsembleClassifier::new(&mut forest, 0);
        let data = [0.75];
        let points = PointsView::new(&data, 1).unwrap();
        assert_eq!(ensemble.classify(points).unwrap(), vec![1]);

        // Upweight class 0 (1 vote) past class 1 (2 votes).
        ensemble.set_class_weights(vec![3.0, 1.0]).unwrap();
        assert_eq!(ensemble.classify(points).unwrap(), vec![0]);
    }

    #[test]
    fn rejects_bad_class_weights() {
        let mut forest = forest();
        let mut ensemble = EnsembleClassifier::new(&mut forest, 0);
        assert!(matches!(
            ensemble.set_class_weights(vec![1.0]),
            Err(ClassifyError::WeightCountMismatch { expected: 2, got: 1 })
        ));
        assert!(matches!(
            ensemble.set_class_weights(vec![1.0, -0.5]),
            Err(ClassifyError::NegativeWeight { class: 1, .. })
        ));
    }

    #[test]
    fn rejects_feature_count_mismatch() {
        let mut forest = forest();
        let mut ensemble = EnsembleClassifier::new(&mut forest, 0);
        let data = [0.25, 0.75];
        let points = PointsView::new(&data, 2).unwrap();
        assert!(matches!(
            ensemble.classify(points),
            Err(ClassifyError::Dataset(DatasetError::FeatureCountMismatch { .. }))
        ));
    }

    #[test]
    fn voter_count_matches_stream_length() {
        let mut forest = forest();
        let mut ensemble = EnsembleClassifier::new(&mut forest, 2);
        let data = [0.25];
        let points = PointsView::new(&data, 1).unwrap();
        let mut votes = VoteTable::new(1, 2);
        assert_eq!(ensemble.classify_and_vote(points, &mut votes).unwrap(), 3);
        // A second pass rewinds and votes again.
        assert_eq!(ensemble.classify_and_vote(points, &mut votes).unwrap(), 3);
        assert_eq!(votes.count(0, 0), 6);
    }
}
