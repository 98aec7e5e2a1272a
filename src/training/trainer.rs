//! Ensemble trainer.
//!
//! Builds one template indexed tree (paying the feature-index sort cost
//! once), clones it per ensemble member, reseeds each clone from the master
//! seed, grows the clones in parallel, and appends finished trees to the
//! output stream. Stream appends are serialized and happen in completion
//! order; consumers must not assume tree-index order.

use std::path::PathBuf;
use std::sync::Mutex;

use crate::data::{DatasetError, Feature, Label, PointsView};
use crate::io::{ClassifierOutputStream, StreamError};
use crate::utils::run_with_threads;

use super::builder::{IndexedTreeBuilder, TreeBuilderParams};
use super::logger::{TrainingLogger, Verbosity};

// =============================================================================
// Parameters
// =============================================================================

/// Parameters for ensemble training.
#[derive(Clone, Debug)]
pub struct ForestTrainerParams {
    /// Number of trees to train.
    pub tree_count: u32,

    /// Number of randomly selected features to consider per split.
    /// 0 selects the default of `floor(sqrt(feature_count))`, minimum 1.
    pub features_to_consider: usize,

    /// Inclusive cap on node depth. `u32::MAX` means unlimited.
    pub max_depth: u32,

    /// Leaves with Gini impurity at or below this value are not grown.
    pub impurity_threshold: f64,

    /// Maximum number of tree-growing operations running in parallel.
    /// 1 = sequential, 0 = all available cores.
    pub thread_count: usize,

    /// Master seed. Per-tree seeds are derived deterministically, so a fixed
    /// seed yields the same set of trees regardless of thread count.
    pub seed: u64,

    /// Verbosity of progress output.
    pub verbosity: Verbosity,

    /// When set, each grown tree is dumped as Graphviz to
    /// `<dir>/tree-<index>.dot`.
    pub graphviz_dir: Option<PathBuf>,
}

impl Default for ForestTrainerParams {
    fn default() -> Self {
        Self {
            tree_count: 150,
            features_to_consider: 0,
            max_depth: u32::MAX,
            impurity_threshold: 0.0,
            thread_count: 1,
            seed: 42,
            verbosity: Verbosity::default(),
            graphviz_dir: None,
        }
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Errors surfaced during training.
#[derive(Debug, thiserror::Error)]
pub enum TrainError {
    /// Contract violation in the supplied data.
    #[error(transparent)]
    Dataset(#[from] DatasetError),

    /// `features_to_consider` is outside `[1, feature_count]`.
    #[error("features to consider {got} is out of range [1, {feature_count}]")]
    FeaturesToConsiderOutOfRange { got: usize, feature_count: usize },

    /// The impurity threshold is outside `[0, 1]`.
    #[error("impurity threshold {0} is outside [0, 1]")]
    ImpurityThresholdOutOfRange(f64),

    /// Failure while writing to the output stream.
    #[error(transparent)]
    Stream(#[from] StreamError),

    /// Failure while writing a Graphviz dump.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// ForestTrainer
// =============================================================================

/// Trains a random forest and streams the trees out as they finish.
pub struct ForestTrainer {
    params: ForestTrainerParams,
}

impl ForestTrainer {
    /// Create a trainer.
    pub fn new(params: ForestTrainerParams) -> Self {
        Self { params }
    }

    /// Get reference to parameters.
    pub fn params(&self) -> &ForestTrainerParams {
        &self.params
    }

    /// Train `tree_count` trees on the given data, appending each finished
    /// tree to `output`.
    ///
    /// The feature matrix and label vector are read-only for the duration of
    /// the call and are shared by all concurrently growing trees.
    pub fn train<F, S>(
        &self,
        points: PointsView<'_, F>,
        labels: &[Label],
        output: &mut S,
    ) -> Result<(), TrainError>
    where
        F: Feature,
        S: ClassifierOutputStream<F> + Send,
    {
        if labels.len() != points.point_count() {
            return Err(DatasetError::LabelCountMismatch {
                points: points.point_count(),
                labels: labels.len(),
            }
            .into());
        }
        let feature_count = points.feature_count();
        let features_to_consider = match self.params.features_to_consider {
            0 => ((feature_count as f64).sqrt().floor() as usize).max(1),
            k if k <= feature_count => k,
            k => {
                return Err(TrainError::FeaturesToConsiderOutOfRange {
                    got: k,
                    feature_count,
                })
            }
        };
        if !(0.0..=1.0).contains(&self.params.impurity_threshold) {
            return Err(TrainError::ImpurityThresholdOutOfRange(
                self.params.impurity_threshold,
            ));
        }

        let logger = TrainingLogger::new(self.params.verbosity);
        logger.info(format_args!(
            "building feature index over {} points, {} features",
            points.point_count(),
            feature_count
        ));
        let template = IndexedTreeBuilder::new(
            points,
            labels,
            TreeBuilderParams {
                features_to_consider,
                max_depth: self.params.max_depth,
                impurity_threshold: self.params.impurity_threshold,
            },
        )?;

        logger.info(format_args!("growing {} trees", self.params.tree_count));
        let sink = Mutex::new(output);
        run_with_threads(self.params.thread_count, |parallelism| {
            parallelism.maybe_par_try_for_each(0..self.params.tree_count, |tree_index| {
                self.grow_one(tree_index, &template, &sink, &logger)
            })
        })
    }

    /// Clone the template, grow one tree, and append it to the sink.
    fn grow_one<F, S>(
        &self,
        tree_index: u32,
        template: &IndexedTreeBuilder<'_, F>,
        sink: &Mutex<&mut S>,
        logger: &TrainingLogger,
    ) -> Result<(), TrainError>
    where
        F: Feature,
        S: ClassifierOutputStream<F> + Send,
    {
        let mut builder = template.clone();
        builder.reseed(derive_tree_seed(self.params.seed, tree_index));
        builder.grow();

        if let Some(dir) = &self.params.graphviz_dir {
            let path = dir.join(format!("tree-{tree_index}.dot"));
            let mut file = std::fs::File::create(path)?;
            builder.write_graphviz(&mut file)?;
        }

        let tree = builder.finalize();
        {
            let mut guard = sink.lock().unwrap_or_else(|poison| poison.into_inner());
            guard.write_tree(&tree)?;
        }
        logger.debug(format_args!(
            "tree {tree_index} finished: {} nodes",
            tree.node_count()
        ));
        Ok(())
    }
}

/// Derive the seed of one tree from the master seed.
///
/// SplitMix64-style finalizer over the master seed and the tree index, so a
/// given `(seed, tree_count)` produces the same set of trees no matter how
/// growth is scheduled across threads.
pub(crate) fn derive_tree_seed(master_seed: u64, tree_index: u32) -> u64 {
    let mut z = master_seed.wrapping_add((tree_index as u64 + 1).wrapping_mul(0x9E3779B97F4A7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}
