//! Common test utilities for gbcent-rust integration tests.

#![allow(dead_code)]

use gbcent_rust::*;
use rand::prelude::*;

use std::sync::{Arc, Mutex};

/// Model with `num_groups` zero biases and no factors.
pub fn bias_only_model(num_groups: usize) -> SvdFeatureModel {
    SvdFeatureModel::new(
        Arc::new(ParameterSpace::new()),
        Arc::new(objective::L2Loss),
        num_groups,
        0,
        0,
    )
    .unwrap()
}

/// Composite instance in one group, with the label as its only tree feature.
pub fn group_instance(group: GroupId, label: f64) -> GBCentInstance {
    GBCentInstance::new(
        SvdFeatureInstance::new(label).with_bias(group, 1.0),
        vec![label],
    )
}

/// `count` instances in `group` with labels drawn from a seeded generator.
pub fn create_group_instances(group: GroupId, count: usize, seed: u64) -> Vec<GBCentInstance> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let x: f64 = rng.gen_range(-1.0..1.0);
            let label = if x > 0.0 { 2.0 } else { -1.0 };
            GBCentInstance::new(
                SvdFeatureInstance::new(label).with_bias(group, 1.0),
                vec![x, rng.gen_range(0.0..1.0)],
            )
        })
        .collect()
}

/// Latent-factor instances over `num_users` users and `num_items` items.
pub fn create_rating_instances(
    num_users: usize,
    num_items: usize,
    count: usize,
    seed: u64,
) -> Vec<SvdFeatureInstance> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let user = rng.gen_range(0..num_users);
            let item = rng.gen_range(0..num_items);
            let label = ((user + item) % 5) as f64;
            SvdFeatureInstance::new(label)
                .with_bias(0, 1.0)
                .with_user(user, 1.0)
                .with_item(num_users + item, 1.0)
        })
        .collect()
}

/// Tree learner that fits one leaf at the weighted mean target and records
/// the size of every training set it is given.
#[derive(Debug, Default)]
pub struct RecordingLearner {
    pub fits: Mutex<Vec<usize>>,
}

impl RecordingLearner {
    pub fn fit_sizes(&self) -> Vec<usize> {
        self.fits.lock().unwrap().clone()
    }
}

impl DecisionTreeLearner for RecordingLearner {
    fn fit(&self, instances: &[TreeInstance]) -> Result<RegressionTree> {
        self.fits.lock().unwrap().push(instances.len());
        let weight: f64 = instances.iter().map(|i| i.weight).sum();
        let sum: f64 = instances.iter().map(|i| i.weight * i.label).sum();
        let value = if weight > 0.0 { sum / weight } else { 0.0 };
        Ok(RegressionTree::constant(value, instances.len(), 1.0))
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Tree learner that always returns the same single-leaf tree.
#[derive(Debug)]
pub struct ConstantLearner(pub f64);

impl DecisionTreeLearner for ConstantLearner {
    fn fit(&self, instances: &[TreeInstance]) -> Result<RegressionTree> {
        Ok(RegressionTree::constant(self.0, instances.len(), 1.0))
    }

    fn name(&self) -> &'static str {
        "constant"
    }
}

/// Trainer that leaves the base model alone.
pub fn trainer_without_base(
    min_support: usize,
    min_tree_gain: f64,
    learner: Arc<dyn DecisionTreeLearner>,
) -> GroupedBoostingTrainer {
    GroupedBoostingTrainer::new(
        GBCentConfig {
            min_support,
            min_tree_gain,
            learn_base_model: false,
        },
        BaseOptimizer::from_config(&OptimizerConfig::default()).unwrap(),
        learner,
    )
    .unwrap()
}
