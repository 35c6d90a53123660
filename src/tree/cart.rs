//! Greedy regression tree learner.
//!
//! Grows a tree depth-first by exact split search over numeric features.
//! Candidate thresholds are midpoints between consecutive distinct values of
//! a feature; instances with `value <= threshold` go left. Features are
//! searched in parallel and the per-feature winners are reduced with a fixed
//! ordering (highest gain, then lowest feature index, then lowest threshold),
//! so the fitted tree does not depend on thread scheduling.

use crate::config::TreeConfig;
use crate::core::error::Result;
use crate::core::traits::DecisionTreeLearner;
use crate::dataset::TreeInstance;
use crate::tree::criterion::{RegressionCriterion, Response};
use crate::tree::node::TreeNode;
use crate::tree::tree::RegressionTree;

use rayon::prelude::*;
use std::cmp::Ordering;
use std::marker::PhantomData;
use std::sync::Arc;

/// Best split found for one node.
#[derive(Debug, Clone, Copy, PartialEq)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

impl SplitCandidate {
    /// Total order used to pick a winner: higher gain first, then the lower
    /// feature index, then the lower threshold.
    fn better_than(&self, other: &SplitCandidate) -> bool {
        match self.gain.partial_cmp(&other.gain).unwrap_or(Ordering::Equal) {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => (self.feature, self.threshold) < (other.feature, other.threshold),
        }
    }
}

/// Exact greedy regression tree learner parameterized by its split criterion.
#[derive(Debug, Clone)]
pub struct CartTreeLearner<C> {
    config: TreeConfig,
    _criterion: PhantomData<fn() -> C>,
}

impl<C: RegressionCriterion> CartTreeLearner<C> {
    pub fn new(config: TreeConfig) -> Result<Self> {
        config.validate()?;
        Ok(CartTreeLearner {
            config,
            _criterion: PhantomData,
        })
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    fn best_split_for_feature(
        &self,
        feature: usize,
        instances: &[TreeInstance],
        ids: &[usize],
        prototype: &C,
    ) -> Option<SplitCandidate> {
        let mut sorted: Vec<usize> = ids.to_vec();
        sorted.sort_by(|&a, &b| {
            instances[a]
                .feature(feature)
                .partial_cmp(&instances[b].feature(feature))
                .unwrap_or(Ordering::Equal)
        });

        let mut left = prototype.create();
        let mut right = prototype.create();
        for &id in &sorted {
            right.add(id);
        }

        let min_leaf = self.config.min_leaf_support;
        let mut best: Option<SplitCandidate> = None;
        for pos in 0..sorted.len().saturating_sub(1) {
            let id = sorted[pos];
            right.remove(id);
            left.add(id);

            let current = instances[id].feature(feature);
            let next = instances[sorted[pos + 1]].feature(feature);
            if !(next > current) {
                continue;
            }
            if left.count() < min_leaf || right.count() < min_leaf {
                continue;
            }

            let gain = C::splitting_gain(&left, &right);
            if best.map_or(true, |b| gain > b.gain) {
                best = Some(SplitCandidate {
                    feature,
                    threshold: current + (next - current) / 2.0,
                    gain,
                });
            }
        }
        best
    }

    fn best_split(
        &self,
        instances: &[TreeInstance],
        ids: &[usize],
        num_features: usize,
        prototype: &C,
    ) -> Option<SplitCandidate> {
        (0..num_features)
            .into_par_iter()
            .filter_map(|feature| self.best_split_for_feature(feature, instances, ids, prototype))
            .reduce_with(|a, b| if b.better_than(&a) { b } else { a })
    }

    fn grow(
        &self,
        instances: &[TreeInstance],
        ids: Vec<usize>,
        depth: usize,
        num_features: usize,
        prototype: &C,
        nodes: &mut Vec<TreeNode>,
    ) -> usize {
        let mut stats = prototype.create();
        for &id in &ids {
            stats.add(id);
        }
        let index = nodes.len();
        nodes.push(TreeNode::leaf(stats.value(), ids.len()));

        if depth >= self.config.max_depth || ids.len() < 2 * self.config.min_leaf_support {
            return index;
        }
        let split = match self.best_split(instances, &ids, num_features, prototype) {
            Some(split) if split.gain > self.config.min_split_gain => split,
            _ => return index,
        };

        let (left_ids, right_ids): (Vec<usize>, Vec<usize>) = ids
            .into_iter()
            .partition(|&id| instances[id].feature(split.feature) <= split.threshold);

        let left = self.grow(instances, left_ids, depth + 1, num_features, prototype, nodes);
        let right = self.grow(instances, right_ids, depth + 1, num_features, prototype, nodes);
        nodes[index] = TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            gain: split.gain,
            left,
            right,
        };
        index
    }
}

impl<C: RegressionCriterion> DecisionTreeLearner for CartTreeLearner<C> {
    fn fit(&self, instances: &[TreeInstance]) -> Result<RegressionTree> {
        if instances.is_empty() {
            return Ok(RegressionTree::constant(0.0, 0, self.config.shrinkage));
        }

        let responses: Arc<[Response]> = instances
            .iter()
            .map(|ins| Response::new(ins.label, ins.weight))
            .collect();
        let prototype = C::new(responses);
        let num_features = instances
            .iter()
            .map(TreeInstance::num_features)
            .max()
            .unwrap_or(0);

        let mut nodes = Vec::new();
        let ids: Vec<usize> = (0..instances.len()).collect();
        self.grow(instances, ids, 0, num_features, &prototype, &mut nodes);

        log::trace!(
            "Fit tree with {} nodes on {} instances",
            nodes.len(),
            instances.len()
        );
        RegressionTree::from_nodes(nodes, self.config.shrinkage)
    }

    fn name(&self) -> &'static str {
        "cart"
    }
}
