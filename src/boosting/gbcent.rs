//! The composite GBCent model.

use crate::core::error::Result;
use crate::core::types::{GroupId, Score};
use crate::core::traits::DecisionTree;
use crate::dataset::GBCentInstance;
use crate::model::SvdFeatureModel;
use crate::tree::{LeafFeatureExtractor, RegressionTree};

use static_assertions::assert_impl_all;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Latent-factor base model plus at most one residual tree per group.
///
/// The prediction for an instance is the base prediction plus the output of
/// the tree of every group the instance belongs to.
#[derive(Debug, Clone)]
pub struct GBCentModel {
    base: SvdFeatureModel,
    trees: BTreeMap<GroupId, RegressionTree>,
}

assert_impl_all!(GBCentModel: Send, Sync);

impl GBCentModel {
    /// Creates a model with no trees.
    pub fn new(base: SvdFeatureModel) -> Self {
        GBCentModel {
            base,
            trees: BTreeMap::new(),
        }
    }

    pub fn base(&self) -> &SvdFeatureModel {
        &self.base
    }

    /// Tree of `group`, if one has been accepted.
    pub fn tree(&self, group: GroupId) -> Option<&RegressionTree> {
        self.trees.get(&group)
    }

    /// Store `tree` as the model of `group`, returning the tree it replaces.
    pub fn set_tree(&mut self, group: GroupId, tree: RegressionTree) -> Option<RegressionTree> {
        self.trees.insert(group, tree)
    }

    pub fn remove_tree(&mut self, group: GroupId) -> Option<RegressionTree> {
        self.trees.remove(&group)
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    /// Groups that own a tree, in ascending order.
    pub fn groups(&self) -> impl Iterator<Item = GroupId> + '_ {
        self.trees.keys().copied()
    }

    /// Base prediction plus the contributions of the instance's group trees.
    pub fn predict(&self, instance: &GBCentInstance) -> Result<Score> {
        let mut prediction = self.base.predict(instance.base())?;
        for group in instance.base().group_ids() {
            if let Some(tree) = self.trees.get(&group) {
                prediction += tree.predict(instance.tree());
            }
        }
        Ok(prediction)
    }

    /// Leaf extractor over the tree of `group`, with features keyed
    /// `"{prefix}{group}={leaf}"`.
    pub fn leaf_extractor(&self, group: GroupId, prefix: &str) -> Option<LeafFeatureExtractor> {
        self.trees.get(&group).map(|tree| {
            let tree: Arc<dyn DecisionTree> = Arc::new(tree.clone());
            LeafFeatureExtractor::new(tree, format!("{}{}", prefix, group))
        })
    }
}
