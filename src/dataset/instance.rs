//! Learning instances.

use crate::core::types::{GroupId, Label};
use serde::{Deserialize, Serialize};

/// One sparse feature: an index into a parameter array and its value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// Index into the parameter array this feature reads
    pub index: usize,
    /// Feature value
    pub value: f64,
}

impl Feature {
    /// Creates a new feature.
    pub fn new(index: usize, value: f64) -> Self {
        Feature { index, value }
    }
}

/// Instance scored by the latent-factor base model.
///
/// Bias features index the `biases` scalar array; each bias index is also
/// the id of the group the instance belongs to. User and item features
/// index the `factors` vector array and are combined by a dot product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvdFeatureInstance {
    /// Bias features (group memberships)
    pub bias_features: Vec<Feature>,
    /// User-side factor features
    pub user_features: Vec<Feature>,
    /// Item-side factor features
    pub item_features: Vec<Feature>,
    /// Target value
    pub label: Label,
    /// Instance weight
    pub weight: Label,
}

impl SvdFeatureInstance {
    /// Creates an instance with unit weight and no features.
    pub fn new(label: Label) -> Self {
        SvdFeatureInstance {
            bias_features: Vec::new(),
            user_features: Vec::new(),
            item_features: Vec::new(),
            label,
            weight: 1.0,
        }
    }

    /// Adds a bias feature.
    pub fn with_bias(mut self, index: usize, value: f64) -> Self {
        self.bias_features.push(Feature::new(index, value));
        self
    }

    /// Adds a user-side factor feature.
    pub fn with_user(mut self, index: usize, value: f64) -> Self {
        self.user_features.push(Feature::new(index, value));
        self
    }

    /// Adds an item-side factor feature.
    pub fn with_item(mut self, index: usize, value: f64) -> Self {
        self.item_features.push(Feature::new(index, value));
        self
    }

    /// Sets the instance weight.
    pub fn with_weight(mut self, weight: Label) -> Self {
        self.weight = weight;
        self
    }

    /// Ids of the groups this instance belongs to, in feature order.
    pub fn group_ids(&self) -> impl Iterator<Item = GroupId> + '_ {
        self.bias_features.iter().map(|f| f.index)
    }
}

/// Dense feature view used only by the tree learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeInstance {
    /// Numeric features
    pub features: Vec<f64>,
    /// Regression target
    pub label: Label,
    /// Instance weight
    pub weight: Label,
}

impl TreeInstance {
    /// Creates a tree instance.
    pub fn new(features: Vec<f64>, label: Label, weight: Label) -> Self {
        TreeInstance {
            features,
            label,
            weight,
        }
    }

    /// Value of feature `index`; features past the end read as 0.
    pub fn feature(&self, index: usize) -> f64 {
        self.features.get(index).copied().unwrap_or(0.0)
    }

    /// Number of stored features.
    pub fn num_features(&self) -> usize {
        self.features.len()
    }
}

/// Composite instance: the base model's view plus the tree learner's view.
///
/// Both views share one label and weight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GBCentInstance {
    base: SvdFeatureInstance,
    tree: TreeInstance,
}

impl GBCentInstance {
    /// Creates a composite instance whose tree view carries the base label
    /// and weight.
    pub fn new(base: SvdFeatureInstance, tree_features: Vec<f64>) -> Self {
        let tree = TreeInstance::new(tree_features, base.label, base.weight);
        GBCentInstance { base, tree }
    }

    /// Base model view.
    pub fn base(&self) -> &SvdFeatureInstance {
        &self.base
    }

    /// Tree learner view.
    pub fn tree(&self) -> &TreeInstance {
        &self.tree
    }

    /// Consumes the instance, keeping only the base model view.
    pub fn into_base(self) -> SvdFeatureInstance {
        self.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let ins = SvdFeatureInstance::new(3.0)
            .with_bias(0, 1.0)
            .with_bias(7, 1.0)
            .with_user(2, 1.0)
            .with_item(5, 0.5)
            .with_weight(2.0);
        assert_eq!(ins.group_ids().collect::<Vec<_>>(), vec![0, 7]);
        assert_eq!(ins.user_features.len(), 1);
        assert_eq!(ins.item_features[0], Feature::new(5, 0.5));
        assert_eq!(ins.weight, 2.0);
    }

    #[test]
    fn test_missing_tree_feature_reads_zero() {
        let ins = TreeInstance::new(vec![1.5], 0.0, 1.0);
        assert_eq!(ins.feature(0), 1.5);
        assert_eq!(ins.feature(3), 0.0);
    }

    #[test]
    fn test_composite_shares_label() {
        let base = SvdFeatureInstance::new(4.0).with_weight(0.5);
        let ins = GBCentInstance::new(base, vec![1.0, 2.0]);
        assert_eq!(ins.tree().label, 4.0);
        assert_eq!(ins.tree().weight, 0.5);
        assert_eq!(ins.into_base().label, 4.0);
    }
}
