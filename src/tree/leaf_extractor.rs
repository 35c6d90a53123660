//! Tree leaves as categorical features.
//!
//! A fitted tree partitions instances into its leaves; the leaf an instance
//! lands in can be fed to a linear or latent-factor model as a one-hot
//! feature. Keys are `"{name}={leaf}"` and are mapped to dense feature
//! indices on first sight.

use crate::core::traits::DecisionTree;
use crate::dataset::{Feature, TreeInstance};

use std::collections::HashMap;
use std::sync::Arc;

/// Dense index assignment for string feature keys.
#[derive(Debug, Clone, Default)]
pub struct FeatureIndex {
    keys: HashMap<String, usize>,
}

impl FeatureIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of `key`, assigning the next free index when `update` is set.
    pub fn get_or_insert(&mut self, key: &str, update: bool) -> Option<usize> {
        if let Some(&index) = self.keys.get(key) {
            return Some(index);
        }
        if !update {
            return None;
        }
        let index = self.keys.len();
        self.keys.insert(key.to_string(), index);
        Some(index)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Extracts the leaf an instance falls into as a unit-valued feature.
#[derive(Debug, Clone)]
pub struct LeafFeatureExtractor {
    tree: Arc<dyn DecisionTree>,
    name: String,
}

impl LeafFeatureExtractor {
    pub fn new(tree: Arc<dyn DecisionTree>, name: impl Into<String>) -> Self {
        LeafFeatureExtractor {
            tree,
            name: name.into(),
        }
    }

    /// Key of the leaf `instance` falls into.
    pub fn leaf_key(&self, instance: &TreeInstance) -> String {
        format!("{}={}", self.name, self.tree.predict_leaf(instance))
    }

    /// Leaf feature of `instance`. Unseen leaves get a new index when
    /// `update` is set and are skipped otherwise.
    pub fn extract(
        &self,
        instance: &TreeInstance,
        index: &mut FeatureIndex,
        update: bool,
    ) -> Vec<Feature> {
        let key = self.leaf_key(instance);
        index
            .get_or_insert(&key, update)
            .map(|i| vec![Feature::new(i, 1.0)])
            .unwrap_or_default()
    }
}
