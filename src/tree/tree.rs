//! Regression tree structure.
//!
//! Nodes live in a contiguous arena with the root at index 0. Leaf ids
//! returned by [`RegressionTree::predict_leaf`] are arena indices, so they are
//! stable for a given tree and distinct across its leaves.

use crate::core::error::{GBCentError, Result};
use crate::core::traits::DecisionTree;
use crate::core::types::{NodeIndex, Score};
use crate::dataset::TreeInstance;
use crate::tree::node::TreeNode;

use serde::{Deserialize, Serialize};
use std::fmt;

/// A fitted regression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    /// Node arena (index 0 is always the root)
    nodes: Vec<TreeNode>,
    /// Factor applied to every leaf value at prediction time
    shrinkage: f64,
}

impl RegressionTree {
    /// Creates a single-leaf tree.
    pub fn constant(value: Score, support: usize, shrinkage: f64) -> Self {
        RegressionTree {
            nodes: vec![TreeNode::leaf(value, support)],
            shrinkage,
        }
    }

    /// Creates a tree from a node arena, checking child links.
    pub fn from_nodes(nodes: Vec<TreeNode>, shrinkage: f64) -> Result<Self> {
        if nodes.is_empty() {
            return Err(GBCentError::tree_construction("tree has no nodes"));
        }
        for (i, node) in nodes.iter().enumerate() {
            if let TreeNode::Split { left, right, .. } = node {
                if *left <= i || *right <= i || *left >= nodes.len() || *right >= nodes.len() {
                    return Err(GBCentError::tree_construction(format!(
                        "node {} has invalid children ({}, {})",
                        i, left, right
                    )));
                }
            }
        }
        Ok(RegressionTree { nodes, shrinkage })
    }

    /// Returns the number of nodes in the tree.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of leaf nodes in the tree.
    pub fn num_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Returns the depth of the deepest leaf; a single leaf has depth 0.
    pub fn depth(&self) -> usize {
        let mut max_depth = 0;
        let mut stack = vec![(0, 0)];
        while let Some((index, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            if let TreeNode::Split { left, right, .. } = self.nodes[index] {
                stack.push((left, depth + 1));
                stack.push((right, depth + 1));
            }
        }
        max_depth
    }

    pub fn shrinkage(&self) -> f64 {
        self.shrinkage
    }

    /// Returns the node at the given index.
    pub fn node(&self, index: NodeIndex) -> Option<&TreeNode> {
        self.nodes.get(index)
    }

    /// Arena indices of all leaves, ascending.
    pub fn leaf_indices(&self) -> Vec<NodeIndex> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, node)| if node.is_leaf() { Some(i) } else { None })
            .collect()
    }

    /// Sums split gains per feature.
    pub fn feature_importance(&self, num_features: usize) -> Vec<f64> {
        let mut importance = vec![0.0; num_features];
        for node in &self.nodes {
            if let Some(feature) = node.split_feature() {
                if feature < num_features {
                    importance[feature] += node.split_gain();
                }
            }
        }
        importance
    }

    fn find_leaf(&self, instance: &TreeInstance) -> NodeIndex {
        let mut index = 0;
        loop {
            match &self.nodes[index] {
                TreeNode::Leaf { .. } => return index,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    index = if instance.feature(*feature) <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }

    /// Converts the tree to a JSON representation.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Creates a tree from a JSON representation.
    pub fn from_json(json: &str) -> Result<Self> {
        let tree: RegressionTree = serde_json::from_str(json)?;
        Self::from_nodes(tree.nodes, tree.shrinkage)
    }
}

impl DecisionTree for RegressionTree {
    fn predict(&self, instance: &TreeInstance) -> Score {
        let leaf = self.find_leaf(instance);
        self.nodes[leaf].leaf_value().unwrap_or(0.0) * self.shrinkage
    }

    fn predict_leaf(&self, instance: &TreeInstance) -> NodeIndex {
        self.find_leaf(instance)
    }
}

impl fmt::Display for RegressionTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RegressionTree(nodes={}, leaves={}, depth={}, shrinkage={})",
            self.num_nodes(),
            self.num_leaves(),
            self.depth(),
            self.shrinkage()
        )
    }
}
