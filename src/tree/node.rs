//! Regression tree node representation.

use crate::core::types::{NodeIndex, Score};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A node of a regression tree arena.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    /// Terminal node carrying the fitted value.
    Leaf {
        /// Output before shrinkage
        value: Score,
        /// Number of training instances that reached the leaf
        support: usize,
    },
    /// Internal node; instances with `feature <= threshold` go left.
    Split {
        feature: usize,
        threshold: f64,
        gain: f64,
        left: NodeIndex,
        right: NodeIndex,
    },
}

impl TreeNode {
    /// Creates a leaf node.
    pub fn leaf(value: Score, support: usize) -> Self {
        TreeNode::Leaf { value, support }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, TreeNode::Leaf { .. })
    }

    /// Leaf output, if this is a leaf.
    pub fn leaf_value(&self) -> Option<Score> {
        match self {
            TreeNode::Leaf { value, .. } => Some(*value),
            TreeNode::Split { .. } => None,
        }
    }

    /// Split feature, if this is an internal node.
    pub fn split_feature(&self) -> Option<usize> {
        match self {
            TreeNode::Split { feature, .. } => Some(*feature),
            TreeNode::Leaf { .. } => None,
        }
    }

    /// Split gain; 0 for leaves.
    pub fn split_gain(&self) -> f64 {
        match self {
            TreeNode::Split { gain, .. } => *gain,
            TreeNode::Leaf { .. } => 0.0,
        }
    }
}

impl fmt::Display for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeNode::Leaf { value, support } => {
                write!(f, "Leaf(value={:.6}, support={})", value, support)
            }
            TreeNode::Split {
                feature,
                threshold,
                gain,
                ..
            } => write!(
                f,
                "Split(feature={}, threshold={:.6}, gain={:.6})",
                feature, threshold, gain
            ),
        }
    }
}
