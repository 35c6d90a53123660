//! Core data types for gbcent-rust.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Prediction, objective and gradient value type.
pub type Score = f64;

/// Target value and sample weight type.
pub type Label = f64;

/// Identifier of a bias group: an index into the `biases` scalar array.
pub type GroupId = usize;

/// Tree node identifier type.
pub type NodeIndex = usize;

/// Loss functions available for the base model and the boosted trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveType {
    /// Squared error, `0.5 * (p - y)^2`
    L2,
    /// Logistic loss on raw scores, labels in {0, 1}
    Logistic,
    /// Smoothed pairwise surrogate of MAP@N over each batch
    Map,
}

impl Default for ObjectiveType {
    fn default() -> Self {
        ObjectiveType::L2
    }
}

impl fmt::Display for ObjectiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectiveType::L2 => write!(f, "l2"),
            ObjectiveType::Logistic => write!(f, "logistic"),
            ObjectiveType::Map => write!(f, "map"),
        }
    }
}

/// Split statistics available to the tree learner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionType {
    /// Range-normalized mean separation weighted by side balance
    MeanDivergence,
    /// Weighted squared-error reduction
    VarianceReduction,
}

impl Default for CriterionType {
    fn default() -> Self {
        CriterionType::MeanDivergence
    }
}

impl fmt::Display for CriterionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CriterionType::MeanDivergence => write!(f, "mean_divergence"),
            CriterionType::VarianceReduction => write!(f, "variance_reduction"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(ObjectiveType::default(), ObjectiveType::L2);
        assert_eq!(CriterionType::default(), CriterionType::MeanDivergence);
    }

    #[test]
    fn test_display() {
        assert_eq!(ObjectiveType::Map.to_string(), "map");
        assert_eq!(CriterionType::VarianceReduction.to_string(), "variance_reduction");
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&ObjectiveType::Logistic).unwrap();
        assert_eq!(json, "\"logistic\"");
        let back: CriterionType = serde_json::from_str("\"mean_divergence\"").unwrap();
        assert_eq!(back, CriterionType::MeanDivergence);
    }
}
