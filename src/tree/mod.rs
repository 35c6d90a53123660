//! Regression trees for residual boosting.
//!
//! - [`criterion`]: incremental split statistics
//! - [`cart`]: exact greedy tree learner
//! - [`tree`] and [`node`]: the fitted tree arena
//! - [`leaf_extractor`]: tree leaves as categorical features

pub mod cart;
pub mod criterion;
pub mod leaf_extractor;
pub mod node;
pub mod tree;

pub use cart::CartTreeLearner;
pub use criterion::{MeanDivergence, RegressionCriterion, Response, VarianceReduction};
pub use leaf_extractor::{FeatureIndex, LeafFeatureExtractor};
pub use node::TreeNode;
pub use tree::RegressionTree;

use crate::config::TreeConfig;
use crate::core::error::Result;
use crate::core::traits::DecisionTreeLearner;
use crate::core::types::CriterionType;

use std::sync::Arc;

/// Build a tree learner using the criterion named in `config`.
pub fn create_tree_learner(config: &TreeConfig) -> Result<Arc<dyn DecisionTreeLearner>> {
    Ok(match config.criterion {
        CriterionType::MeanDivergence => {
            Arc::new(CartTreeLearner::<MeanDivergence>::new(config.clone())?)
        }
        CriterionType::VarianceReduction => {
            Arc::new(CartTreeLearner::<VarianceReduction>::new(config.clone())?)
        }
    })
}
