//! Plain gradient-boosted tree ensembles.

use crate::boosting::gbm::{BoostingSubset, GradientBoostingMachine};
use crate::config::{BoostingConfig, TrainingConfig};
use crate::core::error::Result;
use crate::core::traits::{DecisionTree, DecisionTreeLearner, LearningData, ObjectiveFunction};
use crate::core::types::Score;
use crate::dataset::{materialize, TreeInstance};
use crate::objective::create_objective;
use crate::tree::{create_tree_learner, RegressionTree};

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// An additive ensemble of regression trees.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostedTrees {
    trees: Vec<RegressionTree>,
}

impl GradientBoostedTrees {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn push_tree(&mut self, tree: RegressionTree) {
        self.trees.push(tree);
    }

    /// Sum of all tree outputs.
    pub fn predict(&self, instance: &TreeInstance) -> Score {
        self.trees.iter().map(|t| t.predict(instance)).sum()
    }
}

/// Outcome of [`StandardBoostingMethod::learn`].
#[derive(Debug, Clone, PartialEq)]
pub struct BoostingReport {
    /// Trees added in this call
    pub trees_added: usize,
    /// Training objective after the last added tree
    pub learn_objective: f64,
    /// Validation objective after the last added tree
    pub valid_objective: Option<f64>,
}

/// Adds trees one at a time until `max_num_trees` is reached or a new tree
/// stops improving the objective by more than `min_tree_gain` per instance.
///
/// With validation data the gain is measured there; without it the gain is
/// only checked when `min_tree_gain` is positive.
#[derive(Debug, Clone)]
pub struct StandardBoostingMethod {
    config: BoostingConfig,
    objective: Arc<dyn ObjectiveFunction>,
    learner: Arc<dyn DecisionTreeLearner>,
}

impl StandardBoostingMethod {
    pub fn new(
        config: BoostingConfig,
        objective: Arc<dyn ObjectiveFunction>,
        learner: Arc<dyn DecisionTreeLearner>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(StandardBoostingMethod {
            config,
            objective,
            learner,
        })
    }

    pub fn from_config(config: &TrainingConfig) -> Result<Self> {
        config.validate()?;
        Self::new(
            config.boosting.clone(),
            create_objective(&config.objective)?,
            create_tree_learner(&config.tree)?,
        )
    }

    pub fn config(&self) -> &BoostingConfig {
        &self.config
    }

    pub fn learn<D, V>(
        &self,
        model: &mut GradientBoostedTrees,
        learn: &mut D,
        valid: Option<&mut V>,
    ) -> Result<BoostingReport>
    where
        D: LearningData<Instance = TreeInstance> + ?Sized,
        V: LearningData<Instance = TreeInstance> + ?Sized,
    {
        let gbm = GradientBoostingMachine::new(Arc::clone(&self.objective));
        let zero = RegressionTree::constant(0.0, 0, 1.0);

        let learn_data = materialize(learn);
        let learn_ids: Vec<usize> = (0..learn_data.len()).collect();
        let learn_subset = BoostingSubset::new(&learn_data, &learn_ids)?;
        let mut learn_preds: Vec<Score> = learn_data.iter().map(|ins| model.predict(ins)).collect();
        let mut learn_objective = gbm.evaluate(&learn_preds, &zero, &learn_subset)?;

        let valid_data = valid.map(|v| materialize(v));
        let valid_ids: Vec<usize> = (0..valid_data.as_ref().map_or(0, Vec::len)).collect();
        let valid_subset = match valid_data.as_ref() {
            Some(data) => Some(BoostingSubset::new(data, &valid_ids)?),
            None => None,
        };
        let mut valid_preds: Option<Vec<Score>> = valid_data
            .as_ref()
            .map(|data| data.iter().map(|ins| model.predict(ins)).collect());
        let mut valid_objective = match (valid_preds.as_ref(), valid_subset.as_ref()) {
            (Some(preds), Some(subset)) => Some(gbm.evaluate(preds, &zero, subset)?),
            _ => None,
        };

        let mut trees_added = 0;
        while model.num_trees() < self.config.max_num_trees {
            let tree = gbm.boost_model(
                &learn_preds,
                valid_preds.as_deref(),
                &learn_subset,
                valid_subset.as_ref(),
                self.learner.as_ref(),
            )?;

            match (valid_preds.as_mut(), valid_subset.as_ref(), valid_objective) {
                (Some(preds), Some(subset), Some(old)) => {
                    let new = gbm.evaluate(preds, &tree, subset)?;
                    if subset.is_empty() || (old - new) / subset.len() as f64 <= self.config.min_tree_gain {
                        log::info!("Stopping after {} trees: validation objective {}", model.num_trees(), old);
                        break;
                    }
                    gbm.boost_prediction(preds, &tree, subset)?;
                    valid_objective = Some(new);
                }
                _ if self.config.min_tree_gain > 0.0 => {
                    let new = gbm.evaluate(&learn_preds, &tree, &learn_subset)?;
                    if learn_subset.is_empty()
                        || (learn_objective - new) / learn_subset.len() as f64 <= self.config.min_tree_gain
                    {
                        log::info!("Stopping after {} trees: training objective {}", model.num_trees(), learn_objective);
                        break;
                    }
                }
                _ => {}
            }

            gbm.boost_prediction(&mut learn_preds, &tree, &learn_subset)?;
            learn_objective = gbm.evaluate(&learn_preds, &zero, &learn_subset)?;
            model.push_tree(tree);
            trees_added += 1;
            log::debug!("Tree {}: training objective {}", model.num_trees(), learn_objective);
        }

        Ok(BoostingReport {
            trees_added,
            learn_objective,
            valid_objective,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TreeConfig;
    use crate::dataset::InMemoryLearningData;
    use crate::objective::L2Loss;
    use crate::tree::{CartTreeLearner, VarianceReduction};

    fn method(max_num_trees: usize, min_tree_gain: f64, shrinkage: f64) -> StandardBoostingMethod {
        let learner = CartTreeLearner::<VarianceReduction>::new(TreeConfig {
            max_depth: 1,
            min_leaf_support: 1,
            shrinkage,
            ..TreeConfig::default()
        })
        .unwrap();
        StandardBoostingMethod::new(
            BoostingConfig {
                max_num_trees,
                min_tree_gain,
            },
            Arc::new(L2Loss),
            Arc::new(learner),
        )
        .unwrap()
    }

    fn data() -> Vec<TreeInstance> {
        (0..8)
            .map(|i| TreeInstance::new(vec![i as f64], if i < 4 { 1.0 } else { 5.0 }, 1.0))
            .collect()
    }

    #[test]
    fn test_stops_at_max_num_trees() {
        let mut model = GradientBoostedTrees::new();
        let report = method(3, 0.0, 0.5)
            .learn::<_, InMemoryLearningData<TreeInstance>>(
                &mut model,
                &mut InMemoryLearningData::new(data()),
                None,
            )
            .unwrap();
        assert_eq!(report.trees_added, 3);
        assert_eq!(model.num_trees(), 3);
        // each tree halves the residual: 5 * (1 - 0.5^3)
        let pred = model.predict(&TreeInstance::new(vec![6.0], 0.0, 1.0));
        assert!((pred - 4.375).abs() < 1e-12);
    }

    #[test]
    fn test_stops_when_validation_stops_improving() {
        let mut model = GradientBoostedTrees::new();
        let mut valid = InMemoryLearningData::new(data());
        let report = method(50, 1e-6, 1.0)
            .learn(&mut model, &mut InMemoryLearningData::new(data()), Some(&mut valid))
            .unwrap();
        // the first tree fits the data exactly, a second cannot improve it
        assert_eq!(report.trees_added, 1);
        assert!(report.valid_objective.unwrap() < 1e-12);
        assert!(report.learn_objective < 1e-12);
    }

    #[test]
    fn test_resumes_from_existing_trees() {
        let mut model = GradientBoostedTrees::new();
        let method = method(2, 0.0, 0.5);
        method
            .learn::<_, InMemoryLearningData<TreeInstance>>(&mut model, &mut InMemoryLearningData::new(data()), None)
            .unwrap();
        let report = method
            .learn::<_, InMemoryLearningData<TreeInstance>>(&mut model, &mut InMemoryLearningData::new(data()), None)
            .unwrap();
        assert_eq!(report.trees_added, 0);
        assert_eq!(model.num_trees(), 2);
    }
}
