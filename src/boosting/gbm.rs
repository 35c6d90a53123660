//! Residual tree fitting against a running prediction array.
//!
//! A [`BoostingSubset`] names the slice of a running prediction array that
//! one tree is responsible for: the tree-view instances plus, for each, the
//! position of its prediction. The same instance may sit in several subsets
//! when it belongs to several groups.

use crate::core::error::{GBCentError, Result};
use crate::core::traits::{DecisionTree, DecisionTreeLearner, ObjectiveFunction};
use crate::core::types::Score;
use crate::dataset::TreeInstance;
use crate::model::Oracle;
use crate::tree::RegressionTree;

use std::sync::Arc;

/// Tree-view instances paired with their positions in a prediction array.
#[derive(Debug, Clone, Copy)]
pub struct BoostingSubset<'a> {
    data: &'a [TreeInstance],
    ids: &'a [usize],
}

impl<'a> BoostingSubset<'a> {
    /// Pairs `data[i]` with prediction slot `ids[i]`.
    pub fn new(data: &'a [TreeInstance], ids: &'a [usize]) -> Result<Self> {
        crate::ensure!(
            data.len() == ids.len(),
            GBCentError::dimension_mismatch(
                format!("{} prediction ids", data.len()),
                format!("{} ids", ids.len()),
            )
        );
        Ok(BoostingSubset { data, ids })
    }

    /// An empty subset.
    pub fn empty() -> Self {
        BoostingSubset { data: &[], ids: &[] }
    }

    pub fn data(&self) -> &'a [TreeInstance] {
        self.data
    }

    pub fn ids(&self) -> &'a [usize] {
        self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn check_bounds(&self, num_predictions: usize) -> Result<()> {
        match self.ids.iter().find(|&&id| id >= num_predictions) {
            Some(&id) => Err(GBCentError::index_out_of_bounds(id, num_predictions)),
            None => Ok(()),
        }
    }
}

/// Fits, scores and commits residual trees.
#[derive(Debug, Clone)]
pub struct GradientBoostingMachine {
    objective: Arc<dyn ObjectiveFunction>,
}

impl GradientBoostingMachine {
    pub fn new(objective: Arc<dyn ObjectiveFunction>) -> Self {
        GradientBoostingMachine { objective }
    }

    pub fn objective(&self) -> &dyn ObjectiveFunction {
        self.objective.as_ref()
    }

    /// Oracles at `preds[id] + delta(instance)` for every subset member, with
    /// the objective's batch step applied over the whole subset.
    fn wrapped_oracles<F>(&self, preds: &[Score], subset: &BoostingSubset<'_>, delta: F) -> Result<Vec<Oracle>>
    where
        F: Fn(&TreeInstance) -> Score,
    {
        subset.check_bounds(preds.len())?;
        let mut oracles: Vec<Oracle> = subset
            .data
            .iter()
            .zip(subset.ids.iter())
            .map(|(ins, &id)| Oracle::new(preds[id] + delta(ins), ins.label, ins.weight))
            .collect();
        self.objective.wrap_oracle(&mut oracles);
        Ok(oracles)
    }

    /// Tree-view instances relabeled with the negative per-unit-weight
    /// gradient at their current running prediction.
    pub fn residual_targets(&self, preds: &[Score], subset: &BoostingSubset<'_>) -> Result<Vec<TreeInstance>> {
        let oracles = self.wrapped_oracles(preds, subset, |_| 0.0)?;
        Ok(subset
            .data
            .iter()
            .zip(oracles.iter())
            .map(|(ins, oracle)| {
                let target = if ins.weight > 0.0 {
                    -oracle.gradient / ins.weight
                } else {
                    0.0
                };
                TreeInstance::new(ins.features.clone(), target, ins.weight)
            })
            .collect())
    }

    /// Fit a candidate tree to the residuals of the learning subset.
    ///
    /// The validation subset is only checked against its prediction array;
    /// the learner never sees it.
    pub fn boost_model(
        &self,
        learn_preds: &[Score],
        valid_preds: Option<&[Score]>,
        learn: &BoostingSubset<'_>,
        valid: Option<&BoostingSubset<'_>>,
        learner: &dyn DecisionTreeLearner,
    ) -> Result<RegressionTree> {
        if let (Some(preds), Some(subset)) = (valid_preds, valid) {
            subset.check_bounds(preds.len())?;
        }
        let targets = self.residual_targets(learn_preds, learn)?;
        learner.fit(&targets)
    }

    /// Objective of the subset if `tree` were added, without committing it.
    pub fn evaluate(&self, preds: &[Score], tree: &dyn DecisionTree, subset: &BoostingSubset<'_>) -> Result<f64> {
        let oracles = self.wrapped_oracles(preds, subset, |ins| tree.predict(ins))?;
        Ok(oracles.iter().map(|o| o.objective_value).sum())
    }

    /// Add `tree`'s contribution into `preds` at the subset's positions.
    pub fn boost_prediction(
        &self,
        preds: &mut [Score],
        tree: &dyn DecisionTree,
        subset: &BoostingSubset<'_>,
    ) -> Result<()> {
        subset.check_bounds(preds.len())?;
        for (ins, &id) in subset.data.iter().zip(subset.ids.iter()) {
            preds[id] += tree.predict(ins);
        }
        Ok(())
    }
}
