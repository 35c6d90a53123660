//! Grouped boosting trainer.
//!
//! Training alternates two stages. The base model is optimized over the base
//! view of the composite stream. Then every instance is re-scored by the base
//! model and bucketed under each group it belongs to, and groups are visited
//! in order of decreasing support. Each group with enough support gets one
//! candidate residual tree, kept only when it improves the group's objective
//! by more than `min_tree_gain` per instance.

use crate::boosting::gbcent::GBCentModel;
use crate::boosting::gbm::{BoostingSubset, GradientBoostingMachine};
use crate::config::{GBCentConfig, TrainingConfig};
use crate::core::error::Result;
use crate::core::traits::{DecisionTreeLearner, LearningData, TrainableModel};
use crate::core::types::{GroupId, Score};
use crate::dataset::{BaseModelView, GBCentInstance, TreeInstance};
use crate::model::Oracle;
use crate::solver::{BaseOptimizer, OnlineOptimizationMethod};
use crate::tree::create_tree_learner;

use std::collections::BTreeMap;
use std::sync::Arc;

/// Per-group evidence gathered in one scoring pass.
#[derive(Debug, Default)]
struct GroupLedger {
    /// Tree views of the group's instances
    data: Vec<TreeInstance>,
    /// Positions of those instances in the running prediction array
    ids: Vec<usize>,
    /// Best recorded objective of the group
    objective: f64,
}

impl GroupLedger {
    fn support(&self) -> usize {
        self.ids.len()
    }

    fn subset(&self) -> Result<BoostingSubset<'_>> {
        BoostingSubset::new(&self.data, &self.ids)
    }
}

/// Running predictions of one stream and its groups.
#[derive(Debug, Default)]
struct Ledger {
    preds: Vec<Score>,
    groups: BTreeMap<GroupId, GroupLedger>,
}

impl Ledger {
    /// Score every instance with the base model and bucket it by group.
    fn scan<D>(model: &GBCentModel, data: &mut D) -> Result<Self>
    where
        D: LearningData<Instance = GBCentInstance> + ?Sized,
    {
        let base = model.base();
        let objective = base.objective_function();
        let mut ledger = Ledger::default();

        data.start_new_iteration();
        loop {
            let batch = data.next_batch();
            if batch.is_empty() {
                break;
            }
            let mut oracles = Vec::with_capacity(batch.len());
            for ins in &batch {
                let pred = base.predict(ins.base())?;
                oracles.push(Oracle::new(pred, ins.base().label, ins.base().weight));
            }
            objective.wrap_oracle(&mut oracles);

            for (ins, oracle) in batch.iter().zip(oracles.iter()) {
                let id = ledger.preds.len();
                ledger.preds.push(oracle.prediction);
                for group in ins.base().group_ids() {
                    let entry = ledger.groups.entry(group).or_default();
                    entry.data.push(ins.tree().clone());
                    entry.ids.push(id);
                    entry.objective += oracle.objective_value;
                }
            }
        }
        Ok(ledger)
    }

    /// Groups in order of decreasing support, ties by ascending id.
    fn by_support(&self) -> Vec<(GroupId, usize)> {
        let mut order: Vec<(GroupId, usize)> = self
            .groups
            .iter()
            .map(|(&group, ledger)| (group, ledger.support()))
            .collect();
        order.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        order
    }
}

/// What happened to one group's candidate tree.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupOutcome {
    pub group: GroupId,
    /// Number of training instances in the group
    pub support: usize,
    /// Objective before and after the candidate, on validation data when
    /// present; `None` when the candidate was accepted without a gain test
    pub objectives: Option<(f64, f64)>,
    pub accepted: bool,
}

/// Summary of one call to [`GroupedBoostingTrainer::learn`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrainingReport {
    /// Groups whose support reached `min_support` and were given a candidate
    pub groups_attempted: usize,
    pub trees_accepted: usize,
    /// Per-group outcomes in visiting order
    pub outcomes: Vec<GroupOutcome>,
    /// Final training objective of the base optimizer, when it ran
    pub base_objective: Option<f64>,
}

/// Trains a [`GBCentModel`]: base model first, then one residual tree per
/// well-supported group.
#[derive(Debug, Clone)]
pub struct GroupedBoostingTrainer {
    config: GBCentConfig,
    optimizer: BaseOptimizer,
    learner: Arc<dyn DecisionTreeLearner>,
}

impl GroupedBoostingTrainer {
    pub fn new(
        config: GBCentConfig,
        optimizer: BaseOptimizer,
        learner: Arc<dyn DecisionTreeLearner>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(GroupedBoostingTrainer {
            config,
            optimizer,
            learner,
        })
    }

    /// Builds the optimizer and tree learner described by `config`.
    pub fn from_config(config: &TrainingConfig) -> Result<Self> {
        config.validate()?;
        Self::new(
            config.gbcent.clone(),
            BaseOptimizer::from_config(&config.optimizer)?,
            create_tree_learner(&config.tree)?,
        )
    }

    pub fn config(&self) -> &GBCentConfig {
        &self.config
    }

    pub fn optimizer(&self) -> &BaseOptimizer {
        &self.optimizer
    }

    /// Train `model` on `learn`, gating trees on `valid` when given.
    ///
    /// Numeric divergence of the base optimizer aborts training before any
    /// tree is fit. Groups below `min_support` and candidates without enough
    /// gain leave the model untouched.
    pub fn learn<D, V>(
        &self,
        model: &mut GBCentModel,
        learn: &mut D,
        mut valid: Option<&mut V>,
    ) -> Result<TrainingReport>
    where
        D: LearningData<Instance = GBCentInstance> + ?Sized,
        V: LearningData<Instance = GBCentInstance> + ?Sized,
    {
        let base_objective = if self.config.learn_base_model {
            let mut base_learn = BaseModelView::new(&mut *learn);
            let mut base_valid = valid.as_deref_mut().map(BaseModelView::new);
            let objective = self
                .optimizer
                .minimize(model.base(), &mut base_learn, base_valid.as_mut())?;
            log::info!("Base model optimized, training objective {}", objective);
            Some(objective)
        } else {
            None
        };

        let mut learn_ledger = Ledger::scan(model, learn)?;
        let mut valid_ledger = match valid {
            Some(valid) => Some(Ledger::scan(model, valid)?),
            None => None,
        };

        let gbm = GradientBoostingMachine::new(model.base().objective_handle());
        let mut report = TrainingReport {
            base_objective,
            ..TrainingReport::default()
        };

        for (group, support) in learn_ledger.by_support() {
            if support < self.config.min_support {
                break;
            }
            report.groups_attempted += 1;

            let learn_group = &learn_ledger.groups[&group];
            let learn_subset = learn_group.subset()?;
            let valid_group = valid_ledger.as_ref().and_then(|l| l.groups.get(&group));
            let valid_subset = match valid_group {
                Some(g) => g.subset()?,
                None => BoostingSubset::empty(),
            };
            let valid_preds = valid_ledger.as_ref().map(|l| l.preds.as_slice());

            let tree = gbm.boost_model(
                &learn_ledger.preds,
                valid_preds,
                &learn_subset,
                valid_ledger.as_ref().map(|_| &valid_subset),
                self.learner.as_ref(),
            )?;

            let objectives = match valid_preds {
                Some(preds) => {
                    let old = valid_group.map_or(0.0, |g| g.objective);
                    let new = gbm.evaluate(preds, &tree, &valid_subset)?;
                    Some((old, new, valid_subset.len()))
                }
                None if self.config.min_tree_gain > 0.0 => {
                    let new = gbm.evaluate(&learn_ledger.preds, &tree, &learn_subset)?;
                    Some((learn_group.objective, new, support))
                }
                None => None,
            };

            let accepted = match objectives {
                Some((old, new, count)) => {
                    log::debug!("Group {}: before adding {}, after adding {}", group, old, new);
                    count > 0 && (old - new) / count as f64 > self.config.min_tree_gain
                }
                None => true,
            };
            report.outcomes.push(GroupOutcome {
                group,
                support,
                objectives: objectives.map(|(old, new, _)| (old, new)),
                accepted,
            });
            if !accepted {
                continue;
            }

            let new_objective = objectives.map(|(_, new, _)| new);
            let has_valid = valid_ledger.is_some();
            if let Some(Ledger { preds, groups }) = valid_ledger.as_mut() {
                if let Some(g) = groups.get_mut(&group) {
                    if let Some(new) = new_objective {
                        g.objective = new;
                    }
                    gbm.boost_prediction(preds, &tree, &g.subset()?)?;
                }
            }
            let Ledger { preds, groups } = &mut learn_ledger;
            if let Some(g) = groups.get_mut(&group) {
                if let (false, Some(new)) = (has_valid, new_objective) {
                    g.objective = new;
                }
                gbm.boost_prediction(preds, &tree, &g.subset()?)?;
            }
            model.set_tree(group, tree);
            report.trees_accepted += 1;
        }

        log::info!(
            "Learned {} trees and accepted {} trees",
            report.groups_attempted,
            report.trees_accepted
        );
        Ok(report)
    }

    /// One base optimizer pass over the base view of `learn`, leaving the
    /// trees alone.
    pub fn update_base_model<D>(&self, model: &GBCentModel, learn: &mut D) -> Result<f64>
    where
        D: LearningData<Instance = GBCentInstance> + ?Sized,
    {
        self.optimizer.update(model.base(), &mut BaseModelView::new(learn))
    }
}
