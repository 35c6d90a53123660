//! Core trait definitions for gbcent-rust.
//!
//! These are the seams between the training engine and its collaborators:
//! streaming data sources, trainable models, objective functions,
//! regularizers and decision tree learners.

use crate::core::error::Result;
use crate::core::types::*;
use crate::dataset::TreeInstance;
use crate::model::{Oracle, ParameterSpace};
use crate::tree::RegressionTree;

use std::fmt::Debug;

/// A streaming source of learning instances.
///
/// A pass starts with [`start_new_iteration`](LearningData::start_new_iteration)
/// and pulls batches until an empty batch signals the end of the stream.
pub trait LearningData {
    /// Instance type produced by this source.
    type Instance;

    /// Rewind the source to the beginning of the stream.
    fn start_new_iteration(&mut self);

    /// Next batch of instances; empty once the stream is exhausted.
    fn next_batch(&mut self) -> Vec<Self::Instance>;
}

impl<D: LearningData + ?Sized> LearningData for &mut D {
    type Instance = D::Instance;

    fn start_new_iteration(&mut self) {
        (**self).start_new_iteration()
    }

    fn next_batch(&mut self) -> Vec<Self::Instance> {
        (**self).next_batch()
    }
}

impl<D: LearningData + ?Sized> LearningData for Box<D> {
    type Instance = D::Instance;

    fn start_new_iteration(&mut self) {
        (**self).start_new_iteration()
    }

    fn next_batch(&mut self) -> Vec<Self::Instance> {
        (**self).next_batch()
    }
}

/// A model whose parameters live in a [`ParameterSpace`] and can be trained
/// by stochastic gradient steps.
pub trait TrainableModel: Send + Sync {
    /// Instance type scored by this model.
    type Instance;

    /// Score one instance, recording the partial derivative of the prediction
    /// with respect to every parameter that contributed.
    fn oracle(&self, instance: &Self::Instance) -> Result<Oracle>;

    /// Score a batch of instances.
    fn oracles(&self, instances: &[Self::Instance]) -> Result<Vec<Oracle>> {
        instances.iter().map(|ins| self.oracle(ins)).collect()
    }

    /// Shared parameter storage of this model.
    fn space(&self) -> &ParameterSpace;

    /// Objective function the model is trained against.
    fn objective_function(&self) -> &dyn ObjectiveFunction;
}

/// Trait for objective functions that turn predictions into objective values
/// and gradients.
pub trait ObjectiveFunction: Send + Sync + Debug {
    /// Get the objective function name.
    fn name(&self) -> &'static str;

    /// Weighted objective value of a single prediction.
    fn objective(&self, prediction: Score, label: Label, weight: Label) -> Score;

    /// Gradient of [`objective`](ObjectiveFunction::objective) with respect
    /// to the prediction.
    fn gradient(&self, prediction: Score, label: Label, weight: Label) -> Score;

    /// Fill in objective values and gradients for a whole batch and
    /// back-propagate each gradient into the oracle's parameter touches.
    ///
    /// Pointwise losses use this default; losses that need the rest of the
    /// batch (ranking losses) override it.
    fn wrap_oracle(&self, oracles: &mut [Oracle]) {
        for oracle in oracles.iter_mut() {
            let value = self.objective(oracle.prediction, oracle.label, oracle.weight);
            let grad = self.gradient(oracle.prediction, oracle.label, oracle.weight);
            oracle.objective_value = value;
            oracle.backpropagate(grad);
        }
    }
}

/// Penalty on parameter values.
pub trait Regularizer: Send + Sync + Debug {
    /// Penalty of a set of values scaled by `coef`.
    fn objective(&self, coef: f64, vars: &[f64]) -> f64;

    /// Per-parameter penalty gradient.
    fn gradient(&self, var: f64) -> f64;

    /// `grad + coef * penalty_gradient(var)`, element-wise.
    fn combined_gradient(&self, grad: &[f64], var: &[f64], coef: f64) -> Vec<f64> {
        grad.iter()
            .zip(var.iter())
            .map(|(&g, &v)| g + coef * self.gradient(v))
            .collect()
    }
}

/// A fitted decision tree.
pub trait DecisionTree: Send + Sync + Debug {
    /// Predicted value for one instance.
    fn predict(&self, instance: &TreeInstance) -> Score;

    /// Identifier of the leaf the instance falls into.
    fn predict_leaf(&self, instance: &TreeInstance) -> NodeIndex;
}

/// Trait for tree learning algorithms.
///
/// Implementations must be deterministic for a fixed input order and
/// configuration, and only ever use the instances they are given.
pub trait DecisionTreeLearner: Send + Sync + Debug {
    /// Fit a regression tree to the labels of `instances`.
    fn fit(&self, instances: &[TreeInstance]) -> Result<RegressionTree>;

    /// Get the tree learner name.
    fn name(&self) -> &'static str;
}
