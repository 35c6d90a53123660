//! Online optimizers for the base model.
//!
//! - [`sgd`]: single-threaded SGD over a streaming source
//! - [`hogwild`]: lock-free SGD with one worker per data shard
//! - [`regularizer`]: parameter penalties

pub mod hogwild;
pub mod regularizer;
pub mod sgd;

pub use hogwild::{HogwildOptimizer, ParallelPassReport, WorkerReport};
pub use regularizer::{regularization_objective, L2Regularizer};
pub use sgd::StochasticGradientDescent;

use crate::config::OptimizerConfig;
use crate::core::error::Result;
use crate::core::traits::{LearningData, Regularizer, TrainableModel};

/// An optimizer that improves a model by passes over streaming data.
pub trait OnlineOptimizationMethod {
    fn config(&self) -> &OptimizerConfig;

    fn regularizer(&self) -> &dyn Regularizer;

    /// One pass over `learn`, returning the cumulative training objective.
    fn update<M, D>(&self, model: &M, learn: &mut D) -> Result<f64>
    where
        M: TrainableModel,
        M::Instance: Clone + Send + Sync,
        D: LearningData<Instance = M::Instance> + ?Sized;

    /// Repeated passes until convergence, returning the last training
    /// objective including the regularization penalty.
    ///
    /// Without validation data the loop stops once the relative change of
    /// the training objective falls below `tolerance`. With validation data
    /// it stops as soon as the validation objective stops decreasing.
    fn minimize<M, D, V>(&self, model: &M, learn: &mut D, valid: Option<&mut V>) -> Result<f64>
    where
        M: TrainableModel,
        M::Instance: Clone + Send + Sync,
        D: LearningData<Instance = M::Instance> + ?Sized,
        V: LearningData<Instance = M::Instance> + ?Sized,
    {
        run_minimize(self, model, valid, || self.update(model, &mut *learn))
    }
}

/// Sum of objective values over one scoring pass of `data`, without updates.
pub fn evaluate<M, D>(model: &M, data: &mut D) -> Result<f64>
where
    M: TrainableModel,
    D: LearningData<Instance = M::Instance> + ?Sized,
{
    let objective_fn = model.objective_function();
    let mut objective = 0.0;
    data.start_new_iteration();
    loop {
        let batch = data.next_batch();
        if batch.is_empty() {
            break;
        }
        let mut oracles = model.oracles(&batch)?;
        objective_fn.wrap_oracle(&mut oracles);
        objective += oracles.iter().map(|o| o.objective_value).sum::<f64>();
    }
    Ok(objective)
}

pub(crate) fn run_minimize<O, M, V, F>(
    optimizer: &O,
    model: &M,
    mut valid: Option<&mut V>,
    mut pass: F,
) -> Result<f64>
where
    O: OnlineOptimizationMethod + ?Sized,
    M: TrainableModel,
    V: LearningData<Instance = M::Instance> + ?Sized,
    F: FnMut() -> Result<f64>,
{
    let config = optimizer.config();
    let mut learn_objective = f64::INFINITY;
    let mut best_valid = f64::INFINITY;

    for iteration in 1..=config.max_iterations {
        let previous = learn_objective;
        learn_objective = pass()?
            + regularization_objective(model.space(), optimizer.regularizer(), config.l2_coef)?;
        log::info!("Iteration {}: training objective {}", iteration, learn_objective);

        if let Some(valid) = valid.as_deref_mut() {
            let valid_objective = evaluate(model, valid)?;
            log::info!("Iteration {}: validation objective {}", iteration, valid_objective);
            if valid_objective >= best_valid {
                break;
            }
            best_valid = valid_objective;
        } else if previous.is_finite() {
            let change = (previous - learn_objective).abs() / previous.abs().max(f64::MIN_POSITIVE);
            if change < config.tolerance {
                break;
            }
        }
    }
    Ok(learn_objective)
}

/// The base-model optimizer selected by the thread count.
#[derive(Debug, Clone)]
pub enum BaseOptimizer {
    Serial(StochasticGradientDescent),
    Parallel(HogwildOptimizer),
}

impl BaseOptimizer {
    /// Serial SGD for one thread, the lock-free parallel optimizer otherwise.
    pub fn from_config(config: &OptimizerConfig) -> Result<Self> {
        if config.effective_num_threads() <= 1 {
            Ok(BaseOptimizer::Serial(StochasticGradientDescent::new(config.clone())?))
        } else {
            Ok(BaseOptimizer::Parallel(HogwildOptimizer::new(config.clone())?))
        }
    }
}

impl OnlineOptimizationMethod for BaseOptimizer {
    fn config(&self) -> &OptimizerConfig {
        match self {
            BaseOptimizer::Serial(o) => o.config(),
            BaseOptimizer::Parallel(o) => o.config(),
        }
    }

    fn regularizer(&self) -> &dyn Regularizer {
        match self {
            BaseOptimizer::Serial(o) => o.regularizer(),
            BaseOptimizer::Parallel(o) => o.regularizer(),
        }
    }

    fn update<M, D>(&self, model: &M, learn: &mut D) -> Result<f64>
    where
        M: TrainableModel,
        M::Instance: Clone + Send + Sync,
        D: LearningData<Instance = M::Instance> + ?Sized,
    {
        match self {
            BaseOptimizer::Serial(o) => o.update(model, learn),
            BaseOptimizer::Parallel(o) => o.update(model, learn),
        }
    }

    fn minimize<M, D, V>(&self, model: &M, learn: &mut D, valid: Option<&mut V>) -> Result<f64>
    where
        M: TrainableModel,
        M::Instance: Clone + Send + Sync,
        D: LearningData<Instance = M::Instance> + ?Sized,
        V: LearningData<Instance = M::Instance> + ?Sized,
    {
        match self {
            BaseOptimizer::Serial(o) => o.minimize(model, learn, valid),
            BaseOptimizer::Parallel(o) => o.minimize(model, learn, valid),
        }
    }
}
