//! Single-threaded online stochastic gradient descent.

use crate::config::OptimizerConfig;
use crate::core::constants::PROGRESS_LOG_INTERVAL;
use crate::core::error::{GBCentError, Result};
use crate::core::traits::{LearningData, Regularizer, TrainableModel};
use crate::solver::regularizer::L2Regularizer;
use crate::solver::OnlineOptimizationMethod;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Run one pass of SGD over `data`, returning the cumulative objective.
///
/// Every touched scalar moves by `-lr * (grad + l2_coef * reg'(v))` and
/// every touched vector by `-lr` times the regularizer's combined gradient. The running objective
/// is published to `partial` after each instance so a caller can recover it
/// if the pass dies midway. A NaN objective aborts the pass before the
/// offending instance is applied.
pub(crate) fn sgd_pass<M, D>(
    model: &M,
    data: &mut D,
    config: &OptimizerConfig,
    regularizer: &dyn Regularizer,
    partial: &AtomicU64,
) -> Result<f64>
where
    M: TrainableModel,
    D: LearningData<Instance = M::Instance> + ?Sized,
{
    let space = model.space();
    let objective_fn = model.objective_function();
    let lr = config.learning_rate;
    let l2_coef = config.l2_coef;

    let mut objective = 0.0;
    let mut count = 0usize;
    data.start_new_iteration();
    loop {
        let batch = data.next_batch();
        if batch.is_empty() {
            break;
        }

        let mut oracles = model.oracles(&batch)?;
        objective_fn.wrap_oracle(&mut oracles);

        for oracle in &oracles {
            objective += oracle.objective_value;
            count += 1;
            partial.store(objective.to_bits(), Ordering::Relaxed);
            if objective.is_nan() {
                log::error!("Objective became NaN after {} instances", count);
                return Err(GBCentError::numeric_divergence(count));
            }

            for touch in &oracle.scalar_touches {
                space.update_scalar(&touch.name, touch.index, |v| {
                    v - lr * (touch.gradient + l2_coef * regularizer.gradient(v))
                })?;
            }
            for touch in &oracle.vector_touches {
                space.update_vector(&touch.name, touch.index, |vec| {
                    let step = regularizer.combined_gradient(&touch.gradient, vec, l2_coef);
                    for (v, s) in vec.iter_mut().zip(step) {
                        *v -= lr * s;
                    }
                })?;
            }

            if count % PROGRESS_LOG_INTERVAL == 0 {
                log::info!("Updated the model using {} instances", count);
            }
        }
    }
    Ok(objective)
}

/// Serial SGD over a streaming source.
#[derive(Debug, Clone)]
pub struct StochasticGradientDescent {
    config: OptimizerConfig,
    regularizer: Arc<dyn Regularizer>,
}

impl StochasticGradientDescent {
    /// Creates an optimizer with the L2 regularizer.
    pub fn new(config: OptimizerConfig) -> Result<Self> {
        Self::with_regularizer(config, Arc::new(L2Regularizer))
    }

    pub fn with_regularizer(config: OptimizerConfig, regularizer: Arc<dyn Regularizer>) -> Result<Self> {
        config.validate()?;
        Ok(StochasticGradientDescent {
            config,
            regularizer,
        })
    }
}

impl OnlineOptimizationMethod for StochasticGradientDescent {
    fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    fn regularizer(&self) -> &dyn Regularizer {
        self.regularizer.as_ref()
    }

    fn update<M, D>(&self, model: &M, learn: &mut D) -> Result<f64>
    where
        M: TrainableModel,
        M::Instance: Clone + Send + Sync,
        D: LearningData<Instance = M::Instance> + ?Sized,
    {
        let partial = AtomicU64::new(0f64.to_bits());
        sgd_pass(model, learn, &self.config, self.regularizer.as_ref(), &partial)
    }
}
