//! Lock-free multi-threaded SGD.
//!
//! Training data is materialized once and split into contiguous shards. Each
//! pass starts one worker per shard; all workers update the same shared
//! parameter space with no lock around the read-modify-write step. The
//! driver joins workers in shard order, which is a hard barrier before the
//! caller continues.

use crate::config::OptimizerConfig;
use crate::core::constants::DEFAULT_BATCH_SIZE;
use crate::core::error::{GBCentError, Result};
use crate::core::traits::{LearningData, Regularizer, TrainableModel};
use crate::dataset::{materialize, InMemoryLearningData};
use crate::solver::regularizer::L2Regularizer;
use crate::solver::sgd::sgd_pass;
use crate::solver::{run_minimize, OnlineOptimizationMethod};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

/// Outcome of one worker in a parallel pass.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkerReport {
    /// Shard index
    pub shard: usize,
    /// Objective accumulated by the worker
    pub objective: f64,
    /// Whether the worker died before finishing its shard
    pub interrupted: bool,
}

/// Outcome of one parallel pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ParallelPassReport {
    /// Sum of all worker objectives, in shard order
    pub objective: f64,
    pub workers: Vec<WorkerReport>,
}

impl ParallelPassReport {
    /// Number of workers that did not finish their shard.
    pub fn num_interrupted(&self) -> usize {
        self.workers.iter().filter(|w| w.interrupted).count()
    }
}

/// Multi-threaded SGD over pre-materialized shards.
#[derive(Debug, Clone)]
pub struct HogwildOptimizer {
    config: OptimizerConfig,
    regularizer: Arc<dyn Regularizer>,
}

impl HogwildOptimizer {
    /// Creates an optimizer with the L2 regularizer.
    pub fn new(config: OptimizerConfig) -> Result<Self> {
        Self::with_regularizer(config, Arc::new(L2Regularizer))
    }

    pub fn with_regularizer(config: OptimizerConfig, regularizer: Arc<dyn Regularizer>) -> Result<Self> {
        config.validate()?;
        Ok(HogwildOptimizer {
            config,
            regularizer,
        })
    }

    /// Number of shards the training data is split into.
    pub fn num_shards(&self) -> usize {
        self.config.effective_num_threads().max(1)
    }

    /// Run one pass with one worker per shard.
    ///
    /// A worker that panics keeps the objective it had accumulated and is
    /// reported as interrupted; the other workers are unaffected. Any worker
    /// error, including numeric divergence, fails the pass once every worker
    /// has been joined.
    pub fn update_shards<M, D>(&self, model: &M, shards: &mut [D]) -> Result<ParallelPassReport>
    where
        M: TrainableModel,
        D: LearningData<Instance = M::Instance> + Send,
    {
        let partials: Vec<AtomicU64> = (0..shards.len())
            .map(|_| AtomicU64::new(0f64.to_bits()))
            .collect();
        let config = &self.config;
        let regularizer = self.regularizer.as_ref();

        let results = thread::scope(|s| {
            let handles: Vec<_> = shards
                .iter_mut()
                .zip(partials.iter())
                .map(|(shard, partial)| {
                    s.spawn(move || sgd_pass(model, shard, config, regularizer, partial))
                })
                .collect();
            handles.into_iter().map(|h| h.join()).collect::<Vec<_>>()
        });

        let mut objective = 0.0;
        let mut workers = Vec::with_capacity(results.len());
        let mut failure: Option<GBCentError> = None;
        for (shard, result) in results.into_iter().enumerate() {
            match result {
                Ok(Ok(value)) => {
                    objective += value;
                    workers.push(WorkerReport {
                        shard,
                        objective: value,
                        interrupted: false,
                    });
                }
                Ok(Err(err)) => {
                    log::error!("Worker for shard {} failed: {}", shard, err);
                    if failure.is_none() {
                        failure = Some(err);
                    }
                }
                Err(_) => {
                    let value = f64::from_bits(partials[shard].load(Ordering::Relaxed));
                    log::warn!(
                        "Worker for shard {} was interrupted; keeping its partial objective {}",
                        shard,
                        value
                    );
                    objective += value;
                    workers.push(WorkerReport {
                        shard,
                        objective: value,
                        interrupted: true,
                    });
                }
            }
        }

        if let Some(err) = failure {
            return Err(err);
        }
        Ok(ParallelPassReport { objective, workers })
    }

    fn shard<I: Clone + Send + Sync>(&self, instances: Vec<I>) -> Result<Vec<InMemoryLearningData<I>>> {
        InMemoryLearningData::with_batch_size(instances, DEFAULT_BATCH_SIZE).into_shards(self.num_shards())
    }
}

impl OnlineOptimizationMethod for HogwildOptimizer {
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
        let mut shards = self.shard(materialize(learn))?;
        Ok(self.update_shards(model, &mut shards)?.objective)
    }

    fn minimize<M, D, V>(&self, model: &M, learn: &mut D, valid: Option<&mut V>) -> Result<f64>
    where
        M: TrainableModel,
        M::Instance: Clone + Send + Sync,
        D: LearningData<Instance = M::Instance> + ?Sized,
        V: LearningData<Instance = M::Instance> + ?Sized,
    {
        let mut shards = self.shard(materialize(learn))?;
        log::info!("Minimizing over {} shards", shards.len());
        run_minimize(self, model, valid, || {
            Ok(self.update_shards(model, &mut shards)?.objective)
        })
    }
}
