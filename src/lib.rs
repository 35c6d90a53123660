//! # gbcent-rust
//!
//! A hybrid training engine that pairs a shared latent-factor base model
//! (biases plus factor vectors scored by sparse dot products) with
//! per-group gradient-boosted regression trees that correct the base model's
//! residual error.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use gbcent_rust::{
//!     GBCentInstance, GBCentModel, GroupedBoostingTrainer, InMemoryLearningData,
//!     SvdFeatureInstance, SvdFeatureModel, TrainingConfigBuilder,
//! };
//! use std::sync::Arc;
//!
//! # fn main() -> gbcent_rust::Result<()> {
//! gbcent_rust::init();
//!
//! let config = TrainingConfigBuilder::new()
//!     .learning_rate(0.05)
//!     .num_threads(4)
//!     .min_support(10)
//!     .random_seed(42)
//!     .build()?;
//!
//! let objective = gbcent_rust::objective::create_objective(&config.objective)?;
//! let base = SvdFeatureModel::new(Arc::new(config.create_space()), objective, 100, 1000, 8)?;
//! let mut model = GBCentModel::new(base);
//!
//! let instances = vec![GBCentInstance::new(
//!     SvdFeatureInstance::new(4.0).with_bias(3, 1.0).with_user(7, 1.0).with_item(512, 1.0),
//!     vec![0.5, 12.0],
//! )];
//! let mut learn = InMemoryLearningData::new(instances);
//!
//! let trainer = GroupedBoostingTrainer::from_config(&config)?;
//! let report = trainer.learn::<_, InMemoryLearningData<GBCentInstance>>(&mut model, &mut learn, None)?;
//! println!("accepted {} of {} trees", report.trees_accepted, report.groups_attempted);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: types, constants, error handling and trait seams
//! - [`config`]: typed training configuration
//! - [`dataset`]: instances and streaming learning data
//! - [`model`]: the shared parameter space and the latent-factor model
//! - [`objective`]: loss functions
//! - [`solver`]: serial and lock-free parallel SGD
//! - [`tree`]: split criteria and the regression tree learner
//! - [`boosting`]: residual boosting and the grouped trainer

#![warn(
    missing_debug_implementations,
    rust_2018_idioms,
    non_snake_case,
    non_upper_case_globals
)]

pub mod boosting;
pub mod config;
pub mod core;
pub mod dataset;
pub mod model;
pub mod objective;
pub mod solver;
pub mod tree;

pub use crate::core::{
    constants::*,
    error::{GBCentError, Result},
    traits::*,
    types::*,
};

pub use crate::config::{
    BoostingConfig, GBCentConfig, ObjectiveConfig, OptimizerConfig, TrainingConfig,
    TrainingConfigBuilder, TreeConfig,
};

pub use crate::dataset::{
    Feature, GBCentInstance, InMemoryLearningData, SvdFeatureInstance, TreeInstance,
};

pub use crate::model::{Oracle, ParameterSpace, SvdFeatureModel};

pub use crate::solver::{
    BaseOptimizer, HogwildOptimizer, OnlineOptimizationMethod, StochasticGradientDescent,
};

pub use crate::tree::{CartTreeLearner, RegressionTree};

pub use crate::boosting::{
    GBCentModel, GradientBoostedTrees, GradientBoostingMachine, GroupedBoostingTrainer,
    StandardBoostingMethod, TrainingReport,
};

pub use crate::core::constants::GBCENT_RUST_VERSION as VERSION;

/// Initialize logging.
///
/// Safe to call more than once; only the first call installs a logger.
pub fn init() {
    crate::core::initialize_logging();
}
