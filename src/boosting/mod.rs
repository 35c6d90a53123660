//! Gradient boosting on top of the base model.
//!
//! - [`gbm`]: fit, score and commit one residual tree
//! - [`gbcent`]: the composite model with one tree per group
//! - [`trainer`]: the grouped boosting trainer
//! - [`standard`]: a plain tree ensemble trained by the same machine

pub mod gbcent;
pub mod gbm;
pub mod standard;
pub mod trainer;

pub use gbcent::GBCentModel;
pub use gbm::{BoostingSubset, GradientBoostingMachine};
pub use standard::{BoostingReport, GradientBoostedTrees, StandardBoostingMethod};
pub use trainer::{GroupOutcome, GroupedBoostingTrainer, TrainingReport};
