//! Configuration management for gbcent-rust.
//!
//! Typed, validated settings for every training stage, with builder
//! construction and `.json` / `.toml` file loading.

pub mod core;
pub mod objective;

// Re-export commonly used configuration types
pub use self::core::{
    BoostingConfig, GBCentConfig, OptimizerConfig, TrainingConfig, TrainingConfigBuilder,
    TreeConfig,
};
pub use self::objective::ObjectiveConfig;
