//! Core configuration structures for gbcent-rust.
//!
//! Each training stage has its own section: the SGD optimizer, the tree
//! learner, the grouped boosting trainer and the standard boosting method.
//! [`TrainingConfig`] aggregates them and handles file and environment
//! loading.

use crate::config::objective::ObjectiveConfig;
use crate::core::constants::*;
use crate::core::error::{GBCentError, Result};
use crate::core::types::CriterionType;
use crate::core::utils::random::RandomInitializer;
use crate::model::ParameterSpace;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings of the online SGD optimizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Step size of each parameter update
    pub learning_rate: f64,
    /// Coefficient of the L2 penalty added to every gradient
    pub l2_coef: f64,
    /// Maximum number of full passes made by `minimize`
    pub max_iterations: usize,
    /// Relative objective change below which `minimize` stops
    pub tolerance: f64,
    /// Worker threads; 1 runs the serial optimizer, 0 uses all cores
    pub num_threads: usize,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig {
            learning_rate: DEFAULT_LEARNING_RATE,
            l2_coef: DEFAULT_L2_COEF,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
            num_threads: DEFAULT_NUM_THREADS,
        }
    }
}

impl OptimizerConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate > 0.0) || !self.learning_rate.is_finite() {
            return Err(GBCentError::invalid_parameter(
                "learning_rate",
                self.learning_rate.to_string(),
                "must be a positive finite number",
            ));
        }
        if self.l2_coef < 0.0 || !self.l2_coef.is_finite() {
            return Err(GBCentError::invalid_parameter(
                "l2_coef",
                self.l2_coef.to_string(),
                "must be non-negative",
            ));
        }
        if self.max_iterations == 0 {
            return Err(GBCentError::invalid_parameter(
                "max_iterations",
                "0",
                "must be at least 1",
            ));
        }
        if self.tolerance < 0.0 {
            return Err(GBCentError::invalid_parameter(
                "tolerance",
                self.tolerance.to_string(),
                "must be non-negative",
            ));
        }
        Ok(())
    }

    /// Get the effective number of threads (0 means use all available cores)
    pub fn effective_num_threads(&self) -> usize {
        if self.num_threads == 0 {
            num_cpus::get()
        } else {
            self.num_threads
        }
    }
}

/// Settings of the regression tree learner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Split statistic
    pub criterion: CriterionType,
    /// Maximum depth; a depth-0 tree is a single leaf
    pub max_depth: usize,
    /// Minimum number of instances on each side of a split
    pub min_leaf_support: usize,
    /// Minimum criterion gain for a split
    pub min_split_gain: f64,
    /// Factor applied to every leaf value at prediction time
    pub shrinkage: f64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        TreeConfig {
            criterion: CriterionType::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            min_leaf_support: DEFAULT_MIN_LEAF_SUPPORT,
            min_split_gain: DEFAULT_MIN_SPLIT_GAIN,
            shrinkage: DEFAULT_SHRINKAGE,
        }
    }
}

impl TreeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_leaf_support == 0 {
            return Err(GBCentError::invalid_parameter(
                "min_leaf_support",
                "0",
                "must be at least 1",
            ));
        }
        if self.min_split_gain < 0.0 {
            return Err(GBCentError::invalid_parameter(
                "min_split_gain",
                self.min_split_gain.to_string(),
                "must be non-negative",
            ));
        }
        if !(self.shrinkage > 0.0) || self.shrinkage > 1.0 {
            return Err(GBCentError::invalid_parameter(
                "shrinkage",
                self.shrinkage.to_string(),
                "must be in range (0.0, 1.0]",
            ));
        }
        Ok(())
    }
}

/// Settings of the grouped boosting trainer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GBCentConfig {
    /// Groups with fewer training instances are never given a tree
    pub min_support: usize,
    /// Minimum average objective improvement for a tree to be accepted
    pub min_tree_gain: f64,
    /// Whether the base model is optimized before the trees are fit
    pub learn_base_model: bool,
}

impl Default for GBCentConfig {
    fn default() -> Self {
        GBCentConfig {
            min_support: DEFAULT_MIN_SUPPORT,
            min_tree_gain: DEFAULT_MIN_TREE_GAIN,
            learn_base_model: true,
        }
    }
}

impl GBCentConfig {
    pub fn validate(&self) -> Result<()> {
        if self.min_support == 0 {
            return Err(GBCentError::invalid_parameter(
                "min_support",
                "0",
                "must be at least 1",
            ));
        }
        if self.min_tree_gain < 0.0 || self.min_tree_gain.is_nan() {
            return Err(GBCentError::invalid_parameter(
                "min_tree_gain",
                self.min_tree_gain.to_string(),
                "must be non-negative",
            ));
        }
        Ok(())
    }
}

/// Settings of the standard (ungrouped) boosting method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoostingConfig {
    /// Maximum number of trees in the ensemble
    pub max_num_trees: usize,
    /// Minimum average validation improvement for a tree to be kept
    pub min_tree_gain: f64,
}

impl Default for BoostingConfig {
    fn default() -> Self {
        BoostingConfig {
            max_num_trees: DEFAULT_MAX_NUM_TREES,
            min_tree_gain: DEFAULT_MIN_TREE_GAIN,
        }
    }
}

impl BoostingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_num_trees == 0 {
            return Err(GBCentError::invalid_parameter(
                "max_num_trees",
                "0",
                "must be at least 1",
            ));
        }
        if self.min_tree_gain < 0.0 || self.min_tree_gain.is_nan() {
            return Err(GBCentError::invalid_parameter(
                "min_tree_gain",
                self.min_tree_gain.to_string(),
                "must be non-negative",
            ));
        }
        Ok(())
    }
}

/// Complete training configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Half-width of the uniform range for random parameter initialization
    pub init_range: f64,
    /// Seed of the parameter initializer; entropy-seeded when absent
    pub random_seed: Option<u64>,
    /// Loss function
    pub objective: ObjectiveConfig,
    /// Base model optimizer
    pub optimizer: OptimizerConfig,
    /// Tree learner
    pub tree: TreeConfig,
    /// Grouped boosting trainer
    pub gbcent: GBCentConfig,
    /// Standard boosting method
    pub boosting: BoostingConfig,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        TrainingConfig {
            init_range: DEFAULT_INIT_RANGE,
            random_seed: None,
            objective: ObjectiveConfig::default(),
            optimizer: OptimizerConfig::default(),
            tree: TreeConfig::default(),
            gbcent: GBCentConfig::default(),
            boosting: BoostingConfig::default(),
        }
    }
}

impl TrainingConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.objective.validate()?;
        self.optimizer.validate()?;
        self.tree.validate()?;
        self.gbcent.validate()?;
        self.boosting.validate()?;
        if self.init_range < 0.0 || !self.init_range.is_finite() {
            return Err(GBCentError::invalid_parameter(
                "init_range",
                self.init_range.to_string(),
                "must be non-negative",
            ));
        }
        Ok(())
    }

    /// Random initializer configured by `init_range` and `random_seed`.
    pub fn initializer(&self) -> RandomInitializer {
        let init = match self.random_seed {
            Some(seed) => RandomInitializer::with_seed(seed),
            None => RandomInitializer::new(),
        };
        init.range(self.init_range)
    }

    /// Empty parameter space drawing random fills from [`initializer`](Self::initializer).
    pub fn create_space(&self) -> ParameterSpace {
        ParameterSpace::with_initializer(Box::new(self.initializer()))
    }

    /// Load configuration from a `.json` or `.toml` file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| crate::config_error!("Failed to read config file: {}", e))?;

        let config: TrainingConfig = match path.extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::from_str(&content)
                .map_err(|e| crate::config_error!("Failed to parse JSON config: {}", e))?,
            Some("toml") => toml::from_str(&content)
                .map_err(|e| crate::config_error!("Failed to parse TOML config: {}", e))?,
            _ => {
                return Err(GBCentError::config(
                    "Unsupported config file format. Use .json or .toml",
                ))
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a `.json` or `.toml` file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = match path.extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::to_string_pretty(self)
                .map_err(|e| crate::config_error!("Failed to serialize to JSON: {}", e))?,
            Some("toml") => toml::to_string_pretty(self)
                .map_err(|e| crate::config_error!("Failed to serialize to TOML: {}", e))?,
            _ => {
                return Err(GBCentError::config(
                    "Unsupported config file format. Use .json or .toml",
                ))
            }
        };

        std::fs::write(path, content)
            .map_err(|e| crate::config_error!("Failed to write config file: {}", e))?;

        Ok(())
    }

    /// Override selected settings from `GBCENT_*` environment variables.
    pub fn apply_environment_overrides(&mut self) -> Result<()> {
        if let Some(val) = env_value("GBCENT_LEARNING_RATE")? {
            self.optimizer.learning_rate = val;
        }
        if let Some(val) = env_value("GBCENT_NUM_THREADS")? {
            self.optimizer.num_threads = val;
        }
        if let Some(val) = env_value("GBCENT_MAX_ITERATIONS")? {
            self.optimizer.max_iterations = val;
        }
        if let Some(val) = env_value("GBCENT_MIN_SUPPORT")? {
            self.gbcent.min_support = val;
        }
        if let Some(val) = env_value("GBCENT_RANDOM_SEED")? {
            self.random_seed = Some(val);
        }

        self.validate()
    }
}

fn env_value<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(val) => val
            .parse()
            .map(Some)
            .map_err(|_| crate::config_error!("Invalid {}", name)),
        Err(_) => Ok(None),
    }
}

/// Configuration builder for fluent configuration creation
#[derive(Debug, Clone)]
pub struct TrainingConfigBuilder {
    config: TrainingConfig,
    validation_errors: Vec<String>,
}

impl TrainingConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        TrainingConfigBuilder {
            config: TrainingConfig::default(),
            validation_errors: Vec::new(),
        }
    }

    /// Set the objective
    pub fn objective(mut self, objective: ObjectiveConfig) -> Self {
        self.config.objective = objective;
        self
    }

    /// Set the learning rate
    pub fn learning_rate(mut self, rate: f64) -> Self {
        if !(rate > 0.0) {
            self.validation_errors
                .push("learning_rate must be positive".to_string());
        }
        self.config.optimizer.learning_rate = rate;
        self
    }

    /// Set the L2 regularization coefficient
    pub fn l2_coef(mut self, coef: f64) -> Self {
        self.config.optimizer.l2_coef = coef;
        self
    }

    /// Set the maximum number of optimizer passes
    pub fn max_iterations(mut self, iterations: usize) -> Self {
        self.config.optimizer.max_iterations = iterations;
        self
    }

    /// Set the optimizer convergence tolerance
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.config.optimizer.tolerance = tolerance;
        self
    }

    /// Set the number of optimizer threads
    pub fn num_threads(mut self, threads: usize) -> Self {
        self.config.optimizer.num_threads = threads;
        self
    }

    /// Set the tree split criterion
    pub fn criterion(mut self, criterion: CriterionType) -> Self {
        self.config.tree.criterion = criterion;
        self
    }

    /// Set the maximum tree depth
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.config.tree.max_depth = depth;
        self
    }

    /// Set the minimum number of instances per leaf
    pub fn min_leaf_support(mut self, support: usize) -> Self {
        if support == 0 {
            self.validation_errors
                .push("min_leaf_support must be at least 1".to_string());
        }
        self.config.tree.min_leaf_support = support;
        self
    }

    /// Set the minimum split gain
    pub fn min_split_gain(mut self, gain: f64) -> Self {
        self.config.tree.min_split_gain = gain;
        self
    }

    /// Set the tree shrinkage
    pub fn shrinkage(mut self, shrinkage: f64) -> Self {
        self.config.tree.shrinkage = shrinkage;
        self
    }

    /// Set the minimum group support
    pub fn min_support(mut self, support: usize) -> Self {
        self.config.gbcent.min_support = support;
        self
    }

    /// Set the minimum tree gain for both boosting methods
    pub fn min_tree_gain(mut self, gain: f64) -> Self {
        if gain < 0.0 {
            self.validation_errors
                .push("min_tree_gain must be non-negative".to_string());
        }
        self.config.gbcent.min_tree_gain = gain;
        self.config.boosting.min_tree_gain = gain;
        self
    }

    /// Set whether the base model is optimized before boosting
    pub fn learn_base_model(mut self, learn: bool) -> Self {
        self.config.gbcent.learn_base_model = learn;
        self
    }

    /// Set the maximum number of trees of the standard boosting method
    pub fn max_num_trees(mut self, trees: usize) -> Self {
        self.config.boosting.max_num_trees = trees;
        self
    }

    /// Set the initialization range
    pub fn init_range(mut self, range: f64) -> Self {
        self.config.init_range = range;
        self
    }

    /// Set the random seed
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.config.random_seed = Some(seed);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<TrainingConfig> {
        if !self.validation_errors.is_empty() {
            return Err(crate::config_error!(
                "Configuration validation failed: {}",
                self.validation_errors.join(", ")
            ));
        }

        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for TrainingConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ObjectiveType;
    use crate::core::utils::random::ParameterInitializer;
    use tempfile::tempdir;

    #[test]
    fn test_config_default() {
        let config = TrainingConfig::default();
        assert_eq!(config.optimizer.learning_rate, DEFAULT_LEARNING_RATE);
        assert_eq!(config.gbcent.min_support, DEFAULT_MIN_SUPPORT);
        assert_eq!(config.tree.max_depth, DEFAULT_MAX_DEPTH);
        assert!(config.gbcent.learn_base_model);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = TrainingConfig::default();
        config.optimizer.learning_rate = -0.1;
        assert!(config.validate().is_err());

        config.optimizer.learning_rate = 0.1;
        config.tree.shrinkage = 0.0;
        assert!(config.validate().is_err());

        config.tree.shrinkage = 0.5;
        config.gbcent.min_support = 0;
        let err = config.validate().unwrap_err();
        assert_eq!(err.category(), "invalid_parameter");
    }

    #[test]
    fn test_config_builder() {
        let config = TrainingConfigBuilder::new()
            .learning_rate(0.05)
            .num_threads(4)
            .max_depth(5)
            .min_support(10)
            .min_tree_gain(0.01)
            .random_seed(3)
            .build()
            .unwrap();

        assert_eq!(config.optimizer.learning_rate, 0.05);
        assert_eq!(config.optimizer.num_threads, 4);
        assert_eq!(config.tree.max_depth, 5);
        assert_eq!(config.gbcent.min_support, 10);
        assert_eq!(config.boosting.min_tree_gain, 0.01);
        assert_eq!(config.random_seed, Some(3));
    }

    #[test]
    fn test_config_builder_validation() {
        let result = TrainingConfigBuilder::new()
            .learning_rate(-0.1)
            .min_leaf_support(0)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_effective_num_threads() {
        let mut config = OptimizerConfig::default();
        assert_eq!(config.effective_num_threads(), 1);
        config.num_threads = 0;
        assert_eq!(config.effective_num_threads(), num_cpus::get());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempdir().unwrap();
        let config = TrainingConfigBuilder::new()
            .objective(ObjectiveConfig::new(ObjectiveType::Logistic))
            .min_support(7)
            .random_seed(11)
            .build()
            .unwrap();

        for name in ["config.json", "config.toml"] {
            let path = dir.path().join(name);
            config.save_to_file(&path).unwrap();
            let loaded = TrainingConfig::load_from_file(&path).unwrap();
            assert_eq!(loaded, config);
        }

        assert!(config.save_to_file(dir.path().join("config.yaml")).is_err());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[gbcent]\nmin_support = 3\n").unwrap();
        let loaded = TrainingConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.gbcent.min_support, 3);
        assert_eq!(loaded.optimizer, OptimizerConfig::default());
    }

    #[test]
    fn test_seeded_initializer_is_reproducible() {
        let config = TrainingConfigBuilder::new().random_seed(5).build().unwrap();
        let a = config.initializer().init_value();
        let b = config.initializer().init_value();
        assert_eq!(a, b);
        assert!(a.abs() <= config.init_range);
    }
}
