//! Default configuration values and well-known parameter names.

/// Name of the scalar array holding one bias per group.
pub const BIASES: &str = "biases";

/// Name of the vector array holding the latent factors.
pub const FACTORS: &str = "factors";

/// Crate version.
pub const GBCENT_RUST_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default SGD learning rate.
pub const DEFAULT_LEARNING_RATE: f64 = 0.01;

/// Default L2 regularization coefficient.
pub const DEFAULT_L2_COEF: f64 = 0.0;

/// Default number of full passes made by `minimize`.
pub const DEFAULT_MAX_ITERATIONS: usize = 50;

/// Relative objective change below which `minimize` stops.
pub const DEFAULT_TOLERANCE: f64 = 5e-5;

/// Default number of optimizer threads. 0 means use all available cores.
pub const DEFAULT_NUM_THREADS: usize = 1;

/// Minimum number of training instances a group needs before a tree is fit.
pub const DEFAULT_MIN_SUPPORT: usize = 50;

/// Minimum average objective gain for a candidate tree to be accepted.
pub const DEFAULT_MIN_TREE_GAIN: f64 = 0.0;

/// Default maximum tree depth.
pub const DEFAULT_MAX_DEPTH: usize = 3;

/// Default minimum number of instances on each side of a split.
pub const DEFAULT_MIN_LEAF_SUPPORT: usize = 20;

/// Default minimum criterion gain for a split to be made.
pub const DEFAULT_MIN_SPLIT_GAIN: f64 = 0.0;

/// Default shrinkage applied to tree outputs.
pub const DEFAULT_SHRINKAGE: f64 = 1.0;

/// Default number of trees grown by the standard boosting method.
pub const DEFAULT_MAX_NUM_TREES: usize = 100;

/// Default number of instances returned per batch by in-memory sources.
pub const DEFAULT_BATCH_SIZE: usize = 128;

/// Default half-width of the uniform range used by random initialization.
pub const DEFAULT_INIT_RANGE: f64 = 0.01;

/// Default result-list cutoff of the MAP ranking loss.
pub const DEFAULT_MAP_CUTOFF: usize = 24;

/// Default sigmoid steepness of the MAP ranking loss.
pub const DEFAULT_MAP_SIGMA: f64 = 1.0;

/// Default label threshold above which an item counts as relevant.
pub const DEFAULT_MAP_THRESHOLD: f64 = 0.5;

/// The optimizer logs progress every this many instances.
pub const PROGRESS_LOG_INTERVAL: usize = 100_000;
