//! Random initialization of model parameters.

use crate::core::constants::DEFAULT_INIT_RANGE;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fmt::Debug;

/// Source of initial values for randomly filled parameters.
pub trait ParameterInitializer: Send + Debug {
    /// Draw one initial scalar value.
    fn init_value(&mut self) -> f64;

    /// Fill `vec` in place, renormalizing it when `normalize` is set.
    fn init_vector(&mut self, vec: &mut [f64], normalize: bool);
}

/// Uniform initializer over `[-range, range]`.
///
/// When a vector is normalized it is rescaled to `target_norm` in L2 norm;
/// an all-zero draw is left untouched.
#[derive(Debug)]
pub struct RandomInitializer {
    rng: StdRng,
    range: f64,
    target_norm: f64,
}

impl RandomInitializer {
    /// Constructor, with random seed
    pub fn new() -> Self {
        RandomInitializer {
            rng: StdRng::from_entropy(),
            range: DEFAULT_INIT_RANGE,
            target_norm: 1.0,
        }
    }

    /// Constructor, with specific seed
    pub fn with_seed(seed: u64) -> Self {
        RandomInitializer {
            rng: StdRng::seed_from_u64(seed),
            range: DEFAULT_INIT_RANGE,
            target_norm: 1.0,
        }
    }

    /// Sets the half-width of the sampling range.
    pub fn range(mut self, range: f64) -> Self {
        self.range = range.abs();
        self
    }

    /// Sets the norm that normalized vectors are rescaled to.
    pub fn target_norm(mut self, target_norm: f64) -> Self {
        self.target_norm = target_norm;
        self
    }
}

impl Default for RandomInitializer {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterInitializer for RandomInitializer {
    fn init_value(&mut self) -> f64 {
        if self.range == 0.0 {
            return 0.0;
        }
        self.rng.gen_range(-self.range..=self.range)
    }

    fn init_vector(&mut self, vec: &mut [f64], normalize: bool) {
        for v in vec.iter_mut() {
            *v = self.init_value();
        }
        if normalize {
            let norm = vec.iter().map(|v| v * v).sum::<f64>().sqrt();
            if norm > 0.0 {
                let scale = self.target_norm / norm;
                vec.iter_mut().for_each(|v| *v *= scale);
            }
        }
    }
}
