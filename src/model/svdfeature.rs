//! Latent-factor base model over sparse features.
//!
//! The prediction for an instance is
//!
//! ```text
//! sum_b value_b * biases[b] + dot(sum_u value_u * factors[u], sum_i value_i * factors[i])
//! ```
//!
//! so each bias contributes linearly and user/item factors interact through
//! a single dot product of their weighted sums.

use crate::core::constants::{BIASES, FACTORS};
use crate::core::error::Result;
use crate::core::traits::{ObjectiveFunction, TrainableModel};
use crate::core::types::Score;
use crate::dataset::{Feature, SvdFeatureInstance};
use crate::model::oracle::Oracle;
use crate::model::space::{Fill, ParameterSpace};

use ndarray::{Array1, ArrayView1};
use std::sync::Arc;

/// Biases plus factor vectors, scored by sparse dot products.
#[derive(Debug, Clone)]
pub struct SvdFeatureModel {
    space: Arc<ParameterSpace>,
    objective: Arc<dyn ObjectiveFunction>,
    factor_dim: usize,
}

impl SvdFeatureModel {
    /// Declare the model's parameters in `space` and wrap them.
    ///
    /// Biases start at zero and factors are drawn from the space's random
    /// initializer. Parameters already present keep their values, which lets
    /// several models share one space.
    pub fn new(
        space: Arc<ParameterSpace>,
        objective: Arc<dyn ObjectiveFunction>,
        num_biases: usize,
        num_factors: usize,
        factor_dim: usize,
    ) -> Result<Self> {
        space.ensure_scalar(BIASES, num_biases, Fill::Constant(0.0))?;
        space.ensure_vector(FACTORS, num_factors, factor_dim, Fill::Random { normalize: false })?;
        Ok(SvdFeatureModel {
            space,
            objective,
            factor_dim,
        })
    }

    /// Length of each factor vector.
    pub fn factor_dim(&self) -> usize {
        self.factor_dim
    }

    /// Number of bias slots, which is also the number of groups.
    pub fn num_biases(&self) -> Result<usize> {
        self.space.scalar_size(BIASES)
    }

    /// Shared handle to the parameter space.
    pub fn space_handle(&self) -> Arc<ParameterSpace> {
        Arc::clone(&self.space)
    }

    /// Shared handle to the objective.
    pub fn objective_handle(&self) -> Arc<dyn ObjectiveFunction> {
        Arc::clone(&self.objective)
    }

    /// Prediction for one instance.
    pub fn predict(&self, instance: &SvdFeatureInstance) -> Result<Score> {
        Ok(self.score(instance, false)?.prediction)
    }

    fn weighted_factor_sum(&self, features: &[Feature]) -> Result<Array1<f64>> {
        let mut sum = Array1::<f64>::zeros(self.factor_dim);
        for feature in features {
            let factor = self.space.vector(FACTORS, feature.index)?;
            sum.scaled_add(feature.value, &ArrayView1::from(&factor[..]));
        }
        Ok(sum)
    }

    fn score(&self, instance: &SvdFeatureInstance, with_touches: bool) -> Result<Oracle> {
        let mut prediction = 0.0;
        for feature in &instance.bias_features {
            prediction += feature.value * self.space.scalar(BIASES, feature.index)?;
        }

        let user_sum = self.weighted_factor_sum(&instance.user_features)?;
        let item_sum = self.weighted_factor_sum(&instance.item_features)?;
        prediction += user_sum.dot(&item_sum);

        let mut oracle = Oracle::new(prediction, instance.label, instance.weight);
        if with_touches {
            for feature in &instance.bias_features {
                oracle.add_scalar(BIASES, feature.index, feature.value);
            }
            for feature in &instance.user_features {
                oracle.add_vector(FACTORS, feature.index, (&item_sum * feature.value).to_vec());
            }
            for feature in &instance.item_features {
                oracle.add_vector(FACTORS, feature.index, (&user_sum * feature.value).to_vec());
            }
        }
        Ok(oracle)
    }
}

impl TrainableModel for SvdFeatureModel {
    type Instance = SvdFeatureInstance;

    fn oracle(&self, instance: &SvdFeatureInstance) -> Result<Oracle> {
        self.score(instance, true)
    }

    fn space(&self) -> &ParameterSpace {
        &self.space
    }

    fn objective_function(&self) -> &dyn ObjectiveFunction {
        self.objective.as_ref()
    }
}
