//! Parameter penalties.

use crate::core::error::Result;
use crate::core::traits::Regularizer;
use crate::model::ParameterSpace;

/// Squared L2 penalty, `coef * sum(v^2)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct L2Regularizer;

impl Regularizer for L2Regularizer {
    fn objective(&self, coef: f64, vars: &[f64]) -> f64 {
        coef * vars.iter().map(|v| v * v).sum::<f64>()
    }

    fn gradient(&self, var: f64) -> f64 {
        2.0 * var
    }
}

/// Penalty of every parameter in `space`.
pub fn regularization_objective(
    space: &ParameterSpace,
    regularizer: &dyn Regularizer,
    coef: f64,
) -> Result<f64> {
    if coef == 0.0 {
        return Ok(0.0);
    }
    let mut objective = 0.0;
    for name in space.scalar_names()? {
        objective += regularizer.objective(coef, &space.scalar_array(&name)?);
    }
    for name in space.vector_names()? {
        for vector in space.vector_array(&name)? {
            objective += regularizer.objective(coef, &vector);
        }
    }
    Ok(objective)
}
