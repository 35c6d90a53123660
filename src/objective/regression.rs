//! Pointwise regression and classification objectives.

use crate::core::traits::ObjectiveFunction;
use crate::core::types::{Label, Score};

/// Numerically stable `ln(1 + e^x)`.
pub(crate) fn softplus(x: f64) -> f64 {
    if x > 0.0 {
        x + (-x).exp().ln_1p()
    } else {
        x.exp().ln_1p()
    }
}

/// Logistic sigmoid.
pub(crate) fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Squared error, `0.5 * (p - y)^2 * w`.
#[derive(Debug, Clone, Copy, Default)]
pub struct L2Loss;

impl ObjectiveFunction for L2Loss {
    fn name(&self) -> &'static str {
        "l2"
    }

    fn objective(&self, prediction: Score, label: Label, weight: Label) -> Score {
        let diff = prediction - label;
        0.5 * diff * diff * weight
    }

    fn gradient(&self, prediction: Score, label: Label, weight: Label) -> Score {
        (prediction - label) * weight
    }
}

/// Logistic loss on a raw score with labels in {0, 1}.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogisticLoss;

impl ObjectiveFunction for LogisticLoss {
    fn name(&self) -> &'static str {
        "logistic"
    }

    fn objective(&self, prediction: Score, label: Label, weight: Label) -> Score {
        (softplus(prediction) - label * prediction) * weight
    }

    fn gradient(&self, prediction: Score, label: Label, weight: Label) -> Score {
        (sigmoid(prediction) - label) * weight
    }
}
