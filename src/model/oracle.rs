//! Per-instance scoring results.

use crate::core::types::{Label, Score};

/// Partial derivative with respect to one scalar parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalarTouch {
    /// Name of the scalar array
    pub name: String,
    /// Index into the array
    pub index: usize,
    /// d(prediction)/d(param) until back-propagation, d(objective)/d(param) after
    pub gradient: f64,
}

/// Partial derivative with respect to one vector parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorTouch {
    /// Name of the vector array
    pub name: String,
    /// Index into the array
    pub index: usize,
    /// Element-wise partial derivative
    pub gradient: Vec<f64>,
}

/// Scoring result for one instance.
///
/// A model fills in the prediction and the partial derivative of the
/// prediction for every parameter it read. The objective's batch wrap then
/// sets the objective value and the gradient with respect to the prediction,
/// and scales every touch by that gradient.
#[derive(Debug, Clone, PartialEq)]
pub struct Oracle {
    pub prediction: Score,
    pub label: Label,
    pub weight: Label,
    pub objective_value: Score,
    pub gradient: Score,
    pub scalar_touches: Vec<ScalarTouch>,
    pub vector_touches: Vec<VectorTouch>,
}

impl Oracle {
    /// Creates an oracle with no touches and zero objective.
    pub fn new(prediction: Score, label: Label, weight: Label) -> Self {
        Oracle {
            prediction,
            label,
            weight,
            objective_value: 0.0,
            gradient: 0.0,
            scalar_touches: Vec::new(),
            vector_touches: Vec::new(),
        }
    }

    /// Record d(prediction)/d(`name[index]`).
    pub fn add_scalar(&mut self, name: &str, index: usize, gradient: f64) {
        self.scalar_touches.push(ScalarTouch {
            name: name.to_string(),
            index,
            gradient,
        });
    }

    /// Record d(prediction)/d(`name[index]`) for a vector parameter.
    pub fn add_vector(&mut self, name: &str, index: usize, gradient: Vec<f64>) {
        self.vector_touches.push(VectorTouch {
            name: name.to_string(),
            index,
            gradient,
        });
    }

    /// Set the objective gradient with respect to the prediction and apply
    /// the chain rule to every recorded touch.
    pub fn backpropagate(&mut self, gradient: Score) {
        self.gradient = gradient;
        for touch in &mut self.scalar_touches {
            touch.gradient *= gradient;
        }
        for touch in &mut self.vector_touches {
            touch.gradient.iter_mut().for_each(|g| *g *= gradient);
        }
    }
}
