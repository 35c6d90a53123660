//! Batch-level ranking objectives.

use crate::core::constants::{DEFAULT_MAP_CUTOFF, DEFAULT_MAP_SIGMA, DEFAULT_MAP_THRESHOLD};
use crate::core::traits::ObjectiveFunction;
use crate::core::types::{Label, Score};
use crate::model::Oracle;
use crate::objective::regression::{sigmoid, softplus};

use std::cmp::Ordering;

/// Smoothed pairwise surrogate of MAP@N over one batch.
///
/// Items whose label reaches `threshold` are relevant. Every relevant item is
/// paired with every irrelevant item ranked inside the top `n` of the batch
/// by prediction, and each pair costs
/// `w_rel * ln(1 + exp(-sigma * (s_rel - s_irr)))`. The batch total is divided
/// by the number of relevant items. Each pair's cost is attributed to the
/// relevant item's oracle, and its gradient flows to both items.
#[derive(Debug, Clone, Copy)]
pub struct MapLoss {
    n: usize,
    sigma: f64,
    threshold: f64,
}

impl MapLoss {
    pub fn new(n: usize, sigma: f64, threshold: f64) -> Self {
        MapLoss { n, sigma, threshold }
    }

    /// Ranking cutoff.
    pub fn cutoff(&self) -> usize {
        self.n
    }

    fn is_relevant(&self, label: Label) -> bool {
        label >= self.threshold
    }
}

impl Default for MapLoss {
    fn default() -> Self {
        MapLoss::new(DEFAULT_MAP_CUTOFF, DEFAULT_MAP_SIGMA, DEFAULT_MAP_THRESHOLD)
    }
}

impl ObjectiveFunction for MapLoss {
    fn name(&self) -> &'static str {
        "map"
    }

    /// A single instance forms no pairs.
    fn objective(&self, _prediction: Score, _label: Label, _weight: Label) -> Score {
        0.0
    }

    fn gradient(&self, _prediction: Score, _label: Label, _weight: Label) -> Score {
        0.0
    }

    fn wrap_oracle(&self, oracles: &mut [Oracle]) {
        if oracles.is_empty() {
            return;
        }

        let mut ranked: Vec<usize> = (0..oracles.len()).collect();
        ranked.sort_by(|&a, &b| {
            oracles[b]
                .prediction
                .partial_cmp(&oracles[a].prediction)
                .unwrap_or(Ordering::Equal)
                .then(a.cmp(&b))
        });
        let top_irrelevant: Vec<usize> = ranked
            .iter()
            .take(self.n)
            .copied()
            .filter(|&i| !self.is_relevant(oracles[i].label))
            .collect();
        let relevant: Vec<usize> = (0..oracles.len())
            .filter(|&i| self.is_relevant(oracles[i].label))
            .collect();

        let mut values = vec![0.0; oracles.len()];
        let mut grads = vec![0.0; oracles.len()];
        if !relevant.is_empty() {
            let norm = relevant.len() as f64;
            for &r in &relevant {
                let weight = oracles[r].weight;
                for &i in &top_irrelevant {
                    let margin = self.sigma * (oracles[r].prediction - oracles[i].prediction);
                    values[r] += weight * softplus(-margin) / norm;
                    let slope = self.sigma * weight * sigmoid(-margin) / norm;
                    grads[r] -= slope;
                    grads[i] += slope;
                }
            }
        }

        for (k, oracle) in oracles.iter_mut().enumerate() {
            oracle.objective_value = values[k];
            oracle.backpropagate(grads[k]);
        }
    }
}
