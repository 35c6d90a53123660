//! Objective function configuration for gbcent-rust.

use crate::core::constants::{DEFAULT_MAP_CUTOFF, DEFAULT_MAP_SIGMA, DEFAULT_MAP_THRESHOLD};
use crate::core::error::{GBCentError, Result};
use crate::core::types::ObjectiveType;
use serde::{Deserialize, Serialize};

/// Objective function configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectiveConfig {
    /// Type of objective function
    pub objective_type: ObjectiveType,
    /// Result-list cutoff of the MAP loss
    pub map_cutoff: usize,
    /// Sigmoid steepness of the MAP loss
    pub map_sigma: f64,
    /// Label at or above which an item is relevant for the MAP loss
    pub map_threshold: f64,
}

impl Default for ObjectiveConfig {
    fn default() -> Self {
        ObjectiveConfig {
            objective_type: ObjectiveType::L2,
            map_cutoff: DEFAULT_MAP_CUTOFF,
            map_sigma: DEFAULT_MAP_SIGMA,
            map_threshold: DEFAULT_MAP_THRESHOLD,
        }
    }
}

impl ObjectiveConfig {
    /// Create a new objective configuration
    pub fn new(objective_type: ObjectiveType) -> Self {
        ObjectiveConfig {
            objective_type,
            ..ObjectiveConfig::default()
        }
    }

    /// Create configuration for the MAP ranking loss
    pub fn map(cutoff: usize, sigma: f64, threshold: f64) -> Self {
        ObjectiveConfig {
            objective_type: ObjectiveType::Map,
            map_cutoff: cutoff,
            map_sigma: sigma,
            map_threshold: threshold,
        }
    }

    /// Validate the objective configuration
    pub fn validate(&self) -> Result<()> {
        if self.objective_type != ObjectiveType::Map {
            return Ok(());
        }
        if self.map_cutoff == 0 {
            return Err(GBCentError::invalid_parameter(
                "map_cutoff",
                "0",
                "must be at least 1",
            ));
        }
        if !(self.map_sigma > 0.0) || !self.map_sigma.is_finite() {
            return Err(GBCentError::invalid_parameter(
                "map_sigma",
                self.map_sigma.to_string(),
                "must be a positive finite number",
            ));
        }
        Ok(())
    }
}
