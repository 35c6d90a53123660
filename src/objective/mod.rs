//! Objective functions.

pub mod ranking;
pub mod regression;

pub use ranking::MapLoss;
pub use regression::{L2Loss, LogisticLoss};

use crate::config::ObjectiveConfig;
use crate::core::error::Result;
use crate::core::traits::ObjectiveFunction;
use crate::core::types::ObjectiveType;

use std::sync::Arc;

/// Build the objective function described by `config`.
pub fn create_objective(config: &ObjectiveConfig) -> Result<Arc<dyn ObjectiveFunction>> {
    config.validate()?;
    Ok(match config.objective_type {
        ObjectiveType::L2 => Arc::new(L2Loss),
        ObjectiveType::Logistic => Arc::new(LogisticLoss),
        ObjectiveType::Map => Arc::new(MapLoss::new(
            config.map_cutoff,
            config.map_sigma,
            config.map_threshold,
        )),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_objective() {
        let l2 = create_objective(&ObjectiveConfig::default()).unwrap();
        assert_eq!(l2.name(), "l2");

        let map = create_objective(&ObjectiveConfig::new(ObjectiveType::Map)).unwrap();
        assert_eq!(map.name(), "map");
    }

    #[test]
    fn test_invalid_map_cutoff() {
        let mut config = ObjectiveConfig::new(ObjectiveType::Map);
        config.map_cutoff = 0;
        assert!(create_objective(&config).is_err());
    }
}
