use crate::catalog::TrialCatalog;
use finchgate_core::{ObstacleConfiguration, TrialDefinition};
use rand::Rng;
use rand::seq::IndexedRandom;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SelectError {
    #[error("obstacle ({0}) is not in the catalog's valid obstacle set")]
    UnknownObstacle(ObstacleConfiguration),
}

/// Trials that may run under `current`, compared case-insensitively.
pub fn compatible<'c>(
    catalog: &'c TrialCatalog,
    current: &ObstacleConfiguration,
) -> Vec<&'c TrialDefinition> {
    catalog
        .trials()
        .filter(|t| t.obstacle().matches(current))
        .collect()
}

/// Picks one compatible trial uniformly at random.
pub fn select<'c, R: Rng + ?Sized>(
    catalog: &'c TrialCatalog,
    current: &ObstacleConfiguration,
    rng: &mut R,
) -> Result<&'c TrialDefinition, SelectError> {
    compatible(catalog, current)
        .choose(rng)
        .copied()
        .ok_or_else(|| SelectError::UnknownObstacle(current.clone()))
}
