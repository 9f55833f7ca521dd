use crate::catalog::TrialCatalog;
use finchgate_core::ObstacleConfiguration;
use rand::Rng;
use rand::seq::IndexedRandom;

/// Two-phase obstacle change: propose a fixture, then confirm it once the
/// experimenter has physically set it. The proposal is held here and only
/// handed over on confirmation.
#[derive(Debug, Default)]
pub struct ObstacleConfigurator {
    proposed: Option<ObstacleConfiguration>,
}

impl ObstacleConfigurator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        self.proposed.is_some()
    }

    pub fn proposed(&self) -> Option<&ObstacleConfiguration> {
        self.proposed.as_ref()
    }

    /// Draws a fixture uniformly from the catalog's valid set and holds it.
    pub fn propose<R: Rng + ?Sized>(
        &mut self,
        catalog: &TrialCatalog,
        rng: &mut R,
    ) -> Option<&ObstacleConfiguration> {
        let choice = catalog.valid_obstacles().choose(rng)?.clone();
        self.proposed = Some(choice);
        self.proposed.as_ref()
    }

    /// Hands over the pending proposal.
    pub fn confirm(&mut self) -> Option<ObstacleConfiguration> {
        self.proposed.take()
    }
}
