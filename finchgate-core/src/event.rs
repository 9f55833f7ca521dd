use crate::gate::Gate;
use serde::{Deserialize, Serialize};

/// One accepted hardware trigger, as persisted for offline analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossingEvent {
    pub gate_id: Gate,
    /// Seconds since the Unix epoch.
    pub epoch_time: f64,
    pub trial_id: Option<u32>,
}
