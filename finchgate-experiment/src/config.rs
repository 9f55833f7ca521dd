use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_CROSSING_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionSettings {
    /// How long one half of a passage waits for the other half.
    pub crossing_timeout_secs: f64,
    /// Fixed RNG seed for reproducible trial sequences.
    pub seed: Option<u64>,
}

impl SessionSettings {
    /// The correlation window. A zero, negative, non-finite or
    /// unrepresentable setting falls back to the default window.
    pub fn crossing_timeout(&self) -> Duration {
        match Duration::try_from_secs_f64(self.crossing_timeout_secs) {
            Ok(timeout) if !timeout.is_zero() => timeout,
            _ => {
                warn!(
                    "Crossing timeout {}s is unusable, using {:?}",
                    self.crossing_timeout_secs, DEFAULT_CROSSING_TIMEOUT
                );
                DEFAULT_CROSSING_TIMEOUT
            }
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            crossing_timeout_secs: DEFAULT_CROSSING_TIMEOUT.as_secs_f64(),
            seed: None,
        }
    }
}
