//! Capabilities the session consumes from the outside world.

use finchgate_core::{Colour, CrossingEvent};
use finchgate_timing::TimerToken;
use std::time::Duration;

/// Delayed callbacks on the session's own loop. When a scheduled token
/// expires, the loop owner hands it back through
/// [`SessionController::timer_fired`](crate::SessionController::timer_fired).
pub trait Scheduler {
    fn schedule_after(&mut self, delay: Duration) -> TimerToken;
    fn cancel(&mut self, token: TimerToken);
}

/// The cue screen facing the bird, plus the obstacle preview shown to the
/// experimenter during reconfiguration.
pub trait DisplayPort: Scheduler {
    fn set_cue_colours(&mut self, left: &Colour, right: &Colour);
    fn set_obstacle_preview_colours(&mut self, left: &Colour, right: &Colour);
    fn set_obstacle_preview_visible(&mut self, visible: bool);
    fn close(&mut self);
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("data sink is closed")]
    Closed,
    #[error("data sink i/o failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Append-only store of raw crossing events. `append` must return promptly;
/// implementations buffer and flush off the caller's path.
pub trait DataSink {
    fn append(&mut self, event: CrossingEvent) -> Result<(), SinkError>;
    fn close(&mut self);
}
