pub mod colour;
pub mod event;
pub mod gate;
pub mod obstacle;
pub mod phase;
pub mod trial;

pub use colour::{Colour, CueColours};
pub use event::CrossingEvent;
pub use gate::{CrossingSlot, Gate, TimeoutSlot};
pub use obstacle::ObstacleConfiguration;
pub use phase::{Activity, ActivityChange, Rejected, RunFlag, SessionPhase};
pub use trial::{CurrentTrial, TRIAL_FIELDS, TrialDefinition};
