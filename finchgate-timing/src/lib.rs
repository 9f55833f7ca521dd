pub mod deadline;
pub mod timer;

pub use deadline::{DeadlineQueue, TimerToken};
pub use timer::{ManualTimer, SystemTimer, Timer};
