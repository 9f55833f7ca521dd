use serde::{Deserialize, Serialize};
use std::fmt;

/// A physical crossing sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gate {
    Entrance,
    Left,
    Right,
}

impl Gate {
    pub const ALL: [Gate; 3] = [Gate::Entrance, Gate::Left, Gate::Right];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Entrance => "entrance",
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    /// Which correlation slot a crossing of this gate arms.
    pub fn slot(&self) -> CrossingSlot {
        match self {
            Self::Entrance => CrossingSlot::Entrance,
            Self::Left | Self::Right => CrossingSlot::Exit,
        }
    }
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Half of a passage: the bird went in, or the bird went out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrossingSlot {
    Entrance,
    Exit,
}

/// Target of a crossing timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutSlot {
    Entrance,
    Exit,
    All,
}

impl TimeoutSlot {
    pub fn covers(&self, slot: CrossingSlot) -> bool {
        match self {
            Self::All => true,
            Self::Entrance => slot == CrossingSlot::Entrance,
            Self::Exit => slot == CrossingSlot::Exit,
        }
    }
}

impl From<CrossingSlot> for TimeoutSlot {
    fn from(slot: CrossingSlot) -> Self {
        match slot {
            CrossingSlot::Entrance => Self::Entrance,
            CrossingSlot::Exit => Self::Exit,
        }
    }
}
