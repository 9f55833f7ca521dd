use crate::colour::Colour;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Colours fitted to the physical obstacle fixture.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObstacleConfiguration {
    pub left_fg: Colour,
    pub right_fg: Colour,
}

impl ObstacleConfiguration {
    pub fn new(left_fg: impl Into<Colour>, right_fg: impl Into<Colour>) -> Self {
        Self {
            left_fg: left_fg.into(),
            right_fg: right_fg.into(),
        }
    }

    /// Same fixture, ignoring ASCII case on both sides.
    pub fn matches(&self, other: &ObstacleConfiguration) -> bool {
        self.left_fg.eq_ignore_case(&other.left_fg) && self.right_fg.eq_ignore_case(&other.right_fg)
    }
}

impl fmt::Display for ObstacleConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.left_fg, self.right_fg)
    }
}
