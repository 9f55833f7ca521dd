use crate::colour::{Colour, CueColours};
use crate::obstacle::ObstacleConfiguration;
use serde::{Deserialize, Serialize};

/// The exact set of keys every catalog trial must carry.
pub const TRIAL_FIELDS: [&str; 5] = ["trial_id", "left_bg", "right_bg", "left_fg", "right_fg"];

/// One experimental condition.
///
/// Background colours are the cue shown to the bird; foreground colours are
/// the obstacle configuration the condition may run under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrialDefinition {
    pub trial_id: u32,
    pub left_bg: Colour,
    pub right_bg: Colour,
    pub left_fg: Colour,
    pub right_fg: Colour,
}

impl TrialDefinition {
    pub fn cue(&self) -> CueColours {
        CueColours {
            left: self.left_bg.clone(),
            right: self.right_bg.clone(),
        }
    }

    pub fn obstacle(&self) -> ObstacleConfiguration {
        ObstacleConfiguration {
            left_fg: self.left_fg.clone(),
            right_fg: self.right_fg.clone(),
        }
    }
}

/// The trial currently shown, or the blank placeholder used until the first
/// obstacle has been confirmed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CurrentTrial {
    #[default]
    Blank,
    Trial(TrialDefinition),
}

impl CurrentTrial {
    pub fn trial_id(&self) -> Option<u32> {
        self.definition().map(|t| t.trial_id)
    }

    pub fn definition(&self) -> Option<&TrialDefinition> {
        match self {
            Self::Blank => None,
            Self::Trial(t) => Some(t),
        }
    }

    pub fn cue(&self) -> Option<CueColours> {
        self.definition().map(TrialDefinition::cue)
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Blank)
    }
}
