//! Fixed table of trial definitions and the obstacle configurations they run
//! under, validated once at startup.

use finchgate_core::{Colour, CueColours, ObstacleConfiguration, TRIAL_FIELDS, TrialDefinition};
use std::collections::{BTreeMap, BTreeSet};
use toml::{Table, Value};
use tracing::{debug, warn};

/// Catalog shipped with the rig: eight trials over four obstacle fixtures.
pub const DEFAULT_CATALOG: &str = include_str!("../catalog/default.toml");

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog is not valid TOML: {0}")]
    Parse(String),
    #[error("catalog `valid_obstacles` is missing or malformed: {0}")]
    Obstacles(String),
    #[error("catalog has no `trial` entries")]
    NoTrials,
    #[error(
        "trial {trial} keys do not match the trial template \
         (missing: {missing:?}, unexpected: {unexpected:?})"
    )]
    FieldMismatch {
        trial: String,
        missing: Vec<String>,
        unexpected: Vec<String>,
    },
    #[error("trial {trial} is malformed: {reason}")]
    Malformed { trial: String, reason: String },
    #[error("trial ids must be positive")]
    ZeroId,
    #[error("trial id {0} is used more than once")]
    DuplicateId(u32),
    #[error("trial {trial_id} runs under obstacle ({obstacle}), which is not a valid obstacle")]
    UnknownObstacle {
        trial_id: u32,
        obstacle: ObstacleConfiguration,
    },
    #[error("no trial runs under obstacle ({0})")]
    UncoveredObstacle(ObstacleConfiguration),
    #[error("trial {trial_id} background `{colour}` looks like the pause cue")]
    PauseColour { trial_id: u32, colour: Colour },
}

#[derive(Debug, Clone)]
pub struct TrialCatalog {
    trials: BTreeMap<u32, TrialDefinition>,
    valid_obstacles: Vec<ObstacleConfiguration>,
}

impl TrialCatalog {
    /// The built-in catalog.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::load(DEFAULT_CATALOG)
    }

    /// Parses and validates a catalog document.
    pub fn load(source: &str) -> Result<Self, CatalogError> {
        let doc: Table = source
            .parse()
            .map_err(|e: toml::de::Error| CatalogError::Parse(e.message().to_string()))?;

        let valid_obstacles: Vec<ObstacleConfiguration> = doc
            .get("valid_obstacles")
            .ok_or_else(|| CatalogError::Obstacles("missing".into()))?
            .clone()
            .try_into()
            .map_err(|e: toml::de::Error| CatalogError::Obstacles(e.message().to_string()))?;

        let entries = match doc.get("trial") {
            Some(Value::Array(entries)) => entries,
            Some(_) => {
                return Err(CatalogError::Malformed {
                    trial: "table".into(),
                    reason: "`trial` must be an array of tables".into(),
                });
            }
            None => return Err(CatalogError::NoTrials),
        };

        let mut trials = Vec::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            let label = trial_label(entry, position);
            let Value::Table(table) = entry else {
                return Err(CatalogError::Malformed {
                    trial: label,
                    reason: "not a table".into(),
                });
            };
            check_fields(table, &label)?;
            let trial: TrialDefinition =
                entry
                    .clone()
                    .try_into()
                    .map_err(|e: toml::de::Error| CatalogError::Malformed {
                        trial: label,
                        reason: e.message().to_string(),
                    })?;
            trials.push(trial);
        }

        Self::from_parts(trials, valid_obstacles)
    }

    /// Builds a catalog from already-typed parts, enforcing every invariant
    /// except the key-set check (which only applies to documents).
    pub fn from_parts(
        trials: Vec<TrialDefinition>,
        valid_obstacles: Vec<ObstacleConfiguration>,
    ) -> Result<Self, CatalogError> {
        if trials.is_empty() {
            return Err(CatalogError::NoTrials);
        }

        let mut unique = Vec::with_capacity(valid_obstacles.len());
        for obstacle in valid_obstacles {
            if unique.contains(&obstacle) {
                warn!("Obstacle ({}) listed twice in the catalog; ignoring the copy", obstacle);
            } else {
                unique.push(obstacle);
            }
        }

        let pause = CueColours::pause();
        let pause_rgb = [pause.left.rgb(), pause.right.rgb()];

        let mut by_id = BTreeMap::new();
        for trial in trials {
            if trial.trial_id == 0 {
                return Err(CatalogError::ZeroId);
            }
            for colour in [&trial.left_bg, &trial.right_bg] {
                if colour.rgb().is_some_and(|rgb| pause_rgb.contains(&Some(rgb))) {
                    return Err(CatalogError::PauseColour {
                        trial_id: trial.trial_id,
                        colour: colour.clone(),
                    });
                }
            }
            let obstacle = trial.obstacle();
            if !unique.contains(&obstacle) {
                return Err(CatalogError::UnknownObstacle {
                    trial_id: trial.trial_id,
                    obstacle,
                });
            }
            let id = trial.trial_id;
            if by_id.insert(id, trial).is_some() {
                return Err(CatalogError::DuplicateId(id));
            }
        }

        for obstacle in &unique {
            if !by_id.values().any(|t| t.obstacle() == *obstacle) {
                return Err(CatalogError::UncoveredObstacle(obstacle.clone()));
            }
        }

        debug!(
            "Loaded {} trials over {} obstacle configurations",
            by_id.len(),
            unique.len()
        );

        Ok(Self {
            trials: by_id,
            valid_obstacles: unique,
        })
    }

    pub fn trials(&self) -> impl Iterator<Item = &TrialDefinition> {
        self.trials.values()
    }

    pub fn valid_obstacles(&self) -> &[ObstacleConfiguration] {
        &self.valid_obstacles
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }
}

fn trial_label(entry: &Value, position: usize) -> String {
    match entry.get("trial_id").and_then(Value::as_integer) {
        Some(id) => id.to_string(),
        None => format!("at position {}", position + 1),
    }
}

fn check_fields(table: &Table, label: &str) -> Result<(), CatalogError> {
    let expected: BTreeSet<&str> = TRIAL_FIELDS.into_iter().collect();
    let present: BTreeSet<&str> = table.keys().map(String::as_str).collect();
    if present == expected {
        return Ok(());
    }
    Err(CatalogError::FieldMismatch {
        trial: label.to_string(),
        missing: expected.difference(&present).map(|k| k.to_string()).collect(),
        unexpected: present.difference(&expected).map(|k| k.to_string()).collect(),
    })
}
