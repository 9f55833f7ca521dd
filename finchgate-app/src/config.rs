use finchgate_core::Gate;
use finchgate_experiment::{DEFAULT_CATALOG, SessionSettings};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_PATH: &str = "rig.toml";

/// Longest crossing correlation window accepted from the config file.
pub const MAX_CROSSING_TIMEOUT_SECS: f64 = 3600.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot parse rig configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid rig configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RigConfig {
    pub paths: PathsConfig,
    pub gates: GatesConfig,
    pub session: SessionSettings,
    pub logging: LoggingConfig,
    pub debug: DebugConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PathsConfig {
    pub data_path: PathBuf,
    pub log_path: PathBuf,
    /// Trial catalog file; the built-in catalog when absent.
    pub catalog: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data"),
            log_path: PathBuf::from("logs"),
            catalog: None,
        }
    }
}

/// BCM pin numbers of the three light gates.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatesConfig {
    pub entrance_pin: u8,
    pub left_pin: u8,
    pub right_pin: u8,
    pub debounce_ms: u64,
}

impl Default for GatesConfig {
    fn default() -> Self {
        Self {
            entrance_pin: 17,
            left_pin: 27,
            right_pin: 22,
            debounce_ms: 10,
        }
    }
}

impl GatesConfig {
    pub fn pins(&self) -> [(Gate, u8); 3] {
        [
            (Gate::Entrance, self.entrance_pin),
            (Gate::Left, self.left_pin),
            (Gate::Right, self.right_pin),
        ]
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// Delete earlier log files at startup.
    pub keep_only_latest: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DebugConfig {
    /// Tab advances the trial; 1, 2 and 3 stand in for the entrance, right
    /// and left gates.
    pub keybinds: bool,
    /// Wait for Enter before the process ends.
    pub hold_on_exit: bool,
}

impl RigConfig {
    pub fn parse(src: &str) -> Result<Self, ConfigError> {
        let config: RigConfig = toml::from_str(src)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let src = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::parse(&src)
    }

    /// Loads `path` if given. Otherwise loads `rig.toml` from the working
    /// directory when present and falls back to defaults when not.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_PATH);
                if default.exists() {
                    Self::load(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let timeout = self.session.crossing_timeout_secs;
        if !timeout.is_finite() || timeout <= 0.0 || timeout > MAX_CROSSING_TIMEOUT_SECS {
            return Err(ConfigError::Invalid(format!(
                "crossing_timeout_secs must be in (0, {MAX_CROSSING_TIMEOUT_SECS}], got {timeout}"
            )));
        }
        let pins = self.gates.pins();
        for (i, (gate, pin)) in pins.iter().enumerate() {
            if let Some((other, _)) = pins[i + 1..].iter().find(|(_, p)| p == pin) {
                return Err(ConfigError::Invalid(format!(
                    "{gate} and {other} gates share pin {pin}"
                )));
            }
        }
        Ok(())
    }

    /// TOML text of the trial catalog to load.
    pub fn catalog_source(&self) -> Result<String, ConfigError> {
        match &self.paths.catalog {
            Some(path) => fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            }),
            None => Ok(DEFAULT_CATALOG.to_owned()),
        }
    }
}
