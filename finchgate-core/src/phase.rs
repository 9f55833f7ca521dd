use std::fmt;

/// Coarse lifecycle of a rig session, as reported to the application.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Uninitialized,
    AwaitingObstacleSetup,
    Running,
    Paused,
    Terminated,
}

impl SessionPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Terminated)
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// What the rig is doing right now.
///
/// Configuring the obstacle is its own variant rather than a flag next to
/// `paused`, so "configuring implies paused" cannot be violated.
#[derive(Copy, Debug, Clone, PartialEq, Eq)]
pub enum Activity {
    Active,
    Paused,
    ConfiguringObstacle,
}

/// Requested change to the [`Activity`].
#[derive(Copy, Debug, Clone, PartialEq, Eq)]
pub enum ActivityChange {
    /// Flip between active and paused.
    TogglePause,
    /// Force paused (`true`) or active (`false`).
    SetPaused(bool),
    /// Phase 1 of the obstacle toggle.
    BeginObstacleSetup,
    /// Phase 2 of the obstacle toggle.
    ConfirmObstacle,
}

#[derive(Copy, Debug, Clone, PartialEq, Eq)]
pub enum Rejected {
    /// Pause state is locked while the obstacle is being configured.
    ConfiguringObstacle,
    /// Confirmation without a pending configuration.
    NotConfiguring,
    /// Setup requested while setup is already underway.
    AlreadyConfiguring,
}

impl fmt::Display for Rejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ConfiguringObstacle => "obstacle change in progress; confirm it to unpause",
            Self::NotConfiguring => "no obstacle change in progress",
            Self::AlreadyConfiguring => "obstacle change already in progress",
        })
    }
}

impl Activity {
    pub fn is_paused(&self) -> bool {
        !matches!(self, Self::Active)
    }

    pub fn is_configuring(&self) -> bool {
        matches!(self, Self::ConfiguringObstacle)
    }

    /// Legal transition table. `Ok(self)` means the request is a no-op.
    pub fn apply(self, change: ActivityChange) -> Result<Activity, Rejected> {
        use Activity::*;
        use ActivityChange::*;
        match (self, change) {
            (ConfiguringObstacle, TogglePause | SetPaused(_)) => Err(Rejected::ConfiguringObstacle),
            (ConfiguringObstacle, BeginObstacleSetup) => Err(Rejected::AlreadyConfiguring),
            (ConfiguringObstacle, ConfirmObstacle) => Ok(Active),
            (_, ConfirmObstacle) => Err(Rejected::NotConfiguring),
            (_, BeginObstacleSetup) => Ok(ConfiguringObstacle),
            (Active, TogglePause) => Ok(Paused),
            (Paused, TogglePause) => Ok(Active),
            (_, SetPaused(true)) => Ok(Paused),
            (_, SetPaused(false)) => Ok(Active),
        }
    }
}

/// Whether the main loop should run. `Unset` until the loop is entered or an
/// exit is requested, whichever happens first.
#[derive(Copy, Debug, Clone, PartialEq, Eq, Default)]
pub enum RunFlag {
    #[default]
    Unset,
    Running,
    Stopped,
}
