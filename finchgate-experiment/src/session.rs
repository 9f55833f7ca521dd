use crate::catalog::{CatalogError, TrialCatalog};
use crate::config::SessionSettings;
use crate::crossing::CrossingTracker;
use crate::obstacle::ObstacleConfigurator;
use crate::ports::{DataSink, DisplayPort};
use crate::selector;
use finchgate_core::{
    Activity, ActivityChange, CrossingEvent, CueColours, CurrentTrial, Gate,
    ObstacleConfiguration, RunFlag, SessionPhase, TimeoutSlot,
};
use finchgate_timing::{Timer, TimerToken};
use rand::Rng;
use tracing::{debug, error, info, warn};

/// Everything that can drive the session, from keys, gates or timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Gate(Gate),
    TogglePause,
    ToggleObstacle,
    AdvanceTrial,
    TimerFired(TimerToken),
    Exit,
}

pub struct SessionController<D, K, T, R>
where
    D: DisplayPort,
    K: DataSink,
    T: Timer,
    R: Rng,
{
    catalog: TrialCatalog,
    display: D,
    sink: K,
    timer: T,
    rng: R,
    settings: SessionSettings,
    activity: Activity,
    run: RunFlag,
    obstacle: Option<ObstacleConfiguration>,
    configurator: ObstacleConfigurator,
    current: CurrentTrial,
    tracker: CrossingTracker,
    passages: u64,
}

impl<D, K, T, R> SessionController<D, K, T, R>
where
    D: DisplayPort,
    K: DataSink,
    T: Timer,
    R: Rng,
{
    /// Loads the catalog and starts the session. A rejected catalog tears
    /// the ports down and no session exists.
    pub fn launch(
        catalog_source: &str,
        mut display: D,
        mut sink: K,
        timer: T,
        rng: R,
        settings: SessionSettings,
    ) -> Result<Self, CatalogError> {
        match TrialCatalog::load(catalog_source) {
            Ok(catalog) => Ok(Self::new(catalog, display, sink, timer, rng, settings)),
            Err(e) => {
                error!("Trial catalog rejected, exiting before any trial runs: {e}");
                display.close();
                sink.close();
                Err(e)
            }
        }
    }

    /// Starts a session on a validated catalog and immediately proposes the
    /// first obstacle configuration.
    pub fn new(
        catalog: TrialCatalog,
        display: D,
        sink: K,
        timer: T,
        rng: R,
        settings: SessionSettings,
    ) -> Self {
        let mut session = Self {
            catalog,
            display,
            sink,
            timer,
            rng,
            settings,
            activity: Activity::Paused,
            run: RunFlag::Unset,
            obstacle: None,
            configurator: ObstacleConfigurator::new(),
            current: CurrentTrial::Blank,
            tracker: CrossingTracker::new(),
            passages: 0,
        };
        session.toggle_obstacle();
        info!("Waiting for obstacle setup to be completed");
        session
    }

    pub fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Gate(gate) => self.gate_crossed(gate),
            SessionEvent::TogglePause => self.toggle_pause(None),
            SessionEvent::ToggleObstacle => self.toggle_obstacle(),
            SessionEvent::AdvanceTrial => self.advance_trial(),
            SessionEvent::TimerFired(token) => self.timer_fired(token),
            SessionEvent::Exit => self.exit(),
        }
    }

    /// Replaces the current trial with a fresh one for the current obstacle.
    pub fn advance_trial(&mut self) {
        if self.is_stopped() {
            return;
        }
        if self.activity.is_paused() {
            warn!("Attempt to switch trial interrupted by experiment pause");
            return;
        }
        let Some(obstacle) = &self.obstacle else {
            warn!("No obstacle confirmed yet; trial left blank");
            return;
        };
        match selector::select(&self.catalog, obstacle, &mut self.rng).cloned() {
            Ok(trial) => {
                info!(
                    "Changed trial to {} ({} / {})",
                    trial.trial_id, trial.left_bg, trial.right_bg
                );
                self.current = CurrentTrial::Trial(trial);
                self.publish_current();
            }
            Err(e) => {
                error!("Cannot select a trial: {e}");
                self.exit();
            }
        }
    }

    /// Pauses, resumes or flips the pause state. Locked while the obstacle
    /// is being configured.
    pub fn toggle_pause(&mut self, explicit: Option<bool>) {
        if self.is_stopped() {
            return;
        }
        let change = explicit.map_or(ActivityChange::TogglePause, ActivityChange::SetPaused);
        match self.activity.apply(change) {
            Err(reason) => info!("Pause change ignored: {reason}"),
            Ok(next) if next == self.activity => {
                debug!("Pause state already {:?}", next);
            }
            Ok(next) => {
                self.activity = next;
                if next.is_paused() {
                    self.tracker.reset(&mut self.display);
                    self.publish(&CueColours::pause());
                    info!("Program paused");
                } else {
                    self.publish_current();
                    info!("Program resumed");
                }
            }
        }
    }

    /// The obstacle key: proposes a fixture, or confirms the pending one.
    pub fn toggle_obstacle(&mut self) {
        if self.is_stopped() {
            return;
        }
        if self.activity.is_configuring() {
            self.confirm_obstacle();
        } else {
            self.propose_obstacle();
        }
    }

    fn propose_obstacle(&mut self) {
        let next = match self.activity.apply(ActivityChange::BeginObstacleSetup) {
            Ok(next) => next,
            Err(reason) => {
                info!("Obstacle change ignored: {reason}");
                return;
            }
        };
        let Some(proposed) = self
            .configurator
            .propose(&self.catalog, &mut self.rng)
            .cloned()
        else {
            error!("Catalog has no valid obstacles to propose");
            return;
        };

        self.activity = next;
        self.tracker.reset(&mut self.display);
        self.publish(&CueColours::pause());
        self.display
            .set_obstacle_preview_colours(&proposed.left_fg, &proposed.right_fg);
        self.display.set_obstacle_preview_visible(true);
        info!("Set the obstacle to ({proposed}) and press the obstacle key again to confirm");
    }

    fn confirm_obstacle(&mut self) {
        let Some(confirmed) = self.configurator.confirm() else {
            error!("Obstacle confirmation without a proposal");
            return;
        };
        self.display.set_obstacle_preview_visible(false);
        self.tracker.reset(&mut self.display);

        let trial = match selector::select(&self.catalog, &confirmed, &mut self.rng).cloned() {
            Ok(trial) => trial,
            Err(e) => {
                error!("Confirmed obstacle has no trials: {e}");
                self.exit();
                return;
            }
        };
        info!("Changed obstacle to ({confirmed})");
        self.obstacle = Some(confirmed);
        self.current = CurrentTrial::Trial(trial);

        match self.activity.apply(ActivityChange::ConfirmObstacle) {
            Ok(next) => self.activity = next,
            Err(reason) => {
                error!("Obstacle confirmation rejected: {reason}");
                return;
            }
        }
        self.publish_current();
        info!("Program resumed");
        self.advance_trial();
    }

    /// One raw gate trigger. Recorded, then correlated into a passage.
    pub fn gate_crossed(&mut self, gate: Gate) {
        if self.is_stopped() {
            debug!("Gate {gate} crossed after exit");
            return;
        }
        if self.activity.is_paused() {
            warn!(
                "Gate {gate} crossed in trial state {:?} while paused",
                self.current.trial_id()
            );
            return;
        }

        let event = CrossingEvent {
            gate_id: gate,
            epoch_time: self.timer.epoch_secs(),
            trial_id: self.current.trial_id(),
        };
        if let Err(e) = self.sink.append(event) {
            error!("Failed to record crossing at gate {gate}: {e}");
        }
        debug!("Gate {gate} crossed during trial {:?}", self.current.trial_id());

        let timeout = self.settings.crossing_timeout();
        if self.tracker.arm(gate.slot(), timeout, &mut self.display) {
            self.passages += 1;
            info!("Passage {} completed at gate {gate}", self.passages);
            self.tracker.reset(&mut self.display);
            self.advance_trial();
        }
    }

    /// Clears the named crossing flag(s). Already-clear flags are fine.
    pub fn gate_crossing_timeout(&mut self, slot: TimeoutSlot) {
        if self.tracker.clear(slot, &mut self.display) {
            info!("{slot:?} crossing expired without a matching crossing");
        } else {
            debug!("{slot:?} crossing timeout with nothing pending");
        }
    }

    /// A scheduled timer expired. Tokens no longer armed are ignored.
    pub fn timer_fired(&mut self, token: TimerToken) {
        match self.tracker.slot_for(token) {
            Some(slot) => self.gate_crossing_timeout(slot.into()),
            None => debug!("Ignoring stale {token}"),
        }
    }

    /// Stops the session. Safe from any state and idempotent; the display
    /// and data sink are closed on the first call only.
    pub fn exit(&mut self) {
        if self.is_stopped() {
            debug!("Exit already requested");
            return;
        }
        info!("Exit requested");
        self.run = RunFlag::Stopped;
        self.tracker.reset(&mut self.display);
        self.display.close();
        self.sink.close();
    }

    /// Run-loop entry guard, called once setup is no longer pending.
    /// Returns `false` if an exit was requested before the loop began.
    pub fn begin_run(&mut self) -> bool {
        match self.run {
            RunFlag::Stopped => {
                warn!("Program exiting before starting");
                false
            }
            _ if self.awaiting_setup() => {
                debug!("Run loop requested during obstacle setup");
                false
            }
            RunFlag::Unset => {
                self.run = RunFlag::Running;
                info!("Run loop started");
                true
            }
            RunFlag::Running => true,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        match (self.run, self.activity, &self.obstacle) {
            (RunFlag::Stopped, _, _) => SessionPhase::Terminated,
            (_, Activity::ConfiguringObstacle, None) => SessionPhase::AwaitingObstacleSetup,
            (_, _, None) => SessionPhase::Uninitialized,
            (_, Activity::Active, Some(_)) => SessionPhase::Running,
            (_, _, Some(_)) => SessionPhase::Paused,
        }
    }

    pub fn awaiting_setup(&self) -> bool {
        self.phase() == SessionPhase::AwaitingObstacleSetup
    }

    pub fn is_stopped(&self) -> bool {
        self.run == RunFlag::Stopped
    }

    pub fn is_paused(&self) -> bool {
        self.activity.is_paused()
    }

    pub fn is_configuring(&self) -> bool {
        self.activity.is_configuring()
    }

    pub fn activity(&self) -> Activity {
        self.activity
    }

    pub fn run_flag(&self) -> RunFlag {
        self.run
    }

    pub fn current_trial(&self) -> &CurrentTrial {
        &self.current
    }

    pub fn obstacle(&self) -> Option<&ObstacleConfiguration> {
        self.obstacle.as_ref()
    }

    pub fn proposed_obstacle(&self) -> Option<&ObstacleConfiguration> {
        self.configurator.proposed()
    }

    /// `(entrance_crossed, exit_crossed)`
    pub fn crossing_state(&self) -> (bool, bool) {
        self.tracker.state()
    }

    pub fn tracker(&self) -> &CrossingTracker {
        &self.tracker
    }

    pub fn passages(&self) -> u64 {
        self.passages
    }

    pub fn catalog(&self) -> &TrialCatalog {
        &self.catalog
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    fn publish(&mut self, cue: &CueColours) {
        self.display.set_cue_colours(&cue.left, &cue.right);
    }

    fn publish_current(&mut self) {
        if let Some(cue) = self.current.cue() {
            self.publish(&cue);
        }
    }
}
