#![allow(dead_code)]

use finchgate_core::{Colour, CrossingEvent, CueColours};
use finchgate_experiment::{
    DataSink, DisplayPort, Scheduler, SessionController, SessionSettings, SinkError, TrialCatalog,
};
use finchgate_timing::{DeadlineQueue, ManualTimer, Timer, TimerToken};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

#[derive(Debug, Default)]
pub struct DisplayLog {
    pub cue: Option<CueColours>,
    pub cue_updates: usize,
    pub preview: Option<CueColours>,
    pub preview_visible: bool,
    pub closed: usize,
    pub queue: DeadlineQueue,
}

/// Display port that records what it was told and keeps real deadlines on a
/// manual clock.
pub struct RecordingDisplay {
    pub log: Rc<RefCell<DisplayLog>>,
    timer: ManualTimer,
}

impl RecordingDisplay {
    pub fn new(timer: ManualTimer) -> Self {
        Self {
            log: Rc::default(),
            timer,
        }
    }
}

impl Scheduler for RecordingDisplay {
    fn schedule_after(&mut self, delay: Duration) -> TimerToken {
        let at = self.timer.now() + delay.as_nanos() as u64;
        self.log.borrow_mut().queue.schedule(at)
    }

    fn cancel(&mut self, token: TimerToken) {
        self.log.borrow_mut().queue.cancel(token);
    }
}

impl DisplayPort for RecordingDisplay {
    fn set_cue_colours(&mut self, left: &Colour, right: &Colour) {
        let mut log = self.log.borrow_mut();
        log.cue = Some(CueColours::new(left.clone(), right.clone()));
        log.cue_updates += 1;
    }

    fn set_obstacle_preview_colours(&mut self, left: &Colour, right: &Colour) {
        self.log.borrow_mut().preview = Some(CueColours::new(left.clone(), right.clone()));
    }

    fn set_obstacle_preview_visible(&mut self, visible: bool) {
        self.log.borrow_mut().preview_visible = visible;
    }

    fn close(&mut self) {
        self.log.borrow_mut().closed += 1;
    }
}

#[derive(Debug, Default)]
pub struct SinkLog {
    pub events: Vec<CrossingEvent>,
    pub closed: usize,
}

#[derive(Default)]
pub struct MemorySink {
    pub log: Rc<RefCell<SinkLog>>,
}

impl DataSink for MemorySink {
    fn append(&mut self, event: CrossingEvent) -> Result<(), SinkError> {
        let mut log = self.log.borrow_mut();
        if log.closed > 0 {
            return Err(SinkError::Closed);
        }
        log.events.push(event);
        Ok(())
    }

    fn close(&mut self) {
        self.log.borrow_mut().closed += 1;
    }
}

pub type TestSession = SessionController<RecordingDisplay, MemorySink, ManualTimer, ChaCha8Rng>;

pub struct Rig {
    pub session: TestSession,
    pub display: Rc<RefCell<DisplayLog>>,
    pub sink: Rc<RefCell<SinkLog>>,
    pub timer: ManualTimer,
}

impl Rig {
    /// Session just constructed, waiting for the first obstacle confirmation.
    pub fn new(seed: u64) -> Self {
        let timer = ManualTimer::default();
        let display = RecordingDisplay::new(timer.clone());
        let sink = MemorySink::default();
        let (display_log, sink_log) = (display.log.clone(), sink.log.clone());
        let session = SessionController::new(
            TrialCatalog::builtin().unwrap(),
            display,
            sink,
            timer.clone(),
            ChaCha8Rng::seed_from_u64(seed),
            SessionSettings::default(),
        );
        Self {
            session,
            display: display_log,
            sink: sink_log,
            timer,
        }
    }

    /// Obstacle confirmed and the run loop entered.
    pub fn running(seed: u64) -> Self {
        let mut rig = Self::new(seed);
        rig.session.toggle_obstacle();
        assert!(rig.session.begin_run());
        rig
    }

    /// Moves the clock forward and delivers every timer that came due.
    pub fn advance(&mut self, d: Duration) {
        self.timer.advance(d);
        let now = self.timer.now();
        let fired = self.display.borrow_mut().queue.pop_expired(now);
        for token in fired {
            self.session.timer_fired(token);
        }
    }

    pub fn events(&self) -> Vec<CrossingEvent> {
        self.sink.borrow().events.clone()
    }

    pub fn cue(&self) -> Option<CueColours> {
        self.display.borrow().cue.clone()
    }

    pub fn cue_updates(&self) -> usize {
        self.display.borrow().cue_updates
    }

    pub fn pending_timers(&self) -> usize {
        self.display.borrow().queue.len()
    }
}

/// Captured `(level, message)` pairs.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<(Level, String)>>>);

impl CapturedLogs {
    pub fn at(&self, level: Level) -> Vec<String> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.clone())
            .collect()
    }
}

struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

impl<S: Subscriber> Layer<S> for CapturedLogs {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor(String::new());
        event.record(&mut visitor);
        self.0
            .lock()
            .unwrap()
            .push((*event.metadata().level(), visitor.0));
    }
}

/// Runs `f` with every log event captured.
pub fn capture_logs<F: FnOnce()>(f: F) -> CapturedLogs {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::registry().with(logs.clone());
    tracing::subscriber::with_default(subscriber, f);
    logs
}
