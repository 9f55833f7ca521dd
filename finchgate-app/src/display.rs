use finchgate_core::{Colour, CueColours};
use finchgate_experiment::{DisplayPort, Scheduler};
use finchgate_render::CueScene;
use finchgate_timing::{DeadlineQueue, SystemTimer, Timer, TimerToken};
use std::time::Duration;
use tracing::debug;

/// What the session has asked the screen to show, plus the pending
/// crossing timeouts. The event loop drains the deadlines and redraws when
/// the scene changes.
pub struct ScreenState<T: Timer = SystemTimer> {
    cue: Option<CueColours>,
    preview: Option<CueColours>,
    preview_visible: bool,
    deadlines: DeadlineQueue,
    timer: T,
    closed: bool,
    dirty: bool,
}

impl<T: Timer> ScreenState<T> {
    pub fn new(timer: T) -> Self {
        Self {
            cue: None,
            preview: None,
            preview_visible: false,
            deadlines: DeadlineQueue::new(),
            timer,
            closed: false,
            dirty: true,
        }
    }

    pub fn scene(&self) -> CueScene {
        CueScene {
            cue: self.cue.clone(),
            preview: self.preview.clone().filter(|_| self.preview_visible),
        }
    }

    /// Returns whether the scene changed since the last call.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.deadlines.next_deadline()
    }

    /// Removes and returns every timer whose deadline has passed.
    pub fn pop_expired(&mut self) -> Vec<TimerToken> {
        self.deadlines.pop_expired(self.timer.now())
    }

    pub fn pending_timers(&self) -> usize {
        self.deadlines.len()
    }

    fn update(&mut self, what: &str, f: impl FnOnce(&mut Self)) {
        if self.closed {
            debug!("Display closed, ignoring {what}");
            return;
        }
        f(self);
        self.dirty = true;
    }
}

impl<T: Timer> Scheduler for ScreenState<T> {
    fn schedule_after(&mut self, delay: Duration) -> TimerToken {
        let delay = u64::try_from(delay.as_nanos()).unwrap_or(u64::MAX);
        let at = self.timer.now().saturating_add(delay);
        self.deadlines.schedule(at)
    }

    fn cancel(&mut self, token: TimerToken) {
        if !self.deadlines.cancel(token) {
            debug!("{token} already fired or cancelled");
        }
    }
}

impl<T: Timer> DisplayPort for ScreenState<T> {
    fn set_cue_colours(&mut self, left: &Colour, right: &Colour) {
        self.update("cue colours", |s| {
            s.cue = Some(CueColours::new(left.clone(), right.clone()));
        });
    }

    fn set_obstacle_preview_colours(&mut self, left: &Colour, right: &Colour) {
        self.update("preview colours", |s| {
            s.preview = Some(CueColours::new(left.clone(), right.clone()));
        });
    }

    fn set_obstacle_preview_visible(&mut self, visible: bool) {
        self.update("preview visibility", |s| s.preview_visible = visible);
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.deadlines.clear();
        self.dirty = true;
    }
}
