//! Correlates entrance and exit gate crossings into passages.
//!
//! Each slot stays set for the correlation timeout after its last crossing.
//! A passage is complete the moment both slots are set at once.

use crate::ports::Scheduler;
use finchgate_core::{CrossingSlot, TimeoutSlot};
use finchgate_timing::TimerToken;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct SlotState {
    crossed: bool,
    expiry: Option<TimerToken>,
}

#[derive(Debug, Default)]
pub struct CrossingTracker {
    entrance: SlotState,
    exit: SlotState,
}

impl CrossingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entrance_crossed(&self) -> bool {
        self.entrance.crossed
    }

    pub fn exit_crossed(&self) -> bool {
        self.exit.crossed
    }

    /// Both flags, as `(entrance, exit)`.
    pub fn state(&self) -> (bool, bool) {
        (self.entrance.crossed, self.exit.crossed)
    }

    pub fn pending_timer(&self, slot: CrossingSlot) -> Option<TimerToken> {
        self.slot(slot).expiry
    }

    /// Sets `slot` and restarts its timeout, replacing any pending one.
    /// Returns `true` when this completes a passage; the caller resets.
    pub fn arm<S: Scheduler + ?Sized>(
        &mut self,
        slot: CrossingSlot,
        timeout: Duration,
        scheduler: &mut S,
    ) -> bool {
        let state = self.slot_mut(slot);
        if let Some(previous) = state.expiry.take() {
            scheduler.cancel(previous);
        }
        state.crossed = true;
        state.expiry = Some(scheduler.schedule_after(timeout));
        self.entrance.crossed && self.exit.crossed
    }

    /// Clears the named slot(s) and cancels their timers. Returns `true` if
    /// any flag was actually set.
    pub fn clear<S: Scheduler + ?Sized>(&mut self, which: TimeoutSlot, scheduler: &mut S) -> bool {
        let mut changed = false;
        for slot in [CrossingSlot::Entrance, CrossingSlot::Exit] {
            if !which.covers(slot) {
                continue;
            }
            let state = self.slot_mut(slot);
            if let Some(token) = state.expiry.take() {
                scheduler.cancel(token);
            }
            changed |= std::mem::take(&mut state.crossed);
        }
        changed
    }

    pub fn reset<S: Scheduler + ?Sized>(&mut self, scheduler: &mut S) {
        if self.clear(TimeoutSlot::All, scheduler) {
            debug!("Crossing state reset");
        }
    }

    /// Slot whose pending expiry is `token`, if it is still the armed one.
    pub fn slot_for(&self, token: TimerToken) -> Option<CrossingSlot> {
        if self.entrance.expiry == Some(token) {
            Some(CrossingSlot::Entrance)
        } else if self.exit.expiry == Some(token) {
            Some(CrossingSlot::Exit)
        } else {
            None
        }
    }

    fn slot(&self, slot: CrossingSlot) -> &SlotState {
        match slot {
            CrossingSlot::Entrance => &self.entrance,
            CrossingSlot::Exit => &self.exit,
        }
    }

    fn slot_mut(&mut self, slot: CrossingSlot) -> &mut SlotState {
        match slot {
            CrossingSlot::Entrance => &mut self.entrance,
            CrossingSlot::Exit => &mut self.exit,
        }
    }
}
