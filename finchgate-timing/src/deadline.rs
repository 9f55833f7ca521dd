//! Cancellable one-shot deadlines for a single-threaded event loop.
//!
//! The owner schedules a deadline and gets a [`TimerToken`] back. Each loop
//! iteration it sleeps until [`DeadlineQueue::next_deadline`] and then drains
//! [`DeadlineQueue::pop_expired`]. A cancelled token is never returned.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(u64);

impl TimerToken {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TimerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

#[derive(Debug, Default)]
pub struct DeadlineQueue {
    next_id: u64,
    // ordered by (deadline, token) so ties fire in scheduling order
    order: BTreeSet<(u64, TimerToken)>,
    pending: HashMap<TimerToken, u64>,
}

impl DeadlineQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules a deadline at `at` (same time base as `Timer::now`).
    pub fn schedule(&mut self, at: u64) -> TimerToken {
        self.next_id += 1;
        let token = TimerToken(self.next_id);
        self.order.insert((at, token));
        self.pending.insert(token, at);
        token
    }

    /// Returns `true` if the token was still pending.
    pub fn cancel(&mut self, token: TimerToken) -> bool {
        match self.pending.remove(&token) {
            Some(at) => {
                self.order.remove(&(at, token));
                true
            }
            None => false,
        }
    }

    /// Removes and returns every token due at or before `now`, earliest first.
    pub fn pop_expired(&mut self, now: u64) -> Vec<TimerToken> {
        let mut fired = Vec::new();
        while let Some(&(at, token)) = self.order.first() {
            if at > now {
                break;
            }
            self.order.pop_first();
            self.pending.remove(&token);
            fired.push(token);
        }
        fired
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.order.first().map(|&(at, _)| at)
    }

    pub fn is_pending(&self, token: TimerToken) -> bool {
        self.pending.contains_key(&token)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.pending.clear();
    }
}
