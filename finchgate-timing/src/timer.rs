use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Clock shared by the session and the deadline queue.
///
/// `now` is monotonic and drives timeouts; `epoch_secs` stamps persisted
/// records.
pub trait Timer: Clone + Send + Sync {
    /// Nanoseconds since the timer was created.
    fn now(&self) -> u64;
    /// Seconds since the Unix epoch.
    fn epoch_secs(&self) -> f64;

    fn elapsed(&self, ts: u64) -> Duration {
        Duration::from_nanos(self.now().saturating_sub(ts))
    }
}

/// Real clock. Epoch time is derived from the monotonic clock after start so
/// consecutive records never go backwards if the wall clock is adjusted.
#[derive(Debug, Clone)]
pub struct SystemTimer {
    start: Instant,
    start_epoch: Duration,
}

impl Timer for SystemTimer {
    fn now(&self) -> u64 {
        self.start.elapsed().as_nanos() as u64
    }

    fn epoch_secs(&self) -> f64 {
        (self.start_epoch + self.start.elapsed()).as_secs_f64()
    }
}

impl SystemTimer {
    pub fn new() -> Self {
        let start_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Self {
            start: Instant::now(),
            start_epoch,
        }
    }

    /// Converts a timestamp from [`Timer::now`] back to an `Instant`, for
    /// event loops that sleep until a deadline. `None` when the platform
    /// cannot represent an instant that far out.
    pub fn instant_at(&self, ts: u64) -> Option<Instant> {
        self.start.checked_add(Duration::from_nanos(ts))
    }
}

impl Default for SystemTimer {
    fn default() -> Self {
        Self::new()
    }
}

/// Hand-driven clock for tests and simulations. Clones share the same time.
#[derive(Debug, Clone)]
pub struct ManualTimer {
    ns: Arc<AtomicU64>,
    epoch_base: f64,
}

impl ManualTimer {
    pub fn new(epoch_base: f64) -> Self {
        Self {
            ns: Arc::new(AtomicU64::new(0)),
            epoch_base,
        }
    }

    pub fn advance(&self, d: Duration) {
        self.ns.fetch_add(d.as_nanos() as u64, Ordering::SeqCst);
    }
}

impl Default for ManualTimer {
    fn default() -> Self {
        Self::new(1_700_000_000.0)
    }
}

impl Timer for ManualTimer {
    fn now(&self) -> u64 {
        self.ns.load(Ordering::SeqCst)
    }

    fn epoch_secs(&self) -> f64 {
        self.epoch_base + self.now() as f64 / 1e9
    }
}
