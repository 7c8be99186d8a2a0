use std::time::Duration;

use foundation::time::Time;

/// Quiet period used for free-text search input.
pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(300);

/// Collapses bursts of values into the last one, released after a quiet period.
///
/// Time is passed in explicitly, so the host decides what a clock is (a
/// browser timer, a tokio interval, a test counter). Re-arming replaces both
/// the pending value and its deadline; only the last-armed value ever fires.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    quiet: Duration,
    pending: Option<(Time, T)>,
}

impl<T> Debouncer<T> {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet
    }

    pub fn arm(&mut self, value: T, now: Time) {
        self.pending = Some((now.add(self.quiet), value));
    }

    /// Releases the pending value once `now` reaches its deadline.
    pub fn poll(&mut self, now: Time) -> Option<T> {
        let due = self
            .pending
            .as_ref()
            .is_some_and(|(deadline, _)| now >= *deadline);
        if !due {
            return None;
        }
        self.pending.take().map(|(_, v)| v)
    }

    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(_, v)| v)
    }

    pub fn deadline(&self) -> Option<Time> {
        self.pending.as_ref().map(|(d, _)| *d)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self::new(DEFAULT_QUIET_PERIOD)
    }
}
