//! Cancellable debounce timer.
//!
//! The owner's event loop polls the timer with the current [`Instant`]; a
//! value only fires once its deadline passes without being replaced. Cancelling
//! (or dropping) the timer guarantees the pending value never fires.

use std::time::{Duration, Instant};

/// Shortest delay a search debouncer may use.
pub const MIN_DEBOUNCE: Duration = Duration::from_millis(150);

/// Holds at most one pending value and the instant it becomes due.
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debouncer<T> {
    /// Create a debouncer. Delays below [`MIN_DEBOUNCE`] are raised to it.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay: delay.max(MIN_DEBOUNCE),
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replace any pending value and restart the delay from `now`.
    pub fn schedule(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.delay));
    }

    /// Take the pending value if its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let due = matches!(&self.pending, Some((_, deadline)) if now >= *deadline);
        if due {
            self.pending.take().map(|(value, _)| value)
        } else {
            None
        }
    }

    /// Drop the pending value. Returns true if something was pending.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<&T> {
        self.pending.as_ref().map(|(value, _)| value)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_after_delay() {
        let start = Instant::now();
        let mut d = Debouncer::new(Duration::from_millis(200));
        d.schedule("pump", start);

        assert_eq!(d.poll(start + Duration::from_millis(199)), None);
        assert_eq!(d.poll(start + Duration::from_millis(200)), Some("pump"));
        assert!(!d.is_pending());
        assert_eq!(d.poll(start + Duration::from_secs(5)), None);
    }

    #[test]
    fn test_new_value_restarts_delay() {
        let start = Instant::now();
        let mut d = Debouncer::new(Duration::from_millis(200));
        d.schedule("p", start);
        d.schedule("pu", start + Duration::from_millis(150));

        assert_eq!(d.poll(start + Duration::from_millis(250)), None);
        assert_eq!(d.poll(start + Duration::from_millis(350)), Some("pu"));
    }

    #[test]
    fn test_cancel_prevents_firing() {
        let start = Instant::now();
        let mut d = Debouncer::new(Duration::from_millis(200));
        d.schedule(1, start);
        assert!(d.cancel());
        assert!(!d.cancel());
        assert_eq!(d.poll(start + Duration::from_secs(1)), None);
    }

    #[test]
    fn test_minimum_delay() {
        let d: Debouncer<()> = Debouncer::new(Duration::from_millis(10));
        assert_eq!(d.delay(), MIN_DEBOUNCE);
    }
}
