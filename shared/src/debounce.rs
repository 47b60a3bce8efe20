//! Time-windowed settling of rapidly changing input
//!
//! The debouncer owns no timer. Callers push values with the time they
//! arrived and poll with the current time; a value is emitted once no newer
//! value has been pushed for a full window.

use chrono::{DateTime, Duration, Utc};

/// Settle time for the stock search box
pub const SEARCH_DEBOUNCE_MS: i64 = 500;

#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    window: Duration,
    pending: Option<(T, DateTime<Utc>)>,
    settled: Option<T>,
}

impl<T: Clone + PartialEq> Debouncer<T> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
            settled: None,
        }
    }

    /// Debouncer with the search settle time
    pub fn for_search() -> Self {
        Self::new(Duration::milliseconds(SEARCH_DEBOUNCE_MS))
    }

    /// Record a new value; restarts the window
    pub fn push(&mut self, value: T, at: DateTime<Utc>) {
        self.pending = Some((value, at));
    }

    /// Emit the pending value if its window has elapsed at `now`.
    ///
    /// Returns `None` while waiting, and also when the settled value would
    /// not change.
    pub fn poll(&mut self, now: DateTime<Utc>) -> Option<T> {
        let ready = match &self.pending {
            Some((_, at)) => now - *at >= self.window,
            None => false,
        };
        if !ready {
            return None;
        }

        let (value, _) = self.pending.take()?;
        if self.settled.as_ref() == Some(&value) {
            return None;
        }
        self.settled = Some(value.clone());
        Some(value)
    }

    /// Instant at which the pending value will settle
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.pending.as_ref().map(|(_, at)| *at + self.window)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Last emitted value
    pub fn settled(&self) -> Option<&T> {
        self.settled.as_ref()
    }
}
