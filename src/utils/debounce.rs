//! Debouncing of rapidly changing input.

use std::time::Duration;
use tokio::time::Instant;

/// Default debounce window for search input
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(400);

/// Holds back a changing value until it has been stable for `delay`.
///
/// The debouncer does not own a timer. The event loop pushes values as they
/// change, sleeps until [`Debouncer::deadline`], and then calls
/// [`Debouncer::poll`] to collect the settled value.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    current: T,
    pending: Option<(T, Instant)>,
}

impl<T: Clone + PartialEq> Debouncer<T> {
    /// Create a debouncer whose settled value starts as `initial`
    pub fn new(initial: T, delay: Duration) -> Self {
        Self {
            delay,
            current: initial,
            pending: None,
        }
    }

    /// Record a new input value, restarting the debounce window
    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.delay));
    }

    /// Return the pending value if its window has elapsed.
    ///
    /// Returns `None` while the window is still open, when nothing is
    /// pending, or when the settled value equals the current one.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, deadline)) if now >= *deadline => {}
            _ => return None,
        }

        let (value, _) = self.pending.take()?;
        if value == self.current {
            return None;
        }
        self.current = value.clone();
        Some(value)
    }

    /// When the pending value will settle, if any
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }

    /// The last settled value
    pub fn current(&self) -> &T {
        &self.current
    }

    /// Whether a value is waiting out its window
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}
