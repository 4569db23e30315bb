//! Nullable clock: deterministic time for testing.

use chrono::{DateTime, TimeZone, Utc};
use meetpoll_types::{Clock, Timestamp};
use std::sync::atomic::{AtomicI64, Ordering};

/// A deterministic clock for testing.
///
/// Time only advances when you tell it to.
#[derive(Debug)]
pub struct NullClock {
    current_secs: AtomicI64,
}

impl NullClock {
    pub fn new(initial: Timestamp) -> Self {
        Self {
            current_secs: AtomicI64::new(initial.timestamp()),
        }
    }

    /// Start at `2024-01-01T00:00:00Z`.
    pub fn at_new_year() -> Self {
        Self::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
    }

    /// Advance time by a number of seconds.
    pub fn advance(&self, secs: i64) {
        self.current_secs.fetch_add(secs, Ordering::SeqCst);
    }

    /// Set the time to a specific value.
    pub fn set(&self, at: Timestamp) {
        self.current_secs.store(at.timestamp(), Ordering::SeqCst);
    }
}

impl Clock for NullClock {
    fn now(&self) -> Timestamp {
        DateTime::from_timestamp(self.current_secs.load(Ordering::SeqCst), 0)
            .unwrap_or(DateTime::UNIX_EPOCH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_moves_only_on_demand() {
        let clock = NullClock::at_new_year();
        let t0 = clock.now();
        assert_eq!(clock.now(), t0);
        clock.advance(90);
        assert_eq!((clock.now() - t0).num_seconds(), 90);
    }
}
