//! Instants and the clock capability.
//!
//! All instants are UTC. Creation stamps only need to be monotonic enough
//! for display ordering.

use chrono::{DateTime, Utc};

/// A UTC instant.
pub type Timestamp = DateTime<Utc>;

/// Time source for `created_at` stamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Utc::now()
    }
}
