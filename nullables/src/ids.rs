//! Nullable id source: predictable identifiers.

use meetpoll_types::{IdSource, SessionId, TimeslotId, VoteId};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Hands out `s1`, `s2`, … / `t1`, `t2`, … / `v1`, `v2`, …
///
/// Session ids can be scripted with [`SequentialIds::queue_session_ids`] to
/// provoke collisions.
#[derive(Debug, Default)]
pub struct SequentialIds {
    sessions: AtomicU64,
    timeslots: AtomicU64,
    votes: AtomicU64,
    scripted_sessions: Mutex<VecDeque<String>>,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return these session ids, in order, before falling back to the counter.
    pub fn queue_session_ids<I, S>(&self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scripted_sessions
            .lock()
            .unwrap()
            .extend(ids.into_iter().map(Into::into));
    }
}

fn next(counter: &AtomicU64) -> u64 {
    counter.fetch_add(1, Ordering::SeqCst) + 1
}

impl IdSource for SequentialIds {
    fn session_id(&self) -> SessionId {
        if let Some(id) = self.scripted_sessions.lock().unwrap().pop_front() {
            return SessionId::new(id);
        }
        SessionId::new(format!("s{}", next(&self.sessions)))
    }

    fn timeslot_id(&self) -> TimeslotId {
        TimeslotId::new(format!("t{}", next(&self.timeslots)))
    }

    fn vote_id(&self) -> VoteId {
        VoteId::new(format!("v{}", next(&self.votes)))
    }
}
