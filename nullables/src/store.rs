//! Nullable store: thread-safe in-memory storage for testing.
//!
//! Mirrors the LMDB backend's semantics: one writer at a time, snapshot
//! reads, the same uniqueness constraints, and all-or-nothing commits.

use meetpoll_store::{Constraint, PollStore, ReadTxn, StoreError, WriteTxn};
use meetpoll_types::{Participant, Session, SessionId, Timeslot, TimeslotId, Timestamp, Vote};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

#[derive(Clone, Debug, Default)]
struct Tables {
    sessions: HashMap<SessionId, Session>,
    timeslots: HashMap<TimeslotId, Timeslot>,
    spans: HashMap<(SessionId, Timestamp, Timestamp), TimeslotId>,
    participants: HashMap<(SessionId, String), Participant>,
    /// `(timeslot, voter)` → owning session and vote
    votes: BTreeMap<(TimeslotId, String), (SessionId, Vote)>,
}

impl Tables {
    fn get_session(&self, id: &SessionId) -> Option<Session> {
        self.sessions.get(id).cloned()
    }

    fn get_timeslot(&self, id: &TimeslotId) -> Option<Timeslot> {
        self.timeslots.get(id).cloned()
    }

    fn find_timeslot(
        &self,
        session: &SessionId,
        start: Timestamp,
        end: Timestamp,
    ) -> Option<TimeslotId> {
        self.spans.get(&(session.clone(), start, end)).cloned()
    }

    fn session_timeslots(&self, session: &SessionId) -> Vec<Timeslot> {
        self.timeslots
            .values()
            .filter(|ts| &ts.session_id == session)
            .cloned()
            .collect()
    }

    fn get_participant(&self, session: &SessionId, name: &str) -> Option<Participant> {
        self.participants
            .get(&(session.clone(), name.to_string()))
            .cloned()
    }

    fn timeslot_votes(&self, timeslot: &TimeslotId) -> Vec<Vote> {
        self.votes
            .iter()
            .filter(|((ts, _), _)| ts == timeslot)
            .map(|(_, (_, vote))| vote.clone())
            .collect()
    }

    fn voter_votes(&self, session: &SessionId, voter: &str) -> Vec<Vote> {
        self.votes
            .iter()
            .filter(|((_, name), (owner, _))| owner == session && name == voter)
            .map(|(_, (_, vote))| vote.clone())
            .collect()
    }
}

/// An in-memory poll store for testing.
/// Thread-safe for use with tokio's multi-threaded runtime.
#[derive(Debug, Default)]
pub struct NullStore {
    tables: Mutex<Tables>,
    fail_next_commit: AtomicBool,
}

impl NullStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next [`WriteTxn::commit`] fail with a backend error after
    /// all of its writes have been staged.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.store(true, Ordering::SeqCst);
    }

    /// Number of stored votes across all sessions.
    pub fn vote_count(&self) -> usize {
        self.lock().map(|t| t.votes.len()).unwrap_or(0)
    }

    /// Number of stored participants across all sessions.
    pub fn participant_count(&self) -> usize {
        self.lock().map(|t| t.participants.len()).unwrap_or(0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Backend("null store mutex poisoned".into()))
    }
}

/// A read snapshot taken when the transaction began.
#[derive(Debug)]
pub struct NullReadTxn {
    snapshot: Tables,
}

/// Holds the writer lock; writes go to a working copy that replaces the
/// shared tables on commit.
pub struct NullWriteTxn<'a> {
    guard: MutexGuard<'a, Tables>,
    working: Tables,
    fail_commit: bool,
}

macro_rules! impl_read_txn {
    ($ty:ty, $tables:ident) => {
        impl ReadTxn for $ty {
            fn get_session(&self, id: &SessionId) -> Result<Option<Session>, StoreError> {
                Ok(self.$tables.get_session(id))
            }

            fn get_timeslot(&self, id: &TimeslotId) -> Result<Option<Timeslot>, StoreError> {
                Ok(self.$tables.get_timeslot(id))
            }

            fn find_timeslot(
                &self,
                session: &SessionId,
                start: Timestamp,
                end: Timestamp,
            ) -> Result<Option<TimeslotId>, StoreError> {
                Ok(self.$tables.find_timeslot(session, start, end))
            }

            fn session_timeslots(&self, session: &SessionId) -> Result<Vec<Timeslot>, StoreError> {
                Ok(self.$tables.session_timeslots(session))
            }

            fn get_participant(
                &self,
                session: &SessionId,
                name: &str,
            ) -> Result<Option<Participant>, StoreError> {
                Ok(self.$tables.get_participant(session, name))
            }

            fn timeslot_votes(&self, timeslot: &TimeslotId) -> Result<Vec<Vote>, StoreError> {
                Ok(self.$tables.timeslot_votes(timeslot))
            }

            fn voter_votes(&self, session: &SessionId, voter: &str) -> Result<Vec<Vote>, StoreError> {
                Ok(self.$tables.voter_votes(session, voter))
            }
        }
    };
}

impl_read_txn!(NullReadTxn, snapshot);
impl_read_txn!(NullWriteTxn<'_>, working);

impl WriteTxn for NullWriteTxn<'_> {
    fn insert_session(&mut self, session: &Session) -> Result<(), StoreError> {
        if self.working.sessions.contains_key(&session.id) {
            return Err(StoreError::violation(Constraint::SessionId));
        }
        self.working
            .sessions
            .insert(session.id.clone(), session.clone());
        Ok(())
    }

    fn insert_timeslot(&mut self, timeslot: &Timeslot) -> Result<(), StoreError> {
        let span = (timeslot.session_id.clone(), timeslot.start, timeslot.end);
        if self.working.spans.contains_key(&span) {
            return Err(StoreError::violation(Constraint::TimeslotSpan));
        }
        self.working.spans.insert(span, timeslot.id.clone());
        self.working
            .timeslots
            .insert(timeslot.id.clone(), timeslot.clone());
        Ok(())
    }

    fn delete_timeslot(&mut self, id: &TimeslotId) -> Result<bool, StoreError> {
        let Some(timeslot) = self.working.timeslots.remove(id) else {
            return Ok(false);
        };
        self.working
            .spans
            .remove(&(timeslot.session_id, timeslot.start, timeslot.end));
        Ok(true)
    }

    fn insert_participant(&mut self, participant: &Participant) -> Result<(), StoreError> {
        let key = (participant.session_id.clone(), participant.name.clone());
        if self.working.participants.contains_key(&key) {
            return Err(StoreError::violation(Constraint::ParticipantName));
        }
        self.working.participants.insert(key, participant.clone());
        Ok(())
    }

    fn insert_vote(&mut self, session: &SessionId, vote: &Vote) -> Result<(), StoreError> {
        let key = (vote.timeslot_id.clone(), vote.voter_name.clone());
        if self.working.votes.contains_key(&key) {
            return Err(StoreError::violation(Constraint::TimeslotVoter));
        }
        self.working
            .votes
            .insert(key, (session.clone(), vote.clone()));
        Ok(())
    }

    fn delete_voter_votes(&mut self, session: &SessionId, voter: &str) -> Result<u64, StoreError> {
        let before = self.working.votes.len();
        self.working
            .votes
            .retain(|(_, name), (owner, _)| !(owner == session && name == voter));
        Ok((before - self.working.votes.len()) as u64)
    }

    fn commit(mut self) -> Result<(), StoreError> {
        if self.fail_commit {
            return Err(StoreError::Backend("injected commit failure".into()));
        }
        *self.guard = std::mem::take(&mut self.working);
        Ok(())
    }

    fn rollback(self) {}
}

impl PollStore for NullStore {
    type Read<'a> = NullReadTxn;
    type Write<'a> = NullWriteTxn<'a>;

    fn read(&self) -> Result<NullReadTxn, StoreError> {
        Ok(NullReadTxn {
            snapshot: self.lock()?.clone(),
        })
    }

    fn begin(&self) -> Result<NullWriteTxn<'_>, StoreError> {
        let guard = self.lock()?;
        let working = guard.clone();
        let fail_commit = self.fail_next_commit.swap(false, Ordering::SeqCst);
        Ok(NullWriteTxn {
            guard,
            working,
            fail_commit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use meetpoll_types::{SessionKind, VoteId};

    fn at(hour: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap()
    }

    fn session(id: &str) -> Session {
        Session {
            id: SessionId::new(id),
            title: "Standup".into(),
            creator_name: "Eli".into(),
            created_at: at(0),
            expires_at: None,
            archived_at: None,
            kind: SessionKind::Fixed,
            dynamic_config: None,
        }
    }

    fn timeslot(id: &str, session: &str, start: u32) -> Timeslot {
        Timeslot {
            id: TimeslotId::new(id),
            session_id: SessionId::new(session),
            start: at(start),
            end: at(start + 1),
            created_by: None,
            password: None,
        }
    }

    fn vote(id: &str, timeslot: &str, voter: &str) -> Vote {
        Vote {
            id: VoteId::new(id),
            timeslot_id: TimeslotId::new(timeslot),
            voter_name: voter.into(),
            note: None,
            created_at: at(0),
        }
    }

    fn seeded() -> NullStore {
        let store = NullStore::new();
        let mut txn = store.begin().unwrap();
        txn.insert_session(&session("s1")).unwrap();
        txn.insert_timeslot(&timeslot("t1", "s1", 9)).unwrap();
        txn.insert_timeslot(&timeslot("t2", "s1", 10)).unwrap();
        txn.commit().unwrap();
        store
    }

    #[test]
    fn dropped_txn_leaves_no_trace() {
        let store = seeded();
        {
            let mut txn = store.begin().unwrap();
            txn.insert_vote(&SessionId::new("s1"), &vote("v1", "t1", "Ana"))
                .unwrap();
            assert_eq!(txn.voter_votes(&SessionId::new("s1"), "Ana").unwrap().len(), 1);
        }
        assert_eq!(store.vote_count(), 0);
    }

    #[test]
    fn injected_commit_failure_discards_writes() {
        let store = seeded();
        store.fail_next_commit();
        let mut txn = store.begin().unwrap();
        txn.insert_vote(&SessionId::new("s1"), &vote("v1", "t1", "Ana"))
            .unwrap();
        assert!(matches!(txn.commit(), Err(StoreError::Backend(_))));
        assert_eq!(store.vote_count(), 0);

        // only the next commit fails
        let mut txn = store.begin().unwrap();
        txn.insert_vote(&SessionId::new("s1"), &vote("v1", "t1", "Ana"))
            .unwrap();
        txn.commit().unwrap();
        assert_eq!(store.vote_count(), 1);
    }

    #[test]
    fn constraints_match_the_lmdb_backend() {
        let store = seeded();
        let mut txn = store.begin().unwrap();
        let err = txn.insert_session(&session("s1")).unwrap_err();
        assert_eq!(err.constraint(), Some(Constraint::SessionId));
        let err = txn.insert_timeslot(&timeslot("t9", "s1", 9)).unwrap_err();
        assert_eq!(err.constraint(), Some(Constraint::TimeslotSpan));
        txn.insert_vote(&SessionId::new("s1"), &vote("v1", "t1", "Ana"))
            .unwrap();
        let err = txn
            .insert_vote(&SessionId::new("s1"), &vote("v2", "t1", "Ana"))
            .unwrap_err();
        assert_eq!(err.constraint(), Some(Constraint::TimeslotVoter));
    }

    #[test]
    fn delete_voter_votes_is_scoped_to_session_and_name() {
        let store = seeded();
        let mut txn = store.begin().unwrap();
        txn.insert_session(&session("s2")).unwrap();
        txn.insert_timeslot(&timeslot("t3", "s2", 9)).unwrap();
        let s1 = SessionId::new("s1");
        txn.insert_vote(&s1, &vote("v1", "t1", "Ana")).unwrap();
        txn.insert_vote(&s1, &vote("v2", "t2", "Ana")).unwrap();
        txn.insert_vote(&s1, &vote("v3", "t1", "Anastasia")).unwrap();
        txn.insert_vote(&SessionId::new("s2"), &vote("v4", "t3", "Ana"))
            .unwrap();
        assert_eq!(txn.delete_voter_votes(&s1, "Ana").unwrap(), 2);
        txn.commit().unwrap();

        let read = store.read().unwrap();
        assert!(read.voter_votes(&s1, "Ana").unwrap().is_empty());
        assert_eq!(read.voter_votes(&s1, "Anastasia").unwrap().len(), 1);
        assert_eq!(read.voter_votes(&SessionId::new("s2"), "Ana").unwrap().len(), 1);
    }

    #[test]
    fn read_snapshot_ignores_later_commits() {
        let store = seeded();
        let snapshot = store.read().unwrap();
        let mut txn = store.begin().unwrap();
        txn.delete_timeslot(&TimeslotId::new("t1")).unwrap();
        txn.commit().unwrap();
        assert!(snapshot.get_timeslot(&TimeslotId::new("t1")).unwrap().is_some());
        assert!(store
            .read()
            .unwrap()
            .find_timeslot(&SessionId::new("s1"), at(9), at(10))
            .unwrap()
            .is_none());
    }
}
