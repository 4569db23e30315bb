//! Transaction handles.
//!
//! Votes are keyed by `(timeslot_id, voter_name)` and indexed by
//! `(session_id, voter_name)`, so replacing one voter's ballot touches only
//! that voter's rows.

use meetpoll_types::{Participant, Session, SessionId, Timeslot, TimeslotId, Timestamp, Vote};

use crate::StoreError;

/// Reads available inside any transaction.
pub trait ReadTxn {
    fn get_session(&self, id: &SessionId) -> Result<Option<Session>, StoreError>;

    fn session_exists(&self, id: &SessionId) -> Result<bool, StoreError> {
        Ok(self.get_session(id)?.is_some())
    }

    fn get_timeslot(&self, id: &TimeslotId) -> Result<Option<Timeslot>, StoreError>;

    /// The session a timeslot belongs to, or `None` if it does not exist.
    fn timeslot_owner(&self, id: &TimeslotId) -> Result<Option<SessionId>, StoreError> {
        Ok(self.get_timeslot(id)?.map(|ts| ts.session_id))
    }

    /// The timeslot with exactly this span in this session, if any.
    fn find_timeslot(
        &self,
        session: &SessionId,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Option<TimeslotId>, StoreError>;

    /// All timeslots of a session, in no particular order.
    fn session_timeslots(&self, session: &SessionId) -> Result<Vec<Timeslot>, StoreError>;

    fn get_participant(
        &self,
        session: &SessionId,
        name: &str,
    ) -> Result<Option<Participant>, StoreError>;

    fn timeslot_votes(&self, timeslot: &TimeslotId) -> Result<Vec<Vote>, StoreError>;

    fn count_timeslot_votes(&self, timeslot: &TimeslotId) -> Result<u64, StoreError> {
        Ok(self.timeslot_votes(timeslot)?.len() as u64)
    }

    /// Every vote `voter` holds on timeslots of `session`.
    fn voter_votes(&self, session: &SessionId, voter: &str) -> Result<Vec<Vote>, StoreError>;
}

/// A write transaction. Dropping it without [`WriteTxn::commit`] rolls back.
pub trait WriteTxn: ReadTxn {
    /// Fails with [`Constraint::SessionId`](crate::Constraint::SessionId) if the id is taken.
    fn insert_session(&mut self, session: &Session) -> Result<(), StoreError>;

    /// Fails with [`Constraint::TimeslotSpan`](crate::Constraint::TimeslotSpan)
    /// if the session already has this exact span.
    fn insert_timeslot(&mut self, timeslot: &Timeslot) -> Result<(), StoreError>;

    /// Remove a timeslot and its indexes. Returns whether it existed.
    fn delete_timeslot(&mut self, id: &TimeslotId) -> Result<bool, StoreError>;

    /// Fails with [`Constraint::ParticipantName`](crate::Constraint::ParticipantName)
    /// if the name is taken in the session.
    fn insert_participant(&mut self, participant: &Participant) -> Result<(), StoreError>;

    /// Fails with [`Constraint::TimeslotVoter`](crate::Constraint::TimeslotVoter)
    /// if the voter already holds a vote on the timeslot.
    fn insert_vote(&mut self, session: &SessionId, vote: &Vote) -> Result<(), StoreError>;

    /// Delete every vote `voter` holds on timeslots of `session`.
    /// Returns the number of votes removed.
    fn delete_voter_votes(&mut self, session: &SessionId, voter: &str)
        -> Result<u64, StoreError>;

    fn commit(self) -> Result<(), StoreError>;

    /// Discard every write made in this transaction.
    fn rollback(self);
}
