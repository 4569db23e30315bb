//! LMDB implementation of the read and write transaction traits.
//!
//! Reads are shared between both transaction kinds through free functions
//! over `&RoTxn`; a `RwTxn` dereferences to one and sees its own writes.

use std::ops::Bound;

use heed::types::Bytes;
use heed::{Database, MdbError, PutFlags, RoTxn, RwTxn};
use serde::de::DeserializeOwned;

use meetpoll_store::{Constraint, ReadTxn, StoreError, WriteTxn};
use meetpoll_types::{Participant, Session, SessionId, Timeslot, TimeslotId, Timestamp, Vote};

use crate::environment::Databases;
use crate::keys::{self, increment_prefix, read_component, KeyBuilder};
use crate::LmdbError;

/// A read-only snapshot.
pub struct LmdbReadTxn<'a> {
    txn: RoTxn<'a>,
    dbs: &'a Databases,
}

impl<'a> LmdbReadTxn<'a> {
    pub(crate) fn new(txn: RoTxn<'a>, dbs: &'a Databases) -> Self {
        Self { txn, dbs }
    }
}

/// A write transaction. Dropping it aborts the underlying LMDB transaction.
pub struct LmdbWriteTxn<'a> {
    txn: RwTxn<'a>,
    dbs: &'a Databases,
}

impl<'a> LmdbWriteTxn<'a> {
    pub(crate) fn new(txn: RwTxn<'a>, dbs: &'a Databases) -> Self {
        Self { txn, dbs }
    }
}

// ── Shared helpers ──────────────────────────────────────────────────────

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, LmdbError> {
    Ok(bincode::deserialize(bytes)?)
}

fn decode_str(bytes: &[u8], what: &str) -> Result<String, LmdbError> {
    String::from_utf8(bytes.to_vec())
        .map_err(|_| LmdbError::Serialization(format!("{what} is not valid UTF-8")))
}

/// Collect every key starting with `prefix`.
fn prefix_keys(
    db: &Database<Bytes, Bytes>,
    txn: &RoTxn,
    prefix: &[u8],
) -> Result<Vec<Vec<u8>>, LmdbError> {
    let mut upper = prefix.to_vec();
    increment_prefix(&mut upper);
    let upper_bound = if upper.is_empty() {
        Bound::Unbounded
    } else {
        Bound::Excluded(upper.as_slice())
    };
    let bounds = (Bound::Included(prefix), upper_bound);
    let iter = db.range(txn, &bounds)?;
    let mut keys = Vec::new();
    for result in iter {
        let (key, _val) = result?;
        keys.push(key.to_vec());
    }
    Ok(keys)
}

/// Collect every value whose key starts with `prefix`.
fn prefix_values(
    db: &Database<Bytes, Bytes>,
    txn: &RoTxn,
    prefix: &[u8],
) -> Result<Vec<Vec<u8>>, LmdbError> {
    let mut upper = prefix.to_vec();
    increment_prefix(&mut upper);
    let upper_bound = if upper.is_empty() {
        Bound::Unbounded
    } else {
        Bound::Excluded(upper.as_slice())
    };
    let bounds = (Bound::Included(prefix), upper_bound);
    let iter = db.range(txn, &bounds)?;
    let mut values = Vec::new();
    for result in iter {
        let (_key, val) = result?;
        values.push(val.to_vec());
    }
    Ok(values)
}

fn span_key(session: &SessionId, start: Timestamp, end: Timestamp) -> Result<Vec<u8>, LmdbError> {
    Ok(KeyBuilder::new()
        .component(session.as_bytes())?
        .instant(start)
        .instant(end)
        .build())
}

fn voter_index_key(
    session: &SessionId,
    voter: &str,
    timeslot: &TimeslotId,
) -> Result<Vec<u8>, LmdbError> {
    Ok(KeyBuilder::new()
        .component(session.as_bytes())?
        .component(voter.as_bytes())?
        .component(timeslot.as_bytes())?
        .build())
}

/// Insert `key` only if absent; an existing key violates `constraint`.
fn put_unique(
    db: &Database<Bytes, Bytes>,
    txn: &mut RwTxn,
    key: &[u8],
    value: &[u8],
    constraint: Constraint,
) -> Result<(), StoreError> {
    match db.put_with_flags(txn, PutFlags::NO_OVERWRITE, key, value) {
        Ok(()) => Ok(()),
        Err(heed::Error::Mdb(MdbError::KeyExist)) => Err(StoreError::violation(constraint)),
        Err(e) => Err(LmdbError::from(e).into()),
    }
}

// ── Reads ───────────────────────────────────────────────────────────────

fn get_session(dbs: &Databases, txn: &RoTxn, id: &SessionId) -> Result<Option<Session>, LmdbError> {
    let key = keys::single(id.as_bytes())?;
    dbs.sessions.get(txn, &key)?.map(decode).transpose()
}

fn get_timeslot(
    dbs: &Databases,
    txn: &RoTxn,
    id: &TimeslotId,
) -> Result<Option<Timeslot>, LmdbError> {
    let key = keys::single(id.as_bytes())?;
    dbs.timeslots.get(txn, &key)?.map(decode).transpose()
}

fn find_timeslot(
    dbs: &Databases,
    txn: &RoTxn,
    session: &SessionId,
    start: Timestamp,
    end: Timestamp,
) -> Result<Option<TimeslotId>, LmdbError> {
    let key = span_key(session, start, end)?;
    dbs.timeslot_spans
        .get(txn, &key)?
        .map(|bytes| decode_str(bytes, "timeslot id").map(TimeslotId::new))
        .transpose()
}

fn session_timeslots(
    dbs: &Databases,
    txn: &RoTxn,
    session: &SessionId,
) -> Result<Vec<Timeslot>, LmdbError> {
    let prefix = keys::single(session.as_bytes())?;
    let mut timeslots = Vec::new();
    for key in prefix_keys(&dbs.session_timeslots, txn, &prefix)? {
        let (id, _) = read_component(&key, prefix.len())
            .ok_or_else(|| LmdbError::Serialization("truncated session_timeslots key".into()))?;
        let id = TimeslotId::new(decode_str(id, "timeslot id")?);
        let timeslot = get_timeslot(dbs, txn, &id)?
            .ok_or_else(|| LmdbError::NotFound(format!("indexed timeslot {id}")))?;
        timeslots.push(timeslot);
    }
    Ok(timeslots)
}

fn get_participant(
    dbs: &Databases,
    txn: &RoTxn,
    session: &SessionId,
    name: &str,
) -> Result<Option<Participant>, LmdbError> {
    let key = keys::pair(session.as_bytes(), name.as_bytes())?;
    dbs.participants.get(txn, &key)?.map(decode).transpose()
}

fn timeslot_votes(dbs: &Databases, txn: &RoTxn, timeslot: &TimeslotId) -> Result<Vec<Vote>, LmdbError> {
    let prefix = keys::single(timeslot.as_bytes())?;
    prefix_values(&dbs.votes, txn, &prefix)?
        .iter()
        .map(|bytes| decode(bytes))
        .collect()
}

fn count_timeslot_votes(
    dbs: &Databases,
    txn: &RoTxn,
    timeslot: &TimeslotId,
) -> Result<u64, LmdbError> {
    let prefix = keys::single(timeslot.as_bytes())?;
    Ok(prefix_keys(&dbs.votes, txn, &prefix)?.len() as u64)
}

/// Timeslot ids indexed for `(session, voter)`.
fn voter_timeslots(
    dbs: &Databases,
    txn: &RoTxn,
    session: &SessionId,
    voter: &str,
) -> Result<Vec<(Vec<u8>, TimeslotId)>, LmdbError> {
    let prefix = keys::pair(session.as_bytes(), voter.as_bytes())?;
    prefix_keys(&dbs.voter_votes, txn, &prefix)?
        .into_iter()
        .map(|key| {
            let (id, _) = read_component(&key, prefix.len())
                .ok_or_else(|| LmdbError::Serialization("truncated voter_votes key".into()))?;
            let id = TimeslotId::new(decode_str(id, "timeslot id")?);
            Ok((key, id))
        })
        .collect()
}

fn voter_votes(
    dbs: &Databases,
    txn: &RoTxn,
    session: &SessionId,
    voter: &str,
) -> Result<Vec<Vote>, LmdbError> {
    let mut votes = Vec::new();
    for (_, timeslot) in voter_timeslots(dbs, txn, session, voter)? {
        let key = keys::pair(timeslot.as_bytes(), voter.as_bytes())?;
        let bytes = dbs
            .votes
            .get(txn, &key)?
            .ok_or_else(|| LmdbError::NotFound(format!("indexed vote {timeslot}/{voter}")))?;
        votes.push(decode(bytes)?);
    }
    Ok(votes)
}

macro_rules! impl_read_txn {
    ($ty:ident) => {
        impl ReadTxn for $ty<'_> {
            fn get_session(&self, id: &SessionId) -> Result<Option<Session>, StoreError> {
                Ok(get_session(self.dbs, &self.txn, id)?)
            }

            fn get_timeslot(&self, id: &TimeslotId) -> Result<Option<Timeslot>, StoreError> {
                Ok(get_timeslot(self.dbs, &self.txn, id)?)
            }

            fn find_timeslot(
                &self,
                session: &SessionId,
                start: Timestamp,
                end: Timestamp,
            ) -> Result<Option<TimeslotId>, StoreError> {
                Ok(find_timeslot(self.dbs, &self.txn, session, start, end)?)
            }

            fn session_timeslots(&self, session: &SessionId) -> Result<Vec<Timeslot>, StoreError> {
                Ok(session_timeslots(self.dbs, &self.txn, session)?)
            }

            fn get_participant(
                &self,
                session: &SessionId,
                name: &str,
            ) -> Result<Option<Participant>, StoreError> {
                Ok(get_participant(self.dbs, &self.txn, session, name)?)
            }

            fn timeslot_votes(&self, timeslot: &TimeslotId) -> Result<Vec<Vote>, StoreError> {
                Ok(timeslot_votes(self.dbs, &self.txn, timeslot)?)
            }

            fn count_timeslot_votes(&self, timeslot: &TimeslotId) -> Result<u64, StoreError> {
                Ok(count_timeslot_votes(self.dbs, &self.txn, timeslot)?)
            }

            fn voter_votes(&self, session: &SessionId, voter: &str) -> Result<Vec<Vote>, StoreError> {
                Ok(voter_votes(self.dbs, &self.txn, session, voter)?)
            }
        }
    };
}

impl_read_txn!(LmdbReadTxn);
impl_read_txn!(LmdbWriteTxn);

// ── Writes ──────────────────────────────────────────────────────────────

impl WriteTxn for LmdbWriteTxn<'_> {
    fn insert_session(&mut self, session: &Session) -> Result<(), StoreError> {
        let key = keys::single(session.id.as_bytes())?;
        let bytes = bincode::serialize(session).map_err(LmdbError::from)?;
        put_unique(
            &self.dbs.sessions,
            &mut self.txn,
            &key,
            &bytes,
            Constraint::SessionId,
        )
    }

    fn insert_timeslot(&mut self, timeslot: &Timeslot) -> Result<(), StoreError> {
        let span = span_key(&timeslot.session_id, timeslot.start, timeslot.end)?;
        put_unique(
            &self.dbs.timeslot_spans,
            &mut self.txn,
            &span,
            timeslot.id.as_bytes(),
            Constraint::TimeslotSpan,
        )?;

        let key = keys::single(timeslot.id.as_bytes())?;
        let bytes = bincode::serialize(timeslot).map_err(LmdbError::from)?;
        self.dbs
            .timeslots
            .put(&mut self.txn, &key, &bytes)
            .map_err(LmdbError::from)?;

        let index = keys::pair(timeslot.session_id.as_bytes(), timeslot.id.as_bytes())?;
        self.dbs
            .session_timeslots
            .put(&mut self.txn, &index, &[])
            .map_err(LmdbError::from)?;
        Ok(())
    }

    fn delete_timeslot(&mut self, id: &TimeslotId) -> Result<bool, StoreError> {
        let Some(timeslot) = get_timeslot(self.dbs, &self.txn, id)? else {
            return Ok(false);
        };

        let key = keys::single(id.as_bytes())?;
        let span = span_key(&timeslot.session_id, timeslot.start, timeslot.end)?;
        let index = keys::pair(timeslot.session_id.as_bytes(), id.as_bytes())?;
        self.dbs
            .timeslots
            .delete(&mut self.txn, &key)
            .map_err(LmdbError::from)?;
        self.dbs
            .timeslot_spans
            .delete(&mut self.txn, &span)
            .map_err(LmdbError::from)?;
        self.dbs
            .session_timeslots
            .delete(&mut self.txn, &index)
            .map_err(LmdbError::from)?;
        Ok(true)
    }

    fn insert_participant(&mut self, participant: &Participant) -> Result<(), StoreError> {
        let key = keys::pair(participant.session_id.as_bytes(), participant.name.as_bytes())?;
        let bytes = bincode::serialize(participant).map_err(LmdbError::from)?;
        put_unique(
            &self.dbs.participants,
            &mut self.txn,
            &key,
            &bytes,
            Constraint::ParticipantName,
        )
    }

    fn insert_vote(&mut self, session: &SessionId, vote: &Vote) -> Result<(), StoreError> {
        let key = keys::pair(vote.timeslot_id.as_bytes(), vote.voter_name.as_bytes())?;
        let bytes = bincode::serialize(vote).map_err(LmdbError::from)?;
        put_unique(
            &self.dbs.votes,
            &mut self.txn,
            &key,
            &bytes,
            Constraint::TimeslotVoter,
        )?;

        let index = voter_index_key(session, &vote.voter_name, &vote.timeslot_id)?;
        self.dbs
            .voter_votes
            .put(&mut self.txn, &index, &[])
            .map_err(LmdbError::from)?;
        Ok(())
    }

    fn delete_voter_votes(&mut self, session: &SessionId, voter: &str) -> Result<u64, StoreError> {
        let indexed = voter_timeslots(self.dbs, &self.txn, session, voter)?;
        let mut removed = 0;
        for (index_key, timeslot) in indexed {
            let key = keys::pair(timeslot.as_bytes(), voter.as_bytes())?;
            if self
                .dbs
                .votes
                .delete(&mut self.txn, &key)
                .map_err(LmdbError::from)?
            {
                removed += 1;
            }
            self.dbs
                .voter_votes
                .delete(&mut self.txn, &index_key)
                .map_err(LmdbError::from)?;
        }
        Ok(removed)
    }

    fn commit(self) -> Result<(), StoreError> {
        self.txn.commit().map_err(LmdbError::from)?;
        Ok(())
    }

    fn rollback(self) {
        self.txn.abort();
    }
}
