//! Timeslot lifecycle: creation with an optional self-vote, guarded deletion.

use meetpoll_store::{Constraint, PollStore, ReadTxn, WriteTxn};
use meetpoll_types::{SessionId, Timeslot, TimeslotId, Timestamp, Vote};
use serde::{Deserialize, Serialize};

use crate::{input, PollError, PollService};

/// Request to propose a slot inside an existing session.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTimeslot {
    pub start: Timestamp,
    pub end: Timestamp,
    /// Proposer; when set, the proposer votes for the new slot.
    #[serde(default)]
    pub created_by: Option<String>,
    /// Authorizes acting as `created_by`.
    #[serde(default)]
    pub voter_password: Option<String>,
    /// Guards later deletion of this slot.
    #[serde(default)]
    pub deletion_password: Option<String>,
}

impl std::fmt::Debug for NewTimeslot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewTimeslot")
            .field("start", &self.start)
            .field("end", &self.end)
            .field("created_by", &self.created_by)
            .finish_non_exhaustive()
    }
}

impl<S: PollStore> PollService<S> {
    /// Add a slot and, if a proposer is named, their vote for it.
    ///
    /// A rejected proposer identity aborts the slot too.
    pub fn create_timeslot(
        &self,
        session_id: &SessionId,
        request: NewTimeslot,
    ) -> Result<Timeslot, PollError> {
        if request.end <= request.start {
            return Err(PollError::InvalidTimeRange);
        }
        let proposer = match request.created_by.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => Some(input::name(name, "created_by")?),
            _ => None,
        };

        let mut txn = self.store.begin()?;
        if !txn.session_exists(session_id)? {
            return Err(PollError::SessionNotFound(session_id.clone()));
        }
        if txn
            .find_timeslot(session_id, request.start, request.end)?
            .is_some()
        {
            return Err(PollError::DuplicateTimeslot);
        }

        let timeslot = Timeslot {
            id: self.ids.timeslot_id(),
            session_id: session_id.clone(),
            start: request.start,
            end: request.end,
            created_by: proposer.clone(),
            password: self
                .hasher
                .hash_optional(input::password(request.deletion_password.as_deref()))?,
        };
        txn.insert_timeslot(&timeslot).map_err(|e| {
            if e.constraint() == Some(Constraint::TimeslotSpan) {
                PollError::DuplicateTimeslot
            } else {
                e.into()
            }
        })?;

        if let Some(name) = &proposer {
            self.resolver().resolve(
                &mut txn,
                session_id,
                name,
                input::password(request.voter_password.as_deref()),
            )?;
            txn.insert_vote(
                session_id,
                &Vote {
                    id: self.ids.vote_id(),
                    timeslot_id: timeslot.id.clone(),
                    voter_name: name.clone(),
                    note: None,
                    created_at: self.clock.now(),
                },
            )?;
        }
        txn.commit()?;

        tracing::debug!(
            session = %session_id,
            timeslot = %timeslot.id,
            self_vote = proposer.is_some(),
            "timeslot created"
        );
        Ok(timeslot)
    }

    /// Remove a slot nobody has voted for.
    ///
    /// Checks ownership, then votes, then the slot's own password.
    pub fn delete_timeslot(
        &self,
        session_id: &SessionId,
        timeslot_id: &TimeslotId,
        password: Option<&str>,
    ) -> Result<(), PollError> {
        let mut txn = self.store.begin()?;
        let timeslot = txn
            .get_timeslot(timeslot_id)?
            .filter(|ts| &ts.session_id == session_id)
            .ok_or_else(|| PollError::NotFound(timeslot_id.clone()))?;

        if txn.count_timeslot_votes(timeslot_id)? > 0 {
            return Err(PollError::HasVotes);
        }

        if let Some(digest) = &timeslot.password {
            let Some(secret) = input::password(password) else {
                return Err(PollError::PasswordRequired);
            };
            if !self.hasher.verify(secret, digest)? {
                tracing::warn!(
                    session = %session_id,
                    timeslot = %timeslot_id,
                    "invalid timeslot password"
                );
                return Err(PollError::InvalidPassword);
            }
        }

        txn.delete_timeslot(timeslot_id)?;
        txn.commit()?;
        tracing::debug!(session = %session_id, timeslot = %timeslot_id, "timeslot deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::test_support::{harness, Harness};
    use crate::NewSession;
    use chrono::{TimeZone, Utc};
    use meetpoll_types::VoteItem;

    fn at(hour: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap()
    }

    fn seeded() -> (Harness, SessionId) {
        let h = harness();
        let id = h
            .service
            .create_session(NewSession {
                title: "Sync".into(),
                creator_name: "Eli".into(),
                timeslots: vec![(at(8), at(9))],
                ..NewSession::default()
            })
            .unwrap()
            .id;
        (h, id)
    }

    fn slot(start: u32) -> NewTimeslot {
        NewTimeslot {
            start: at(start),
            end: at(start + 1),
            ..NewTimeslot::default()
        }
    }

    fn slot_count(h: &Harness, s: &SessionId) -> usize {
        h.service.get_session(s).unwrap().timeslots.len()
    }

    #[test]
    fn self_vote_is_recorded_with_the_slot() {
        let (h, s) = seeded();
        let ts = h
            .service
            .create_timeslot(
                &s,
                NewTimeslot {
                    created_by: Some("Cara".into()),
                    ..slot(10)
                },
            )
            .unwrap();
        assert_eq!(ts.created_by.as_deref(), Some("Cara"));
        let view = h.service.get_session(&s).unwrap();
        let new = view.timeslots.iter().find(|t| t.id == ts.id).unwrap();
        assert_eq!(new.votes.len(), 1);
        assert_eq!(new.votes[0].voter_name, "Cara");
    }

    #[test]
    fn rejected_proposer_leaves_no_slot() {
        let (h, s) = seeded();
        h.service
            .submit_vote(&s, "Cara", Some("secret"), &[VoteItem::new("t1")])
            .unwrap();
        let err = h
            .service
            .create_timeslot(
                &s,
                NewTimeslot {
                    created_by: Some("Cara".into()),
                    voter_password: Some("wrong".into()),
                    ..slot(10)
                },
            )
            .unwrap_err();
        assert!(matches!(err, PollError::InvalidPassword));
        assert_eq!(slot_count(&h, &s), 1);
    }

    #[test]
    fn self_vote_adds_to_existing_ballot() {
        let (h, s) = seeded();
        h.service
            .submit_vote(&s, "Cara", None, &[VoteItem::new("t1")])
            .unwrap();
        h.service
            .create_timeslot(
                &s,
                NewTimeslot {
                    created_by: Some("Cara".into()),
                    ..slot(10)
                },
            )
            .unwrap();
        let voted: usize = h
            .service
            .get_session(&s)
            .unwrap()
            .timeslots
            .iter()
            .map(|t| t.votes.len())
            .sum();
        assert_eq!(voted, 2);
    }

    #[test]
    fn duplicate_span_is_rejected() {
        let (h, s) = seeded();
        assert!(matches!(
            h.service.create_timeslot(&s, slot(8)),
            Err(PollError::DuplicateTimeslot)
        ));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let (h, s) = seeded();
        let request = NewTimeslot {
            start: at(12),
            end: at(12),
            ..NewTimeslot::default()
        };
        assert!(matches!(
            h.service.create_timeslot(&s, request),
            Err(PollError::InvalidTimeRange)
        ));
    }

    #[test]
    fn unknown_session_is_rejected() {
        let (h, _) = seeded();
        assert!(matches!(
            h.service.create_timeslot(&SessionId::new("nope"), slot(10)),
            Err(PollError::SessionNotFound(_))
        ));
    }

    #[test]
    fn delete_checks_in_order() {
        let (h, s) = seeded();
        let guarded = h
            .service
            .create_timeslot(
                &s,
                NewTimeslot {
                    deletion_password: Some("del".into()),
                    ..slot(10)
                },
            )
            .unwrap();

        assert!(matches!(
            h.service.delete_timeslot(&s, &TimeslotId::new("nope"), None),
            Err(PollError::NotFound(_))
        ));
        assert!(matches!(
            h.service.delete_timeslot(&s, &guarded.id, None),
            Err(PollError::PasswordRequired)
        ));
        assert!(matches!(
            h.service.delete_timeslot(&s, &guarded.id, Some("nope")),
            Err(PollError::InvalidPassword)
        ));

        h.service
            .submit_vote(&s, "Ana", None, &[VoteItem::new(guarded.id.clone())])
            .unwrap();
        // votes are checked before the password
        assert!(matches!(
            h.service.delete_timeslot(&s, &guarded.id, None),
            Err(PollError::HasVotes)
        ));
    }

    #[test]
    fn delete_frees_the_span() {
        let (h, s) = seeded();
        let guarded = h
            .service
            .create_timeslot(
                &s,
                NewTimeslot {
                    deletion_password: Some("del".into()),
                    ..slot(10)
                },
            )
            .unwrap();
        h.service
            .delete_timeslot(&s, &guarded.id, Some("del"))
            .unwrap();
        assert_eq!(slot_count(&h, &s), 1);
        h.service.create_timeslot(&s, slot(10)).unwrap();
    }

    #[test]
    fn slot_of_another_session_is_not_found() {
        let (h, s) = seeded();
        let other = h
            .service
            .create_session(NewSession {
                title: "Other".into(),
                creator_name: "Eli".into(),
                timeslots: vec![(at(8), at(9))],
                ..NewSession::default()
            })
            .unwrap()
            .id;
        // t1 belongs to `s`
        assert!(matches!(
            h.service.delete_timeslot(&other, &TimeslotId::new("t1"), None),
            Err(PollError::NotFound(_))
        ));
        assert_eq!(slot_count(&h, &s), 1);
    }

    #[test]
    fn voter_and_deletion_passwords_are_independent() {
        let (h, s) = seeded();
        let ts = h
            .service
            .create_timeslot(
                &s,
                NewTimeslot {
                    created_by: Some("Cara".into()),
                    voter_password: Some("voter".into()),
                    deletion_password: Some("delete".into()),
                    ..slot(10)
                },
            )
            .unwrap();
        // the deletion password does not authorize acting as Cara
        assert!(matches!(
            h.service
                .submit_vote(&s, "Cara", Some("delete"), &[VoteItem::new(ts.id.clone())]),
            Err(PollError::InvalidPassword)
        ));
        h.service
            .submit_vote(&s, "Cara", Some("voter"), &[VoteItem::new("t1")])
            .unwrap();
        h.service
            .delete_timeslot(&s, &ts.id, Some("delete"))
            .unwrap();
    }
}
