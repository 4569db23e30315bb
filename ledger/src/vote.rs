//! Vote ledger: full replacement of one voter's ballot.

use meetpoll_store::{Constraint, PollStore, ReadTxn, WriteTxn};
use meetpoll_types::{SessionId, Vote, VoteItem};

use crate::{input, PollError, PollService};

/// Summary of an accepted submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VoteReceipt {
    /// The voter's identity was created by this submission.
    pub created_identity: bool,
    /// Votes removed before the new set was written.
    pub replaced: u64,
    /// Votes written.
    pub recorded: usize,
}

impl<S: PollStore> PollService<S> {
    /// Replace every vote `voter_name` holds in the session with `items`.
    ///
    /// All-or-nothing: if any item is rejected, the voter's previous votes
    /// and identity are exactly as they were before the call.
    pub fn submit_vote(
        &self,
        session_id: &SessionId,
        voter_name: &str,
        password: Option<&str>,
        items: &[VoteItem],
    ) -> Result<VoteReceipt, PollError> {
        if items.is_empty() {
            return Err(PollError::EmptyVoteSet);
        }
        let voter = input::name(voter_name, "voter_name")?;
        let password = input::password(password);

        let mut txn = self.store.begin()?;
        if !txn.session_exists(session_id)? {
            return Err(PollError::SessionNotFound(session_id.clone()));
        }

        let resolution = self
            .resolver()
            .resolve(&mut txn, session_id, &voter, password)?;
        let replaced = if resolution.is_new() {
            0
        } else {
            txn.delete_voter_votes(session_id, &voter)?
        };

        let now = self.clock.now();
        for item in items {
            if txn.timeslot_owner(&item.timeslot_id)?.as_ref() != Some(session_id) {
                tracing::debug!(
                    session = %session_id,
                    timeslot = %item.timeslot_id,
                    "vote references foreign or missing timeslot"
                );
                return Err(PollError::InvalidTimeslotReference(item.timeslot_id.clone()));
            }
            let vote = Vote {
                id: self.ids.vote_id(),
                timeslot_id: item.timeslot_id.clone(),
                voter_name: voter.clone(),
                note: input::note(item.note.as_deref()),
                created_at: now,
            };
            txn.insert_vote(session_id, &vote).map_err(|e| {
                if e.constraint() == Some(Constraint::TimeslotVoter) {
                    PollError::DuplicateVote(item.timeslot_id.clone())
                } else {
                    e.into()
                }
            })?;
        }
        txn.commit()?;

        tracing::debug!(
            session = %session_id,
            voter = %voter,
            replaced,
            recorded = items.len(),
            "votes replaced"
        );
        Ok(VoteReceipt {
            created_identity: resolution.is_new(),
            replaced,
            recorded: items.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::test_support::{harness, Harness};
    use crate::NewSession;
    use chrono::{TimeZone, Utc};
    use meetpoll_store::{PollStore, ReadTxn};
    use meetpoll_types::{TimeslotId, Timestamp};

    fn at(hour: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap()
    }

    /// Session `s1` with slots `t1` (10:00) and `t2` (11:00).
    fn seeded() -> (Harness, SessionId) {
        let h = harness();
        let created = h
            .service
            .create_session(NewSession {
                title: "Lunch".into(),
                creator_name: "Eli".into(),
                timeslots: vec![(at(10), at(11)), (at(11), at(12))],
                ..NewSession::default()
            })
            .unwrap();
        (h, created.id)
    }

    fn ballot(h: &Harness, session: &SessionId, voter: &str) -> Vec<(String, Option<String>)> {
        let mut votes: Vec<_> = h
            .service
            .store()
            .read()
            .unwrap()
            .voter_votes(session, voter)
            .unwrap()
            .into_iter()
            .map(|v| (v.timeslot_id.to_string(), v.note))
            .collect();
        votes.sort();
        votes
    }

    #[test]
    fn first_submission_creates_identity() {
        let (h, s) = seeded();
        let receipt = h
            .service
            .submit_vote(&s, " Ana ", Some("p1"), &[VoteItem::new("t1").with_note(" ok ")])
            .unwrap();
        assert_eq!(
            receipt,
            VoteReceipt {
                created_identity: true,
                replaced: 0,
                recorded: 1
            }
        );
        assert_eq!(ballot(&h, &s, "Ana"), vec![("t1".into(), Some("ok".into()))]);
    }

    #[test]
    fn resubmission_replaces_rather_than_merges() {
        let (h, s) = seeded();
        h.service
            .submit_vote(&s, "Ana", None, &[VoteItem::new("t1")])
            .unwrap();
        let receipt = h
            .service
            .submit_vote(&s, "Ana", None, &[VoteItem::new("t2")])
            .unwrap();
        assert_eq!(receipt.replaced, 1);
        assert_eq!(ballot(&h, &s, "Ana"), vec![("t2".into(), None)]);
    }

    #[test]
    fn password_protected_voter_keeps_votes_on_rejection() {
        let (h, s) = seeded();
        h.service
            .submit_vote(&s, "Ana", Some("p1"), &[VoteItem::new("t1").with_note("ok")])
            .unwrap();

        let err = h
            .service
            .submit_vote(&s, "Ana", None, &[VoteItem::new("t2")])
            .unwrap_err();
        assert!(matches!(err, PollError::PasswordRequired));
        let err = h
            .service
            .submit_vote(&s, "Ana", Some(""), &[VoteItem::new("t2")])
            .unwrap_err();
        assert!(matches!(err, PollError::PasswordRequired));
        let err = h
            .service
            .submit_vote(&s, "Ana", Some("p2"), &[VoteItem::new("t2")])
            .unwrap_err();
        assert!(matches!(err, PollError::InvalidPassword));

        assert_eq!(ballot(&h, &s, "Ana"), vec![("t1".into(), Some("ok".into()))]);
    }

    #[test]
    fn invalid_item_rolls_back_whole_batch() {
        let (h, s) = seeded();
        h.service
            .submit_vote(&s, "Ana", None, &[VoteItem::new("t1")])
            .unwrap();
        let err = h
            .service
            .submit_vote(&s, "Ana", None, &[VoteItem::new("t2"), VoteItem::new("missing")])
            .unwrap_err();
        assert!(matches!(
            err,
            PollError::InvalidTimeslotReference(ref id) if id == &TimeslotId::new("missing")
        ));
        assert_eq!(ballot(&h, &s, "Ana"), vec![("t1".into(), None)]);
    }

    #[test]
    fn failed_first_submission_leaves_no_identity() {
        let (h, s) = seeded();
        let before = h.service.store().participant_count();
        h.service
            .submit_vote(&s, "Dan", Some("pw"), &[VoteItem::new("nope")])
            .unwrap_err();
        assert_eq!(h.service.store().participant_count(), before);
        // the name is still free, so a different password can claim it
        h.service
            .submit_vote(&s, "Dan", Some("other"), &[VoteItem::new("t1")])
            .unwrap();
    }

    #[test]
    fn duplicate_item_in_one_submission_is_rejected() {
        let (h, s) = seeded();
        let err = h
            .service
            .submit_vote(&s, "Ana", None, &[VoteItem::new("t1"), VoteItem::new("t1")])
            .unwrap_err();
        assert!(matches!(err, PollError::DuplicateVote(ref id) if id.as_str() == "t1"));
        assert_eq!(h.service.store().vote_count(), 0);
    }

    #[test]
    fn empty_vote_set_is_rejected_before_the_store() {
        let (h, s) = seeded();
        h.service.store().fail_next_commit();
        assert!(matches!(
            h.service.submit_vote(&s, "Ana", None, &[]),
            Err(PollError::EmptyVoteSet)
        ));
        // the injected failure was not consumed
        let err = h
            .service
            .submit_vote(&s, "Ana", None, &[VoteItem::new("t1")])
            .unwrap_err();
        assert!(matches!(err, PollError::Store(_)));
        assert_eq!(h.service.store().vote_count(), 0);
    }

    #[test]
    fn unknown_session_fails_first() {
        let (h, _) = seeded();
        let err = h
            .service
            .submit_vote(&SessionId::new("zzz"), "Ana", None, &[VoteItem::new("t1")])
            .unwrap_err();
        assert!(matches!(err, PollError::SessionNotFound(_)));
    }

    #[test]
    fn blank_voter_name_is_invalid_input() {
        let (h, s) = seeded();
        assert!(matches!(
            h.service.submit_vote(&s, "  ", None, &[VoteItem::new("t1")]),
            Err(PollError::InvalidInput(_))
        ));
    }

    #[test]
    fn names_are_scoped_to_their_session() {
        let (h, s1) = seeded();
        let s2 = h
            .service
            .create_session(NewSession {
                title: "Dinner".into(),
                creator_name: "Eli".into(),
                timeslots: vec![(at(18), at(19))],
                ..NewSession::default()
            })
            .unwrap()
            .id;
        h.service
            .submit_vote(&s1, "Ana", Some("p1"), &[VoteItem::new("t1")])
            .unwrap();
        // t3 belongs to s2; "Ana" there is a different, new identity
        let receipt = h
            .service
            .submit_vote(&s2, "Ana", None, &[VoteItem::new("t3")])
            .unwrap();
        assert!(receipt.created_identity);
        // and s1's slots are foreign to s2
        assert!(matches!(
            h.service.submit_vote(&s2, "Ana", None, &[VoteItem::new("t1")]),
            Err(PollError::InvalidTimeslotReference(_))
        ));
        assert_eq!(ballot(&h, &s1, "Ana"), vec![("t1".into(), None)]);
        assert_eq!(ballot(&h, &s2, "Ana"), vec![("t3".into(), None)]);
    }
}
