//! Session creation and the read model of one session.

use meetpoll_store::{Constraint, PollStore, ReadTxn, WriteTxn};
use meetpoll_types::{
    DynamicConfig, Session, SessionId, SessionKind, Timeslot, TimeslotId, Timestamp, Vote,
};
use serde::{Deserialize, Serialize};

use crate::{input, PollError, PollService};

/// Attempts at drawing an unused short session id.
const MAX_SESSION_ID_ATTEMPTS: usize = 5;

/// Request to open a new poll.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSession {
    pub title: String,
    pub creator_name: String,
    #[serde(default)]
    pub kind: SessionKind,
    #[serde(default)]
    pub dynamic_config: Option<DynamicConfig>,
    /// Initial candidate slots as `(start, end)`.
    #[serde(default)]
    pub timeslots: Vec<(Timestamp, Timestamp)>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedSession {
    pub id: SessionId,
    pub link: String,
}

/// A session with its slots and votes, free of credential material.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    pub id: SessionId,
    pub title: String,
    pub creator_name: String,
    pub created_at: Timestamp,
    pub kind: SessionKind,
    pub dynamic_config: Option<DynamicConfig>,
    pub timeslots: Vec<TimeslotView>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeslotView {
    pub id: TimeslotId,
    pub start: Timestamp,
    pub end: Timestamp,
    pub created_by: Option<String>,
    /// Whether deleting the slot requires a password.
    pub protected: bool,
    pub votes: Vec<VoteView>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteView {
    pub voter_name: String,
    pub note: Option<String>,
    pub created_at: Timestamp,
}

impl TimeslotView {
    pub fn new(timeslot: Timeslot, mut votes: Vec<Vote>) -> Self {
        votes.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.voter_name.cmp(&b.voter_name))
        });
        Self {
            protected: timeslot.password.is_some(),
            id: timeslot.id,
            start: timeslot.start,
            end: timeslot.end,
            created_by: timeslot.created_by,
            votes: votes
                .into_iter()
                .map(|v| VoteView {
                    voter_name: v.voter_name,
                    note: v.note,
                    created_at: v.created_at,
                })
                .collect(),
        }
    }
}

fn validate(request: &NewSession) -> Result<(), PollError> {
    if request.kind == SessionKind::Fixed && request.timeslots.is_empty() {
        return Err(PollError::InvalidInput(
            "a fixed session needs at least one timeslot".into(),
        ));
    }
    if request.timeslots.iter().any(|(start, end)| end <= start) {
        return Err(PollError::InvalidTimeRange);
    }
    match (request.kind, &request.dynamic_config) {
        (SessionKind::Fixed, _) => {}
        (_, None) => {
            return Err(PollError::InvalidInput(format!(
                "a {} session needs a dynamic_config",
                request.kind
            )))
        }
        (SessionKind::Dynamic, Some(config)) if config.date.is_none() => {
            return Err(PollError::InvalidInput(
                "a dynamic session needs a date".into(),
            ))
        }
        (SessionKind::Weekly, Some(config)) if config.allowed_days.is_empty() => {
            return Err(PollError::InvalidInput(
                "a weekly session needs at least one allowed day".into(),
            ))
        }
        _ => {}
    }
    if let Some(config) = &request.dynamic_config {
        config.validate()?;
    }
    Ok(())
}

impl<S: PollStore> PollService<S> {
    /// Open a new poll with its initial slots in one transaction.
    pub fn create_session(&self, request: NewSession) -> Result<CreatedSession, PollError> {
        let title = input::name(&request.title, "title")?;
        let creator_name = input::name(&request.creator_name, "creator_name")?;
        validate(&request)?;

        let mut txn = self.store.begin()?;
        let mut session = Session {
            id: self.ids.session_id(),
            title,
            creator_name,
            created_at: self.clock.now(),
            expires_at: None,
            archived_at: None,
            kind: request.kind,
            dynamic_config: request.dynamic_config,
        };

        let mut attempt = 1;
        loop {
            match txn.insert_session(&session) {
                Ok(()) => break,
                Err(e)
                    if e.constraint() == Some(Constraint::SessionId)
                        && attempt < MAX_SESSION_ID_ATTEMPTS =>
                {
                    tracing::debug!(session = %session.id, attempt, "session id collision");
                    session.id = self.ids.session_id();
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }

        for (start, end) in request.timeslots {
            let timeslot = Timeslot {
                id: self.ids.timeslot_id(),
                session_id: session.id.clone(),
                start,
                end,
                created_by: None,
                password: None,
            };
            txn.insert_timeslot(&timeslot).map_err(|e| {
                if e.constraint() == Some(Constraint::TimeslotSpan) {
                    PollError::DuplicateTimeslot
                } else {
                    e.into()
                }
            })?;
        }
        txn.commit()?;

        tracing::info!(session = %session.id, kind = %session.kind, "session created");
        Ok(CreatedSession {
            link: format!("{}/{}", self.share_link_prefix, session.id),
            id: session.id,
        })
    }

    /// The session with slots ordered by `(start, end)` and each slot's votes
    /// ordered by creation time, then voter name.
    pub fn get_session(&self, id: &SessionId) -> Result<SessionView, PollError> {
        let txn = self.store.read()?;
        let session = txn
            .get_session(id)?
            .ok_or_else(|| PollError::SessionNotFound(id.clone()))?;

        let mut timeslots = txn.session_timeslots(id)?;
        timeslots.sort_by(|a, b| (a.start, a.end, &a.id).cmp(&(b.start, b.end, &b.id)));
        let timeslots = timeslots
            .into_iter()
            .map(|ts| {
                let votes = txn.timeslot_votes(&ts.id)?;
                Ok(TimeslotView::new(ts, votes))
            })
            .collect::<Result<Vec<_>, PollError>>()?;

        Ok(SessionView {
            id: session.id,
            title: session.title,
            creator_name: session.creator_name,
            created_at: session.created_at,
            kind: session.kind,
            dynamic_config: session.dynamic_config,
            timeslots,
        })
    }
}
