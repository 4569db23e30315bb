use meetpoll_crypto::CredentialError;
use meetpoll_store::StoreError;
use meetpoll_types::{SessionId, TimeslotId, TypeError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PollError {
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("timeslot {0} does not belong to this session")]
    InvalidTimeslotReference(TimeslotId),

    #[error("a timeslot with this start and end already exists")]
    DuplicateTimeslot,

    #[error("this name is password protected; a password is required")]
    PasswordRequired,

    #[error("invalid password")]
    InvalidPassword,

    #[error("this name is already taken in this session")]
    NameTakenNoPassword,

    #[error("cannot delete a timeslot that has votes")]
    HasVotes,

    #[error("timeslot not found: {0}")]
    NotFound(TimeslotId),

    #[error("at least one timeslot must be selected")]
    EmptyVoteSet,

    #[error("timeslot {0} appears more than once in the submission")]
    DuplicateVote(TimeslotId),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("timeslot end must be after its start")]
    InvalidTimeRange,

    #[error("credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl PollError {
    /// Stable machine-readable kind, used in API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::SessionNotFound(_) => "session_not_found",
            Self::InvalidTimeslotReference(_) => "invalid_timeslot_reference",
            Self::DuplicateTimeslot => "duplicate_timeslot",
            Self::PasswordRequired => "password_required",
            Self::InvalidPassword => "invalid_password",
            Self::NameTakenNoPassword => "name_taken_no_password",
            Self::HasVotes => "has_votes",
            Self::NotFound(_) => "not_found",
            Self::EmptyVoteSet => "empty_vote_set",
            Self::DuplicateVote(_) => "duplicate_vote",
            Self::InvalidInput(_) => "invalid_input",
            Self::InvalidTimeRange => "invalid_time_range",
            Self::Credential(_) => "credential_error",
            Self::Store(_) => "store_error",
        }
    }
}

impl From<TypeError> for PollError {
    fn from(e: TypeError) -> Self {
        Self::InvalidInput(e.to_string())
    }
}
