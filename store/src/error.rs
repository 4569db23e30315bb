use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A uniqueness rule enforced by every backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Constraint {
    /// One session per id.
    SessionId,
    /// One participant per `(session_id, name)`.
    ParticipantName,
    /// One timeslot per `(session_id, start, end)`.
    TimeslotSpan,
    /// One vote per `(timeslot_id, voter_name)`.
    TimeslotVoter,
}

impl Constraint {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SessionId => "session_id_unique",
            Self::ParticipantName => "participant_name_unique",
            Self::TimeslotSpan => "timeslot_span_unique",
            Self::TimeslotVoter => "timeslot_voter_unique",
        }
    }
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("key not found: {0}")]
    NotFound(String),

    #[error("constraint violated: {constraint}")]
    ConstraintViolation { constraint: Constraint },

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("database is corrupted: {0}")]
    Corruption(String),
}

impl StoreError {
    pub fn violation(constraint: Constraint) -> Self {
        Self::ConstraintViolation { constraint }
    }

    /// The violated constraint, if this is a uniqueness failure.
    pub fn constraint(&self) -> Option<Constraint> {
        match self {
            Self::ConstraintViolation { constraint } => Some(*constraint),
            _ => None,
        }
    }
}
