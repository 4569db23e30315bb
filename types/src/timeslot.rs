//! Candidate time ranges.

use serde::{Deserialize, Serialize};

use crate::{PasswordDigest, SessionId, TimeslotId, Timestamp};

/// One candidate time range proposed within a session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeslot {
    pub id: TimeslotId,
    pub session_id: SessionId,
    pub start: Timestamp,
    pub end: Timestamp,
    /// Name of the participant who proposed the slot, if any.
    pub created_by: Option<String>,
    /// Guards deletion of this slot. Unrelated to any voter credential.
    pub password: Option<PasswordDigest>,
}

impl Timeslot {
    /// `end` strictly after `start`.
    pub fn is_well_formed(&self) -> bool {
        self.end > self.start
    }
}
