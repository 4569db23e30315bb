//! Votes and submitted vote items.

use serde::{Deserialize, Serialize};

use crate::{TimeslotId, Timestamp, VoteId};

/// One participant's endorsement of one timeslot.
///
/// At most one vote exists per `(timeslot_id, voter_name)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub id: VoteId,
    pub timeslot_id: TimeslotId,
    pub voter_name: String,
    pub note: Option<String>,
    pub created_at: Timestamp,
}

/// One entry of a vote submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteItem {
    pub timeslot_id: TimeslotId,
    #[serde(default)]
    pub note: Option<String>,
}

impl VoteItem {
    pub fn new(timeslot_id: impl Into<TimeslotId>) -> Self {
        Self {
            timeslot_id: timeslot_id.into(),
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}
