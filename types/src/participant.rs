//! Session-scoped soft accounts.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{SessionId, Timestamp};

/// A self-contained encoded password digest (algorithm, parameters and salt
/// embedded), as produced by the credential store.
///
/// "No credential" is `Option::<PasswordDigest>::None`, never an empty digest.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordDigest(..)")
    }
}

/// A named identity inside one session, created on first vote or first
/// self-voted timeslot.
///
/// The credential is fixed at creation; an open identity stays open.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub session_id: SessionId,
    pub name: String,
    pub password: Option<PasswordDigest>,
    pub created_at: Timestamp,
}

impl Participant {
    pub fn is_protected(&self) -> bool {
        self.password.is_some()
    }
}
