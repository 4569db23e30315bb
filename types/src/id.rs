//! Opaque string identifiers and the capability that mints them.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn as_bytes(&self) -> &[u8] {
                self.0.as_bytes()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(
    /// Short shareable token identifying a session (e.g. `aB3xZ`).
    SessionId
);
string_id!(
    /// Unique identifier of one candidate timeslot.
    TimeslotId
);
string_id!(VoteId);

/// Source of fresh identifiers for new rows.
///
/// Production uses random tokens; tests plug in a sequential source so
/// assertions can name ids up front.
pub trait IdSource: Send + Sync {
    /// A short, human-shareable session token.
    fn session_id(&self) -> SessionId;

    fn timeslot_id(&self) -> TimeslotId;

    fn vote_id(&self) -> VoteId;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = SessionId::new("aB3xZ");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"aB3xZ\"");
        let back: SessionId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn display_is_raw_token() {
        assert_eq!(TimeslotId::from("ts-1").to_string(), "ts-1");
    }
}
