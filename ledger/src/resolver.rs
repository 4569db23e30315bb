//! Participant resolution: find or create the soft account a request acts as.

use meetpoll_crypto::CredentialHasher;
use meetpoll_store::WriteTxn;
use meetpoll_types::{Clock, Participant, SessionId};
use serde::{Deserialize, Serialize};

use crate::PollError;

/// What happens when a request reuses a name that has no password.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityPolicy {
    /// Anyone may act as an open identity.
    #[default]
    Open,
    /// Open identities cannot be reused at all.
    Strict,
}

/// Outcome of a successful resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// The name was unused; a participant row was written in this transaction.
    Created,
    /// The name already existed and the caller is allowed to act as it.
    Existing,
}

impl Resolution {
    pub fn is_new(&self) -> bool {
        matches!(self, Self::Created)
    }
}

/// Authorizes a request to act as `(session, name)`.
pub struct ParticipantResolver<'a> {
    hasher: &'a CredentialHasher,
    clock: &'a dyn Clock,
    policy: IdentityPolicy,
}

impl<'a> ParticipantResolver<'a> {
    pub fn new(hasher: &'a CredentialHasher, clock: &'a dyn Clock, policy: IdentityPolicy) -> Self {
        Self {
            hasher,
            clock,
            policy,
        }
    }

    /// Look the name up inside `txn` and create it if unused.
    ///
    /// `name` must already be normalised and `candidate` must be `None` for
    /// an empty password. A stored credential is never changed here.
    pub fn resolve<T: WriteTxn>(
        &self,
        txn: &mut T,
        session: &SessionId,
        name: &str,
        candidate: Option<&str>,
    ) -> Result<Resolution, PollError> {
        let Some(existing) = txn.get_participant(session, name)? else {
            let participant = Participant {
                session_id: session.clone(),
                name: name.to_string(),
                password: self.hasher.hash_optional(candidate)?,
                created_at: self.clock.now(),
            };
            txn.insert_participant(&participant)?;
            tracing::info!(
                session = %session,
                voter = %name,
                protected = participant.is_protected(),
                "participant created"
            );
            return Ok(Resolution::Created);
        };

        match (&existing.password, candidate) {
            (None, _) => match self.policy {
                IdentityPolicy::Open => Ok(Resolution::Existing),
                IdentityPolicy::Strict => {
                    tracing::warn!(session = %session, voter = %name, "name already taken");
                    Err(PollError::NameTakenNoPassword)
                }
            },
            (Some(_), None) => {
                tracing::warn!(session = %session, voter = %name, "password required");
                Err(PollError::PasswordRequired)
            }
            (Some(digest), Some(secret)) => {
                if self.hasher.verify(secret, digest)? {
                    Ok(Resolution::Existing)
                } else {
                    tracing::warn!(session = %session, voter = %name, "invalid password");
                    Err(PollError::InvalidPassword)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meetpoll_crypto::CredentialParams;
    use meetpoll_nullables::{NullClock, NullStore};
    use meetpoll_store::{PollStore, ReadTxn};

    fn hasher() -> CredentialHasher {
        CredentialHasher::new(CredentialParams::insecure_fast()).unwrap()
    }

    fn resolve(
        store: &NullStore,
        policy: IdentityPolicy,
        name: &str,
        candidate: Option<&str>,
    ) -> Result<Resolution, PollError> {
        let hasher = hasher();
        let clock = NullClock::at_new_year();
        let resolver = ParticipantResolver::new(&hasher, &clock, policy);
        let mut txn = store.begin().unwrap();
        let resolution = resolver.resolve(&mut txn, &SessionId::new("s1"), name, candidate)?;
        txn.commit().unwrap();
        Ok(resolution)
    }

    #[test]
    fn first_use_creates_identity() {
        let store = NullStore::new();
        assert_eq!(
            resolve(&store, IdentityPolicy::Open, "Ana", Some("p1")).unwrap(),
            Resolution::Created
        );
        let stored = store
            .read()
            .unwrap()
            .get_participant(&SessionId::new("s1"), "Ana")
            .unwrap()
            .unwrap();
        assert!(stored.is_protected());
    }

    #[test]
    fn protected_identity_needs_its_password() {
        let store = NullStore::new();
        resolve(&store, IdentityPolicy::Open, "Ana", Some("p1")).unwrap();
        assert!(matches!(
            resolve(&store, IdentityPolicy::Open, "Ana", None),
            Err(PollError::PasswordRequired)
        ));
        assert!(matches!(
            resolve(&store, IdentityPolicy::Open, "Ana", Some("p2")),
            Err(PollError::InvalidPassword)
        ));
        assert_eq!(
            resolve(&store, IdentityPolicy::Open, "Ana", Some("p1")).unwrap(),
            Resolution::Existing
        );
    }

    #[test]
    fn open_identity_ignores_supplied_password() {
        let store = NullStore::new();
        resolve(&store, IdentityPolicy::Open, "Bob", None).unwrap();
        assert_eq!(
            resolve(&store, IdentityPolicy::Open, "Bob", Some("anything")).unwrap(),
            Resolution::Existing
        );
        let stored = store
            .read()
            .unwrap()
            .get_participant(&SessionId::new("s1"), "Bob")
            .unwrap()
            .unwrap();
        assert_eq!(stored.password, None);
    }

    #[test]
    fn strict_policy_rejects_reuse_of_open_name() {
        let store = NullStore::new();
        resolve(&store, IdentityPolicy::Strict, "Bob", None).unwrap();
        assert!(matches!(
            resolve(&store, IdentityPolicy::Strict, "Bob", None),
            Err(PollError::NameTakenNoPassword)
        ));
    }

    #[test]
    fn policy_parses_lowercase() {
        #[derive(Deserialize)]
        struct Wrapper {
            policy: IdentityPolicy,
        }
        let parsed: Wrapper = serde_json::from_str(r#"{"policy":"strict"}"#).unwrap();
        assert_eq!(parsed.policy, IdentityPolicy::Strict);
    }
}
