//! The poll service and its injected collaborators.

use std::sync::Arc;

use meetpoll_crypto::CredentialHasher;
use meetpoll_store::PollStore;
use meetpoll_types::{Clock, IdSource};

use crate::resolver::{IdentityPolicy, ParticipantResolver};

/// Default path prefix of shareable session links.
pub const DEFAULT_SHARE_LINK_PREFIX: &str = "/sessions";

/// Entry point for every poll operation.
///
/// Holds an explicit handle to its store; two services over two stores are
/// fully independent.
pub struct PollService<S> {
    pub(crate) store: Arc<S>,
    pub(crate) hasher: CredentialHasher,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) ids: Arc<dyn IdSource>,
    pub(crate) policy: IdentityPolicy,
    pub(crate) share_link_prefix: String,
}

impl<S: PollStore> PollService<S> {
    pub fn new(
        store: Arc<S>,
        hasher: CredentialHasher,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdSource>,
    ) -> Self {
        Self {
            store,
            hasher,
            clock,
            ids,
            policy: IdentityPolicy::default(),
            share_link_prefix: DEFAULT_SHARE_LINK_PREFIX.to_string(),
        }
    }

    pub fn with_policy(mut self, policy: IdentityPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_share_link_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.share_link_prefix = prefix.into().trim_end_matches('/').to_string();
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn policy(&self) -> IdentityPolicy {
        self.policy
    }

    pub(crate) fn resolver(&self) -> ParticipantResolver<'_> {
        ParticipantResolver::new(&self.hasher, self.clock.as_ref(), self.policy)
    }
}

impl<S> Clone for PollService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            hasher: self.hasher.clone(),
            clock: Arc::clone(&self.clock),
            ids: Arc::clone(&self.ids),
            policy: self.policy,
            share_link_prefix: self.share_link_prefix.clone(),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use meetpoll_crypto::CredentialParams;
    use meetpoll_nullables::{NullClock, NullStore, SequentialIds};

    pub(crate) struct Harness {
        pub service: PollService<NullStore>,
        pub clock: Arc<NullClock>,
        pub ids: Arc<SequentialIds>,
    }

    pub(crate) fn harness() -> Harness {
        let clock = Arc::new(NullClock::at_new_year());
        let ids = Arc::new(SequentialIds::new());
        let service = PollService::new(
            Arc::new(NullStore::new()),
            CredentialHasher::new(CredentialParams::insecure_fast()).unwrap(),
            clock.clone(),
            ids.clone(),
        );
        Harness {
            service,
            clock,
            ids,
        }
    }
}
