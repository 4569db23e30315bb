//! Argon2id credential store for soft-account and timeslot passwords.
//!
//! A digest is a self-contained PHC string
//! (`$argon2id$v=19$m=...,t=...,p=...$<salt>$<hash>`): algorithm, cost
//! parameters and the random salt travel with it, so verification needs
//! nothing but the secret and the stored digest. The comparison of the
//! derived output is constant-time inside `argon2`.

use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use meetpoll_types::PasswordDigest;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Argon2id parameters: 19 MiB memory, 2 iterations, 1 lane of parallelism.
const ARGON2_MEMORY_KIB: u32 = 19 * 1024;
const ARGON2_ITERATIONS: u32 = 2;
const ARGON2_PARALLELISM: u32 = 1;

/// Salt length in bytes.
const SALT_LEN: usize = 16;

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("invalid Argon2 parameters: {0}")]
    Params(String),

    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("stored password digest is malformed: {0}")]
    MalformedDigest(String),

    #[error("entropy source failed: {0}")]
    Entropy(String),
}

/// Cost parameters for newly created digests.
///
/// Existing digests always verify with the parameters embedded in them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialParams {
    #[serde(default = "default_memory_kib")]
    pub memory_kib: u32,
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
}

fn default_memory_kib() -> u32 {
    ARGON2_MEMORY_KIB
}

fn default_iterations() -> u32 {
    ARGON2_ITERATIONS
}

fn default_parallelism() -> u32 {
    ARGON2_PARALLELISM
}

impl Default for CredentialParams {
    fn default() -> Self {
        Self {
            memory_kib: ARGON2_MEMORY_KIB,
            iterations: ARGON2_ITERATIONS,
            parallelism: ARGON2_PARALLELISM,
        }
    }
}

impl CredentialParams {
    /// The cheapest parameters Argon2 accepts. Only for tests.
    pub fn insecure_fast() -> Self {
        Self {
            memory_kib: 8,
            iterations: 1,
            parallelism: 1,
        }
    }
}

/// One-way password hashing and verification.
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
}

impl CredentialHasher {
    pub fn new(params: CredentialParams) -> Result<Self, CredentialError> {
        let params = Params::new(
            params.memory_kib,
            params.iterations,
            params.parallelism,
            None,
        )
        .map_err(|e| CredentialError::Params(e.to_string()))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash `secret` with a fresh random salt.
    pub fn hash(&self, secret: &str) -> Result<PasswordDigest, CredentialError> {
        let mut salt_bytes = [0u8; SALT_LEN];
        getrandom::getrandom(&mut salt_bytes)
            .map_err(|e| CredentialError::Entropy(e.to_string()))?;
        let salt = SaltString::encode_b64(&salt_bytes)
            .map_err(|e| CredentialError::Hash(e.to_string()))?;

        let hash = self
            .argon2
            .hash_password(secret.as_bytes(), &salt)
            .map_err(|e| CredentialError::Hash(e.to_string()))?;
        Ok(PasswordDigest::new(hash.to_string()))
    }

    /// Hash `secret` if one was supplied; `None` stays `None`.
    pub fn hash_optional(
        &self,
        secret: Option<&str>,
    ) -> Result<Option<PasswordDigest>, CredentialError> {
        secret.map(|s| self.hash(s)).transpose()
    }

    /// Check `secret` against a stored digest.
    ///
    /// A mismatch is `Ok(false)`; only an unreadable digest is an error.
    pub fn verify(&self, secret: &str, digest: &PasswordDigest) -> Result<bool, CredentialError> {
        let parsed = PasswordHash::new(digest.as_str())
            .map_err(|e| CredentialError::MalformedDigest(e.to_string()))?;
        match self.argon2.verify_password(secret.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(CredentialError::Hash(e.to_string())),
        }
    }
}

impl std::fmt::Debug for CredentialHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialHasher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> CredentialHasher {
        CredentialHasher::new(CredentialParams::insecure_fast()).unwrap()
    }

    #[test]
    fn hash_then_verify() {
        let h = hasher();
        let digest = h.hash("p1").unwrap();
        assert!(h.verify("p1", &digest).unwrap());
        assert!(!h.verify("p2", &digest).unwrap());
    }

    #[test]
    fn digest_is_self_contained_phc_string() {
        let digest = hasher().hash("secret").unwrap();
        assert!(digest.as_str().starts_with("$argon2id$v=19$m=8,t=1,p=1$"));
    }

    #[test]
    fn same_secret_gets_a_fresh_salt() {
        let h = hasher();
        let a = h.hash("same").unwrap();
        let b = h.hash("same").unwrap();
        assert_ne!(a, b);
        assert!(h.verify("same", &a).unwrap());
        assert!(h.verify("same", &b).unwrap());
    }

    #[test]
    fn verify_uses_parameters_from_the_digest() {
        let cheap = hasher();
        let digest = cheap.hash("pw").unwrap();
        let other = CredentialHasher::new(CredentialParams {
            memory_kib: 16,
            iterations: 2,
            parallelism: 1,
        })
        .unwrap();
        assert!(other.verify("pw", &digest).unwrap());
    }

    #[test]
    fn absent_secret_is_not_an_empty_digest() {
        assert_eq!(hasher().hash_optional(None).unwrap(), None);
        assert!(hasher().hash_optional(Some("x")).unwrap().is_some());
    }

    #[test]
    fn malformed_digest_is_an_error() {
        let result = hasher().verify("pw", &PasswordDigest::new("not-a-phc-string"));
        assert!(matches!(result, Err(CredentialError::MalformedDigest(_))));
    }

    #[test]
    fn invalid_params_are_rejected() {
        let result = CredentialHasher::new(CredentialParams {
            memory_kib: 1,
            iterations: 0,
            parallelism: 1,
        });
        assert!(matches!(result, Err(CredentialError::Params(_))));
    }
}
