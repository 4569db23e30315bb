//! Cryptographic primitives for meetpoll.
//!
//! - **Argon2id** PHC-string digests for soft-account and timeslot passwords
//! - Random tokens for session, timeslot and vote identifiers

pub mod credential;
pub mod token;

pub use credential::{CredentialError, CredentialHasher, CredentialParams};
pub use token::{random_hex, short_token, RandomIds};
