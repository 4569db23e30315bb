//! Random identifiers.
//!
//! Session ids are short alphanumeric tokens meant to be typed or shared in
//! a link; every other id is 128 random bits in hex.

use meetpoll_types::{IdSource, SessionId, TimeslotId, VoteId};

use crate::CredentialError;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Largest multiple of the alphabet size that fits in a byte; bytes at or
/// above it are discarded to keep the draw uniform.
const REJECTION_BOUND: u8 = (256 / ALPHABET.len() * ALPHABET.len()) as u8;

/// Default session token length.
pub const SHORT_TOKEN_LEN: usize = 5;

fn fill(buf: &mut [u8]) -> Result<(), CredentialError> {
    getrandom::getrandom(buf).map_err(|e| CredentialError::Entropy(e.to_string()))
}

/// `len` uniformly drawn characters from `[a-zA-Z0-9]`.
pub fn short_token(len: usize) -> Result<String, CredentialError> {
    let mut out = String::with_capacity(len);
    let mut buf = [0u8; 32];
    while out.len() < len {
        fill(&mut buf)?;
        for b in buf {
            if b < REJECTION_BOUND {
                out.push(ALPHABET[(b as usize) % ALPHABET.len()] as char);
                if out.len() == len {
                    break;
                }
            }
        }
    }
    Ok(out)
}

/// `bytes` random bytes, hex encoded.
pub fn random_hex(bytes: usize) -> Result<String, CredentialError> {
    let mut buf = vec![0u8; bytes];
    fill(&mut buf)?;
    Ok(hex::encode(buf))
}

/// Production [`IdSource`] backed by the OS entropy source.
#[derive(Clone, Debug)]
pub struct RandomIds {
    session_len: usize,
}

impl RandomIds {
    pub fn new(session_len: usize) -> Self {
        Self { session_len }
    }
}

impl Default for RandomIds {
    fn default() -> Self {
        Self::new(SHORT_TOKEN_LEN)
    }
}

impl IdSource for RandomIds {
    fn session_id(&self) -> SessionId {
        SessionId::new(short_token(self.session_len).expect("OS entropy source unavailable"))
    }

    fn timeslot_id(&self) -> TimeslotId {
        TimeslotId::new(random_hex(16).expect("OS entropy source unavailable"))
    }

    fn vote_id(&self) -> VoteId {
        VoteId::new(random_hex(16).expect("OS entropy source unavailable"))
    }
}
