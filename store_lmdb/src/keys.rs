//! Composite key encoding.
//!
//! Every variable-length component is written as a big-endian `u16` length
//! followed by its bytes, so `enc(a) ++ enc(b)` is a prefix of exactly the
//! keys whose first two components are `a` and `b`, whatever bytes a
//! free-typed voter name contains.

use meetpoll_types::Timestamp;

use crate::LmdbError;

/// Longest component accepted in a key.
pub const MAX_COMPONENT_LEN: usize = u16::MAX as usize;

/// Incrementally built composite key.
#[derive(Clone, Debug, Default)]
pub struct KeyBuilder {
    buf: Vec<u8>,
}

impl KeyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one length-prefixed component.
    pub fn component(mut self, bytes: &[u8]) -> Result<Self, LmdbError> {
        let len = u16::try_from(bytes.len()).map_err(|_| {
            LmdbError::Serialization(format!(
                "key component of {} bytes exceeds {MAX_COMPONENT_LEN}",
                bytes.len()
            ))
        })?;
        self.buf.extend_from_slice(&len.to_be_bytes());
        self.buf.extend_from_slice(bytes);
        Ok(self)
    }

    /// Append an instant as 12 order-preserving bytes
    /// (sign-flipped seconds, then nanoseconds).
    pub fn instant(mut self, at: Timestamp) -> Self {
        let secs = (at.timestamp() as u64) ^ (1 << 63);
        self.buf.extend_from_slice(&secs.to_be_bytes());
        self.buf
            .extend_from_slice(&at.timestamp_subsec_nanos().to_be_bytes());
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.buf
    }
}

/// Key of a single-component record.
pub fn single(bytes: &[u8]) -> Result<Vec<u8>, LmdbError> {
    Ok(KeyBuilder::new().component(bytes)?.build())
}

/// Key of a two-component record.
pub fn pair(a: &[u8], b: &[u8]) -> Result<Vec<u8>, LmdbError> {
    Ok(KeyBuilder::new().component(a)?.component(b)?.build())
}

/// Decode the component starting at `offset`, returning it and the offset
/// just past it.
pub fn read_component(key: &[u8], offset: usize) -> Option<(&[u8], usize)> {
    let len_bytes = key.get(offset..offset + 2)?;
    let len = u16::from_be_bytes([len_bytes[0], len_bytes[1]]) as usize;
    let start = offset + 2;
    let bytes = key.get(start..start + len)?;
    Some((bytes, start + len))
}

/// Increment `prefix` in place to the smallest byte string greater than
/// every string it prefixes. An all-`0xFF` prefix becomes empty, meaning
/// "no upper bound".
pub fn increment_prefix(prefix: &mut Vec<u8>) {
    while let Some(last) = prefix.pop() {
        if last < u8::MAX {
            prefix.push(last + 1);
            return;
        }
    }
}
