//! Normalisation of caller-supplied strings.

use crate::PollError;

/// Longest accepted name, in bytes. Names are embedded in composite store
/// keys, which LMDB caps at 511 bytes.
pub const MAX_NAME_BYTES: usize = 256;

/// Trim a participant or creator name; blank names are rejected.
pub fn name(raw: &str, field: &str) -> Result<String, PollError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PollError::InvalidInput(format!("{field} must not be empty")));
    }
    if trimmed.len() > MAX_NAME_BYTES {
        return Err(PollError::InvalidInput(format!(
            "{field} must be at most {MAX_NAME_BYTES} bytes"
        )));
    }
    Ok(trimmed.to_string())
}

/// An empty password is the same as no password.
pub fn password(raw: Option<&str>) -> Option<&str> {
    raw.filter(|p| !p.is_empty())
}

/// Trim a note; an empty note is stored as absent.
pub fn note(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
}
