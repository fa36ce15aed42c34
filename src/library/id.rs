//! Opaque book identifiers.
//!
//! An identifier is the unpadded URL-safe base64 form of the book's path
//! relative to the library root. It is stable for as long as the path is,
//! and any valid identifier for a file under the root resolves to it.

use crate::error::{AppError, Result};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};

/// Encode a relative path into an identifier.
pub fn encode(path: &str) -> String {
    URL_SAFE_NO_PAD.encode(path.as_bytes())
}

/// Decode an identifier back into the relative path it was built from.
///
/// Padding, characters outside the URL-safe alphabet, non-canonical trailing
/// bits and non-UTF-8 payloads are all rejected.
pub fn decode(id: &str) -> Result<String> {
    if id.is_empty() {
        return Err(AppError::InvalidIdentifier("empty identifier".into()));
    }

    let bytes = URL_SAFE_NO_PAD
        .decode(id)
        .map_err(|e| AppError::InvalidIdentifier(e.to_string()))?;

    String::from_utf8(bytes).map_err(|e| AppError::InvalidIdentifier(e.to_string()))
}

/// Whether `id` only uses characters an identifier can contain.
pub fn is_well_formed(id: &str) -> bool {
    !id.is_empty()
        && id
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
