//! JWT payload inspection.
//!
//! The client never holds the signing secret, so it cannot (and does not)
//! verify signatures. It decodes the payload segment of the compact form
//! to judge shape and expiry; the backend remains the authority on
//! whether a token is actually accepted.

use std::time::{SystemTime, UNIX_EPOCH};

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;

/// Claims the client cares about. Unknown claims are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenPayload {
    /// Expiration time (Unix timestamp, seconds)
    pub exp: Option<u64>,
    /// Subject (user id)
    pub sub: Option<String>,
}

/// Errors that can occur while decoding a token payload.
#[derive(Debug)]
pub enum DecodeError {
    /// The string has no payload segment
    MissingPayload,
    /// The payload segment is not valid base64url
    Base64(base64::DecodeError),
    /// The payload bytes are not a JSON claims object
    Json(serde_json::Error),
}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DecodeError::MissingPayload => write!(f, "Token has no payload segment"),
            DecodeError::Base64(e) => write!(f, "Payload is not valid base64url: {}", e),
            DecodeError::Json(e) => write!(f, "Payload is not a claims object: {}", e),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Decode the payload segment of a compact-form JWT.
pub fn decode_payload(token: &str) -> Result<TokenPayload, DecodeError> {
    let payload = token.split('.').nth(1).ok_or(DecodeError::MissingPayload)?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(DecodeError::Base64)?;
    serde_json::from_slice(&bytes).map_err(DecodeError::Json)
}

/// Judge whether a token is present, decodable, and unexpired.
///
/// Pure over its input and the clock: nothing is refreshed or mutated.
/// A token whose `exp` equals the current second counts as expired.
pub fn is_valid(token: Option<&str>) -> bool {
    let Some(token) = token else {
        return false;
    };
    let Ok(payload) = decode_payload(token) else {
        return false;
    };
    let Some(exp) = payload.exp else {
        return false;
    };
    let Ok(now) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return false;
    };
    exp > now.as_secs()
}
