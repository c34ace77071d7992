//! Unverified reads of the access token payload.
//!
//! The server owns authorization. The client only peeks at the JWT payload
//! to learn who it is acting for; no signature is checked.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Identity claims carried by an access token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AccessClaims {
    #[serde(default)]
    pub user_id: Option<u64>,
    #[serde(default)]
    pub role: Option<String>,
    /// Expiry as a unix timestamp
    #[serde(default)]
    pub exp: Option<i64>,
}

impl AccessClaims {
    /// Decodes the payload segment of a JWT. `None` if the token is not a
    /// well-formed JWT or its payload is not a JSON object.
    pub fn decode(token: &str) -> Option<Self> {
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 3 {
            return None;
        }
        let decoded = URL_SAFE_NO_PAD.decode(parts[1].trim_end_matches('=')).ok()?;
        serde_json::from_slice(&decoded).ok()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|ts| DateTime::from_timestamp(ts, 0))
    }

    /// Whether the token is past its expiry at `now`. Tokens without an
    /// `exp` claim never count as expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|exp| exp <= now)
    }
}
