//! Session manager: token storage, session state and token refresh.
//!
//! A [`SessionHandle`] is created once at startup with
//! [`SessionHandle::initialize`] and passed to the API client. The
//! [`RefreshCoordinator`] is the response stage that recovers from expired
//! access tokens.

mod refresh;
mod state;
mod store;

pub use refresh::RefreshCoordinator;
pub use state::{SessionHandle, SessionStatus};
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};

/// Access and refresh token pair for an authenticated user.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    /// Short-lived credential sent as the bearer token
    pub access_token: String,
    /// Longer-lived credential exchanged for new access tokens
    pub refresh_token: String,
}

impl Session {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &mask_token(&self.access_token))
            .field("refresh_token", &mask_token(&self.refresh_token))
            .finish()
    }
}

/// Returns a masked version of a token for display (first 12 chars + ...).
pub fn mask_token(token: &str) -> String {
    if token.len() <= 16 {
        return "***".to_string();
    }
    match token.get(..12) {
        Some(prefix) => format!("{prefix}..."),
        None => "***".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_token() {
        assert_eq!(
            mask_token("eyJhbGciOiJIUzI1NiJ9.payload.sig"),
            "eyJhbGciOiJI..."
        );
        assert_eq!(mask_token("short"), "***");
    }

    #[test]
    fn test_debug_never_prints_tokens() {
        let session = Session::new("access-token-abcdefghijkl", "R1");
        let rendered = format!("{session:?}");
        assert!(!rendered.contains("access-token-abcdefghijkl"));
        assert!(!rendered.contains("R1"));
    }
}
