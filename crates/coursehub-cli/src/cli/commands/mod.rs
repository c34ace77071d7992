//! CLI command handlers.

pub mod auth;
pub mod config;
pub mod courses;
pub mod enrollments;
pub mod lessons;
pub mod profile;

use anyhow::Result;
use coursehub_core::client::{ApiClient, ApiError};
use coursehub_core::config::Config;
use coursehub_core::session::{FileTokenStore, SessionHandle};

/// Builds the API client over the session stored under `COURSEHUB_HOME`.
pub fn client(config: &Config) -> Result<ApiClient> {
    let store = FileTokenStore::default_location();
    tracing::debug!(path = %store.path().display(), "loading session");
    let session = SessionHandle::initialize(store);
    ApiClient::from_config(config, session)
}

/// Wraps an API error with the message a person should see first.
pub fn api_error(e: ApiError) -> anyhow::Error {
    let message = e.user_message();
    if message == e.message {
        anyhow::Error::new(e)
    } else {
        anyhow::Error::new(e).context(message)
    }
}

/// Fails unless a session is stored.
pub fn require_session(client: &ApiClient) -> Result<()> {
    if !client.session().is_authenticated() {
        anyhow::bail!("Not logged in. Run `coursehub login` first.");
    }
    Ok(())
}
