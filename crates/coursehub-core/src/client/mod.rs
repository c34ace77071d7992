//! API client for the course platform.
//!
//! [`ApiClient`] owns a [`Pipeline`] composed at construction:
//! [`DefaultHeaders`] and [`BearerAuth`] on the way out, the session's
//! [`RefreshCoordinator`] on the way back. Typed endpoint operations live in
//! [`crate::api`].

mod error;
mod middleware;
mod request;
mod transport;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde::de::DeserializeOwned;

pub use self::error::{ApiError, ApiErrorKind, ApiResult};
pub use self::middleware::{
    BearerAuth, DefaultHeaders, Pipeline, RequestStage, ResponseAction, ResponseStage,
};
pub use self::request::{ApiRequest, RawResponse};
pub use self::transport::{Transport, USER_AGENT};
use crate::config::Config;
use crate::session::{RefreshCoordinator, SessionHandle};

/// Client for the platform REST API.
#[derive(Clone)]
pub struct ApiClient {
    pipeline: Pipeline,
    session: SessionHandle,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url())
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Builds a client with the standard stage chain.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        refresh_url: impl Into<String>,
        timeout: Duration,
        session: SessionHandle,
    ) -> ApiResult<Self> {
        let transport = Arc::new(Transport::new(base_url, timeout)?);
        let refresh =
            RefreshCoordinator::new(session.clone(), Arc::clone(&transport), refresh_url);

        let pipeline = Pipeline::new(transport)
            .with_request_stage(DefaultHeaders)
            .with_request_stage(BearerAuth::new(session.clone()))
            .with_response_stage(refresh);

        Ok(Self { pipeline, session })
    }

    /// Builds a client from resolved configuration.
    ///
    /// # Errors
    /// Returns an error if a configured URL is invalid or the HTTP client
    /// cannot be built.
    pub fn from_config(config: &Config, session: SessionHandle) -> anyhow::Result<Self> {
        let base_url = config.base_url()?;
        let refresh_url = config.refresh_url()?;
        tracing::debug!(%base_url, %refresh_url, "building api client");

        Self::new(base_url, refresh_url, config.timeout(), session)
            .context("Failed to create API client")
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn base_url(&self) -> &str {
        self.pipeline.transport().base_url()
    }

    /// Runs a request through the pipeline and turns error statuses into
    /// [`ApiError`]s.
    ///
    /// # Errors
    /// Returns an error on transport failure or a non-success status.
    pub async fn execute(&self, request: ApiRequest) -> ApiResult<RawResponse> {
        let response = self.pipeline.execute(request).await?;
        if response.is_success() {
            Ok(response)
        } else {
            Err(ApiError::from_status(response.status, &response.body))
        }
    }

    /// Runs a request and decodes the JSON response body.
    ///
    /// An empty body decodes as JSON `null`.
    ///
    /// # Errors
    /// Returns an error on failure status or an undecodable body.
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> ApiResult<T> {
        let path = request.path.clone();
        let response = self.execute(request).await?;
        decode(&response.body).map_err(|e| {
            let mut err = ApiError::parse(format!("Failed to parse response from {path}: {e}"));
            err.status = Some(response.status);
            err.details = Some(response.body.clone());
            err
        })
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> serde_json::Result<T> {
    if body.trim().is_empty() {
        serde_json::from_str("null")
    } else {
        serde_json::from_str(body)
    }
}
