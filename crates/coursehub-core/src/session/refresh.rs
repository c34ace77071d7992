//! Recovery from expired access tokens.
//!
//! A 401 on a non-public request that has not been replayed yet triggers a
//! refresh exchange followed by one replay. Concurrent failures share one
//! exchange: the refresh gate on the session serializes them, and a waiter
//! whose request carried a token that has since been replaced replays with
//! the new token without calling the endpoint again.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde::Deserialize;
use serde_json::json;

use super::SessionHandle;
use crate::client::{
    ApiError, ApiRequest, ApiResult, RawResponse, ResponseAction, ResponseStage, Transport,
};

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access: Option<String>,
    /// Present when the server rotates refresh tokens
    refresh: Option<String>,
}

/// Exchanges the refresh token for a new access token.
#[derive(Debug, Clone)]
pub struct RefreshCoordinator {
    session: SessionHandle,
    transport: Arc<Transport>,
    refresh_url: String,
}

impl RefreshCoordinator {
    pub fn new(
        session: SessionHandle,
        transport: Arc<Transport>,
        refresh_url: impl Into<String>,
    ) -> Self {
        Self {
            session,
            transport,
            refresh_url: refresh_url.into(),
        }
    }

    /// Returns a fresh access token for a request that was sent with
    /// `stale_access`.
    ///
    /// # Errors
    /// Returns an error if no refresh token is stored, or the exchange
    /// fails or returns no access token. The session is left untouched;
    /// the caller decides whether to log out.
    pub async fn refresh(&self, stale_access: Option<&str>) -> ApiResult<String> {
        let _gate = self.session.refresh_gate().await;

        let Some(current) = self.session.current() else {
            return Err(ApiError::unauthorized("No refresh token available"));
        };

        if stale_access != Some(current.access_token.as_str()) {
            tracing::debug!("access token already replaced, reusing it");
            return Ok(current.access_token);
        }

        if current.refresh_token.is_empty() {
            return Err(ApiError::unauthorized("No refresh token available"));
        }

        tracing::debug!("exchanging refresh token");
        let request = ApiRequest::post(
            self.refresh_url.clone(),
            json!({ "refresh": current.refresh_token }),
        )
        .public();
        let response = self.transport.send(&request).await?;
        if !response.is_success() {
            return Err(ApiError::from_status(response.status, &response.body));
        }

        let body: RefreshResponse = serde_json::from_str(&response.body)
            .map_err(|e| ApiError::parse(format!("Failed to parse refresh response: {e}")))?;
        let access = body
            .access
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ApiError::invalid_response("Refresh response has no access token"))?;

        if !self.session.replace_access_token(
            &current.refresh_token,
            access.clone(),
            body.refresh.filter(|token| !token.is_empty()),
        ) {
            return Err(ApiError::unauthorized("Session ended during token refresh"));
        }

        tracing::info!("access token refreshed");
        Ok(access)
    }
}

impl ResponseStage for RefreshCoordinator {
    fn on_response<'a>(
        &'a self,
        request: &'a ApiRequest,
        response: &'a RawResponse,
    ) -> BoxFuture<'a, ResponseAction> {
        Box::pin(async move {
            if !response.is_unauthorized() || request.public || request.retried {
                return ResponseAction::Accept;
            }

            match self.refresh(request.bearer_token()).await {
                Ok(_) => ResponseAction::Retry,
                Err(e) => {
                    tracing::warn!("Token refresh failed, logging out: {e}");
                    self.session.logout();
                    ResponseAction::Accept
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::session::{MemoryTokenStore, Session};

    async fn coordinator(server: &MockServer, session: &SessionHandle) -> RefreshCoordinator {
        let transport =
            Arc::new(Transport::new(server.uri(), Duration::from_secs(5)).unwrap());
        RefreshCoordinator::new(
            session.clone(),
            transport,
            format!("{}/token/refresh/", server.uri()),
        )
    }

    #[tokio::test]
    async fn test_refresh_replaces_access_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token/refresh/"))
            .and(body_json(json!({ "refresh": "R1" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access": "A2" })))
            .expect(1)
            .mount(&server)
            .await;

        let session =
            SessionHandle::initialize(MemoryTokenStore::with_session(Session::new("A1", "R1")));
        let token = coordinator(&server, &session)
            .await
            .refresh(Some("A1"))
            .await
            .unwrap();

        assert_eq!(token, "A2");
        assert_eq!(session.current(), Some(Session::new("A2", "R1")));
    }

    #[tokio::test]
    async fn test_refresh_skips_exchange_when_token_already_replaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token/refresh/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access": "A3" })))
            .expect(0)
            .mount(&server)
            .await;

        let session =
            SessionHandle::initialize(MemoryTokenStore::with_session(Session::new("A2", "R1")));
        let token = coordinator(&server, &session)
            .await
            .refresh(Some("A1"))
            .await
            .unwrap();

        assert_eq!(token, "A2");
    }

    #[tokio::test]
    async fn test_refresh_without_session_fails_without_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let session = SessionHandle::initialize(MemoryTokenStore::new());
        let err = coordinator(&server, &session)
            .await
            .refresh(None)
            .await
            .unwrap_err();

        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_rejected_refresh_leaves_session_to_caller() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token/refresh/"))
            .respond_with(ResponseTemplate::new(401).set_body_json(
                json!({ "detail": "Token is invalid or expired", "code": "token_not_valid" }),
            ))
            .mount(&server)
            .await;

        let session =
            SessionHandle::initialize(MemoryTokenStore::with_session(Session::new("A1", "R1")));
        let err = coordinator(&server, &session)
            .await
            .refresh(Some("A1"))
            .await
            .unwrap_err();

        assert_eq!(err.status, Some(401));
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn test_missing_access_in_refresh_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token/refresh/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let session =
            SessionHandle::initialize(MemoryTokenStore::with_session(Session::new("A1", "R1")));
        let err = coordinator(&server, &session)
            .await
            .refresh(Some("A1"))
            .await
            .unwrap_err();

        assert_eq!(err.kind, crate::client::ApiErrorKind::InvalidResponse);
        assert_eq!(session.access_token().as_deref(), Some("A1"));
    }

    #[tokio::test]
    async fn test_stage_ignores_public_and_retried_requests() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access": "A2" })))
            .expect(0)
            .mount(&server)
            .await;

        let session =
            SessionHandle::initialize(MemoryTokenStore::with_session(Session::new("A1", "R1")));
        let stage = coordinator(&server, &session).await;
        let unauthorized = RawResponse {
            status: 401,
            body: String::new(),
        };

        let public = ApiRequest::get("/token/").public();
        assert_eq!(
            stage.on_response(&public, &unauthorized).await,
            ResponseAction::Accept
        );

        let mut retried = ApiRequest::get("/courses/");
        retried.retried = true;
        assert_eq!(
            stage.on_response(&retried, &unauthorized).await,
            ResponseAction::Accept
        );
        assert!(session.is_authenticated());
    }
}
