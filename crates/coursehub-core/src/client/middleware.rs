//! Explicit middleware chain around the transport.
//!
//! A [`Pipeline`] runs every [`RequestStage`] over a copy of the original
//! request, dispatches it, then lets each [`ResponseStage`] inspect the
//! response. A response stage may ask for the request to be replayed; the
//! pipeline honours that at most once per request.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderValue, USER_AGENT as USER_AGENT_HEADER};

use super::error::ApiResult;
use super::request::{ApiRequest, RawResponse};
use super::transport::{Transport, USER_AGENT};
use crate::session::SessionHandle;

/// Transforms an outgoing request before dispatch.
pub trait RequestStage: Send + Sync {
    fn on_request(&self, request: &mut ApiRequest);
}

/// What the pipeline should do with a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseAction {
    /// Hand the response to the caller
    Accept,
    /// Replay the original request (ignored once it has been replayed)
    Retry,
}

/// Inspects a response. `request` is the request exactly as dispatched.
pub trait ResponseStage: Send + Sync {
    fn on_response<'a>(
        &'a self,
        request: &'a ApiRequest,
        response: &'a RawResponse,
    ) -> BoxFuture<'a, ResponseAction>;
}

/// Sets `User-Agent` and `Accept` unless the request already has them.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultHeaders;

impl RequestStage for DefaultHeaders {
    fn on_request(&self, request: &mut ApiRequest) {
        request
            .headers
            .entry(USER_AGENT_HEADER)
            .or_insert(HeaderValue::from_static(USER_AGENT));
        request
            .headers
            .entry(ACCEPT)
            .or_insert(HeaderValue::from_static("application/json"));
    }
}

/// Attaches `Authorization: Bearer <access token>` when a session exists.
#[derive(Debug, Clone)]
pub struct BearerAuth {
    session: SessionHandle,
}

impl BearerAuth {
    pub fn new(session: SessionHandle) -> Self {
        Self { session }
    }
}

impl RequestStage for BearerAuth {
    fn on_request(&self, request: &mut ApiRequest) {
        if request.public {
            request.headers.remove(AUTHORIZATION);
            return;
        }

        let Some(token) = self.session.access_token() else {
            return;
        };

        match HeaderValue::from_str(&format!("Bearer {token}")) {
            Ok(mut value) => {
                value.set_sensitive(true);
                request.headers.insert(AUTHORIZATION, value);
            }
            Err(_) => tracing::warn!("Stored access token is not a valid header value"),
        }
    }
}

/// Request/response stages composed around a transport.
#[derive(Clone)]
pub struct Pipeline {
    transport: Arc<Transport>,
    request_stages: Vec<Arc<dyn RequestStage>>,
    response_stages: Vec<Arc<dyn ResponseStage>>,
}

impl Pipeline {
    pub fn new(transport: Arc<Transport>) -> Self {
        Self {
            transport,
            request_stages: Vec::new(),
            response_stages: Vec::new(),
        }
    }

    /// Appends a request stage; stages run in insertion order.
    #[must_use]
    pub fn with_request_stage(mut self, stage: impl RequestStage + 'static) -> Self {
        self.request_stages.push(Arc::new(stage));
        self
    }

    /// Appends a response stage; the first stage asking for a retry wins.
    #[must_use]
    pub fn with_response_stage(mut self, stage: impl ResponseStage + 'static) -> Self {
        self.response_stages.push(Arc::new(stage));
        self
    }

    pub fn transport(&self) -> &Arc<Transport> {
        &self.transport
    }

    /// Runs a request through the chain: dispatch, optional single replay,
    /// final response.
    ///
    /// # Errors
    /// Returns transport failures only; HTTP error statuses are returned as
    /// responses.
    pub async fn execute(&self, mut request: ApiRequest) -> ApiResult<RawResponse> {
        loop {
            let mut outgoing = request.clone();
            for stage in &self.request_stages {
                stage.on_request(&mut outgoing);
            }

            let response = self.transport.send(&outgoing).await?;

            let mut action = ResponseAction::Accept;
            for stage in &self.response_stages {
                if stage.on_response(&outgoing, &response).await == ResponseAction::Retry {
                    action = ResponseAction::Retry;
                    break;
                }
            }

            if action == ResponseAction::Retry && !request.retried {
                tracing::debug!(path = %request.path, "replaying request");
                request.retried = true;
                continue;
            }

            return Ok(response);
        }
    }
}
