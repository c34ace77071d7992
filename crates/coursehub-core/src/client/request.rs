//! Request and response values passed through the middleware pipeline.

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, HeaderMap};
use serde_json::Value;

/// An outbound API call.
///
/// Carries its full original configuration so the pipeline can replay it
/// once with a fresh access token.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Endpoint path appended to the base URL, or an absolute URL
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub headers: HeaderMap,
    /// Public requests (login, signup, refresh) never carry credentials and
    /// are never refreshed-and-retried.
    pub public: bool,
    /// Set once the pipeline has replayed this request.
    pub retried: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            headers: HeaderMap::new(),
            public: false,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, path).json(body)
    }

    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PATCH, path).json(body)
    }

    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    #[must_use]
    pub fn public(mut self) -> Self {
        self.public = true;
        self
    }

    /// Bearer token attached to this request, if any.
    pub fn bearer_token(&self) -> Option<&str> {
        self.headers
            .get(AUTHORIZATION)?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")
    }
}

/// A received response, fully buffered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }
}

#[cfg(test)]
mod tests {
    use reqwest::header::HeaderValue;

    use super::*;

    #[test]
    fn test_bearer_token_extraction() {
        let mut request = ApiRequest::get("/courses/");
        assert_eq!(request.bearer_token(), None);

        request
            .headers
            .insert(AUTHORIZATION, HeaderValue::from_static("Bearer A1"));
        assert_eq!(request.bearer_token(), Some("A1"));

        request
            .headers
            .insert(AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(request.bearer_token(), None);
    }

    #[test]
    fn test_builder_helpers() {
        let request = ApiRequest::get("/lessons/").query("course", 7).public();
        assert_eq!(request.method, Method::GET);
        assert_eq!(request.query, vec![("course".to_string(), "7".to_string())]);
        assert!(request.public);
        assert!(!request.retried);
    }
}
