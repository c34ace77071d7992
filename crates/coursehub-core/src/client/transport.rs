//! HTTP transport over reqwest.

use std::time::Duration;

use super::error::{ApiError, ApiResult};
use super::request::{ApiRequest, RawResponse};

/// Standard User-Agent header for coursehub API requests.
pub const USER_AGENT: &str = concat!("coursehub/", env!("CARGO_PKG_VERSION"));

/// Sends requests to the platform API and buffers responses.
#[derive(Debug)]
pub struct Transport {
    http: reqwest::Client,
    base_url: String,
}

impl Transport {
    /// Creates a transport with a per-request timeout.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::transport(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolves a request path against the base URL.
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{path}", self.base_url)
        } else {
            format!("{}/{path}", self.base_url)
        }
    }

    /// Dispatches a request as-is.
    ///
    /// Any HTTP status is a successful dispatch; only transport failures
    /// are errors here.
    ///
    /// # Errors
    /// Returns an error on connection failure, timeout, or an unreadable body.
    pub async fn send(&self, request: &ApiRequest) -> ApiResult<RawResponse> {
        let url = self.url_for(&request.path);

        let mut builder = self
            .http
            .request(request.method.clone(), &url)
            .headers(request.headers.clone());
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::from_reqwest(&e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::from_reqwest(&e))?;

        tracing::debug!(
            method = %request.method,
            path = %request.path,
            status,
            retried = request.retried,
            "api response"
        );

        Ok(RawResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_for_joins_paths() {
        let transport = Transport::new("http://api.test/api/", Duration::from_secs(5)).unwrap();
        assert_eq!(transport.base_url(), "http://api.test/api");
        assert_eq!(
            transport.url_for("/courses/"),
            "http://api.test/api/courses/"
        );
        assert_eq!(
            transport.url_for("profile/"),
            "http://api.test/api/profile/"
        );
        assert_eq!(
            transport.url_for("https://auth.test/token/refresh/"),
            "https://auth.test/token/refresh/"
        );
    }
}
