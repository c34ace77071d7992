//! Error taxonomy for calls against the platform API.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Matches the traceback block of an HTML debug error page.
static PRE_BLOCK: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)<pre[^>]*>(.*?)</pre>").ok());

/// Categories of API errors for consistent handling by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    /// Connection refused, DNS failure, broken body stream
    Transport,
    /// Request exceeded the configured timeout
    Timeout,
    /// HTTP 401, or identity missing from the session
    Unauthorized,
    /// HTTP 400 or a local form check
    Validation,
    /// HTTP 404, or a record missing from a listing
    NotFound,
    /// HTTP 5xx
    Server,
    /// Any other non-success status
    Http,
    /// Response body could not be decoded
    Parse,
    /// Response decoded but lacks data the operation needs
    InvalidResponse,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ApiErrorKind::Transport => "transport",
            ApiErrorKind::Timeout => "timeout",
            ApiErrorKind::Unauthorized => "unauthorized",
            ApiErrorKind::Validation => "validation",
            ApiErrorKind::NotFound => "not_found",
            ApiErrorKind::Server => "server",
            ApiErrorKind::Http => "http_status",
            ApiErrorKind::Parse => "parse",
            ApiErrorKind::InvalidResponse => "invalid_response",
        };
        f.write_str(label)
    }
}

/// Structured error from the API client with kind and details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error category
    pub kind: ApiErrorKind,
    /// HTTP status when the error came from a response
    pub status: Option<u16>,
    /// One-line summary suitable for display
    pub message: String,
    /// Raw response body, when there was one
    pub details: Option<String>,
    /// Field-level validation messages, verbatim from the server
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, Vec<String>>,
}

impl ApiError {
    /// Creates a new error without status or details.
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status: None,
            message: message.into(),
            details: None,
            fields: BTreeMap::new(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Transport, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Timeout, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Parse, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::InvalidResponse, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::NotFound, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Unauthorized, message)
    }

    /// Creates a validation error from local field checks.
    pub fn validation(message: impl Into<String>, fields: BTreeMap<String, Vec<String>>) -> Self {
        Self {
            fields,
            ..Self::new(ApiErrorKind::Validation, message)
        }
    }

    /// Classifies a non-success HTTP response.
    pub fn from_status(status: u16, body: &str) -> Self {
        let kind = match status {
            400 => ApiErrorKind::Validation,
            401 => ApiErrorKind::Unauthorized,
            404 => ApiErrorKind::NotFound,
            500..=599 => ApiErrorKind::Server,
            _ => ApiErrorKind::Http,
        };

        let json = serde_json::from_str::<Value>(body).ok();
        let fields = if kind == ApiErrorKind::Validation {
            json.as_ref().map(field_errors).unwrap_or_default()
        } else {
            BTreeMap::new()
        };

        let message = match kind {
            ApiErrorKind::Server => server_message(json.as_ref(), body)
                .unwrap_or_else(|| format!("HTTP {status}: server error")),
            ApiErrorKind::Validation if !fields.is_empty() => fields
                .iter()
                .map(|(field, msgs)| format!("{field}: {}", msgs.join(", ")))
                .collect::<Vec<_>>()
                .join("\n"),
            _ => json
                .as_ref()
                .and_then(detail_message)
                .map_or_else(|| format!("HTTP {status}"), |m| format!("HTTP {status}: {m}")),
        };

        Self {
            kind,
            status: Some(status),
            message,
            details: (!body.is_empty()).then(|| body.to_string()),
            fields,
        }
    }

    /// Classifies a reqwest failure that produced no response.
    pub fn from_reqwest(e: &reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::timeout(format!("Request timed out: {e}"))
        } else if e.is_connect() {
            Self::transport(format!("Connection failed: {e}"))
        } else if e.is_decode() {
            Self::parse(format!("Failed to decode response: {e}"))
        } else if e.is_request() {
            Self::transport(format!("Request error: {e}"))
        } else {
            Self::transport(format!("Network error: {e}"))
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind == ApiErrorKind::Unauthorized
    }

    /// Message shown to a person, mirroring the web client's wording.
    pub fn user_message(&self) -> String {
        match self.kind {
            ApiErrorKind::Unauthorized if self.status.is_some() => {
                "Your session has expired. Please log in again.".to_string()
            }
            ApiErrorKind::Transport | ApiErrorKind::Timeout => {
                format!("Could not reach the server ({}).", self.message)
            }
            _ => self.message.clone(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for API operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Keys that carry a whole-request message rather than a field error.
const DETAIL_KEYS: [&str; 3] = ["detail", "error", "message"];

/// Returns `detail`, `error` or `message` from a JSON error body.
fn detail_message(json: &Value) -> Option<String> {
    DETAIL_KEYS
        .iter()
        .find_map(|key| json.get(key).and_then(Value::as_str))
        .map(str::to_string)
}

/// Collects `{"field": ["msg", ...]}` pairs from a DRF validation body.
fn field_errors(json: &Value) -> BTreeMap<String, Vec<String>> {
    let Some(obj) = json.as_object() else {
        return BTreeMap::new();
    };

    obj.iter()
        .filter(|(field, _)| !DETAIL_KEYS.contains(&field.as_str()))
        .filter_map(|(field, value)| {
            let msgs: Vec<String> = match value {
                Value::String(s) => vec![s.clone()],
                Value::Array(items) => items
                    .iter()
                    .map(|item| match item {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
                _ => return None,
            };
            (!msgs.is_empty()).then(|| (field.clone(), msgs))
        })
        .collect()
}

fn server_message(json: Option<&Value>, body: &str) -> Option<String> {
    if let Some(message) = json.and_then(detail_message) {
        return Some(message);
    }

    PRE_BLOCK
        .as_ref()?
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|m| !m.is_empty())
}
