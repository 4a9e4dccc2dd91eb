//! Error types for the request gateway.
//!
//! # Design
//! `ApiError` is the single shape every failed call resolves to. Its `code`
//! is one of the fixed sentinels below, `HTTP_<status>`, or a code the
//! server supplied in a JSON error body. Transport and configuration
//! failures get their own enums so the transport seam and the config layer
//! stay independent of the classification rules.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// No response was obtained (DNS, refused connection, reset, timeout).
pub const NETWORK_ERROR: &str = "NETWORK_ERROR";

/// Anything that is neither a transport failure nor a classified HTTP
/// status, e.g. a malformed JSON body on a 2xx response.
pub const UNKNOWN_ERROR: &str = "UNKNOWN_ERROR";

/// Coarse classification of an `ApiError`, derived from its code and status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Http,
    Unknown,
}

/// A classified failure returned by every gateway call.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct ApiError {
    code: String,
    message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
}

impl ApiError {
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            code: NETWORK_ERROR.to_string(),
            message: message.into(),
            details: None,
            status: None,
        }
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self {
            code: UNKNOWN_ERROR.to_string(),
            message: message.into(),
            details: None,
            status: None,
        }
    }

    /// An error for a response that carried a non-success status.
    pub fn http(
        status: u16,
        code: impl Into<String>,
        message: impl Into<String>,
        details: Option<Value>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details,
            status: Some(status),
        }
    }

    /// `HTTP_<status>`, the code used when the server supplies none.
    pub fn http_code(status: u16) -> String {
        format!("HTTP_{status}")
    }

    /// Message used when the server supplies none.
    pub fn fallback_message(status: u16) -> String {
        format!("Request failed with status {status}")
    }

    pub(crate) fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// HTTP status of the response, if one was obtained.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn kind(&self) -> ErrorKind {
        if self.code == NETWORK_ERROR {
            ErrorKind::Network
        } else if self.code == UNKNOWN_ERROR || self.status.is_none() {
            ErrorKind::Unknown
        } else {
            ErrorKind::Http
        }
    }

    pub fn is_network_error(&self) -> bool {
        self.kind() == ErrorKind::Network
    }

    /// True for 401 and 403 responses.
    pub fn is_auth_error(&self) -> bool {
        matches!(self.status, Some(401) | Some(403))
    }

    pub fn is_server_error(&self) -> bool {
        matches!(self.status, Some(s) if s >= 500)
    }
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::InvalidRequest(_) => ApiError::unknown(err.to_string()),
            _ => ApiError::network(err.to_string()),
        }
    }
}

/// Permissive schema for JSON error bodies. Unknown fields are ignored;
/// `code` and `message` must be strings when present. A `details` key that
/// is present is kept verbatim, `null` included.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub(crate) code: Option<String>,
    #[serde(default)]
    pub(crate) message: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub(crate) details: Option<Value>,
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Failures raised by a `Transport` before a response was obtained.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request timed out")]
    Timeout,

    /// The connection broke while sending the request or reading the body.
    #[error("transfer failed: {0}")]
    Body(String),

    /// The request could not be built (bad URL, invalid header value).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else if err.is_builder() {
            TransportError::InvalidRequest(err.to_string())
        } else if err.is_body() || err.is_decode() {
            TransportError::Body(err.to_string())
        } else {
            TransportError::Connect(err.to_string())
        }
    }
}

/// Errors raised while resolving `GatewayConfig` or building the gateway.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid base url {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("invalid value for {var}: {value:?}")]
    InvalidVar { var: &'static str, value: String },

    #[error("failed to build http client: {0}")]
    Client(String),
}
