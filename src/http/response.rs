//! Gateway response emitted back to the caller.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Content type carried by every forwarded response.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusCode(pub u16);

impl StatusCode {
    pub const OK: StatusCode = StatusCode(200);
    pub const BAD_REQUEST: StatusCode = StatusCode(400);
    pub const METHOD_NOT_ALLOWED: StatusCode = StatusCode(405);
    pub const PAYLOAD_TOO_LARGE: StatusCode = StatusCode(413);
    pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode(500);
    pub const BAD_GATEWAY: StatusCode = StatusCode(502);

    /// Check if the status code indicates success (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.0)
    }

    /// Check if the status code indicates a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.0)
    }
}

impl Default for StatusCode {
    fn default() -> Self {
        StatusCode::OK
    }
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> Self {
        StatusCode(code)
    }
}

impl From<StatusCode> for u16 {
    fn from(code: StatusCode) -> Self {
        code.0
    }
}

/// Proxy response in the shape the gateway expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse {
    /// HTTP status code.
    pub status_code: StatusCode,
    /// Whether `body` is base64 encoded. Always false for JSON bodies.
    pub is_base64_encoded: bool,
    /// Response body text.
    pub body: String,
    /// Response headers.
    pub headers: HashMap<String, String>,
}

impl GatewayResponse {
    /// Create an empty response with the given status code.
    pub fn new(status: impl Into<StatusCode>) -> Self {
        Self {
            status_code: status.into(),
            is_base64_encoded: false,
            body: String::new(),
            headers: HashMap::new(),
        }
    }

    /// Wrap a downstream JSON payload: status 200 and the fixed JSON content type.
    pub fn json(payload: &serde_json::Value) -> Result<Self, serde_json::Error> {
        let body = super::json::to_string(payload)?;
        Ok(Self::new(StatusCode::OK)
            .header("content-type", JSON_CONTENT_TYPE)
            .body(body))
    }

    /// Create a plain-text error response.
    pub fn error(status: impl Into<StatusCode>, message: impl Into<String>) -> Self {
        Self::new(status)
            .header("content-type", "text/plain")
            .body(message)
    }

    /// Replace the status code.
    pub fn with_status(mut self, status: impl Into<StatusCode>) -> Self {
        self.status_code = status.into();
        self
    }

    /// Add a header to the response.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set the response body.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }
}
