//! Gateway function trait, invocation context and error type.

use crate::http::{GatewayEvent, GatewayResponse, StatusCode};
use async_trait::async_trait;
use thiserror::Error;

/// Per-invocation context handed to a gateway function.
#[derive(Debug, Clone, Default)]
pub struct FunctionContext {
    /// Function name.
    pub function_name: String,
    /// Request ID for tracing.
    pub request_id: String,
}

impl FunctionContext {
    /// Create a new function context.
    pub fn new(function_name: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self {
            function_name: function_name.into(),
            request_id: request_id.into(),
        }
    }
}

/// A function invoked once per gateway event.
///
/// Implementations must not keep per-request state: the host shares one
/// instance across concurrent invocations.
#[async_trait]
pub trait GatewayFunction: Send + Sync {
    /// Handle one gateway event.
    async fn invoke(
        &self,
        event: GatewayEvent,
        ctx: &FunctionContext,
    ) -> Result<GatewayResponse, ForwardError>;

    /// Get the function name.
    fn name(&self) -> &str;
}

/// Errors raised while forwarding a gateway event.
///
/// None of these are recovered locally; they surface as a failed invocation.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// A required configuration key is not set.
    #[error("missing required configuration: {0}")]
    MissingConfig(&'static str),

    /// A configuration key holds a value that cannot be used.
    #[error("invalid value `{value}` for {key}")]
    InvalidConfig { key: &'static str, value: String },

    /// The event's method is absent or not one of GET/POST/PUT/DELETE.
    #[error("unsupported HTTP method: {}", .0.as_deref().unwrap_or("<none>"))]
    UnsupportedMethod(Option<String>),

    /// The inbound body is present but not valid JSON.
    #[error("request body is not valid JSON: {0}")]
    InvalidBody(#[source] serde_json::Error),

    /// A forwarded header value cannot be carried in an HTTP header.
    #[error("header `{0}` has a value that cannot be forwarded")]
    InvalidHeader(String),

    /// The raw inbound HTTP request could not be turned into an event.
    #[error("failed to read inbound request: {0}")]
    Inbound(String),

    /// The inbound request body exceeds the host's limit.
    #[error("request body exceeds {0} bytes")]
    PayloadTooLarge(usize),

    /// The downstream call could not be completed.
    #[error("downstream request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// The downstream body is not valid JSON.
    #[error("downstream response is not valid JSON: {0}")]
    Decode(#[source] serde_json::Error),

    /// The response body could not be serialized.
    #[error("failed to encode response: {0}")]
    Encode(#[source] serde_json::Error),
}

impl ForwardError {
    /// HTTP status the host reports for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ForwardError::UnsupportedMethod(_) => StatusCode::METHOD_NOT_ALLOWED,
            ForwardError::InvalidBody(_)
            | ForwardError::InvalidHeader(_)
            | ForwardError::Inbound(_) => StatusCode::BAD_REQUEST,
            ForwardError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ForwardError::Transport(_) | ForwardError::Decode(_) => StatusCode::BAD_GATEWAY,
            ForwardError::MissingConfig(_)
            | ForwardError::InvalidConfig { .. }
            | ForwardError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short error type name, as reported in invocation error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            ForwardError::MissingConfig(_) => "MissingConfig",
            ForwardError::InvalidConfig { .. } => "InvalidConfig",
            ForwardError::UnsupportedMethod(_) => "UnsupportedMethod",
            ForwardError::InvalidBody(_) => "InvalidBody",
            ForwardError::InvalidHeader(_) => "InvalidHeader",
            ForwardError::Inbound(_) => "Inbound",
            ForwardError::PayloadTooLarge(_) => "PayloadTooLarge",
            ForwardError::Transport(_) => "Transport",
            ForwardError::Decode(_) => "Decode",
            ForwardError::Encode(_) => "Encode",
        }
    }
}

impl From<ForwardError> for GatewayResponse {
    fn from(err: ForwardError) -> Self {
        GatewayResponse::error(err.status_code(), err.to_string())
    }
}
