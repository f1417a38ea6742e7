//! The request forwarder: one gateway event in, one downstream call out.

use crate::function::handler::{ForwardError, FunctionContext, GatewayFunction};
use crate::http::{GatewayEvent, GatewayResponse, Method};
use crate::runtime::ForwarderConfig;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Inbound headers copied to the downstream call. Everything else is dropped.
pub const FORWARDED_HEADERS: [&str; 2] = ["authorization", "content-type"];

/// The downstream call derived from a gateway event.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundRequest {
    /// Method of the downstream call.
    pub method: Method,
    /// Base URL followed by the event path.
    pub url: String,
    /// Forwarded subset of the inbound headers.
    pub headers: BTreeMap<String, String>,
    /// JSON body. Always `None` for GET.
    pub body: Option<Value>,
    /// Query parameters, lists expanded into repeated keys.
    pub query: Vec<(String, String)>,
}

impl OutboundRequest {
    /// Build the downstream call for `event` against `config`.
    ///
    /// A present, non-empty body is parsed as JSON even for GET, where it is
    /// then discarded. Body-carrying methods without an inbound body send `{}`.
    pub fn from_event(event: &GatewayEvent, config: &ForwarderConfig) -> Result<Self, ForwardError> {
        let mut headers = BTreeMap::new();
        for name in FORWARDED_HEADERS {
            if let Some(value) = event.get_header(name) {
                headers.insert(name.to_string(), value.to_string());
            }
        }

        let body = event
            .json_body()
            .transpose()
            .map_err(ForwardError::InvalidBody)?;

        let method = event
            .method()
            .ok_or_else(|| ForwardError::UnsupportedMethod(event.http_method.clone()))?;

        let body = if method.sends_body() {
            Some(body.unwrap_or_else(|| Value::Object(Default::default())))
        } else {
            None
        };

        Ok(Self {
            method,
            url: config.target_url(&event.path),
            headers,
            body,
            query: event.query_pairs(),
        })
    }

    fn header_map(&self) -> Result<HeaderMap, ForwardError> {
        let mut map = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in &self.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ForwardError::InvalidHeader(name.clone()))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|_| ForwardError::InvalidHeader(name.clone()))?;
            map.insert(header_name, header_value);
        }
        Ok(map)
    }
}

/// Forwards gateway events to `base_url + path` and wraps the JSON answer.
///
/// The forwarder holds no per-request state and can be shared across
/// concurrent invocations.
#[derive(Debug, Clone)]
pub struct Forwarder {
    config: ForwarderConfig,
    client: reqwest::Client,
}

impl Forwarder {
    /// Create a forwarder with a default HTTP client.
    pub fn new(config: ForwarderConfig) -> Self {
        Self::with_client(config, reqwest::Client::new())
    }

    /// Create a forwarder using an existing HTTP client.
    pub fn with_client(config: ForwarderConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    /// Create a forwarder configured from the process environment.
    pub fn from_env() -> Result<Self, ForwardError> {
        Ok(Self::new(ForwarderConfig::from_env()?))
    }

    /// Get the forwarder configuration.
    pub fn config(&self) -> &ForwarderConfig {
        &self.config
    }

    /// Forward one event and wrap the downstream JSON body.
    ///
    /// The response status is 200 whatever the downstream answered, unless
    /// `preserve_status` is set.
    pub async fn forward(&self, event: &GatewayEvent) -> Result<GatewayResponse, ForwardError> {
        let outbound = OutboundRequest::from_event(event, &self.config)?;
        debug!(
            method = %outbound.method,
            url = %outbound.url,
            headers = ?outbound.headers.keys().collect::<Vec<_>>(),
            params = outbound.query.len(),
            "Forwarding request downstream"
        );

        let downstream = self.send(&outbound).await?;
        let status = downstream.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), url = %outbound.url, "Downstream returned non-success status");
        }

        let bytes = downstream.bytes().await.map_err(ForwardError::Transport)?;
        let payload: Value = serde_json::from_slice(&bytes).map_err(|e| {
            warn!(status = status.as_u16(), url = %outbound.url, "Downstream body is not JSON: {}", e);
            ForwardError::Decode(e)
        })?;

        let response = GatewayResponse::json(&payload).map_err(ForwardError::Encode)?;
        if self.config.preserve_status {
            Ok(response.with_status(status.as_u16()))
        } else {
            Ok(response)
        }
    }

    async fn send(&self, outbound: &OutboundRequest) -> Result<reqwest::Response, ForwardError> {
        // Headers go first so `json()` keeps a forwarded content-type.
        let mut builder = self
            .client
            .request(outbound.method.into(), outbound.url.as_str())
            .headers(outbound.header_map()?);

        if !outbound.query.is_empty() {
            builder = builder.query(&outbound.query);
        }
        if let Some(body) = &outbound.body {
            builder = builder.json(body);
        }

        builder.send().await.map_err(ForwardError::Transport)
    }
}

#[async_trait]
impl GatewayFunction for Forwarder {
    async fn invoke(
        &self,
        event: GatewayEvent,
        ctx: &FunctionContext,
    ) -> Result<GatewayResponse, ForwardError> {
        debug!(request_id = %ctx.request_id, path = %event.path, "Invoking forwarder");
        self.forward(&event).await
    }

    fn name(&self) -> &str {
        "lambda-proxy"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config() -> ForwarderConfig {
        ForwarderConfig::new("https://api.example.com/prod")
    }

    #[test]
    fn test_get_drops_body_and_builds_url() {
        let event = GatewayEvent::new("GET", "/items")
            .body(r#"{"ignored":true}"#)
            .query("id", "42");
        let outbound = OutboundRequest::from_event(&event, &config()).unwrap();

        assert_eq!(outbound.method, Method::Get);
        assert_eq!(outbound.url, "https://api.example.com/prod/items");
        assert_eq!(outbound.body, None);
        assert_eq!(outbound.query, vec![("id".to_string(), "42".to_string())]);
    }

    #[test]
    fn test_only_allowed_headers_are_forwarded() {
        let event = GatewayEvent::new("POST", "/items")
            .header("authorization", "Bearer t")
            .header("content-type", "application/json")
            .header("x-amzn-trace-id", "Root=1")
            .header("Authorization", "Bearer other");
        let outbound = OutboundRequest::from_event(&event, &config()).unwrap();

        assert_eq!(outbound.headers.len(), 2);
        assert_eq!(outbound.headers["authorization"], "Bearer t");
        assert_eq!(outbound.headers["content-type"], "application/json");
    }

    #[test]
    fn test_body_methods_send_parsed_json() {
        for method in ["POST", "PUT", "DELETE"] {
            let event = GatewayEvent::new(method, "/items").body(r#"{"name":"widget","n":[1,2]}"#);
            let outbound = OutboundRequest::from_event(&event, &config()).unwrap();
            assert_eq!(outbound.body, Some(json!({"name": "widget", "n": [1, 2]})));
        }
    }

    #[test]
    fn test_body_methods_without_body_send_empty_object() {
        let missing = GatewayEvent::new("PUT", "/items/1");
        let empty = GatewayEvent::new("DELETE", "/items/1").body("");

        for event in [missing, empty] {
            let outbound = OutboundRequest::from_event(&event, &config()).unwrap();
            assert_eq!(outbound.body, Some(json!({})));
        }
    }

    #[test]
    fn test_unsupported_method() {
        let event = GatewayEvent::new("PATCH", "/items/1");
        let err = OutboundRequest::from_event(&event, &config()).unwrap_err();
        assert!(matches!(err, ForwardError::UnsupportedMethod(Some(ref m)) if m == "PATCH"));

        let event = GatewayEvent {
            path: "/items".into(),
            ..Default::default()
        };
        let err = OutboundRequest::from_event(&event, &config()).unwrap_err();
        assert!(matches!(err, ForwardError::UnsupportedMethod(None)));
    }

    #[test]
    fn test_invalid_inbound_body() {
        let event = GatewayEvent::new("POST", "/items").body("{not json");
        let err = OutboundRequest::from_event(&event, &config()).unwrap_err();
        assert!(matches!(err, ForwardError::InvalidBody(_)));
    }

    #[test]
    fn test_invalid_header_value() {
        let event = GatewayEvent::new("GET", "/items").header("authorization", "Bearer\nx");
        let outbound = OutboundRequest::from_event(&event, &config()).unwrap();
        let err = outbound.header_map().unwrap_err();
        assert!(matches!(err, ForwardError::InvalidHeader(ref name) if name == "authorization"));
    }

    #[tokio::test]
    async fn test_unsupported_method_makes_no_call() {
        // Nothing listens here; reaching the network would surface a transport error.
        let forwarder = Forwarder::new(ForwarderConfig::new("http://127.0.0.1:9"));
        let err = forwarder
            .forward(&GatewayEvent::new("PATCH", "/items/1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ForwardError::UnsupportedMethod(_)));
    }
}
