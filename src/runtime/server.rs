//! Local HTTP host running a gateway function.
//!
//! Three kinds of requests are served:
//!
//! - `GET /_health` answers `OK`.
//! - `POST /_invoke` takes a raw gateway event as its JSON body and answers with
//!   the gateway response as JSON, the way a gateway runtime invokes a function.
//! - Anything else is turned into a gateway event and the function's response
//!   is written back as a plain HTTP response.

use crate::function::{ForwardError, FunctionContext, GatewayFunction};
use crate::http::{parse_query_string, GatewayEvent, GatewayResponse, StatusCode};
use crate::runtime::HostConfig;
use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use serde::Serialize;
use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

/// Path accepting raw gateway events.
pub const INVOKE_PATH: &str = "/_invoke";
const HEALTH_PATH: &str = "/_health";

/// HTTP host for a single gateway function.
pub struct FunctionHost {
    /// Host configuration.
    config: HostConfig,
    /// The hosted function.
    function: Arc<dyn GatewayFunction>,
}

impl FunctionHost {
    /// Create a host for `function`.
    pub fn new(config: HostConfig, function: Arc<dyn GatewayFunction>) -> Self {
        Self { config, function }
    }

    /// Bind the configured address and serve until the process stops.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr: SocketAddr = self.config.bind_addr().parse()?;
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener).await
    }

    /// Serve connections accepted on an already bound listener.
    pub async fn serve(
        self,
        listener: TcpListener,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        info!(
            "Function host for '{}' listening on {}",
            self.function.name(),
            listener.local_addr()?
        );

        let function = self.function.clone();
        let config = Arc::new(self.config);

        loop {
            let (stream, remote_addr) = listener.accept().await?;
            let io = TokioIo::new(stream);

            let function = function.clone();
            let config = config.clone();

            tokio::task::spawn(async move {
                let service = service_fn(move |req| {
                    let function = function.clone();
                    let config = config.clone();
                    async move { handle_request(req, function, config, remote_addr).await }
                });

                if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                    error!("Error serving connection: {:?}", err);
                }
            });
        }
    }
}

/// Handle an incoming HTTP request.
async fn handle_request(
    req: Request<Incoming>,
    function: Arc<dyn GatewayFunction>,
    config: Arc<HostConfig>,
    remote_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let path = req.uri().path().to_string();
    let method = req.method().clone();
    let request_id = generate_request_id();
    let ctx = FunctionContext::new(function.name(), &request_id);

    debug!(
        "Handling request for '{}': {} {} from {} [{}]",
        ctx.function_name, method, path, remote_addr, request_id
    );

    if config.enable_health && path == HEALTH_PATH {
        return Ok(build_response(
            GatewayResponse::new(StatusCode::OK)
                .header("content-type", "text/plain")
                .body("OK"),
        ));
    }

    if method == hyper::Method::POST && path == INVOKE_PATH {
        return Ok(match invoke_raw_event(req, function.as_ref(), &config, &ctx).await {
            Ok(response) => json_response(StatusCode::OK, &response),
            Err(e) => {
                error!(
                    "Function '{}' invocation failed: {} [{}]",
                    ctx.function_name, e, request_id
                );
                json_response(
                    e.status_code(),
                    &serde_json::json!({
                        "errorType": e.kind(),
                        "errorMessage": e.to_string(),
                    }),
                )
            }
        });
    }

    let event = match convert_request(req, &config).await {
        Ok(event) => event,
        Err(e) => {
            warn!("Failed to convert request: {} [{}]", e, request_id);
            return Ok(build_response(e.into()));
        }
    };

    match function.invoke(event, &ctx).await {
        Ok(response) => Ok(build_response(response)),
        Err(e) => {
            error!(
                "Function '{}' error: {} [{}]",
                ctx.function_name, e, request_id
            );
            Ok(build_response(e.into()))
        }
    }
}

/// Decode a raw gateway event from the request body and invoke the function.
async fn invoke_raw_event(
    req: Request<Incoming>,
    function: &dyn GatewayFunction,
    config: &HostConfig,
    ctx: &FunctionContext,
) -> Result<GatewayResponse, ForwardError> {
    let bytes = read_body(req.into_body(), config.max_body_size).await?;
    let event: GatewayEvent = serde_json::from_slice(&bytes)
        .map_err(|e| ForwardError::Inbound(format!("invalid gateway event: {}", e)))?;
    function.invoke(event, ctx).await
}

/// Convert a hyper Request to a GatewayEvent.
///
/// A header sent more than once keeps only its last value.
async fn convert_request(
    req: Request<Incoming>,
    config: &HostConfig,
) -> Result<GatewayEvent, ForwardError> {
    let (parts, body) = req.into_parts();

    let mut headers = HashMap::new();
    for (name, value) in &parts.headers {
        if let Ok(v) = value.to_str() {
            headers.insert(name.as_str().to_string(), v.to_string());
        }
    }

    let query_string_parameters = parts
        .uri
        .query()
        .map(parse_query_string)
        .filter(|params| !params.is_empty());

    let bytes = read_body(body, config.max_body_size).await?;
    let body = if bytes.is_empty() {
        None
    } else {
        Some(
            String::from_utf8(bytes.to_vec())
                .map_err(|_| ForwardError::Inbound("request body is not UTF-8".to_string()))?,
        )
    };

    Ok(GatewayEvent {
        path: parts.uri.path().to_string(),
        http_method: Some(parts.method.as_str().to_string()),
        headers: Some(headers),
        body,
        query_string_parameters,
    })
}

/// Collect a request body, failing as soon as it grows past `max_body_size`.
async fn read_body<B>(body: B, max_body_size: usize) -> Result<Bytes, ForwardError>
where
    B: hyper::body::Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match Limited::new(body, max_body_size).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            Err(ForwardError::PayloadTooLarge(max_body_size))
        }
        Err(e) => Err(ForwardError::Inbound(e.to_string())),
    }
}

fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Response<Full<Bytes>> {
    match serde_json::to_string(value) {
        Ok(body) => build_response(
            GatewayResponse::new(status)
                .header("content-type", "application/json")
                .body(body),
        ),
        Err(e) => build_response(GatewayResponse::error(
            StatusCode::INTERNAL_SERVER_ERROR,
            e.to_string(),
        )),
    }
}

/// Build a hyper Response from a GatewayResponse.
fn build_response(response: GatewayResponse) -> Response<Full<Bytes>> {
    let status = hyper::StatusCode::from_u16(response.status_code.0).unwrap_or_else(|_| {
        warn!(
            "Invalid status code {}, falling back to 500 Internal Server Error",
            response.status_code.0
        );
        hyper::StatusCode::INTERNAL_SERVER_ERROR
    });

    let mut builder = Response::builder().status(status);
    for (name, value) in response.headers {
        builder = builder.header(name, value);
    }

    builder
        .body(Full::new(Bytes::from(response.body)))
        .unwrap_or_else(|e| {
            error!("Failed to build response: {}", e);
            let mut fallback = Response::new(Full::new(Bytes::from_static(b"Internal Server Error")));
            *fallback.status_mut() = hyper::StatusCode::INTERNAL_SERVER_ERROR;
            fallback
        })
}

/// Generate a unique request ID.
fn generate_request_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    format!("{:x}", timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_response_copies_fields() {
        let response = build_response(
            GatewayResponse::new(StatusCode::OK)
                .header("content-type", "application/json; charset=utf-8")
                .body("{}"),
        );
        assert_eq!(response.status(), hyper::StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"],
            "application/json; charset=utf-8"
        );
    }

    #[test]
    fn test_build_response_rejects_invalid_status() {
        let response = build_response(GatewayResponse::new(42));
        assert_eq!(response.status(), hyper::StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_read_body_within_limit() {
        let bytes = read_body(Full::new(Bytes::from_static(b"{\"a\":1}")), 64)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"{\"a\":1}");

        let exact = read_body(Full::new(Bytes::from(vec![b'x'; 64])), 64)
            .await
            .unwrap();
        assert_eq!(exact.len(), 64);
    }

    #[tokio::test]
    async fn test_read_body_stops_at_limit() {
        let err = read_body(Full::new(Bytes::from(vec![b'x'; 65])), 64)
            .await
            .unwrap_err();
        assert!(matches!(err, ForwardError::PayloadTooLarge(64)));
    }

    #[test]
    fn test_request_ids_are_hex() {
        let id = generate_request_id();
        assert!(!id.is_empty());
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
