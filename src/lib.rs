//! # lambda-proxy - gateway event forwarder
//!
//! `lambda-proxy` receives API gateway proxy events, forwards them to a
//! downstream JSON API at `APIGW_URL + path`, and relays the JSON answer back
//! as a gateway response.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐  GatewayEvent   ┌───────────────┐  GET/POST/PUT/DELETE  ┌────────────┐
//! │   Gateway /  │ ──────────────▶ │   Forwarder   │ ────────────────────▶ │ Downstream │
//! │ FunctionHost │ ◀────────────── │               │ ◀──────────────────── │  JSON API  │
//! └──────────────┘ GatewayResponse └───────────────┘        JSON           └────────────┘
//! ```
//!
//! Only the `authorization` and `content-type` headers are forwarded. The
//! response always carries status 200 and `application/json; charset=utf-8`,
//! whatever status the downstream answered with.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use lambda_proxy::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let forwarder = Forwarder::new(ForwarderConfig::new("https://api.example.com/prod"));
//!
//!     let event = GatewayEvent::new("GET", "/items").query("id", "42");
//!     let response = forwarder.forward(&event).await?;
//!     println!("{}", response.body);
//!     Ok(())
//! }
//! ```
//!
//! ## Local hosting
//!
//! [`FunctionHost`] serves a forwarder over HTTP. Plain requests are converted
//! into gateway events; `POST /_invoke` accepts a raw event document.

pub mod function;
pub mod http;
pub mod runtime;

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::function::{
        ForwardError, Forwarder, FunctionContext, GatewayFunction, OutboundRequest,
    };
    pub use crate::http::{GatewayEvent, GatewayResponse, Method, QueryValue, StatusCode};
    pub use crate::runtime::{ForwarderConfig, FunctionHost, HostConfig};
    pub use async_trait::async_trait;
}

// Re-export for convenience
pub use function::{ForwardError, Forwarder, FunctionContext, GatewayFunction};
pub use http::{GatewayEvent, GatewayResponse};
pub use runtime::{ForwarderConfig, FunctionHost, HostConfig};
