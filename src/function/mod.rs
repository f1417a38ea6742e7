//! Gateway functions: the handler seam and the request forwarder.

pub mod forwarder;
pub mod handler;

pub use forwarder::{Forwarder, OutboundRequest, FORWARDED_HEADERS};
pub use handler::{ForwardError, FunctionContext, GatewayFunction};
