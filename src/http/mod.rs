//! Gateway event types exchanged between the host and gateway functions.

pub mod json;
mod request;
mod response;

pub use request::{parse_query_string, GatewayEvent, Method, QueryValue};
pub use response::{GatewayResponse, StatusCode, JSON_CONTENT_TYPE};
