//! Function host runtime and configuration.

mod config;
mod server;

pub use config::{
    ForwarderConfig, HostConfig, BASE_URL_VAR, HOST_VAR, PORT_VAR, PRESERVE_STATUS_VAR,
};
pub use server::{FunctionHost, INVOKE_PATH};
