//! Forwarder and host configuration.

use crate::function::ForwardError;
use serde::{Deserialize, Serialize};

/// Environment variable holding the downstream base URL.
pub const BASE_URL_VAR: &str = "APIGW_URL";
/// Environment variable enabling downstream status passthrough.
pub const PRESERVE_STATUS_VAR: &str = "APIGW_PRESERVE_STATUS";
/// Environment variable overriding the host bind address.
pub const HOST_VAR: &str = "LAMBDA_PROXY_HOST";
/// Environment variable overriding the host port.
pub const PORT_VAR: &str = "LAMBDA_PROXY_PORT";

/// Configuration for the request forwarder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwarderConfig {
    /// Downstream base URL. The event path is appended to it verbatim.
    pub base_url: String,
    /// Relay the downstream status code instead of always answering 200.
    pub preserve_status: bool,
}

impl ForwarderConfig {
    /// Create a config for the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            preserve_status: false,
        }
    }

    /// Set whether the downstream status code is relayed.
    pub fn preserve_status(mut self, preserve: bool) -> Self {
        self.preserve_status = preserve;
        self
    }

    /// Read the config from the process environment.
    pub fn from_env() -> Result<Self, ForwardError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the config through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ForwardError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(BASE_URL_VAR).ok_or(ForwardError::MissingConfig(BASE_URL_VAR))?;
        let preserve_status = match lookup(PRESERVE_STATUS_VAR) {
            Some(value) => parse_flag(PRESERVE_STATUS_VAR, &value)?,
            None => false,
        };

        Ok(Self {
            base_url,
            preserve_status,
        })
    }

    /// Build the downstream URL for `path`. No slash normalization is applied.
    pub fn target_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Configuration for the local function host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Whether to enable the health check endpoint.
    pub enable_health: bool,
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_health: true,
            max_body_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

impl HostConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the host address.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the maximum accepted request body size.
    pub fn max_body_size(mut self, bytes: usize) -> Self {
        self.max_body_size = bytes;
        self
    }

    /// Read overrides from the process environment.
    pub fn from_env() -> Result<Self, ForwardError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides through `lookup`; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ForwardError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(host) = lookup(HOST_VAR) {
            config.host = host;
        }
        if let Some(port) = lookup(PORT_VAR) {
            config.port = port.trim().parse().map_err(|_| ForwardError::InvalidConfig {
                key: PORT_VAR,
                value: port.clone(),
            })?;
        }
        Ok(config)
    }

    /// Get the bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ForwardError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ForwardError::InvalidConfig {
            key,
            value: value.to_string(),
        }),
    }
}
