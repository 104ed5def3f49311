//! Configuration schema types.

use serde::{Deserialize, Serialize};
use tessera_core::DuplicatePolicy;

/// Server configuration section.
///
/// # Example
///
/// ```
/// use tessera_config::ServerConfig;
///
/// let config = ServerConfig {
///     http_addr: "127.0.0.1:8000".to_string(),
///     ..Default::default()
/// };
/// assert_eq!(config.max_body_bytes, 2 * 1024 * 1024);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// HTTP server bind address (e.g., "0.0.0.0:8000").
    #[serde(default = "default_http_addr")]
    pub http_addr: String,

    /// Per-request timeout in milliseconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// Graceful shutdown timeout in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_secs: u64,

    /// Largest accepted request body; larger bodies get 413.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
            request_timeout_ms: default_request_timeout(),
            shutdown_timeout_secs: default_shutdown_timeout(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

fn default_http_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_request_timeout() -> u64 {
    30_000
}

fn default_shutdown_timeout() -> u64 {
    10
}

fn default_max_body_bytes() -> usize {
    2 * 1024 * 1024
}

/// Binding engine configuration section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct BindingConfig {
    /// What to do when a scalar parameter receives several values.
    #[serde(default)]
    pub duplicate_scalar: DuplicatePolicy,

    /// Maximum number of multipart fields.
    #[serde(default = "default_multipart_max_fields")]
    pub multipart_max_fields: usize,

    /// Maximum size of one multipart field in bytes.
    #[serde(default = "default_multipart_max_field_bytes")]
    pub multipart_max_field_bytes: usize,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            duplicate_scalar: DuplicatePolicy::default(),
            multipart_max_fields: default_multipart_max_fields(),
            multipart_max_field_bytes: default_multipart_max_field_bytes(),
        }
    }
}

fn default_multipart_max_fields() -> usize {
    100
}

fn default_multipart_max_field_bytes() -> usize {
    1024 * 1024
}
