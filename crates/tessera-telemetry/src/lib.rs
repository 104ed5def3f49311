//! Logging setup for Tessera services.
//!
//! - [`init_logging`] installs the global subscriber from a [`LogConfig`]
//! - [`request_span`] opens the per-request span the server logs under
//! - [`fields`] names the structured fields used across crates
//!
//! Binding failures are logged at `debug`, request completion at `info`,
//! domain errors at `warn`, and shaping defects and connection errors at
//! `error`.

#![doc(html_root_url = "https://docs.rs/tessera-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, fields, init_logging, request_span, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
