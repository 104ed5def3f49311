//! Typed configuration for Tessera services.
//!
//! - TOML and JSON configuration files
//! - Environment variable overrides (`PREFIX__SECTION__KEY`)
//! - Strict parsing (unknown fields are rejected)
//! - Layering: defaults, then file, then environment
//!
//! # Example
//!
//! ```no_run
//! use tessera_config::ConfigLoader;
//!
//! # fn main() -> Result<(), tessera_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_optional_file("tessera.toml")?
//!     .with_dotenv()
//!     .with_env_prefix("TESSERA")
//!     .load()?;
//!
//! println!("listening on {}", config.server.http_addr);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! http_addr = "0.0.0.0:8000"
//! request_timeout_ms = 30000
//! shutdown_timeout_secs = 10
//! max_body_bytes = 2097152
//!
//! [logging]
//! level = "info"
//! format = "json"
//!
//! [binding]
//! duplicate_scalar = "first"
//! multipart_max_fields = 100
//! multipart_max_field_bytes = 1048576
//! ```

#![doc(html_root_url = "https://docs.rs/tessera-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::TesseraConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{BindingConfig, ServerConfig};
pub use tessera_telemetry::{LogConfig, LogFormat};
