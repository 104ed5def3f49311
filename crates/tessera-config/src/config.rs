//! Top-level configuration type.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};
use tessera_telemetry::{create_env_filter, LogConfig};

use crate::{BindingConfig, ConfigError, ServerConfig};

/// Complete Tessera service configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use tessera_config::TesseraConfig;
///
/// let config = TesseraConfig::default();
/// assert_eq!(config.server.http_addr, "0.0.0.0:8000");
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct TesseraConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LogConfig,

    /// Binding engine configuration.
    #[serde(default)]
    pub binding: BindingConfig,
}

impl TesseraConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if the bind address does not
    /// parse, a limit or timeout is zero, or the log level is not a valid
    /// filter directive.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.http_addr.parse::<SocketAddr>().is_err() {
            return Err(ConfigError::invalid_value(
                "server.http_addr",
                format!("invalid socket address: {}", self.server.http_addr),
            ));
        }

        let non_zero = [
            ("server.request_timeout_ms", self.server.request_timeout_ms == 0),
            ("server.max_body_bytes", self.server.max_body_bytes == 0),
            ("binding.multipart_max_fields", self.binding.multipart_max_fields == 0),
            (
                "binding.multipart_max_field_bytes",
                self.binding.multipart_max_field_bytes == 0,
            ),
        ];
        if let Some((field, _)) = non_zero.iter().find(|(_, is_zero)| *is_zero) {
            return Err(ConfigError::invalid_value(*field, "must be greater than zero"));
        }

        create_env_filter(&self.logging.level)
            .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))?;

        Ok(())
    }

    /// Development preset: pretty debug logging.
    #[must_use]
    pub fn development() -> Self {
        Self {
            logging: LogConfig::development(),
            ..Self::default()
        }
    }

    /// Production preset: JSON logging at info.
    #[must_use]
    pub fn production() -> Self {
        Self {
            logging: LogConfig::production(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_telemetry::LogFormat;

    #[test]
    fn test_presets() {
        assert_eq!(TesseraConfig::development().logging.format, LogFormat::Pretty);
        assert_eq!(TesseraConfig::production().logging.format, LogFormat::Json);
    }

    #[test]
    fn test_validate_bad_addr() {
        let mut config = TesseraConfig::default();
        config.server.http_addr = "localhost".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("server.http_addr"));
    }

    #[test]
    fn test_validate_zero_limit() {
        let mut config = TesseraConfig::default();
        config.binding.multipart_max_fields = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("binding.multipart_max_fields"));
    }

    #[test]
    fn test_validate_bad_level() {
        let mut config = TesseraConfig::default();
        config.logging.level = "tessera=verbose".to_string();
        assert!(config.validate().is_err());
    }
}
