//! Body materialization errors.
//!
//! These are transport-level failures that happen before any parameter is
//! bound. A body that is readable but not valid JSON is *not* an error here:
//! it is materialized as [`RequestBody::Malformed`](crate::RequestBody::Malformed)
//! and reported by validation as a `type_mismatch` at `["body"]`.

use http::StatusCode;
use thiserror::Error;

/// Failure to materialize a request body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BodyError {
    /// The Content-Type is not one the engine can parse.
    #[error("unsupported content type '{0}'")]
    UnsupportedMediaType(String),

    /// The multipart Content-Type carries no usable boundary.
    #[error("invalid multipart content type: {0}")]
    InvalidBoundary(String),

    /// A body or field exceeded its configured limit.
    #[error("payload too large: max {limit} bytes, got {actual} bytes")]
    PayloadTooLarge {
        /// Configured limit.
        limit: usize,
        /// Observed size.
        actual: usize,
    },

    /// The multipart body carries more fields than allowed.
    #[error("too many multipart fields (max {0})")]
    TooManyFields(usize),

    /// The multipart stream is malformed.
    #[error("multipart parse error: {0}")]
    Multipart(String),
}

impl BodyError {
    /// The HTTP status this error maps to.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::PayloadTooLarge { .. } | Self::TooManyFields(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::InvalidBoundary(_) | Self::Multipart(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// The `{"detail": "..."}` payload for this error.
    #[must_use]
    pub fn to_body(&self) -> serde_json::Value {
        serde_json::json!({ "detail": self.to_string() })
    }
}
