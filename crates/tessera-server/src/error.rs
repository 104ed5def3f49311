//! Server and handler error types.

use thiserror::Error;

use tessera_bind::BundleError;
use tessera_core::HttpError;

/// Errors that stop the server from starting or running.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to the configured address.
    #[error("failed to bind: {0}")]
    Bind(String),

    /// I/O error on the listener.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors returned by handlers.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Domain rejection of a well-formed request.
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The handler read a parameter its contract does not declare.
    #[error(transparent)]
    Bundle(#[from] BundleError),

    /// The handler failed in a way the caller cannot fix.
    #[error("internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    /// Creates an internal error.
    pub fn internal(reason: impl Into<String>) -> Self {
        Self::Internal(reason.into())
    }
}
