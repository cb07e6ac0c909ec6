//! CLI error types.

use fastagi_core::TracingError;
use fastagi_protocol::AgiError;
use fastagi_server::ServerError;
use thiserror::Error;

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// Errors that end the `fastagi` process.
#[derive(Debug, Error)]
pub enum CliError {
    /// Logging could not be set up.
    #[error("tracing setup failed: {0}")]
    Tracing(#[from] TracingError),

    /// The listener failed.
    #[error("server error: {0}")]
    Server(#[from] ServerError),

    /// The stdio session could not be opened.
    #[error("session error: {0}")]
    Session(#[from] AgiError),
}
