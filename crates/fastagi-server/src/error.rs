//! Server error types.

use std::io;
use std::time::Duration;

use fastagi_protocol::AgiError;
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the FastAGI front-end.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listening socket could not be bound.
    #[error("failed to bind server to {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// Accepting a connection failed; the accept loop stops.
    #[error("failed to accept TCP connection: {0}")]
    Accept(#[source] io::Error),

    /// IO error (socket address lookup, etc.).
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The handshake of an accepted connection failed.
    #[error("handshake failed: {0}")]
    Handshake(#[from] AgiError),

    /// The peer did not finish its handshake in time.
    #[error("handshake not completed within {after:?}")]
    HandshakeTimeout { after: Duration },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl ServerError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a bind error.
    pub fn bind(addr: impl Into<String>, source: io::Error) -> Self {
        Self::Bind {
            addr: addr.into(),
            source,
        }
    }
}
