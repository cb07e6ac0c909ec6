//! Failure taxonomy of a command round-trip.

use std::io;

use thiserror::Error;

/// Result type for protocol operations.
pub type AgiResult<T> = Result<T, AgiError>;

/// Everything that can go wrong during one command round-trip.
///
/// Failures travel inside a [`Response`](crate::Response) rather than being
/// raised, and identical response lines must parse to identical values, so
/// this type is `Clone + Eq` and keeps I/O failures as kind plus message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AgiError {
    /// The remote party hung up or the engine signalled call end.
    #[error("hangup")]
    Hangup,

    /// A data-collection command received no input before its deadline.
    #[error("timeout")]
    Timeout,

    /// Status 511 with the dead-channel message.
    #[error("Command Not Permitted on a dead channel or intercept routine")]
    CommandNotPermitted,

    /// Any other non-200 status.
    #[error("non-200 status code {status}: {message}")]
    Protocol { status: u16, message: String },

    /// The response line matches none of the known shapes.
    #[error("failed to parse result: {line}")]
    MalformedResponse { line: String },

    /// The status field is not an integer.
    #[error("failed to get status code from {token:?}: {reason}")]
    InvalidStatus { token: String, reason: String },

    /// The result field is not an integer. Status and value stay usable.
    #[error("failed to parse result-code {token:?} as an integer: {reason}")]
    InvalidResult { token: String, reason: String },

    /// Reading from or writing to the stream failed.
    #[error("failed to {operation}: {message}")]
    Transport {
        operation: &'static str,
        kind: io::ErrorKind,
        message: String,
    },

    /// The session's connection was closed locally.
    #[error("session is closed")]
    SessionClosed,
}

impl AgiError {
    /// Creates a transport error from an I/O failure.
    pub fn transport(operation: &'static str, err: &io::Error) -> Self {
        Self::Transport {
            operation,
            kind: err.kind(),
            message: err.to_string(),
        }
    }

    /// Creates a generic protocol error.
    pub fn protocol(status: u16, message: impl Into<String>) -> Self {
        Self::Protocol {
            status,
            message: message.into(),
        }
    }

    /// Whether the rest of the response can still be trusted.
    ///
    /// Only a non-numeric result token in strict mode is soft.
    pub fn is_soft(&self) -> bool {
        matches!(self, Self::InvalidResult { .. })
    }

    /// Whether the call has ended.
    pub fn is_hangup(&self) -> bool {
        matches!(self, Self::Hangup)
    }

    /// Whether the failure came from the underlying stream.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::SessionClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_keeps_kind_and_message() {
        let io_err = io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed");
        let err = AgiError::transport("send command", &io_err);
        assert_eq!(err.to_string(), "failed to send command: pipe closed");
        assert!(err.is_transport());
        assert!(matches!(
            err,
            AgiError::Transport {
                kind: io::ErrorKind::BrokenPipe,
                ..
            }
        ));
    }

    #[test]
    fn only_invalid_result_is_soft() {
        let soft = AgiError::InvalidResult {
            token: "abc".into(),
            reason: "invalid digit found in string".into(),
        };
        assert!(soft.is_soft());
        assert!(!AgiError::Hangup.is_soft());
        assert!(!AgiError::protocol(510, "Invalid or unknown command").is_soft());
    }

    #[test]
    fn display_messages() {
        assert_eq!(AgiError::Hangup.to_string(), "hangup");
        assert_eq!(
            AgiError::protocol(520, "End of proper usage.").to_string(),
            "non-200 status code 520: End of proper usage."
        );
        assert!(AgiError::SessionClosed.is_transport());
        assert!(AgiError::Hangup.is_hangup());
    }
}
