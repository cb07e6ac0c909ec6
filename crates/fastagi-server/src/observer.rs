//! Round-trip observation.
//!
//! A session reports its handshake and every command round-trip to the
//! [`CommandObserver`] it was built with. The observer is an explicit
//! capability held by the session, so different sessions in one process can
//! log differently, and tests can record traffic.

use fastagi_protocol::{Response, Variables};
use tracing::debug;

/// One completed command round-trip.
#[derive(Debug, Clone, Copy)]
pub struct CommandRecord<'a> {
    /// The command line as sent, without its newline.
    pub command: &'a str,
    /// The response line as read. Empty when nothing was read.
    pub raw: &'a str,
    /// The parsed outcome.
    pub response: &'a Response,
}

/// Receives session events.
pub trait CommandObserver: Send + Sync {
    /// Called once, after the handshake block has been read.
    fn on_handshake(&self, _variables: &Variables) {}

    /// Called after every round-trip, failed ones included.
    fn on_command(&self, record: &CommandRecord<'_>);
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl CommandObserver for NoopObserver {
    fn on_command(&self, _record: &CommandRecord<'_>) {}
}

/// Observer that emits `tracing` debug events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl CommandObserver for TracingObserver {
    fn on_handshake(&self, variables: &Variables) {
        for (key, value) in variables {
            debug!(key = %key, value = %value, "session variable");
        }
    }

    fn on_command(&self, record: &CommandRecord<'_>) {
        debug!(
            command = record.command,
            raw = record.raw,
            response = %record.response.summary(),
            "round-trip"
        );
    }
}
