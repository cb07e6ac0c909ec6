//! Server configuration.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::observer::{CommandObserver, TracingObserver};

/// Address used when none (or an empty string) is given.
pub const DEFAULT_LISTEN_ADDR: &str = "localhost:4573";

/// FastAGI listener configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// `host:port` to listen on. Empty means [`DEFAULT_LISTEN_ADDR`].
    pub listen_addr: String,

    /// Maximum sessions dispatched at the same time.
    pub max_connections: usize,

    /// Upper bound on the handshake of each accepted connection.
    pub handshake_timeout: Option<Duration>,

    /// Observer handed to every session.
    pub observer: Arc<dyn CommandObserver>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            max_connections: 1024,
            handshake_timeout: None,
            observer: Arc::new(TracingObserver),
        }
    }
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("listen_addr", &self.listen_addr)
            .field("max_connections", &self.max_connections)
            .field("handshake_timeout", &self.handshake_timeout)
            .finish_non_exhaustive()
    }
}

impl ServerConfig {
    /// Creates a new server configuration listening on `addr`.
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            listen_addr: addr.into(),
            ..Default::default()
        }
    }

    /// Builder: set max connections.
    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Builder: bound the handshake of each connection.
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = Some(timeout);
        self
    }

    /// Builder: set the observer given to each session.
    pub fn with_observer(mut self, observer: Arc<dyn CommandObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// The address to bind, applying the default for an empty string.
    pub fn resolved_addr(&self) -> &str {
        if self.listen_addr.trim().is_empty() {
            DEFAULT_LISTEN_ADDR
        } else {
            &self.listen_addr
        }
    }
}
