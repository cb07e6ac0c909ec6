//! FastAGI TCP listener.
//!
//! The engine connects once per call. Each accepted connection becomes a
//! [`Session`] on its own tokio task and is handed to the caller's handler;
//! the accept loop moves straight on to the next connection.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::observer::CommandObserver;
use crate::session::Session;

/// FastAGI server bound to a TCP address.
pub struct FastAgiServer {
    /// Server configuration.
    config: ServerConfig,
    /// TCP listener.
    listener: TcpListener,
    /// Semaphore for limiting concurrently dispatched sessions.
    connection_semaphore: Arc<Semaphore>,
}

impl FastAgiServer {
    /// Binds the listening socket described by `config`.
    pub async fn bind(config: ServerConfig) -> ServerResult<Self> {
        if config.max_connections == 0 {
            return Err(ServerError::config("max_connections must be at least 1"));
        }

        let addr = config.resolved_addr().to_string();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ServerError::bind(&addr, e))?;
        info!(
            addr = %listener.local_addr()?,
            max_connections = config.max_connections,
            "FastAGI server listening"
        );

        let connection_semaphore = Arc::new(Semaphore::new(config.max_connections));

        Ok(Self {
            config,
            listener,
            connection_semaphore,
        })
    }

    /// Returns the bound address.
    pub fn local_addr(&self) -> ServerResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Accepts a single connection and runs its handshake.
    ///
    /// Sessions obtained this way do not count towards `max_connections`.
    pub async fn accept(&self) -> ServerResult<Session> {
        let (stream, peer) = self.listener.accept().await.map_err(ServerError::Accept)?;
        debug!(peer = %peer, "Accepted new connection");

        open_session(
            stream,
            Arc::clone(&self.config.observer),
            self.config.handshake_timeout,
        )
        .await
    }

    /// Runs the accept loop, calling `handler` with each ready session.
    ///
    /// Runs until accepting fails; that error is returned. Failed
    /// handshakes are logged and do not stop the loop. The handler owns the
    /// session and is responsible for closing it.
    pub async fn run<F, Fut>(&self, handler: F) -> ServerResult<()>
    where
        F: Fn(Session) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handler = Arc::new(handler);

        loop {
            let permit = Arc::clone(&self.connection_semaphore)
                .acquire_owned()
                .await
                .map_err(|_| ServerError::config("connection limiter closed"))?;

            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!(error = %e, "Failed to accept connection");
                    return Err(ServerError::Accept(e));
                }
            };
            debug!(peer = %peer, "Accepted new connection");

            let handler = Arc::clone(&handler);
            let observer = Arc::clone(&self.config.observer);
            let handshake_timeout = self.config.handshake_timeout;

            tokio::spawn(async move {
                let _permit = permit;
                match open_session(stream, observer, handshake_timeout).await {
                    Ok(session) => handler(session).await,
                    Err(e) => warn!(peer = %peer, error = %e, "Dropping connection"),
                }
            });
        }
    }

    /// Runs the accept loop until `shutdown` completes.
    pub async fn run_until_shutdown<F, Fut, S>(&self, handler: F, shutdown: S) -> ServerResult<()>
    where
        F: Fn(Session) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
        S: Future<Output = ()> + Send,
    {
        tokio::select! {
            result = self.run(handler) => result,
            _ = shutdown => {
                info!("Shutdown signal received");
                Ok(())
            }
        }
    }
}

/// Binds `addr` (empty for the default) and runs `handler` for every call.
pub async fn listen<F, Fut>(addr: &str, handler: F) -> ServerResult<()>
where
    F: Fn(Session) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    FastAgiServer::bind(ServerConfig::new(addr))
        .await?
        .run(handler)
        .await
}

async fn open_session(
    stream: TcpStream,
    observer: Arc<dyn CommandObserver>,
    handshake_timeout: Option<Duration>,
) -> ServerResult<Session> {
    let handshake = Session::from_tcp(stream, observer);
    let session = match handshake_timeout {
        Some(limit) => tokio::time::timeout(limit, handshake)
            .await
            .map_err(|_| ServerError::HandshakeTimeout { after: limit })??,
        None => handshake.await?,
    };
    Ok(session)
}
