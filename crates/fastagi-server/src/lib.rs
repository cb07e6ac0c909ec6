//! AGI session engine, command catalog and FastAGI listener.
//!
//! This crate provides:
//! - [`Session`]: one conversation with the call-processing engine over a
//!   stream pair (stdio for AGI, a TCP connection for FastAGI)
//! - the command catalog (`answer`, `get_data`, `stream_file`, ...) as
//!   methods on [`Session`]
//! - [`FastAgiServer`] and [`listen`]: a TCP accept loop handing each call
//!   to a handler on its own task
//!
//! # Example
//!
//! ```rust,no_run
//! use fastagi_server::{Session, listen};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     listen("", |session: Session| async move {
//!         if session.answer().await.is_ok() {
//!             let _ = session.stream_file("hello-world", "", 0).await;
//!             let _ = session.hangup().await;
//!         }
//!         let _ = session.close().await;
//!     })
//!     .await?;
//!     Ok(())
//! }
//! ```

mod commands;
mod config;
mod error;
mod observer;
mod session;
mod socket;

#[cfg(test)]
mod testing;

pub use commands::{LogLevel, RecordOptions};
pub use config::{DEFAULT_LISTEN_ADDR, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use observer::{CommandObserver, CommandRecord, NoopObserver, TracingObserver};
#[cfg(unix)]
pub use session::EAGI_FD;
pub use session::{BoxedReader, BoxedWriter, Session, SessionBuilder};
pub use socket::{FastAgiServer, listen};
