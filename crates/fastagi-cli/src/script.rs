//! Demo call handler.
//!
//! Logs the call variables, answers, reports the channel status, optionally
//! plays a greeting and hangs up. A hangup from the caller ends the script
//! quietly.

use std::sync::Arc;

use fastagi_protocol::AgiResult;
use fastagi_server::Session;
use tracing::{debug, info, warn};

/// Demo handler options.
#[derive(Debug, Clone, Default)]
pub struct DemoOptions {
    /// Sound file streamed after answering.
    pub greeting: Option<String>,
}

impl DemoOptions {
    pub fn new(greeting: Option<String>) -> Self {
        Self { greeting }
    }
}

/// Runs the demo script on `session`, then closes it.
pub async fn handle_call(session: Session, options: Arc<DemoOptions>) {
    match run_script(&session, &options).await {
        Ok(()) => info!("Call finished"),
        Err(e) if e.is_hangup() => info!("Caller hung up"),
        Err(e) => warn!(error = %e, "Call failed"),
    }

    if let Err(e) = session.close().await {
        debug!(error = %e, "Failed to close session");
    }
}

/// The script itself. Stops at the first failing command.
pub async fn run_script(session: &Session, options: &DemoOptions) -> AgiResult<()> {
    let variables = session.variables();
    info!(
        request = variables.request().unwrap_or_default(),
        channel = variables.channel().unwrap_or_default(),
        caller_id = variables.caller_id().unwrap_or_default(),
        peer = ?session.peer_addr(),
        "Call started"
    );
    if session.take_eagi().await.is_some() {
        info!("Audio side channel attached");
    }

    session.answer().await?;
    session.verbose("fastagi demo answered", 3).await?;

    let state = session.status().await?;
    info!(state = %state, "Channel status");

    if let Some(greeting) = &options.greeting {
        let digit = session.stream_file(greeting, "", 0).await?;
        debug!(greeting = %greeting, result = %digit, "Greeting played");
    }

    session.hangup().await
}
