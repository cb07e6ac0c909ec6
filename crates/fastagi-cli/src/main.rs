//! fastagi CLI entry point.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use fastagi_cli::cli::{Cli, Command, ServeArgs, StdioArgs};
use fastagi_cli::error::CliResult;
use fastagi_cli::script::{DemoOptions, handle_call};
use fastagi_core::init_tracing;
use fastagi_server::{FastAgiServer, Session, TracingObserver};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    init_tracing(cli.tracing_config())?;

    match cli.command {
        Command::Serve(args) => serve(args).await,
        Command::Stdio(args) => stdio(args).await,
    }
}

async fn serve(args: ServeArgs) -> CliResult<()> {
    let options = Arc::new(DemoOptions::new(args.greeting.clone()));
    let server = FastAgiServer::bind(args.server_config()).await?;

    server
        .run_until_shutdown(
            move |session| handle_call(session, Arc::clone(&options)),
            async {
                if tokio::signal::ctrl_c().await.is_err() {
                    std::future::pending::<()>().await;
                }
            },
        )
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn stdio(args: StdioArgs) -> CliResult<()> {
    #[cfg(unix)]
    let builder = if args.eagi {
        Session::eagi_stdio_builder()
    } else {
        Session::stdio_builder()
    };
    #[cfg(not(unix))]
    let builder = Session::stdio_builder();

    let session = builder
        .with_observer(Arc::new(TracingObserver))
        .handshake()
        .await?;

    handle_call(session, Arc::new(DemoOptions::new(args.greeting))).await;
    Ok(())
}
