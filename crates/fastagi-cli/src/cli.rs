//! Command-line interface definition.

use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use fastagi_core::{TracingConfig, TracingOutputFormat};
use fastagi_server::{DEFAULT_LISTEN_ADDR, ServerConfig};
use tracing::Level;

/// fastagi - answer calls over AGI or FastAGI
#[derive(Debug, Parser)]
#[command(name = "fastagi")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug output, including every command round-trip
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    /// Log output format, json for serve and compact for stdio by default
    /// (logs always go to stderr)
    #[arg(long, value_enum, global = true, env = "FASTAGI_LOG_FORMAT")]
    pub log_format: Option<LogFormat>,

    /// Log filter directive, e.g. `fastagi_server=trace` (overrides RUST_LOG)
    #[arg(long, global = true, env = "FASTAGI_LOG_FILTER")]
    pub log_filter: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Logging setup for the selected command.
    ///
    /// `serve` starts from the service preset, `stdio` from the default one.
    pub fn tracing_config(&self) -> TracingConfig {
        let preset = match self.command {
            Command::Serve(_) => TracingConfig::service(),
            Command::Stdio(_) => TracingConfig::default(),
        };
        let level = if self.debug { Level::DEBUG } else { Level::INFO };

        let mut config = preset.with_level(level);
        if let Some(format) = self.log_format {
            config = config.with_format(format.into());
        }
        if let Some(filter) = &self.log_filter {
            config = config.with_env_filter(filter.clone());
        }
        config
    }
}

/// Log output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

impl From<LogFormat> for TracingOutputFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Pretty => TracingOutputFormat::Pretty,
            LogFormat::Compact => TracingOutputFormat::Compact,
            LogFormat::Json => TracingOutputFormat::Json,
        }
    }
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the demo handler as a FastAGI TCP service until Ctrl-C
    Serve(ServeArgs),

    /// Run the demo handler once over stdin/stdout (AGI mode)
    Stdio(StdioArgs),
}

/// Options for `fastagi serve`.
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "FASTAGI_LISTEN", default_value = DEFAULT_LISTEN_ADDR)]
    pub listen: String,

    /// Maximum calls handled at the same time
    #[arg(long, env = "FASTAGI_MAX_CONNECTIONS", default_value_t = 1024)]
    pub max_connections: usize,

    /// Seconds a new connection gets to send its handshake
    #[arg(long, env = "FASTAGI_HANDSHAKE_TIMEOUT")]
    pub handshake_timeout: Option<u64>,

    /// Sound file to play to each caller
    #[arg(long)]
    pub greeting: Option<String>,
}

impl ServeArgs {
    /// Builds the listener configuration from the flags.
    pub fn server_config(&self) -> ServerConfig {
        let config =
            ServerConfig::new(self.listen.clone()).with_max_connections(self.max_connections);
        match self.handshake_timeout {
            Some(secs) => config.with_handshake_timeout(Duration::from_secs(secs)),
            None => config,
        }
    }
}

/// Options for `fastagi stdio`.
#[derive(Debug, Args)]
pub struct StdioArgs {
    /// Sound file to play to the caller
    #[arg(long)]
    pub greeting: Option<String>,

    /// Attach the EAGI audio stream on file descriptor 3
    #[arg(long)]
    pub eagi: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_defaults() {
        let cli = Cli::try_parse_from(["fastagi", "serve"]).unwrap();
        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        let config = args.server_config();
        assert_eq!(config.resolved_addr(), DEFAULT_LISTEN_ADDR);
        assert_eq!(config.max_connections, 1024);
        assert!(config.handshake_timeout.is_none());
        assert!(!cli.debug);
        assert!(cli.log_format.is_none());
    }

    #[test]
    fn serve_flags() {
        let cli = Cli::try_parse_from([
            "fastagi",
            "--debug",
            "--log-format",
            "json",
            "serve",
            "--listen",
            "0.0.0.0:4574",
            "--max-connections",
            "8",
            "--handshake-timeout",
            "3",
            "--greeting",
            "hello-world",
        ])
        .unwrap();

        assert!(cli.debug);
        assert_eq!(cli.log_format, Some(LogFormat::Json));
        let Command::Serve(args) = cli.command else {
            panic!("expected serve");
        };
        assert_eq!(args.greeting.as_deref(), Some("hello-world"));
        let config = args.server_config();
        assert_eq!(config.resolved_addr(), "0.0.0.0:4574");
        assert_eq!(config.max_connections, 8);
        assert_eq!(config.handshake_timeout, Some(Duration::from_secs(3)));
    }

    #[test]
    fn serve_logs_with_service_preset() {
        let cli = Cli::try_parse_from(["fastagi", "serve"]).unwrap();
        let tracing = cli.tracing_config();
        assert_eq!(tracing.output_format, TracingOutputFormat::Json);
        assert_eq!(tracing.default_level, Level::INFO);
        assert!(tracing.include_location);
        assert!(tracing.env_filter.is_none());
    }

    #[test]
    fn stdio_logs_compact_by_default() {
        let cli = Cli::try_parse_from(["fastagi", "stdio"]).unwrap();
        let tracing = cli.tracing_config();
        assert_eq!(tracing.output_format, TracingOutputFormat::Compact);
        assert!(!tracing.include_location);
    }

    #[test]
    fn log_flags_override_the_preset() {
        let cli = Cli::try_parse_from([
            "fastagi",
            "serve",
            "--debug",
            "--log-format",
            "pretty",
            "--log-filter",
            "fastagi_server=trace",
        ])
        .unwrap();

        let tracing = cli.tracing_config();
        assert_eq!(tracing.output_format, TracingOutputFormat::Pretty);
        assert_eq!(tracing.default_level, Level::DEBUG);
        assert_eq!(
            tracing.env_filter.as_deref(),
            Some("fastagi_server=trace")
        );
    }

    #[test]
    fn stdio_flags() {
        let cli = Cli::try_parse_from(["fastagi", "stdio", "--eagi"]).unwrap();
        let Command::Stdio(args) = cli.command else {
            panic!("expected stdio");
        };
        assert!(args.eagi);
        assert!(args.greeting.is_none());
    }
}
