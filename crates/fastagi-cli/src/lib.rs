//! FastAGI demo service and stdio AGI runner.
//!
//! This crate provides the `fastagi` command-line interface.

pub mod cli;
pub mod error;
pub mod script;

pub use cli::Cli;
pub use error::{CliError, CliResult};
