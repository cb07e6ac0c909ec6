//! AGI response grammar, handshake variables and error taxonomy.
//!
//! The Asynchronous Gateway Interface is a line-oriented text protocol. The
//! controller writes one command per line and the engine answers with one
//! status line:
//!
//! ```text
//! 200 result=1 (speech)
//! ^^^        ^  ^^^^^^
//! status     |  optional value
//!            result token
//! ```
//!
//! Before any command, the engine sends a block of `key: value` lines
//! terminated by a blank line (see [`Variables`]).
//!
//! Multi-line responses (`520-` usage blocks) are not supported: a round-trip
//! consumes exactly one content line.
//!
//! # Example
//!
//! ```rust
//! use fastagi_protocol::{parse_response, AgiError, ParseMode};
//!
//! let response = parse_response("200 result=1234 (timeout)", ParseMode::Permissive);
//! assert_eq!(response.status, 200);
//! assert_eq!(response.value, "timeout");
//! assert_eq!(response.error, Some(AgiError::Timeout));
//! ```

mod error;
mod parser;
mod response;
mod variables;

pub use error::{AgiError, AgiResult};
pub use parser::{ParseMode, parse_response};
pub use response::Response;
pub use variables::Variables;

/// The command was accepted.
pub const STATUS_OK: u16 = 200;

/// The command cannot run on a dead (hung up) channel or in an intercept routine.
pub const STATUS_DEAD_CHANNEL: u16 = 511;

/// Message carried by a 511 status on a dead channel.
pub const DEAD_CHANNEL_MESSAGE: &str =
    "Command Not Permitted on a dead channel or intercept routine";
