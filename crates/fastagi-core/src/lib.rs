//! Core types: tracing setup, channel state, argument encoding

pub mod args;
pub mod state;
pub mod tracing;

pub use args::{epoch, escape_digits, millis, quote, seconds};
pub use state::{ChannelState, UnknownChannelState};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
