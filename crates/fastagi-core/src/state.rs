//! Channel state as reported by `CHANNEL STATUS`.
//!
//! The numbering mirrors the call-processing engine's own enumeration, so
//! the result token of the status command maps one-to-one onto a variant.

use std::fmt;

use thiserror::Error;

/// State of the channel a session is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelState {
    /// Channel is down and available.
    Down,
    /// Channel is down but reserved.
    Reserved,
    /// Channel is off hook.
    Offhook,
    /// Digits have been dialed.
    Dialing,
    /// Line is ringing.
    Ring,
    /// Remote end is ringing (the channel receives ringback).
    Ringing,
    /// Channel is up.
    Up,
    /// Line is busy.
    Busy,
    /// Digits have been dialed while off hook.
    DialingOffhook,
    /// An incoming call was detected and the channel waits for ring.
    PreRing,
}

/// Returned when a numeric state has no [`ChannelState`] counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown channel state: {0}")]
pub struct UnknownChannelState(pub i64);

impl ChannelState {
    /// Returns the wire number of this state.
    pub fn as_number(self) -> i64 {
        match self {
            Self::Down => 0,
            Self::Reserved => 1,
            Self::Offhook => 2,
            Self::Dialing => 3,
            Self::Ring => 4,
            Self::Ringing => 5,
            Self::Up => 6,
            Self::Busy => 7,
            Self::DialingOffhook => 8,
            Self::PreRing => 9,
        }
    }

    /// Whether the channel carries an established call.
    pub fn is_up(self) -> bool {
        self == Self::Up
    }
}

impl TryFrom<i64> for ChannelState {
    type Error = UnknownChannelState;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        let state = match value {
            0 => Self::Down,
            1 => Self::Reserved,
            2 => Self::Offhook,
            3 => Self::Dialing,
            4 => Self::Ring,
            5 => Self::Ringing,
            6 => Self::Up,
            7 => Self::Busy,
            8 => Self::DialingOffhook,
            9 => Self::PreRing,
            other => return Err(UnknownChannelState(other)),
        };
        Ok(state)
    }
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Down => "down",
            Self::Reserved => "reserved",
            Self::Offhook => "offhook",
            Self::Dialing => "dialing",
            Self::Ring => "ring",
            Self::Ringing => "ringing",
            Self::Up => "up",
            Self::Busy => "busy",
            Self::DialingOffhook => "dialing-offhook",
            Self::PreRing => "pre-ring",
        };
        f.write_str(name)
    }
}
