//! The outcome of one command round-trip.

use std::fmt;

use crate::error::{AgiError, AgiResult};

/// Parsed response to a single command.
///
/// Built by [`parse_response`](crate::parse_response) and never modified
/// afterwards. `error` is informative next to `status`: a non-200 status
/// always carries an error, but a 200 can carry one too (timeout, hangup
/// sentinel, or a result token that is not a number).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    /// Failure observed during the round-trip, if any.
    pub error: Option<AgiError>,
    /// Three-digit status code, 0 when none was read.
    pub status: u16,
    /// Numeric result, when the token parses.
    pub result: i64,
    /// The result token as received.
    pub result_string: String,
    /// Text between the parentheses after the result, if present.
    pub value: String,
}

impl Response {
    /// Creates a response that only carries a failure.
    pub fn failed(error: AgiError) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }

    /// Returns the failure, if any.
    pub fn err(&self) -> Option<&AgiError> {
        self.error.as_ref()
    }

    /// Whether the round-trip completed without any failure.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Returns the raw result token, or the failure.
    ///
    /// Some commands report their payload in the result token (digits
    /// collected by `GET DATA`), which makes this more useful than [`val`](Self::val).
    pub fn res(&self) -> AgiResult<&str> {
        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(&self.result_string),
        }
    }

    /// Returns the trailing value, or the failure.
    pub fn val(&self) -> AgiResult<&str> {
        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(&self.value),
        }
    }

    /// Returns `()` on success, or the failure.
    pub fn check(&self) -> AgiResult<()> {
        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// Compact single-line rendering used in round-trip logs.
    ///
    /// `{Sta:200 Res:1 Str:1 Val:speech}` on success, `{Err:hangup}` on failure.
    pub fn summary(&self) -> String {
        let mut parts = Vec::with_capacity(4);
        match &self.error {
            None => {
                parts.push(format!("Sta:{}", self.status));
                parts.push(format!("Res:{}", self.result));
                if !self.result_string.is_empty() {
                    parts.push(format!("Str:{}", self.result_string));
                }
                if !self.value.is_empty() {
                    parts.push(format!("Val:{}", self.value));
                }
            }
            Some(err) => parts.push(format!("Err:{err}")),
        }
        format!("{{{}}}", parts.join(" "))
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}
