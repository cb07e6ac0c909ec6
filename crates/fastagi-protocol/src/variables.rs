//! Session variables sent by the engine before any command.
//!
//! The handshake block is a run of `key: value` lines terminated by a blank
//! line:
//!
//! ```text
//! agi_network: yes
//! agi_request: agi://10.0.0.1/ivr
//! agi_channel: PJSIP/100-00000001
//!
//! ```

use std::collections::HashMap;
use std::collections::hash_map::Iter;

/// Variables received during the handshake. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Variables {
    inner: HashMap<String, String>,
}

impl Variables {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the set from handshake lines, stopping at the first blank line.
    pub fn from_lines<'a, I>(lines: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut variables = Self::new();
        for line in lines {
            let line = line.trim_end_matches(['\r', '\n']);
            if line.is_empty() {
                break;
            }
            variables.push_line(line);
        }
        variables
    }

    /// Records one handshake line. Lines without a colon are ignored.
    ///
    /// Returns `false` for an ignored line.
    pub fn push_line(&mut self, line: &str) -> bool {
        match parse_variable_line(line) {
            Some((key, value)) => {
                self.inner.insert(key.to_string(), value.to_string());
                true
            }
            None => false,
        }
    }

    /// Returns the value of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.inner.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> Iter<'_, String, String> {
        self.inner.iter()
    }

    /// The script URL or path requested (`agi_request`).
    pub fn request(&self) -> Option<&str> {
        self.get("agi_request")
    }

    /// Channel name (`agi_channel`).
    pub fn channel(&self) -> Option<&str> {
        self.get("agi_channel")
    }

    /// Unique call identifier (`agi_uniqueid`).
    pub fn unique_id(&self) -> Option<&str> {
        self.get("agi_uniqueid")
    }

    /// Caller number (`agi_callerid`).
    pub fn caller_id(&self) -> Option<&str> {
        self.get("agi_callerid")
    }

    /// Dialplan extension (`agi_extension`).
    pub fn extension(&self) -> Option<&str> {
        self.get("agi_extension")
    }

    /// Dialplan context (`agi_context`).
    pub fn context(&self) -> Option<&str> {
        self.get("agi_context")
    }
}

impl<'a> IntoIterator for &'a Variables {
    type Item = (&'a String, &'a String);
    type IntoIter = Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

/// Splits a handshake line on its first colon, trimming both sides.
pub(crate) fn parse_variable_line(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once(':')?;
    Some((key.trim(), value.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_block_until_blank_line() {
        let vars = Variables::from_lines("A: 1\nB: two\n\nC: 3\n".lines());
        assert_eq!(vars.len(), 2);
        assert_eq!(vars.get("A"), Some("1"));
        assert_eq!(vars.get("B"), Some("two"));
        assert_eq!(vars.get("C"), None);
    }

    #[test]
    fn splits_on_first_colon_only() {
        let vars = Variables::from_lines(["agi_request: agi://10.0.0.1:4573/ivr"]);
        assert_eq!(vars.request(), Some("agi://10.0.0.1:4573/ivr"));
    }

    #[test]
    fn ignores_lines_without_colon() {
        let mut vars = Variables::new();
        assert!(!vars.push_line("no separator here"));
        assert!(vars.push_line("  key  :  value  "));
        assert_eq!(vars.get("key"), Some("value"));
        assert_eq!(vars.len(), 1);
    }

    #[test]
    fn crlf_blank_line_terminates() {
        let vars = Variables::from_lines(["A: 1\r\n", "\r\n", "B: 2\r\n"]);
        assert_eq!(vars.len(), 1);
    }

    #[test]
    fn empty_value_is_kept() {
        let vars = Variables::from_lines(["agi_callerid:"]);
        assert_eq!(vars.caller_id(), Some(""));
    }

    #[test]
    fn standard_accessors() {
        let vars = Variables::from_lines([
            "agi_channel: PJSIP/100-00000001",
            "agi_uniqueid: 1700000000.1",
            "agi_callerid: 100",
            "agi_extension: 500",
            "agi_context: default",
        ]);
        assert_eq!(vars.channel(), Some("PJSIP/100-00000001"));
        assert_eq!(vars.unique_id(), Some("1700000000.1"));
        assert_eq!(vars.caller_id(), Some("100"));
        assert_eq!(vars.extension(), Some("500"));
        assert_eq!(vars.context(), Some("default"));
        assert_eq!(vars.request(), None);
    }
}
