//! Response line grammar.
//!
//! Two grammars are recognised. Strict mode expects a numeric result token;
//! permissive mode also accepts `_` and `*` in the token, falls back to a
//! bare `<status> <words>` shape and turns the engine's sentinel values into
//! first-class failures:
//!
//! ```text
//! strict       ^(\d{3})\sresult=(-?[[:alnum:]]*)(\s.*)?$
//! permissive   ^(\d{3})\sresult=(-?[[:alnum:]_*]*)(\s.*)?$
//! fallback     ^(\d{3})\s([\s\w]+)$
//! ```
//!
//! The fallback words are ASCII only. `\d` in the status stays
//! Unicode-aware; non-ASCII digits are rejected when the status is parsed.
//!
//! Parsing is pure: the same line always yields the same [`Response`].

use std::sync::LazyLock;

use regex::{Captures, Match, Regex};

use crate::error::AgiError;
use crate::response::Response;
use crate::{DEAD_CHANNEL_MESSAGE, STATUS_DEAD_CHANNEL, STATUS_OK};

static STRICT_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{3})\sresult=(-?[[:alnum:]]*)(\s.*)?$").expect("Invalid strict regex")
});

static PERMISSIVE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{3})\sresult=(-?[[:alnum:]_*]*)(\s.*)?$")
        .expect("Invalid permissive regex")
});

static FALLBACK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{3})\s((?-u:[\s\w])+)$").expect("Invalid fallback regex")
});

/// Prefix the engine uses to announce that the channel hung up.
const HANGUP_PREFIX: &str = "HANGUP";

/// Result substituted in permissive mode when the token is not a number.
const PERMISSIVE_DEFAULT_RESULT: i64 = 1;

/// Value reported by data-collection commands that got no input.
const TIMEOUT_VALUE: &str = "timeout";

/// Value that, next to a 200 status, means the remote end disconnected.
const HANGUP_VALUE: &str = "-1";

/// Which response grammar to apply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParseMode {
    /// Result must be a signed integer; anything else is a soft failure.
    #[default]
    Strict,
    /// Result may be any token; hangup, timeout and dead-channel replies
    /// are classified explicitly.
    Permissive,
}

/// Parses a single response line.
///
/// Trailing line terminators are ignored. Never fails: problems are
/// reported through [`Response::error`].
pub fn parse_response(line: &str, mode: ParseMode) -> Response {
    let line = line.trim_end_matches(['\r', '\n']);

    if line.starts_with(HANGUP_PREFIX) {
        return Response::failed(AgiError::Hangup);
    }

    match mode {
        ParseMode::Strict => parse_strict(line),
        ParseMode::Permissive => parse_permissive(line),
    }
}

fn parse_strict(line: &str) -> Response {
    let Some(caps) = STRICT_REGEX.captures(line) else {
        return malformed(line);
    };

    let status = match parse_status(&caps[1]) {
        Ok(status) => status,
        Err(err) => return Response::failed(err),
    };

    let token = &caps[2];
    let mut response = Response {
        error: None,
        status,
        result: 0,
        result_string: token.to_string(),
        value: extract_value(caps.get(3)),
    };

    match token.parse::<i64>() {
        Ok(result) => response.result = result,
        Err(e) => {
            response.error = Some(AgiError::InvalidResult {
                token: token.to_string(),
                reason: e.to_string(),
            });
        }
    }

    if status != STATUS_OK {
        response.error = Some(AgiError::protocol(status, status_message(line, &caps)));
    }

    response
}

fn parse_permissive(line: &str) -> Response {
    let Some(caps) = PERMISSIVE_REGEX
        .captures(line)
        .or_else(|| FALLBACK_REGEX.captures(line))
    else {
        return malformed(line);
    };

    let status = match parse_status(&caps[1]) {
        Ok(status) => status,
        Err(err) => return Response::failed(err),
    };

    let token = &caps[2];
    let mut response = Response {
        error: None,
        status,
        result: 0,
        result_string: token.to_string(),
        value: String::new(),
    };

    if status == STATUS_DEAD_CHANNEL {
        response.error = Some(if token.eq_ignore_ascii_case(DEAD_CHANNEL_MESSAGE) {
            AgiError::CommandNotPermitted
        } else {
            AgiError::protocol(status, status_message(line, &caps))
        });
        return response;
    }

    response.result = token.parse().unwrap_or(PERMISSIVE_DEFAULT_RESULT);
    response.value = extract_value(caps.get(3));

    if response.value == TIMEOUT_VALUE {
        response.error = Some(AgiError::Timeout);
    }

    if status == STATUS_OK && response.value == HANGUP_VALUE {
        response.error = Some(AgiError::Hangup);
        return response;
    }

    if status != STATUS_OK {
        response.error = Some(AgiError::protocol(status, status_message(line, &caps)));
    }

    response
}

fn malformed(line: &str) -> Response {
    Response::failed(AgiError::MalformedResponse {
        line: line.to_string(),
    })
}

fn parse_status(token: &str) -> Result<u16, AgiError> {
    token.parse().map_err(|e: std::num::ParseIntError| AgiError::InvalidStatus {
        token: token.to_string(),
        reason: e.to_string(),
    })
}

/// Everything after the status code, used as the message of a protocol error.
fn status_message(line: &str, caps: &Captures<'_>) -> String {
    let end = caps.get(1).map_or(0, |m| m.end());
    line[end..].trim().to_string()
}

/// Trims the text after the result token and unwraps one pair of parentheses.
fn extract_value(rest: Option<Match<'_>>) -> String {
    let trimmed = rest.map_or("", |m| m.as_str()).trim();
    trimmed
        .strip_prefix('(')
        .and_then(|inner| inner.strip_suffix(')'))
        .unwrap_or(trimmed)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strict(line: &str) -> Response {
        parse_response(line, ParseMode::Strict)
    }

    fn permissive(line: &str) -> Response {
        parse_response(line, ParseMode::Permissive)
    }

    mod shared {
        use super::*;

        #[test]
        fn hangup_prefix_short_circuits_in_both_modes() {
            for line in ["HANGUP", "HANGUP 200 result=0", "HANGUPxyz"] {
                assert_eq!(strict(line), Response::failed(AgiError::Hangup));
                assert_eq!(permissive(line), Response::failed(AgiError::Hangup));
            }
        }

        #[test]
        fn unrecognised_line_is_malformed() {
            for line in ["", "garbage", "20 result=1", "200result=1"] {
                let response = strict(line);
                assert!(matches!(
                    response.error,
                    Some(AgiError::MalformedResponse { .. })
                ));
            }
            assert!(matches!(
                permissive("oops!").error,
                Some(AgiError::MalformedResponse { ref line }) if line == "oops!"
            ));
        }

        #[test]
        fn non_ascii_digit_status_is_status_error() {
            // `\d` matches any Unicode digit, which u16 parsing rejects.
            let response = strict("٢٠٠ result=0");
            assert!(matches!(
                response.error,
                Some(AgiError::InvalidStatus { .. })
            ));
            assert_eq!(response.status, 0);
        }

        #[test]
        fn line_terminators_are_ignored() {
            assert_eq!(strict("200 result=0\r\n"), strict("200 result=0"));
        }

        #[test]
        fn parsing_is_idempotent() {
            for line in [
                "200 result=1 (speech)",
                "200 result=abc",
                "511 Command Not Permitted on a dead channel or intercept routine",
                "200 result=-1 (-1)",
            ] {
                assert_eq!(strict(line), strict(line));
                assert_eq!(permissive(line), permissive(line));
            }
        }
    }

    mod strict_mode {
        use super::*;

        #[test]
        fn plain_success() {
            let response = strict("200 result=0");
            assert_eq!(
                response,
                Response {
                    error: None,
                    status: 200,
                    result: 0,
                    result_string: "0".into(),
                    value: String::new(),
                }
            );
        }

        #[test]
        fn negative_result_and_value() {
            let response = strict("200 result=-1 (hello world)");
            assert!(response.is_ok());
            assert_eq!(response.result, -1);
            assert_eq!(response.result_string, "-1");
            assert_eq!(response.value, "hello world");
        }

        #[test]
        fn non_numeric_result_is_soft() {
            let response = strict("200 result=abc (value)");
            assert_eq!(response.status, 200);
            assert_eq!(response.result, 0);
            assert_eq!(response.result_string, "abc");
            assert_eq!(response.value, "value");
            let err = response.error.unwrap();
            assert!(err.is_soft());
        }

        #[test]
        fn empty_result_token_is_soft() {
            let response = strict("200 result=");
            assert_eq!(response.status, 200);
            assert!(response.error.unwrap().is_soft());
        }

        #[test]
        fn underscore_token_is_malformed() {
            assert!(matches!(
                strict("200 result=a_b").error,
                Some(AgiError::MalformedResponse { .. })
            ));
        }

        #[test]
        fn non_200_overrides_result_error() {
            let response = strict("510 result=x (Invalid or unknown command)");
            assert_eq!(response.status, 510);
            assert_eq!(
                response.error,
                Some(AgiError::protocol(
                    510,
                    "result=x (Invalid or unknown command)"
                ))
            );
        }

        #[test]
        fn dead_channel_text_is_malformed_in_strict_mode() {
            let response =
                strict("511 Command Not Permitted on a dead channel or intercept routine");
            assert!(matches!(
                response.error,
                Some(AgiError::MalformedResponse { .. })
            ));
        }

        #[test]
        fn sentinels_are_not_special() {
            let response = strict("200 result=1234 (timeout)");
            assert!(response.is_ok());
            assert_eq!(response.value, "timeout");

            let response = strict("200 result=0 (-1)");
            assert!(response.is_ok());
        }
    }

    mod value_extraction {
        use super::*;

        #[test]
        fn unwraps_one_pair_of_parentheses() {
            assert_eq!(strict("200 result=1 ((nested))").value, "(nested)");
        }

        #[test]
        fn keeps_unbalanced_text() {
            assert_eq!(strict("200 result=1 (open").value, "(open");
            assert_eq!(
                strict("200 result=1 (speech) endpos=1234").value,
                "(speech) endpos=1234"
            );
        }

        #[test]
        fn trims_whitespace() {
            assert_eq!(strict("200 result=1    (x)   ").value, "x");
            assert_eq!(strict("200 result=1 endpos=0").value, "endpos=0");
        }
    }

    mod permissive_mode {
        use super::*;

        #[test]
        fn timeout_value_on_200() {
            let response = permissive("200 result=1234 (timeout)");
            assert_eq!(response.status, 200);
            assert_eq!(response.result, 1234);
            assert_eq!(response.value, "timeout");
            assert_eq!(response.error, Some(AgiError::Timeout));
        }

        #[test]
        fn minus_one_value_on_200_is_hangup() {
            let response = permissive("200 result=0 (-1)");
            assert_eq!(response.status, 200);
            assert_eq!(response.value, "-1");
            assert_eq!(response.error, Some(AgiError::Hangup));
        }

        #[test]
        fn dead_channel_message_any_case() {
            for line in [
                "511 Command Not Permitted on a dead channel or intercept routine",
                "511 command not permitted on a dead channel or intercept routine",
            ] {
                let response = permissive(line);
                assert_eq!(response.status, 511);
                assert_eq!(response.error, Some(AgiError::CommandNotPermitted));
            }
        }

        #[test]
        fn other_511_is_generic() {
            let response = permissive("511 Something else went wrong");
            assert_eq!(response.status, 511);
            assert_eq!(
                response.error,
                Some(AgiError::protocol(511, "Something else went wrong"))
            );
        }

        #[test]
        fn non_numeric_token_defaults_to_one() {
            let response = permissive("200 result=*_12");
            assert!(response.is_ok());
            assert_eq!(response.result, 1);
            assert_eq!(response.result_string, "*_12");
        }

        #[test]
        fn fallback_acknowledgement_line() {
            let response = permissive("200 Thanks for all the fish");
            assert!(response.is_ok());
            assert_eq!(response.status, 200);
            assert_eq!(response.result, 1);
            assert_eq!(response.result_string, "Thanks for all the fish");
            assert_eq!(response.value, "");
        }

        #[test]
        fn fallback_rejects_non_ascii_words() {
            assert!(matches!(
                permissive("200 Übersicht").error,
                Some(AgiError::MalformedResponse { .. })
            ));
            assert!(permissive("200 Uebersicht").is_ok());
        }

        #[test]
        fn non_200_is_generic_error_even_with_timeout_value() {
            let response = permissive("520 result=0 (timeout)");
            assert_eq!(response.status, 520);
            assert_eq!(
                response.error,
                Some(AgiError::protocol(520, "result=0 (timeout)"))
            );
        }

        #[test]
        fn minus_one_result_without_value_is_success() {
            let response = permissive("200 result=-1");
            assert!(response.is_ok());
            assert_eq!(response.result, -1);
        }
    }
}
