//! High-level commands.
//!
//! Each method turns typed arguments into one command line and delegates to
//! [`Session::command`] or [`Session::command_permissive`]. Methods that
//! return a value hand back the owned text, since the response is dropped.

use std::time::Duration;

use chrono::{DateTime, TimeZone};
use fastagi_core::{ChannelState, epoch, escape_digits, millis, quote, seconds};
use fastagi_protocol::{AgiError, AgiResult, Response};

use crate::session::Session;

/// Silence played by `GET DATA` when no prompt is given.
const DEFAULT_PROMPT: &str = "silence/1";

/// Format used by `SAY DATETIME` when none is given.
const DEFAULT_DATETIME_FORMAT: &str = "ABdY 'digits/at' IMp";

/// Time zone used by `SAY DATETIME` when none is given.
const DEFAULT_TIME_ZONE: &str = "UTC";

/// Options for [`Session::record`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordOptions {
    /// Audio format of the file. Defaults to `wav`.
    pub format: String,
    /// Digits that stop the recording. Defaults to `#`; may not be empty.
    pub escape_digits: String,
    /// Maximum recording length. Defaults to five minutes.
    pub timeout: Duration,
    /// Silence that ends the recording, to the second. Zero disables it.
    pub silence: Duration,
    /// Play a beep before recording.
    pub beep: bool,
    /// Samples to skip at the start of the recording.
    pub offset: u64,
}

impl Default for RecordOptions {
    fn default() -> Self {
        Self {
            format: "wav".to_string(),
            escape_digits: "#".to_string(),
            timeout: Duration::from_secs(5 * 60),
            silence: Duration::ZERO,
            beep: false,
            offset: 0,
        }
    }
}

impl RecordOptions {
    fn command_parts(&self, name: &str) -> Vec<String> {
        let defaults = Self::default();
        let format = if self.format.is_empty() {
            defaults.format
        } else {
            self.format.clone()
        };
        let escape = if self.escape_digits.is_empty() {
            defaults.escape_digits
        } else {
            self.escape_digits.clone()
        };
        let timeout = if self.timeout.is_zero() {
            defaults.timeout
        } else {
            self.timeout
        };

        let mut parts = vec![
            "RECORD FILE".to_string(),
            name.to_string(),
            format,
            escape,
            millis(timeout),
        ];
        if self.offset > 0 {
            parts.push(self.offset.to_string());
        }
        if self.beep {
            parts.push("BEEP".to_string());
        }
        if !self.silence.is_zero() {
            parts.push(format!("s={}", seconds(self.silence)));
        }
        parts
    }
}

/// Log levels accepted by the engine's `Log` application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warning,
    Notice,
    Debug,
    Verbose,
    Dtmf,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
            Self::Notice => "NOTICE",
            Self::Debug => "DEBUG",
            Self::Verbose => "VERBOSE",
            Self::Dtmf => "DTMF",
        }
    }
}

fn into_value(response: Response) -> AgiResult<String> {
    response.check()?;
    Ok(response.value)
}

fn into_result_token(response: Response) -> AgiResult<String> {
    response.check()?;
    Ok(response.result_string)
}

impl Session {
    /// Answers the channel.
    pub async fn answer(&self) -> AgiResult<()> {
        self.command(["ANSWER"]).await.check()
    }

    /// Hangs up the channel.
    pub async fn hangup(&self) -> AgiResult<()> {
        self.command(["HANGUP"]).await.check()
    }

    /// Returns the state of the channel.
    pub async fn status(&self) -> AgiResult<ChannelState> {
        let token = into_result_token(self.command(["CHANNEL STATUS"]).await)?;
        let invalid = |reason: String| AgiError::InvalidResult {
            token: token.clone(),
            reason,
        };
        let number: i64 = token
            .parse()
            .map_err(|e: std::num::ParseIntError| invalid(e.to_string()))?;
        ChannelState::try_from(number).map_err(|e| invalid(e.to_string()))
    }

    /// Runs a dialplan application and returns its value.
    pub async fn exec(&self, application: &str, args: &[&str]) -> AgiResult<String> {
        let mut parts = vec!["EXEC", application];
        parts.extend_from_slice(args);
        into_value(self.command(parts).await)
    }

    /// Reads a channel variable. `None` when it is not set.
    pub async fn get_variable(&self, key: &str) -> AgiResult<Option<String>> {
        let response = self.command(["GET VARIABLE", key]).await;
        response.check()?;
        if response.result == 0 {
            return Ok(None);
        }
        Ok(Some(response.value))
    }

    /// Sets a channel variable. The value is quoted.
    pub async fn set_variable(&self, key: &str, value: &str) -> AgiResult<()> {
        self.command(["SET VARIABLE", key, quote(value).as_str()])
            .await
            .check()
    }

    /// Sends a `SET <key> <value>` channel setting (`CALLERID`, `CONTEXT`, ...).
    pub async fn set_raw(&self, key: &str, value: &str) -> AgiResult<()> {
        self.command(["SET", key, value]).await.check()
    }

    /// Plays `sound` and collects up to `max_digits` DTMF digits.
    ///
    /// An empty `sound` plays one second of silence. Returns the digits;
    /// a timeout is reported as [`AgiError::Timeout`].
    pub async fn get_data(
        &self,
        sound: &str,
        timeout: Duration,
        max_digits: u32,
    ) -> AgiResult<String> {
        let sound = if sound.is_empty() { DEFAULT_PROMPT } else { sound };
        let response = self
            .command_permissive([
                "GET DATA",
                sound,
                millis(timeout).as_str(),
                max_digits.to_string().as_str(),
            ])
            .await;
        into_result_token(response)
    }

    /// Records audio into `name`.
    pub async fn record(&self, name: &str, options: &RecordOptions) -> AgiResult<()> {
        self.command(options.command_parts(name)).await.check()
    }

    /// Spells out `text` character by character.
    pub async fn say_alpha(&self, text: &str, escape: &str) -> AgiResult<String> {
        self.say("SAY ALPHA", text, escape).await
    }

    /// Reads out `number` digit by digit.
    pub async fn say_digits(&self, number: &str, escape: &str) -> AgiResult<String> {
        self.say("SAY DIGITS", number, escape).await
    }

    /// Reads out `number` as a whole number.
    pub async fn say_number(&self, number: &str, escape: &str) -> AgiResult<String> {
        self.say("SAY NUMBER", number, escape).await
    }

    /// Spells out `phrase` using the phonetic alphabet.
    pub async fn say_phonetic(&self, phrase: &str, escape: &str) -> AgiResult<String> {
        self.say("SAY PHONETIC", phrase, escape).await
    }

    /// Reads out the date of `when`.
    pub async fn say_date<Tz: TimeZone>(
        &self,
        when: &DateTime<Tz>,
        escape: &str,
    ) -> AgiResult<String> {
        self.say("SAY DATE", epoch(when).as_str(), escape).await
    }

    /// Reads out the time of `when`.
    pub async fn say_time<Tz: TimeZone>(
        &self,
        when: &DateTime<Tz>,
        escape: &str,
    ) -> AgiResult<String> {
        self.say("SAY TIME", epoch(when).as_str(), escape).await
    }

    /// Reads out `when` using a voicemail.conf style `format` in `zone`.
    pub async fn say_datetime<Tz: TimeZone>(
        &self,
        when: &DateTime<Tz>,
        escape: &str,
        format: Option<&str>,
        zone: Option<&str>,
    ) -> AgiResult<String> {
        let format = quote(format.unwrap_or(DEFAULT_DATETIME_FORMAT));
        let response = self
            .command([
                "SAY DATETIME",
                epoch(when).as_str(),
                escape_digits(escape),
                format.as_str(),
                zone.unwrap_or(DEFAULT_TIME_ZONE),
            ])
            .await;
        into_value(response)
    }

    async fn say(&self, verb: &str, what: &str, escape: &str) -> AgiResult<String> {
        into_value(self.command([verb, what, escape_digits(escape)]).await)
    }

    /// Plays a sound file, starting `offset` samples in.
    pub async fn stream_file(&self, name: &str, escape: &str, offset: u64) -> AgiResult<String> {
        let response = self
            .command([
                "STREAM FILE",
                name,
                escape_digits(escape),
                offset.to_string().as_str(),
            ])
            .await;
        into_value(response)
    }

    /// Writes `message` to the engine's verbose log at `level`.
    pub async fn verbose(&self, message: &str, level: u8) -> AgiResult<()> {
        self.command(["VERBOSE", quote(message).as_str(), level.to_string().as_str()])
            .await
            .check()
    }

    /// Writes `message` to the engine log through the `Log` application.
    pub async fn log(&self, level: LogLevel, message: &str) -> AgiResult<()> {
        self.exec("Log", &[level.as_str(), message]).await.map(drop)
    }

    pub async fn log_error(&self, message: &str) -> AgiResult<()> {
        self.log(LogLevel::Error, message).await
    }

    pub async fn log_warning(&self, message: &str) -> AgiResult<()> {
        self.log(LogLevel::Warning, message).await
    }

    pub async fn log_notice(&self, message: &str) -> AgiResult<()> {
        self.log(LogLevel::Notice, message).await
    }

    pub async fn log_debug(&self, message: &str) -> AgiResult<()> {
        self.log(LogLevel::Debug, message).await
    }

    pub async fn log_verbose(&self, message: &str) -> AgiResult<()> {
        self.log(LogLevel::Verbose, message).await
    }

    pub async fn log_dtmf(&self, message: &str) -> AgiResult<()> {
        self.log(LogLevel::Dtmf, message).await
    }

    /// Waits for one DTMF digit. `None` when nothing was pressed in time.
    pub async fn wait_for_digit(&self, timeout: Duration) -> AgiResult<Option<char>> {
        let response = self.command(["WAIT FOR DIGIT", millis(timeout).as_str()]).await;
        response.check()?;
        let digit = u32::try_from(response.result)
            .ok()
            .and_then(char::from_u32)
            .filter(|c| !c.is_control());
        Ok(digit)
    }

    /// Waits for `iterations` stretches of `silence`, then returns `WAITSTATUS`.
    pub async fn wait_for_silence(
        &self,
        silence: Duration,
        iterations: u32,
        timeout: Option<Duration>,
    ) -> AgiResult<String> {
        let silence = millis(silence);
        let iterations = iterations.to_string();
        let timeout = timeout.map(seconds);

        let mut args = vec![silence.as_str(), iterations.as_str()];
        if let Some(timeout) = &timeout {
            args.push(timeout.as_str());
        }
        self.exec("WaitForSilence", &args).await?;
        self.status_variable("WAITSTATUS").await
    }

    /// Plays files one after another, then returns `PLAYBACKSTATUS`.
    pub async fn exec_playback(&self, files: &[&str]) -> AgiResult<String> {
        self.exec("Playback", &[files.join("&").as_str()]).await?;
        self.status_variable("PLAYBACKSTATUS").await
    }

    /// Plays files while accepting an extension, then returns `BACKGROUNDSTATUS`.
    pub async fn exec_background(&self, files: &[&str]) -> AgiResult<String> {
        self.exec("BackGround", &[files.join("&").as_str()]).await?;
        self.status_variable("BACKGROUNDSTATUS").await
    }

    async fn status_variable(&self, key: &str) -> AgiResult<String> {
        Ok(self.get_variable(key).await?.unwrap_or_default())
    }
}
