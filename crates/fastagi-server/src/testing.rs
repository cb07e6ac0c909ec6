//! Test doubles shared by the unit tests of this crate.

use std::sync::Mutex;

use fastagi_protocol::Variables;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};

use crate::observer::{CommandObserver, CommandRecord};
use crate::session::Session;

/// Builds a session over an in-memory pipe. `handshake` and `responses` are
/// queued on the engine side before the session starts, so commands find
/// their replies already waiting.
pub(crate) async fn scripted_session(handshake: &str, responses: &str) -> (Session, DuplexStream) {
    let (client, mut engine) = tokio::io::duplex(64 * 1024);
    engine.write_all(handshake.as_bytes()).await.unwrap();
    engine.write_all(responses.as_bytes()).await.unwrap();

    let (reader, writer) = tokio::io::split(client);
    let session = Session::new(reader, writer).await.unwrap();
    (session, engine)
}

/// Reads `count` command lines written by the session.
pub(crate) async fn read_commands(engine: &mut DuplexStream, count: usize) -> Vec<String> {
    let mut reader = BufReader::new(engine);
    let mut commands = Vec::with_capacity(count);
    for _ in 0..count {
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        commands.push(line.trim_end().to_string());
    }
    commands
}

/// Observer that keeps `(command, raw, summary)` triples.
#[derive(Default)]
pub(crate) struct RecordingObserver {
    handshakes: Mutex<usize>,
    records: Mutex<Vec<(String, String, String)>>,
}

impl RecordingObserver {
    pub(crate) fn handshakes(&self) -> usize {
        *self.handshakes.lock().unwrap()
    }

    pub(crate) fn records(&self) -> Vec<(String, String, String)> {
        self.records.lock().unwrap().clone()
    }
}

impl CommandObserver for RecordingObserver {
    fn on_handshake(&self, _variables: &Variables) {
        *self.handshakes.lock().unwrap() += 1;
    }

    fn on_command(&self, record: &CommandRecord<'_>) {
        self.records.lock().unwrap().push((
            record.command.to_string(),
            record.raw.to_string(),
            record.response.summary(),
        ));
    }
}
