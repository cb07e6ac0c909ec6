//! AGI session engine.
//!
//! A [`Session`] owns one stream pair to the engine. Construction reads the
//! handshake block; after that every command is a round-trip: write one
//! line, read one non-blank line, parse it. Round-trips on one session are
//! serialized by an async mutex, so a session can be shared across tasks
//! behind an `Arc`.
//!
//! No deadlines are imposed here. Wrap the streams, or bound the handshake
//! from the front-end, if a silent peer must not block forever. Dropping a
//! round-trip future after its command was written leaves the response
//! unread and desynchronizes the session.

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use fastagi_protocol::{AgiError, AgiResult, ParseMode, Response, Variables, parse_response};
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader,
};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::debug;

use crate::observer::{CommandObserver, CommandRecord, NoopObserver};

/// Type-erased input stream.
pub type BoxedReader = Box<dyn AsyncRead + Send + Unpin>;

/// Type-erased output stream.
pub type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// File descriptor the engine opens for the EAGI audio stream.
#[cfg(unix)]
pub const EAGI_FD: std::os::fd::RawFd = 3;

/// The control stream pair.
struct Channel {
    reader: BufReader<BoxedReader>,
    writer: BoxedWriter,
}

impl Channel {
    /// Writes `command` and reads the reply. Returns the raw line alongside
    /// the parsed response.
    async fn exchange(&mut self, command: &str, mode: ParseMode) -> (String, Response) {
        if let Err(e) = self.send(command).await {
            return (
                String::new(),
                Response::failed(AgiError::transport("send command", &e)),
            );
        }

        match read_content_line(&mut self.reader).await {
            Ok(raw) => {
                let response = parse_response(&raw, mode);
                (raw, response)
            }
            Err(e) => (
                String::new(),
                Response::failed(AgiError::transport("read response", &e)),
            ),
        }
    }

    async fn send(&mut self, command: &str) -> io::Result<()> {
        let mut line = String::with_capacity(command.len() + 1);
        line.push_str(command);
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await
    }
}

/// One conversation with the engine.
pub struct Session {
    variables: Variables,
    channel: Mutex<Option<Channel>>,
    eagi: Mutex<Option<BoxedReader>>,
    observer: Arc<dyn CommandObserver>,
    peer_addr: Option<SocketAddr>,
    owns_connection: bool,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("variables", &self.variables)
            .field("peer_addr", &self.peer_addr)
            .field("owns_connection", &self.owns_connection)
            .finish_non_exhaustive()
    }
}

/// Collects session options before the handshake runs.
pub struct SessionBuilder {
    reader: BoxedReader,
    writer: BoxedWriter,
    eagi: Option<BoxedReader>,
    observer: Arc<dyn CommandObserver>,
    peer_addr: Option<SocketAddr>,
    owns_connection: bool,
}

impl SessionBuilder {
    /// Attaches a side-channel input stream (EAGI audio).
    pub fn with_eagi<R>(mut self, eagi: R) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        self.eagi = Some(Box::new(eagi));
        self
    }

    /// Sets the observer notified of the handshake and each round-trip.
    pub fn with_observer(mut self, observer: Arc<dyn CommandObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Records the remote address, for logging.
    pub fn with_peer_addr(mut self, addr: SocketAddr) -> Self {
        self.peer_addr = Some(addr);
        self
    }

    /// Marks the streams as an owned network connection that
    /// [`Session::close`] shuts down.
    pub fn owning_connection(mut self) -> Self {
        self.owns_connection = true;
        self
    }

    /// Reads the handshake block and returns the ready session.
    ///
    /// Reads until the first blank line. End of stream also ends the block,
    /// keeping whatever variables arrived.
    pub async fn handshake(self) -> AgiResult<Session> {
        let mut reader = BufReader::new(self.reader);
        let variables = read_variables(&mut reader).await?;

        debug!(
            peer = ?self.peer_addr,
            variables = variables.len(),
            request = variables.request().unwrap_or_default(),
            "handshake complete"
        );
        self.observer.on_handshake(&variables);

        Ok(Session {
            variables,
            channel: Mutex::new(Some(Channel {
                reader,
                writer: self.writer,
            })),
            eagi: Mutex::new(self.eagi),
            observer: self.observer,
            peer_addr: self.peer_addr,
            owns_connection: self.owns_connection,
        })
    }
}

impl Session {
    /// Starts building a session over the given streams.
    pub fn builder<R, W>(reader: R, writer: W) -> SessionBuilder
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        SessionBuilder {
            reader: Box::new(reader),
            writer: Box::new(writer),
            eagi: None,
            observer: Arc::new(NoopObserver),
            peer_addr: None,
            owns_connection: false,
        }
    }

    /// Creates a session over the given streams with default options.
    pub async fn new<R, W>(reader: R, writer: W) -> AgiResult<Self>
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self::builder(reader, writer).handshake().await
    }

    /// Creates a session that owns a TCP connection (FastAGI).
    pub async fn from_tcp(
        stream: TcpStream,
        observer: Arc<dyn CommandObserver>,
    ) -> AgiResult<Self> {
        let peer_addr = stream.peer_addr().ok();
        let (reader, writer) = stream.into_split();
        let mut builder = Self::builder(reader, writer)
            .with_observer(observer)
            .owning_connection();
        if let Some(addr) = peer_addr {
            builder = builder.with_peer_addr(addr);
        }
        builder.handshake().await
    }

    /// Builder over the process's stdin and stdout (AGI mode).
    pub fn stdio_builder() -> SessionBuilder {
        Self::builder(tokio::io::stdin(), tokio::io::stdout())
    }

    /// Creates a session over stdin and stdout.
    pub async fn stdio() -> AgiResult<Self> {
        Self::stdio_builder().handshake().await
    }

    /// Builder over stdin and stdout with the audio stream on fd 3 (EAGI mode).
    ///
    /// Only call this when the process was started by the engine as an EAGI
    /// script; fd 3 must be open and owned by nobody else.
    #[cfg(unix)]
    pub fn eagi_stdio_builder() -> SessionBuilder {
        use std::os::fd::FromRawFd;

        // SAFETY: in EAGI mode the engine hands the process an open, otherwise
        // unused descriptor 3; this takes sole ownership of it.
        let audio = unsafe { std::fs::File::from_raw_fd(EAGI_FD) };
        Self::stdio_builder().with_eagi(tokio::fs::File::from_std(audio))
    }

    /// Creates an EAGI session over stdin, stdout and fd 3.
    #[cfg(unix)]
    pub async fn eagi_stdio() -> AgiResult<Self> {
        Self::eagi_stdio_builder().handshake().await
    }

    /// Variables received during the handshake.
    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    /// Returns one handshake variable.
    pub fn variable(&self, key: &str) -> Option<&str> {
        self.variables.get(key)
    }

    /// Remote address of an owned network connection.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.peer_addr
    }

    /// Takes the side-channel stream. Returns `None` if there is none or it
    /// was already taken.
    pub async fn take_eagi(&self) -> Option<BoxedReader> {
        self.eagi.lock().await.take()
    }

    /// Whether [`close`](Self::close) released the connection.
    pub async fn is_closed(&self) -> bool {
        self.channel.lock().await.is_none()
    }

    /// Sends a command whose result is a signed integer.
    ///
    /// Parts are joined with single spaces. Arguments containing spaces must
    /// already be quoted.
    pub async fn command<I, S>(&self, parts: I) -> Response
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.round_trip(join_parts(parts), ParseMode::Strict).await
    }

    /// Sends a command whose result may be non-numeric, classifying
    /// hangup, timeout and dead-channel replies.
    pub async fn command_permissive<I, S>(&self, parts: I) -> Response
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.round_trip(join_parts(parts), ParseMode::Permissive)
            .await
    }

    async fn round_trip(&self, command: String, mode: ParseMode) -> Response {
        let mut channel = self.channel.lock().await;

        let (raw, response) = match channel.as_mut() {
            Some(channel) => channel.exchange(&command, mode).await,
            None => (String::new(), Response::failed(AgiError::SessionClosed)),
        };

        self.observer.on_command(&CommandRecord {
            command: &command,
            raw: &raw,
            response: &response,
        });

        response
    }

    /// Releases the connection.
    ///
    /// For an owned network connection the write half is shut down and both
    /// halves are dropped; later commands fail with
    /// [`AgiError::SessionClosed`]. Other sessions only flush their output.
    pub async fn close(&self) -> AgiResult<()> {
        let mut channel = self.channel.lock().await;

        if !self.owns_connection {
            if let Some(channel) = channel.as_mut() {
                channel
                    .writer
                    .flush()
                    .await
                    .map_err(|e| AgiError::transport("flush output", &e))?;
            }
            return Ok(());
        }

        if let Some(mut released) = channel.take() {
            let result = released.writer.shutdown().await;
            drop(released);
            debug!(peer = ?self.peer_addr, "session closed");
            result.map_err(|e| AgiError::transport("close connection", &e))?;
        }
        Ok(())
    }
}

fn join_parts<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut command = String::new();
    for part in parts {
        if !command.is_empty() {
            command.push(' ');
        }
        command.push_str(part.as_ref());
    }
    command
}

async fn read_variables<R>(reader: &mut R) -> AgiResult<Variables>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = Vec::new();
    let mut buf = Vec::new();

    while let Some(line) = read_line_lossy(reader, &mut buf)
        .await
        .map_err(|e| AgiError::transport("read handshake", &e))?
    {
        if line.is_empty() {
            break;
        }
        lines.push(line);
    }

    Ok(Variables::from_lines(lines.iter().map(String::as_str)))
}

/// Reads the next non-blank line, without its terminator.
async fn read_content_line<R>(reader: &mut R) -> io::Result<String>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    loop {
        match read_line_lossy(reader, &mut buf).await? {
            Some(line) if line.is_empty() => continue,
            Some(line) => return Ok(line),
            None => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed before a response was received",
                ));
            }
        }
    }
}

/// Reads one line without its terminator. `None` at end of stream.
///
/// The engine forwards channel data as raw bytes, so invalid UTF-8 is
/// replaced rather than treated as a stream failure.
async fn read_line_lossy<R>(reader: &mut R, buf: &mut Vec<u8>) -> io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    buf.clear();
    if reader.read_until(b'\n', buf).await? == 0 {
        return Ok(None);
    }

    let line = String::from_utf8_lossy(buf);
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}
