//! # Transport Layer for MCP
//!
//! Transports move [`JsonRpcMessage`]s between the host and the server. The
//! reference deployment is [`StdioTransport`]: the host spawns this process and
//! exchanges newline-delimited JSON over its stdin and stdout.
//!
//! ## Custom Transports
//!
//! Implement the [`Transport`] trait to serve over another channel. The server
//! polls [`Transport::read_message`] concurrently with in-flight tool calls, so
//! implementations must make it cancel safe.

use async_trait::async_trait;
use eyre::{Result, WrapErr};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::message::JsonRpcMessage;

/// Transport trait for abstracting I/O mechanisms for MCP communication
#[async_trait]
pub trait Transport: Send {
    /// Read a message from the transport
    ///
    /// Returns `None` once the peer has closed the stream. A frame that is not a
    /// valid message yields an error wrapping the [`serde_json::Error`]; the
    /// transport stays usable after such an error.
    ///
    /// Dropping the returned future before it completes must not lose data.
    async fn read_message(&mut self) -> Result<Option<JsonRpcMessage>>;

    /// Write a message to the transport
    async fn write_message(&mut self, message: &JsonRpcMessage) -> Result<()>;
}

/// Newline-delimited JSON over a pair of byte streams
///
/// By default this is the process's standard input and output, which is how MCP
/// hosts talk to locally spawned servers. Any reader/writer pair can be used
/// instead, e.g. a [`tokio::io::duplex`] stream in tests.
pub struct StdioTransport<R = tokio::io::Stdin, W = tokio::io::Stdout> {
    /// Buffered reader over the input stream
    reader: BufReader<R>,

    /// Bytes of the current line; survives a cancelled read
    line: Vec<u8>,

    /// Writer for the output stream
    writer: W,
}

impl StdioTransport {
    /// Create a transport over standard input and output
    #[must_use]
    pub fn new() -> Self {
        Self::with_streams(tokio::io::stdin(), tokio::io::stdout())
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, W> StdioTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn with_streams(reader: R, writer: W) -> Self {
        Self {
            reader: BufReader::new(reader),
            line: Vec::new(),
            writer,
        }
    }
}

#[async_trait]
impl<R, W> Transport for StdioTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn read_message(&mut self) -> Result<Option<JsonRpcMessage>> {
        // Partial reads stay in `self.line`, so a dropped future loses nothing.
        loop {
            let read = self
                .reader
                .read_until(b'\n', &mut self.line)
                .await
                .wrap_err("Failed to read from transport")?;

            if read == 0 && self.line.is_empty() {
                return Ok(None); // EOF
            }

            // Frames are decoded from bytes: invalid UTF-8 is a JSON error, not an I/O one.
            let frame = self.line.trim_ascii();
            if frame.is_empty() {
                self.line.clear();
                continue;
            }

            let message: serde_json::Result<JsonRpcMessage> = serde_json::from_slice(frame);
            self.line.clear();
            return Ok(Some(message?));
        }
    }

    async fn write_message(&mut self, message: &JsonRpcMessage) -> Result<()> {
        let json = serde_json::to_string(message)?;
        self.writer.write_all(json.as_bytes()).await?;
        self.writer.write_all(b"\n").await?; // Newline delimiter
        self.writer.flush().await?;
        Ok(())
    }
}
