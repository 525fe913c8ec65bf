//! Transport over any async byte stream.

use std::time::Duration;

use log::trace;
use regex::bytes::Regex;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::Instant;

use super::Transport;
use crate::channel::PatternBuffer;
use crate::error::{ChannelError, Result};

const READ_CHUNK: usize = 4096;

/// [`Transport`] over an already-connected stream (an SSH channel stream, a
/// telnet socket, a serial port, a `tokio::io::duplex` pair in tests...).
///
/// Output is accumulated in a [`PatternBuffer`] so prompts are searched only
/// in the tail, with ANSI escape sequences removed.
#[derive(Debug)]
pub struct StreamTransport<S> {
    stream: S,

    buffer: PatternBuffer,

    /// Line terminator sent by `send_return`.
    return_char: String,
}

impl<S> StreamTransport<S> {
    /// Wrap a connected stream.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            buffer: PatternBuffer::default(),
            return_char: "\n".to_string(),
        }
    }

    /// Use a different line terminator (e.g. `"\r\n"` for some consoles).
    pub fn with_return_char(mut self, return_char: impl Into<String>) -> Self {
        self.return_char = return_char.into();
        self
    }

    /// Search this many bytes from the end of the output for prompts.
    pub fn with_search_depth(mut self, search_depth: usize) -> Self {
        self.buffer = PatternBuffer::new(search_depth);
        self
    }

    /// Output read but not yet returned by `read_until_pattern`.
    pub fn pending(&self) -> &[u8] {
        self.buffer.as_slice()
    }

    /// Give back the underlying stream.
    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl<S> Transport for StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn write(&mut self, data: &[u8]) -> Result<()> {
        self.stream
            .write_all(data)
            .await
            .map_err(ChannelError::Io)?;
        self.stream.flush().await.map_err(ChannelError::Io)?;
        Ok(())
    }

    async fn send_return(&mut self) -> Result<()> {
        self.stream
            .write_all(self.return_char.as_bytes())
            .await
            .map_err(ChannelError::Io)?;
        self.stream.flush().await.map_err(ChannelError::Io)?;
        Ok(())
    }

    async fn read_until_pattern(&mut self, pattern: &Regex, timeout: Duration) -> Result<String> {
        let deadline = Instant::now() + timeout;
        let mut chunk = vec![0u8; READ_CHUNK];

        loop {
            if self.buffer.tail_contains(pattern) {
                let data = self.buffer.take();
                trace!("pattern matched after {} bytes", data.len());
                return Ok(String::from_utf8_lossy(&data).into_owned());
            }

            let read = tokio::time::timeout_at(deadline, self.stream.read(&mut chunk)).await;
            let n = match read {
                Ok(Ok(0)) => return Err(ChannelError::Closed.into()),
                Ok(Ok(n)) => n,
                Ok(Err(e)) => return Err(ChannelError::Io(e).into()),
                Err(_) => return Err(ChannelError::PromptTimeout(timeout).into()),
            };

            self.buffer.extend(&chunk[..n]);
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.stream.shutdown().await.map_err(ChannelError::Io)?;
        Ok(())
    }
}
