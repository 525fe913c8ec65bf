//! Transport seam.
//!
//! The driver never opens connections itself. It talks to an already
//! established interactive channel through [`Transport`]: write bytes, send a
//! line terminator, and read until a prompt pattern shows up at the tail of
//! the output.

mod secret;
mod stream;

pub use secret::{LevelSecrets, NoSecret, SecretProvider, StaticSecret};
pub use stream::StreamTransport;

use std::future::Future;
use std::time::Duration;

use regex::bytes::Regex;

use crate::error::Result;

/// An interactive text channel to a device.
///
/// Every read is bounded by a timeout; running out of time is
/// [`ChannelError::PromptTimeout`](crate::error::ChannelError::PromptTimeout).
/// A channel that reaches end of stream reports
/// [`ChannelError::Closed`](crate::error::ChannelError::Closed).
pub trait Transport: Send {
    /// Write raw bytes.
    fn write(&mut self, data: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Write a bare line terminator.
    fn send_return(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Read until the tail of the accumulated output matches `pattern`,
    /// returning everything read since the previous successful call.
    fn read_until_pattern(
        &mut self,
        pattern: &Regex,
        timeout: Duration,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Shut the channel down.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Write a line followed by the line terminator.
    fn send_line(&mut self, line: &str) -> impl Future<Output = Result<()>> + Send {
        async move {
            self.write(line.as_bytes()).await?;
            self.send_return().await
        }
    }
}

/// Lend a transport to a driver while keeping ownership of it.
impl<T: Transport> Transport for &mut T {
    fn write(&mut self, data: &[u8]) -> impl Future<Output = Result<()>> + Send {
        (**self).write(data)
    }

    fn send_return(&mut self) -> impl Future<Output = Result<()>> + Send {
        (**self).send_return()
    }

    fn read_until_pattern(
        &mut self,
        pattern: &Regex,
        timeout: Duration,
    ) -> impl Future<Output = Result<String>> + Send {
        (**self).read_until_pattern(pattern, timeout)
    }

    fn close(&mut self) -> impl Future<Output = Result<()>> + Send {
        (**self).close()
    }
}
