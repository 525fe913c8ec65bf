//! Scripted transport shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::time::Duration;

use privsh::Transport;
use privsh::channel::find_at_tail;
use privsh::error::{ChannelError, Result};
use regex::bytes::Regex;

/// What the device does in answer to one `read_until_pattern`.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Print this text. If it does not end in the awaited prompt the read
    /// times out, just as a real channel would.
    Output(String),

    /// Print nothing.
    Timeout,

    /// Drop the channel.
    Closed,

    /// Never answer.
    Hang,
}

pub fn output(text: &str) -> Reply {
    Reply::Output(text.to_string())
}

/// A transport that replays canned device output and records what was sent.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    replies: VecDeque<Reply>,

    /// Everything written, with each return recorded as `\n`.
    sent: String,

    closed: bool,
}

impl ScriptedTransport {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: replies.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> &str {
        &self.sent
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn replies_left(&self) -> usize {
        self.replies.len()
    }
}

impl Transport for ScriptedTransport {
    async fn write(&mut self, data: &[u8]) -> Result<()> {
        if self.closed {
            return Err(ChannelError::Closed.into());
        }
        self.sent.push_str(&String::from_utf8_lossy(data));
        Ok(())
    }

    async fn send_return(&mut self) -> Result<()> {
        self.write(b"\n").await
    }

    async fn read_until_pattern(&mut self, pattern: &Regex, timeout: Duration) -> Result<String> {
        match self.replies.pop_front() {
            Some(Reply::Output(text)) if find_at_tail(pattern, text.as_bytes()).is_some() => {
                Ok(text)
            }
            Some(Reply::Output(_)) | Some(Reply::Timeout) | None => {
                Err(ChannelError::PromptTimeout(timeout).into())
            }
            Some(Reply::Closed) => {
                self.closed = true;
                Err(ChannelError::Closed.into())
            }
            Some(Reply::Hang) => std::future::pending().await,
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
