//! Response type for command execution results.

use std::fmt;
use std::time::Duration;

use crate::error::{DriverError, Result};

/// Response from a command execution.
#[derive(Debug, Clone)]
pub struct Response {
    /// The command that was executed.
    pub command: String,

    /// The command output (normalized - command echo and trailing prompt removed).
    pub result: String,

    /// The raw output before normalization.
    pub raw_result: String,

    /// The prompt line the output ended with.
    pub prompt: String,

    /// Time taken to execute the command.
    pub elapsed: Duration,

    /// Rejection phrase the device answered with, if any.
    pub failure_message: Option<String>,
}

impl Response {
    /// Create a new successful response.
    pub fn new(
        command: impl Into<String>,
        result: impl Into<String>,
        raw_result: impl Into<String>,
        prompt: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            command: command.into(),
            result: result.into(),
            raw_result: raw_result.into(),
            prompt: prompt.into(),
            elapsed,
            failure_message: None,
        }
    }

    /// Create a failed response.
    pub fn failed(
        command: impl Into<String>,
        result: impl Into<String>,
        raw_result: impl Into<String>,
        prompt: impl Into<String>,
        elapsed: Duration,
        failure_message: impl Into<String>,
    ) -> Self {
        Self {
            failure_message: Some(failure_message.into()),
            ..Self::new(command, result, raw_result, prompt, elapsed)
        }
    }

    /// Check if the response indicates success.
    pub fn is_success(&self) -> bool {
        self.failure_message.is_none()
    }

    /// Turn a rejected command into [`DriverError::CommandRejected`].
    pub fn into_checked(self) -> Result<Self> {
        match self.failure_message {
            Some(matched) => Err(DriverError::CommandRejected {
                command: self.command,
                matched,
                output: self.raw_result,
            }
            .into()),
            None => Ok(self),
        }
    }

    /// Get the result lines as an iterator.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.result.lines()
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.result)
    }
}
