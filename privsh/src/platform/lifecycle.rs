//! Session open/close steps.
//!
//! Opening and closing a session are both "get to the default level, then
//! run a fixed list of steps". The lists are data on the platform; the
//! driver runs them through one primitive.

use serde::{Deserialize, Serialize};

/// One step of an on-open or on-close sequence.
///
/// Serialized externally tagged, e.g. `{"command": "terminal length 0"}`,
/// `{"raw": "exit"}` or `"return"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStep {
    /// Send a command and wait for a prompt. Fails if the device rejects it.
    Command(String),

    /// Write bytes as-is, without a line terminator. Nothing is awaited.
    Raw(String),

    /// Send a bare line terminator. Nothing is awaited.
    Return,
}

impl LifecycleStep {
    pub fn command(command: impl Into<String>) -> Self {
        Self::Command(command.into())
    }

    pub fn raw(data: impl Into<String>) -> Self {
        Self::Raw(data.into())
    }

    /// Whether the step waits for the device to answer with a prompt.
    pub fn awaits_prompt(&self) -> bool {
        matches!(self, Self::Command(_))
    }
}

/// The usual logout: write the exit command, then a return, and let the
/// device drop the channel.
pub fn logout(command: &str) -> Vec<LifecycleStep> {
    vec![LifecycleStep::raw(command), LifecycleStep::Return]
}
