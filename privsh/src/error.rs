//! Error types for privsh.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Main error type for privsh operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Platform or privilege graph configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Channel operation errors
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Driver-level errors
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),
}

impl Error {
    /// Whether the underlying channel is gone.
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Error::Channel(ChannelError::Closed))
    }

    /// Whether a read ran out of time waiting for a prompt.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Channel(ChannelError::PromptTimeout(_)))
    }
}

/// Configuration errors. These are raised while building a platform or
/// before any transport I/O, never mid-transition.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A privilege level name was referenced but never defined
    #[error("Unknown privilege level '{name}'")]
    UnknownPrivilege { name: String },

    /// A level names a parent that does not exist
    #[error("Privilege level '{level}' references missing parent '{parent}'")]
    MissingParent { level: String, parent: String },

    /// The parent chain loops back on itself
    #[error("Privilege level '{level}' is part of a parent cycle")]
    Cycle { level: String },

    /// The levels do not form a single rooted tree
    #[error("Privilege graph must have exactly one root, found {roots:?}")]
    Disconnected { roots: Vec<String> },

    /// Two levels cannot be told apart by their prompts.
    ///
    /// Only identical pattern sources with identical exclusions are caught.
    /// Patterns that merely overlap are allowed; `determine` then takes the
    /// first matching level in declaration order.
    #[error("Privilege levels '{first}' and '{second}' share the prompt pattern '{pattern}'")]
    AmbiguousPattern {
        first: String,
        second: String,
        pattern: String,
    },

    /// Level defined twice
    #[error("Duplicate privilege level '{name}'")]
    DuplicatePrivilege { name: String },

    /// Invalid regex pattern
    #[error("Invalid regex pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Invalid platform definition
    #[error("Invalid platform definition: {message}")]
    InvalidDefinition { message: String },

    /// Platform not found in the registry
    #[error("Unknown platform '{name}'")]
    UnknownPlatform { name: String },

    /// Platform registered twice
    #[error("Platform '{name}' is already registered")]
    AlreadyRegistered { name: String },
}

/// Channel layer errors (pattern matching, reads and writes).
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Pattern matching timed out
    #[error("Prompt not found within {0:?}")]
    PromptTimeout(Duration),

    /// Channel closed unexpectedly
    #[error("Channel closed")]
    Closed,

    /// I/O error on the underlying stream
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Driver layer errors (privilege transitions and lifecycle).
#[derive(Error, Debug)]
pub enum DriverError {
    /// Driver has no transport attached
    #[error("Driver not connected")]
    NotConnected,

    /// The destination prompt of a hop never appeared
    #[error("Transition from '{from}' to '{to}' timed out after {timeout:?}")]
    TransitionTimeout {
        from: String,
        to: String,
        timeout: Duration,
    },

    /// The authentication sub-dialog did not end at the target prompt
    #[error("Authentication failed escalating to '{level}': {reason}")]
    AuthFailed { level: String, reason: String },

    /// The device answered with a rejection phrase
    #[error("Command '{command}' rejected by device ({matched}): {output}")]
    CommandRejected {
        command: String,
        matched: String,
        output: String,
    },

    /// A hop landed on a different level than the one requested
    #[error("Expected privilege '{expected}' but device is at '{found}'")]
    UnexpectedPrivilege { expected: String, found: String },

    /// No command is defined for a hop
    #[error("No command defined to move from '{from}' to '{to}'")]
    NoTransition { from: String, to: String },

    /// Output ended in a prompt no level recognises
    #[error("Unknown privilege level from prompt: '{prompt}'")]
    UnknownPrompt { prompt: String },

    /// The caller cancelled an in-flight acquisition
    #[error("Privilege acquisition of '{target}' cancelled")]
    Cancelled { target: String },
}

/// Result type alias using privsh's Error.
pub type Result<T> = std::result::Result<T, Error>;
