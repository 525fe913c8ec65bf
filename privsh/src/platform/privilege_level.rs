//! Privilege level definition.

use regex::bytes::Regex;

use crate::channel::{PromptMatcher, compile_prompt_pattern, find_at_tail};

/// A privilege level definition for a network device.
///
/// Privilege levels form a tree where each level has a parent
/// (previous_priv) and commands to escalate/de-escalate between them.
#[derive(Debug, Clone)]
pub struct PrivilegeLevel {
    /// Name of this privilege level (e.g., "exec", "privilege_exec", "configuration").
    pub name: String,

    /// Regex pattern to match the prompt for this privilege level.
    pub pattern: Regex,

    /// Name of the parent privilege level (None for root level).
    pub previous_priv: Option<String>,

    /// Command to escalate TO this level from the parent.
    pub escalate_command: Option<String>,

    /// Command to de-escalate FROM this level to the parent.
    pub deescalate_command: Option<String>,

    /// Whether escalation requires authentication (password).
    pub escalate_auth: bool,

    /// Pattern to match the authentication prompt (if escalate_auth is true).
    pub escalate_prompt: Option<Regex>,

    /// Strings that must NOT be in the prompt for this level to match.
    /// Used for disambiguation (e.g., "#" matches both priv and config modes).
    pub not_contains: Vec<String>,
}

impl PrivilegeLevel {
    /// Create a new privilege level with minimal required fields.
    ///
    /// The pattern is compiled case-insensitive and multi-line.
    pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            name: name.into(),
            pattern: compile_prompt_pattern(pattern)?,
            previous_priv: None,
            escalate_command: None,
            deescalate_command: None,
            escalate_auth: false,
            escalate_prompt: None,
            not_contains: vec![],
        })
    }

    /// Set the parent privilege level.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.previous_priv = Some(parent.into());
        self
    }

    /// Set the escalation command. An empty command means the level is
    /// entered without any action.
    pub fn with_escalate(mut self, command: impl Into<String>) -> Self {
        self.escalate_command = non_empty(command.into());
        self
    }

    /// Set the de-escalation command.
    pub fn with_deescalate(mut self, command: impl Into<String>) -> Self {
        self.deescalate_command = non_empty(command.into());
        self
    }

    /// Set that escalation requires authentication.
    pub fn with_auth(mut self, prompt_pattern: &str) -> Result<Self, regex::Error> {
        self.escalate_auth = true;
        self.escalate_prompt = Some(compile_prompt_pattern(prompt_pattern)?);
        Ok(self)
    }

    /// Add a not_contains pattern.
    pub fn with_not_contains(mut self, pattern: impl Into<String>) -> Self {
        self.not_contains.push(pattern.into());
        self
    }

    /// Whether this is the root of its tree.
    pub fn is_root(&self) -> bool {
        self.previous_priv.is_none()
    }

    /// Check if `output` ends in this level's prompt.
    pub fn matches(&self, output: &[u8]) -> bool {
        self.find_match(output).is_some()
    }
}

impl PromptMatcher for PrivilegeLevel {
    fn find_match(&self, data: &[u8]) -> Option<usize> {
        let m = find_at_tail(&self.pattern, data)?;
        let prompt = String::from_utf8_lossy(m.as_bytes());

        // not_contains only looks at the prompt itself, not the output before it
        if self.not_contains.iter().any(|nc| prompt.contains(nc.as_str())) {
            return None;
        }

        Some(m.end())
    }
}

fn non_empty(command: String) -> Option<String> {
    if command.trim().is_empty() {
        None
    } else {
        Some(command)
    }
}
