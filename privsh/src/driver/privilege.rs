//! Tracking of the session's confirmed privilege level.

use std::sync::Arc;

use log::debug;

use crate::error::{ConfigError, DriverError, Result};
use crate::platform::{PlatformDefinition, PrivilegeGraph, PrivilegeLevel};

/// Tracks which privilege level a session is confirmed to be at.
///
/// The level is only ever set from a prompt actually seen on the wire.
/// While a transition is in flight the level reads as unknown, so a
/// transition that is abandoned halfway (cancelled, or its future dropped)
/// leaves the session unknown rather than at a guessed level.
#[derive(Debug)]
pub struct PrivilegeManager {
    platform: Arc<PlatformDefinition>,

    /// Last confirmed privilege level name.
    current: Option<String>,

    /// A transition started and has not finished.
    in_transition: bool,
}

impl PrivilegeManager {
    /// Create a manager with the level still unknown.
    pub fn new(platform: Arc<PlatformDefinition>) -> Self {
        Self {
            platform,
            current: None,
            in_transition: false,
        }
    }

    /// The privilege tree.
    pub fn graph(&self) -> &PrivilegeGraph {
        &self.platform.privileges
    }

    /// Get the current privilege level, if known.
    pub fn current(&self) -> Option<&PrivilegeLevel> {
        if self.in_transition {
            return None;
        }
        self.last_confirmed()
    }

    /// The last level confirmed from a prompt, ignoring any transition in
    /// flight.
    pub(crate) fn last_confirmed(&self) -> Option<&PrivilegeLevel> {
        self.current.as_deref().and_then(|name| self.graph().get(name))
    }

    /// Record a level confirmed from a prompt.
    pub fn set_current(&mut self, name: &str) -> Result<()> {
        if !self.graph().contains(name) {
            return Err(ConfigError::UnknownPrivilege {
                name: name.to_string(),
            }
            .into());
        }
        if self.current.as_deref() != Some(name) {
            debug!("privilege level now '{}'", name);
        }
        self.current = Some(name.to_string());
        Ok(())
    }

    /// Forget the current level.
    pub fn invalidate(&mut self) {
        self.current = None;
        self.in_transition = false;
    }

    /// Mark the start of a transition. If an earlier transition never
    /// finished, the level it left behind is not trusted.
    pub(crate) fn begin_transition(&mut self) {
        if self.in_transition {
            debug!("previous privilege transition was abandoned; level unknown");
            self.current = None;
        }
        self.in_transition = true;
    }

    pub(crate) fn end_transition(&mut self) {
        self.in_transition = false;
    }

    /// Determine the privilege level whose prompt ends `output`.
    pub fn determine_from_prompt(&self, output: &str) -> Result<&PrivilegeLevel> {
        self.graph()
            .determine(output.as_bytes())
            .ok_or_else(|| {
                DriverError::UnknownPrompt {
                    prompt: last_line(output).to_string(),
                }
                .into()
            })
    }
}

/// Last non-empty line of some output, trimmed; usually the prompt.
pub(crate) fn last_line(output: &str) -> &str {
    output
        .trim_end()
        .rsplit('\n')
        .next()
        .unwrap_or_default()
        .trim()
}
