//! Serde-friendly platform configuration.
//!
//! Lets a platform be described in data (JSON, YAML, TOML...) instead of
//! code. Everything is validated when converted into a
//! [`PlatformDefinition`].

use std::time::Duration;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::definition::{DEFAULT_TIMEOUT, PlatformDefinition};
use super::lifecycle::LifecycleStep;
use super::privilege_level::PrivilegeLevel;
use crate::error::{ConfigError, Result};

/// One privilege level, keyed by name in [`PlatformConfig::privilege_levels`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivilegeLevelConfig {
    /// Prompt regex for this level.
    pub pattern: String,

    /// Name of the parent level; absent for the root.
    pub parent: Option<String>,

    /// Command sent from the parent to enter this level.
    pub escalate: Option<String>,

    /// Command sent from this level to return to the parent.
    pub deescalate: Option<String>,

    /// Whether entering this level asks for a secret.
    pub escalate_auth: bool,

    /// Pattern of the secret prompt.
    pub escalate_prompt: Option<String>,

    /// Substrings that disqualify a prompt from this level.
    pub not_contains: Vec<String>,
}

/// A full platform described as data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformConfig {
    pub name: String,

    /// Levels in declaration order.
    pub privilege_levels: IndexMap<String, PrivilegeLevelConfig>,

    /// Level to reach on open and before close. Defaults to the root.
    #[serde(default)]
    pub default_privilege: Option<String>,

    /// Substrings that mark a command as rejected.
    #[serde(default)]
    pub failed_when_contains: Vec<String>,

    #[serde(default)]
    pub on_open: Vec<LifecycleStep>,

    #[serde(default)]
    pub on_close: Vec<LifecycleStep>,

    /// Per-operation timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT.as_millis() as u64
}

impl PrivilegeLevelConfig {
    fn into_level(self, name: String) -> Result<PrivilegeLevel> {
        if self.pattern.is_empty() {
            return Err(ConfigError::InvalidDefinition {
                message: format!("privilege level '{name}' has no pattern"),
            }
            .into());
        }

        let mut level = PrivilegeLevel::new(name.clone(), &self.pattern).map_err(ConfigError::from)?;

        if let Some(parent) = self.parent {
            level = level.with_parent(parent);
        }
        if let Some(command) = self.escalate {
            level = level.with_escalate(command);
        }
        if let Some(command) = self.deescalate {
            level = level.with_deescalate(command);
        }
        for nc in self.not_contains {
            level = level.with_not_contains(nc);
        }

        match (self.escalate_auth, self.escalate_prompt) {
            (true, Some(prompt)) => level.with_auth(&prompt).map_err(|e| ConfigError::from(e).into()),
            (true, None) => Err(ConfigError::InvalidDefinition {
                message: format!("privilege level '{name}' requires auth but has no escalate_prompt"),
            }
            .into()),
            (false, _) => Ok(level),
        }
    }
}

impl PlatformConfig {
    /// Validate and convert into a platform definition.
    pub fn into_definition(self) -> Result<PlatformDefinition> {
        let mut builder = PlatformDefinition::builder(self.name)
            .with_timeout(Duration::from_millis(self.timeout_ms));

        for (name, level) in self.privilege_levels {
            builder = builder.with_privilege(level.into_level(name)?);
        }
        if let Some(default) = self.default_privilege {
            builder = builder.with_default_privilege(default);
        }
        for pattern in self.failed_when_contains {
            builder = builder.with_failure_pattern(pattern);
        }
        for step in self.on_open {
            builder = builder.with_on_open_step(step);
        }
        builder.with_on_close_steps(self.on_close).build()
    }
}

impl TryFrom<PlatformConfig> for PlatformDefinition {
    type Error = crate::error::Error;

    fn try_from(config: PlatformConfig) -> Result<Self> {
        config.into_definition()
    }
}
