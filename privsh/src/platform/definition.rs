//! Platform definition for vendor-specific configurations.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::graph::PrivilegeGraph;
use super::lifecycle::LifecycleStep;
use super::privilege_level::PrivilegeLevel;
use super::{DefaultBehavior, VendorBehavior};
use crate::error::{ConfigError, Result};

/// Default per-operation timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Platform definition containing all vendor-specific configuration.
///
/// Built once per device type through [`PlatformBuilder`] and shared
/// read-only (usually behind an `Arc`) by every session of that type.
#[derive(Clone)]
pub struct PlatformDefinition {
    /// Platform name (e.g., "linux", "ipinfusion_ocnos").
    pub name: String,

    /// Validated privilege tree.
    pub privileges: PrivilegeGraph,

    /// Privilege level a session is brought to on open and before close.
    pub default_privilege: String,

    /// Substrings that mean the device rejected a command.
    pub failed_when_contains: Vec<String>,

    /// Steps run at the default level once the session is open.
    pub on_open: Vec<LifecycleStep>,

    /// Steps run at the default level before the session is released.
    pub on_close: Vec<LifecycleStep>,

    /// Per-operation timeout.
    pub timeout: Duration,

    /// Vendor-specific behavior.
    pub behavior: Arc<dyn VendorBehavior>,
}

impl PlatformDefinition {
    /// Start building a platform definition.
    pub fn builder(name: impl Into<String>) -> PlatformBuilder {
        PlatformBuilder::new(name)
    }

    /// Get a privilege level by name.
    pub fn get_privilege(&self, name: &str) -> Option<&PrivilegeLevel> {
        self.privileges.get(name)
    }

    /// Return the first rejection phrase found in `output`.
    pub fn detect_failure(&self, output: &str) -> Option<String> {
        self.failed_when_contains
            .iter()
            .find(|pattern| output.contains(pattern.as_str()))
            .cloned()
            .or_else(|| self.behavior.detect_failure(output))
    }
}

impl fmt::Debug for PlatformDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlatformDefinition")
            .field("name", &self.name)
            .field("privileges", &self.privileges)
            .field("default_privilege", &self.default_privilege)
            .field("failed_when_contains", &self.failed_when_contains)
            .field("on_open", &self.on_open)
            .field("on_close", &self.on_close)
            .field("timeout", &self.timeout)
            .field("behavior", &"<VendorBehavior>")
            .finish()
    }
}

/// Collects privilege levels and session steps, validated by [`build`](Self::build).
pub struct PlatformBuilder {
    name: String,
    privilege_levels: Vec<PrivilegeLevel>,
    default_privilege: Option<String>,
    failed_when_contains: Vec<String>,
    on_open: Vec<LifecycleStep>,
    on_close: Vec<LifecycleStep>,
    timeout: Duration,
    behavior: Option<Arc<dyn VendorBehavior>>,
}

impl PlatformBuilder {
    /// Create a new builder with minimal required fields.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            privilege_levels: vec![],
            default_privilege: None,
            failed_when_contains: vec![],
            on_open: vec![],
            on_close: vec![],
            timeout: DEFAULT_TIMEOUT,
            behavior: None,
        }
    }

    /// Add a privilege level.
    pub fn with_privilege(mut self, level: PrivilegeLevel) -> Self {
        self.privilege_levels.push(level);
        self
    }

    /// Set the default privilege level.
    pub fn with_default_privilege(mut self, name: impl Into<String>) -> Self {
        self.default_privilege = Some(name.into());
        self
    }

    /// Add a failure pattern.
    pub fn with_failure_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.failed_when_contains.push(pattern.into());
        self
    }

    /// Add an on_open command.
    pub fn with_on_open_command(self, command: impl Into<String>) -> Self {
        self.with_on_open_step(LifecycleStep::command(command))
    }

    /// Add an on_open step.
    pub fn with_on_open_step(mut self, step: LifecycleStep) -> Self {
        self.on_open.push(step);
        self
    }

    /// Add an on_close command.
    pub fn with_on_close_command(self, command: impl Into<String>) -> Self {
        self.with_on_close_step(LifecycleStep::command(command))
    }

    /// Add an on_close step.
    pub fn with_on_close_step(mut self, step: LifecycleStep) -> Self {
        self.on_close.push(step);
        self
    }

    /// Add several on_close steps.
    pub fn with_on_close_steps(mut self, steps: impl IntoIterator<Item = LifecycleStep>) -> Self {
        self.on_close.extend(steps);
        self
    }

    /// Set the per-operation timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set vendor behavior.
    pub fn with_behavior(mut self, behavior: Arc<dyn VendorBehavior>) -> Self {
        self.behavior = Some(behavior);
        self
    }

    /// Validate and build the definition.
    ///
    /// Fails if the levels do not form a single rooted tree, or if the
    /// default privilege is not one of them. If no default is set, the root
    /// level is used.
    pub fn build(self) -> Result<PlatformDefinition> {
        let privileges = PrivilegeGraph::new(self.privilege_levels)?;

        let default_privilege = match self.default_privilege {
            Some(name) => {
                privileges.level(&name)?;
                name
            }
            None => privileges.root().name.clone(),
        };

        if self.failed_when_contains.iter().any(|p| p.is_empty()) {
            return Err(ConfigError::InvalidDefinition {
                message: format!("platform '{}' has an empty failure pattern", self.name),
            }
            .into());
        }

        Ok(PlatformDefinition {
            name: self.name,
            privileges,
            default_privilege,
            failed_when_contains: self.failed_when_contains,
            on_open: self.on_open,
            on_close: self.on_close,
            timeout: self.timeout,
            behavior: self.behavior.unwrap_or_else(|| Arc::new(DefaultBehavior)),
        })
    }
}
