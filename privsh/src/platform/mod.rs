//! Platform definitions for multi-vendor support.
//!
//! This module defines vendor-specific configurations including
//! prompt patterns, privilege levels, and session open/close steps.

pub mod config;
mod definition;
mod graph;
pub mod lifecycle;
mod privilege_level;
mod registry;
pub mod vendors;

pub use config::{PlatformConfig, PrivilegeLevelConfig};
pub use definition::{DEFAULT_TIMEOUT, PlatformBuilder, PlatformDefinition};
pub use graph::{Direction, Hop, PrivilegeGraph};
pub use lifecycle::LifecycleStep;
pub use privilege_level::PrivilegeLevel;
pub use registry::{PlatformFactory, PlatformRegistry};

/// Trait for vendor-specific output handling.
pub trait VendorBehavior: Send + Sync {
    /// Normalize command output (strip command echo, trailing prompt).
    fn normalize_output(&self, raw: &str, command: &str) -> String {
        let output = raw
            .trim_start_matches(['\r', '\n'])
            .strip_prefix(command)
            .unwrap_or(raw)
            .trim_start_matches(['\r', '\n']);

        // Strip trailing prompt (last line)
        let output = output.trim_end();
        match memchr::memrchr(b'\n', output.as_bytes()) {
            Some(pos) => output[..pos].trim_end_matches('\r').to_string(),
            None => String::new(),
        }
    }

    /// Detect command failure from output beyond the platform's
    /// `failed_when_contains` phrases.
    fn detect_failure(&self, _output: &str) -> Option<String> {
        None
    }
}

/// Default vendor behavior implementation.
pub struct DefaultBehavior;

impl VendorBehavior for DefaultBehavior {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_output() {
        let behavior = DefaultBehavior;
        let raw = "show version\r\nVersion 1.2\r\nUptime 3d\r\nrouter#";
        assert_eq!(
            behavior.normalize_output(raw, "show version"),
            "Version 1.2\r\nUptime 3d"
        );
    }

    #[test]
    fn test_normalize_prompt_only() {
        let behavior = DefaultBehavior;
        assert_eq!(
            behavior.normalize_output("terminal length 0\nrouter#", "terminal length 0"),
            ""
        );
    }
}
