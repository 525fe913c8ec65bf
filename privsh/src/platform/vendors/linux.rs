//! Linux platform definition.
//!
//! This is the simplest platform, supporting standard Linux/Unix shells
//! with `$` (user) and `#` (root) prompts.

use crate::error::{ConfigError, Result};
use crate::platform::{PlatformDefinition, PrivilegeLevel, lifecycle};

pub const PLATFORM_NAME: &str = "linux";

/// Create the Linux platform definition.
pub fn platform() -> Result<PlatformDefinition> {
    let user = PrivilegeLevel::new("user", r"[$]\s*$").map_err(ConfigError::from)?;

    let root = PrivilegeLevel::new("root", r"[#]\s*$")
        .and_then(|level| {
            level
                .with_parent("user")
                .with_escalate("sudo -i")
                .with_deescalate("exit")
                .with_auth(r"[Pp]assword[^:]*:\s*$")
        })
        .map_err(ConfigError::from)?;

    PlatformDefinition::builder(PLATFORM_NAME)
        .with_privilege(user)
        .with_privilege(root)
        .with_default_privilege("user")
        .with_failure_pattern("command not found")
        .with_failure_pattern("No such file or directory")
        .with_failure_pattern("Permission denied")
        .with_failure_pattern("Operation not permitted")
        .with_on_close_steps(lifecycle::logout("exit"))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linux_platform() {
        let platform = platform().unwrap();
        assert_eq!(platform.name, "linux");
        assert_eq!(platform.privileges.len(), 2);
        assert!(platform.privileges.contains("user"));
        assert!(platform.privileges.contains("root"));
        assert!(platform.on_open.is_empty());
    }

    #[test]
    fn test_user_prompt_match() {
        let platform = platform().unwrap();
        let user = platform.get_privilege("user").unwrap();
        assert!(user.matches(b"user@host:~$ "));
        assert!(user.matches(b"$ "));
        assert!(!user.matches(b"root@host:~# "));
    }

    #[test]
    fn test_root_prompt_match() {
        let platform = platform().unwrap();
        let root = platform.get_privilege("root").unwrap();
        assert!(root.matches(b"root@host:~# "));
        assert!(root.matches(b"# "));
        assert!(!root.matches(b"user@host:~$ "));
    }

    #[test]
    fn test_sudo_password_prompt() {
        let platform = platform().unwrap();
        let auth = platform.privileges.auth_or_any("root").unwrap();
        assert!(crate::channel::PromptMatcher::is_match(
            auth,
            b"sudo -i\n[sudo] password for user: "
        ));
    }
}
