//! Arista EOS platform definition.
//!
//! Supports Arista devices running EOS with the following privilege levels:
//! - `exec` - User EXEC mode with `>` prompt
//! - `privilege_exec` - Privileged EXEC mode with `#` prompt
//! - `configuration` - Configuration mode with `(config*)#` prompt
//!
//! Prompt patterns are adapted from [scrapli](https://github.com/carlmontanari/scrapli).
//!
//! # Privilege Graph
//!
//! ```text
//! ┌──────┐  enable     ┌────────────────┐  configure terminal  ┌───────────────┐
//! │ exec ├──────────────► privilege_exec ├──────────────────────► configuration │
//! │  >   │   disable   │       #        │        end           │  (config*)#   │
//! └──────┘◄────────────┴────────────────┘◄─────────────────────┴───────────────┘
//! ```
//!
//! `enable` may ask for a password; the secret comes from the driver's
//! [`SecretProvider`](crate::transport::SecretProvider).

use crate::error::{ConfigError, Result};
use crate::platform::{PlatformDefinition, PrivilegeLevel, lifecycle};

pub const PLATFORM_NAME: &str = "arista_eos";

/// Create the Arista EOS platform definition.
pub fn platform() -> Result<PlatformDefinition> {
    let exec = PrivilegeLevel::new("exec", r"^[\w.\-@()/: ]{1,63}>\s?$").map_err(ConfigError::from)?;

    // not_contains "(config" keeps config prompts out of this level
    let privilege_exec = PrivilegeLevel::new("privilege_exec", r"^[\w.\-@()/: ]{1,63}#\s?$")
        .and_then(|level| {
            level
                .with_parent("exec")
                .with_escalate("enable")
                .with_deescalate("disable")
                .with_not_contains("(config")
                .with_auth(r"^password:\s?$")
        })
        .map_err(ConfigError::from)?;

    // not_contains "(config-s-" leaves named session prompts unmatched
    let configuration = PrivilegeLevel::new(
        "configuration",
        r"^[\w.\-@()/: ]{1,63}\(config[\w.\-@/:+]{0,63}\)#\s?$",
    )
    .map_err(ConfigError::from)?
    .with_parent("privilege_exec")
    .with_escalate("configure terminal")
    .with_deescalate("end")
    .with_not_contains("(config-s-");

    PlatformDefinition::builder(PLATFORM_NAME)
        .with_privilege(exec)
        .with_privilege(privilege_exec)
        .with_privilege(configuration)
        .with_default_privilege("privilege_exec")
        .with_failure_pattern("% Ambiguous command")
        .with_failure_pattern("% Error")
        .with_failure_pattern("% Incomplete command")
        .with_failure_pattern("% Invalid input")
        .with_failure_pattern("% Unavailable command")
        .with_on_open_command("terminal length 0")
        .with_on_open_command("terminal width 32767")
        .with_on_close_steps(lifecycle::logout("exit"))
        .build()
}
