//! IP Infusion OcNOS platform definition.
//!
//! OcNOS boxes drop an SSH login into a Linux shell. The OcNOS CLI is
//! started from there with `cmlsh`, which gives the usual three CLI levels.
//!
//! # Prompt Examples
//!
//! ```text
//! ocnos@OcNOS:~$                # linux shell
//! OcNOS>                        # exec
//! OcNOS#                        # privilege_exec
//! OcNOS(config)#                # configuration
//! OcNOS(config-if)#             # configuration sub-mode
//! ```
//!
//! # Privilege Graph
//!
//! ```text
//! ┌───────┐  cmlsh  ┌──────┐  enable  ┌────────────────┐  configure terminal  ┌───────────────┐
//! │ linux ├─────────► exec ├──────────► privilege_exec ├──────────────────────► configuration │
//! │  $/#  │ logout  │  >   │ disable  │       #        │         end          │  (config*)#   │
//! └───────┘◄────────┴──────┘◄─────────┴────────────────┘◄─────────────────────┴───────────────┘
//! ```

use crate::error::{ConfigError, Result};
use crate::platform::{PlatformDefinition, PrivilegeLevel, lifecycle};

pub const PLATFORM_NAME: &str = "ipinfusion_ocnos";

/// Create the IP Infusion OcNOS platform definition.
pub fn platform() -> Result<PlatformDefinition> {
    levels()
        .map_err(ConfigError::from)?
        .into_iter()
        .fold(PlatformDefinition::builder(PLATFORM_NAME), |b, level| {
            b.with_privilege(level)
        })
        .with_default_privilege("privilege_exec")
        .with_failure_pattern("% Ambiguous command")
        .with_failure_pattern("% Incomplete command")
        .with_failure_pattern("% Invalid input detected")
        .with_failure_pattern("% Unknown command")
        .with_on_open_command("terminal length 0")
        .with_on_open_command("terminal width 511")
        .with_on_close_steps(lifecycle::logout("exit"))
        .build()
}

fn levels() -> std::result::Result<Vec<PrivilegeLevel>, regex::Error> {
    // Linux shell the box boots into; `$` added for non-root logins
    let linux = PrivilegeLevel::new("linux", r"^\S+@\S+:\S+[$#?]\s*$")?;

    let exec = PrivilegeLevel::new("exec", r"^[\w.\-@/:]{1,63}>\s*$")?
        .with_parent("linux")
        .with_escalate("cmlsh")
        .with_deescalate("logout");

    let privilege_exec = PrivilegeLevel::new("privilege_exec", r"^[\w.\-@/:]{1,63}#\s*$")?
        .with_parent("exec")
        .with_escalate("enable")
        .with_deescalate("disable");

    let configuration = PrivilegeLevel::new(
        "configuration",
        r"^[\w.\-@/:]{1,63}\([\w.\-@/:+]{0,32}\)#\s*$",
    )?
    .with_parent("privilege_exec")
    .with_escalate("configure terminal")
    .with_deescalate("end");

    Ok(vec![linux, exec, privilege_exec, configuration])
}
