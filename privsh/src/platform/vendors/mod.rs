//! Built-in vendor platform definitions.
//!
//! Each built-in is constructed the first time it is asked for and then
//! shared by every driver in the process. Vendors are built independently,
//! so a broken definition only affects drivers of that vendor.

use std::sync::{Arc, OnceLock};

use super::PlatformDefinition;
use crate::error::{ConfigError, Result};

pub mod arista;
pub mod linux;
pub mod ocnos;

struct Builtin {
    name: &'static str,
    build: fn() -> Result<PlatformDefinition>,
    shared: OnceLock<Arc<PlatformDefinition>>,
}

static BUILTINS: [Builtin; 3] = [
    Builtin {
        name: linux::PLATFORM_NAME,
        build: linux::platform,
        shared: OnceLock::new(),
    },
    Builtin {
        name: arista::PLATFORM_NAME,
        build: arista::platform,
        shared: OnceLock::new(),
    },
    Builtin {
        name: ocnos::PLATFORM_NAME,
        build: ocnos::platform,
        shared: OnceLock::new(),
    },
];

/// Names of the built-in platforms.
pub fn names() -> impl Iterator<Item = &'static str> {
    BUILTINS.iter().map(|builtin| builtin.name)
}

/// The shared definition of a built-in platform.
pub fn builtin(name: &str) -> Result<Arc<PlatformDefinition>> {
    let builtin = BUILTINS
        .iter()
        .find(|builtin| builtin.name == name)
        .ok_or_else(|| ConfigError::UnknownPlatform {
            name: name.to_string(),
        })?;

    if let Some(platform) = builtin.shared.get() {
        return Ok(Arc::clone(platform));
    }

    // Racing first uses may both build; everyone keeps the stored one
    let platform = Arc::new((builtin.build)()?);
    Ok(Arc::clone(builtin.shared.get_or_init(|| platform)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_every_builtin_builds() {
        for name in names() {
            let platform = builtin(name).unwrap_or_else(|e| panic!("{name}: {e}"));
            assert_eq!(platform.name, name);
            assert!(platform.privileges.contains(&platform.default_privilege));
        }
        assert_eq!(names().count(), 3);
    }

    #[test]
    fn test_builtins_are_built_once() {
        let a = builtin(ocnos::PLATFORM_NAME).unwrap();
        let b = builtin(ocnos::PLATFORM_NAME).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_unknown_builtin() {
        let err = builtin("cisco_iosxr").unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::UnknownPlatform { .. })));
    }
}
