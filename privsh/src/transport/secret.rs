//! Secrets answered to escalation password prompts.

use std::collections::HashMap;
use std::fmt;

use secrecy::{ExposeSecret, SecretString};

use crate::error::{DriverError, Result};

/// Supplies the secret sent when escalating into a level that asks for one.
pub trait SecretProvider: Send + Sync {
    /// Secret for entering `level`.
    fn secret(&self, level: &str) -> Result<SecretString>;
}

/// The same secret for every level (the common "enable password" case).
pub struct StaticSecret(SecretString);

impl StaticSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(SecretString::from(secret.into()))
    }
}

impl SecretProvider for StaticSecret {
    fn secret(&self, _level: &str) -> Result<SecretString> {
        Ok(SecretString::from(self.0.expose_secret().to_owned()))
    }
}

impl fmt::Debug for StaticSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StaticSecret([REDACTED])")
    }
}

/// A separate secret per level.
#[derive(Default)]
pub struct LevelSecrets {
    secrets: HashMap<String, SecretString>,
}

impl LevelSecrets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the secret for one level.
    pub fn with_secret(mut self, level: impl Into<String>, secret: impl Into<String>) -> Self {
        self.secrets
            .insert(level.into(), SecretString::from(secret.into()));
        self
    }
}

impl SecretProvider for LevelSecrets {
    fn secret(&self, level: &str) -> Result<SecretString> {
        self.secrets
            .get(level)
            .map(|s| SecretString::from(s.expose_secret().to_owned()))
            .ok_or_else(|| no_secret(level))
    }
}

impl fmt::Debug for LevelSecrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LevelSecrets")
            .field("levels", &self.secrets.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// No secrets at all; any auth prompt fails the hop.
#[derive(Debug, Default)]
pub struct NoSecret;

impl SecretProvider for NoSecret {
    fn secret(&self, level: &str) -> Result<SecretString> {
        Err(no_secret(level))
    }
}

fn no_secret(level: &str) -> crate::error::Error {
    DriverError::AuthFailed {
        level: level.to_string(),
        reason: "no secret configured".to_string(),
    }
    .into()
}
