//! Platform registry for looking up platform definitions by name.
//!
//! The registry is a plain value handed to whoever needs it; there is no
//! process-wide instance to patch. Definitions are stored behind `Arc` so
//! every driver of a given platform shares one immutable privilege graph.

use std::collections::HashMap;
use std::sync::Arc;

use super::definition::PlatformDefinition;
use super::vendors;
use crate::error::{ConfigError, Result};

/// Constructor for a platform definition.
pub type PlatformFactory = Arc<dyn Fn() -> Result<PlatformDefinition> + Send + Sync>;

/// Registry for platform definitions.
#[derive(Debug, Default, Clone)]
pub struct PlatformRegistry {
    platforms: HashMap<String, Arc<PlatformDefinition>>,
}

impl PlatformRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self {
            platforms: HashMap::new(),
        }
    }

    /// Create a registry holding the built-in platforms.
    ///
    /// The definitions are the process-wide shared ones, so drivers built
    /// from this registry and from [`vendors::builtin`] share a graph.
    pub fn with_builtins() -> Result<Self> {
        let mut registry = Self::new();
        for name in vendors::names() {
            registry.register_shared(vendors::builtin(name)?)?;
        }
        Ok(registry)
    }

    /// Register a platform definition.
    pub fn register(&mut self, platform: PlatformDefinition) -> Result<()> {
        self.register_shared(Arc::new(platform))
    }

    /// Register a definition that is already shared elsewhere.
    pub fn register_shared(&mut self, platform: Arc<PlatformDefinition>) -> Result<()> {
        if self.platforms.contains_key(&platform.name) {
            return Err(ConfigError::AlreadyRegistered {
                name: platform.name.clone(),
            }
            .into());
        }
        self.platforms.insert(platform.name.clone(), platform);
        Ok(())
    }

    /// Build a platform with `factory` and register it.
    pub fn register_factory(&mut self, factory: &PlatformFactory) -> Result<()> {
        self.register(factory()?)
    }

    /// Get a platform by name.
    pub fn get(&self, name: &str) -> Option<Arc<PlatformDefinition>> {
        self.platforms.get(name).cloned()
    }

    /// Get a platform by name, or an unknown-platform error.
    pub fn require(&self, name: &str) -> Result<Arc<PlatformDefinition>> {
        self.get(name).ok_or_else(|| {
            ConfigError::UnknownPlatform {
                name: name.to_string(),
            }
            .into()
        })
    }

    /// Check if a platform is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.platforms.contains_key(name)
    }

    /// List all registered platform names.
    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.platforms.keys()
    }
}
