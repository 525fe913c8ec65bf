//! Builder for creating device drivers.

use std::sync::Arc;
use std::time::Duration;

use super::generic::GenericDriver;
use crate::error::{ConfigError, Result};
use crate::platform::{PlatformDefinition, PlatformFactory, PlatformRegistry, vendors};
use crate::transport::{NoSecret, SecretProvider, StaticSecret, Transport};

/// Where the platform definition comes from.
enum PlatformSource {
    Named(String),
    Definition(Arc<PlatformDefinition>),
    Factory(PlatformFactory),
}

/// Builder for constructing device drivers.
///
/// # Example
///
/// ```rust,no_run
/// use privsh::{Driver, DriverBuilder, StreamTransport};
///
/// # async fn example(stream: tokio::net::TcpStream) -> Result<(), privsh::Error> {
/// let mut driver = DriverBuilder::new()
///     .platform("arista_eos")
///     .secret("enable-secret")
///     .build(StreamTransport::new(stream))?;
///
/// driver.open().await?;
/// driver.acquire_privilege("configuration").await?;
/// driver.close().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct DriverBuilder {
    platform: Option<PlatformSource>,
    registry: Option<Arc<PlatformRegistry>>,
    secrets: Option<Arc<dyn SecretProvider>>,
    timeout: Option<Duration>,
}

impl DriverBuilder {
    /// Create a new driver builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the platform name (e.g., "linux", "ipinfusion_ocnos").
    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(PlatformSource::Named(platform.into()));
        self
    }

    /// Look named platforms up in `registry` instead of the built-ins.
    ///
    /// Without a registry, named platforms are the built-ins, each built once
    /// per process and shared by every driver.
    pub fn registry(mut self, registry: Arc<PlatformRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Set a custom platform definition.
    pub fn custom_platform(mut self, platform: impl Into<Arc<PlatformDefinition>>) -> Self {
        self.platform = Some(PlatformSource::Definition(platform.into()));
        self
    }

    /// Build the platform with `factory` when the driver is built.
    pub fn platform_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Result<PlatformDefinition> + Send + Sync + 'static,
    {
        self.platform = Some(PlatformSource::Factory(Arc::new(factory)));
        self
    }

    /// Answer every escalation password prompt with `secret`.
    pub fn secret(self, secret: impl Into<String>) -> Self {
        self.secrets(StaticSecret::new(secret))
    }

    /// Set the secret provider.
    pub fn secrets(mut self, provider: impl SecretProvider + 'static) -> Self {
        self.secrets = Some(Arc::new(provider));
        self
    }

    /// Override the platform's per-read timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Resolve the platform definition without building a driver.
    pub fn resolve_platform(&self) -> Result<Arc<PlatformDefinition>> {
        match &self.platform {
            Some(PlatformSource::Definition(platform)) => Ok(Arc::clone(platform)),
            Some(PlatformSource::Factory(factory)) => Ok(Arc::new(factory()?)),
            Some(PlatformSource::Named(name)) => match &self.registry {
                Some(registry) => registry.require(name),
                None => vendors::builtin(name),
            },
            None => Err(ConfigError::InvalidDefinition {
                message: "no platform specified".to_string(),
            }
            .into()),
        }
    }

    /// Build the driver over a connected transport.
    ///
    /// Nothing is sent until `open()` (or an acquisition) is called.
    pub fn build<T: Transport>(self, transport: T) -> Result<GenericDriver<T>> {
        let platform = self.resolve_platform()?;
        let secrets = self.secrets.unwrap_or_else(|| Arc::new(NoSecret));

        let mut driver = GenericDriver::new(platform, transport, secrets);
        if let Some(timeout) = self.timeout {
            driver.set_timeout(timeout);
        }
        Ok(driver)
    }
}
