//! Generic driver implementation that works with any platform.

use std::sync::Arc;
use std::time::{Duration, Instant};

use log::{debug, trace, warn};
use secrecy::ExposeSecret;
use tokio_util::sync::CancellationToken;

use super::Driver;
use super::privilege::{PrivilegeManager, last_line};
use super::response::Response;
use crate::channel::PromptMatcher;
use crate::error::{DriverError, Error, Result};
use crate::platform::{Hop, LifecycleStep, PlatformDefinition, PrivilegeGraph};
use crate::transport::{SecretProvider, Transport};

/// Generic driver that works with any platform definition.
///
/// The driver handles:
/// - Command execution with prompt detection
/// - Privilege level navigation, one confirmed hop at a time
/// - The platform's open and close steps
///
/// It does not own connection setup: hand it a [`Transport`] that is already
/// sitting at a shell. Pass `&mut transport` to keep ownership.
pub struct GenericDriver<T> {
    /// Platform definition, shared with every other driver of the platform.
    platform: Arc<PlatformDefinition>,

    /// Transport (None once closed).
    transport: Option<T>,

    /// Privilege level manager.
    privilege_manager: PrivilegeManager,

    /// Answers escalation password prompts.
    secrets: Arc<dyn SecretProvider>,

    /// Default timeout for operations.
    timeout: Duration,

    /// `open` completed and `close` has not started.
    ready: bool,
}

impl<T: Transport> GenericDriver<T> {
    /// Create a new generic driver over a connected transport.
    pub fn new(
        platform: Arc<PlatformDefinition>,
        transport: T,
        secrets: Arc<dyn SecretProvider>,
    ) -> Self {
        Self {
            timeout: platform.timeout,
            privilege_manager: PrivilegeManager::new(Arc::clone(&platform)),
            platform,
            transport: Some(transport),
            secrets,
            ready: false,
        }
    }

    /// Get a reference to the platform definition.
    pub fn platform(&self) -> &PlatformDefinition {
        &self.platform
    }

    /// Get the privilege manager.
    pub fn privilege_manager(&self) -> &PrivilegeManager {
        &self.privilege_manager
    }

    /// Per-read timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Set the default timeout.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// The transport, until `close` releases it.
    pub fn transport_mut(&mut self) -> Option<&mut T> {
        self.transport.as_mut()
    }

    /// Detach the transport without running the close steps.
    pub fn into_transport(self) -> Option<T> {
        self.transport
    }

    /// Acquire `target`, giving up when `cancel` fires.
    ///
    /// A cancelled acquisition may have stopped between a command and its
    /// prompt, so the current level is forgotten and the next acquisition
    /// starts by re-reading the prompt.
    pub async fn acquire_privilege_with_cancel(
        &mut self,
        target: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = self.acquire(target) => Some(result),
        };

        match outcome {
            Some(result) => result,
            None => {
                warn!("acquisition of '{}' cancelled; privilege level unknown", target);
                self.privilege_manager.invalidate();
                Err(DriverError::Cancelled {
                    target: target.to_string(),
                }
                .into())
            }
        }
    }

    async fn acquire(&mut self, target: &str) -> Result<()> {
        // Unknown targets are rejected before anything is written
        self.platform.privileges.level(target)?;
        if self.transport.is_none() {
            return Err(DriverError::NotConnected.into());
        }

        self.privilege_manager.begin_transition();
        let result = self.navigate(target).await;
        self.privilege_manager.end_transition();

        if let Err(e) = &result {
            if e.is_disconnect() {
                self.privilege_manager.invalidate();
            }
            debug!("acquire '{}' failed: {}", target, e);
        }
        result
    }

    async fn navigate(&mut self, target: &str) -> Result<()> {
        let current = self.confirm_current().await?;

        let platform = Arc::clone(&self.platform);
        let graph = &platform.privileges;
        let path = graph.path_between(&current, target)?;

        if path.is_empty() {
            trace!("already at '{}'", target);
            return Ok(());
        }

        if let Some(hop) = path.iter().find(|hop| hop.command().is_none()) {
            return Err(DriverError::NoTransition {
                from: hop.from.name.clone(),
                to: hop.to.name.clone(),
            }
            .into());
        }

        debug!(
            "acquiring '{}' from '{}' in {} hop(s)",
            target,
            current,
            path.len()
        );
        for hop in &path {
            self.execute_hop(graph, hop).await?;
        }
        Ok(())
    }

    /// Send a bare return and set the current level from the prompt that
    /// comes back, correcting any drift from the last known level.
    async fn confirm_current(&mut self) -> Result<String> {
        let timeout = self.timeout;
        let transport = self
            .transport
            .as_mut()
            .ok_or(DriverError::NotConnected)?;

        transport.send_return().await?;
        let output = transport
            .read_until_pattern(self.platform.privileges.any_prompt(), timeout)
            .await?;

        // Prefer the last known level when several prompts look alike
        let name = match self.privilege_manager.last_confirmed() {
            Some(level) if level.matches(output.as_bytes()) => level.name.clone(),
            last => {
                let observed = self.privilege_manager.determine_from_prompt(&output)?;
                if let Some(last) = last {
                    debug!(
                        "privilege drifted from '{}' to '{}'",
                        last.name, observed.name
                    );
                }
                observed.name.clone()
            }
        };

        self.privilege_manager.set_current(&name)?;
        Ok(name)
    }

    async fn execute_hop(&mut self, graph: &PrivilegeGraph, hop: &Hop<'_>) -> Result<()> {
        let from = hop.from.name.as_str();
        let to = hop.to.name.as_str();
        let command = hop.command().ok_or_else(|| DriverError::NoTransition {
            from: from.to_string(),
            to: to.to_string(),
        })?;

        debug!("{} -> {}: sending '{}'", from, to, command);

        let timeout = self.timeout;
        let transport = self
            .transport
            .as_mut()
            .ok_or(DriverError::NotConnected)?;
        transport.send_line(command).await?;

        let output = if hop.requires_auth() {
            let pattern = graph.auth_or_any(to).unwrap_or(graph.any_prompt());
            let output = match transport.read_until_pattern(pattern, timeout).await {
                Err(e) if e.is_timeout() => {
                    return Err(auth_failed(to, format!("no prompt within {timeout:?}")));
                }
                result => result?,
            };
            check_rejection(&self.platform, command, &output)?;

            let asked = hop
                .to
                .escalate_prompt
                .as_ref()
                .is_some_and(|prompt| PromptMatcher::is_match(prompt, output.as_bytes()));
            let output = if asked {
                trace!("{} -> {}: answering password prompt", from, to);
                let secret = self.secrets.secret(to)?;
                transport.send_line(secret.expose_secret()).await?;

                match transport.read_until_pattern(graph.any_prompt(), timeout).await {
                    Err(e) if e.is_timeout() => {
                        return Err(auth_failed(to, "no prompt after password".to_string()));
                    }
                    result => result?,
                }
            } else {
                // Some devices skip the password when already authorized
                trace!("{} -> {}: no password prompt", from, to);
                output
            };

            if !hop.to.matches(output.as_bytes()) {
                if let Some(level) = graph.determine(output.as_bytes()) {
                    self.privilege_manager.set_current(&level.name)?;
                }
                return Err(auth_failed(
                    to,
                    format!("device answered with '{}'", last_line(&output)),
                ));
            }
            output
        } else {
            match transport.read_until_pattern(graph.any_prompt(), timeout).await {
                Err(e) if e.is_timeout() => {
                    return Err(DriverError::TransitionTimeout {
                        from: from.to_string(),
                        to: to.to_string(),
                        timeout,
                    }
                    .into());
                }
                result => result?,
            }
        };

        check_rejection(&self.platform, command, &output)?;

        if hop.to.matches(output.as_bytes()) {
            self.privilege_manager.set_current(to)?;
            return Ok(());
        }

        match graph.determine(output.as_bytes()) {
            Some(level) => {
                self.privilege_manager.set_current(&level.name)?;
                Err(DriverError::UnexpectedPrivilege {
                    expected: to.to_string(),
                    found: level.name.clone(),
                }
                .into())
            }
            None => Err(DriverError::UnknownPrompt {
                prompt: last_line(&output).to_string(),
            }
            .into()),
        }
    }

    /// Run lifecycle steps in order, stopping at the first failure.
    async fn run_lifecycle(&mut self, steps: &[LifecycleStep]) -> Result<()> {
        for step in steps {
            match step {
                LifecycleStep::Command(command) => {
                    self.send_command(command).await?.into_checked()?;
                }
                LifecycleStep::Raw(data) => {
                    trace!("lifecycle: writing {:?}", data);
                    self.connected()?.write(data.as_bytes()).await?;
                }
                LifecycleStep::Return => {
                    self.connected()?.send_return().await?;
                }
            }
        }
        Ok(())
    }

    fn connected(&mut self) -> Result<&mut T> {
        self.transport
            .as_mut()
            .ok_or_else(|| DriverError::NotConnected.into())
    }
}

impl<T: Transport> Driver for GenericDriver<T> {
    async fn open(&mut self) -> Result<()> {
        if self.transport.is_none() {
            return Err(DriverError::NotConnected.into());
        }
        self.ready = false;

        let platform = Arc::clone(&self.platform);
        self.acquire(&platform.default_privilege).await?;
        self.run_lifecycle(&platform.on_open).await?;

        self.ready = true;
        debug!(
            "session open on '{}' at '{}'",
            platform.name, platform.default_privilege
        );
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if self.transport.is_none() {
            return Ok(());
        }
        self.ready = false;

        let platform = Arc::clone(&self.platform);
        let mut first_error: Option<Error> = None;

        // The logout steps run even when the default level can't be reached
        if let Err(e) = self.acquire(&platform.default_privilege).await {
            warn!(
                "could not return to '{}' before closing: {}",
                platform.default_privilege, e
            );
            first_error = Some(e);
        }

        if let Err(e) = self.run_lifecycle(&platform.on_close).await {
            warn!("close steps failed: {}", e);
            first_error.get_or_insert(e);
        }

        if let Some(mut transport) = self.transport.take() {
            if let Err(e) = transport.close().await {
                warn!("transport close failed: {}", e);
                first_error.get_or_insert(e);
            }
        }
        self.privilege_manager.invalidate();

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn send_command(&mut self, command: &str) -> Result<Response> {
        let timeout = self.timeout;
        let transport = self
            .transport
            .as_mut()
            .ok_or(DriverError::NotConnected)?;

        let start = Instant::now();
        transport.send_line(command).await?;
        let raw_result = transport
            .read_until_pattern(self.platform.privileges.any_prompt(), timeout)
            .await?;
        let elapsed = start.elapsed();

        let prompt = last_line(&raw_result).to_string();

        // No acquisition runs alongside a command, so a transition still
        // marked in flight was abandoned and this prompt supersedes it
        match self.platform.privileges.determine(raw_result.as_bytes()) {
            Some(level) => {
                self.privilege_manager.end_transition();
                self.privilege_manager.set_current(&level.name)?;
            }
            None => self.privilege_manager.invalidate(),
        }

        let result = self.platform.behavior.normalize_output(&raw_result, command);

        if let Some(failure) = self.platform.detect_failure(&raw_result) {
            debug!("'{}' failed: {}", command, failure);
            return Ok(Response::failed(
                command, result, raw_result, prompt, elapsed, failure,
            ));
        }

        Ok(Response::new(command, result, raw_result, prompt, elapsed))
    }

    async fn acquire_privilege(&mut self, privilege: &str) -> Result<()> {
        self.acquire(privilege).await
    }

    fn is_open(&self) -> bool {
        self.ready && self.transport.is_some()
    }

    fn current_privilege(&self) -> Option<&str> {
        self.privilege_manager
            .current()
            .map(|level| level.name.as_str())
    }
}

fn check_rejection(platform: &PlatformDefinition, command: &str, output: &str) -> Result<()> {
    match platform.detect_failure(output) {
        Some(matched) => Err(DriverError::CommandRejected {
            command: command.to_string(),
            matched,
            output: output.to_string(),
        }
        .into()),
        None => Ok(()),
    }
}

fn auth_failed(level: &str, reason: String) -> Error {
    DriverError::AuthFailed {
        level: level.to_string(),
        reason,
    }
    .into()
}
