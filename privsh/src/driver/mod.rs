//! High-level driver for device interaction.
//!
//! The driver layer moves a session between privilege levels one confirmed
//! hop at a time and runs the platform's open and close steps.

mod builder;
mod generic;
mod privilege;
pub(crate) mod response;

pub use builder::DriverBuilder;
pub use generic::GenericDriver;
pub use privilege::PrivilegeManager;
pub use response::Response;

use std::future::Future;

use crate::error::Result;

/// Trait for device drivers.
pub trait Driver: Send {
    /// Bring the session to the platform's default level and run its open
    /// steps. The driver is only open once both succeed.
    fn open(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Return to the default level, run the close steps and release the
    /// transport. Close steps run even if the default level could not be
    /// reached; the first error is returned afterwards.
    fn close(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Send a command and wait for the prompt.
    fn send_command(&mut self, command: &str) -> impl Future<Output = Result<Response>> + Send;

    /// Send multiple commands sequentially.
    fn send_commands(
        &mut self,
        commands: &[&str],
    ) -> impl Future<Output = Result<Vec<Response>>> + Send {
        async move {
            let mut responses = Vec::with_capacity(commands.len());
            for cmd in commands {
                responses.push(self.send_command(cmd).await?);
            }
            Ok(responses)
        }
    }

    /// Acquire a specific privilege level.
    ///
    /// ```rust,no_run
    /// use privsh::driver::Driver;
    ///
    /// # async fn example(driver: &mut impl Driver) -> Result<(), privsh::Error> {
    /// driver.acquire_privilege("configuration").await?;
    /// driver.send_command("hostname leaf1").await?;
    /// driver.acquire_privilege("privilege_exec").await?;
    /// # Ok(())
    /// # }
    /// ```
    fn acquire_privilege(&mut self, privilege: &str) -> impl Future<Output = Result<()>> + Send;

    /// Check if the session is open.
    fn is_open(&self) -> bool;

    /// Get the current privilege level name, if confirmed.
    fn current_privilege(&self) -> Option<&str>;
}
