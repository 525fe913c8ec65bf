//! # privsh
//!
//! Async privilege-level navigation for interactive device shells.
//!
//! privsh drives an already-connected text session (SSH channel, telnet,
//! serial console) between the privilege levels of a network device or
//! server: user exec, privileged exec, configuration, root shell. Every move
//! is a single hop whose result is confirmed from the prompt the device
//! prints back, so the driver never assumes a level it has not seen.
//!
//! ## Features
//!
//! - Validated privilege trees with shortest-path navigation
//! - Tail-anchored prompt matching with ANSI escape stripping
//! - Password prompts answered from a [`SecretProvider`](transport::SecretProvider)
//! - Per-platform open and close steps (pagination off, logout)
//! - Built-in platforms: `linux`, `arista_eos`, `ipinfusion_ocnos`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use privsh::{Driver, DriverBuilder, StreamTransport};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), privsh::Error> {
//!     // Any AsyncRead + AsyncWrite stream that is sitting at a shell
//!     let stream = tokio::net::TcpStream::connect("192.0.2.10:23").await.map_err(
//!         privsh::error::ChannelError::Io,
//!     )?;
//!
//!     let mut driver = DriverBuilder::new()
//!         .platform("ipinfusion_ocnos")
//!         .build(StreamTransport::new(stream))?;
//!
//!     driver.open().await?;
//!     driver.acquire_privilege("configuration").await?;
//!     println!("now at {:?}", driver.current_privilege());
//!     driver.close().await?;
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod driver;
pub mod error;
pub mod platform;
pub mod transport;

// Re-export main types for convenience
pub use driver::{Driver, DriverBuilder, GenericDriver, Response};
pub use error::Error;
pub use platform::{PlatformDefinition, PlatformRegistry, PrivilegeLevel};
pub use transport::{StreamTransport, Transport};
