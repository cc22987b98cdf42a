//! # netwatch-platform
//!
//! The platform seam for network reachability observation: a small
//! capability model, the [`ConnectivitySource`] trait abstracting the host's
//! connectivity subsystem, and two implementations: a scripted in-memory
//! fake for tests and a TCP-probe backend for real processes.
//!
//! ## Features
//!
//! - **Injected platform dependency**: the connectivity subsystem is a trait
//!   object, never an ambient singleton, so everything above it tests
//!   against a fake
//! - **Three-capability model**: internet-configured, validated, and
//!   not-suspended, matching what a usable connection needs
//! - **Callback registration with scoped lifetime**: register with a
//!   capability filter, deregister with the returned id; deregistration is
//!   synchronous so it can run from `Drop`
//! - **Probe backend**: edge-triggered reachability from periodic TCP
//!   connects to well-known endpoints
//!
//! ## Quick Start
//!
//! ```rust
//! use netwatch_platform::{
//!     CapabilityFilter, ConnectivitySource, FakeConnectivitySource, NetworkId,
//! };
//!
//! # async fn example() -> netwatch_platform::Result<()> {
//! let source = FakeConnectivitySource::new();
//! source.set_active_network(Some(NetworkId(1)));
//!
//! let registration = source
//!     .register_callback(
//!         CapabilityFilter::fully_connected(),
//!         Box::new(|event| println!("{event:?}")),
//!     )
//!     .await?;
//!
//! source.fire_available(NetworkId(1));
//! source.unregister_callback(registration);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`source`]: The capability model and the [`ConnectivitySource`] trait
//! - [`fake`]: Scripted in-memory source for tests
//! - [`probe`]: TCP-probe backend for real processes
//! - [`error`]: Error types and result handling
//!
//! ## Error Handling
//!
//! Registration is the only fallible observation-time operation; it returns
//! the crate's [`PlatformError`]. Point queries model absence as `None`,
//! never as an error.

pub mod error;
pub mod fake;
pub mod probe;
pub mod source;

// Re-export main types for easy access
pub use error::{PlatformError, Result};
pub use fake::FakeConnectivitySource;
pub use probe::{ProbeConfig, ProbeConnectivitySource};
pub use source::{
    CapabilityFilter, ConnectivitySource, NetworkCallback, NetworkCapabilities, NetworkEvent,
    NetworkId, RegistrationId,
};
