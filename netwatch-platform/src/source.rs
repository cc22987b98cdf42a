//! Connectivity source abstraction and the platform capability model.
//!
//! The platform's connectivity subsystem is modeled as an injected read-only
//! dependency: a pair of synchronous-in-spirit point queries (active network,
//! capability snapshot) plus a capability-filtered callback registration with
//! two events, "a network became usable" and "a network was lost". Everything
//! downstream of this trait is platform-independent and testable against
//! [`FakeConnectivitySource`](crate::fake::FakeConnectivitySource).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Opaque handle for a network the platform manages.
///
/// Carries no meaning beyond identity; the platform decides which network is
/// the active (default-route) one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetworkId(pub u64);

/// Capability snapshot the platform asserts for one network.
///
/// The three flags mirror what a usable connection needs: the network is
/// configured for internet traffic, it passed the platform's independent
/// validation check, and it is not temporarily suspended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkCapabilities {
    /// Internet access is configured on this network
    pub internet: bool,
    /// The platform confirmed the network actually reaches the internet
    pub validated: bool,
    /// The network is not temporarily suspended
    pub not_suspended: bool,
}

impl NetworkCapabilities {
    /// Snapshot with all three capabilities present.
    pub fn fully_connected() -> Self {
        Self {
            internet: true,
            validated: true,
            not_suspended: true,
        }
    }

    /// Whether this snapshot holds every capability the filter requires.
    pub fn satisfies(&self, filter: &CapabilityFilter) -> bool {
        (!filter.require_internet || self.internet)
            && (!filter.require_validated || self.validated)
            && (!filter.require_not_suspended || self.not_suspended)
    }
}

/// Capability filter for a callback registration.
///
/// A registered callback only sees "available" events for networks whose
/// capabilities satisfy the filter; "lost" events are lifecycle events and
/// are always delivered for networks the registration has seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CapabilityFilter {
    pub require_internet: bool,
    pub require_validated: bool,
    pub require_not_suspended: bool,
}

impl CapabilityFilter {
    /// Filter requiring internet, validation, and not-suspended: the
    /// definition of a usable connection.
    pub fn fully_connected() -> Self {
        Self {
            require_internet: true,
            require_validated: true,
            require_not_suspended: true,
        }
    }
}

/// Events the platform delivers to a registered callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkEvent {
    /// A network matching the registration filter became usable
    Available(NetworkId),
    /// A previously usable network was lost
    Lost(NetworkId),
}

/// Identifier for one callback registration, returned by
/// [`ConnectivitySource::register_callback`] and consumed by
/// [`ConnectivitySource::unregister_callback`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistrationId(pub u64);

/// Callback invoked by the platform on its own delivery thread.
///
/// Implementations may call it from any thread and outside any async
/// runtime, so the callback must not block and must not assume a tokio
/// context.
pub type NetworkCallback = Box<dyn Fn(NetworkEvent) + Send + Sync>;

/// Read-only view of the platform's connectivity subsystem.
///
/// The handle may be shared and queried concurrently; implementations hold
/// no caller-visible mutable state. Registration is the only fallible
/// operation (a refused registration is a terminal setup error for that
/// subscription attempt); the point queries model every absence as `None`.
#[async_trait]
pub trait ConnectivitySource: Send + Sync {
    /// The network the platform currently routes general traffic through,
    /// or `None` when there is no active network.
    async fn active_network(&self) -> Option<NetworkId>;

    /// Capability snapshot for a network, or `None` if the platform no
    /// longer knows it.
    async fn network_capabilities(&self, network: NetworkId) -> Option<NetworkCapabilities>;

    /// Register a callback for networks matching `filter`.
    ///
    /// The returned id stays valid until passed to
    /// [`unregister_callback`](Self::unregister_callback). Each registration
    /// is independent; registering twice yields two deliveries per event.
    async fn register_callback(
        &self,
        filter: CapabilityFilter,
        callback: NetworkCallback,
    ) -> Result<RegistrationId>;

    /// Remove a registration. Idempotent: unknown ids are ignored.
    ///
    /// Synchronous so subscription guards can release their registration
    /// from `Drop` on any exit path.
    fn unregister_callback(&self, registration: RegistrationId);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fully_connected_satisfies_full_filter() {
        let caps = NetworkCapabilities::fully_connected();
        assert!(caps.satisfies(&CapabilityFilter::fully_connected()));
    }

    #[test]
    fn any_missing_capability_fails_full_filter() {
        let filter = CapabilityFilter::fully_connected();
        let mut caps = NetworkCapabilities::fully_connected();
        caps.internet = false;
        assert!(!caps.satisfies(&filter));

        let mut caps = NetworkCapabilities::fully_connected();
        caps.validated = false;
        assert!(!caps.satisfies(&filter));

        let mut caps = NetworkCapabilities::fully_connected();
        caps.not_suspended = false;
        assert!(!caps.satisfies(&filter));
    }

    #[test]
    fn default_filter_requires_nothing() {
        let caps = NetworkCapabilities {
            internet: false,
            validated: false,
            not_suspended: false,
        };
        assert!(caps.satisfies(&CapabilityFilter::default()));
    }
}
