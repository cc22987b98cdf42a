//! In-memory connectivity source for tests and examples.
//!
//! The fake is fully scripted: tests set the active network and capability
//! snapshots, fire events by hand, and inspect the registration balance.
//! Events are dispatched synchronously on the firing thread, which stands in
//! for the platform's delivery thread.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tracing::debug;

use crate::error::{PlatformError, Result};
use crate::source::{
    CapabilityFilter, ConnectivitySource, NetworkCallback, NetworkCapabilities, NetworkEvent,
    NetworkId, RegistrationId,
};

type SharedCallback = Arc<dyn Fn(NetworkEvent) + Send + Sync>;

struct FakeRegistration {
    id: u64,
    filter: CapabilityFilter,
    callback: SharedCallback,
}

#[derive(Default)]
struct FakeState {
    active: Option<NetworkId>,
    capabilities: HashMap<NetworkId, NetworkCapabilities>,
    registrations: Vec<FakeRegistration>,
    fail_next_registration: bool,
}

/// Scripted [`ConnectivitySource`] with manual event delivery.
#[derive(Default)]
pub struct FakeConnectivitySource {
    state: Mutex<FakeState>,
    next_registration: AtomicU64,
}

impl FakeConnectivitySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set which network the point query reports as active.
    pub fn set_active_network(&self, network: Option<NetworkId>) {
        self.state.lock().unwrap().active = network;
    }

    /// Set the capability snapshot reported for `network`.
    pub fn set_capabilities(&self, network: NetworkId, capabilities: NetworkCapabilities) {
        self.state
            .lock()
            .unwrap()
            .capabilities
            .insert(network, capabilities);
    }

    /// Make the next `register_callback` call fail with a registration error.
    pub fn fail_next_registration(&self) {
        self.state.lock().unwrap().fail_next_registration = true;
    }

    /// Number of currently live registrations.
    pub fn registration_count(&self) -> usize {
        self.state.lock().unwrap().registrations.len()
    }

    /// Deliver "network became usable" to every registration whose filter
    /// the network's capabilities satisfy.
    ///
    /// Networks with no scripted snapshot count as fully connected, so tests
    /// that only care about event flow need not script capabilities first.
    pub fn fire_available(&self, network: NetworkId) {
        let event = NetworkEvent::Available(network);
        for callback in self.matching_callbacks(network) {
            callback(event);
        }
    }

    /// Deliver "network was lost" to every registration.
    ///
    /// Loss is a lifecycle event: the platform reports it regardless of what
    /// the network's capabilities were at the end.
    pub fn fire_lost(&self, network: NetworkId) {
        let callbacks: Vec<SharedCallback> = {
            let state = self.state.lock().unwrap();
            state
                .registrations
                .iter()
                .map(|r| Arc::clone(&r.callback))
                .collect()
        };
        for callback in callbacks {
            callback(NetworkEvent::Lost(network));
        }
    }

    fn matching_callbacks(&self, network: NetworkId) -> Vec<SharedCallback> {
        let state = self.state.lock().unwrap();
        let capabilities = state
            .capabilities
            .get(&network)
            .copied()
            .unwrap_or_else(NetworkCapabilities::fully_connected);
        state
            .registrations
            .iter()
            .filter(|r| capabilities.satisfies(&r.filter))
            .map(|r| Arc::clone(&r.callback))
            .collect()
    }
}

#[async_trait]
impl ConnectivitySource for FakeConnectivitySource {
    async fn active_network(&self) -> Option<NetworkId> {
        self.state.lock().unwrap().active
    }

    async fn network_capabilities(&self, network: NetworkId) -> Option<NetworkCapabilities> {
        self.state.lock().unwrap().capabilities.get(&network).copied()
    }

    async fn register_callback(
        &self,
        filter: CapabilityFilter,
        callback: NetworkCallback,
    ) -> Result<RegistrationId> {
        let mut state = self.state.lock().unwrap();
        if state.fail_next_registration {
            state.fail_next_registration = false;
            return Err(PlatformError::registration(
                "scripted registration failure",
            ));
        }
        let id = self.next_registration.fetch_add(1, Ordering::Relaxed);
        state.registrations.push(FakeRegistration {
            id,
            filter,
            callback: Arc::from(callback),
        });
        debug!(registration = id, "fake callback registered");
        Ok(RegistrationId(id))
    }

    fn unregister_callback(&self, registration: RegistrationId) {
        let mut state = self.state.lock().unwrap();
        state.registrations.retain(|r| r.id != registration.0);
        debug!(registration = registration.0, "fake callback unregistered");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording_callback() -> (NetworkCallback, Arc<Mutex<Vec<NetworkEvent>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let callback: NetworkCallback = Box::new(move |event| {
            sink.lock().unwrap().push(event);
        });
        (callback, events)
    }

    #[tokio::test]
    async fn registration_balance_is_observable() {
        let fake = FakeConnectivitySource::new();
        let (callback, _events) = recording_callback();
        let id = fake
            .register_callback(CapabilityFilter::fully_connected(), callback)
            .await
            .unwrap();
        assert_eq!(fake.registration_count(), 1);

        fake.unregister_callback(id);
        assert_eq!(fake.registration_count(), 0);

        // Idempotent for ids that are already gone
        fake.unregister_callback(id);
        assert_eq!(fake.registration_count(), 0);
    }

    #[tokio::test]
    async fn available_respects_the_filter() {
        let fake = FakeConnectivitySource::new();
        let network = NetworkId(7);
        fake.set_capabilities(
            network,
            NetworkCapabilities {
                internet: true,
                validated: false,
                not_suspended: true,
            },
        );

        let (callback, events) = recording_callback();
        fake.register_callback(CapabilityFilter::fully_connected(), callback)
            .await
            .unwrap();

        // Not validated, so the full-connectivity registration stays silent
        fake.fire_available(network);
        assert!(events.lock().unwrap().is_empty());

        // Loss is delivered regardless
        fake.fire_lost(network);
        assert_eq!(
            events.lock().unwrap().as_slice(),
            &[NetworkEvent::Lost(network)]
        );
    }

    #[tokio::test]
    async fn scripted_registration_failure_fires_once() {
        let fake = FakeConnectivitySource::new();
        fake.fail_next_registration();

        let (callback, _events) = recording_callback();
        let err = fake
            .register_callback(CapabilityFilter::fully_connected(), callback)
            .await
            .unwrap_err();
        assert!(matches!(err, PlatformError::Registration { .. }));
        assert_eq!(fake.registration_count(), 0);

        let (callback, _events) = recording_callback();
        fake.register_callback(CapabilityFilter::fully_connected(), callback)
            .await
            .unwrap();
        assert_eq!(fake.registration_count(), 1);
    }
}
