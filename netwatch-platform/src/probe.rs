//! Probe-backed connectivity source.
//!
//! A plain process has no connectivity manager to ask, so reachability is
//! established the direct way: periodically attempt a TCP connect to one of
//! a small set of well-known endpoints under a bounded timeout. The source
//! is edge-triggered: a transition up fires [`NetworkEvent::Available`], a
//! transition down fires [`NetworkEvent::Lost`], steady state fires nothing.
//! The last probe result is cached so point queries answer without waiting
//! for a fresh probe.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::error::{PlatformError, Result};
use crate::source::{
    CapabilityFilter, ConnectivitySource, NetworkCallback, NetworkCapabilities, NetworkEvent,
    NetworkId, RegistrationId,
};

/// The single network a probe source models. Either the probe target is
/// reachable (this network is active, fully connected) or nothing is.
const PROBE_NETWORK: NetworkId = NetworkId(1);

/// Configuration for [`ProbeConnectivitySource`].
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Probe endpoints as `host:port` socket addresses. The round succeeds
    /// on the first endpoint that accepts a connection.
    pub endpoints: Vec<String>,
    /// Time between probe rounds
    pub interval: Duration,
    /// Per-endpoint connect timeout
    pub connect_timeout: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            // Public DNS resolvers: answer on 53/tcp from almost anywhere
            endpoints: vec!["1.1.1.1:53".to_string(), "8.8.8.8:53".to_string()],
            interval: Duration::from_secs(5),
            connect_timeout: Duration::from_secs(2),
        }
    }
}

impl ProbeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the probe endpoints.
    pub fn with_endpoints(mut self, endpoints: Vec<String>) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Set the time between probe rounds.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the per-endpoint connect timeout.
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }
}

type SharedCallback = Arc<dyn Fn(NetworkEvent) + Send + Sync>;

struct ProbeRegistration {
    id: u64,
    filter: CapabilityFilter,
    callback: SharedCallback,
}

#[derive(Default)]
struct ProbeState {
    online: bool,
    registrations: Vec<ProbeRegistration>,
}

/// [`ConnectivitySource`] backed by a periodic TCP reachability probe.
///
/// One background task per source drives the probe loop; dropping the source
/// aborts it. Registrations receive the edge transitions the loop detects.
pub struct ProbeConnectivitySource {
    shared: Arc<Mutex<ProbeState>>,
    next_registration: AtomicU64,
    probe_task: tokio::task::JoinHandle<()>,
}

impl ProbeConnectivitySource {
    /// Parse the configured endpoints, run one initial probe round, and
    /// spawn the periodic probe loop.
    ///
    /// The initial round runs before this returns, so point queries answer
    /// from a real snapshot immediately.
    pub async fn spawn(config: ProbeConfig) -> Result<Self> {
        let endpoints = parse_endpoints(&config.endpoints)?;
        let shared = Arc::new(Mutex::new(ProbeState::default()));

        let online = probe_round(&endpoints, config.connect_timeout).await;
        shared.lock().unwrap().online = online;
        info!(online, "connectivity probe initialized");

        let loop_shared = Arc::clone(&shared);
        let interval = config.interval;
        let connect_timeout = config.connect_timeout;
        let probe_task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The immediate first tick would repeat the initial round
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let online = probe_round(&endpoints, connect_timeout).await;
                dispatch_transition(&loop_shared, online);
            }
        });

        Ok(Self {
            shared,
            next_registration: AtomicU64::new(0),
            probe_task,
        })
    }
}

impl std::fmt::Debug for ProbeConnectivitySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProbeConnectivitySource").finish_non_exhaustive()
    }
}

impl Drop for ProbeConnectivitySource {
    fn drop(&mut self) {
        self.probe_task.abort();
    }
}

#[async_trait]
impl ConnectivitySource for ProbeConnectivitySource {
    async fn active_network(&self) -> Option<NetworkId> {
        self.shared
            .lock()
            .unwrap()
            .online
            .then_some(PROBE_NETWORK)
    }

    async fn network_capabilities(&self, network: NetworkId) -> Option<NetworkCapabilities> {
        let state = self.shared.lock().unwrap();
        (network == PROBE_NETWORK && state.online).then(NetworkCapabilities::fully_connected)
    }

    async fn register_callback(
        &self,
        filter: CapabilityFilter,
        callback: NetworkCallback,
    ) -> Result<RegistrationId> {
        if self.probe_task.is_finished() {
            return Err(PlatformError::registration("probe loop is not running"));
        }
        let id = self.next_registration.fetch_add(1, Ordering::Relaxed);
        self.shared.lock().unwrap().registrations.push(ProbeRegistration {
            id,
            filter,
            callback: Arc::from(callback),
        });
        debug!(registration = id, "probe callback registered");
        Ok(RegistrationId(id))
    }

    fn unregister_callback(&self, registration: RegistrationId) {
        let mut state = self.shared.lock().unwrap();
        state.registrations.retain(|r| r.id != registration.0);
        debug!(registration = registration.0, "probe callback unregistered");
    }
}

fn parse_endpoints(endpoints: &[String]) -> Result<Vec<SocketAddr>> {
    endpoints
        .iter()
        .map(|endpoint| {
            endpoint
                .parse()
                .map_err(|_| PlatformError::InvalidEndpoint {
                    endpoint: endpoint.clone(),
                })
        })
        .collect()
}

/// One probe round: reachable iff any endpoint accepts a connection within
/// the timeout.
async fn probe_round(endpoints: &[SocketAddr], connect_timeout: Duration) -> bool {
    for addr in endpoints {
        match tokio::time::timeout(connect_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(_stream)) => {
                debug!(%addr, "probe connect succeeded");
                return true;
            }
            Ok(Err(err)) => debug!(%addr, %err, "probe connect failed"),
            Err(_) => debug!(%addr, "probe connect timed out"),
        }
    }
    false
}

/// Record the round's result and, on an edge, fire the matching event at
/// every registration whose filter it concerns.
fn dispatch_transition(shared: &Mutex<ProbeState>, online: bool) {
    let (event, callbacks) = {
        let mut state = shared.lock().unwrap();
        if state.online == online {
            return;
        }
        state.online = online;
        let event = if online {
            NetworkEvent::Available(PROBE_NETWORK)
        } else {
            NetworkEvent::Lost(PROBE_NETWORK)
        };
        let capabilities = NetworkCapabilities::fully_connected();
        let callbacks: Vec<SharedCallback> = state
            .registrations
            .iter()
            .filter(|r| !online || capabilities.satisfies(&r.filter))
            .map(|r| Arc::clone(&r.callback))
            .collect();
        (event, callbacks)
    };

    if online {
        info!("network became reachable");
    } else {
        warn!("network was lost");
    }
    for callback in callbacks {
        callback(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;
    use tracing_test::traced_test;

    async fn local_endpoint() -> (TcpListener, String) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        (listener, addr.to_string())
    }

    fn fast_config(endpoint: String) -> ProbeConfig {
        ProbeConfig::new()
            .with_endpoints(vec![endpoint])
            .with_interval(Duration::from_millis(50))
            .with_connect_timeout(Duration::from_millis(200))
    }

    #[traced_test]
    #[tokio::test]
    async fn reports_reachable_endpoint_as_active() {
        let (_listener, endpoint) = local_endpoint().await;
        let source = ProbeConnectivitySource::spawn(fast_config(endpoint)).await.unwrap();

        let network = source.active_network().await.expect("probe target is up");
        assert_eq!(
            source.network_capabilities(network).await,
            Some(NetworkCapabilities::fully_connected())
        );
    }

    #[traced_test]
    #[tokio::test]
    async fn reports_dead_endpoint_as_no_network() {
        // Bind then drop to get a port nothing listens on
        let (listener, endpoint) = local_endpoint().await;
        drop(listener);

        let source = ProbeConnectivitySource::spawn(fast_config(endpoint)).await.unwrap();
        assert_eq!(source.active_network().await, None);
        assert_eq!(source.network_capabilities(PROBE_NETWORK).await, None);
    }

    #[traced_test]
    #[tokio::test]
    async fn fires_lost_when_the_endpoint_goes_away() {
        let (listener, endpoint) = local_endpoint().await;
        let source = ProbeConnectivitySource::spawn(fast_config(endpoint)).await.unwrap();

        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        source
            .register_callback(
                CapabilityFilter::fully_connected(),
                Box::new(move |event| sink.lock().unwrap().push(event)),
            )
            .await
            .unwrap();

        drop(listener);
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if events.lock().unwrap().contains(&NetworkEvent::Lost(PROBE_NETWORK)) {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(20)).await;
            }
        })
        .await
        .expect("probe loop never reported the loss");

        assert_eq!(source.active_network().await, None);
    }

    #[tokio::test]
    async fn rejects_unparseable_endpoints() {
        let config = ProbeConfig::new().with_endpoints(vec!["not-an-address".to_string()]);
        let err = ProbeConnectivitySource::spawn(config).await.unwrap_err();
        assert!(matches!(err, PlatformError::InvalidEndpoint { .. }));
    }
}
