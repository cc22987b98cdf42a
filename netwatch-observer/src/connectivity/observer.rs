//! Connectivity observation: point query plus change subscription.
//!
//! The platform pushes callbacks; consumers want a stream. The bridge is a
//! bounded mpsc channel per subscription: the registered callback forwards
//! each platform event with a non-blocking `try_send` (the platform's
//! delivery thread is never blocked), and the subscriber consumes the other
//! end as a `Stream`. Each subscription owns its own registration, released
//! on drop of the returned stream; every exit path, including abandoning
//! the stream mid-consumption, runs the deregistration exactly once.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use netwatch_platform::{
    CapabilityFilter, ConnectivitySource, NetworkCallback, NetworkEvent, PlatformError,
    RegistrationId,
};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

use super::state::ReachabilityState;

/// Buffered elements per subscription before the forwarder starts dropping.
/// A lagging consumer loses intermediate transitions rather than stalling
/// the platform's delivery thread.
const EVENT_BUFFER: usize = 64;

/// Error type for subscription attempts.
///
/// There is exactly one failure class: the platform refused the callback
/// registration. It is terminal for that attempt and never retried
/// internally.
#[derive(Debug, thiserror::Error)]
pub enum ObserveError {
    #[error("could not subscribe to connectivity changes: {source}")]
    Registration {
        #[from]
        source: PlatformError,
    },
}

/// Queries and observes reachability through an injected
/// [`ConnectivitySource`].
#[derive(Clone)]
pub struct ConnectivityObserver {
    source: Arc<dyn ConnectivitySource>,
}

impl ConnectivityObserver {
    pub fn new(source: Arc<dyn ConnectivitySource>) -> Self {
        Self { source }
    }

    /// The reachability state right now.
    ///
    /// Available only when an active network exists and its snapshot holds
    /// all three capabilities; every other outcome, including "no active
    /// network", is [`ReachabilityState::Unavailable`]. Read-only, no error
    /// path.
    pub async fn query_current(&self) -> ReachabilityState {
        let capabilities = match self.source.active_network().await {
            Some(network) => self.source.network_capabilities(network).await,
            None => None,
        };
        ReachabilityState::from_snapshot(capabilities)
    }

    /// Subscribe to reachability changes.
    ///
    /// The returned stream yields the current state as its first element
    /// (a late subscriber is never left without a value), then one element
    /// per platform transition, in platform order, with no deduplication of
    /// identical consecutive states. The stream is infinite and does not
    /// replay history; every call performs a fresh registration and a fresh
    /// initial query.
    ///
    /// Dropping the stream deregisters the underlying callback. If the
    /// registration itself is refused this returns an error and nothing is
    /// left registered.
    pub async fn observe(&self) -> Result<ConnectivityStream, ObserveError> {
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);

        // First element is the state at subscription time, enqueued before
        // the platform callback exists so no event can outrun it.
        let initial = self.query_current().await;
        let _ = events_tx.try_send(initial);

        let callback: NetworkCallback = Box::new(move |event| {
            let state = match event {
                NetworkEvent::Available(_) => ReachabilityState::Available,
                NetworkEvent::Lost(_) => ReachabilityState::Unavailable,
            };
            // Runs on the platform's delivery thread: forward or drop,
            // never block.
            if let Err(err) = events_tx.try_send(state) {
                warn!(%err, "dropping connectivity event for a lagging subscriber");
            }
        });

        let registration = self
            .source
            .register_callback(CapabilityFilter::fully_connected(), callback)
            .await?;
        debug!(registration = registration.0, "connectivity subscription registered");

        Ok(ConnectivityStream {
            _registration: RegistrationGuard {
                source: Arc::clone(&self.source),
                registration,
            },
            events: ReceiverStream::new(events_rx),
        })
    }
}

/// Owns one platform callback registration for the lifetime of a stream.
struct RegistrationGuard {
    source: Arc<dyn ConnectivitySource>,
    registration: RegistrationId,
}

impl Drop for RegistrationGuard {
    fn drop(&mut self) {
        debug!(
            registration = self.registration.0,
            "connectivity subscription deregistered"
        );
        self.source.unregister_callback(self.registration);
    }
}

/// Live sequence of [`ReachabilityState`] values for one subscription.
///
/// Declared guard-first: ending the stream removes the platform
/// registration before the receiving channel closes.
pub struct ConnectivityStream {
    _registration: RegistrationGuard,
    events: ReceiverStream<ReachabilityState>,
}

impl Stream for ConnectivityStream {
    type Item = ReachabilityState;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.get_mut().events).poll_next(cx)
    }
}
