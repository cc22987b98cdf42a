//! netwatch-observer: reachability state and its observation
//!
//! This crate turns the platform's callback-based connectivity notifications
//! into a reactive value stream and answers point-in-time reachability
//! queries. It is the piece between the platform seam
//! ([`netwatch_platform`]) and a display surface that renders one of two
//! strings.
//!
//! ## Key Modules
//!
//! - **[`connectivity::state`]**: The two-valued [`ReachabilityState`] model
//!   and its pure display mapping
//! - **[`connectivity::observer`]**: [`ConnectivityObserver`]: point query
//!   plus per-subscription change streams with scoped deregistration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use netwatch_observer::connectivity::observer::ConnectivityObserver;
//! use netwatch_platform::{ProbeConfig, ProbeConnectivitySource};
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let source = Arc::new(ProbeConnectivitySource::spawn(ProbeConfig::new()).await?);
//! let observer = ConnectivityObserver::new(source);
//!
//! let mut changes = observer.observe().await?;
//! while let Some(state) = changes.next().await {
//!     println!("{}", state.label());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Platform callbacks → try_send → bounded mpsc → Stream<ReachabilityState>
//!        ↑                                              ↓
//! ConnectivitySource ← ConnectivityObserver ← subscriber (drop = deregister)
//! ```
//!
//! [`ReachabilityState`]: connectivity::state::ReachabilityState
//! [`ConnectivityObserver`]: connectivity::observer::ConnectivityObserver

pub mod connectivity;
