//! The two-valued reachability model.

use netwatch_platform::NetworkCapabilities;
use serde::{Deserialize, Serialize};

/// Reachability of the device at one instant.
///
/// A closed enumeration: the device either has a usable connection or it
/// does not. There is no history and no identity beyond the variant, so a new
/// value is produced on every query and every platform transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReachabilityState {
    /// An active network exists with internet configured, validation passed,
    /// and no suspension
    Available,
    /// Anything else, including "no active network at all"
    Unavailable,
}

impl ReachabilityState {
    /// Evaluate a capability snapshot of the active network.
    ///
    /// `None` means no active network (or a network the platform no longer
    /// knows), which counts as unavailable. Absence is data here, never an
    /// error.
    pub fn from_snapshot(capabilities: Option<NetworkCapabilities>) -> Self {
        match capabilities {
            Some(caps) if caps.internet && caps.validated && caps.not_suspended => Self::Available,
            _ => Self::Unavailable,
        }
    }

    pub fn is_connected(self) -> bool {
        matches!(self, Self::Available)
    }

    /// The rendered label the display surface shows.
    pub fn label(self) -> &'static str {
        if self.is_connected() {
            "Connected"
        } else {
            "Disconnected"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_snapshot_maps_to_exactly_one_variant() {
        // All eight capability combinations plus the no-network case
        for internet in [false, true] {
            for validated in [false, true] {
                for not_suspended in [false, true] {
                    let state = ReachabilityState::from_snapshot(Some(NetworkCapabilities {
                        internet,
                        validated,
                        not_suspended,
                    }));
                    let expected = if internet && validated && not_suspended {
                        ReachabilityState::Available
                    } else {
                        ReachabilityState::Unavailable
                    };
                    assert_eq!(state, expected);
                }
            }
        }
        assert_eq!(
            ReachabilityState::from_snapshot(None),
            ReachabilityState::Unavailable
        );
    }

    #[test]
    fn labels_match_the_display_contract() {
        assert_eq!(ReachabilityState::Available.label(), "Connected");
        assert_eq!(ReachabilityState::Unavailable.label(), "Disconnected");
        assert!(ReachabilityState::Available.is_connected());
        assert!(!ReachabilityState::Unavailable.is_connected());
    }
}
