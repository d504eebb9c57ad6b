// File: ./src/client/connectivity.rs
//! Platform network-state query consumed before any request is made.
use std::fmt::Debug;

/// What the platform reports about its active network path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkState {
    /// Capability-based platforms: both flags must be set.
    Capabilities { has_internet: bool, validated: bool },
    /// Older platforms only expose a single "connected" flag.
    Legacy { connected: bool },
    NoActiveNetwork,
}

impl NetworkState {
    pub fn is_usable(&self) -> bool {
        match *self {
            NetworkState::Capabilities {
                has_internet,
                validated,
            } => has_internet && validated,
            NetworkState::Legacy { connected } => connected,
            NetworkState::NoActiveNetwork => false,
        }
    }
}

pub trait Connectivity: Send + Sync + Debug {
    fn network_state(&self) -> NetworkState;

    fn is_network_available(&self) -> bool {
        self.network_state().is_usable()
    }
}

/// Desktop default: there is no platform API to ask, so the reachability
/// probe is the only offline detection.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeOnline;

impl Connectivity for AssumeOnline {
    fn network_state(&self) -> NetworkState {
        NetworkState::Capabilities {
            has_internet: true,
            validated: true,
        }
    }
}

/// Reports a fixed state. Used by tests and by bindings that push the state in.
#[derive(Debug, Clone, Copy)]
pub struct FixedConnectivity(pub NetworkState);

impl Connectivity for FixedConnectivity {
    fn network_state(&self) -> NetworkState {
        self.0
    }
}
