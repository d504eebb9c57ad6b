// File: ./src/client/mod.rs
pub mod connectivity;
pub mod core;
pub mod middleware;
pub mod redirect;

pub use crate::client::connectivity::{AssumeOnline, Connectivity, FixedConnectivity, NetworkState};
pub use crate::client::core::{FeedClient, FetchOutcome, Timeouts};
