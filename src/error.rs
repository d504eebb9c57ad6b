// File: ./src/error.rs
//! Terminal failure outcomes of a fetch-and-transform run.
use thiserror::Error;

/// Every way a run can fail after it has started.
///
/// `Display` yields the user-facing message; [`FetchError::detail`] yields the
/// secondary status line shown under it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("No internet connection available")]
    NoConnectivity,
    #[error("Connection error")]
    ProbeFailed,
    #[error("Server returned error code: {0}")]
    ServerError(u16),
    #[error("Connection timed out")]
    Timeout,
    #[error("Connection error")]
    ConnectionError,
    #[error("Error loading data")]
    MalformedFeed,
    #[error("Unexpected error")]
    Unexpected,
}

impl FetchError {
    pub fn message(&self) -> String {
        self.to_string()
    }

    pub fn detail(&self) -> &'static str {
        match self {
            FetchError::NoConnectivity | FetchError::ProbeFailed => {
                "Please check your network settings"
            }
            FetchError::Timeout => "Request took too long",
            FetchError::ServerError(_)
            | FetchError::ConnectionError
            | FetchError::MalformedFeed
            | FetchError::Unexpected => "Error loading data",
        }
    }
}
