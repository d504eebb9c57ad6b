// File: src/client/core.rs
use crate::client::connectivity::Connectivity;
use crate::client::middleware::{DefaultHeadersLayer, DefaultHeadersService};
use crate::client::redirect::{FollowRedirectLayer, FollowRedirectService};
use crate::config::Config;
use crate::error::FetchError;

use http::{Request, StatusCode, Uri};
use http_body_util::BodyExt;
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tower::ServiceExt;
use tower_layer::Layer;

/// Raw body bytes of a successful fetch, or the classified failure.
pub type FetchOutcome = Result<Vec<u8>, FetchError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub connect: Duration,
    /// Upper bound for each wait on the peer once connected: response head,
    /// then the full body.
    pub read: Duration,
}

type HttpsClient = Client<HttpsConnector<HttpConnector>, String>;
type FeedService = DefaultHeadersService<FollowRedirectService<HttpsClient>>;

fn tls_config() -> rustls::ClientConfig {
    #[cfg(not(target_os = "android"))]
    let root_store = {
        let mut root_store = rustls::RootCertStore::empty();
        let result = rustls_native_certs::load_native_certs();
        for err in &result.errors {
            log::warn!("Error loading system certificate: {}", err);
        }
        let (added, ignored) = root_store.add_parsable_certificates(result.certs);
        log::debug!("Loaded {} system certificates ({} ignored)", added, ignored);
        if root_store.is_empty() {
            // Plain http endpoints still work; https ones will fail the handshake.
            log::warn!("No valid system certificates found.");
        }
        root_store
    };

    #[cfg(target_os = "android")]
    let root_store = rustls::RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };

    rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth()
}

fn build_http_client(tls: rustls::ClientConfig, connect_timeout: Duration) -> HttpsClient {
    let mut http = HttpConnector::new();
    http.enforce_http(false);
    http.set_connect_timeout(Some(connect_timeout));

    let https_connector = HttpsConnectorBuilder::new()
        .with_tls_config(tls)
        .https_or_http()
        .enable_http1()
        .wrap_connector(http);

    Client::builder(TokioExecutor::new()).build(https_connector)
}

/// Maps a transport error to `Timeout` when any cause in its chain is an IO
/// timeout, and to `ConnectionError` otherwise.
fn classify(err: &(dyn StdError + 'static)) -> FetchError {
    let mut cause = Some(err);
    while let Some(e) = cause {
        if let Some(io_err) = e.downcast_ref::<std::io::Error>()
            && io_err.kind() == std::io::ErrorKind::TimedOut
        {
            return FetchError::Timeout;
        }
        cause = e.source();
    }
    FetchError::ConnectionError
}

/// Retrieves the feed after checking the device is online and the outside
/// world is reachable.
#[derive(Clone, Debug)]
pub struct FeedClient {
    feed: FeedService,
    feed_timeouts: Timeouts,
    probe: HttpsClient,
    probe_url: Uri,
    probe_timeouts: Timeouts,
    connectivity: Arc<dyn Connectivity>,
}

impl FeedClient {
    pub fn new(config: &Config, connectivity: Arc<dyn Connectivity>) -> anyhow::Result<Self> {
        let probe_url = config.probe_uri()?;
        let feed_timeouts = config.feed_timeouts();
        let probe_timeouts = config.probe_timeouts();

        let tls = tls_config();
        let feed = DefaultHeadersLayer::json(&config.user_agent).layer(
            FollowRedirectLayer::new(config.max_redirects)
                .layer(build_http_client(tls.clone(), feed_timeouts.connect)),
        );
        let probe = build_http_client(tls, probe_timeouts.connect);

        Ok(Self {
            feed,
            feed_timeouts,
            probe,
            probe_url,
            probe_timeouts,
            connectivity,
        })
    }

    /// Connectivity check, reachability probe, then the GET itself. Each step
    /// short-circuits with its own failure; nothing is sent when offline.
    pub async fn fetch_feed(&self, url: &Uri) -> FetchOutcome {
        if !self.connectivity.is_network_available() {
            log::warn!(
                "No usable network path ({:?})",
                self.connectivity.network_state()
            );
            return Err(FetchError::NoConnectivity);
        }

        self.probe().await?;
        self.get(url).await
    }

    async fn probe(&self) -> Result<(), FetchError> {
        let request = Request::head(self.probe_url.clone())
            .body(String::new())
            .map_err(|e| {
                log::warn!("Cannot build probe request: {}", e);
                FetchError::ProbeFailed
            })?;

        let deadline = self.probe_timeouts.connect + self.probe_timeouts.read;
        match timeout(deadline, self.probe.request(request)).await {
            Ok(Ok(response)) => {
                log::debug!("Probe {} answered {}", self.probe_url, response.status());
                Ok(())
            }
            Ok(Err(e)) => {
                log::warn!("Probe {} failed: {}", self.probe_url, e);
                Err(FetchError::ProbeFailed)
            }
            Err(_) => {
                log::warn!("Probe {} timed out after {:?}", self.probe_url, deadline);
                Err(FetchError::ProbeFailed)
            }
        }
    }

    async fn get(&self, url: &Uri) -> FetchOutcome {
        let request = Request::get(url.clone()).body(String::new()).map_err(|e| {
            log::error!("Cannot build request for {}: {}", url, e);
            FetchError::Unexpected
        })?;

        log::info!("GET {}", url);
        let head_deadline = self.feed_timeouts.connect + self.feed_timeouts.read;
        let response = match timeout(head_deadline, self.feed.clone().oneshot(request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                let outcome = classify(&e);
                log::warn!("Request to {} failed: {} ({:?})", url, e, outcome);
                return Err(outcome);
            }
            Err(_) => {
                log::warn!("No response from {} within {:?}", url, head_deadline);
                return Err(FetchError::Timeout);
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            log::warn!("{} returned {}", url, status);
            return Err(FetchError::ServerError(status.as_u16()));
        }

        match timeout(self.feed_timeouts.read, response.into_body().collect()).await {
            Ok(Ok(collected)) => {
                let bytes = collected.to_bytes();
                log::debug!("Read {} bytes from {}", bytes.len(), url);
                Ok(bytes.to_vec())
            }
            Ok(Err(e)) => {
                let outcome = classify(&e);
                log::warn!("Reading body from {} failed: {} ({:?})", url, e, outcome);
                Err(outcome)
            }
            Err(_) => {
                log::warn!("Body from {} not complete within {:?}", url, self.feed_timeouts.read);
                Err(FetchError::Timeout)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Wrapped(std::io::Error);

    impl fmt::Display for Wrapped {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "connect error")
        }
    }

    impl StdError for Wrapped {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn nested_timeout_is_classified_as_timeout() {
        let err = Wrapped(std::io::Error::new(std::io::ErrorKind::TimedOut, "slow"));
        assert_eq!(classify(&err), FetchError::Timeout);
    }

    #[test]
    fn other_io_faults_are_connection_errors() {
        let err = Wrapped(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "refused",
        ));
        assert_eq!(classify(&err), FetchError::ConnectionError);
    }
}
