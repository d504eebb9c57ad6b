// File: src/controller.rs
//! Starts fetch-and-transform runs and hands their outcomes back.
//!
//! Every trigger (initial load, retry, refresh) dispatches an independent run
//! tagged with a fresh generation number. Runs are never cancelled; each one
//! posts exactly one [`RunCompletion`] on the channel returned by
//! [`FeedController::new`], and the receiving side decides whether it is
//! still current (see [`crate::state::FeedView`]).
use crate::client::{Connectivity, FeedClient};
use crate::config::Config;
use crate::error::FetchError;
use crate::pipeline::{self, FeedData};
use http::Uri;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub type RunOutcome = Result<FeedData, FetchError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunCompletion {
    pub generation: u64,
    pub outcome: RunOutcome,
}

/// Handle for a run that has been started.
#[derive(Debug)]
pub struct Dispatched {
    pub generation: u64,
    pub handle: JoinHandle<()>,
}

/// One complete run: fetch, then transform. No retries, no shared state.
pub async fn run_once(client: &FeedClient, url: &Uri) -> RunOutcome {
    let bytes = client.fetch_feed(url).await?;
    pipeline::transform(&bytes)
}

async fn execute(client: FeedClient, url: Uri, generation: u64) -> RunCompletion {
    log::info!("Run {} started", generation);

    // A panic inside the run surfaces as a JoinError here.
    let run = tokio::spawn(async move { run_once(&client, &url).await });
    let outcome = match run.await {
        Ok(outcome) => outcome,
        Err(e) => {
            log::error!("Run {} aborted: {}", generation, e);
            Err(FetchError::Unexpected)
        }
    };

    match &outcome {
        Ok(data) => log::info!(
            "Run {} finished: {} items in {} lists",
            generation,
            data.item_count,
            data.groups.group_count()
        ),
        Err(e) => log::warn!("Run {} failed: {}", generation, e),
    }

    RunCompletion { generation, outcome }
}

#[derive(Clone, Debug)]
pub struct FeedController {
    client: FeedClient,
    feed_url: Uri,
    generation: Arc<AtomicU64>,
    completions: mpsc::Sender<RunCompletion>,
}

impl FeedController {
    pub fn new(client: FeedClient, feed_url: Uri) -> (Self, mpsc::Receiver<RunCompletion>) {
        let (tx, rx) = mpsc::channel(16);
        let controller = Self {
            client,
            feed_url,
            generation: Arc::new(AtomicU64::new(0)),
            completions: tx,
        };
        (controller, rx)
    }

    pub fn from_config(
        config: &Config,
        connectivity: Arc<dyn Connectivity>,
    ) -> anyhow::Result<(Self, mpsc::Receiver<RunCompletion>)> {
        let client = FeedClient::new(config, connectivity)?;
        Ok(Self::new(client, config.feed_uri()?))
    }

    pub fn feed_url(&self) -> &Uri {
        &self.feed_url
    }

    /// Generation of the most recently dispatched run, 0 if none.
    pub fn latest_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Reserves the generation for a run the caller is about to start, so it
    /// can mark the view as loading before the run begins.
    pub fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Runs to completion on the current task and returns the tagged outcome.
    pub async fn run(&self) -> RunCompletion {
        self.run_reserved(self.next_generation()).await
    }

    /// Like [`run`](Self::run), for a generation from
    /// [`next_generation`](Self::next_generation).
    pub async fn run_reserved(&self, generation: u64) -> RunCompletion {
        execute(self.client.clone(), self.feed_url.clone(), generation).await
    }

    /// Starts a new run on the runtime; its completion arrives on the channel.
    /// Must be called from within a tokio runtime.
    pub fn dispatch(&self) -> Dispatched {
        let generation = self.next_generation();
        let client = self.client.clone();
        let url = self.feed_url.clone();
        let tx = self.completions.clone();

        let handle = tokio::spawn(async move {
            let completion = execute(client, url, generation).await;
            if tx.send(completion).await.is_err() {
                log::debug!("Run {} completed with nobody listening", generation);
            }
        });

        Dispatched { generation, handle }
    }
}
