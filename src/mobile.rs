/* fetchlist/src/mobile.rs
 *
 * UniFFI interface for exposing the feed pipeline to mobile platforms (Android).
 */

use crate::client::{Connectivity, NetworkState};
use crate::config::Config;
use crate::context::StandardContext;
use crate::controller::FeedController;
use crate::state::{FeedView, ViewState};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, uniffi::Error)]
#[uniffi(flat_error)]
pub enum MobileError {
    Generic(String),
}
impl From<anyhow::Error> for MobileError {
    fn from(e: anyhow::Error) -> Self {
        Self::Generic(e.to_string())
    }
}
impl fmt::Display for MobileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MobileError::Generic(s) => write!(f, "{}", s),
        }
    }
}
impl std::error::Error for MobileError {}

#[derive(Debug, Clone, Copy, uniffi::Enum)]
pub enum MobileNetworkState {
    Capabilities { has_internet: bool, validated: bool },
    Legacy { connected: bool },
    NoActiveNetwork,
}

impl From<MobileNetworkState> for NetworkState {
    fn from(s: MobileNetworkState) -> Self {
        match s {
            MobileNetworkState::Capabilities {
                has_internet,
                validated,
            } => NetworkState::Capabilities {
                has_internet,
                validated,
            },
            MobileNetworkState::Legacy { connected } => NetworkState::Legacy { connected },
            MobileNetworkState::NoActiveNetwork => NetworkState::NoActiveNetwork,
        }
    }
}

/// Implemented on the Kotlin side on top of `ConnectivityManager`.
#[uniffi::export(with_foreign)]
pub trait MobileConnectivity: Send + Sync {
    fn network_state(&self) -> MobileNetworkState;
}

struct ForeignConnectivity(Arc<dyn MobileConnectivity>);

impl fmt::Debug for ForeignConnectivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ForeignConnectivity")
    }
}

impl Connectivity for ForeignConnectivity {
    fn network_state(&self) -> NetworkState {
        self.0.network_state().into()
    }
}

#[derive(uniffi::Enum)]
pub enum MobileViewKind {
    Loading,
    Error,
    Empty,
    Populated,
}

#[derive(uniffi::Record)]
pub struct MobileItem {
    pub id: i64,
    pub list_id: i64,
    pub name: String,
}

#[derive(uniffi::Record)]
pub struct MobileGroup {
    pub list_id: i64,
    pub items: Vec<MobileItem>,
}

#[derive(uniffi::Record)]
pub struct MobileViewState {
    pub kind: MobileViewKind,
    /// Error message; `None` unless `kind` is `Error`.
    pub message: Option<String>,
    pub status: String,
    pub groups: Vec<MobileGroup>,
}

fn to_mobile_state(state: &ViewState) -> MobileViewState {
    let status = state.status_line().to_string();
    match state {
        ViewState::Loading => MobileViewState {
            kind: MobileViewKind::Loading,
            message: None,
            status,
            groups: vec![],
        },
        ViewState::Error { message, .. } => MobileViewState {
            kind: MobileViewKind::Error,
            message: Some(message.clone()),
            status,
            groups: vec![],
        },
        ViewState::Empty => MobileViewState {
            kind: MobileViewKind::Empty,
            message: None,
            status,
            groups: vec![],
        },
        ViewState::Populated { groups, .. } => MobileViewState {
            kind: MobileViewKind::Populated,
            message: None,
            status,
            groups: groups
                .iter()
                .map(|(list_id, items)| MobileGroup {
                    list_id: *list_id,
                    items: items
                        .iter()
                        .map(|i| MobileItem {
                            id: i.id(),
                            list_id: i.list_id(),
                            name: i.name().to_string(),
                        })
                        .collect(),
                })
                .collect(),
        },
    }
}

#[derive(uniffi::Object)]
pub struct FetchMobile {
    controller: FeedController,
    view: Arc<Mutex<FeedView>>,
}

#[uniffi::export(async_runtime = "tokio")]
impl FetchMobile {
    #[uniffi::constructor]
    pub fn new(
        android_files_dir: String,
        connectivity: Arc<dyn MobileConnectivity>,
    ) -> Result<Self, MobileError> {
        #[cfg(target_os = "android")]
        android_logger::init_once(
            android_logger::Config::default()
                .with_max_level(log::LevelFilter::Debug)
                .with_tag("FetchRust"),
        );

        let ctx = StandardContext::new(Some(PathBuf::from(android_files_dir)));
        let config = Config::load_or_default(&ctx)?;
        // Runs are awaited inline by `load`, so the completion channel is unused.
        let (controller, _completions) =
            FeedController::from_config(&config, Arc::new(ForeignConnectivity(connectivity)))?;

        Ok(Self {
            controller,
            view: Arc::new(Mutex::new(FeedView::new())),
        })
    }

    /// Starts a run and waits for it. Used for the initial load as well as
    /// retry and refresh. `current_state` reports `Loading` meanwhile. If a
    /// newer call has started since, its state is returned instead of this
    /// run's outcome.
    pub async fn load(&self) -> MobileViewState {
        let generation = self.controller.next_generation();
        self.view.lock().await.begin(generation);
        let completion = self.controller.run_reserved(generation).await;
        let mut view = self.view.lock().await;
        view.apply(completion);
        to_mobile_state(view.state())
    }

    pub async fn current_state(&self) -> MobileViewState {
        to_mobile_state(self.view.lock().await.state())
    }

    pub fn feed_url(&self) -> String {
        self.controller.feed_url().to_string()
    }
}
