// File: src/state.rs
// Presentation state derived from run completions.
use crate::controller::{RunCompletion, RunOutcome};
use crate::model::GroupedResult;

pub const LOADING_MESSAGE: &str = "Loading...";
pub const EMPTY_MESSAGE: &str = "No items to display";

/// What a presenter should render.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ViewState {
    #[default]
    Loading,
    Error {
        message: String,
        detail: String,
    },
    Empty,
    Populated {
        groups: GroupedResult,
        status: String,
    },
}

impl ViewState {
    pub fn from_outcome(outcome: RunOutcome) -> Self {
        match outcome {
            Ok(data) if data.groups.is_empty() => ViewState::Empty,
            Ok(data) => {
                let status = data.status_message();
                ViewState::Populated {
                    groups: data.groups,
                    status,
                }
            }
            Err(e) => ViewState::Error {
                message: e.message(),
                detail: e.detail().to_string(),
            },
        }
    }

    /// Secondary line shown alongside the main content.
    pub fn status_line(&self) -> &str {
        match self {
            ViewState::Loading => LOADING_MESSAGE,
            ViewState::Error { detail, .. } => detail,
            ViewState::Empty => EMPTY_MESSAGE,
            ViewState::Populated { status, .. } => status,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }
}

/// Holds the rendered state and the newest generation it has seen, so a slow
/// earlier run can never overwrite a later one.
#[derive(Debug, Default)]
pub struct FeedView {
    state: ViewState,
    latest: u64,
}

impl FeedView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn latest_generation(&self) -> u64 {
        self.latest
    }

    /// Records that `generation` was dispatched and shows the loading state.
    pub fn begin(&mut self, generation: u64) {
        if generation < self.latest {
            return;
        }
        self.latest = generation;
        self.state = ViewState::Loading;
    }

    /// Applies a completion in a single assignment. Returns `false` and leaves
    /// the state untouched when a newer run has been dispatched since.
    pub fn apply(&mut self, completion: RunCompletion) -> bool {
        if completion.generation < self.latest {
            log::debug!(
                "Discarding stale run {} (latest is {})",
                completion.generation,
                self.latest
            );
            return false;
        }
        self.latest = completion.generation;
        self.state = ViewState::from_outcome(completion.outcome);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::pipeline;

    fn populated(generation: u64) -> RunCompletion {
        let body = br#"[{"id":1,"listId":1,"name":"Item 1"}]"#;
        RunCompletion {
            generation,
            outcome: pipeline::transform(body),
        }
    }

    fn failed(generation: u64, err: FetchError) -> RunCompletion {
        RunCompletion {
            generation,
            outcome: Err(err),
        }
    }

    #[test]
    fn slow_first_run_does_not_clobber_retry() {
        let mut view = FeedView::new();
        view.begin(1);
        view.begin(2);

        assert!(view.apply(populated(2)));
        assert!(!view.apply(failed(1, FetchError::Timeout)));

        match view.state() {
            ViewState::Populated { status, .. } => assert_eq!(status, "1 items loaded"),
            other => panic!("expected populated state, got {:?}", other),
        }
    }

    #[test]
    fn empty_result_is_not_an_error() {
        let mut view = FeedView::new();
        view.begin(1);
        assert!(view.apply(RunCompletion {
            generation: 1,
            outcome: pipeline::transform(b"[]"),
        }));
        assert_eq!(view.state(), &ViewState::Empty);
        assert_eq!(view.state().status_line(), EMPTY_MESSAGE);
    }

    #[test]
    fn error_carries_message_and_detail() {
        let state = ViewState::from_outcome(Err(FetchError::ServerError(503)));
        assert_eq!(
            state,
            ViewState::Error {
                message: "Server returned error code: 503".to_string(),
                detail: "Error loading data".to_string(),
            }
        );
    }

    #[test]
    fn retry_resets_to_loading() {
        let mut view = FeedView::new();
        view.begin(1);
        view.apply(failed(1, FetchError::NoConnectivity));
        assert!(!view.state().is_loading());

        view.begin(2);
        assert!(view.state().is_loading());
        assert_eq!(view.state().status_line(), LOADING_MESSAGE);
    }
}
