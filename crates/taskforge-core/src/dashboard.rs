mod form;
mod loader;
mod state;

use std::sync::Arc;

use tokio::sync::{
    broadcast,
    watch,
};
use tokio::task::JoinHandle;
use tracing::{
    debug,
    info,
    warn,
};

pub use self::form::SubmitOutcome;
pub use self::state::{
    DashboardEvent,
    DashboardState,
    FormState,
    TaskStats,
};
use crate::api::{
    ApiError,
    TaskApi,
};
use crate::cancel::CancelToken;
use crate::error::DashboardError;

const EVENT_CAPACITY: usize = 64;

struct Shared<A> {
    api: A,
    state: watch::Sender<DashboardState>,
    events: broadcast::Sender<DashboardEvent>,
    cancel: CancelToken,
}

impl<A> Shared<A> {
    /// Runs `modify` against the current state unless the view has been torn
    /// down. Subscribers are notified when `modify` returns true.
    fn update<F>(&self, modify: F) -> bool
    where
        F: FnOnce(&mut DashboardState) -> bool,
    {
        self.state.send_if_modified(|state| {
            if self.cancel.is_cancelled() {
                return false;
            }
            modify(state)
        })
    }

    fn emit(&self, event: DashboardEvent) {
        // No receivers is fine.
        let _ = self.events.send(event);
    }
}

/// One dashboard view: the task list, the creation form and their status.
///
/// State is published through a `watch` channel; discrete transitions go out
/// on a broadcast channel. After [`Dashboard::teardown`] no further state
/// changes are made, including results of requests still in flight.
pub struct Dashboard<A> {
    shared: Arc<Shared<A>>,
    loader: Option<JoinHandle<()>>,
    mounted: bool,
}

impl<A: TaskApi> Dashboard<A> {
    pub fn new(api: A) -> Self {
        let (state, _) = watch::channel(DashboardState::default());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                api,
                state,
                events,
                cancel: CancelToken::new(),
            }),
            loader: None,
            mounted: false,
        }
    }

    /// Activates the view and starts the one-time task list fetch.
    ///
    /// Must be called from within a tokio runtime.
    pub fn mount(&mut self) {
        if self.mounted {
            warn!("dashboard already mounted; ignoring");
            return;
        }
        if self.shared.cancel.is_cancelled() {
            warn!("dashboard was torn down; a new view must be created");
            return;
        }

        self.mounted = true;
        info!("mounting dashboard");
        let fetch = tokio::spawn(loader::load_tasks(Arc::clone(&self.shared)));
        let shared = Arc::clone(&self.shared);
        self.loader = Some(tokio::spawn(loader::supervise(shared, fetch)));
    }

    /// Deactivates the view. Pending results are dropped without touching
    /// state.
    pub fn teardown(&mut self) {
        if self.shared.cancel.is_cancelled() {
            return;
        }
        self.shared.cancel.cancel();
        self.mounted = false;
        if let Some(loader) = self.loader.take()
            && !loader.is_finished()
        {
            debug!("teardown while task list request in flight");
        }
        info!("dashboard torn down");
        self.shared.emit(DashboardEvent::TornDown);
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted && !self.shared.cancel.is_cancelled()
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.shared.cancel.clone()
    }

    pub fn api(&self) -> &A {
        &self.shared.api
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardState> {
        self.shared.state.subscribe()
    }

    pub fn events(&self) -> broadcast::Receiver<DashboardEvent> {
        self.shared.events.subscribe()
    }

    pub fn snapshot(&self) -> DashboardState {
        self.shared.state.borrow().clone()
    }

    pub fn stats(&self) -> TaskStats {
        self.shared.state.borrow().stats()
    }

    /// Waits until the initial fetch has resolved or the view is torn down,
    /// then returns the current state. A view that is not mounted returns
    /// its current state straight away.
    pub async fn wait_until_loaded(&self) -> DashboardState {
        if !self.is_mounted() {
            return self.snapshot();
        }
        let mut rx = self.subscribe();
        tokio::select! {
            loaded = rx.wait_for(|state| !state.loading) => {
                if let Ok(state) = loaded {
                    return state.clone();
                }
            }
            () = self.shared.cancel.cancelled() => {}
        }
        self.snapshot()
    }
}

impl<A> Drop for Dashboard<A> {
    fn drop(&mut self) {
        self.shared.cancel.cancel();
    }
}

/// Converts a failed request into the error shown to the user. Non-2xx
/// statuses get `status_message`; other failures keep their own message.
fn request_error(err: &ApiError, status_message: &str) -> DashboardError {
    match err {
        ApiError::Status { .. } => DashboardError::Request(status_message.to_string()),
        other => DashboardError::Request(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;
    use taskforge_shared::{
        TaskCreate,
        TaskDto,
    };

    use super::*;
    use crate::error::{
        GENERIC_FAILURE,
        LOAD_FAILED,
        format_error,
    };

    struct BrokenApi;

    impl TaskApi for BrokenApi {
        async fn list_tasks(&self) -> Result<Vec<TaskDto>, ApiError> {
            panic!("list handler crashed");
        }

        async fn create_task(&self, _payload: TaskCreate) -> Result<TaskDto, ApiError> {
            panic!("create handler crashed");
        }
    }

    #[test]
    fn status_failures_use_the_fixed_message() {
        let err = ApiError::Status {
            operation: "list tasks",
            status: StatusCode::BAD_GATEWAY,
        };
        assert_eq!(
            request_error(&err, LOAD_FAILED),
            DashboardError::Request("Failed to load tasks.".to_string())
        );
    }

    #[test]
    fn decode_failures_keep_their_message() {
        let json_err = serde_json::from_str::<u64>("{").expect_err("invalid json");
        let expected = json_err.to_string();
        let err = ApiError::from(json_err);
        assert_eq!(
            request_error(&err, LOAD_FAILED),
            DashboardError::Request(expected)
        );
    }

    #[tokio::test]
    async fn crashed_fetch_ends_loading_with_generic_error() {
        let mut dashboard = Dashboard::new(BrokenApi);
        let mut events = dashboard.events();
        dashboard.mount();

        let state = dashboard.wait_until_loaded().await;
        assert!(!state.loading);
        assert!(state.tasks.is_empty());
        assert!(matches!(state.load_error, Some(DashboardError::Unexpected(_))));
        assert_eq!(format_error(state.load_error.as_ref()), GENERIC_FAILURE);
        assert!(matches!(
            events.recv().await.expect("event"),
            DashboardEvent::LoadFailed(DashboardError::Unexpected(_))
        ));

        dashboard.teardown();
    }

    #[tokio::test]
    async fn unmounted_view_does_not_wait_for_a_fetch() {
        let dashboard = Dashboard::new(BrokenApi);

        let state = dashboard.wait_until_loaded().await;

        assert!(state.loading);
        assert!(!dashboard.is_mounted());
    }
}
