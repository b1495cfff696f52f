use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{
    debug,
    error,
    info,
    instrument,
    warn,
};

use super::{
    DashboardEvent,
    Shared,
    request_error,
};
use crate::api::TaskApi;
use crate::error::{
    DashboardError,
    LOAD_FAILED,
};

#[instrument(skip_all)]
pub(super) async fn load_tasks<A: TaskApi>(shared: Arc<Shared<A>>) {
    let cancel = shared.cancel.clone();
    let result = tokio::select! {
        biased;
        () = cancel.cancelled() => {
            debug!("view torn down before task list arrived; request abandoned");
            return;
        }
        result = shared.api.list_tasks() => result,
    };

    match result {
        Ok(tasks) => {
            let count = tasks.len();
            let applied = shared.update(move |state| {
                state.tasks = tasks;
                state.load_error = None;
                state.loading = false;
                true
            });
            if applied {
                info!(count, "task list loaded");
                shared.emit(DashboardEvent::TasksLoaded { count });
            } else {
                debug!(count, "discarding task list received after teardown");
            }
        }
        Err(err) => {
            let error = request_error(&err, LOAD_FAILED);
            let stored = error.clone();
            let applied = shared.update(move |state| {
                state.load_error = Some(stored);
                state.loading = false;
                true
            });
            if applied {
                warn!(error = %err, "failed to load tasks");
                shared.emit(DashboardEvent::LoadFailed(error));
            } else {
                debug!(error = %err, "discarding load failure received after teardown");
            }
        }
    }
}

/// Waits for the fetch task. If it panicked, the view leaves its loading
/// state with an unexpected error instead of waiting forever.
pub(super) async fn supervise<A: TaskApi>(shared: Arc<Shared<A>>, fetch: JoinHandle<()>) {
    let Err(join_err) = fetch.await else {
        return;
    };
    if join_err.is_cancelled() {
        return;
    }

    let error = DashboardError::Unexpected(join_err.to_string());
    let stored = error.clone();
    let applied = shared.update(move |state| {
        state.load_error = Some(stored);
        state.loading = false;
        true
    });
    if applied {
        error!(error = %join_err, "task list fetch crashed");
        shared.emit(DashboardEvent::LoadFailed(error));
    }
}
