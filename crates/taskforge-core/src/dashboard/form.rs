use taskforge_shared::{
    TaskCreate,
    TaskDto,
};
use tracing::{
    debug,
    info,
    instrument,
    warn,
};

use super::{
    Dashboard,
    DashboardEvent,
    FormState,
    request_error,
};
use crate::api::TaskApi;
use crate::error::{
    DashboardError,
    SAVE_FAILED,
};

/// Result of one press of the submit action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The API created the task and it now heads the list.
    Created(TaskDto),
    /// Title was blank; nothing was sent.
    Invalid(DashboardError),
    /// The request failed; the form keeps what the user typed.
    Failed(DashboardError),
    /// A submission is already in flight.
    Busy,
    /// The view was torn down; nothing was changed.
    Discarded,
}

enum Gate {
    TornDown,
    Busy,
    Invalid,
    Ready(TaskCreate),
}

impl<A: TaskApi> Dashboard<A> {
    pub fn set_title(&self, title: impl Into<String>) {
        let title = title.into();
        let changed = self.shared.update(|state| {
            if state.form.title == title {
                return false;
            }
            state.form.title = title;
            true
        });
        if changed {
            self.shared.emit(DashboardEvent::FormChanged);
        }
    }

    pub fn set_completed(&self, completed: bool) {
        let changed = self.shared.update(|state| {
            if state.form.completed == completed {
                return false;
            }
            state.form.completed = completed;
            true
        });
        if changed {
            self.shared.emit(DashboardEvent::FormChanged);
        }
    }

    /// Validates the form and, if the title is present, sends it to the API.
    #[instrument(skip(self))]
    pub async fn submit(&self) -> SubmitOutcome {
        let mut gate = Gate::TornDown;
        self.shared.update(|state| {
            if state.saving {
                gate = Gate::Busy;
                return false;
            }
            let title = state.form.title.trim();
            if title.is_empty() {
                gate = Gate::Invalid;
                state.form_error = Some(DashboardError::title_required());
                return true;
            }
            gate = Gate::Ready(TaskCreate::new(title, state.form.completed));
            state.saving = true;
            true
        });

        let payload = match gate {
            Gate::TornDown => {
                debug!("submit ignored after teardown");
                return SubmitOutcome::Discarded;
            }
            Gate::Busy => {
                debug!("submit ignored while saving");
                return SubmitOutcome::Busy;
            }
            Gate::Invalid => {
                let error = DashboardError::title_required();
                info!("rejected submission with blank title");
                self.shared
                    .emit(DashboardEvent::SubmitRejected(error.clone()));
                return SubmitOutcome::Invalid(error);
            }
            Gate::Ready(payload) => payload,
        };
        self.shared.emit(DashboardEvent::SaveStarted);

        match self.shared.api.create_task(payload).await {
            Ok(task) => {
                let created = task.clone();
                let applied = self.shared.update(move |state| {
                    state.tasks.insert(0, created);
                    state.form = FormState::default();
                    state.form_error = None;
                    state.saving = false;
                    true
                });
                if !applied {
                    debug!(id = task.id, "discarding created task received after teardown");
                    return SubmitOutcome::Discarded;
                }
                info!(id = task.id, "task created");
                self.shared.emit(DashboardEvent::TaskCreated(task.clone()));
                SubmitOutcome::Created(task)
            }
            Err(err) => {
                let error = request_error(&err, SAVE_FAILED);
                let stored = error.clone();
                let applied = self.shared.update(move |state| {
                    state.form_error = Some(stored);
                    state.saving = false;
                    true
                });
                if !applied {
                    debug!(error = %err, "discarding save failure received after teardown");
                    return SubmitOutcome::Discarded;
                }
                warn!(error = %err, "failed to save task");
                self.shared.emit(DashboardEvent::SaveFailed(error.clone()));
                SubmitOutcome::Failed(error)
            }
        }
    }
}
