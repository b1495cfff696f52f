use taskforge_shared::TaskDto;

use crate::error::DashboardError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub title: String,
    pub completed: bool,
}

/// Snapshot of everything a dashboard view displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardState {
    /// Most recently created first; fetched tasks keep API order.
    pub tasks: Vec<TaskDto>,
    pub form: FormState,
    pub loading: bool,
    pub saving: bool,
    pub load_error: Option<DashboardError>,
    pub form_error: Option<DashboardError>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            form: FormState::default(),
            loading: true,
            saving: false,
            load_error: None,
            form_error: None,
        }
    }
}

impl DashboardState {
    pub fn stats(&self) -> TaskStats {
        TaskStats::from_tasks(&self.tasks)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskStats {
    pub total: usize,
    pub done: usize,
}

impl TaskStats {
    pub fn from_tasks(tasks: &[TaskDto]) -> Self {
        Self {
            total: tasks.len(),
            done: tasks.iter().filter(|task| task.completed).count(),
        }
    }
}

/// A discrete change published to dashboard observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashboardEvent {
    TasksLoaded { count: usize },
    LoadFailed(DashboardError),
    FormChanged,
    SubmitRejected(DashboardError),
    SaveStarted,
    TaskCreated(TaskDto),
    SaveFailed(DashboardError),
    TornDown,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: u64, completed: bool) -> TaskDto {
        TaskDto {
            id,
            title: format!("task {id}"),
            completed,
        }
    }

    #[test]
    fn stats_count_total_and_done() {
        let tasks = vec![task(1, true), task(2, false), task(3, true), task(4, false)];
        let stats = TaskStats::from_tasks(&tasks);
        assert_eq!(stats, TaskStats { total: 4, done: 2 });
    }

    #[test]
    fn empty_list_has_zero_stats() {
        assert_eq!(TaskStats::from_tasks(&[]), TaskStats::default());
    }

    #[test]
    fn fresh_state_is_loading_with_empty_form() {
        let state = DashboardState::default();
        assert!(state.loading);
        assert!(!state.saving);
        assert_eq!(state.form, FormState::default());
        assert_eq!(state.stats().total, 0);
    }
}
