pub const TITLE_REQUIRED: &str = "Title is required.";
pub const LOAD_FAILED: &str = "Failed to load tasks.";
pub const SAVE_FAILED: &str = "Failed to save task.";
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

/// An error held in dashboard view state.
///
/// Cloneable so it can live inside published snapshots.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DashboardError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Request(String),
    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

impl DashboardError {
    pub fn title_required() -> Self {
        Self::Validation(TITLE_REQUIRED.to_string())
    }

    /// The plain message for this error, if it carries one.
    pub fn user_message(&self) -> Option<&str> {
        match self {
            Self::Validation(msg) | Self::Request(msg) if !msg.is_empty() => Some(msg.as_str()),
            _ => None,
        }
    }
}

/// Text shown in an error region.
pub fn format_error(error: Option<&DashboardError>) -> String {
    match error {
        None => String::new(),
        Some(err) => err
            .user_message()
            .map(str::to_string)
            .unwrap_or_else(|| GENERIC_FAILURE.to_string()),
    }
}
