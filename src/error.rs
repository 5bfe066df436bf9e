use crate::models::TaskKey;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("task name cannot be empty")]
    EmptyName,
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("not signed in")]
    Unauthenticated,
    #[error("request failed: {0}")]
    Transport(String),
    #[error("backend http {status}: {message}")]
    Http { status: u16, message: String },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Rejected(String),
}

#[cfg(feature = "app")]
impl From<reqwest::Error> for BackendError {
    fn from(value: reqwest::Error) -> Self {
        BackendError::Transport(value.to_string())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TodoError {
    #[error("no signed-in user")]
    NotAuthenticated,
    #[error("invalid task: {0}")]
    Validation(#[from] ValidationError),
    #[error("task {0} is not in the current list")]
    NotFound(TaskKey),
    #[error("failed to load tasks: {0}")]
    FetchFailed(#[source] BackendError),
    #[error("failed to write task: {0}")]
    WriteFailed(#[source] BackendError),
}

impl TodoError {
    pub fn user_message(&self) -> &'static str {
        match self {
            TodoError::NotAuthenticated => "You must be logged in to manage tasks",
            TodoError::Validation(ValidationError::EmptyName) => "Task name cannot be empty",
            TodoError::NotFound(_) => "Task no longer exists",
            TodoError::FetchFailed(_) => "Failed to load tasks. Please try again.",
            TodoError::WriteFailed(_) => "Failed to save task. Please try again.",
        }
    }
}
