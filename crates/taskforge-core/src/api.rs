use std::future::Future;

use reqwest::header::{
    ACCEPT,
    CONTENT_TYPE,
};
use reqwest::{
    StatusCode,
    Url,
};
use taskforge_shared::{
    TaskCreate,
    TaskDto,
};
use tracing::{
    debug,
    instrument,
    warn,
};

use crate::config::ApiSettings;

const JSON: &str = "application/json";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid API URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("{operation} returned HTTP {status}")]
    Status {
        operation: &'static str,
        status: StatusCode,
    },
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    InvalidJson(#[from] serde_json::Error),
}

/// The two operations the dashboard needs from the task API.
pub trait TaskApi: Send + Sync + 'static {
    fn list_tasks(&self) -> impl Future<Output = Result<Vec<TaskDto>, ApiError>> + Send;

    fn create_task(
        &self,
        payload: TaskCreate,
    ) -> impl Future<Output = Result<TaskDto, ApiError>> + Send;
}

#[derive(Debug, Clone)]
pub struct HttpTaskApi {
    client: reqwest::Client,
    tasks_url: Url,
}

impl HttpTaskApi {
    pub fn new(settings: &ApiSettings) -> Result<Self, ApiError> {
        let raw = format!("{}{}", settings.base_url, settings.path);
        let tasks_url = Url::parse(&raw).map_err(|err| ApiError::InvalidUrl {
            url: raw.clone(),
            reason: err.to_string(),
        })?;
        if !matches!(tasks_url.scheme(), "http" | "https") {
            return Err(ApiError::InvalidUrl {
                url: raw,
                reason: format!("unsupported scheme {}", tasks_url.scheme()),
            });
        }

        let client = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()?;

        debug!(url = %tasks_url, timeout = ?settings.timeout, "task API client ready");
        Ok(Self { client, tasks_url })
    }

    pub fn tasks_url(&self) -> &Url {
        &self.tasks_url
    }
}

impl TaskApi for HttpTaskApi {
    #[instrument(skip(self), fields(url = %self.tasks_url))]
    async fn list_tasks(&self) -> Result<Vec<TaskDto>, ApiError> {
        let response = self
            .client
            .get(self.tasks_url.clone())
            .header(ACCEPT, JSON)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "list tasks rejected");
            return Err(ApiError::Status {
                operation: "list tasks",
                status,
            });
        }

        let body = response.bytes().await?;
        let tasks: Vec<TaskDto> = serde_json::from_slice(&body)?;
        debug!(count = tasks.len(), "tasks received");
        Ok(tasks)
    }

    #[instrument(skip(self, payload), fields(url = %self.tasks_url, title_len = payload.title.len(), completed = payload.completed))]
    async fn create_task(&self, payload: TaskCreate) -> Result<TaskDto, ApiError> {
        let body = serde_json::to_vec(&payload)?;
        let response = self
            .client
            .post(self.tasks_url.clone())
            .header(ACCEPT, JSON)
            .header(CONTENT_TYPE, JSON)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, "create task rejected");
            return Err(ApiError::Status {
                operation: "create task",
                status,
            });
        }

        let body = response.bytes().await?;
        let task: TaskDto = serde_json::from_slice(&body)?;
        debug!(id = task.id, "task created");
        Ok(task)
    }
}
