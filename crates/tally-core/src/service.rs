use async_trait::async_trait;
use chrono::Utc;
use tracing::{error, info};

use crate::error::{self, BackendError};
use crate::postgrest::{self, Request};
use crate::task::{Task, TaskDraft, TaskPatch};

/// Seam between the task service and whatever actually issues the HTTP
/// call. `?Send` because the wasm fetch client's futures stay on the one
/// browser thread.
#[async_trait(?Send)]
pub trait Transport {
    /// Issues the described request and hands back the raw status and
    /// body. Only transport-level failures error here; non-2xx statuses
    /// are the service's to interpret.
    async fn run(&self, request: Request) -> Result<(u16, String), BackendError>;
}

/// Pass-through data-access wrapper over the `tasks` collection. One
/// method per backend operation, no caching, no retries.
#[derive(Debug, Clone)]
pub struct TaskService<T> {
    transport: T,
}

impl<T: Transport> TaskService<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub async fn create_task(&self, draft: TaskDraft) -> Result<Task, BackendError> {
        info!(title_len = draft.title.len(), "creating task");
        let result = async {
            let body = self.execute(postgrest::insert_task(&draft)?).await?;
            postgrest::decode_task(&body)
        }
        .await;

        if let Err(err) = result.as_ref() {
            error!(error = %err, "create task failed");
        }
        result
    }

    pub async fn get_all_tasks(&self) -> Result<Vec<Task>, BackendError> {
        info!("fetching all tasks");
        let result = async {
            let body = self.execute(postgrest::list_tasks()).await?;
            postgrest::decode_tasks(&body)
        }
        .await;

        match result.as_ref() {
            Ok(tasks) => info!(count = tasks.len(), "fetched task list"),
            Err(err) => error!(error = %err, "task list fetch failed"),
        }
        result
    }

    pub async fn get_task(&self, id: i64) -> Result<Task, BackendError> {
        info!(id, "fetching task");
        let result = async {
            let body = self.execute(postgrest::get_task(id)).await?;
            postgrest::decode_task(&body)
        }
        .await
        .map_err(|err| postgrest::narrow_not_found(err, id));

        if let Err(err) = result.as_ref() {
            error!(error = %err, id, "task fetch failed");
        }
        result
    }

    pub async fn update_task(&self, id: i64, patch: TaskPatch) -> Result<Task, BackendError> {
        info!(id, "updating task");
        let result = async {
            let request = postgrest::update_task(id, &patch, Utc::now())?;
            let body = self.execute(request).await?;
            postgrest::decode_task(&body)
        }
        .await
        .map_err(|err| postgrest::narrow_not_found(err, id));

        if let Err(err) = result.as_ref() {
            error!(error = %err, id, "task update failed");
        }
        result
    }

    pub async fn delete_task(&self, id: i64) -> Result<(), BackendError> {
        info!(id, "deleting task");
        let result = self.execute(postgrest::delete_task(id)).await.map(|_| ());

        if let Err(err) = result.as_ref() {
            error!(error = %err, id, "task delete failed");
        }
        result
    }

    pub async fn toggle_task_completion(
        &self,
        id: i64,
        completed: bool,
    ) -> Result<Task, BackendError> {
        info!(id, completed, "toggling task completion");
        self.update_task(id, TaskPatch::completion(completed)).await
    }

    async fn execute(&self, request: Request) -> Result<String, BackendError> {
        let (status, body) = self.transport.run(request).await?;
        if (200..300).contains(&status) {
            Ok(body)
        } else {
            Err(error::error_from_response(status, &body))
        }
    }
}
