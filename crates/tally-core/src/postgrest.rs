//! Request mapping for the hosted PostgREST query API. Builders here only
//! describe the round trip; executing it is the transport's job, which
//! keeps the whole wire mapping testable off the network.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::debug;

use crate::error::BackendError;
use crate::task::{Task, TaskDraft, TaskPatch};

/// Collection endpoint for the single `tasks` table.
pub const TASKS_PATH: &str = "/rest/v1/tasks";

/// Asks the backend to echo the affected row back on insert/update.
const PREFER_REPRESENTATION: &str = "return=representation";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

/// One described round trip: everything a transport needs to issue the
/// call. `accept_single` selects the single-object response shape
/// (`Accept: application/vnd.pgrst.object+json`).
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub method: Method,
    pub path: &'static str,
    pub query: Vec<(&'static str, String)>,
    pub prefer: Option<&'static str>,
    pub accept_single: bool,
    pub body: Option<String>,
}

/// All rows, newest first. Ordering is the backend's, not ours.
pub fn list_tasks() -> Request {
    Request {
        method: Method::Get,
        path: TASKS_PATH,
        query: vec![
            ("select", "*".to_string()),
            ("order", "created_at.desc".to_string()),
        ],
        prefer: None,
        accept_single: false,
        body: None,
    }
}

pub fn get_task(id: i64) -> Request {
    Request {
        method: Method::Get,
        path: TASKS_PATH,
        query: vec![("select", "*".to_string()), ("id", format!("eq.{id}"))],
        prefer: None,
        accept_single: true,
        body: None,
    }
}

pub fn insert_task(draft: &TaskDraft) -> Result<Request, BackendError> {
    let body = serde_json::to_string(draft).map_err(|err| BackendError::Encode(err.to_string()))?;
    debug!(title_len = draft.title.len(), "built insert request");

    Ok(Request {
        method: Method::Post,
        path: TASKS_PATH,
        query: vec![("select", "*".to_string())],
        prefer: Some(PREFER_REPRESENTATION),
        accept_single: true,
        body: Some(body),
    })
}

/// Partial update of one row. The caller supplies `now` so the refreshed
/// `updated_at` always rides along with the patch.
pub fn update_task(
    id: i64,
    patch: &TaskPatch,
    now: DateTime<Utc>,
) -> Result<Request, BackendError> {
    let mut body =
        serde_json::to_value(patch).map_err(|err| BackendError::Encode(err.to_string()))?;
    match body.as_object_mut() {
        Some(columns) => {
            columns.insert("updated_at".to_string(), Value::String(now.to_rfc3339()));
        }
        None => {
            return Err(BackendError::Encode(
                "task patch did not encode to an object".to_string(),
            ));
        }
    }
    let body =
        serde_json::to_string(&body).map_err(|err| BackendError::Encode(err.to_string()))?;
    debug!(id, "built update request");

    Ok(Request {
        method: Method::Patch,
        path: TASKS_PATH,
        query: vec![("select", "*".to_string()), ("id", format!("eq.{id}"))],
        prefer: Some(PREFER_REPRESENTATION),
        accept_single: true,
        body: Some(body),
    })
}

/// Row removal is filtered by id only; the backend treats a missing id as
/// a successful no-op.
pub fn delete_task(id: i64) -> Request {
    Request {
        method: Method::Delete,
        path: TASKS_PATH,
        query: vec![("id", format!("eq.{id}"))],
        prefer: None,
        accept_single: false,
        body: None,
    }
}

pub fn decode_task(body: &str) -> Result<Task, BackendError> {
    serde_json::from_str(body).map_err(|err| BackendError::Decode(err.to_string()))
}

pub fn decode_tasks(body: &str) -> Result<Vec<Task>, BackendError> {
    serde_json::from_str(body).map_err(|err| BackendError::Decode(err.to_string()))
}

/// Single-object reads signal "zero rows" as 406 (and some deployments as
/// 404); both become the NotFound flavor for the requested id.
pub fn narrow_not_found(err: BackendError, id: i64) -> BackendError {
    match err {
        BackendError::Service { status, .. } if status == 404 || status == 406 => {
            BackendError::NotFound(id)
        }
        other => other,
    }
}
