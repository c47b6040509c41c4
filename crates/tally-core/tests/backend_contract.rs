//! Drives the real `TaskService` against an in-memory stand-in for the
//! hosted `tasks` table. The stand-in executes the described requests the
//! way the query API does: monotonic ids on insert, equality filters,
//! descending order, 406 for zero-row single-object reads.

use std::cell::{Cell, RefCell};

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use tally_core::error::BackendError;
use tally_core::postgrest::{Method, Request};
use tally_core::service::{TaskService, Transport};
use tally_core::task::{Task, TaskDraft};

struct TableTransport {
    rows: RefCell<Vec<Task>>,
    next_id: Cell<i64>,
    clock: Cell<DateTime<Utc>>,
}

impl TableTransport {
    fn new() -> Self {
        Self {
            rows: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
            clock: Cell::new(Utc::now()),
        }
    }

    /// Each write lands one millisecond after the previous one, so every
    /// stored timestamp is distinct and strictly increasing.
    fn tick(&self) -> DateTime<Utc> {
        let next = self.clock.get() + Duration::milliseconds(1);
        self.clock.set(next);
        next
    }

    fn id_filter(request: &Request) -> Option<i64> {
        request
            .query
            .iter()
            .find(|(key, _)| *key == "id")
            .and_then(|(_, value)| value.strip_prefix("eq."))
            .and_then(|raw| raw.parse().ok())
    }

    fn row_json(task: &Task) -> String {
        serde_json::to_string(task).expect("row should encode")
    }

    fn no_rows() -> (u16, String) {
        (
            406,
            r#"{"message":"JSON object requested, multiple (or no) rows returned","code":"PGRST116"}"#
                .to_string(),
        )
    }

    fn select(&self, request: &Request) -> (u16, String) {
        if request.accept_single {
            let id = Self::id_filter(request).expect("single read needs an id filter");
            match self.rows.borrow().iter().find(|row| row.id == id) {
                Some(row) => (200, Self::row_json(row)),
                None => Self::no_rows(),
            }
        } else {
            let mut rows = self.rows.borrow().clone();
            assert!(
                request
                    .query
                    .contains(&("order", "created_at.desc".to_string())),
                "list reads must ask the backend for newest-first ordering"
            );
            rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            (200, serde_json::to_string(&rows).expect("rows should encode"))
        }
    }

    fn insert(&self, request: &Request) -> (u16, String) {
        let body = request.body.as_deref().expect("insert carries a body");
        let draft: TaskDraft = serde_json::from_str(body).expect("insert body is a draft");

        let now = self.tick();
        let task = Task {
            id: self.next_id.replace(self.next_id.get() + 1),
            title: draft.title,
            description: draft.description,
            completed: draft.completed.unwrap_or(false),
            created_at: now,
            updated_at: now,
        };
        self.rows.borrow_mut().push(task.clone());
        (201, Self::row_json(&task))
    }

    fn patch(&self, request: &Request) -> (u16, String) {
        let id = Self::id_filter(request).expect("update needs an id filter");
        let body = request.body.as_deref().expect("update carries a body");
        let columns: Value = serde_json::from_str(body).expect("update body is json");
        assert!(
            columns.get("updated_at").is_some(),
            "every update must refresh updated_at"
        );

        let mut rows = self.rows.borrow_mut();
        let Some(row) = rows.iter_mut().find(|row| row.id == id) else {
            return Self::no_rows();
        };

        if let Some(title) = columns.get("title").and_then(Value::as_str) {
            row.title = title.to_string();
        }
        if let Some(description) = columns.get("description") {
            row.description = description.as_str().map(str::to_string);
        }
        if let Some(completed) = columns.get("completed").and_then(Value::as_bool) {
            row.completed = completed;
        }
        row.updated_at = self.tick();

        (200, Self::row_json(row))
    }

    fn delete(&self, request: &Request) -> (u16, String) {
        let id = Self::id_filter(request).expect("delete needs an id filter");
        self.rows.borrow_mut().retain(|row| row.id != id);
        (204, String::new())
    }
}

#[async_trait(?Send)]
impl Transport for TableTransport {
    async fn run(&self, request: Request) -> Result<(u16, String), BackendError> {
        let response = match request.method {
            Method::Get => self.select(&request),
            Method::Post => self.insert(&request),
            Method::Patch => self.patch(&request),
            Method::Delete => self.delete(&request),
        };
        Ok(response)
    }
}

/// Always answers with the given status and body; for exercising the
/// error path without a table.
struct StaticTransport {
    status: u16,
    body: String,
}

#[async_trait(?Send)]
impl Transport for StaticTransport {
    async fn run(&self, _request: Request) -> Result<(u16, String), BackendError> {
        Ok((self.status, self.body.clone()))
    }
}

fn service() -> TaskService<TableTransport> {
    TaskService::new(TableTransport::new())
}

fn draft(title: &str) -> TaskDraft {
    TaskDraft {
        title: title.to_string(),
        description: None,
        completed: None,
    }
}

#[tokio::test]
async fn create_assigns_fresh_ids_and_defaults() {
    let service = service();

    let first = service.create_task(draft("one")).await.expect("create one");
    let second = service.create_task(draft("two")).await.expect("create two");

    assert!(!first.completed);
    assert!(!second.completed);
    assert_ne!(first.id, second.id);
    assert!(second.id > first.id);
    assert_eq!(first.created_at, first.updated_at);
}

#[tokio::test]
async fn list_returns_newest_first() {
    let service = service();
    for title in ["first", "second", "third"] {
        service.create_task(draft(title)).await.expect("create");
    }

    let tasks = service.get_all_tasks().await.expect("list");
    let titles: Vec<&str> = tasks.iter().map(|task| task.title.as_str()).collect();
    assert_eq!(titles, vec!["third", "second", "first"]);
    assert!(tasks.windows(2).all(|pair| pair[0].created_at > pair[1].created_at));
}

#[tokio::test]
async fn empty_table_lists_as_empty() {
    let service = service();
    assert!(service.get_all_tasks().await.expect("list").is_empty());
}

#[tokio::test]
async fn toggling_twice_round_trips_and_refreshes_updated_at() {
    let service = service();
    let created = service.create_task(draft("flip me")).await.expect("create");

    let once = service
        .toggle_task_completion(created.id, true)
        .await
        .expect("first toggle");
    assert!(once.completed);
    assert!(once.updated_at > created.updated_at);

    let twice = service
        .toggle_task_completion(created.id, false)
        .await
        .expect("second toggle");
    assert_eq!(twice.completed, created.completed);
    assert!(twice.updated_at > once.updated_at);
}

#[tokio::test]
async fn missing_ids_map_to_not_found() {
    let service = service();

    let err = service.get_task(99).await.expect_err("nothing to fetch");
    assert_eq!(err, BackendError::NotFound(99));

    let err = service
        .toggle_task_completion(99, true)
        .await
        .expect_err("nothing to update");
    assert_eq!(err, BackendError::NotFound(99));
}

#[tokio::test]
async fn delete_succeeds_even_when_the_row_is_gone() {
    let service = service();
    let created = service.create_task(draft("short-lived")).await.expect("create");

    service.delete_task(created.id).await.expect("first delete");
    service.delete_task(created.id).await.expect("repeat delete");
    assert!(service.get_all_tasks().await.expect("list").is_empty());
}

#[tokio::test]
async fn buy_milk_lifecycle() {
    let service = service();

    let created = service.create_task(draft("Buy milk")).await.expect("create");
    let tasks = service.get_all_tasks().await.expect("list");
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "Buy milk");
    assert!(!tasks[0].completed);

    service
        .toggle_task_completion(created.id, true)
        .await
        .expect("toggle");
    let fetched = service.get_task(created.id).await.expect("fetch");
    assert!(fetched.completed);
    assert!(fetched.updated_at > created.updated_at);

    service.delete_task(created.id).await.expect("delete");
    assert!(service.get_all_tasks().await.expect("list").is_empty());
}

#[tokio::test]
async fn backend_rejections_surface_the_service_message() {
    let service = TaskService::new(StaticTransport {
        status: 503,
        body: r#"{"message":"service unavailable"}"#.to_string(),
    });

    let err = service.get_all_tasks().await.expect_err("should fail");
    assert_eq!(
        err,
        BackendError::Service {
            status: 503,
            message: "service unavailable".to_string(),
        }
    );
}
