//! List-state helpers for the root controller's optimistic merges, plus
//! the client-side normalization of modal form input. None of these talk
//! to the backend.

use tracing::debug;

use crate::task::{Task, TaskDraft};

/// New rows go to the front: the list is kept newest-first, matching the
/// backend's `created_at.desc` ordering.
pub fn prepend_task(tasks: &mut Vec<Task>, task: Task) {
    debug!(id = task.id, "prepending task to local list");
    tasks.insert(0, task);
}

/// Swaps in the backend's updated row by id. Returns false when the row
/// is no longer present locally (e.g. deleted while the update raced).
pub fn replace_task(tasks: &mut [Task], task: Task) -> bool {
    match tasks.iter_mut().find(|entry| entry.id == task.id) {
        Some(entry) => {
            *entry = task;
            true
        }
        None => {
            debug!(id = task.id, "updated task missing from local list");
            false
        }
    }
}

/// Drops the row by id. Returns whether anything was removed.
pub fn remove_task(tasks: &mut Vec<Task>, id: i64) -> bool {
    let before = tasks.len();
    tasks.retain(|entry| entry.id != id);
    tasks.len() != before
}

/// Turns raw form input into an insert payload. A blank title means there
/// is nothing to submit; an empty description becomes NULL rather than an
/// empty string.
pub fn draft_from_form(title: &str, description: &str) -> Option<TaskDraft> {
    let title = title.trim();
    if title.is_empty() {
        return None;
    }

    Some(TaskDraft {
        title: title.to_string(),
        description: normalize_description(description),
        completed: None,
    })
}

/// Shared by create and edit: whitespace-only descriptions clear the
/// column instead of storing padding.
pub fn normalize_description(description: &str) -> Option<String> {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
