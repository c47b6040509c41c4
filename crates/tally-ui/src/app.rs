use std::rc::Rc;

use tally_core::service::TaskService;
use tally_core::state::{prepend_task, remove_task, replace_task};
use tally_core::task::{Task, TaskDraft, TaskPatch};
use yew::{
    Callback, Html, Reducible, function_component, html, use_effect_with, use_memo, use_reducer,
    use_state,
};

use crate::backend::{Backend, BackendConfig};
use crate::components::{TaskList, TaskModal, Toast, ToastHost, ToastKind};

type Api = TaskService<Backend>;

/// The root-owned task collection. All mutations funnel through the
/// reducer so optimistic merges always apply to the current list, even
/// when several requests are in flight.
#[derive(Default, PartialEq)]
struct TaskStore {
    tasks: Vec<Task>,
}

enum TasksAction {
    Loaded(Vec<Task>),
    Created(Task),
    Updated(Task),
    Removed(i64),
}

impl Reducible for TaskStore {
    type Action = TasksAction;

    fn reduce(self: Rc<Self>, action: TasksAction) -> Rc<Self> {
        let mut tasks = self.tasks.clone();
        match action {
            TasksAction::Loaded(list) => tasks = list,
            TasksAction::Created(task) => prepend_task(&mut tasks, task),
            TasksAction::Updated(task) => {
                replace_task(&mut tasks, task);
            }
            TasksAction::Removed(id) => {
                remove_task(&mut tasks, id);
            }
        }
        Rc::new(Self { tasks })
    }
}

#[derive(Default, PartialEq)]
struct ToastStore {
    seq: u64,
    toasts: Vec<Toast>,
}

enum ToastAction {
    Push(ToastKind, String),
    Dismiss(u64),
}

impl Reducible for ToastStore {
    type Action = ToastAction;

    fn reduce(self: Rc<Self>, action: ToastAction) -> Rc<Self> {
        let mut seq = self.seq;
        let mut toasts = self.toasts.clone();
        match action {
            ToastAction::Push(kind, message) => {
                seq = seq.wrapping_add(1);
                toasts.push(Toast {
                    id: seq,
                    kind,
                    message,
                });
            }
            ToastAction::Dismiss(id) => toasts.retain(|toast| toast.id != id),
        }
        Rc::new(Self { seq, toasts })
    }
}

#[function_component(App)]
pub fn app() -> Html {
    let api = use_memo((), |_| TaskService::new(Backend::new(BackendConfig::from_env())));
    let store = use_reducer(TaskStore::default);
    let toasts = use_reducer(ToastStore::default);
    let loading = use_state(|| true);
    let modal_open = use_state(|| false);
    let editing_task = use_state(|| None::<Task>);
    let modal_busy = use_state(|| false);

    {
        let api: Rc<Api> = api.clone();
        let store = store.dispatcher();
        let toasts = toasts.dispatcher();
        let loading = loading.clone();
        use_effect_with((), move |_| {
            wasm_bindgen_futures::spawn_local(async move {
                match api.get_all_tasks().await {
                    Ok(list) => store.dispatch(TasksAction::Loaded(list)),
                    Err(err) => {
                        tracing::error!(error = %err, "initial task load failed");
                        toasts.dispatch(ToastAction::Push(
                            ToastKind::Error,
                            "Failed to load tasks. Please check your backend configuration."
                                .to_string(),
                        ));
                    }
                }
                loading.set(false);
            });
            || ()
        });
    }

    let on_create = {
        let modal_open = modal_open.clone();
        let editing_task = editing_task.clone();
        Callback::from(move |_| {
            editing_task.set(None);
            modal_open.set(true);
        })
    };

    let on_edit = {
        let modal_open = modal_open.clone();
        let editing_task = editing_task.clone();
        Callback::from(move |task: Task| {
            editing_task.set(Some(task));
            modal_open.set(true);
        })
    };

    let on_modal_close = {
        let modal_open = modal_open.clone();
        let editing_task = editing_task.clone();
        Callback::from(move |_| {
            modal_open.set(false);
            editing_task.set(None);
        })
    };

    let on_save = {
        let api: Rc<Api> = api.clone();
        let store = store.dispatcher();
        let toasts = toasts.dispatcher();
        let modal_open = modal_open.clone();
        let editing_task = editing_task.clone();
        let modal_busy = modal_busy.clone();
        Callback::from(move |draft: TaskDraft| {
            if *modal_busy {
                tracing::debug!("ignored duplicate save while busy");
                return;
            }
            modal_busy.set(true);

            let api = api.clone();
            let store = store.clone();
            let toasts = toasts.clone();
            let modal_open = modal_open.clone();
            let editing = (*editing_task).clone();
            let editing_task = editing_task.clone();
            let modal_busy = modal_busy.clone();

            wasm_bindgen_futures::spawn_local(async move {
                let saved = match editing {
                    Some(task) => {
                        let patch = TaskPatch {
                            title: Some(draft.title),
                            description: Some(draft.description),
                            completed: None,
                        };
                        api.update_task(task.id, patch).await.map(|updated| {
                            store.dispatch(TasksAction::Updated(updated));
                            "Task updated successfully!"
                        })
                    }
                    None => api.create_task(draft).await.map(|created| {
                        store.dispatch(TasksAction::Created(created));
                        "Task created successfully!"
                    }),
                };

                match saved {
                    Ok(message) => {
                        toasts.dispatch(ToastAction::Push(ToastKind::Success, message.to_string()));
                        modal_open.set(false);
                        editing_task.set(None);
                    }
                    Err(err) => {
                        tracing::error!(error = %err, "saving task failed");
                        toasts.dispatch(ToastAction::Push(
                            ToastKind::Error,
                            "Failed to save task. Please try again.".to_string(),
                        ));
                        // Modal stays open so the draft can be corrected
                        // and resubmitted.
                    }
                }
                modal_busy.set(false);
            });
        })
    };

    let on_toggle = {
        let api: Rc<Api> = api.clone();
        let store = store.dispatcher();
        let toasts = toasts.dispatcher();
        Callback::from(move |(id, completed): (i64, bool)| {
            let api = api.clone();
            let store = store.clone();
            let toasts = toasts.clone();

            wasm_bindgen_futures::spawn_local(async move {
                match api.toggle_task_completion(id, completed).await {
                    Ok(updated) => {
                        store.dispatch(TasksAction::Updated(updated));
                        let message = if completed {
                            "Task completed!"
                        } else {
                            "Task marked as pending!"
                        };
                        toasts.dispatch(ToastAction::Push(
                            ToastKind::Success,
                            message.to_string(),
                        ));
                    }
                    Err(err) => {
                        tracing::error!(error = %err, id, "toggling task failed");
                        toasts.dispatch(ToastAction::Push(
                            ToastKind::Error,
                            "Failed to update task status. Please try again.".to_string(),
                        ));
                    }
                }
            });
        })
    };

    let on_delete = {
        let api: Rc<Api> = api.clone();
        let store = store.dispatcher();
        let toasts = toasts.dispatcher();
        Callback::from(move |(id, release): (i64, Callback<()>)| {
            let api = api.clone();
            let store = store.clone();
            let toasts = toasts.clone();

            wasm_bindgen_futures::spawn_local(async move {
                match api.delete_task(id).await {
                    Ok(()) => {
                        store.dispatch(TasksAction::Removed(id));
                        toasts.dispatch(ToastAction::Push(
                            ToastKind::Success,
                            "Task deleted successfully!".to_string(),
                        ));
                    }
                    Err(err) => {
                        tracing::error!(error = %err, id, "deleting task failed");
                        toasts.dispatch(ToastAction::Push(
                            ToastKind::Error,
                            "Failed to delete task. Please try again.".to_string(),
                        ));
                    }
                }
                release.emit(());
            });
        })
    };

    let on_toast_dismiss = {
        let toasts = toasts.dispatcher();
        Callback::from(move |id: u64| toasts.dispatch(ToastAction::Dismiss(id)))
    };

    html! {
        <div class="app">
            <div class="topbar">
                <div class="brand">{ "Tally" }</div>
                <div class="tagline">{ "Tasks backed by a hosted Postgres table" }</div>
            </div>

            <div class="main">
                <TaskList
                    tasks={store.tasks.clone()}
                    loading={*loading}
                    on_toggle={on_toggle}
                    on_edit={on_edit}
                    on_delete={on_delete}
                    on_create={on_create}
                />
            </div>

            <TaskModal
                open={*modal_open}
                task={(*editing_task).clone()}
                submitting={*modal_busy}
                on_save={on_save}
                on_close={on_modal_close}
            />

            <ToastHost toasts={toasts.toasts.clone()} on_dismiss={on_toast_dismiss} />
        </div>
    }
}
