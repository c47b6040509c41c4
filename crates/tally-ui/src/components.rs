use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use gloo::timers::future::TimeoutFuture;
use tally_core::state::draft_from_form;
use tally_core::task::{Task, TaskDraft};
use yew::{
    Callback, Html, Properties, TargetCast, classes, function_component, html, use_effect_with,
    use_state,
};

const TOAST_DISMISS_MS: u32 = 4_000;

#[derive(Properties, PartialEq)]
pub struct TaskListProps {
    pub tasks: Vec<Task>,
    pub loading: bool,
    pub on_toggle: Callback<(i64, bool)>,
    pub on_edit: Callback<Task>,
    pub on_delete: Callback<(i64, Callback<()>)>,
    pub on_create: Callback<()>,
}

#[function_component(TaskList)]
pub fn task_list(props: &TaskListProps) -> Html {
    // Ids with a delete in flight; rows in this set have their actions
    // disabled until the root reports back through the release callback.
    let deleting = use_state(BTreeSet::<i64>::new);

    if props.loading {
        return html! {
            <div class="panel list">
                <div class="header">{ "Tasks" }</div>
                <div class="placeholder">{ "Loading tasks..." }</div>
            </div>
        };
    }

    let on_create = props.on_create.clone();

    html! {
        <div class="panel list">
            <div class="header">
                <span>{ "Tasks" }</span>
                <button class="btn" onclick={move |_| on_create.emit(())}>{ "Add Task" }</button>
            </div>
            {
                if props.tasks.is_empty() {
                    html! {
                        <div class="placeholder">
                            <p>{ "No tasks found" }</p>
                            <p class="muted">{ "Create your first task to get started!" }</p>
                        </div>
                    }
                } else {
                    html! {
                        <>
                            {
                                for props.tasks.iter().cloned().map(|task| {
                                    let id = task.id;
                                    let busy = deleting.contains(&id);

                                    let on_toggle = {
                                        let on_toggle = props.on_toggle.clone();
                                        let next = !task.completed;
                                        Callback::from(move |e: yew::MouseEvent| {
                                            e.stop_propagation();
                                            on_toggle.emit((id, next));
                                        })
                                    };

                                    let on_edit = {
                                        let on_edit = props.on_edit.clone();
                                        let task = task.clone();
                                        Callback::from(move |_| on_edit.emit(task.clone()))
                                    };

                                    let on_delete = {
                                        let on_delete = props.on_delete.clone();
                                        let deleting = deleting.clone();
                                        let release = {
                                            let deleting = deleting.clone();
                                            Callback::from(move |_| {
                                                let mut next = (*deleting).clone();
                                                next.remove(&id);
                                                deleting.set(next);
                                            })
                                        };
                                        Callback::from(move |_| {
                                            let mut next = (*deleting).clone();
                                            next.insert(id);
                                            deleting.set(next);
                                            on_delete.emit((id, release.clone()));
                                        })
                                    };

                                    let description = task
                                        .description
                                        .clone()
                                        .unwrap_or_else(|| "No description".to_string());
                                    let described = task.description.is_some();

                                    html! {
                                        <div class="row" key={id}>
                                            <button
                                                class={if task.completed { "selector on" } else { "selector" }}
                                                onclick={on_toggle}
                                                disabled={busy}
                                            >
                                                { if task.completed { "✓" } else { "" } }
                                            </button>
                                            <div class="row-body">
                                                <div class={classes!("title", task.completed.then_some("done"))}>
                                                    { &task.title }
                                                </div>
                                                <div class={classes!("desc", (!described).then_some("muted"))}>
                                                    { description }
                                                </div>
                                            </div>
                                            <span class={if task.completed { "badge done" } else { "badge" }}>
                                                { if task.completed { "Completed" } else { "Pending" } }
                                            </span>
                                            <span class="created muted">{ format_created(&task.created_at) }</span>
                                            <div class="actions">
                                                <button class="btn" onclick={on_edit} disabled={busy}>{ "Edit" }</button>
                                                <button class="btn danger" onclick={on_delete} disabled={busy}>
                                                    { if busy { "Deleting..." } else { "Delete" } }
                                                </button>
                                            </div>
                                        </div>
                                    }
                                })
                            }
                        </>
                    }
                }
            }
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct TaskModalProps {
    pub open: bool,
    pub task: Option<Task>,
    pub submitting: bool,
    pub on_save: Callback<TaskDraft>,
    pub on_close: Callback<()>,
}

#[function_component(TaskModal)]
pub fn task_modal(props: &TaskModalProps) -> Html {
    let title = use_state(String::new);
    let description = use_state(String::new);

    // Reseed the drafts whenever the modal opens or targets a different
    // task; a closed modal keeps nothing.
    {
        let title = title.clone();
        let description = description.clone();
        use_effect_with((props.open, props.task.clone()), move |(open, task)| {
            if *open {
                match task {
                    Some(task) => {
                        title.set(task.title.clone());
                        description.set(task.description.clone().unwrap_or_default());
                    }
                    None => {
                        title.set(String::new());
                        description.set(String::new());
                    }
                }
            }
            || ()
        });
    }

    if !props.open {
        return html! {};
    }

    let heading = if props.task.is_some() {
        "Edit Task"
    } else {
        "Create New Task"
    };
    let save_label = if props.submitting {
        "Saving..."
    } else if props.task.is_some() {
        "Update Task"
    } else {
        "Create Task"
    };
    let save_disabled = props.submitting || title.trim().is_empty();

    let on_title_input = {
        let title = title.clone();
        Callback::from(move |e: web_sys::InputEvent| {
            let input: web_sys::HtmlInputElement = e.target_unchecked_into();
            title.set(input.value());
        })
    };

    let on_description_input = {
        let description = description.clone();
        Callback::from(move |e: web_sys::InputEvent| {
            let input: web_sys::HtmlTextAreaElement = e.target_unchecked_into();
            description.set(input.value());
        })
    };

    let on_save_click = {
        let title = title.clone();
        let description = description.clone();
        let on_save = props.on_save.clone();
        Callback::from(move |_| {
            let Some(draft) = draft_from_form(&title, &description) else {
                tracing::warn!("ignored save with blank title");
                return;
            };
            on_save.emit(draft);
        })
    };

    let on_cancel = {
        let on_close = props.on_close.clone();
        Callback::from(move |_| on_close.emit(()))
    };

    html! {
        <div class="modal-backdrop">
            <div class="modal">
                <div class="header">{ heading }</div>
                <div class="content">
                    <div class="field">
                        <label>{ "Title" }</label>
                        <input
                            value={(*title).clone()}
                            placeholder="Enter task title..."
                            oninput={on_title_input}
                        />
                    </div>
                    <div class="field">
                        <label>{ "Description" }</label>
                        <textarea
                            value={(*description).clone()}
                            placeholder="Enter task description..."
                            rows="4"
                            oninput={on_description_input}
                        />
                    </div>
                    <div class="footer">
                        <button
                            type="button"
                            class="btn"
                            onclick={on_cancel}
                            disabled={props.submitting}
                        >
                            { "Cancel" }
                        </button>
                        <button
                            type="button"
                            class="btn primary"
                            onclick={on_save_click}
                            disabled={save_disabled}
                        >
                            { save_label }
                        </button>
                    </div>
                </div>
            </div>
        </div>
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

impl ToastKind {
    fn as_class(self) -> &'static str {
        match self {
            Self::Success => "toast ok",
            Self::Error => "toast danger",
        }
    }
}

#[derive(Clone, PartialEq)]
pub struct Toast {
    pub id: u64,
    pub kind: ToastKind,
    pub message: String,
}

#[derive(Properties, PartialEq)]
pub struct ToastHostProps {
    pub toasts: Vec<Toast>,
    pub on_dismiss: Callback<u64>,
}

#[function_component(ToastHost)]
pub fn toast_host(props: &ToastHostProps) -> Html {
    html! {
        <div class="toast-stack">
            {
                for props.toasts.iter().cloned().map(|toast| {
                    let id = toast.id;
                    html! {
                        <ToastItem key={id} toast={toast} on_dismiss={props.on_dismiss.clone()} />
                    }
                })
            }
        </div>
    }
}

#[derive(Properties, PartialEq)]
struct ToastItemProps {
    toast: Toast,
    on_dismiss: Callback<u64>,
}

#[function_component(ToastItem)]
fn toast_item(props: &ToastItemProps) -> Html {
    // Each toast dismisses itself after a beat; dismissing an id that is
    // already gone is a no-op in the store.
    {
        let on_dismiss = props.on_dismiss.clone();
        use_effect_with(props.toast.id, move |id| {
            let id = *id;
            wasm_bindgen_futures::spawn_local(async move {
                TimeoutFuture::new(TOAST_DISMISS_MS).await;
                on_dismiss.emit(id);
            });
            || ()
        });
    }

    let on_click = {
        let on_dismiss = props.on_dismiss.clone();
        let id = props.toast.id;
        Callback::from(move |_| on_dismiss.emit(id))
    };

    html! {
        <div class={props.toast.kind.as_class()}>
            <span>{ &props.toast.message }</span>
            <button class="toast-dismiss" onclick={on_click}>{ "x" }</button>
        </div>
    }
}

fn format_created(at: &DateTime<Utc>) -> String {
    at.format("%b %-d, %Y %H:%M").to_string()
}
