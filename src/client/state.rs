//! View state of the terminal client.
//!
//! All UI state lives in [`ViewState`]; which dialog or picker is active is a
//! single [`Mode`] value. Key presses and request outcomes both go through
//! `ViewState` and come back as [`Command`]s for the runtime to execute, so the
//! whole flow is testable without a terminal or a server.

use std::collections::BTreeSet;
use std::num::NonZeroU32;
use std::time::{Duration, Instant};

use crossterm::event::KeyCode;

use super::form::TaskForm;
use crate::domain::query::{ListQuery, PageRequest, TaskFilter, TaskPage};
use crate::domain::task::{CreateTask, Priority, Status, Task, TaskId, UpdateTask};

pub const TOAST_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialog {
    pub form: TaskForm,
    pub submitting: bool,
}

impl Dialog {
    fn new(form: TaskForm) -> Self { Self { form, submitting: false } }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Browse,
    Search,
    PriorityFilter { cursor: usize },
    StatusFilter { cursor: usize },
    Adding(Dialog),
    Editing { id: TaskId, dialog: Dialog },
    ConfirmDelete { task: Task, submitting: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind { Edit, Toggle }

/// Work for the runtime. Every command produces exactly one [`Outcome`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Fetch { generation: u64, query: ListQuery },
    Create(CreateTask),
    Update { id: TaskId, input: UpdateTask, kind: UpdateKind },
    Delete(TaskId),
}

/// Request results; errors are already rendered to text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Fetched { generation: u64, result: Result<TaskPage, String> },
    Created(Result<Task, String>),
    Updated { kind: UpdateKind, result: Result<Task, String> },
    Deleted(Result<(), String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind { Success, Error }

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub title: &'static str,
    pub message: String,
    pub shown_at: Instant,
}

#[derive(Debug, Clone)]
pub struct ViewState {
    pub mode: Mode,
    pub data: TaskPage,
    pub search: String,
    pub priority_filter: BTreeSet<Priority>,
    pub status_filter: BTreeSet<Status>,
    pub selected: usize,
    pub page_size: NonZeroU32,
    pub toast: Option<Toast>,
    pub loading: bool,
    pub quit: bool,
    generation: u64,
}

impl ViewState {
    pub fn new(page_size: NonZeroU32) -> Self {
        Self {
            mode: Mode::Browse,
            data: TaskPage::empty(),
            search: String::new(),
            priority_filter: BTreeSet::new(),
            status_filter: BTreeSet::new(),
            selected: 0,
            page_size,
            toast: None,
            loading: false,
            quit: false,
            generation: 0,
        }
    }

    pub fn is_filtering(&self) -> bool {
        !self.search.is_empty() || !self.priority_filter.is_empty() || !self.status_filter.is_empty()
    }

    pub fn selected_task(&self) -> Option<&Task> { self.data.tasks.get(self.selected) }

    /// Issues a list request for `page`, superseding any request in flight.
    pub fn fetch(&mut self, page: u32) -> Command {
        self.generation += 1;
        self.loading = true;
        let filter = TaskFilter::builder()
            .search(self.search.clone())
            .priorities(self.priority_filter.iter().copied())
            .statuses(self.status_filter.iter().copied())
            .build();
        let page = PageRequest::at(NonZeroU32::new(page).unwrap_or(NonZeroU32::MIN), self.page_size);
        Command::Fetch { generation: self.generation, query: ListQuery { page, filter } }
    }

    fn fetch_current(&mut self) -> Command {
        let page = self.data.current_page;
        self.fetch(page)
    }

    pub fn expire_toast(&mut self, now: Instant) {
        if self.toast.as_ref().is_some_and(|t| now.duration_since(t.shown_at) >= TOAST_TTL) {
            self.toast = None;
        }
    }

    fn notify(&mut self, kind: ToastKind, title: &'static str, message: impl Into<String>) {
        self.toast = Some(Toast { kind, title, message: message.into(), shown_at: Instant::now() });
    }

    pub fn apply(&mut self, outcome: Outcome) -> Vec<Command> {
        match outcome {
            Outcome::Fetched { generation, result } => {
                if generation != self.generation {
                    tracing::debug!(generation, latest = self.generation, "dropping stale page");
                    return Vec::new();
                }
                match result {
                    // the page emptied under us (e.g. its last row was deleted)
                    Ok(page) if page.tasks.is_empty() && u64::from(page.current_page) > page.total_pages && page.total_pages > 0 => {
                        let last = u32::try_from(page.total_pages).unwrap_or(u32::MAX);
                        return vec![self.fetch(last)];
                    }
                    Ok(page) => {
                        self.data = page;
                        self.selected = self.selected.min(self.data.tasks.len().saturating_sub(1));
                    }
                    Err(e) => self.notify(ToastKind::Error, "Failed to fetch tasks", e),
                }
                self.loading = false;
                Vec::new()
            }
            Outcome::Created(Ok(_)) => {
                self.notify(ToastKind::Success, "Success", "Task added successfully");
                self.mode = Mode::Browse;
                vec![self.fetch(1)]
            }
            Outcome::Created(Err(e)) => {
                self.reopen_dialog();
                self.notify(ToastKind::Error, "Failed to add task", e);
                Vec::new()
            }
            Outcome::Updated { kind: UpdateKind::Edit, result: Ok(_) } => {
                self.notify(ToastKind::Success, "Success", "Task updated successfully");
                self.mode = Mode::Browse;
                vec![self.fetch(1)]
            }
            Outcome::Updated { kind: UpdateKind::Edit, result: Err(e) } => {
                self.reopen_dialog();
                self.notify(ToastKind::Error, "Failed to update task", e);
                Vec::new()
            }
            Outcome::Updated { kind: UpdateKind::Toggle, result: Ok(_) } => {
                self.notify(ToastKind::Success, "Success", "Task status updated successfully");
                vec![self.fetch_current()]
            }
            Outcome::Updated { kind: UpdateKind::Toggle, result: Err(e) } => {
                self.notify(ToastKind::Error, "Failed to update task status", e);
                Vec::new()
            }
            Outcome::Deleted(result) => {
                self.mode = Mode::Browse;
                match result {
                    Ok(()) => {
                        self.notify(ToastKind::Success, "Success", "Task deleted successfully");
                        vec![self.fetch_current()]
                    }
                    Err(e) => {
                        self.notify(ToastKind::Error, "Failed to delete task", e);
                        Vec::new()
                    }
                }
            }
        }
    }

    fn reopen_dialog(&mut self) {
        match &mut self.mode {
            Mode::Adding(dialog) | Mode::Editing { dialog, .. } => dialog.submitting = false,
            _ => {}
        }
    }

    pub fn on_key(&mut self, code: KeyCode) -> Vec<Command> {
        match &self.mode {
            Mode::Browse => self.on_browse_key(code),
            Mode::Search => self.on_search_key(code),
            Mode::PriorityFilter { .. } | Mode::StatusFilter { .. } => self.on_filter_key(code),
            Mode::Adding(_) | Mode::Editing { .. } => self.on_dialog_key(code),
            Mode::ConfirmDelete { .. } => self.on_confirm_key(code),
        }
    }

    fn on_browse_key(&mut self, code: KeyCode) -> Vec<Command> {
        let current = self.data.current_page;
        match code {
            KeyCode::Char('q') | KeyCode::Esc => { self.quit = true; Vec::new() }
            KeyCode::Up | KeyCode::Char('k') => { self.selected = self.selected.saturating_sub(1); Vec::new() }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < self.data.tasks.len() { self.selected += 1; }
                Vec::new()
            }
            KeyCode::Left | KeyCode::Char('h') if current > 1 => vec![self.fetch(current - 1)],
            KeyCode::Right | KeyCode::Char('l') if u64::from(current) < self.data.total_pages => vec![self.fetch(current + 1)],
            KeyCode::Char(c @ '1'..='9') => {
                let page = c.to_digit(10).unwrap_or(1);
                if u64::from(page) <= self.data.total_pages { vec![self.fetch(page)] } else { Vec::new() }
            }
            KeyCode::Char('/') => { self.mode = Mode::Search; Vec::new() }
            KeyCode::Char('p') => { self.mode = Mode::PriorityFilter { cursor: 0 }; Vec::new() }
            KeyCode::Char('s') => { self.mode = Mode::StatusFilter { cursor: 0 }; Vec::new() }
            KeyCode::Char('r') if self.is_filtering() => {
                self.search.clear();
                self.priority_filter.clear();
                self.status_filter.clear();
                vec![self.fetch(1)]
            }
            KeyCode::Char('a') | KeyCode::Char('n') => {
                self.mode = Mode::Adding(Dialog::new(TaskForm::default()));
                vec![self.fetch(1)]
            }
            KeyCode::Char('e') | KeyCode::Enter => match self.selected_task() {
                Some(task) => {
                    let (id, form) = (task.id, TaskForm::from_task(task));
                    self.mode = Mode::Editing { id, dialog: Dialog::new(form) };
                    vec![self.fetch(1)]
                }
                None => Vec::new(),
            },
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(task) = self.selected_task().cloned() {
                    self.mode = Mode::ConfirmDelete { task, submitting: false };
                }
                Vec::new()
            }
            KeyCode::Char(' ') | KeyCode::Char('x') => match self.selected_task() {
                // the checkbox is "checked" when the task is done
                Some(task) => {
                    let status = if task.status == Status::Done { Status::Todo } else { Status::Done };
                    vec![Command::Update { id: task.id, input: UpdateTask::status(status), kind: UpdateKind::Toggle }]
                }
                None => Vec::new(),
            },
            _ => Vec::new(),
        }
    }

    fn on_search_key(&mut self, code: KeyCode) -> Vec<Command> {
        match code {
            KeyCode::Enter | KeyCode::Esc => { self.mode = Mode::Browse; Vec::new() }
            KeyCode::Backspace => {
                if self.search.pop().is_some() { vec![self.fetch(1)] } else { Vec::new() }
            }
            KeyCode::Char(c) => {
                self.search.push(c);
                vec![self.fetch(1)]
            }
            _ => Vec::new(),
        }
    }

    fn on_filter_key(&mut self, code: KeyCode) -> Vec<Command> {
        let (cursor, len) = match self.mode {
            Mode::PriorityFilter { cursor } => (cursor, Priority::ALL.len()),
            Mode::StatusFilter { cursor } => (cursor, Status::ALL.len()),
            _ => return Vec::new(),
        };
        let moved = match code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Enter => { self.mode = Mode::Browse; return Vec::new() }
            KeyCode::Up | KeyCode::Char('k') => cursor.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => (cursor + 1).min(len - 1),
            KeyCode::Char(' ') | KeyCode::Char('x') => {
                match self.mode {
                    Mode::PriorityFilter { .. } => toggle(&mut self.priority_filter, Priority::ALL[cursor]),
                    _ => toggle(&mut self.status_filter, Status::ALL[cursor]),
                }
                return vec![self.fetch(1)];
            }
            _ => return Vec::new(),
        };
        match &mut self.mode {
            Mode::PriorityFilter { cursor } | Mode::StatusFilter { cursor } => *cursor = moved,
            _ => {}
        }
        Vec::new()
    }

    fn on_dialog_key(&mut self, code: KeyCode) -> Vec<Command> {
        let (edit_id, dialog) = match &mut self.mode {
            Mode::Adding(dialog) => (None, dialog),
            Mode::Editing { id, dialog } => (Some(*id), dialog),
            _ => return Vec::new(),
        };
        if dialog.submitting { return Vec::new(); }
        let form = &mut dialog.form;
        match code {
            KeyCode::Esc => {
                self.mode = Mode::Browse;
                return vec![self.fetch(1)];
            }
            KeyCode::Tab | KeyCode::Down => form.field = form.field.next(),
            KeyCode::Left => form.cycle(-1),
            KeyCode::Right => form.cycle(1),
            KeyCode::Backspace => form.pop(),
            KeyCode::Char(c) => form.push(c),
            KeyCode::Enter => {
                let command = match edit_id {
                    None => form.to_create().map(Command::Create),
                    Some(id) => form.to_update().map(|input| Command::Update { id, input, kind: UpdateKind::Edit }),
                };
                match command {
                    Ok(command) => {
                        form.error = None;
                        dialog.submitting = true;
                        return vec![command];
                    }
                    Err(e) => form.error = Some(e),
                }
            }
            _ => {}
        }
        Vec::new()
    }

    fn on_confirm_key(&mut self, code: KeyCode) -> Vec<Command> {
        let Mode::ConfirmDelete { task, submitting } = &mut self.mode else { return Vec::new() };
        if *submitting { return Vec::new(); }
        match code {
            KeyCode::Char('y') | KeyCode::Enter => {
                *submitting = true;
                vec![Command::Delete(task.id)]
            }
            KeyCode::Char('n') | KeyCode::Esc => { self.mode = Mode::Browse; Vec::new() }
            _ => Vec::new(),
        }
    }
}

fn toggle<T: Ord>(set: &mut BTreeSet<T>, value: T) {
    if !set.remove(&value) { set.insert(value); }
}
