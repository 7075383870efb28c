//! Add/edit dialog form: field buffers, cycling pickers and validation.

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use crate::domain::task::{CreateTask, Priority, Status, Task, UpdateTask};

pub const MIN_DESCRIPTION_LEN: usize = 2;
pub const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("Description must be at least 2 characters.")]
    DescriptionTooShort,
    #[error("Due date must look like 2024-12-31.")]
    BadDueDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Field {
    #[default]
    Description,
    Status,
    Priority,
    DueDate,
}

impl Field {
    pub fn next(self) -> Self {
        match self {
            Field::Description => Field::Status,
            Field::Status => Field::Priority,
            Field::Priority => Field::DueDate,
            Field::DueDate => Field::Description,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskForm {
    pub description: String,
    pub status: Status,
    pub priority: Priority,
    pub due_date: String,
    pub field: Field,
    pub error: Option<FormError>,
}

impl TaskForm {
    /// Pre-filled from an existing row for the edit dialog.
    pub fn from_task(task: &Task) -> Self {
        Self {
            description: task.description.clone(),
            status: task.status,
            priority: task.priority,
            due_date: task.due_date.map(|d| d.format(DUE_DATE_FORMAT).to_string()).unwrap_or_default(),
            field: Field::Description,
            error: None,
        }
    }

    pub fn push(&mut self, c: char) {
        match self.field {
            Field::Description => self.description.push(c),
            Field::DueDate => self.due_date.push(c),
            Field::Status | Field::Priority => {}
        }
    }

    pub fn pop(&mut self) {
        match self.field {
            Field::Description => { self.description.pop(); }
            Field::DueDate => { self.due_date.pop(); }
            Field::Status | Field::Priority => {}
        }
    }

    /// Steps the focused picker forwards (`+1`) or backwards (`-1`).
    pub fn cycle(&mut self, step: isize) {
        match self.field {
            Field::Status => self.status = cycle(&Status::ALL, self.status, step),
            Field::Priority => self.priority = cycle(&Priority::ALL, self.priority, step),
            Field::Description | Field::DueDate => {}
        }
    }

    fn validated(&self) -> Result<(String, Option<DateTime<Utc>>), FormError> {
        let description = self.description.trim();
        if description.chars().count() < MIN_DESCRIPTION_LEN { return Err(FormError::DescriptionTooShort); }
        let due = self.due_date.trim();
        let due_date = if due.is_empty() {
            None
        } else {
            let day = NaiveDate::parse_from_str(due, DUE_DATE_FORMAT).map_err(|_| FormError::BadDueDate)?;
            Some(day.and_hms_opt(0, 0, 0).ok_or(FormError::BadDueDate)?.and_utc())
        };
        Ok((description.to_string(), due_date))
    }

    pub fn to_create(&self) -> Result<CreateTask, FormError> {
        let (description, due_date) = self.validated()?;
        Ok(CreateTask { description, status: self.status, priority: self.priority, due_date })
    }

    /// Edits always send every field; an empty due date clears it.
    pub fn to_update(&self) -> Result<UpdateTask, FormError> {
        let (description, due_date) = self.validated()?;
        Ok(UpdateTask {
            description: Some(description),
            status: Some(self.status),
            priority: Some(self.priority),
            due_date: Some(due_date),
        })
    }
}

fn cycle<T: Copy + PartialEq>(all: &[T], current: T, step: isize) -> T {
    let len = all.len() as isize;
    let at = all.iter().position(|v| *v == current).unwrap_or(0) as isize;
    all[(at + step).rem_euclid(len) as usize]
}
