//! Turns raw text gathered from prompts or flags into typed task values.
//!
//! Everything lenient about user input lives here: unknown enum words fall
//! back to defaults when creating and are dropped when editing, unparsable
//! hours become 0 or are dropped the same way.

use tracing::debug;

use crate::error::InputError;
use crate::task::{Priority, Status};

pub const AFFIRMATIVE: &str = "yes";

/// Raw field text for a new task.
#[derive(Debug, Clone, Default)]
pub struct TaskForm {
    pub title: String,
    pub description: String,
    pub priority: String,
    pub status: String,
    pub category: String,
    pub due_date: String,
    pub estimated_hours: String,
}

/// Normalized values for a new task; id, creation date and actual hours are
/// assigned by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub status: Status,
    pub category: String,
    pub due_date: String,
    pub estimated_hours: u32,
}

impl TryFrom<TaskForm> for NewTask {
    type Error = InputError;

    fn try_from(form: TaskForm) -> Result<Self, Self::Error> {
        let title = form.title.trim();
        if title.is_empty() {
            return Err(InputError::EmptyTitle);
        }
        Ok(NewTask {
            title: title.to_owned(),
            description: form.description.trim().to_owned(),
            priority: or_default(form.priority.parse()),
            status: or_default(form.status.parse()),
            category: form.category.trim().to_owned(),
            due_date: form.due_date.trim().to_owned(),
            estimated_hours: parse_hours(&form.estimated_hours).unwrap_or(0),
        })
    }
}

/// Raw field text for an edit. Empty text keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct EditForm {
    pub title: String,
    pub description: String,
    pub priority: String,
    pub status: String,
    pub category: String,
    pub due_date: String,
    pub estimated_hours: String,
    pub actual_hours: String,
}

/// Fields to overwrite on an existing task; `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub status: Option<Status>,
    pub category: Option<String>,
    pub due_date: Option<String>,
    pub estimated_hours: Option<u32>,
    pub actual_hours: Option<u32>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        *self == TaskPatch::default()
    }
}

impl From<EditForm> for TaskPatch {
    fn from(form: EditForm) -> Self {
        TaskPatch {
            title: non_empty(&form.title),
            description: non_empty(&form.description),
            priority: non_empty(&form.priority).and_then(|p| ignore_invalid(p.parse())),
            status: non_empty(&form.status).and_then(|s| ignore_invalid(s.parse())),
            category: non_empty(&form.category),
            due_date: non_empty(&form.due_date),
            estimated_hours: non_empty(&form.estimated_hours).and_then(|h| parse_hours(&h)),
            actual_hours: non_empty(&form.actual_hours).and_then(|h| parse_hours(&h)),
        }
    }
}

pub fn parse_task_id(raw: &str) -> Result<u32, InputError> {
    raw.trim()
        .parse()
        .map_err(|_| InputError::InvalidId(raw.trim().to_owned()))
}

/// Only an explicit `yes` (any case) confirms a deletion.
pub fn is_affirmative(answer: &str) -> bool {
    answer.trim().eq_ignore_ascii_case(AFFIRMATIVE)
}

fn parse_hours(raw: &str) -> Option<u32> {
    raw.trim().parse().ok()
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

fn or_default<T: Default>(parsed: Result<T, InputError>) -> T {
    parsed.unwrap_or_else(|err| {
        debug!(%err, "falling back to default");
        T::default()
    })
}

fn ignore_invalid<T>(parsed: Result<T, InputError>) -> Option<T> {
    parsed
        .map_err(|err| debug!(%err, "ignoring edit value"))
        .ok()
}
