use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use super::error::ParseEnumError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TaskId(pub Uuid);

impl Default for TaskId {
    fn default() -> Self { Self(Uuid::new_v4()) }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { fmt::Display::fmt(&self.0, f) }
}

impl FromStr for TaskId {
    type Err = uuid::Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> { Uuid::parse_str(s).map(Self) }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Status {
    #[default]
    Todo,
    Progress,
    Done,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Todo, Status::Progress, Status::Done];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Todo => "Todo",
            Status::Progress => "Progress",
            Status::Done => "Done",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.pad(self.as_str()) }
}

impl FromStr for Status {
    type Err = ParseEnumError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| ParseEnumError::Status(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Priority {
    Minor,
    #[default]
    Low,
    Moderate,
    Important,
    Critical,
}

impl Priority {
    pub const ALL: [Priority; 5] = [
        Priority::Minor,
        Priority::Low,
        Priority::Moderate,
        Priority::Important,
        Priority::Critical,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Minor => "Minor",
            Priority::Low => "Low",
            Priority::Moderate => "Moderate",
            Priority::Important => "Important",
            Priority::Critical => "Critical",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.pad(self.as_str()) }
}

impl FromStr for Priority {
    type Err = ParseEnumError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Priority::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| ParseEnumError::Priority(s.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub description: String,
    pub status: Status,
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateTask {
    pub description: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

/// Partial update. `due_date` distinguishes "leave as is" (`None`) from
/// "clear" (`Some(None)`, sent as `"dueDate": null`).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTask {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<DateTime<Utc>>>,
}

impl UpdateTask {
    pub fn status(status: Status) -> Self {
        Self { status: Some(status), ..Self::default() }
    }

    /// In-process counterpart of the store's column-wise update.
    #[cfg(test)]
    pub(crate) fn apply(self, task: &mut Task) {
        if let Some(d) = self.description { task.description = d; }
        if let Some(s) = self.status { task.status = s; }
        if let Some(p) = self.priority { task.priority = p; }
        if let Some(due) = self.due_date { task.due_date = due; }
    }
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_parse_their_display_names() {
        for s in Status::ALL { assert_eq!(s.as_str().parse::<Status>().unwrap(), s); }
        for p in Priority::ALL { assert_eq!(p.as_str().parse::<Priority>().unwrap(), p); }
        assert!("done".parse::<Status>().is_err());
        assert!("Urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn create_defaults_status_and_priority() {
        let input: CreateTask = serde_json::from_str(r#"{"description":"write docs"}"#).unwrap();
        assert_eq!(input.status, Status::Todo);
        assert_eq!(input.priority, Priority::Low);
        assert_eq!(input.due_date, None);
    }

    #[test]
    fn update_tells_null_due_date_from_missing() {
        let missing: UpdateTask = serde_json::from_str(r#"{"status":"Done"}"#).unwrap();
        assert_eq!(missing.due_date, None);
        let cleared: UpdateTask = serde_json::from_str(r#"{"dueDate":null}"#).unwrap();
        assert_eq!(cleared.due_date, Some(None));
    }

    #[test]
    fn task_serializes_camel_case() {
        let task = Task {
            id: TaskId::default(),
            description: "x".into(),
            status: Status::Progress,
            priority: Priority::Critical,
            due_date: None,
            created_at: Utc::now(),
        };
        let v = serde_json::to_value(&task).unwrap();
        assert_eq!(v["status"], "Progress");
        assert_eq!(v["priority"], "Critical");
        assert!(v["dueDate"].is_null());
        assert!(v.get("createdAt").is_some());
        assert_eq!(v["id"], task.id.0.to_string());
    }
}
