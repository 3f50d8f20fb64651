//! Task payloads exchanged with the backend task API.
//!
//! # Responsibility
//! - Mirror the backend task schema (response, create, update, filter).
//! - Answer whether a task still needs attention.
//!
//! # Invariants
//! - `id` is the backend's stable UUID and never changes for a task.
//! - Completed and cancelled tasks are not actionable.

use crate::model::timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable backend identifier of a task.
pub type TaskId = Uuid;

/// Task lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Completed,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Task priority as set by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl TaskPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

fn default_priority() -> TaskPriority {
    TaskPriority::Medium
}

/// Task as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub status: TaskStatus,
    #[serde(default = "default_priority")]
    pub priority: TaskPriority,
    #[serde(default, with = "timestamp::optional")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::optional")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::optional")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::optional")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Builds a minimal `todo` task, mostly for local construction and tests.
    pub fn new(id: TaskId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: None,
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            due_date: None,
            created_at: None,
            updated_at: None,
            completed_at: None,
        }
    }

    /// Returns whether reminders may still be raised for this task.
    pub fn is_actionable(&self) -> bool {
        !matches!(self.status, TaskStatus::Completed | TaskStatus::Cancelled)
    }
}

/// Request body for `POST /tasks/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskCreate {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "timestamp::optional::serialize"
    )]
    pub due_date: Option<DateTime<Utc>>,
}

impl TaskCreate {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            status: TaskStatus::Todo,
            priority: TaskPriority::Medium,
            due_date: None,
        }
    }
}

/// Request body for `PUT /tasks/{id}`; absent fields stay unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<TaskPriority>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "timestamp::optional::serialize"
    )]
    pub due_date: Option<DateTime<Utc>>,
}

/// Counters from `GET /tasks/stats/summary`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStats {
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub completed: u32,
    #[serde(default)]
    pub pending: u32,
    #[serde(default)]
    pub overdue: u32,
}

/// List filter for `GET /tasks/`.
///
/// Used both as the request query string and as the cache key parameter set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub search: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl TaskFilter {
    /// Returns the active filter parameters as sorted key/value pairs.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(status) = self.status {
            params.push(("status", status.as_str().to_string()));
        }
        if let Some(priority) = self.priority {
            params.push(("priority", priority.as_str().to_string()));
        }
        if let Some(search) = self.search.as_deref().map(str::trim) {
            if !search.is_empty() {
                params.push(("search", search.to_string()));
            }
        }
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(offset) = self.offset {
            params.push(("offset", offset.to_string()));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::{Task, TaskFilter, TaskPriority, TaskStatus};
    use chrono::{TimeZone, Utc};

    #[test]
    fn deserializes_backend_task_payload() {
        let json = r#"{
            "id": "123e4567-e89b-12d3-a456-426614174000",
            "title": "Buy groceries",
            "description": "Get milk, bread, eggs",
            "status": "in_progress",
            "priority": "high",
            "due_date": "2024-01-15T10:00:00",
            "created_at": "2024-01-10T09:00:00",
            "updated_at": "2024-01-10T09:00:00",
            "completed_at": null
        }"#;

        let task: Task = serde_json::from_str(json).expect("task payload should parse");
        assert_eq!(task.status, TaskStatus::InProgress);
        assert_eq!(task.priority, TaskPriority::High);
        assert_eq!(
            task.due_date,
            Some(Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap())
        );
        assert!(task.completed_at.is_none());
        assert!(task.is_actionable());
    }

    #[test]
    fn completed_and_cancelled_tasks_are_not_actionable() {
        let mut task = Task::new(uuid::Uuid::new_v4(), "done");
        task.status = TaskStatus::Completed;
        assert!(!task.is_actionable());
        task.status = TaskStatus::Cancelled;
        assert!(!task.is_actionable());
    }

    #[test]
    fn filter_params_skip_blank_search() {
        let filter = TaskFilter {
            status: Some(TaskStatus::Todo),
            search: Some("   ".to_string()),
            limit: Some(10),
            ..TaskFilter::default()
        };
        assert_eq!(
            filter.to_params(),
            vec![("status", "todo".to_string()), ("limit", "10".to_string())]
        );
    }
}
