//! Notification record produced by the reminder engine.
//!
//! # Responsibility
//! - Define the notification shape shared by the engine, lifecycle store and
//!   delivery channels.
//!
//! # Invariants
//! - `id` is derived from category + source entity id, so regenerating the
//!   same condition yields the same id.
//! - `dismissed` only ever moves from `false` to `true`.

use crate::model::habit::HabitId;
use crate::model::task::TaskId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Notification category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    DueSoon,
    Overdue,
    HabitReminder,
    Achievement,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::DueSoon => "due_soon",
            Self::Overdue => "overdue",
            Self::HabitReminder => "habit_reminder",
            Self::Achievement => "achievement",
        }
    }
}

/// Delivery urgency of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPriority {
    Low,
    Medium,
    High,
}

/// One generated notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub priority: NotificationPriority,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub habit_id: Option<HabitId>,
    #[serde(default)]
    pub dismissed: bool,
}

impl Notification {
    pub fn new(
        id: impl Into<String>,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        priority: NotificationPriority,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            title: title.into(),
            message: message.into(),
            priority,
            created_at,
            task_id: None,
            habit_id: None,
            dismissed: false,
        }
    }

    pub fn with_task(mut self, task_id: TaskId) -> Self {
        self.task_id = Some(task_id);
        self
    }

    pub fn with_habit(mut self, habit_id: HabitId) -> Self {
        self.habit_id = Some(habit_id);
        self
    }

    pub fn dismiss(&mut self) {
        self.dismissed = true;
    }

    /// Returns whether this notification still belongs to the active view.
    pub fn is_live(&self) -> bool {
        !self.dismissed
    }
}
