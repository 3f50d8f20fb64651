//! Calendar event payloads exchanged with the backend event API.
//!
//! # Invariants
//! - `end_time` is strictly after `start_time` for every event the client
//!   sends; [`EventCreate::validate`] enforces it before a request leaves.
//! - Reminder lead times stay within one week.

use crate::model::timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable backend identifier of an event.
pub type EventId = Uuid;

pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_REMINDER_MINUTES: u32 = 7 * 24 * 60;
pub const MAX_UPCOMING_LIMIT: u32 = 50;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    #[default]
    Personal,
    Work,
    Meeting,
    Task,
    Habit,
    Reminder,
    Other,
}

impl EventType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Personal => "personal",
            Self::Work => "work",
            Self::Meeting => "meeting",
            Self::Task => "task",
            Self::Habit => "habit",
            Self::Reminder => "reminder",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    #[default]
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl EventStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceType {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// Event as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(with = "timestamp::required")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "timestamp::required")]
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub all_day: bool,
    #[serde(default)]
    pub event_type: EventType,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default)]
    pub recurrence_type: RecurrenceType,
    #[serde(default)]
    pub recurrence_interval: Option<u32>,
    #[serde(default, with = "timestamp::optional")]
    pub recurrence_end_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub recurrence_count: Option<u32>,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub habit_id: Option<String>,
    #[serde(default)]
    pub duration_minutes: i64,
    #[serde(default)]
    pub is_recurring: bool,
    /// Present on single-event reads only.
    #[serde(default)]
    pub reminders: Vec<EventReminder>,
    #[serde(default, with = "timestamp::optional")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::optional")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Event {
    /// Builds a scheduled one-off personal event.
    pub fn new(
        id: EventId,
        title: impl Into<String>,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description: None,
            location: None,
            start_time,
            end_time,
            all_day: false,
            event_type: EventType::Personal,
            status: EventStatus::Scheduled,
            recurrence_type: RecurrenceType::None,
            recurrence_interval: None,
            recurrence_end_date: None,
            recurrence_count: None,
            task_id: None,
            habit_id: None,
            duration_minutes: (end_time - start_time).num_minutes(),
            is_recurring: false,
            reminders: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }
}

/// Request body for `POST /events/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventCreate {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(serialize_with = "timestamp::required::serialize")]
    pub start_time: DateTime<Utc>,
    #[serde(serialize_with = "timestamp::required::serialize")]
    pub end_time: DateTime<Utc>,
    pub all_day: bool,
    pub event_type: EventType,
    pub status: EventStatus,
    pub recurrence_type: RecurrenceType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence_interval: Option<u32>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "timestamp::optional::serialize"
    )]
    pub recurrence_end_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub habit_id: Option<String>,
}

impl EventCreate {
    pub fn new(title: impl Into<String>, start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            description: None,
            location: None,
            start_time,
            end_time,
            all_day: false,
            event_type: EventType::Personal,
            status: EventStatus::Scheduled,
            recurrence_type: RecurrenceType::None,
            recurrence_interval: None,
            recurrence_end_date: None,
            recurrence_count: None,
            task_id: None,
            habit_id: None,
        }
    }

    /// Checks the constraints the backend would reject with a 422.
    pub fn validate(&self) -> Result<(), String> {
        validate_title(&self.title)?;
        validate_window(self.start_time, self.end_time)?;
        if let Some(until) = self.recurrence_end_date {
            if until <= self.start_time {
                return Err("Recurrence end date must be after start time.".to_string());
            }
        }
        Ok(())
    }
}

/// Request body for `PUT /events/{id}`; absent fields stay unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EventUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "timestamp::optional::serialize"
    )]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "timestamp::optional::serialize"
    )]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_day: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_type: Option<EventType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EventStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence_type: Option<RecurrenceType>,
}

impl EventUpdate {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let (Some(start), Some(end)) = (self.start_time, self.end_time) {
            validate_window(start, end)?;
        }
        Ok(())
    }
}

fn validate_title(title: &str) -> Result<(), String> {
    let title = title.trim();
    if title.is_empty() {
        return Err("Event title is required.".to_string());
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(format!("Event title must be at most {MAX_TITLE_CHARS} characters."));
    }
    Ok(())
}

fn validate_window(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), String> {
    if end <= start {
        return Err("End time must be after start time.".to_string());
    }
    Ok(())
}

/// List filter for `GET /events/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct EventFilter {
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub event_type: Option<EventType>,
    pub status: Option<EventStatus>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl EventFilter {
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(start) = &self.start_date {
            params.push(("start_date", timestamp::format_timestamp(start)));
        }
        if let Some(end) = &self.end_date {
            params.push(("end_date", timestamp::format_timestamp(end)));
        }
        if let Some(event_type) = self.event_type {
            params.push(("event_type", event_type.as_str().to_string()));
        }
        if let Some(status) = self.status {
            params.push(("status", status.as_str().to_string()));
        }
        if let Some(search) = self.search.as_deref().map(str::trim) {
            if !search.is_empty() {
                params.push(("search", search.to_string()));
            }
        }
        if let Some(page) = self.page {
            params.push(("page", page.to_string()));
        }
        if let Some(per_page) = self.per_page {
            params.push(("per_page", per_page.to_string()));
        }
        params
    }
}

/// Page of events from `GET /events/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventList {
    pub events: Vec<Event>,
    pub total: u32,
    pub page: u32,
    pub per_page: u32,
    #[serde(default)]
    pub has_next: bool,
    #[serde(default)]
    pub has_prev: bool,
}

/// Calendar month view from `GET /events/month/{year}/{month}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthEvents {
    pub year: i32,
    pub month: u32,
    pub events: Vec<Event>,
    pub total_events: u32,
}

/// Year and month accepted by the month view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
}

impl CalendarMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, String> {
        if !(1900..=3000).contains(&year) {
            return Err(format!("Year must be between 1900 and 3000, got {year}."));
        }
        if !(1..=12).contains(&month) {
            return Err(format!("Month must be between 1 and 12, got {month}."));
        }
        Ok(Self { year, month })
    }
}

fn default_reminder_method() -> String {
    "notification".to_string()
}

/// Request body for `POST /events/{id}/reminders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventReminderCreate {
    pub minutes_before: u32,
    pub method: String,
}

impl EventReminderCreate {
    pub fn notification(minutes_before: u32) -> Self {
        Self {
            minutes_before,
            method: default_reminder_method(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.minutes_before > MAX_REMINDER_MINUTES {
            return Err(format!(
                "Reminders can be set at most {MAX_REMINDER_MINUTES} minutes before an event."
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventReminder {
    pub id: String,
    pub event_id: EventId,
    pub minutes_before: u32,
    #[serde(default = "default_reminder_method")]
    pub method: String,
    #[serde(default)]
    pub sent: bool,
    #[serde(default, with = "timestamp::optional")]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::optional")]
    pub created_at: Option<DateTime<Utc>>,
}
