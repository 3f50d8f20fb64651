//! Backend REST API contracts and HTTP implementation.
//!
//! # Responsibility
//! - Define the backend calls the client needs (`DashboardApi`).
//! - Hold the bearer-token session shared by every call (`AuthSession`).
//!
//! # Invariants
//! - A 401 response clears the token and flags the session as requiring
//!   login; callers never keep using a rejected token.

mod error;
mod http;

pub use error::{ApiError, ApiResult};
pub use http::{ApiConfig, HttpDashboardApi, DEFAULT_API_BASE_URL, DEFAULT_REQUEST_TIMEOUT};

use crate::model::chat::{
    AnalyticsReport, ChatHistory, ChatMessage, ChatMessageCreate, DateRange, HealthStatus,
};
use crate::model::event::{
    CalendarMonth, Event, EventCreate, EventFilter, EventId, EventList, EventReminder,
    EventReminderCreate, EventUpdate, MonthEvents,
};
use crate::model::habit::{
    Habit, HabitCreate, HabitFilter, HabitId, HabitLog, HabitLogCreate, HabitStats, HabitUpdate,
};
use crate::model::task::{Task, TaskCreate, TaskFilter, TaskId, TaskStats, TaskUpdate};
use log::warn;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Backend calls used by the client.
pub trait DashboardApi: Send + Sync {
    fn list_tasks(&self, filter: &TaskFilter) -> ApiResult<Vec<Task>>;
    fn get_task(&self, id: TaskId) -> ApiResult<Task>;
    fn create_task(&self, request: &TaskCreate) -> ApiResult<Task>;
    fn update_task(&self, id: TaskId, request: &TaskUpdate) -> ApiResult<Task>;
    fn delete_task(&self, id: TaskId) -> ApiResult<()>;
    fn task_stats(&self) -> ApiResult<TaskStats>;

    fn list_habits(&self, filter: &HabitFilter) -> ApiResult<Vec<Habit>>;
    fn get_habit(&self, id: HabitId) -> ApiResult<Habit>;
    fn create_habit(&self, request: &HabitCreate) -> ApiResult<Habit>;
    fn update_habit(&self, id: HabitId, request: &HabitUpdate) -> ApiResult<Habit>;
    fn delete_habit(&self, id: HabitId) -> ApiResult<()>;
    fn log_habit_completion(&self, request: &HabitLogCreate) -> ApiResult<HabitLog>;
    fn habit_logs(&self, id: HabitId, range: &DateRange, limit: u32) -> ApiResult<Vec<HabitLog>>;
    fn habit_stats(&self, id: HabitId) -> ApiResult<HabitStats>;

    fn list_events(&self, filter: &EventFilter) -> ApiResult<EventList>;
    fn get_event(&self, id: EventId) -> ApiResult<Event>;
    fn create_event(&self, request: &EventCreate) -> ApiResult<Event>;
    fn update_event(&self, id: EventId, request: &EventUpdate) -> ApiResult<Event>;
    fn delete_event(&self, id: EventId) -> ApiResult<()>;
    fn month_events(&self, month: CalendarMonth) -> ApiResult<MonthEvents>;
    fn upcoming_events(&self, limit: u32) -> ApiResult<Vec<Event>>;
    fn add_event_reminder(&self, id: EventId, request: &EventReminderCreate) -> ApiResult<EventReminder>;
    fn event_reminders(&self, id: EventId) -> ApiResult<Vec<EventReminder>>;

    fn send_chat_message(&self, request: &ChatMessageCreate) -> ApiResult<ChatMessage>;
    fn chat_history(&self, limit: u32) -> ApiResult<ChatHistory>;
    fn clear_chat_history(&self) -> ApiResult<()>;

    fn analytics(&self, report: AnalyticsReport, range: &DateRange) -> ApiResult<serde_json::Value>;
    fn health(&self) -> ApiResult<HealthStatus>;
}

impl<T: DashboardApi + ?Sized> DashboardApi for Arc<T> {
    fn list_tasks(&self, filter: &TaskFilter) -> ApiResult<Vec<Task>> {
        (**self).list_tasks(filter)
    }
    fn get_task(&self, id: TaskId) -> ApiResult<Task> {
        (**self).get_task(id)
    }
    fn create_task(&self, request: &TaskCreate) -> ApiResult<Task> {
        (**self).create_task(request)
    }
    fn update_task(&self, id: TaskId, request: &TaskUpdate) -> ApiResult<Task> {
        (**self).update_task(id, request)
    }
    fn delete_task(&self, id: TaskId) -> ApiResult<()> {
        (**self).delete_task(id)
    }
    fn task_stats(&self) -> ApiResult<TaskStats> {
        (**self).task_stats()
    }
    fn list_habits(&self, filter: &HabitFilter) -> ApiResult<Vec<Habit>> {
        (**self).list_habits(filter)
    }
    fn get_habit(&self, id: HabitId) -> ApiResult<Habit> {
        (**self).get_habit(id)
    }
    fn create_habit(&self, request: &HabitCreate) -> ApiResult<Habit> {
        (**self).create_habit(request)
    }
    fn update_habit(&self, id: HabitId, request: &HabitUpdate) -> ApiResult<Habit> {
        (**self).update_habit(id, request)
    }
    fn delete_habit(&self, id: HabitId) -> ApiResult<()> {
        (**self).delete_habit(id)
    }
    fn log_habit_completion(&self, request: &HabitLogCreate) -> ApiResult<HabitLog> {
        (**self).log_habit_completion(request)
    }
    fn habit_logs(&self, id: HabitId, range: &DateRange, limit: u32) -> ApiResult<Vec<HabitLog>> {
        (**self).habit_logs(id, range, limit)
    }
    fn habit_stats(&self, id: HabitId) -> ApiResult<HabitStats> {
        (**self).habit_stats(id)
    }
    fn list_events(&self, filter: &EventFilter) -> ApiResult<EventList> {
        (**self).list_events(filter)
    }
    fn get_event(&self, id: EventId) -> ApiResult<Event> {
        (**self).get_event(id)
    }
    fn create_event(&self, request: &EventCreate) -> ApiResult<Event> {
        (**self).create_event(request)
    }
    fn update_event(&self, id: EventId, request: &EventUpdate) -> ApiResult<Event> {
        (**self).update_event(id, request)
    }
    fn delete_event(&self, id: EventId) -> ApiResult<()> {
        (**self).delete_event(id)
    }
    fn month_events(&self, month: CalendarMonth) -> ApiResult<MonthEvents> {
        (**self).month_events(month)
    }
    fn upcoming_events(&self, limit: u32) -> ApiResult<Vec<Event>> {
        (**self).upcoming_events(limit)
    }
    fn add_event_reminder(&self, id: EventId, request: &EventReminderCreate) -> ApiResult<EventReminder> {
        (**self).add_event_reminder(id, request)
    }
    fn event_reminders(&self, id: EventId) -> ApiResult<Vec<EventReminder>> {
        (**self).event_reminders(id)
    }
    fn send_chat_message(&self, request: &ChatMessageCreate) -> ApiResult<ChatMessage> {
        (**self).send_chat_message(request)
    }
    fn chat_history(&self, limit: u32) -> ApiResult<ChatHistory> {
        (**self).chat_history(limit)
    }
    fn clear_chat_history(&self) -> ApiResult<()> {
        (**self).clear_chat_history()
    }
    fn analytics(&self, report: AnalyticsReport, range: &DateRange) -> ApiResult<serde_json::Value> {
        (**self).analytics(report, range)
    }
    fn health(&self) -> ApiResult<HealthStatus> {
        (**self).health()
    }
}

/// Bearer-token state shared by API calls.
#[derive(Debug, Default)]
pub struct AuthSession {
    token: Mutex<Option<String>>,
    login_required: AtomicBool,
}

impl AuthSession {
    pub fn new(token: Option<String>) -> Self {
        let token = token
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        Self {
            token: Mutex::new(token),
            login_required: AtomicBool::new(false),
        }
    }

    pub fn token(&self) -> Option<String> {
        match self.token.lock() {
            Ok(token) => token.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Installs a fresh token (after the user signed in again).
    pub fn set_token(&self, token: impl Into<String>) {
        let token = token.into();
        match self.token.lock() {
            Ok(mut slot) => *slot = Some(token),
            Err(poisoned) => *poisoned.into_inner() = Some(token),
        }
        self.login_required.store(false, Ordering::SeqCst);
    }

    /// Clears the token and flags the session; called on 401.
    pub fn expire(&self) {
        match self.token.lock() {
            Ok(mut slot) => *slot = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
        self.login_required.store(true, Ordering::SeqCst);
        warn!("event=auth_expired module=api status=login_required");
    }

    pub fn login_required(&self) -> bool {
        self.login_required.load(Ordering::SeqCst)
    }
}
