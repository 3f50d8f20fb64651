//! Cached backend reads and cache-coherent mutations.
//!
//! # Responsibility
//! - Route reads through [`QueryClient`] with per-resource policies.
//! - Invalidate affected key families after successful mutations.
//! - Surface mutation failures as error toasts.
//!
//! # Invariants
//! - Task mutations invalidate `tasks` and `analytics`.
//! - Habit mutations (including completion logs) invalidate `habits` and
//!   `analytics`.
//! - Chat mutations invalidate `chat`.
//! - Calendar event mutations (including reminders) invalidate `events`.
//! - Single-entity updates write the returned entity into its detail slot
//!   after invalidation, so the next detail read needs no round trip.
//! - Read failures are not toasted; callers decide how to show them.

use crate::api::{ApiError, ApiResult, DashboardApi};
use crate::delivery::toast::{Toast, ToastSink};
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
use crate::model::task::{Task, TaskCreate, TaskFilter, TaskId, TaskStats, TaskStatus, TaskUpdate};
use crate::query::{CacheStats, QueryClient, QueryKey, QueryPolicy};
use log::warn;
use std::sync::Arc;

pub const TASKS: &str = "tasks";
pub const HABITS: &str = "habits";
pub const CHAT: &str = "chat";
pub const ANALYTICS: &str = "analytics";
pub const EVENTS: &str = "events";

/// Cache key builders, shared with callers that inspect the cache.
pub mod keys {
    use super::{ANALYTICS, CHAT, EVENTS, HABITS, TASKS};
    use crate::model::chat::{AnalyticsReport, DateRange};
    use crate::model::event::{CalendarMonth, EventFilter, EventId};
    use crate::model::habit::{HabitFilter, HabitId};
    use crate::model::task::{TaskFilter, TaskId};
    use crate::query::QueryKey;

    pub fn family(resource: &str) -> QueryKey {
        QueryKey::new(resource)
    }

    pub fn task_list(filter: &TaskFilter) -> QueryKey {
        QueryKey::new(TASKS).segment("list").params(filter.to_params())
    }

    pub fn task(id: TaskId) -> QueryKey {
        QueryKey::new(TASKS).segment("detail").segment(id.to_string())
    }

    pub fn task_stats() -> QueryKey {
        QueryKey::new(TASKS).segment("stats")
    }

    pub fn habit_list(filter: &HabitFilter) -> QueryKey {
        QueryKey::new(HABITS).segment("list").params(filter.to_params())
    }

    pub fn habit(id: HabitId) -> QueryKey {
        QueryKey::new(HABITS).segment("detail").segment(id.to_string())
    }

    pub fn habit_logs(id: HabitId, range: &DateRange, limit: u32) -> QueryKey {
        QueryKey::new(HABITS)
            .segment("logs")
            .segment(id.to_string())
            .params(range.to_params())
            .param("limit", limit.to_string())
    }

    pub fn habit_stats(id: HabitId) -> QueryKey {
        QueryKey::new(HABITS).segment("stats").segment(id.to_string())
    }

    pub fn event_list(filter: &EventFilter) -> QueryKey {
        QueryKey::new(EVENTS).segment("list").params(filter.to_params())
    }

    pub fn event(id: EventId) -> QueryKey {
        QueryKey::new(EVENTS).segment("detail").segment(id.to_string())
    }

    pub fn event_month(month: CalendarMonth) -> QueryKey {
        QueryKey::new(EVENTS)
            .segment("month")
            .segment(month.year.to_string())
            .segment(month.month.to_string())
    }

    pub fn upcoming_events(limit: u32) -> QueryKey {
        QueryKey::new(EVENTS)
            .segment("upcoming")
            .param("limit", limit.to_string())
    }

    pub fn event_reminders(id: EventId) -> QueryKey {
        QueryKey::new(EVENTS).segment("reminders").segment(id.to_string())
    }

    pub fn chat_history(limit: u32) -> QueryKey {
        QueryKey::new(CHAT)
            .segment("history")
            .param("limit", limit.to_string())
    }

    pub fn analytics(report: AnalyticsReport, range: &DateRange) -> QueryKey {
        QueryKey::new(ANALYTICS)
            .segment(report.as_str())
            .params(range.to_params())
    }
}

/// Backend access for dashboard consumers.
pub struct DashboardService<A: DashboardApi> {
    api: A,
    cache: QueryClient<ApiError>,
    toasts: Arc<dyn ToastSink>,
}

impl<A: DashboardApi> DashboardService<A> {
    pub fn new(api: A, toasts: Arc<dyn ToastSink>) -> Self {
        Self {
            api,
            cache: QueryClient::new(),
            toasts,
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn cache(&self) -> &QueryClient<ApiError> {
        &self.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /* ------------------------------- reads ------------------------------- */

    pub fn tasks(&self, filter: &TaskFilter) -> ApiResult<Arc<Vec<Task>>> {
        self.read(&keys::task_list(filter), QueryPolicy::list(), || {
            self.api.list_tasks(filter)
        })
    }

    pub fn task(&self, id: TaskId) -> ApiResult<Arc<Task>> {
        self.read(&keys::task(id), QueryPolicy::detail(), || self.api.get_task(id))
    }

    pub fn task_stats(&self) -> ApiResult<Arc<TaskStats>> {
        self.read(&keys::task_stats(), QueryPolicy::list(), || self.api.task_stats())
    }

    pub fn habits(&self, filter: &HabitFilter) -> ApiResult<Arc<Vec<Habit>>> {
        self.read(&keys::habit_list(filter), QueryPolicy::list(), || {
            self.api.list_habits(filter)
        })
    }

    pub fn habit(&self, id: HabitId) -> ApiResult<Arc<Habit>> {
        self.read(&keys::habit(id), QueryPolicy::detail(), || self.api.get_habit(id))
    }

    pub fn habit_logs(
        &self,
        id: HabitId,
        range: &DateRange,
        limit: u32,
    ) -> ApiResult<Arc<Vec<HabitLog>>> {
        self.read(&keys::habit_logs(id, range, limit), QueryPolicy::list(), || {
            self.api.habit_logs(id, range, limit)
        })
    }

    pub fn habit_stats(&self, id: HabitId) -> ApiResult<Arc<HabitStats>> {
        self.read(&keys::habit_stats(id), QueryPolicy::detail(), || {
            self.api.habit_stats(id)
        })
    }

    pub fn events(&self, filter: &EventFilter) -> ApiResult<Arc<EventList>> {
        self.read(&keys::event_list(filter), QueryPolicy::list(), || {
            self.api.list_events(filter)
        })
    }

    pub fn event(&self, id: EventId) -> ApiResult<Arc<Event>> {
        self.read(&keys::event(id), QueryPolicy::detail(), || self.api.get_event(id))
    }

    /// Calendar month view.
    pub fn month_events(&self, month: CalendarMonth) -> ApiResult<Arc<MonthEvents>> {
        self.read(&keys::event_month(month), QueryPolicy::list(), || {
            self.api.month_events(month)
        })
    }

    pub fn upcoming_events(&self, limit: u32) -> ApiResult<Arc<Vec<Event>>> {
        self.read(&keys::upcoming_events(limit), QueryPolicy::list(), || {
            self.api.upcoming_events(limit)
        })
    }

    pub fn event_reminders(&self, id: EventId) -> ApiResult<Arc<Vec<EventReminder>>> {
        self.read(&keys::event_reminders(id), QueryPolicy::detail(), || {
            self.api.event_reminders(id)
        })
    }

    pub fn chat_history(&self, limit: u32) -> ApiResult<Arc<ChatHistory>> {
        self.read(&keys::chat_history(limit), QueryPolicy::chat(), || {
            self.api.chat_history(limit)
        })
    }

    pub fn analytics(
        &self,
        report: AnalyticsReport,
        range: &DateRange,
    ) -> ApiResult<Arc<serde_json::Value>> {
        self.read(
            &keys::analytics(report, range),
            QueryPolicy::analytics(),
            || self.api.analytics(report, range),
        )
    }

    /// Uncached backend health check.
    pub fn health(&self) -> ApiResult<HealthStatus> {
        self.api.health()
    }

    /* ----------------------------- mutations ----------------------------- */

    pub fn create_task(&self, request: &TaskCreate) -> ApiResult<Task> {
        let task = self.mutate("create_task", self.api.create_task(request))?;
        self.invalidate(&[TASKS, ANALYTICS]);
        Ok(task)
    }

    pub fn update_task(&self, id: TaskId, request: &TaskUpdate) -> ApiResult<Task> {
        let task = self.mutate("update_task", self.api.update_task(id, request))?;
        self.invalidate(&[TASKS, ANALYTICS]);
        self.cache
            .set_query_data(keys::task(task.id), QueryPolicy::detail(), task.clone());
        Ok(task)
    }

    pub fn complete_task(&self, id: TaskId) -> ApiResult<Task> {
        self.update_task(
            id,
            &TaskUpdate {
                status: Some(TaskStatus::Completed),
                ..TaskUpdate::default()
            },
        )
    }

    pub fn delete_task(&self, id: TaskId) -> ApiResult<()> {
        self.mutate("delete_task", self.api.delete_task(id))?;
        self.invalidate(&[TASKS, ANALYTICS]);
        self.cache.remove(&keys::task(id));
        Ok(())
    }

    pub fn create_habit(&self, request: &HabitCreate) -> ApiResult<Habit> {
        let habit = self.mutate("create_habit", self.api.create_habit(request))?;
        self.invalidate(&[HABITS, ANALYTICS]);
        Ok(habit)
    }

    pub fn update_habit(&self, id: HabitId, request: &HabitUpdate) -> ApiResult<Habit> {
        let habit = self.mutate("update_habit", self.api.update_habit(id, request))?;
        self.invalidate(&[HABITS, ANALYTICS]);
        self.cache
            .set_query_data(keys::habit(habit.id), QueryPolicy::detail(), habit.clone());
        Ok(habit)
    }

    pub fn delete_habit(&self, id: HabitId) -> ApiResult<()> {
        self.mutate("delete_habit", self.api.delete_habit(id))?;
        self.invalidate(&[HABITS, ANALYTICS]);
        self.cache.remove(&keys::habit(id));
        Ok(())
    }

    pub fn log_habit_completion(&self, request: &HabitLogCreate) -> ApiResult<HabitLog> {
        let log = self.mutate(
            "log_habit_completion",
            self.api.log_habit_completion(request),
        )?;
        self.invalidate(&[HABITS, ANALYTICS]);
        Ok(log)
    }

    pub fn create_event(&self, request: &EventCreate) -> ApiResult<Event> {
        let event = self.mutate("create_event", self.api.create_event(request))?;
        self.invalidate(&[EVENTS]);
        Ok(event)
    }

    pub fn update_event(&self, id: EventId, request: &EventUpdate) -> ApiResult<Event> {
        let event = self.mutate("update_event", self.api.update_event(id, request))?;
        self.invalidate(&[EVENTS]);
        self.cache
            .set_query_data(keys::event(event.id), QueryPolicy::detail(), event.clone());
        Ok(event)
    }

    pub fn delete_event(&self, id: EventId) -> ApiResult<()> {
        self.mutate("delete_event", self.api.delete_event(id))?;
        self.invalidate(&[EVENTS]);
        self.cache.remove(&keys::event(id));
        Ok(())
    }

    pub fn add_event_reminder(
        &self,
        id: EventId,
        request: &EventReminderCreate,
    ) -> ApiResult<EventReminder> {
        let reminder = self.mutate(
            "add_event_reminder",
            self.api.add_event_reminder(id, request),
        )?;
        self.invalidate(&[EVENTS]);
        Ok(reminder)
    }

    pub fn send_chat_message(&self, request: &ChatMessageCreate) -> ApiResult<ChatMessage> {
        let message = self.mutate("send_chat_message", self.api.send_chat_message(request))?;
        self.invalidate(&[CHAT]);
        Ok(message)
    }

    pub fn clear_chat_history(&self) -> ApiResult<()> {
        self.mutate("clear_chat_history", self.api.clear_chat_history())?;
        self.invalidate(&[CHAT]);
        Ok(())
    }

    /* ------------------------------ helpers ------------------------------ */

    fn read<T, F>(&self, key: &QueryKey, policy: QueryPolicy, fetcher: F) -> ApiResult<Arc<T>>
    where
        T: Send + Sync + 'static,
        F: FnMut() -> ApiResult<T>,
    {
        self.cache.fetch(key, policy, fetcher).map_err(|err| {
            warn!(
                "event=query_read module=service status=error resource={} error_code={}",
                key.resource(),
                err.code()
            );
            err
        })
    }

    fn mutate<T>(&self, action: &'static str, result: ApiResult<T>) -> ApiResult<T> {
        if let Err(err) = &result {
            warn!(
                "event=mutation module=service status=error action={action} error_code={}",
                err.code()
            );
            self.toasts.show(&Toast::error(err.user_message()));
        }
        result
    }

    fn invalidate(&self, families: &[&str]) {
        for family in families {
            self.cache.invalidate(&keys::family(family));
        }
    }
}
