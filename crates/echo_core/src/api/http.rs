//! `ureq`-backed implementation of [`DashboardApi`].
//!
//! # Invariants
//! - Every request carries the fixed timeout (slow local inference
//!   backends answer chat calls slowly).
//! - `Authorization: Bearer <token>` is sent only when a token is present.
//! - Request/response bodies are never logged; only method, path, status
//!   and duration are.

use super::error::{ApiError, ApiResult};
use super::{AuthSession, DashboardApi};
use crate::model::chat::{
    AnalyticsReport, ChatHistory, ChatMessage, ChatMessageCreate, DateRange, HealthStatus,
};
use crate::model::event::{
    CalendarMonth, Event, EventCreate, EventFilter, EventId, EventList, EventReminder,
    EventReminderCreate, EventUpdate, MonthEvents, MAX_UPCOMING_LIMIT,
};
use crate::model::habit::{
    Habit, HabitCreate, HabitFilter, HabitId, HabitLog, HabitLogCreate, HabitStats, HabitUpdate,
};
use crate::model::task::{Task, TaskCreate, TaskFilter, TaskId, TaskStats, TaskUpdate};
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api/v1";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(45);

/// Connection settings for the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
            token: None,
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

/// HTTP client for the backend REST API.
pub struct HttpDashboardApi {
    agent: ureq::Agent,
    base_url: String,
    session: Arc<AuthSession>,
}

impl HttpDashboardApi {
    pub fn new(config: &ApiConfig) -> ApiResult<Self> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ApiError::InvalidInput(format!(
                "api base url must start with http:// or https://, got `{base_url}`"
            )));
        }

        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
        Ok(Self {
            agent,
            base_url,
            session: Arc::new(AuthSession::new(config.token.clone())),
        })
    }

    /// Shared session; lets callers observe `login_required` or re-login.
    pub fn session(&self) -> Arc<AuthSession> {
        Arc::clone(&self.session)
    }

    fn request(&self, method: &str, path: &str) -> ureq::Request {
        let mut request = self
            .agent
            .request(method, &format!("{}{}", self.base_url, path))
            .set("Accept", "application/json");
        if let Some(token) = self.session.token() {
            request = request.set("Authorization", &format!("Bearer {token}"));
        }
        request
    }

    fn execute(
        &self,
        method: &'static str,
        path: &str,
        send: impl FnOnce(ureq::Request) -> Result<ureq::Response, ureq::Error>,
    ) -> ApiResult<ureq::Response> {
        let started_at = Instant::now();
        let result = send(self.request(method, path));
        let elapsed_ms = started_at.elapsed().as_millis();

        match result {
            Ok(response) => {
                debug!(
                    "event=api_call module=api status=ok method={method} path={path} http_status={} duration_ms={elapsed_ms}",
                    response.status()
                );
                Ok(response)
            }
            Err(ureq::Error::Status(401, _)) => {
                warn!(
                    "event=api_call module=api status=error method={method} path={path} http_status=401 duration_ms={elapsed_ms}"
                );
                self.session.expire();
                Err(ApiError::Unauthorized)
            }
            Err(ureq::Error::Status(status, response)) => {
                warn!(
                    "event=api_call module=api status=error method={method} path={path} http_status={status} duration_ms={elapsed_ms}"
                );
                Err(ApiError::Http {
                    status,
                    detail: error_detail(response),
                })
            }
            Err(ureq::Error::Transport(transport)) => {
                warn!(
                    "event=api_call module=api status=error method={method} path={path} error_code=transport duration_ms={elapsed_ms}"
                );
                Err(ApiError::Transport(transport.to_string()))
            }
        }
    }

    fn get<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> ApiResult<T> {
        let response = self.execute("GET", path, |request| {
            params
                .iter()
                .fold(request, |request, (key, value)| request.query(key, value))
                .call()
        })?;
        decode(response)
    }

    fn send<B: Serialize, T: DeserializeOwned>(
        &self,
        method: &'static str,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let response = self.execute(method, path, |request| request.send_json(body))?;
        decode(response)
    }

    fn delete(&self, path: &str) -> ApiResult<()> {
        self.execute("DELETE", path, |request| request.call())
            .map(|_| ())
    }
}

fn decode<T: DeserializeOwned>(response: ureq::Response) -> ApiResult<T> {
    response
        .into_json::<T>()
        .map_err(|err| ApiError::Decode(err.to_string()))
}

/// Extracts FastAPI-style `{"detail": ...}` messages.
fn error_detail(response: ureq::Response) -> Option<String> {
    let body = response.into_string().ok()?;
    let parsed: ErrorBody = serde_json::from_str(&body).ok()?;
    match parsed.detail? {
        serde_json::Value::String(detail) => Some(detail),
        // Validation errors arrive as a list of objects with `msg` fields.
        serde_json::Value::Array(items) => {
            let messages: Vec<String> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|msg| msg.as_str()))
                .map(str::to_string)
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        other => Some(other.to_string()),
    }
}

impl DashboardApi for HttpDashboardApi {
    fn list_tasks(&self, filter: &TaskFilter) -> ApiResult<Vec<Task>> {
        self.get("/tasks/", &filter.to_params())
    }

    fn get_task(&self, id: TaskId) -> ApiResult<Task> {
        self.get(&format!("/tasks/{id}"), &[])
    }

    fn create_task(&self, request: &TaskCreate) -> ApiResult<Task> {
        if request.title.trim().is_empty() {
            return Err(ApiError::InvalidInput("Task title is required.".to_string()));
        }
        self.send("POST", "/tasks/", request)
    }

    fn update_task(&self, id: TaskId, request: &TaskUpdate) -> ApiResult<Task> {
        self.send("PUT", &format!("/tasks/{id}"), request)
    }

    fn delete_task(&self, id: TaskId) -> ApiResult<()> {
        self.delete(&format!("/tasks/{id}"))
    }

    fn task_stats(&self) -> ApiResult<TaskStats> {
        self.get("/tasks/stats/summary", &[])
    }

    fn list_habits(&self, filter: &HabitFilter) -> ApiResult<Vec<Habit>> {
        self.get("/habits/", &filter.to_params())
    }

    fn get_habit(&self, id: HabitId) -> ApiResult<Habit> {
        self.get(&format!("/habits/{id}"), &[])
    }

    fn create_habit(&self, request: &HabitCreate) -> ApiResult<Habit> {
        if request.name.trim().is_empty() {
            return Err(ApiError::InvalidInput("Habit name is required.".to_string()));
        }
        self.send("POST", "/habits/", request)
    }

    fn update_habit(&self, id: HabitId, request: &HabitUpdate) -> ApiResult<Habit> {
        self.send("PUT", &format!("/habits/{id}"), request)
    }

    fn delete_habit(&self, id: HabitId) -> ApiResult<()> {
        self.delete(&format!("/habits/{id}"))
    }

    fn log_habit_completion(&self, request: &HabitLogCreate) -> ApiResult<HabitLog> {
        self.send(
            "POST",
            &format!("/habits/{}/logs", request.habit_id),
            request,
        )
    }

    fn habit_logs(&self, id: HabitId, range: &DateRange, limit: u32) -> ApiResult<Vec<HabitLog>> {
        let mut params = range.to_params();
        params.push(("limit", limit.clamp(1, 1000).to_string()));
        self.get(&format!("/habits/{id}/logs"), &params)
    }

    fn habit_stats(&self, id: HabitId) -> ApiResult<HabitStats> {
        self.get(&format!("/habits/{id}/stats"), &[])
    }

    fn list_events(&self, filter: &EventFilter) -> ApiResult<EventList> {
        self.get("/events/", &filter.to_params())
    }

    fn get_event(&self, id: EventId) -> ApiResult<Event> {
        self.get(&format!("/events/{id}"), &[])
    }

    fn create_event(&self, request: &EventCreate) -> ApiResult<Event> {
        request.validate().map_err(ApiError::InvalidInput)?;
        self.send("POST", "/events/", request)
    }

    fn update_event(&self, id: EventId, request: &EventUpdate) -> ApiResult<Event> {
        request.validate().map_err(ApiError::InvalidInput)?;
        self.send("PUT", &format!("/events/{id}"), request)
    }

    fn delete_event(&self, id: EventId) -> ApiResult<()> {
        self.delete(&format!("/events/{id}"))
    }

    fn month_events(&self, month: CalendarMonth) -> ApiResult<MonthEvents> {
        self.get(&format!("/events/month/{}/{}", month.year, month.month), &[])
    }

    fn upcoming_events(&self, limit: u32) -> ApiResult<Vec<Event>> {
        self.get(
            "/events/upcoming/list",
            &[("limit", limit.clamp(1, MAX_UPCOMING_LIMIT).to_string())],
        )
    }

    fn add_event_reminder(&self, id: EventId, request: &EventReminderCreate) -> ApiResult<EventReminder> {
        request.validate().map_err(ApiError::InvalidInput)?;
        self.send("POST", &format!("/events/{id}/reminders"), request)
    }

    fn event_reminders(&self, id: EventId) -> ApiResult<Vec<EventReminder>> {
        self.get(&format!("/events/{id}/reminders"), &[])
    }

    fn send_chat_message(&self, request: &ChatMessageCreate) -> ApiResult<ChatMessage> {
        if request.message.trim().is_empty() {
            return Err(ApiError::InvalidInput("Message cannot be empty.".to_string()));
        }
        self.send("POST", "/chat/message", request)
    }

    fn chat_history(&self, limit: u32) -> ApiResult<ChatHistory> {
        self.get("/chat/history", &[("limit", limit.to_string())])
    }

    fn clear_chat_history(&self) -> ApiResult<()> {
        self.delete("/chat/history")
    }

    fn analytics(&self, report: AnalyticsReport, range: &DateRange) -> ApiResult<serde_json::Value> {
        self.get(
            &format!("/analytics/{}", report.as_str()),
            &range.to_params(),
        )
    }

    fn health(&self) -> ApiResult<HealthStatus> {
        self.get("/health", &[])
    }
}
