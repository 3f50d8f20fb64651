//! Chat, analytics and health payloads.
//!
//! Analytics reports feed chart rendering outside this crate, so their
//! bodies are carried as opaque JSON.

use crate::model::timestamp;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Request body for `POST /chat/message`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessageCreate {
    pub message: String,
    pub include_context: bool,
}

impl ChatMessageCreate {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            include_context: true,
        }
    }
}

/// One user message and the assistant reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub message: String,
    pub response: String,
    #[serde(default)]
    pub response_time_ms: Option<u64>,
    #[serde(with = "timestamp::required")]
    pub created_at: DateTime<Utc>,
}

/// Response of `GET /chat/history`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatHistory {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub total_messages: u64,
}

/// Aggregation endpoints under `/analytics`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalyticsReport {
    Overview,
    Charts,
    Insights,
    Productivity,
    Habits,
}

impl AnalyticsReport {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Overview => "overview",
            Self::Charts => "charts",
            Self::Insights => "insights",
            Self::Productivity => "productivity",
            Self::Habits => "habits",
        }
    }
}

/// Optional inclusive date window for analytics queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DateRange {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

impl DateRange {
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(start) = self.start_date {
            params.push(("start_date", start.format("%Y-%m-%d").to_string()));
        }
        if let Some(end) = self.end_date {
            params.push(("end_date", end.format("%Y-%m-%d").to_string()));
        }
        params
    }
}

/// Response of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}
