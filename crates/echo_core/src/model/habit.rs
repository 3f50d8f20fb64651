//! Habit payloads exchanged with the backend habit API.
//!
//! # Invariants
//! - `is_active` defaults to `true` when the backend omits it.
//! - Streak counters are owned by the backend and only read here.

use crate::model::timestamp;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable backend identifier of a habit.
pub type HabitId = Uuid;

/// How often a habit is meant to be performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HabitFrequency {
    Daily,
    Weekly,
    Monthly,
    Custom,
}

impl HabitFrequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Custom => "custom",
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_target_count() -> u32 {
    1
}

/// Habit as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habit {
    pub id: HabitId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub frequency: HabitFrequency,
    #[serde(default = "default_target_count")]
    pub target_count: u32,
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub longest_streak: u32,
    #[serde(default, alias = "last_completed_at", with = "timestamp::optional")]
    pub last_completed: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default, with = "timestamp::optional")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::optional")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Habit {
    /// Builds an active habit with no completion history.
    pub fn new(id: HabitId, name: impl Into<String>, frequency: HabitFrequency) -> Self {
        Self {
            id,
            name: name.into(),
            description: None,
            frequency,
            target_count: 1,
            current_streak: 0,
            longest_streak: 0,
            last_completed: None,
            is_active: true,
            created_at: None,
            updated_at: None,
        }
    }
}

/// Request body for `POST /habits/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HabitCreate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub frequency: HabitFrequency,
    pub target_count: u32,
}

/// Request body for `PUT /habits/{id}`; absent fields stay unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HabitUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<HabitFrequency>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_count: Option<u32>,
}

/// Request body for `POST /habits/{id}/logs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HabitLogCreate {
    pub habit_id: HabitId,
    pub completed_date: NaiveDate,
    pub count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Completion log entry returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitLog {
    pub id: String,
    pub habit_id: HabitId,
    pub completed_date: NaiveDate,
    #[serde(default = "default_target_count")]
    pub count: u32,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, with = "timestamp::optional")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Per-habit insight from `GET /habits/{id}/stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitStats {
    pub habit_id: HabitId,
    pub habit_name: String,
    pub total_completions: u32,
    /// Percentage of days completed, 0 to 100.
    pub completion_rate: f64,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub days_since_creation: u32,
    #[serde(default)]
    pub last_completed: Option<NaiveDate>,
}

/// List filter for `GET /habits/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct HabitFilter {
    pub frequency: Option<HabitFrequency>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl HabitFilter {
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(frequency) = self.frequency {
            params.push(("frequency", frequency.as_str().to_string()));
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
    use super::{Habit, HabitFrequency};

    #[test]
    fn missing_active_flag_and_completion_default_sensibly() {
        let json = r#"{
            "id": "123e4567-e89b-12d3-a456-426614174000",
            "name": "Morning Exercise",
            "frequency": "daily",
            "target_count": 1,
            "current_streak": 5,
            "longest_streak": 12,
            "created_at": "2024-01-01T00:00:00",
            "updated_at": "2024-01-10T09:00:00"
        }"#;

        let habit: Habit = serde_json::from_str(json).expect("habit payload should parse");
        assert_eq!(habit.frequency, HabitFrequency::Daily);
        assert!(habit.is_active);
        assert!(habit.last_completed.is_none());
        assert_eq!(habit.current_streak, 5);
    }
}
