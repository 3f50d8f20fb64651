//! Notification preferences and their persisted store.
//!
//! # Responsibility
//! - Define the user-facing notification preferences.
//! - Load them once at startup and persist every change.
//!
//! # Invariants
//! - `reminder_hours` is always within `1..=24` once loaded or updated.
//! - Missing persisted keys are backfilled with defaults; a key holding a
//!   value of the wrong type is reset on its own.
//! - Malformed persisted JSON never fails startup; defaults are used.

use crate::repo::kv_repo::{KvRepository, RepoError};
use log::{info, warn};
use serde::{Deserialize, Deserializer, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Fixed storage key of the persisted settings blob.
pub const SETTINGS_STORAGE_KEY: &str = "echo-notification-settings";
pub const MIN_REMINDER_HOURS: u8 = 1;
pub const MAX_REMINDER_HOURS: u8 = 24;

/// User notification preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationSettings {
    /// Master switch; when off nothing is generated or delivered.
    #[serde(deserialize_with = "lenient_switch")]
    pub enabled: bool,
    #[serde(deserialize_with = "lenient_switch")]
    pub due_date_reminders: bool,
    #[serde(deserialize_with = "lenient_switch")]
    pub habit_reminders: bool,
    #[serde(deserialize_with = "lenient_switch")]
    pub overdue_alerts: bool,
    /// Gates the OS-level desktop channel.
    #[serde(deserialize_with = "lenient_switch")]
    pub sound_enabled: bool,
    #[serde(deserialize_with = "lenient_switch")]
    pub achievement_alerts: bool,
    /// Lead time for "due in N hours" reminders.
    #[serde(deserialize_with = "lenient_reminder_hours")]
    pub reminder_hours: u8,
}

/// Non-boolean values fall back to the default, which is on for every switch.
fn lenient_switch<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(serde_json::Value::deserialize(deserializer)?
        .as_bool()
        .unwrap_or(true))
}

/// Any number is rounded and clamped into range; non-numbers fall back to
/// the default lead time.
fn lenient_reminder_hours<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value.as_f64() {
        Some(hours) if hours.is_finite() => hours
            .round()
            .clamp(f64::from(MIN_REMINDER_HOURS), f64::from(MAX_REMINDER_HOURS))
            as u8,
        _ => MAX_REMINDER_HOURS,
    })
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            due_date_reminders: true,
            habit_reminders: true,
            overdue_alerts: true,
            sound_enabled: true,
            achievement_alerts: true,
            reminder_hours: MAX_REMINDER_HOURS,
        }
    }
}

impl NotificationSettings {
    /// Returns a copy with bounded fields clamped into range.
    pub fn normalized(mut self) -> Self {
        self.reminder_hours = self
            .reminder_hours
            .clamp(MIN_REMINDER_HOURS, MAX_REMINDER_HOURS);
        self
    }

    /// Parses a persisted blob, backfilling missing keys.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Self>(raw).map(Self::normalized)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

pub type SettingsResult<T> = Result<T, SettingsError>;

/// Failure to persist a settings change.
#[derive(Debug)]
pub enum SettingsError {
    Repo(RepoError),
    Encode(serde_json::Error),
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "failed to persist notification settings: {err}"),
            Self::Encode(err) => write!(f, "failed to encode notification settings: {err}"),
        }
    }
}

impl Error for SettingsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Encode(err) => Some(err),
        }
    }
}

impl From<RepoError> for SettingsError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

/// Owned settings object with explicit, persisting update methods.
///
/// Consumers borrow the current value through [`SettingsStore::settings`];
/// all writes go through this store so the persisted copy never drifts.
pub struct SettingsStore<R: KvRepository> {
    repo: R,
    settings: NotificationSettings,
}

impl<R: KvRepository> SettingsStore<R> {
    /// Loads persisted settings, falling back to defaults when the blob is
    /// absent, malformed, or unreadable.
    pub fn load(repo: R) -> Self {
        let settings = match repo.get(SETTINGS_STORAGE_KEY) {
            Ok(Some(raw)) => match NotificationSettings::from_json(&raw) {
                Ok(settings) => {
                    info!("event=settings_load module=settings status=ok source=storage");
                    settings
                }
                Err(err) => {
                    warn!(
                        "event=settings_load module=settings status=fallback reason=malformed error={err}"
                    );
                    NotificationSettings::default()
                }
            },
            Ok(None) => {
                info!("event=settings_load module=settings status=ok source=defaults");
                NotificationSettings::default()
            }
            Err(err) => {
                warn!(
                    "event=settings_load module=settings status=fallback reason=storage_error error={err}"
                );
                NotificationSettings::default()
            }
        };

        Self { repo, settings }
    }

    pub fn settings(&self) -> &NotificationSettings {
        &self.settings
    }

    /// Applies `change`, clamps the result and persists it.
    ///
    /// The in-memory value is only replaced once the write succeeded.
    pub fn update(
        &mut self,
        change: impl FnOnce(&mut NotificationSettings),
    ) -> SettingsResult<NotificationSettings> {
        let mut next = self.settings;
        change(&mut next);
        let next = next.normalized();

        self.repo.put(SETTINGS_STORAGE_KEY, &next.to_json()?)?;
        self.settings = next;
        info!(
            "event=settings_update module=settings status=ok enabled={} reminder_hours={}",
            next.enabled, next.reminder_hours
        );
        Ok(next)
    }

    pub fn set_enabled(&mut self, enabled: bool) -> SettingsResult<NotificationSettings> {
        self.update(|settings| settings.enabled = enabled)
    }

    pub fn set_reminder_hours(&mut self, hours: u8) -> SettingsResult<NotificationSettings> {
        self.update(|settings| settings.reminder_hours = hours)
    }

    /// Restores and persists default settings.
    pub fn reset(&mut self) -> SettingsResult<NotificationSettings> {
        self.update(|settings| *settings = NotificationSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::{NotificationSettings, MAX_REMINDER_HOURS, MIN_REMINDER_HOURS};

    #[test]
    fn missing_keys_are_backfilled_with_defaults() {
        let parsed = NotificationSettings::from_json(r#"{"enabled":false,"reminderHours":3}"#)
            .expect("partial blob should parse");
        assert!(!parsed.enabled);
        assert_eq!(parsed.reminder_hours, 3);
        assert!(parsed.due_date_reminders);
        assert!(parsed.habit_reminders);
        assert!(parsed.overdue_alerts);
        assert!(parsed.sound_enabled);
    }

    #[test]
    fn reminder_hours_are_clamped() {
        let low = NotificationSettings::from_json(r#"{"reminderHours":0}"#).unwrap();
        assert_eq!(low.reminder_hours, MIN_REMINDER_HOURS);
        let high = NotificationSettings::from_json(r#"{"reminderHours":200}"#).unwrap();
        assert_eq!(high.reminder_hours, MAX_REMINDER_HOURS);
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let json = NotificationSettings::default().to_json().unwrap();
        assert!(json.contains("\"dueDateReminders\":true"));
        assert!(json.contains("\"reminderHours\":24"));
    }
}
