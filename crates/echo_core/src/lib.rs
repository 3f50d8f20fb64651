//! Core client logic for the Echo productivity dashboard.
//!
//! Reminder rules, the session notification list, delivery channels, the
//! cached REST client and persisted preferences live here; binaries only
//! wire them together.

pub mod api;
pub mod config;
pub mod db;
pub mod delivery;
pub mod logging;
pub mod model;
pub mod query;
pub mod reminder;
pub mod repo;
pub mod scheduler;
pub mod service;
pub mod settings;

pub use api::{ApiConfig, ApiError, ApiResult, AuthSession, DashboardApi, HttpDashboardApi};
pub use config::{ClientConfig, ConfigError};
pub use delivery::desktop::{DesktopChannel, NotificationPermission, NotifyRustNotifier};
pub use delivery::dispatcher::{DeliveryReport, NotificationDispatcher};
pub use delivery::toast::{ConsoleToastSink, Toast, ToastSink};
pub use logging::{init_logging, logging_status, LogLevel, LoggingError};
pub use model::notification::{Notification, NotificationKind, NotificationPriority};
pub use reminder::center::NotificationCenter;
pub use reminder::rules::generate_notifications;
pub use repo::kv_repo::{KvRepository, RepoError, RepoResult, SqliteKvRepository};
pub use scheduler::{Ticker, TickerGuard};
pub use service::dashboard_service::DashboardService;
pub use service::reminder_service::{RefreshOutcome, ReminderService};
pub use settings::{NotificationSettings, SettingsError, SettingsStore};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
