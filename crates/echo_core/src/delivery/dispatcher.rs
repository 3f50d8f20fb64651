//! Settings-gated fan-out of new notifications to delivery channels.
//!
//! # Invariants
//! - Only live notifications created within the recency window are
//!   delivered, so unrelated refreshes do not re-fire old entries.
//! - Toasts fire whenever notifications are enabled.
//! - Desktop notices additionally need granted permission and
//!   `sound_enabled`.

use crate::delivery::desktop::{DesktopChannel, NotificationPermission};
use crate::delivery::toast::{Toast, ToastSink};
use crate::model::notification::Notification;
use crate::settings::NotificationSettings;
use chrono::{DateTime, Utc};
use log::warn;
use std::sync::Arc;

/// Maximum age of a notification that still counts as new.
pub const RECENCY_WINDOW_MS: i64 = 1_000;

/// Counts of one dispatch pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub toasts: usize,
    pub desktop: usize,
    pub desktop_failures: usize,
    /// Live notifications skipped because they were outside the window.
    pub stale: usize,
}

pub struct NotificationDispatcher {
    toasts: Arc<dyn ToastSink>,
    desktop: Option<DesktopChannel>,
}

impl NotificationDispatcher {
    pub fn new(toasts: Arc<dyn ToastSink>) -> Self {
        Self {
            toasts,
            desktop: None,
        }
    }

    pub fn with_desktop(mut self, channel: DesktopChannel) -> Self {
        self.desktop = Some(channel);
        self
    }

    /// Current desktop permission, `None` without a desktop channel.
    pub fn desktop_permission(&self) -> Option<NotificationPermission> {
        self.desktop.as_ref().map(DesktopChannel::permission)
    }

    pub fn request_desktop_permission(&mut self) -> Option<NotificationPermission> {
        self.desktop
            .as_mut()
            .map(DesktopChannel::request_permission)
    }

    pub fn dispatch(
        &self,
        notifications: &[Notification],
        settings: &NotificationSettings,
        now: DateTime<Utc>,
    ) -> DeliveryReport {
        let mut report = DeliveryReport::default();
        if !settings.enabled {
            return report;
        }

        let desktop = self
            .desktop
            .as_ref()
            .filter(|channel| channel.is_active(settings));

        for notification in notifications.iter().filter(|n| n.is_live()) {
            if !is_recent(notification, now) {
                report.stale += 1;
                continue;
            }

            self.toasts.show(&Toast::for_notification(notification));
            report.toasts += 1;

            if let Some(channel) = desktop {
                match channel.deliver(notification) {
                    Ok(()) => report.desktop += 1,
                    Err(err) => {
                        report.desktop_failures += 1;
                        warn!(
                            "event=notification_deliver module=delivery status=error channel=desktop kind={} error={}",
                            notification.kind.as_str(),
                            err
                        );
                    }
                }
            }
        }

        report
    }
}

fn is_recent(notification: &Notification, now: DateTime<Utc>) -> bool {
    let age_ms = (now - notification.created_at).num_milliseconds();
    (0..=RECENCY_WINDOW_MS).contains(&age_ms)
}
