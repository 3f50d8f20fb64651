//! Transient in-app toast channel.

use crate::model::notification::{Notification, NotificationPriority};
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const DEFAULT_TOAST_DURATION: Duration = Duration::from_secs(5);
pub const URGENT_TOAST_DURATION: Duration = Duration::from_secs(10);

/// Visual severity of a toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastSeverity {
    Info,
    /// High-priority reminders; rendered with urgent styling.
    Urgent,
    /// Failed user actions.
    Error,
}

/// One toast as handed to a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub title: String,
    pub message: String,
    pub severity: ToastSeverity,
    pub duration: Duration,
}

impl Toast {
    pub fn for_notification(notification: &Notification) -> Self {
        let (severity, duration) = match notification.priority {
            NotificationPriority::High => (ToastSeverity::Urgent, URGENT_TOAST_DURATION),
            NotificationPriority::Medium | NotificationPriority::Low => {
                (ToastSeverity::Info, DEFAULT_TOAST_DURATION)
            }
        };
        Self {
            title: notification.title.clone(),
            message: notification.message.clone(),
            severity,
            duration,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            title: "Something went wrong".to_string(),
            message: message.into(),
            severity: ToastSeverity::Error,
            duration: DEFAULT_TOAST_DURATION,
        }
    }
}

/// Receiver of toasts. Implementations must not block for long.
pub trait ToastSink: Send + Sync {
    fn show(&self, toast: &Toast);
}

impl<T: ToastSink + ?Sized> ToastSink for Arc<T> {
    fn show(&self, toast: &Toast) {
        (**self).show(toast)
    }
}

/// Writes one line per toast to a terminal-like writer.
pub struct ConsoleToastSink<W: Write + Send> {
    out: Mutex<W>,
}

impl ConsoleToastSink<std::io::Stderr> {
    pub fn stderr() -> Self {
        Self::new(std::io::stderr())
    }
}

impl<W: Write + Send> ConsoleToastSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write + Send> ToastSink for ConsoleToastSink<W> {
    fn show(&self, toast: &Toast) {
        let marker = match toast.severity {
            ToastSeverity::Info => "[i]",
            ToastSeverity::Urgent => "[!]",
            ToastSeverity::Error => "[x]",
        };
        let mut out = match self.out.lock() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        };
        // Terminal output is best effort.
        let _ = writeln!(out, "{marker} {}: {}", toast.title, toast.message);
        let _ = out.flush();
    }
}

/// Keeps every toast in memory, for embedders that render them later.
#[derive(Debug, Default)]
pub struct RecordingToastSink {
    toasts: Mutex<Vec<Toast>>,
}

impl RecordingToastSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toasts(&self) -> Vec<Toast> {
        match self.toasts.lock() {
            Ok(toasts) => toasts.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn take(&self) -> Vec<Toast> {
        match self.toasts.lock() {
            Ok(mut toasts) => std::mem::take(&mut *toasts),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl ToastSink for RecordingToastSink {
    fn show(&self, toast: &Toast) {
        match self.toasts.lock() {
            Ok(mut toasts) => toasts.push(toast.clone()),
            Err(poisoned) => poisoned.into_inner().push(toast.clone()),
        }
    }
}
