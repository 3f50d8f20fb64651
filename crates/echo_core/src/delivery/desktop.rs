//! OS-level desktop notification channel.
//!
//! # Responsibility
//! - Translate notifications into platform notices.
//! - Track notification permission for the session.
//!
//! # Invariants
//! - Permission is queried once when the channel is created and afterwards
//!   only changes through `request_permission`.
//! - `Denied` is sticky for the session; it can only be lifted outside this
//!   process (system notification settings).

use crate::delivery::DeliveryError;
use crate::model::notification::{Notification, NotificationPriority};
use crate::settings::NotificationSettings;
use log::{debug, info};
use std::sync::Arc;
use std::time::Duration;

/// Auto-close delay for notices that do not require interaction.
pub const DESKTOP_AUTO_CLOSE: Duration = Duration::from_secs(5);

/// Tri-state platform permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationPermission {
    /// Not asked yet.
    Default,
    Granted,
    Denied,
}

impl NotificationPermission {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Granted => "granted",
            Self::Denied => "denied",
        }
    }
}

/// Platform-neutral desktop notice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesktopNotice {
    /// Source notification id; lets the platform replace duplicates.
    pub tag: String,
    pub title: String,
    pub body: String,
    /// Keep the notice on screen until the user acts on it.
    pub require_interaction: bool,
    /// Auto-close delay; `None` when interaction is required.
    pub timeout: Option<Duration>,
    /// Activating the notice calls the backend's activation handler.
    pub focus_on_click: bool,
}

impl DesktopNotice {
    pub fn for_notification(notification: &Notification) -> Self {
        let require_interaction = notification.priority == NotificationPriority::High;
        Self {
            tag: notification.id.clone(),
            title: notification.title.clone(),
            body: notification.message.clone(),
            require_interaction,
            timeout: (!require_interaction).then_some(DESKTOP_AUTO_CLOSE),
            focus_on_click: true,
        }
    }
}

/// Platform notification backend.
pub trait DesktopNotifier: Send {
    fn query_permission(&self) -> NotificationPermission;
    /// Runs the platform permission flow and returns its outcome.
    fn request_permission(&mut self) -> NotificationPermission;
    fn show(&self, notice: &DesktopNotice) -> Result<(), DeliveryError>;
}

/// Called with the notice tag when the user clicks a notice.
pub type ActivationHandler = Arc<dyn Fn(&str) + Send + Sync>;

const ACTIVATE_ACTION: &str = "default";

/// Desktop backend built on `notify-rust` (D-Bus, macOS, Windows toasts).
///
/// Desktop notification daemons have no permission prompt, so permission is
/// always reported as granted. Clicks are only observed on XDG desktops,
/// where a short-lived thread waits for the notice to be activated or closed.
#[derive(Clone)]
pub struct NotifyRustNotifier {
    app_name: String,
    on_activate: Option<ActivationHandler>,
}

impl NotifyRustNotifier {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
            on_activate: None,
        }
    }

    /// Installs the handler that brings the embedding application forward.
    pub fn with_activation_handler(mut self, handler: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_activate = Some(Arc::new(handler));
        self
    }

    fn build(&self, notice: &DesktopNotice) -> notify_rust::Notification {
        let mut notification = notify_rust::Notification::new();
        notification
            .appname(&self.app_name)
            .summary(&notice.title)
            .body(&notice.body)
            .timeout(match notice.timeout {
                Some(timeout) => notify_rust::Timeout::Milliseconds(
                    u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX),
                ),
                None => notify_rust::Timeout::Never,
            });
        if notice.focus_on_click && self.on_activate.is_some() {
            notification.action(ACTIVATE_ACTION, "Open");
        }
        #[cfg(all(unix, not(target_os = "macos")))]
        {
            notification.urgency(if notice.require_interaction {
                notify_rust::Urgency::Critical
            } else {
                notify_rust::Urgency::Normal
            });
        }
        notification
    }
}

impl DesktopNotifier for NotifyRustNotifier {
    fn query_permission(&self) -> NotificationPermission {
        NotificationPermission::Granted
    }

    fn request_permission(&mut self) -> NotificationPermission {
        NotificationPermission::Granted
    }

    fn show(&self, notice: &DesktopNotice) -> Result<(), DeliveryError> {
        let notification = self.build(notice);
        match (notice.focus_on_click, self.on_activate.clone()) {
            (true, Some(handler)) => show_and_watch(notification, notice.tag.clone(), handler),
            _ => notification
                .show()
                .map(|_| ())
                .map_err(|err| DeliveryError::new("desktop", err.to_string())),
        }
    }
}

/// Shows the notice from a watcher thread that stays until the notice is
/// activated or closed; the show result is reported back synchronously.
#[cfg(all(unix, not(target_os = "macos")))]
fn show_and_watch(
    notification: notify_rust::Notification,
    tag: String,
    handler: ActivationHandler,
) -> Result<(), DeliveryError> {
    let (shown_tx, shown_rx) = crossbeam_channel::bounded::<Result<(), String>>(1);
    std::thread::Builder::new()
        .name("echo-desktop-action".to_string())
        .spawn(move || match notification.show() {
            Ok(handle) => {
                let _ = shown_tx.send(Ok(()));
                handle.wait_for_action(|action| {
                    if action == ACTIVATE_ACTION {
                        debug!("event=desktop_activate module=delivery status=ok");
                        handler(&tag);
                    }
                });
            }
            Err(err) => {
                let _ = shown_tx.send(Err(err.to_string()));
            }
        })
        .map_err(|err| DeliveryError::new("desktop", err.to_string()))?;

    shown_rx
        .recv()
        .map_err(|err| DeliveryError::new("desktop", err.to_string()))?
        .map_err(|message| DeliveryError::new("desktop", message))
}

#[cfg(not(all(unix, not(target_os = "macos"))))]
fn show_and_watch(
    notification: notify_rust::Notification,
    _tag: String,
    _handler: ActivationHandler,
) -> Result<(), DeliveryError> {
    debug!("event=desktop_activate module=delivery status=unsupported");
    notification
        .show()
        .map(|_| ())
        .map_err(|err| DeliveryError::new("desktop", err.to_string()))
}

/// Permission-aware wrapper around one desktop backend.
pub struct DesktopChannel {
    notifier: Box<dyn DesktopNotifier>,
    permission: NotificationPermission,
}

impl DesktopChannel {
    /// Creates the channel and queries permission once.
    pub fn new(notifier: Box<dyn DesktopNotifier>) -> Self {
        let permission = notifier.query_permission();
        info!(
            "event=desktop_permission module=delivery status=queried permission={}",
            permission.as_str()
        );
        Self {
            notifier,
            permission,
        }
    }

    pub fn permission(&self) -> NotificationPermission {
        self.permission
    }

    /// User-initiated permission request.
    ///
    /// A denied channel stays denied without prompting again.
    pub fn request_permission(&mut self) -> NotificationPermission {
        if self.permission == NotificationPermission::Default {
            self.permission = self.notifier.request_permission();
            info!(
                "event=desktop_permission module=delivery status=requested permission={}",
                self.permission.as_str()
            );
        }
        self.permission
    }

    /// Whether notices may be shown under the given settings.
    pub fn is_active(&self, settings: &NotificationSettings) -> bool {
        self.permission == NotificationPermission::Granted && settings.sound_enabled
    }

    pub fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError> {
        self.notifier
            .show(&DesktopNotice::for_notification(notification))
    }
}
