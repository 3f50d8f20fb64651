//! Notification delivery channels.
//!
//! # Responsibility
//! - Render notifications as transient in-app toasts (`toast`).
//! - Surface them as OS-level desktop notifications (`desktop`).
//! - Gate both sinks by settings, permission and recency (`dispatcher`).
//!
//! # Invariants
//! - Delivery failures degrade a channel; they never propagate to callers.

pub mod desktop;
pub mod dispatcher;
pub mod toast;

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failure reported by a delivery sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryError {
    pub channel: &'static str,
    pub message: String,
}

impl DeliveryError {
    pub fn new(channel: &'static str, message: impl Into<String>) -> Self {
        Self {
            channel,
            message: message.into(),
        }
    }
}

impl Display for DeliveryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} delivery failed: {}", self.channel, self.message)
    }
}

impl Error for DeliveryError {}
