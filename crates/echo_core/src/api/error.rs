//! REST client error taxonomy.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ApiResult<T> = Result<T, ApiError>;

const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";
const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please sign in again.";

/// Failure of one backend call.
///
/// `Clone` so one in-flight result can be shared by every waiting caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Backend answered 401; the session token has been cleared.
    Unauthorized,
    /// Non-success status with the server-provided `detail`, if any.
    Http { status: u16, detail: Option<String> },
    /// Connection, DNS, TLS or timeout failure.
    Transport(String),
    /// Response body did not match the expected shape.
    Decode(String),
    /// Request rejected locally before it was sent.
    InvalidInput(String),
}

impl ApiError {
    /// Text suitable for a user-visible error toast.
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthorized => SESSION_EXPIRED_MESSAGE.to_string(),
            Self::Http {
                detail: Some(detail),
                ..
            } if !detail.trim().is_empty() => detail.trim().to_string(),
            Self::InvalidInput(message) => message.clone(),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }

    /// Short stable code used in log events.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::Http { .. } => "http_status",
            Self::Transport(_) => "transport",
            Self::Decode(_) => "decode",
            Self::InvalidInput(_) => "invalid_input",
        }
    }
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized => write!(f, "backend rejected credentials (401)"),
            Self::Http {
                status,
                detail: Some(detail),
            } => write!(f, "backend returned {status}: {detail}"),
            Self::Http {
                status,
                detail: None,
            } => write!(f, "backend returned {status}"),
            Self::Transport(message) => write!(f, "request failed: {message}"),
            Self::Decode(message) => write!(f, "unexpected response body: {message}"),
            Self::InvalidInput(message) => write!(f, "invalid request: {message}"),
        }
    }
}

impl Error for ApiError {}
