//! User-facing failure notifications.
//!
//! The gateway raises exactly one notification per failed call. What the
//! user sees is picked from the classified status; the `ApiError` handed
//! back to the caller is the same shape regardless.

use crate::error::{ApiError, ErrorKind};

pub const AUTH_REQUIRED_MESSAGE: &str = "Authentication required. Please sign in to continue.";
pub const FORBIDDEN_MESSAGE: &str = "You do not have permission to perform this action.";
pub const NOT_FOUND_MESSAGE: &str = "The requested resource was not found.";
pub const SERVER_ERROR_MESSAGE: &str = "Server error. Please try again later.";
pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please check your connection and try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    AuthRequired,
    Forbidden,
    NotFound,
    ServerError,
    RequestFailed,
    NetworkError,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
}

impl Notification {
    pub fn for_error(error: &ApiError) -> Self {
        // A 2xx status on an error means the body could not be decoded.
        let failed_status = error.status().filter(|s| !(200..300).contains(s));
        let (kind, message) = match (error.kind(), failed_status) {
            (ErrorKind::Network, _) => (NotificationKind::NetworkError, NETWORK_ERROR_MESSAGE.to_string()),
            (_, Some(401)) => (NotificationKind::AuthRequired, AUTH_REQUIRED_MESSAGE.to_string()),
            (_, Some(403)) => (NotificationKind::Forbidden, FORBIDDEN_MESSAGE.to_string()),
            (_, Some(404)) => (NotificationKind::NotFound, NOT_FOUND_MESSAGE.to_string()),
            (_, Some(s)) if s >= 500 => (NotificationKind::ServerError, SERVER_ERROR_MESSAGE.to_string()),
            (_, Some(_)) => (NotificationKind::RequestFailed, error.message().to_string()),
            (_, None) => (NotificationKind::Unknown, error.message().to_string()),
        };
        Self { kind, message }
    }
}

/// Presents notifications to whoever is driving the UI.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification);
}

/// Emits notifications as `warn` events on the `portal_gateway::notify`
/// target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: &Notification) {
        tracing::warn!(
            target: "portal_gateway::notify",
            kind = ?notification.kind,
            "{}",
            notification.message
        );
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _notification: &Notification) {}
}
