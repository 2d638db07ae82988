//! Outbound notifications.
//!
//! Two surfaces: the remote sink (a chat relay reached over HTTP) receives
//! one message per phase change; the local browser surface gets start,
//! success and failure notices when `notifications` is on, and is asked to
//! open the checkout page on success.

pub mod http;
pub mod messages;
pub mod surface;

use serde::{Deserialize, Serialize};
use tracing::info;

pub use http::HttpNotificationSink;
pub use surface::{BrowserNotice, BrowserSurface, TracingSurface};

/// Body posted to the sink: `{eventId, eventName, message, useMentions}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartNotification {
    pub event_id: String,
    pub event_name: String,
    pub message: String,
    /// Ask the relay to ping everyone. Set only on success.
    pub use_mentions: bool,
}

impl CartNotification {
    pub fn new(event_id: &str, event_name: &str, message: impl Into<String>) -> Self {
        Self {
            event_id: event_id.to_string(),
            event_name: event_name.to_string(),
            message: message.into(),
            use_mentions: false,
        }
    }

    pub fn with_mentions(mut self) -> Self {
        self.use_mentions = true;
        self
    }
}

/// Fire-and-forget delivery. Implementations must not block the caller and
/// must swallow (log) their own failures.
pub trait NotificationSink: Send + Sync {
    fn dispatch(&self, notification: CartNotification);
}

/// Writes notifications to the log. Used when no relay is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn dispatch(&self, n: CartNotification) {
        info!(
            target: "notify",
            event_id = %n.event_id,
            event_name = %n.event_name,
            use_mentions = n.use_mentions,
            message = %n.message,
            "cart notification"
        );
    }
}
