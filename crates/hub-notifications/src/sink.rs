//! Where lifecycle events end up.

use hubchat_hub_connection::LifecycleEvent;
use tracing::debug;

use crate::toast::ToastQueue;

/// Receives lifecycle events for display. Never sees the connection.
pub trait NotificationSink {
    fn notify(&mut self, event: &LifecycleEvent);
}

impl NotificationSink for ToastQueue {
    fn notify(&mut self, event: &LifecycleEvent) {
        let id = match event {
            LifecycleEvent::Connected => self.success("Connected to chat"),
            LifecycleEvent::Reconnected => self.success("Reconnected to chat"),
            LifecycleEvent::Reconnecting => {
                self.warning_with("Connection lost", "Reconnecting...")
            }
            LifecycleEvent::ConnectionError {
                message,
                terminal: false,
            } => self.error_with("Connection error", message.as_str()),
            LifecycleEvent::ConnectionError {
                message,
                terminal: true,
            } => self.persistent_error("Connection failed", message.as_str()),
            LifecycleEvent::Closed => self.persistent_error(
                "Disconnected",
                "Connection to the chat server was closed. Please refresh the page.",
            ),
        };
        debug!(id, ?event, "toast queued");
    }
}
