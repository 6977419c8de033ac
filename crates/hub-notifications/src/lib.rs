//! Presentation of connection lifecycle events.

pub mod sink;
pub mod toast;

pub use sink::NotificationSink;
pub use toast::{Toast, ToastQueue, ToastType};
