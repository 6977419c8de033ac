use std::time::Duration;

/// Display time for success, warning and info toasts.
pub const DEFAULT_DURATION: Duration = Duration::from_millis(4000);

/// Error toasts stay up longer.
pub const ERROR_DURATION: Duration = Duration::from_millis(6000);

/// The visual category of a toast notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastType {
    Success,
    Error,
    Warning,
    Info,
}

/// A toast notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub toast_type: ToastType,
    pub title: String,
    pub message: Option<String>,
    /// `None` for persistent toasts, which stay until dismissed.
    pub duration: Option<Duration>,
    /// Time the toast has been on screen.
    pub shown_for: Duration,
}

impl Toast {
    pub fn is_persistent(&self) -> bool {
        self.duration.is_none()
    }
}

/// In-memory toast queue with monotonic ID assignment.
///
/// The owner drives time through [`expire`](Self::expire); the queue never
/// reads a clock itself.
#[derive(Debug, Clone, Default)]
pub struct ToastQueue {
    toasts: Vec<Toast>,
    next_id: u64,
}

impl ToastQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a toast. `duration: None` makes it persistent. Returns the
    /// assigned ID.
    pub fn push(
        &mut self,
        toast_type: ToastType,
        title: impl Into<String>,
        message: Option<String>,
        duration: Option<Duration>,
    ) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.toasts.push(Toast {
            id,
            toast_type,
            title: title.into(),
            message,
            duration,
            shown_for: Duration::ZERO,
        });
        id
    }

    pub fn success(&mut self, title: impl Into<String>) -> u64 {
        self.push(ToastType::Success, title, None, Some(DEFAULT_DURATION))
    }

    pub fn error(&mut self, title: impl Into<String>) -> u64 {
        self.push(ToastType::Error, title, None, Some(ERROR_DURATION))
    }

    pub fn warning(&mut self, title: impl Into<String>) -> u64 {
        self.push(ToastType::Warning, title, None, Some(DEFAULT_DURATION))
    }

    pub fn info(&mut self, title: impl Into<String>) -> u64 {
        self.push(ToastType::Info, title, None, Some(DEFAULT_DURATION))
    }

    pub fn error_with(&mut self, title: impl Into<String>, message: impl Into<String>) -> u64 {
        self.push(
            ToastType::Error,
            title,
            Some(message.into()),
            Some(ERROR_DURATION),
        )
    }

    pub fn warning_with(&mut self, title: impl Into<String>, message: impl Into<String>) -> u64 {
        self.push(
            ToastType::Warning,
            title,
            Some(message.into()),
            Some(DEFAULT_DURATION),
        )
    }

    /// Push an error toast that never expires on its own.
    pub fn persistent_error(
        &mut self,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> u64 {
        self.push(ToastType::Error, title, Some(message.into()), None)
    }

    /// Advance every timed toast by `elapsed` and drop the ones whose time
    /// is up. Returns the IDs removed, oldest first.
    pub fn expire(&mut self, elapsed: Duration) -> Vec<u64> {
        let mut expired = Vec::new();
        self.toasts.retain_mut(|t| {
            let Some(duration) = t.duration else {
                return true;
            };
            t.shown_for = t.shown_for.saturating_add(elapsed);
            if t.shown_for >= duration {
                expired.push(t.id);
                false
            } else {
                true
            }
        });
        expired
    }

    /// Remove a toast by ID, persistent or not. Returns `true` if found.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let len_before = self.toasts.len();
        self.toasts.retain(|t| t.id != id);
        self.toasts.len() != len_before
    }

    pub fn get(&self, id: u64) -> Option<&Toast> {
        self.toasts.iter().find(|t| t.id == id)
    }

    /// Iterate over toasts in insertion order (oldest first).
    pub fn iter(&self) -> impl Iterator<Item = &Toast> {
        self.toasts.iter()
    }

    /// The most recent toast.
    pub fn latest(&self) -> Option<&Toast> {
        self.toasts.last()
    }

    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    pub fn clear(&mut self) {
        self.toasts.clear();
    }
}
