//! Port for user-visible notices

use tickbridge_domain::Notice;

/// Fire-and-forget channel for transient user-facing messages
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notice: Notice);
}
