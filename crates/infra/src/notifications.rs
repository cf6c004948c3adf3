//! Notification sinks
//!
//! [`TracingNotifier`] writes notices to the log. [`ChannelNotifier`] also
//! forwards them to a receiver, for frontends that render them.

use tickbridge_core::NotificationSink;
use tickbridge_domain::{Notice, NoticeKind};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Logs each notice at the level matching its kind
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl NotificationSink for TracingNotifier {
    fn notify(&self, notice: Notice) {
        log_notice(&notice);
    }
}

/// Logs and forwards notices over an unbounded channel
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notice>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl NotificationSink for ChannelNotifier {
    fn notify(&self, notice: Notice) {
        log_notice(&notice);
        // A dropped receiver only means nobody is rendering notices
        let _ = self.tx.send(notice);
    }
}

fn log_notice(notice: &Notice) {
    match notice.kind {
        NoticeKind::Info => info!(target: "tickbridge::notice", "{}", notice.message),
        NoticeKind::Warning => warn!(target: "tickbridge::notice", "{}", notice.message),
        NoticeKind::Error => error!(target: "tickbridge::notice", "{}", notice.message),
    }
}
