//! Recording notification sink and in-memory settings store

use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tickbridge_common::resilience::QuotaWindow;
use tickbridge_core::{NotificationSink, SettingsStore};
use tickbridge_domain::{Notice, Result, TickbridgeError, WorkspaceRef};

/// Keeps every notice for later assertions
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.notices.lock().iter().map(|notice| notice.message.clone()).collect()
    }

    pub fn count_containing(&self, needle: &str) -> usize {
        self.notices.lock().iter().filter(|notice| notice.message.contains(needle)).count()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.count_containing(needle) > 0
    }

    pub fn clear(&self) {
        self.notices.lock().clear();
    }
}

impl NotificationSink for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }
}

/// Captures persisted quota windows and workspace selections
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    pub quota: Mutex<Vec<QuotaWindow>>,
    pub workspaces: Mutex<Vec<WorkspaceRef>>,
    fail: AtomicBool,
}

impl MemorySettingsStore {
    pub fn fail_writes(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn last_quota(&self) -> Option<QuotaWindow> {
        self.quota.lock().last().copied()
    }

    fn check(&self) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(TickbridgeError::Internal("disk full".to_string()));
        }
        Ok(())
    }
}

impl SettingsStore for MemorySettingsStore {
    fn persist_quota(&self, window: &QuotaWindow) -> Result<()> {
        self.check()?;
        self.quota.lock().push(*window);
        Ok(())
    }

    fn persist_workspace(&self, workspace: &WorkspaceRef) -> Result<()> {
        self.check()?;
        self.workspaces.lock().push(workspace.clone());
        Ok(())
    }
}
