//! File-backed settings persistence
//!
//! Writes go to a sibling `.tmp` file which is then renamed over the target.
//! Quota updates arrive on every consumed request, so inside a Tokio runtime
//! they are coalesced and written from the blocking pool.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tickbridge_common::resilience::QuotaWindow;
use tickbridge_core::SettingsStore;
use tickbridge_domain::{Result, Settings, TickbridgeError, WorkspaceRef};
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::errors::InfraError;

struct StoreState {
    path: PathBuf,
    settings: Mutex<Settings>,
    /// Held while a snapshot is serialised and written
    write_lock: Mutex<()>,
    write_scheduled: AtomicBool,
}

impl StoreState {
    /// Write the latest in-memory settings
    fn write_latest(&self) -> Result<()> {
        let _writing = self.write_lock.lock();
        let contents = serialize(&self.settings.lock(), &self.path)?;
        write_atomic(&self.path, &contents)
    }
}

/// Keeps an in-memory copy of the settings and rewrites the file on change
pub struct FileSettingsStore {
    state: Arc<StoreState>,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>, settings: Settings) -> Self {
        Self {
            state: Arc::new(StoreState {
                path: path.into(),
                settings: Mutex::new(settings),
                write_lock: Mutex::new(()),
                write_scheduled: AtomicBool::new(false),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.state.path
    }

    /// Current in-memory copy
    pub fn settings(&self) -> Settings {
        self.state.settings.lock().clone()
    }

    /// Adopt settings reloaded from disk; later writes start from these
    pub fn replace(&self, settings: Settings) {
        *self.state.settings.lock() = settings;
    }

    /// Write the in-memory copy now, including any deferred quota update
    pub fn flush(&self) -> Result<()> {
        self.state.write_scheduled.store(false, Ordering::SeqCst);
        self.state.write_latest()
    }

    fn update(&self, apply: impl FnOnce(&mut Settings)) -> Result<()> {
        apply(&mut self.state.settings.lock());
        self.state.write_latest()
    }

    /// Apply `apply` now and write it later, coalescing bursts into one write
    fn update_deferred(&self, apply: impl FnOnce(&mut Settings)) -> Result<()> {
        apply(&mut self.state.settings.lock());

        let Ok(runtime) = Handle::try_current() else {
            return self.state.write_latest();
        };
        if self.state.write_scheduled.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let state = Arc::clone(&self.state);
        runtime.spawn_blocking(move || {
            if !state.write_scheduled.swap(false, Ordering::SeqCst) {
                return;
            }
            if let Err(err) = state.write_latest() {
                warn!(error = %err, path = %state.path.display(), "Failed to persist settings");
            }
        });
        Ok(())
    }
}

impl SettingsStore for FileSettingsStore {
    fn persist_quota(&self, window: &QuotaWindow) -> Result<()> {
        debug!(used = window.used, cap = window.cap, "Persisting quota window");
        self.update_deferred(|settings| {
            settings.used_this_hour = window.used;
            settings.hour_window_start = window.window_start_ms;
            settings.hourly_cap = window.cap;
        })
    }

    fn persist_workspace(&self, workspace: &WorkspaceRef) -> Result<()> {
        debug!(workspace_id = %workspace.id, "Persisting workspace selection");
        self.update(|settings| settings.workspace = workspace.clone())
    }
}

/// Settings without a file; changes are kept in memory only
#[derive(Default)]
pub struct MemorySettingsStore {
    settings: Mutex<Settings>,
}

impl MemorySettingsStore {
    pub fn new(settings: Settings) -> Self {
        Self { settings: Mutex::new(settings) }
    }

    pub fn settings(&self) -> Settings {
        self.settings.lock().clone()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn persist_quota(&self, window: &QuotaWindow) -> Result<()> {
        let mut settings = self.settings.lock();
        settings.used_this_hour = window.used;
        settings.hour_window_start = window.window_start_ms;
        settings.hourly_cap = window.cap;
        Ok(())
    }

    fn persist_workspace(&self, workspace: &WorkspaceRef) -> Result<()> {
        self.settings.lock().workspace = workspace.clone();
        Ok(())
    }
}

fn serialize(settings: &Settings, path: &Path) -> Result<String> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::to_string_pretty(settings)
            .map_err(|e| TickbridgeError::Internal(format!("Failed to encode settings: {e}"))),
        _ => toml::to_string_pretty(settings).map_err(|e| InfraError::from(e).into()),
    }
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let temp_path = path.with_extension("tmp");

    if let Some(parent) = temp_path.parent() {
        fs::create_dir_all(parent).map_err(InfraError::from)?;
    }

    let mut file = fs::File::create(&temp_path).map_err(InfraError::from)?;
    file.write_all(contents.as_bytes()).map_err(InfraError::from)?;
    file.sync_all().map_err(InfraError::from)?;
    drop(file);

    fs::rename(&temp_path, path).map_err(InfraError::from)?;
    Ok(())
}
