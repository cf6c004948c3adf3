//! Shared test helpers for `tickbridge-core` integration tests.
//!
//! In-memory implementations of every core port plus a [`Harness`] that
//! wires them into a gateway driven by a [`MockClock`].

#![allow(dead_code)]

pub mod ports;
pub mod transport;

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use tickbridge_common::resilience::MockClock;
use tickbridge_core::{RequestGateway, ReferenceStore, TimerSynchronizer};
use tickbridge_domain::{Settings, SettingsSnapshot, TimeEntry, Workspace, WorkspaceRef};

pub use ports::{MemorySettingsStore, RecordingNotifier};
pub use transport::{MockFactory, MockProbe, MockTransport};

/// 2024-05-01 09:00:00 UTC
pub const EPOCH_MS: u64 = 1_714_554_000_000;

pub const TOKEN: &str = "secret-token";

pub fn now() -> DateTime<Utc> {
    Utc.timestamp_millis_opt(EPOCH_MS as i64).unwrap()
}

/// Settings with a token and workspace 1 selected
pub fn settings() -> Settings {
    Settings {
        api_token: Some(TOKEN.to_string()),
        workspace: WorkspaceRef::new(1, "Main"),
        ..Settings::default()
    }
}

pub fn workspace(id: u64, name: &str) -> Workspace {
    Workspace { id, name: name.to_string() }
}

/// A timer in workspace 1 that started `elapsed_secs` before [`now`]
pub fn running_entry(id: u64, description: &str, elapsed_secs: i64) -> TimeEntry {
    let start = now() - chrono::Duration::seconds(elapsed_secs);
    TimeEntry {
        id,
        workspace_id: 1,
        project_id: None,
        description: Some(description.to_string()),
        start,
        stop: None,
        duration: -start.timestamp(),
        tag_ids: Vec::new(),
        billable: false,
    }
}

/// Everything a gateway or synchronizer test needs
pub struct Harness {
    pub transport: Arc<MockTransport>,
    pub factory: Arc<MockFactory>,
    pub probe: Arc<MockProbe>,
    pub notifier: Arc<RecordingNotifier>,
    pub store: Arc<MemorySettingsStore>,
    pub references: Arc<ReferenceStore>,
    pub clock: MockClock,
    pub gateway: Arc<RequestGateway>,
}

impl Harness {
    pub fn new(settings: Settings) -> Self {
        let transport = Arc::new(MockTransport::default());
        let factory = Arc::new(MockFactory::new(Arc::clone(&transport)));
        let probe = Arc::new(MockProbe::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let store = Arc::new(MemorySettingsStore::default());
        let clock = MockClock::at_epoch_millis(EPOCH_MS);

        let gateway = RequestGateway::builder()
            .settings(SettingsSnapshot::initial(settings))
            .transport_factory(factory.clone())
            .probe(probe.clone())
            .notifier(notifier.clone())
            .settings_store(store.clone())
            .clock(Arc::new(clock.clone()))
            .build()
            .unwrap();

        Self {
            transport,
            factory,
            probe,
            notifier,
            store,
            references: Arc::new(ReferenceStore::new()),
            clock,
            gateway: Arc::new(gateway),
        }
    }

    /// A gateway already connected with [`TOKEN`]
    pub async fn connected(settings: Settings) -> Self {
        let harness = Self::new(settings);
        harness.gateway.connect(TOKEN).await.unwrap();
        harness.notifier.clear();
        harness
    }

    pub fn synchronizer(&self) -> Arc<TimerSynchronizer> {
        TimerSynchronizer::new(
            Arc::clone(&self.gateway),
            self.references.clone(),
            self.notifier.clone(),
        )
    }
}
