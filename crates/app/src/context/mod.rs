//! Application context - dependency injection container

use std::path::PathBuf;
use std::sync::Arc;

use tickbridge_core::{
    ConnectivityProbe, NotificationSink, ReferenceStore, RequestGateway, SettingsStore,
    TimerSynchronizer, TransportFactory,
};
use tickbridge_domain::{Result, Settings, SettingsSnapshot};
use tickbridge_infra::config::{self, LoadedSettings};
use tickbridge_infra::{
    FileSettingsStore, IdentityProbe, MemorySettingsStore, TogglClientConfig,
    TogglTransportFactory, TracingNotifier,
};
use tracing::{info, warn};

/// Where settings changes are written
enum SettingsBackend {
    File(Arc<FileSettingsStore>),
    Memory(Arc<MemorySettingsStore>),
}

impl SettingsBackend {
    fn store(&self) -> Arc<dyn SettingsStore> {
        match self {
            Self::File(store) => Arc::clone(store) as Arc<dyn SettingsStore>,
            Self::Memory(store) => Arc::clone(store) as Arc<dyn SettingsStore>,
        }
    }
}

/// Application context - holds all services and dependencies
pub struct AppContext {
    pub gateway: Arc<RequestGateway>,
    pub references: Arc<ReferenceStore>,
    pub synchronizer: Arc<TimerSynchronizer>,
    backend: SettingsBackend,
}

impl AppContext {
    /// Load settings from the standard locations and wire the services
    ///
    /// Nothing touches the network until [`AppContext::start`].
    pub fn new() -> Result<Self> {
        let loaded = config::load()?;
        Self::with_settings(loaded, Arc::new(TracingNotifier))
    }

    /// Wire the services around already-loaded settings
    pub fn with_settings(
        loaded: LoadedSettings,
        notifier: Arc<dyn NotificationSink>,
    ) -> Result<Self> {
        let LoadedSettings { settings, path } = loaded;
        let client_config = TogglClientConfig::from(&settings.api);

        let backend = match path {
            Some(path) => {
                info!(path = %path.display(), "Persisting settings changes to file");
                SettingsBackend::File(Arc::new(FileSettingsStore::new(path, settings.clone())))
            }
            None => {
                warn!("No settings file; quota usage and workspace selection are not persisted");
                SettingsBackend::Memory(Arc::new(MemorySettingsStore::new(settings.clone())))
            }
        };

        let factory: Arc<dyn TransportFactory> =
            Arc::new(TogglTransportFactory::new(client_config.clone()));
        let probe: Arc<dyn ConnectivityProbe> = Arc::new(IdentityProbe::new(&client_config)?);

        let gateway = Arc::new(
            RequestGateway::builder()
                .settings(SettingsSnapshot::initial(settings))
                .transport_factory(factory)
                .probe(probe)
                .notifier(Arc::clone(&notifier))
                .settings_store(backend.store())
                .build()?,
        );

        let references = Arc::new(ReferenceStore::new());
        let synchronizer =
            TimerSynchronizer::new(Arc::clone(&gateway), references.clone(), notifier);

        Ok(Self { gateway, references, synchronizer, backend })
    }

    /// Settings file in use, if any
    pub fn settings_path(&self) -> Option<PathBuf> {
        match &self.backend {
            SettingsBackend::File(store) => Some(store.path().to_path_buf()),
            SettingsBackend::Memory(_) => None,
        }
    }

    /// Connect with the configured token and start polling
    pub async fn start(&self) -> Result<()> {
        let settings = self.gateway.settings();
        self.synchronizer.refresh_api_connection(settings.token()).await
    }

    /// Re-read settings and hand them to the running services
    ///
    /// A changed token, workspace or polling cadence triggers a reconnect.
    /// API endpoint options are fixed at construction. Returns whether a
    /// reconnect happened.
    pub async fn reload_settings(&self) -> Result<bool> {
        let current = self.gateway.settings();
        let mut settings = match &self.backend {
            SettingsBackend::File(store) => {
                store.flush()?;
                config::load_from_file(store.path())?
            }
            SettingsBackend::Memory(store) => store.settings(),
        };
        config::apply_env_overrides(&mut settings)?;
        settings.validate()?;

        if let SettingsBackend::File(store) = &self.backend {
            store.replace(settings.clone());
        }

        let reconnect = needs_reconnect(&current, &settings);
        let snapshot =
            SettingsSnapshot { version: self.gateway.settings_version() + 1, settings };
        self.synchronizer.update_settings(snapshot);

        if reconnect {
            info!("Connection settings changed, reconnecting");
            self.start().await?;
        }
        Ok(reconnect)
    }

    /// Stop polling, invalidate in-flight work and write pending settings
    pub fn shutdown(&self) {
        self.synchronizer.shutdown();
        if let SettingsBackend::File(store) = &self.backend {
            if let Err(err) = store.flush() {
                warn!(error = %err, "Failed to write settings on shutdown");
            }
        }
    }
}

fn needs_reconnect(before: &Settings, after: &Settings) -> bool {
    before.token() != after.token()
        || before.workspace != after.workspace
        || before.polling != after.polling
}
