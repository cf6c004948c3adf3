use std::sync::Arc;

use tickbridge_core::{TrackingTransport, TransportFactory};
use tickbridge_domain::Result;
use tracing::debug;

use super::client::{TogglClient, TogglClientConfig};

/// Builds a [`TogglClient`] for each token the gateway connects with
#[derive(Debug, Clone, Default)]
pub struct TogglTransportFactory {
    config: TogglClientConfig,
}

impl TogglTransportFactory {
    pub fn new(config: TogglClientConfig) -> Self {
        Self { config }
    }
}

impl TransportFactory for TogglTransportFactory {
    fn create(&self, token: &str) -> Result<Arc<dyn TrackingTransport>> {
        debug!(base_url = %self.config.base_url, "Creating Toggl client");
        Ok(Arc::new(TogglClient::new(token, &self.config)?))
    }
}
