//! Identity endpoint probe used when the primary client cannot connect

use async_trait::async_trait;
use reqwest::Method;
use tickbridge_core::ConnectivityProbe;
use tickbridge_domain::{Result, TickbridgeError};
use tracing::{info, warn};
use url::Url;

use super::client::TogglClientConfig;
use super::errors::ApiError;
use crate::http::HttpClient;

const IDENTITY_PATH: &str = "/api/v9/me";

/// Plain `GET /api/v9/me` with the token, bypassing the transport stack
pub struct IdentityProbe {
    http: HttpClient,
    url: Url,
}

impl IdentityProbe {
    pub fn new(config: &TogglClientConfig) -> Result<Self> {
        let url = config.base()?.join(IDENTITY_PATH).map_err(|err| {
            TickbridgeError::Config(format!("invalid identity endpoint URL: {err}"))
        })?;
        // One attempt; the probe only answers "reachable or not"
        let http = HttpClient::builder()
            .timeout(config.timeout)
            .max_attempts(1)
            .user_agent(format!("{} (probe)", config.user_agent))
            .build()?;
        Ok(Self { http, url })
    }
}

#[async_trait]
impl ConnectivityProbe for IdentityProbe {
    async fn probe(&self, token: &str) -> Result<()> {
        let request = self
            .http
            .request(Method::GET, self.url.clone())
            .basic_auth(token, Some("api_token"))
            .header(reqwest::header::ACCEPT, "application/json");

        let response = self.http.send(request).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "Identity probe rejected");
            return Err(ApiError::from_status(status, body).into());
        }

        let has_workspaces = response
            .json::<serde_json::Value>()
            .await
            .map(|body| body.get("workspaces").is_some_and(serde_json::Value::is_array))
            .unwrap_or(false);
        if !has_workspaces {
            warn!("Identity response did not list workspaces");
        }
        info!("Identity probe succeeded");
        Ok(())
    }
}
