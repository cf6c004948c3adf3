use std::time::Duration;

use reqwest::{Client as ReqwestClient, Method, Request, RequestBuilder, Response, StatusCode};
use tickbridge_domain::{Result, TickbridgeError};
use tracing::{debug, warn};

use crate::errors::InfraError;

/// When and how often a request is repeated
///
/// Only safe methods get more than one attempt. Writes and report queries
/// are sent exactly once so a failure never starts a second timer or spends
/// quota twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts for safe methods, initial try included
    pub max_attempts: usize,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn attempts_for(&self, method: &Method) -> usize {
        if method.is_safe() {
            self.max_attempts.max(1)
        } else {
            1
        }
    }

    /// Delay before retry number `retry` (1-based), doubling up to the cap
    pub fn delay(&self, retry: usize) -> Duration {
        let shift = retry.saturating_sub(1).min(16) as u32;
        self.base_backoff.saturating_mul(1u32 << shift).min(self.max_backoff)
    }
}

/// reqwest client with a timeout and retries for safe requests
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    retry: RetryPolicy,
}

impl HttpClient {
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Execute `builder`, retrying server errors and connection failures
    ///
    /// Any response that arrives is returned, whatever its status; the last
    /// server error is returned when attempts run out.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let request = builder.build().map_err(InfraError::from)?;
        let attempts = self.retry.attempts_for(request.method());

        let mut attempt = 1;
        loop {
            let outcome = self.execute_once(&request, attempt).await?;
            let retryable = match &outcome {
                Ok(response) => is_retryable_status(response.status()),
                Err(err) => is_retryable_error(err),
            };

            if !retryable || attempt >= attempts {
                return outcome.map_err(|err| InfraError::from(err).into());
            }

            let delay = self.retry.delay(attempt);
            warn!(
                attempt,
                attempts,
                delay_ms = delay.as_millis() as u64,
                url = %request.url(),
                "Retrying HTTP request"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    async fn execute_once(
        &self,
        request: &Request,
        attempt: usize,
    ) -> Result<std::result::Result<Response, reqwest::Error>> {
        let request = request.try_clone().ok_or_else(|| {
            TickbridgeError::Internal("streaming request bodies are not supported".into())
        })?;
        let (method, url) = (request.method().clone(), request.url().clone());
        debug!(attempt, %method, %url, "Sending HTTP request");

        let outcome = self.client.execute(request).await;
        match &outcome {
            Ok(response) => {
                debug!(attempt, %method, %url, status = %response.status(), "HTTP response")
            }
            Err(err) => debug!(attempt, %method, %url, error = %err, "HTTP request failed"),
        }
        Ok(outcome)
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error()
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

/// Builder for [`HttpClient`]
#[derive(Debug, Default)]
pub struct HttpClientBuilder {
    timeout: Option<Duration>,
    retry: RetryPolicy,
    user_agent: Option<String>,
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Total attempts for safe methods, initial try included
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.retry.max_attempts = attempts.max(1);
        self
    }

    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.retry.base_backoff = backoff;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn build(self) -> Result<HttpClient> {
        let mut builder =
            ReqwestClient::builder().timeout(self.timeout.unwrap_or(Duration::from_secs(30)));
        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        let client = builder.build().map_err(InfraError::from)?;
        Ok(HttpClient { client, retry: self.retry })
    }
}
