//! Toggl Track API client
//!
//! Implements the core `TrackingTransport` port over the v9 REST API and the
//! Reports v3 API. Authentication is HTTP basic with the API token as user
//! name and the literal `api_token` as password.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::HeaderMap;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tickbridge_core::{DetailLayout, TrackingTransport};
use tickbridge_domain::{
    ApiSettings, Client, DetailedReportItem, Project, ProjectSummaryItem, ReportOptions, Result,
    StartTimeEntry, SummaryGroup, Tag, TickbridgeError, TimeChart, TimeEntry, Workspace,
};
use tracing::{debug, instrument};
use url::Url;

use super::errors::ApiError;
use crate::http::HttpClient;

const NEXT_ID_HEADER: &str = "X-Next-ID";
const NEXT_ROW_HEADER: &str = "X-Next-Row-Number";

/// Upper bound on detailed report pages fetched for one request
const MAX_REPORT_PAGES: usize = 500;

/// Connection options for [`TogglClient`]
#[derive(Debug, Clone)]
pub struct TogglClientConfig {
    /// Scheme and host, e.g. `https://api.track.toggl.com`
    pub base_url: String,
    pub timeout: Duration,
    /// Attempts for safe requests; writes always get one
    pub max_attempts: usize,
    pub user_agent: String,
    /// Rows per detailed report page
    pub page_size: u32,
}

impl Default for TogglClientConfig {
    fn default() -> Self {
        Self::from(&ApiSettings::default())
    }
}

impl From<&ApiSettings> for TogglClientConfig {
    fn from(api: &ApiSettings) -> Self {
        Self {
            base_url: api.base_url.clone(),
            timeout: Duration::from_secs(api.timeout_secs),
            max_attempts: api.max_attempts as usize,
            user_agent: api.user_agent.clone(),
            page_size: 50,
        }
    }
}

impl TogglClientConfig {
    pub(crate) fn base(&self) -> Result<Url> {
        Url::parse(&self.base_url).map_err(|err| {
            TickbridgeError::Config(format!("invalid API base URL '{}': {err}", self.base_url))
        })
    }

    pub(crate) fn http_client(&self) -> Result<HttpClient> {
        HttpClient::builder()
            .timeout(self.timeout)
            .max_attempts(self.max_attempts)
            .user_agent(self.user_agent.clone())
            .build()
    }
}

// ---------------------------------------------------------------------------
// Wire bodies
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ProjectsSummaryBody {
    start_date: NaiveDate,
}

#[derive(Serialize)]
struct SummaryBody<'a> {
    #[serde(flatten)]
    options: &'a ReportOptions,
    collapse: bool,
    grouping: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sub_grouping: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    with_graph: Option<bool>,
}

#[derive(Deserialize)]
struct SummaryResponse {
    #[serde(default)]
    groups: Option<Vec<SummaryGroup>>,
}

#[derive(Serialize)]
struct DetailedBody<'a> {
    #[serde(flatten)]
    options: &'a ReportOptions,
    grouped: bool,
    order_by: &'static str,
    order_dir: &'static str,
    page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    first_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    first_row_number: Option<u64>,
}

/// Cursor for the next detailed report page, if the response announced one
fn next_page(headers: &HeaderMap) -> Option<(u64, u64)> {
    let read = |name: &str| {
        headers.get(name).and_then(|value| value.to_str().ok()).and_then(|s| s.trim().parse().ok())
    };
    Some((read(NEXT_ID_HEADER)?, read(NEXT_ROW_HEADER)?))
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Authenticated Toggl Track client bound to one API token
pub struct TogglClient {
    http: HttpClient,
    base: Url,
    token: String,
    page_size: u32,
}

impl TogglClient {
    pub fn new(token: impl Into<String>, config: &TogglClientConfig) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(TickbridgeError::NoToken);
        }
        Ok(Self {
            http: config.http_client()?,
            base: config.base()?,
            token,
            page_size: config.page_size.max(1),
        })
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|err| TickbridgeError::Internal(format!("invalid API path '{path}': {err}")))
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
        Ok(self
            .http
            .request(method, self.url(path)?)
            .basic_auth(&self.token, Some("api_token"))
            .header(reqwest::header::ACCEPT, "application/json"))
    }

    async fn dispatch(&self, builder: RequestBuilder) -> Result<Response> {
        let response = self.http.send(builder).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(status, body).into())
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
        response.json().await.map_err(|err| ApiError::Decode(err.to_string()).into())
    }

    #[instrument(skip(self), fields(path = %path))]
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.dispatch(self.request(Method::GET, path)?).await?;
        debug!("GET request successful");
        Self::decode(response).await
    }

    #[instrument(skip(self, body), fields(path = %path))]
    async fn post<B, T>(&self, path: &str, body: &B) -> Result<(T, HeaderMap)>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.dispatch(self.request(Method::POST, path)?.json(body)).await?;
        debug!("POST request successful");
        let headers = response.headers().clone();
        Ok((Self::decode(response).await?, headers))
    }

    #[instrument(skip(self), fields(path = %path))]
    async fn patch<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.dispatch(self.request(Method::PATCH, path)?).await?;
        debug!("PATCH request successful");
        Self::decode(response).await
    }
}

#[async_trait]
impl TrackingTransport for TogglClient {
    async fn workspaces(&self) -> Result<Vec<Workspace>> {
        self.get("/api/v9/me/workspaces").await
    }

    async fn clients(&self, workspace_id: u64) -> Result<Vec<Client>> {
        // The provider answers `null` for a workspace without clients
        let clients: Option<Vec<Client>> =
            self.get(&format!("/api/v9/workspaces/{workspace_id}/clients")).await?;
        Ok(clients.unwrap_or_default())
    }

    async fn projects(&self, workspace_id: u64) -> Result<Vec<Project>> {
        let projects: Option<Vec<Project>> =
            self.get(&format!("/api/v9/workspaces/{workspace_id}/projects?active=both")).await?;
        Ok(projects.unwrap_or_default())
    }

    async fn tags(&self, workspace_id: u64) -> Result<Vec<Tag>> {
        let tags: Option<Vec<Tag>> =
            self.get(&format!("/api/v9/workspaces/{workspace_id}/tags")).await?;
        Ok(tags.unwrap_or_default())
    }

    async fn current_time_entry(&self) -> Result<Option<TimeEntry>> {
        self.get("/api/v9/me/time_entries/current").await
    }

    async fn start_time_entry(&self, request: &StartTimeEntry) -> Result<TimeEntry> {
        let path = format!("/api/v9/workspaces/{}/time_entries", request.workspace_id);
        let (entry, _) = self.post(&path, request).await?;
        Ok(entry)
    }

    async fn stop_time_entry(&self, workspace_id: u64, entry_id: u64) -> Result<TimeEntry> {
        self.patch(&format!("/api/v9/workspaces/{workspace_id}/time_entries/{entry_id}/stop"))
            .await
    }

    async fn projects_summary(
        &self,
        workspace_id: u64,
        start_date: NaiveDate,
    ) -> Result<Vec<ProjectSummaryItem>> {
        let path = format!("/reports/api/v3/workspace/{workspace_id}/projects/summary");
        let (items, _): (Option<Vec<ProjectSummaryItem>>, _) =
            self.post(&path, &ProjectsSummaryBody { start_date }).await?;
        Ok(items.unwrap_or_default())
    }

    async fn summary(
        &self,
        workspace_id: u64,
        options: &ReportOptions,
    ) -> Result<Vec<SummaryGroup>> {
        let path = format!("/reports/api/v3/workspace/{workspace_id}/summary/time_entries");
        let body = SummaryBody {
            options,
            collapse: true,
            grouping: "projects",
            sub_grouping: Some("time_entries"),
            with_graph: None,
        };
        let (response, _): (SummaryResponse, _) = self.post(&path, &body).await?;
        Ok(response.groups.unwrap_or_default())
    }

    async fn totals(&self, workspace_id: u64, options: &ReportOptions) -> Result<TimeChart> {
        let path = format!("/reports/api/v3/workspace/{workspace_id}/summary/time_entries/totals");
        let body = SummaryBody {
            options,
            collapse: true,
            grouping: "projects",
            sub_grouping: None,
            with_graph: Some(true),
        };
        let (chart, _) = self.post(&path, &body).await?;
        Ok(chart)
    }

    async fn detailed_report(
        &self,
        workspace_id: u64,
        options: &ReportOptions,
        layout: DetailLayout,
    ) -> Result<Vec<DetailedReportItem>> {
        let path = format!("/reports/api/v3/workspace/{workspace_id}/search/time_entries");
        let mut items = Vec::new();
        let mut cursor = None;

        for page in 1..=MAX_REPORT_PAGES {
            let body = DetailedBody {
                options,
                grouped: layout.grouped,
                order_by: "date",
                order_dir: if layout.newest_first { "desc" } else { "asc" },
                page_size: self.page_size,
                first_id: cursor.map(|(id, _)| id),
                first_row_number: cursor.map(|(_, row)| row),
            };
            let (rows, headers): (Option<Vec<DetailedReportItem>>, _) =
                self.post(&path, &body).await?;
            items.extend(rows.unwrap_or_default());

            cursor = next_page(&headers);
            if cursor.is_none() {
                debug!(pages = page, rows = items.len(), "Detailed report complete");
                return Ok(items);
            }
        }

        Err(TickbridgeError::Internal(format!(
            "detailed report exceeded {MAX_REPORT_PAGES} pages"
        )))
    }
}

#[cfg(test)]
mod tests {
    use reqwest::header::HeaderValue;

    use super::*;

    #[test]
    fn test_next_page_needs_both_headers() {
        let mut headers = HeaderMap::new();
        assert_eq!(next_page(&headers), None);

        headers.insert(NEXT_ID_HEADER, HeaderValue::from_static("812"));
        assert_eq!(next_page(&headers), None);

        headers.insert(NEXT_ROW_HEADER, HeaderValue::from_static("51"));
        assert_eq!(next_page(&headers), Some((812, 51)));
    }

    #[test]
    fn test_summary_body_flattens_options() {
        let mut options = ReportOptions::between(
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 7).unwrap(),
        );
        options.project_ids = Some(vec![10]);
        let body = SummaryBody {
            options: &options,
            collapse: true,
            grouping: "projects",
            sub_grouping: Some("time_entries"),
            with_graph: None,
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["start_date"], "2024-05-01");
        assert_eq!(json["project_ids"], serde_json::json!([10]));
        assert_eq!(json["sub_grouping"], "time_entries");
        assert!(json.get("client_ids").is_none());
        assert!(json.get("with_graph").is_none());
    }

    #[test]
    fn test_blank_token_is_rejected() {
        let result = TogglClient::new("  ", &TogglClientConfig::default());
        assert!(matches!(result, Err(TickbridgeError::NoToken)));
    }
}
