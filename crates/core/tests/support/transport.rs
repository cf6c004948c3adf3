//! Scriptable transport, factory and probe

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use tickbridge_core::{ConnectivityProbe, DetailLayout, TrackingTransport, TransportFactory};
use tickbridge_domain::{
    Client, DetailedReportItem, Project, ProjectSummaryItem, ReportOptions, Result,
    StartTimeEntry, SummaryGroup, Tag, TickbridgeError, TimeChart, TimeChartResolution,
    TimeEntry, Workspace,
};
use tokio::sync::Notify;

/// In-memory provider with per-operation failure injection
///
/// Operation names match the trait methods (`"workspaces"`,
/// `"current_time_entry"`, ...). An injected failure stays until cleared.
#[derive(Default)]
pub struct MockTransport {
    pub workspaces: Mutex<Vec<Workspace>>,
    pub projects: Mutex<Vec<Project>>,
    pub clients: Mutex<Vec<Client>>,
    pub tags: Mutex<Vec<Tag>>,
    pub current: Mutex<Option<TimeEntry>>,
    pub daily: Mutex<Vec<ProjectSummaryItem>>,
    pub summary_groups: Mutex<Vec<SummaryGroup>>,
    pub totals: Mutex<Option<TimeChart>>,
    pub detailed: Mutex<Vec<DetailedReportItem>>,
    pub started: Mutex<Vec<StartTimeEntry>>,
    pub report_options: Mutex<Vec<ReportOptions>>,
    pub layouts: Mutex<Vec<DetailLayout>>,
    pub summary_dates: Mutex<Vec<NaiveDate>>,
    failures: Mutex<HashMap<&'static str, TickbridgeError>>,
    calls: Mutex<Vec<&'static str>>,
    hold: Mutex<HashMap<&'static str, Arc<Notify>>>,
}

impl MockTransport {
    pub fn with_workspaces(self, workspaces: Vec<Workspace>) -> Self {
        *self.workspaces.lock() = workspaces;
        self
    }

    pub fn set_current(&self, entry: Option<TimeEntry>) {
        *self.current.lock() = entry;
    }

    pub fn fail(&self, operation: &'static str, err: TickbridgeError) {
        self.failures.lock().insert(operation, err);
    }

    pub fn clear_failure(&self, operation: &'static str) {
        self.failures.lock().remove(operation);
    }

    /// Block `operation` until the returned handle is notified
    pub fn hold(&self, operation: &'static str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.hold.lock().insert(operation, Arc::clone(&gate));
        gate
    }

    pub fn calls(&self, operation: &str) -> usize {
        self.calls.lock().iter().filter(|call| **call == operation).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().len()
    }

    async fn enter(&self, operation: &'static str) -> Result<()> {
        self.calls.lock().push(operation);
        let gate = self.hold.lock().remove(operation);
        if let Some(gate) = gate {
            gate.notified().await;
        }
        match self.failures.lock().get(operation) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl TrackingTransport for MockTransport {
    async fn workspaces(&self) -> Result<Vec<Workspace>> {
        self.enter("workspaces").await?;
        Ok(self.workspaces.lock().clone())
    }

    async fn clients(&self, _workspace_id: u64) -> Result<Vec<Client>> {
        self.enter("clients").await?;
        Ok(self.clients.lock().clone())
    }

    async fn projects(&self, _workspace_id: u64) -> Result<Vec<Project>> {
        self.enter("projects").await?;
        Ok(self.projects.lock().clone())
    }

    async fn tags(&self, _workspace_id: u64) -> Result<Vec<Tag>> {
        self.enter("tags").await?;
        Ok(self.tags.lock().clone())
    }

    async fn current_time_entry(&self) -> Result<Option<TimeEntry>> {
        self.enter("current_time_entry").await?;
        Ok(self.current.lock().clone())
    }

    async fn start_time_entry(&self, request: &StartTimeEntry) -> Result<TimeEntry> {
        self.enter("start_time_entry").await?;
        self.started.lock().push(request.clone());
        let entry = TimeEntry {
            id: 5000 + self.started.lock().len() as u64,
            workspace_id: request.workspace_id,
            project_id: request.entry.project_id,
            description: request.entry.description.clone(),
            start: request.start,
            stop: None,
            duration: request.duration,
            tag_ids: request.entry.tag_ids.clone(),
            billable: request.entry.billable,
        };
        *self.current.lock() = Some(entry.clone());
        Ok(entry)
    }

    async fn stop_time_entry(&self, _workspace_id: u64, entry_id: u64) -> Result<TimeEntry> {
        self.enter("stop_time_entry").await?;
        let mut current = self.current.lock();
        match current.take() {
            Some(mut entry) if entry.id == entry_id => {
                entry.stop = Some(entry.start + chrono::Duration::seconds(600));
                entry.duration = 600;
                Ok(entry)
            }
            other => {
                *current = other;
                Err(TickbridgeError::NotFound(format!("time entry {entry_id}")))
            }
        }
    }

    async fn projects_summary(
        &self,
        _workspace_id: u64,
        start_date: NaiveDate,
    ) -> Result<Vec<ProjectSummaryItem>> {
        self.enter("projects_summary").await?;
        self.summary_dates.lock().push(start_date);
        Ok(self.daily.lock().clone())
    }

    async fn summary(
        &self,
        _workspace_id: u64,
        options: &ReportOptions,
    ) -> Result<Vec<SummaryGroup>> {
        self.enter("summary").await?;
        self.report_options.lock().push(options.clone());
        Ok(self.summary_groups.lock().clone())
    }

    async fn totals(&self, _workspace_id: u64, options: &ReportOptions) -> Result<TimeChart> {
        self.enter("totals").await?;
        self.report_options.lock().push(options.clone());
        Ok(self.totals.lock().clone().unwrap_or(TimeChart {
            seconds: 0,
            resolution: options.resolution.unwrap_or(TimeChartResolution::Day),
            graph: Vec::new(),
        }))
    }

    async fn detailed_report(
        &self,
        _workspace_id: u64,
        options: &ReportOptions,
        layout: DetailLayout,
    ) -> Result<Vec<DetailedReportItem>> {
        self.enter("detailed_report").await?;
        self.report_options.lock().push(options.clone());
        self.layouts.lock().push(layout);
        Ok(self.detailed.lock().clone())
    }
}

/// Hands out the shared [`MockTransport`] unless the token has its own route
pub struct MockFactory {
    transport: Arc<MockTransport>,
    routes: Mutex<HashMap<String, Arc<MockTransport>>>,
    pub tokens: Mutex<Vec<String>>,
}

impl MockFactory {
    pub fn new(transport: Arc<MockTransport>) -> Self {
        Self { transport, routes: Mutex::new(HashMap::new()), tokens: Mutex::new(Vec::new()) }
    }

    /// Serve `token` from a dedicated transport
    pub fn route(&self, token: &str, transport: Arc<MockTransport>) {
        self.routes.lock().insert(token.to_string(), transport);
    }
}

impl TransportFactory for MockFactory {
    fn create(&self, token: &str) -> Result<Arc<dyn TrackingTransport>> {
        self.tokens.lock().push(token.to_string());
        let routed = self.routes.lock().get(token).cloned();
        Ok(routed.unwrap_or_else(|| self.transport.clone()))
    }
}

/// Identity probe with a switchable outcome
#[derive(Default)]
pub struct MockProbe {
    reachable: AtomicBool,
    calls: AtomicUsize,
}

impl MockProbe {
    pub fn set_reachable(&self, reachable: bool) {
        self.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConnectivityProbe for MockProbe {
    async fn probe(&self, _token: &str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.reachable.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(TickbridgeError::Network("identity endpoint unreachable".to_string()))
        }
    }
}
