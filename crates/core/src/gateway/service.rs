//! Request gateway - the single choke point for provider calls
//!
//! Every remote operation goes through [`RequestGateway::execute`], which
//! consults the hourly quota limiter before touching the transport and
//! records provider cooldowns from failures afterwards.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, NaiveDate, Utc};
use parking_lot::RwLock;
use tickbridge_common::resilience::{
    Clock, HourlyQuotaLimiter, QuotaConfig, QuotaUsage, SerialQueue, SystemClock,
};
use tickbridge_domain::constants::{CREATED_WITH, RECENT_ENTRIES_DAYS};
use tickbridge_domain::{
    Client, DetailedReportItem, NewTimeEntry, Notice, Project, ProjectSummaryItem, ReportOptions,
    Result, Settings, SettingsSnapshot, StartTimeEntry, SummaryGroup, Tag, TickbridgeError,
    TimeChart, TimeEntry, Workspace, WorkspaceRef,
};
use tracing::{debug, error, info, instrument, warn};

use super::cooldown::{FailureKind, cooldown_hint};
use super::ports::{ConnectivityProbe, DetailLayout, TrackingTransport, TransportFactory};
use crate::notification_ports::NotificationSink;
use crate::settings_ports::SettingsStore;

/// Clock handle shared by the gateway, its limiter and the synchronizer
pub type SharedClock = Arc<dyn Clock>;

/// Notice text for a locally refused request
pub fn quota_exceeded_message(wait: Duration) -> String {
    let minutes = wait.as_millis().div_ceil(60_000);
    let estimate =
        if minutes > 0 { format!("{minutes}m") } else { "under a minute".to_string() };
    format!("Toggl hourly quota exceeded. Remaining window resets in {estimate}.")
}

fn quota_config(settings: &Settings) -> QuotaConfig {
    QuotaConfig { enabled: settings.rate_limit_enabled, cap: settings.effective_cap() }
}

/// Builder for [`RequestGateway`]
#[derive(Default)]
pub struct RequestGatewayBuilder {
    settings: Option<SettingsSnapshot>,
    factory: Option<Arc<dyn TransportFactory>>,
    probe: Option<Arc<dyn ConnectivityProbe>>,
    notifier: Option<Arc<dyn NotificationSink>>,
    settings_store: Option<Arc<dyn SettingsStore>>,
    clock: Option<SharedClock>,
}

impl RequestGatewayBuilder {
    pub fn settings(mut self, snapshot: SettingsSnapshot) -> Self {
        self.settings = Some(snapshot);
        self
    }

    pub fn transport_factory(mut self, factory: Arc<dyn TransportFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn probe(mut self, probe: Arc<dyn ConnectivityProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn settings_store(mut self, store: Arc<dyn SettingsStore>) -> Self {
        self.settings_store = Some(store);
        self
    }

    /// Defaults to the system clock
    pub fn clock(mut self, clock: SharedClock) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<RequestGateway> {
        let missing = |what: &str| TickbridgeError::Config(format!("gateway requires {what}"));
        let snapshot = self.settings.ok_or_else(|| missing("settings"))?;
        let factory = self.factory.ok_or_else(|| missing("a transport factory"))?;
        let probe = self.probe.ok_or_else(|| missing("a connectivity probe"))?;
        let notifier = self.notifier.ok_or_else(|| missing("a notification sink"))?;
        let settings_store = self.settings_store.ok_or_else(|| missing("a settings store"))?;
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        let settings = &snapshot.settings;
        let limiter = HourlyQuotaLimiter::restore(
            quota_config(settings),
            settings.used_this_hour,
            settings.hour_window_start,
            Arc::clone(&clock),
        );
        {
            let store = Arc::clone(&settings_store);
            limiter.set_listener(Arc::new(move |window| {
                if let Err(err) = store.persist_quota(window) {
                    warn!(error = %err, "Failed to persist quota usage");
                }
            }));
        }

        Ok(RequestGateway {
            settings: RwLock::new(snapshot),
            limiter,
            clock,
            factory,
            probe,
            notifier,
            settings_store,
            transport: RwLock::new(None),
            report_queue: SerialQueue::named("detailed-report"),
        })
    }
}

/// A transport whose token passed verification but is not yet in use
pub struct VerifiedConnection {
    transport: Arc<dyn TrackingTransport>,
    workspaces: Vec<Workspace>,
}

impl VerifiedConnection {
    pub fn workspaces(&self) -> &[Workspace] {
        &self.workspaces
    }
}

impl std::fmt::Debug for VerifiedConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerifiedConnection").field("workspaces", &self.workspaces).finish()
    }
}

/// Rate-limited facade over the tracking transport
pub struct RequestGateway {
    settings: RwLock<SettingsSnapshot>,
    limiter: HourlyQuotaLimiter<SharedClock>,
    clock: SharedClock,
    factory: Arc<dyn TransportFactory>,
    probe: Arc<dyn ConnectivityProbe>,
    notifier: Arc<dyn NotificationSink>,
    settings_store: Arc<dyn SettingsStore>,
    transport: RwLock<Option<Arc<dyn TrackingTransport>>>,
    report_queue: SerialQueue,
}

impl RequestGateway {
    pub fn builder() -> RequestGatewayBuilder {
        RequestGatewayBuilder::default()
    }

    // ---------------------------------------------------------------------
    // Settings
    // ---------------------------------------------------------------------

    /// Current settings
    pub fn settings(&self) -> Settings {
        self.settings.read().settings.clone()
    }

    pub fn settings_version(&self) -> u64 {
        self.settings.read().version
    }

    /// Apply a newer snapshot; older or equal versions are ignored
    pub fn update_settings(&self, snapshot: SettingsSnapshot) -> bool {
        let config = quota_config(&snapshot.settings);
        {
            let mut current = self.settings.write();
            if !snapshot.is_newer_than(current.version) {
                debug!(
                    current = current.version,
                    offered = snapshot.version,
                    "Ignoring stale settings snapshot"
                );
                return false;
            }
            *current = snapshot;
        }
        self.limiter.reconfigure(config);
        true
    }

    /// Record and persist an automatically chosen workspace
    pub fn select_workspace(&self, workspace: WorkspaceRef) -> Result<()> {
        self.settings.write().settings.workspace = workspace.clone();
        self.settings_store.persist_workspace(&workspace)
    }

    pub fn workspace(&self) -> WorkspaceRef {
        self.settings.read().settings.workspace.clone()
    }

    fn workspace_id(&self) -> Result<u64> {
        self.workspace()
            .numeric_id()
            .ok_or_else(|| TickbridgeError::InvalidInput("no Toggl workspace selected".into()))
    }

    // ---------------------------------------------------------------------
    // Quota
    // ---------------------------------------------------------------------

    pub fn quota_usage(&self) -> QuotaUsage {
        self.limiter.usage()
    }

    pub fn is_rate_limit_enabled(&self) -> bool {
        self.limiter.is_enabled()
    }

    /// Start a fresh quota window now
    pub fn reset_quota(&self) {
        self.limiter.reset();
    }

    pub fn now(&self) -> DateTime<Utc> {
        let millis = i64::try_from(self.clock.millis_since_epoch()).unwrap_or(i64::MAX);
        DateTime::from_timestamp_millis(millis).unwrap_or_default()
    }

    /// Today's date in the local time zone
    pub fn today(&self) -> NaiveDate {
        self.now().with_timezone(&Local).date_naive()
    }

    // ---------------------------------------------------------------------
    // Execution
    // ---------------------------------------------------------------------

    fn transport(&self) -> Result<Arc<dyn TrackingTransport>> {
        self.transport.read().clone().ok_or(TickbridgeError::NoToken)
    }

    pub fn is_connected(&self) -> bool {
        self.transport.read().is_some()
    }

    /// Drop the current transport
    pub fn disconnect(&self) {
        *self.transport.write() = None;
    }

    /// Run `operation` against the connected transport under the quota
    pub async fn execute<T, F, Fut>(&self, name: &'static str, operation: F) -> Result<T>
    where
        F: FnOnce(Arc<dyn TrackingTransport>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let transport = self.transport()?;
        self.execute_with(transport, name, operation).await
    }

    #[instrument(skip(self, transport, operation), fields(operation = name))]
    async fn execute_with<T, F, Fut>(
        &self,
        transport: Arc<dyn TrackingTransport>,
        name: &'static str,
        operation: F,
    ) -> Result<T>
    where
        F: FnOnce(Arc<dyn TrackingTransport>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if !self.limiter.is_enabled() {
            return operation(transport).await;
        }

        if !self.limiter.try_consume(1) {
            let wait = self.limiter.blocked_for().unwrap_or_default();
            warn!(wait_secs = wait.as_secs(), "Request refused by local quota");
            self.notifier.notify(Notice::warning(quota_exceeded_message(wait)));
            return Err(TickbridgeError::RateLimitExceeded { resets_in_secs: wait.as_secs() });
        }

        match operation(transport).await {
            Ok(value) => Ok(value),
            Err(err) => {
                if let Some(seconds) = cooldown_hint(&err.to_string()) {
                    self.limiter.apply_temporary_suspension(seconds);
                    warn!(seconds, "Provider cooldown received");
                    self.notifier.notify(Notice::warning(format!(
                        "Toggl API rate limit hit. Pausing requests for {seconds}s."
                    )));
                }
                Err(err)
            }
        }
    }

    /// `execute` for reads: failures are logged, notified and wrapped
    async fn read<T, F, Fut>(&self, name: &'static str, operation: F) -> Result<T>
    where
        F: FnOnce(Arc<dyn TrackingTransport>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.execute(name, operation).await.map_err(|err| self.read_failure(name, &err))
    }

    fn read_failure(&self, name: &'static str, err: &TickbridgeError) -> TickbridgeError {
        let kind = FailureKind::of(err);
        error!(operation = name, error = %err, ?kind, "Toggl API read failed");
        // Quota refusals already produced their own notice.
        if kind != FailureKind::RateLimitExceeded {
            self.notifier
                .notify(Notice::error(format!("Error communicating with Toggl API: {err}")));
        }
        TickbridgeError::transient(name, err)
    }

    // ---------------------------------------------------------------------
    // Connection
    // ---------------------------------------------------------------------

    /// Verify `token` and start using it
    ///
    /// Callers that may be overtaken by a newer connection attempt should use
    /// [`verify`](Self::verify) and [`install`](Self::install) instead.
    pub async fn connect(&self, token: &str) -> Result<Vec<Workspace>> {
        self.disconnect();
        let verified = self.verify(token).await?;
        Ok(self.install(verified))
    }

    /// Bind a transport to `token` and check it by listing workspaces
    ///
    /// The transport is returned rather than installed. On failure a direct
    /// identity probe tells a bad token apart from a broken client. The probe
    /// never replaces the transport: a reachable provider still yields
    /// [`TickbridgeError::TransportUnavailable`].
    #[instrument(skip_all)]
    pub async fn verify(&self, token: &str) -> Result<VerifiedConnection> {
        let transport = self.factory.create(token)?;

        let primary = self
            .execute_with(Arc::clone(&transport), "workspaces", |t| async move {
                t.workspaces().await
            })
            .await;

        match primary {
            Ok(workspaces) => {
                info!(workspaces = workspaces.len(), "Toggl API token verified");
                Ok(VerifiedConnection { transport, workspaces })
            }
            Err(primary) => {
                error!(error = %primary, "Primary client connection failed");
                match self.probe.probe(token).await {
                    Ok(()) => {
                        info!("Fallback identity probe succeeded; client check failed");
                        Err(TickbridgeError::TransportUnavailable(primary.to_string()))
                    }
                    Err(fallback) => {
                        error!(error = %fallback, "Fallback identity probe failed");
                        Err(TickbridgeError::ConnectionFailed(format!(
                            "{primary}; fallback: {fallback}"
                        )))
                    }
                }
            }
        }
    }

    /// Route all further requests through a verified transport
    pub fn install(&self, connection: VerifiedConnection) -> Vec<Workspace> {
        *self.transport.write() = Some(connection.transport);
        info!("Connected to Toggl API");
        connection.workspaces
    }

    // ---------------------------------------------------------------------
    // Reads
    // ---------------------------------------------------------------------

    pub async fn workspaces(&self) -> Result<Vec<Workspace>> {
        self.read("workspaces", |t| async move { t.workspaces().await }).await
    }

    pub async fn clients(&self) -> Result<Vec<Client>> {
        let workspace_id = self.workspace_id()?;
        self.read("clients", |t| async move { t.clients(workspace_id).await }).await
    }

    pub async fn projects(&self) -> Result<Vec<Project>> {
        let workspace_id = self.workspace_id()?;
        self.read("projects", |t| async move { t.projects(workspace_id).await }).await
    }

    pub async fn tags(&self) -> Result<Vec<Tag>> {
        let workspace_id = self.workspace_id()?;
        self.read("tags", |t| async move { t.tags(workspace_id).await }).await
    }

    /// The running timer; failures propagate for the poll loop to classify
    pub async fn current_timer(&self) -> Result<Option<TimeEntry>> {
        self.execute("current timer", |t| async move { t.current_time_entry().await }).await
    }

    /// Detailed rows of the last nine days that contain entries, newest first
    pub async fn recent_time_entries(&self) -> Result<Vec<DetailedReportItem>> {
        let workspace_id = self.workspace_id()?;
        let today = self.today();
        let options =
            ReportOptions::between(today - chrono::Duration::days(RECENT_ENTRIES_DAYS), today);
        let layout = DetailLayout { grouped: false, newest_first: true };

        let items = self
            .read("recent time entries", |t| async move {
                t.detailed_report(workspace_id, &options, layout).await
            })
            .await?;
        Ok(items.into_iter().filter(|item| !item.time_entries.is_empty()).collect())
    }

    /// Per-project totals for today
    pub async fn daily_summary(&self) -> Result<Vec<ProjectSummaryItem>> {
        let workspace_id = self.workspace_id()?;
        let today = self.today();
        self.read("daily summary", |t| async move { t.projects_summary(workspace_id, today).await })
            .await
    }

    pub async fn summary(&self, options: &ReportOptions) -> Result<Vec<SummaryGroup>> {
        let workspace_id = self.workspace_id()?;
        self.read("summary", |t| async move { t.summary(workspace_id, options).await }).await
    }

    pub async fn summary_time_chart(&self, options: &ReportOptions) -> Result<TimeChart> {
        let workspace_id = self.workspace_id()?;
        self.read("summary time chart", |t| async move { t.totals(workspace_id, options).await })
            .await
    }

    /// Grouped detailed report, at most one in flight at a time
    pub async fn detailed_report(
        &self,
        options: &ReportOptions,
    ) -> Result<Vec<DetailedReportItem>> {
        let workspace_id = self.workspace_id()?;
        let layout = DetailLayout { grouped: true, newest_first: false };
        self.report_queue
            .run(|| {
                self.read("detailed report", |t| async move {
                    t.detailed_report(workspace_id, options, layout).await
                })
            })
            .await
            .map_err(|err| TickbridgeError::Internal(err.to_string()))?
    }

    // ---------------------------------------------------------------------
    // Writes
    // ---------------------------------------------------------------------

    /// Start a timer in the configured workspace; failures propagate
    pub async fn start_timer(&self, entry: NewTimeEntry) -> Result<TimeEntry> {
        let workspace_id = self.workspace_id()?;
        let request = StartTimeEntry::new(entry, CREATED_WITH, self.now(), workspace_id);
        self.execute("start timer", |t| async move { t.start_time_entry(&request).await }).await
    }

    /// Stop `entry`; failures propagate
    pub async fn stop_timer(&self, entry: &TimeEntry) -> Result<TimeEntry> {
        let (workspace_id, entry_id) = (entry.workspace_id, entry.id);
        self.execute("stop timer", |t| async move {
            t.stop_time_entry(workspace_id, entry_id).await
        })
        .await
    }
}
