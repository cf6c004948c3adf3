//! Timer state synchronizer
//!
//! Owns the availability state machine and two periodic loops: one polls
//! the running timer, the other re-renders the status line. Observers follow
//! state through `watch` channels.
//!
//! Every connection attempt bumps a generation counter. Loops and spawned
//! fetches carry the generation they were started under and drop their
//! results once it is no longer current, so a request that was in flight
//! while the token changed never overwrites fresh state.

use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tickbridge_common::resilience::QuotaUsage;
use tickbridge_domain::{
    ApiStatus, DetailedReportItem, EnrichedDetailedItem, NewTimeEntry, Notice,
    ProjectSummaryItem, ReportQuery, Result, SettingsSnapshot, SummaryReport, TickbridgeError,
    TimeEntry, TimerTransition, Workspace, WorkspaceRef,
};
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

use super::scheduler::PeriodicTask;
use super::status_line::StatusLineView;
use crate::gateway::{RequestGateway, VerifiedConnection};
use crate::notification_ports::NotificationSink;
use crate::reference::ReferenceLookup;
use crate::reports::ReportService;

const RECONNECTING: &str = "Reconnecting to Toggl...";
const NO_TOKEN_NOTICE: &str = "No Toggl Track API token is set.";
const UNREACHABLE_NOTICE: &str = "The Toggl Track API is unreachable. Either the Toggl services \
                                  are down, or your API token is incorrect.";
const POLL_FAILED: &str = "Error updating active Toggl time entry. Retrying...";
const NO_WORKSPACES: &str = "Toggl: No workspaces found. Please check your account.";
const SELECT_WORKSPACE: &str = "Toggl: Please select a workspace in plugin settings.";
const PRELOAD_FAILED: &str = "Toggl: Failed to load workspace data. Check workspace settings.";
const START_FAILED: &str = "Failed to start Toggl timer. Please try again.";
const STOP_FAILED: &str = "Failed to stop Toggl timer. Please try again.";

/// Clears the in-flight flag when a timer action ends
struct ActionGuard<'a>(&'a AtomicBool);

impl<'a> ActionGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self(flag))
            .map_err(|_| TickbridgeError::ActionInProgress)
    }
}

impl Drop for ActionGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Keeps the local timer view in step with the provider
pub struct TimerSynchronizer {
    gateway: Arc<RequestGateway>,
    references: Arc<dyn ReferenceLookup>,
    reports: ReportService,
    notifier: Arc<dyn NotificationSink>,
    status_tx: watch::Sender<ApiStatus>,
    timer_tx: watch::Sender<Option<TimeEntry>>,
    summary_tx: watch::Sender<Vec<ProjectSummaryItem>>,
    status_line_tx: watch::Sender<String>,
    generation: AtomicU64,
    /// Serialises generation bumps against transport installs
    switch: Mutex<()>,
    action_in_flight: AtomicBool,
    connect_attempted: AtomicBool,
    loops: Mutex<Vec<PeriodicTask>>,
}

impl TimerSynchronizer {
    pub fn new(
        gateway: Arc<RequestGateway>,
        references: Arc<dyn ReferenceLookup>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Arc<Self> {
        let (status_tx, _) = watch::channel(ApiStatus::Untested);
        let (timer_tx, _) = watch::channel(None);
        let (summary_tx, _) = watch::channel(Vec::new());
        let (status_line_tx, _) = watch::channel(String::new());

        let synchronizer = Arc::new(Self {
            reports: ReportService::new(Arc::clone(&gateway), Arc::clone(&references)),
            gateway,
            references,
            notifier,
            status_tx,
            timer_tx,
            summary_tx,
            status_line_tx,
            generation: AtomicU64::new(0),
            switch: Mutex::new(()),
            action_in_flight: AtomicBool::new(false),
            connect_attempted: AtomicBool::new(false),
            loops: Mutex::new(Vec::new()),
        });
        synchronizer.refresh_status_line();
        synchronizer
    }

    // ---------------------------------------------------------------------
    // Observation
    // ---------------------------------------------------------------------

    pub fn status(&self) -> ApiStatus {
        *self.status_tx.borrow()
    }

    pub fn current_timer(&self) -> Option<TimeEntry> {
        self.timer_tx.borrow().clone()
    }

    pub fn daily_summary(&self) -> Vec<ProjectSummaryItem> {
        self.summary_tx.borrow().clone()
    }

    pub fn status_line(&self) -> String {
        self.status_line_tx.borrow().clone()
    }

    pub fn subscribe_status(&self) -> watch::Receiver<ApiStatus> {
        self.status_tx.subscribe()
    }

    pub fn subscribe_timer(&self) -> watch::Receiver<Option<TimeEntry>> {
        self.timer_tx.subscribe()
    }

    pub fn subscribe_daily_summary(&self) -> watch::Receiver<Vec<ProjectSummaryItem>> {
        self.summary_tx.subscribe()
    }

    pub fn subscribe_status_line(&self) -> watch::Receiver<String> {
        self.status_line_tx.subscribe()
    }

    pub fn quota_usage(&self) -> QuotaUsage {
        self.gateway.quota_usage()
    }

    pub fn gateway(&self) -> &Arc<RequestGateway> {
        &self.gateway
    }

    /// Whether the poll and status loops are scheduled
    pub fn loops_running(&self) -> bool {
        let loops = self.loops.lock();
        !loops.is_empty() && loops.iter().all(PeriodicTask::is_running)
    }

    // ---------------------------------------------------------------------
    // Settings
    // ---------------------------------------------------------------------

    /// Forward a newer settings snapshot to the gateway
    ///
    /// Loop intervals take effect on the next connection refresh.
    pub fn update_settings(&self, snapshot: SettingsSnapshot) -> bool {
        let applied = self.gateway.update_settings(snapshot);
        if applied {
            self.refresh_status_line();
        }
        applied
    }

    // ---------------------------------------------------------------------
    // Connection lifecycle
    // ---------------------------------------------------------------------

    fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn is_current(&self, generation: u64) -> bool {
        self.current_generation() == generation
    }

    fn ensure_current(&self, generation: u64) -> Result<()> {
        if self.is_current(generation) {
            Ok(())
        } else {
            debug!(generation, current = self.current_generation(), "Discarding stale result");
            Err(TickbridgeError::StaleGeneration)
        }
    }

    fn set_status(&self, status: ApiStatus) {
        let previous = self.status_tx.send_replace(status);
        if previous != status {
            info!(from = %previous, to = %status, "Toggl API status changed");
        }
        self.refresh_status_line();
    }

    fn notify(&self, notice: Notice) {
        self.notifier.notify(notice);
    }

    fn stop_loops(&self) {
        let stopped = std::mem::take(&mut *self.loops.lock());
        if !stopped.is_empty() {
            debug!(count = stopped.len(), "Stopping synchronizer loops");
        }
        for task in &stopped {
            task.cancel();
        }
    }

    /// Start a new generation; results of older ones are discarded from now on
    fn next_generation(&self) -> u64 {
        let _switch = self.switch.lock();
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// New generation with no transport installed
    fn begin_refresh(&self) -> u64 {
        let _switch = self.switch.lock();
        self.gateway.disconnect();
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Install a verified transport unless a newer refresh has started
    fn install_if_current(
        &self,
        generation: u64,
        connection: VerifiedConnection,
    ) -> Result<Vec<Workspace>> {
        let _switch = self.switch.lock();
        self.ensure_current(generation)?;
        Ok(self.gateway.install(connection))
    }

    /// Stop both loops and invalidate everything in flight
    pub fn shutdown(&self) {
        self.next_generation();
        self.stop_loops();
        info!("Timer synchronizer stopped");
    }

    /// Reconnect with `token` and restart polling
    ///
    /// Existing loops are always stopped first. On success the status is
    /// `Available`, reference data has been preloaded (partial failures are
    /// tolerated) and both loops run. On failure the loops stay stopped.
    #[instrument(skip_all)]
    pub async fn refresh_api_connection(self: &Arc<Self>, token: Option<&str>) -> Result<()> {
        let generation = self.begin_refresh();
        self.stop_loops();
        self.set_status(ApiStatus::Untested);

        if self.connect_attempted.swap(true, Ordering::SeqCst) {
            self.notify(Notice::info(RECONNECTING));
        }

        let Some(token) = token.map(str::trim).filter(|token| !token.is_empty()) else {
            warn!("No API token configured");
            self.set_status(ApiStatus::NoToken);
            self.notice_api_not_available();
            return Err(TickbridgeError::NoToken);
        };

        let connection = match self.gateway.verify(token).await {
            Ok(connection) => connection,
            Err(err) => {
                self.ensure_current(generation)?;
                error!(error = %err, "Cannot connect to Toggl API");
                self.set_status(ApiStatus::Unreachable);
                self.notice_api_not_available();
                return Err(err);
            }
        };
        let workspaces = self.install_if_current(generation, connection)?;
        self.set_status(ApiStatus::Available);

        self.auto_select_workspace(&workspaces);

        match self.preload_references(generation).await {
            Ok(()) => {}
            Err(TickbridgeError::StaleGeneration) => return Err(TickbridgeError::StaleGeneration),
            Err(err) => warn!(error = %err, "Continuing with partial reference data"),
        }
        self.ensure_current(generation)?;

        self.start_loops(generation);
        self.spawn_daily_summary(generation);
        Ok(())
    }

    fn auto_select_workspace(&self, workspaces: &[Workspace]) {
        if self.gateway.workspace().is_selected() {
            return;
        }
        match workspaces.first() {
            Some(first) => {
                let workspace = WorkspaceRef::new(first.id, first.name.clone());
                if let Err(err) = self.gateway.select_workspace(workspace) {
                    warn!(error = %err, "Failed to persist auto-selected workspace");
                }
                info!(workspace_id = first.id, name = %first.name, "Auto-selected workspace");
                self.notify(Notice::info(format!(
                    "Toggl: Auto-selected workspace \"{}\"",
                    first.name
                )));
            }
            None => {
                warn!("No workspaces available for this account");
                self.notify(Notice::warning(NO_WORKSPACES));
            }
        }
    }

    /// Load projects, tags and clients concurrently into the lookup
    async fn preload_references(&self, generation: u64) -> Result<()> {
        if !self.gateway.workspace().is_selected() {
            warn!("Workspace not configured; skipping reference preload");
            self.notify(Notice::warning(SELECT_WORKSPACE));
            return Ok(());
        }

        let (projects, tags, clients) =
            tokio::join!(self.gateway.projects(), self.gateway.tags(), self.gateway.clients());
        self.ensure_current(generation)?;

        let mut failed = Vec::new();
        match projects {
            Ok(projects) => self.references.replace_projects(projects),
            Err(_) => failed.push("projects".to_string()),
        }
        match tags {
            Ok(tags) => self.references.replace_tags(tags),
            Err(_) => failed.push("tags".to_string()),
        }
        match clients {
            Ok(clients) => self.references.replace_clients(clients),
            Err(_) => failed.push("clients".to_string()),
        }

        if failed.is_empty() {
            debug!("Reference data preloaded");
            return Ok(());
        }
        error!(?failed, "Failed to preload workspace data");
        self.notify(Notice::warning(PRELOAD_FAILED));
        Err(TickbridgeError::PartialPreload { failed })
    }

    fn start_loops(self: &Arc<Self>, generation: u64) {
        let polling = self.gateway.settings().polling;

        let weak = Arc::downgrade(self);
        let poll = PeriodicTask::spawn(
            "timer-poll",
            Duration::from_millis(polling.timer_interval_ms),
            move || Self::poll_tick(weak.clone(), generation),
        );

        let weak = Arc::downgrade(self);
        let status = PeriodicTask::spawn(
            "status-line",
            Duration::from_millis(polling.status_interval_ms),
            move || {
                let weak = weak.clone();
                async move {
                    match weak.upgrade() {
                        Some(this) if this.is_current(generation) => {
                            this.refresh_status_line();
                            ControlFlow::Continue(())
                        }
                        _ => ControlFlow::Break(()),
                    }
                }
            },
        );

        *self.loops.lock() = vec![poll, status];
        info!(generation, "Synchronizer loops started");
    }

    async fn poll_tick(weak: Weak<Self>, generation: u64) -> ControlFlow<()> {
        let Some(this) = weak.upgrade() else {
            return ControlFlow::Break(());
        };
        if !this.is_current(generation) {
            return ControlFlow::Break(());
        }
        if let Err(err) = this.poll_timer(generation).await {
            debug!(error = %err, "Timer poll did not complete");
        }
        ControlFlow::Continue(())
    }

    // ---------------------------------------------------------------------
    // Polling
    // ---------------------------------------------------------------------

    /// Poll the running timer once and classify it against the stored one
    ///
    /// Skipped (returning `Unchanged`) unless the status is `Available` or
    /// `Degraded`.
    async fn poll_timer(self: &Arc<Self>, generation: u64) -> Result<TimerTransition> {
        if !self.status().is_polling() {
            return Ok(TimerTransition::Unchanged);
        }

        let polled = self.gateway.current_timer().await;
        self.ensure_current(generation)?;

        let current = match polled {
            Ok(current) => {
                if self.status() == ApiStatus::Degraded {
                    info!("Timer poll recovered");
                    self.set_status(ApiStatus::Available);
                }
                current
            }
            Err(err) => {
                error!(error = %err, "Error reaching Toggl API");
                if self.status() != ApiStatus::Degraded {
                    self.notify(Notice::warning(POLL_FAILED));
                    self.set_status(ApiStatus::Degraded);
                }
                return Err(err);
            }
        };

        let workspace_id = self.gateway.workspace().numeric_id();
        let current = current.filter(|entry| {
            let keep = workspace_id.map_or(true, |id| entry.workspace_id == id);
            if !keep {
                debug!(workspace_id = entry.workspace_id, "Dropping timer from another workspace");
            }
            keep
        });

        let mut transition = TimerTransition::Unchanged;
        self.timer_tx.send_if_modified(|stored| {
            transition = TimerTransition::classify(stored.as_ref(), current.as_ref());
            *stored = current;
            transition.is_changed()
        });

        if transition.is_changed() {
            info!(?transition, "Active timer changed");
            self.refresh_status_line();
            self.spawn_daily_summary(generation);
        }
        Ok(transition)
    }

    /// Poll now with the current generation
    pub async fn poll_now(self: &Arc<Self>) -> Result<TimerTransition> {
        self.poll_timer(self.current_generation()).await
    }

    fn spawn_daily_summary(self: &Arc<Self>, generation: u64) {
        let weak = Arc::downgrade(self);
        tokio::spawn(async move {
            if let Some(this) = weak.upgrade() {
                if let Err(err) = this.refresh_daily_summary(generation).await {
                    debug!(error = %err, "Daily summary not refreshed");
                }
            }
        });
    }

    /// Fetch today's per-project totals and publish them
    async fn refresh_daily_summary(&self, generation: u64) -> Result<()> {
        let items = self.gateway.daily_summary().await?;
        self.ensure_current(generation)?;
        self.summary_tx.send_replace(items);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Status line
    // ---------------------------------------------------------------------

    /// Re-render the status line and publish it if it changed
    pub fn refresh_status_line(&self) {
        let settings = self.gateway.settings();
        let timer = self.current_timer();
        let project = timer
            .as_ref()
            .and_then(|entry| entry.project_id)
            .and_then(|id| self.references.enrich_project(id))
            .map(|enriched| enriched.project.name);
        let quota = self.gateway.is_rate_limit_enabled().then(|| self.gateway.quota_usage());

        let line = StatusLineView {
            status: self.status(),
            timer: timer.as_ref(),
            project: project.as_deref(),
            quota,
            now: self.gateway.now(),
        }
        .render(&settings.status_bar);

        self.status_line_tx.send_if_modified(|current| {
            if *current == line {
                return false;
            }
            *current = line;
            true
        });
    }

    // ---------------------------------------------------------------------
    // User actions
    // ---------------------------------------------------------------------

    fn notice_api_not_available(&self) {
        match self.status() {
            ApiStatus::NoToken => self.notify(Notice::warning(NO_TOKEN_NOTICE)),
            ApiStatus::Unreachable => self.notify(Notice::error(UNREACHABLE_NOTICE)),
            _ => {}
        }
    }

    /// Succeeds only while `Available`; otherwise explains why not
    pub fn ensure_available(&self) -> Result<()> {
        let status = self.status();
        if status.is_available() {
            return Ok(());
        }
        self.notice_api_not_available();
        Err(TickbridgeError::Unavailable(status))
    }

    /// Start a timer, then poll so observers see it immediately
    #[instrument(skip_all)]
    pub async fn start_timer(self: &Arc<Self>, entry: NewTimeEntry) -> Result<TimeEntry> {
        self.ensure_available()?;
        let _guard = ActionGuard::acquire(&self.action_in_flight)?;
        let generation = self.current_generation();

        match self.gateway.start_timer(entry).await {
            Ok(started) => {
                info!(entry_id = started.id, "Timer started");
                if let Err(err) = self.poll_timer(generation).await {
                    debug!(error = %err, "Poll after start did not complete");
                }
                Ok(started)
            }
            Err(err) => {
                error!(error = %err, "Failed to start timer");
                self.notify(Notice::error(START_FAILED));
                Err(err)
            }
        }
    }

    /// Stop the running timer, if any
    #[instrument(skip_all)]
    pub async fn stop_timer(self: &Arc<Self>) -> Result<Option<TimeEntry>> {
        self.ensure_available()?;
        let _guard = ActionGuard::acquire(&self.action_in_flight)?;
        let Some(running) = self.current_timer() else {
            debug!("No running timer to stop");
            return Ok(None);
        };
        let generation = self.current_generation();

        match self.gateway.stop_timer(&running).await {
            Ok(stopped) => {
                info!(entry_id = stopped.id, "Timer stopped");
                if let Err(err) = self.poll_timer(generation).await {
                    debug!(error = %err, "Poll after stop did not complete");
                }
                Ok(Some(stopped))
            }
            Err(err) => {
                error!(error = %err, "Failed to stop timer");
                self.notify(Notice::error(STOP_FAILED));
                Err(err)
            }
        }
    }

    /// Recent entries for picking a timer to restart
    pub async fn recent_time_entries(&self) -> Result<Vec<DetailedReportItem>> {
        self.gateway.recent_time_entries().await
    }

    // ---------------------------------------------------------------------
    // Reports
    // ---------------------------------------------------------------------

    pub async fn summary_report(&self, query: &ReportQuery) -> Result<SummaryReport> {
        self.reports.summary_report(query).await
    }

    pub async fn detailed_report(&self, query: &ReportQuery) -> Result<Vec<EnrichedDetailedItem>> {
        self.reports.detailed_report(query).await
    }
}

impl Drop for TimerSynchronizer {
    fn drop(&mut self) {
        self.stop_loops();
    }
}
