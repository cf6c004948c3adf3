//! Timer synchronizer lifecycle, polling and user actions

mod support;

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use support::{running_entry, settings, workspace, Harness, MockTransport, TOKEN};
use tickbridge_core::ReferenceLookup;
use tickbridge_domain::constants::{NO_TOKEN_STATUS, UNREACHABLE_STATUS};
use tickbridge_domain::{
    ApiStatus, Client, NewTimeEntry, Project, ProjectSummaryItem, ReportQuery, Selection,
    Settings, SummaryGroup, SummarySubGroup, TickbridgeError, TimeChart, TimeChartPoint,
    TimeChartResolution, TimerTransition, WorkspaceRef,
};

/// Let spawned loops and fetches run up to the current instant
async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

fn unselected() -> Settings {
    Settings { workspace: WorkspaceRef::default(), ..settings() }
}

// ============================================================================
// Connection refresh
// ============================================================================

#[tokio::test(start_paused = true)]
async fn missing_token_sets_no_token() {
    let harness = Harness::new(settings());
    let sync = harness.synchronizer();
    assert_eq!(sync.status_line(), "Connecting to Toggl...");

    let result = sync.refresh_api_connection(None).await;

    assert_eq!(result, Err(TickbridgeError::NoToken));
    assert_eq!(sync.status(), ApiStatus::NoToken);
    assert_eq!(sync.status_line(), NO_TOKEN_STATUS);
    assert!(harness.notifier.contains("No Toggl Track API token is set."));
    assert!(!sync.loops_running());
    assert_eq!(harness.transport.total_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn unreachable_provider_leaves_loops_stopped() {
    let harness = Harness::new(settings());
    harness.transport.fail("workspaces", TickbridgeError::Network("refused".to_string()));
    let sync = harness.synchronizer();

    let result = sync.refresh_api_connection(Some(TOKEN)).await;

    assert!(matches!(result, Err(TickbridgeError::ConnectionFailed(_))));
    assert_eq!(sync.status(), ApiStatus::Unreachable);
    assert_eq!(sync.status_line(), UNREACHABLE_STATUS);
    assert!(harness.notifier.contains("The Toggl Track API is unreachable."));
    assert!(!sync.loops_running());
}

#[tokio::test(start_paused = true)]
async fn empty_workspace_list_is_available_but_unselected() {
    let harness = Harness::new(unselected());
    let sync = harness.synchronizer();

    sync.refresh_api_connection(Some(TOKEN)).await.unwrap();

    assert_eq!(sync.status(), ApiStatus::Available);
    assert!(!harness.gateway.workspace().is_selected());
    assert!(harness.notifier.contains("Toggl: No workspaces found. Please check your account."));
    assert!(harness.notifier.contains("Toggl: Please select a workspace in plugin settings."));
    assert!(harness.store.workspaces.lock().is_empty());
    assert_eq!(harness.transport.calls("projects"), 0);
    assert!(sync.loops_running());
}

#[tokio::test(start_paused = true)]
async fn first_workspace_is_auto_selected_and_persisted() {
    let harness = Harness::new(unselected());
    *harness.transport.workspaces.lock() = vec![workspace(7, "Acme"), workspace(8, "Side")];
    let sync = harness.synchronizer();

    sync.refresh_api_connection(Some(TOKEN)).await.unwrap();

    assert_eq!(harness.gateway.workspace(), WorkspaceRef::new(7, "Acme"));
    assert_eq!(harness.store.workspaces.lock().as_slice(), [WorkspaceRef::new(7, "Acme")]);
    assert!(harness.notifier.contains("Toggl: Auto-selected workspace \"Acme\""));
    assert_eq!(harness.transport.calls("projects"), 1);
    assert_eq!(harness.transport.calls("tags"), 1);
    assert_eq!(harness.transport.calls("clients"), 1);
}

#[tokio::test(start_paused = true)]
async fn configured_workspace_is_kept() {
    let harness = Harness::new(settings());
    *harness.transport.workspaces.lock() = vec![workspace(7, "Acme")];
    let sync = harness.synchronizer();

    sync.refresh_api_connection(Some(TOKEN)).await.unwrap();

    assert_eq!(harness.gateway.workspace(), WorkspaceRef::new(1, "Main"));
    assert!(harness.store.workspaces.lock().is_empty());
}

#[tokio::test(start_paused = true)]
async fn partial_preload_is_not_fatal() {
    let harness = Harness::new(settings());
    *harness.transport.projects.lock() = vec![Project {
        id: 10,
        name: "Alpha".to_string(),
        workspace_id: Some(1),
        client_id: None,
        color: None,
        active: true,
    }];
    harness.transport.fail("tags", TickbridgeError::Network("reset".to_string()));
    let sync = harness.synchronizer();

    sync.refresh_api_connection(Some(TOKEN)).await.unwrap();

    assert!(harness.notifier.contains("Toggl: Failed to load workspace data."));
    assert_eq!(harness.references.project_ids(&["alpha".into()]), vec![10]);
    assert_eq!(sync.status(), ApiStatus::Available);
    assert!(sync.loops_running());
}

#[tokio::test(start_paused = true)]
async fn reconnect_announces_itself_and_restarts_loops() {
    let harness = Harness::new(settings());
    let sync = harness.synchronizer();

    sync.refresh_api_connection(Some(TOKEN)).await.unwrap();
    assert!(!harness.notifier.contains("Reconnecting to Toggl..."));

    sync.refresh_api_connection(Some(TOKEN)).await.unwrap();
    settle().await;

    assert_eq!(harness.notifier.count_containing("Reconnecting to Toggl..."), 1);
    assert!(sync.loops_running());

    // Only the second generation's poll loop keeps ticking
    let before = harness.transport.calls("current_time_entry");
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(harness.transport.calls("current_time_entry"), before + 1);
}

#[tokio::test(start_paused = true)]
async fn successful_refresh_fetches_the_daily_summary() {
    let harness = Harness::new(settings());
    let item = ProjectSummaryItem { user_id: Some(1), project_id: Some(10), tracked_seconds: 3600 };
    *harness.transport.daily.lock() = vec![item.clone()];
    let sync = harness.synchronizer();

    sync.refresh_api_connection(Some(TOKEN)).await.unwrap();
    settle().await;

    assert_eq!(sync.daily_summary(), vec![item]);
}

// ============================================================================
// Polling
// ============================================================================

#[tokio::test(start_paused = true)]
async fn poll_classifies_timer_changes() {
    let harness = Harness::new(settings());
    let sync = harness.synchronizer();
    sync.refresh_api_connection(Some(TOKEN)).await.unwrap();
    settle().await;

    let mut entry = running_entry(1, "Deep work", 60);
    entry.tag_ids = vec![1, 2];
    harness.transport.set_current(Some(entry.clone()));
    assert_eq!(sync.poll_now().await, Ok(TimerTransition::Started));

    entry.tag_ids = vec![2, 1];
    harness.transport.set_current(Some(entry.clone()));
    assert_eq!(sync.poll_now().await, Ok(TimerTransition::Unchanged));

    entry.tag_ids = vec![1, 3];
    harness.transport.set_current(Some(entry.clone()));
    assert_eq!(sync.poll_now().await, Ok(TimerTransition::Edited));

    harness.transport.set_current(Some(running_entry(2, "Email", 10)));
    assert_eq!(sync.poll_now().await, Ok(TimerTransition::Switched));

    harness.transport.set_current(None);
    assert_eq!(sync.poll_now().await, Ok(TimerTransition::Stopped));
    assert_eq!(sync.current_timer(), None);
}

#[tokio::test(start_paused = true)]
async fn timer_change_notifies_observers_and_refreshes_summary() {
    let harness = Harness::new(settings());
    let sync = harness.synchronizer();
    sync.refresh_api_connection(Some(TOKEN)).await.unwrap();
    settle().await;
    let mut timer_rx = sync.subscribe_timer();
    let summaries = harness.transport.calls("projects_summary");

    harness.transport.set_current(Some(running_entry(1, "Deep work", 60)));
    sync.poll_now().await.unwrap();
    settle().await;

    assert!(timer_rx.has_changed().unwrap());
    assert_eq!(timer_rx.borrow_and_update().as_ref().map(|entry| entry.id), Some(1));
    assert_eq!(harness.transport.calls("projects_summary"), summaries + 1);

    sync.poll_now().await.unwrap();
    settle().await;
    assert!(!timer_rx.has_changed().unwrap());
    assert_eq!(harness.transport.calls("projects_summary"), summaries + 1);
}

#[tokio::test(start_paused = true)]
async fn failed_summary_refresh_keeps_the_new_timer() {
    let harness = Harness::new(settings());
    let sync = harness.synchronizer();
    sync.refresh_api_connection(Some(TOKEN)).await.unwrap();
    settle().await;
    let summaries = harness.transport.calls("projects_summary");

    harness.transport.fail("projects_summary", TickbridgeError::Network("reset".to_string()));
    let entry = running_entry(1, "Deep work", 60);
    harness.transport.set_current(Some(entry.clone()));

    assert_eq!(sync.poll_now().await, Ok(TimerTransition::Started));
    settle().await;

    assert_eq!(harness.transport.calls("projects_summary"), summaries + 1);
    assert_eq!(sync.current_timer(), Some(entry));
    assert_eq!(sync.status(), ApiStatus::Available);
    assert_eq!(sync.poll_now().await, Ok(TimerTransition::Unchanged));
}

#[tokio::test(start_paused = true)]
async fn timers_from_other_workspaces_are_dropped() {
    let harness = Harness::new(settings());
    let sync = harness.synchronizer();
    sync.refresh_api_connection(Some(TOKEN)).await.unwrap();
    settle().await;

    let mut foreign = running_entry(3, "Elsewhere", 60);
    foreign.workspace_id = 2;
    harness.transport.set_current(Some(foreign.clone()));
    assert_eq!(sync.poll_now().await, Ok(TimerTransition::Unchanged));

    // With or without a project
    foreign.project_id = Some(99);
    harness.transport.set_current(Some(foreign));
    assert_eq!(sync.poll_now().await, Ok(TimerTransition::Unchanged));
    assert_eq!(sync.current_timer(), None);
}

#[tokio::test(start_paused = true)]
async fn failed_polls_degrade_and_recover() {
    let harness = Harness::new(settings());
    let sync = harness.synchronizer();
    sync.refresh_api_connection(Some(TOKEN)).await.unwrap();
    settle().await;

    harness.transport.fail("current_time_entry", TickbridgeError::Network("reset".to_string()));
    assert!(sync.poll_now().await.is_err());
    assert!(sync.poll_now().await.is_err());

    assert_eq!(sync.status(), ApiStatus::Degraded);
    assert_eq!(harness.notifier.count_containing("Error updating active Toggl time entry"), 1);

    harness.transport.clear_failure("current_time_entry");
    assert!(sync.poll_now().await.is_ok());
    assert_eq!(sync.status(), ApiStatus::Available);
    assert_eq!(harness.notifier.count_containing("Error updating active Toggl time entry"), 1);
}

#[tokio::test(start_paused = true)]
async fn poll_loop_keeps_running_while_degraded() {
    let harness = Harness::new(settings());
    let sync = harness.synchronizer();
    harness.transport.fail("current_time_entry", TickbridgeError::Network("reset".to_string()));
    sync.refresh_api_connection(Some(TOKEN)).await.unwrap();
    settle().await;
    assert_eq!(sync.status(), ApiStatus::Degraded);

    harness.transport.clear_failure("current_time_entry");
    tokio::time::sleep(Duration::from_secs(30)).await;

    assert_eq!(sync.status(), ApiStatus::Available);
}

#[tokio::test(start_paused = true)]
async fn poll_is_skipped_when_not_polling() {
    let harness = Harness::new(settings());
    let sync = harness.synchronizer();

    assert_eq!(sync.poll_now().await, Ok(TimerTransition::Unchanged));
    assert_eq!(harness.transport.total_calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn results_from_a_reset_generation_are_discarded() {
    let harness = Harness::new(settings());
    let sync = harness.synchronizer();
    sync.refresh_api_connection(Some(TOKEN)).await.unwrap();
    settle().await;

    let gate = harness.transport.hold("current_time_entry");
    harness.transport.set_current(Some(running_entry(1, "Deep work", 60)));
    let poll = tokio::spawn({
        let sync = sync.clone();
        async move { sync.poll_now().await }
    });
    settle().await;

    sync.shutdown();
    gate.notify_one();

    assert_eq!(poll.await.unwrap(), Err(TickbridgeError::StaleGeneration));
    assert_eq!(sync.current_timer(), None);
    assert!(!sync.loops_running());
}

#[tokio::test(start_paused = true)]
async fn overtaken_refresh_keeps_the_newer_token() {
    let harness = Harness::new(settings());
    let old = Arc::new(MockTransport::default().with_workspaces(vec![workspace(1, "Main")]));
    let new = Arc::new(MockTransport::default().with_workspaces(vec![workspace(1, "Main")]));
    harness.factory.route("old-token", Arc::clone(&old));
    harness.factory.route("new-token", Arc::clone(&new));
    let sync = harness.synchronizer();

    let gate = old.hold("workspaces");
    let overtaken = tokio::spawn({
        let sync = sync.clone();
        async move { sync.refresh_api_connection(Some("old-token")).await }
    });
    settle().await;

    sync.refresh_api_connection(Some("new-token")).await.unwrap();
    gate.notify_one();
    assert_eq!(overtaken.await.unwrap(), Err(TickbridgeError::StaleGeneration));

    new.set_current(Some(running_entry(1, "Deep work", 60)));
    assert_eq!(sync.poll_now().await, Ok(TimerTransition::Started));
    assert_eq!(old.calls("current_time_entry"), 0);
    assert!(new.calls("current_time_entry") >= 1);
    assert_eq!(sync.status(), ApiStatus::Available);
}

// ============================================================================
// Status line
// ============================================================================

#[tokio::test(start_paused = true)]
async fn status_loop_tracks_elapsed_time() {
    let harness = Harness::new(Settings { rate_limit_enabled: false, ..settings() });
    harness.transport.set_current(Some(running_entry(1, "Deep work", 45 * 60)));
    let sync = harness.synchronizer();
    sync.refresh_api_connection(Some(TOKEN)).await.unwrap();
    settle().await;

    assert_eq!(sync.status_line(), "Timer: Deep work (45 minute)");

    harness.clock.advance_secs(60);
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert_eq!(sync.status_line(), "Timer: Deep work (46 minute)");
}

#[tokio::test(start_paused = true)]
async fn status_line_shows_remaining_quota() {
    let harness = Harness::new(settings());
    let sync = harness.synchronizer();
    sync.refresh_api_connection(Some(TOKEN)).await.unwrap();
    // Startup poll and daily summary consume quota in spawned tasks
    settle().await;
    sync.refresh_status_line();

    let usage = sync.quota_usage();
    assert!(sync.status_line().starts_with("Timer: - | Q "));
    assert!(sync.status_line().ends_with(&format!("Q {}/30", usage.remaining)));
}

// ============================================================================
// Timer actions
// ============================================================================

#[tokio::test(start_paused = true)]
async fn actions_require_availability() {
    let harness = Harness::new(settings());
    let sync = harness.synchronizer();
    let _ = sync.refresh_api_connection(None).await;
    harness.notifier.clear();

    let result = sync.start_timer(NewTimeEntry::default()).await;

    assert_eq!(result, Err(TickbridgeError::Unavailable(ApiStatus::NoToken)));
    assert_eq!(harness.notifier.messages(), vec!["No Toggl Track API token is set.".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn start_and_stop_update_the_timer_immediately() {
    let harness = Harness::new(settings());
    let sync = harness.synchronizer();
    sync.refresh_api_connection(Some(TOKEN)).await.unwrap();
    settle().await;

    let entry = NewTimeEntry { description: Some("Review".to_string()), ..NewTimeEntry::default() };
    let started = sync.start_timer(entry).await.unwrap();
    assert_eq!(sync.current_timer().map(|timer| timer.id), Some(started.id));

    let stopped = sync.stop_timer().await.unwrap().unwrap();
    assert_eq!(stopped.id, started.id);
    assert_eq!(sync.current_timer(), None);

    assert_eq!(sync.stop_timer().await, Ok(None));
}

#[tokio::test(start_paused = true)]
async fn failed_start_notifies_and_propagates() {
    let harness = Harness::new(settings());
    let sync = harness.synchronizer();
    sync.refresh_api_connection(Some(TOKEN)).await.unwrap();
    settle().await;
    harness.transport.fail("start_time_entry", TickbridgeError::Network("reset".to_string()));

    let result = sync.start_timer(NewTimeEntry::default()).await;

    assert_eq!(result, Err(TickbridgeError::Network("reset".to_string())));
    assert!(harness.notifier.contains("Failed to start Toggl timer. Please try again."));
}

#[tokio::test(start_paused = true)]
async fn concurrent_actions_are_rejected() {
    let harness = Harness::new(settings());
    let sync = harness.synchronizer();
    sync.refresh_api_connection(Some(TOKEN)).await.unwrap();
    settle().await;

    let gate = harness.transport.hold("start_time_entry");
    let start = tokio::spawn({
        let sync = sync.clone();
        async move { sync.start_timer(NewTimeEntry::default()).await }
    });
    settle().await;

    assert_eq!(sync.stop_timer().await, Err(TickbridgeError::ActionInProgress));

    gate.notify_one();
    assert!(start.await.unwrap().is_ok());
    assert!(sync.stop_timer().await.unwrap().is_some());
}

// ============================================================================
// Reports
// ============================================================================

#[tokio::test(start_paused = true)]
async fn summary_report_omits_unresolved_filters_and_enriches_groups() {
    let harness = Harness::new(settings());
    *harness.transport.projects.lock() = vec![Project {
        id: 10,
        name: "Alpha".to_string(),
        workspace_id: Some(1),
        client_id: Some(20),
        color: None,
        active: true,
    }];
    *harness.transport.clients.lock() = vec![Client { id: 20, name: "Acme".to_string() }];
    *harness.transport.summary_groups.lock() = vec![SummaryGroup {
        id: Some(10),
        sub_groups: vec![SummarySubGroup { id: None, title: Some("a".to_string()), seconds: 90 }],
    }];
    *harness.transport.totals.lock() = Some(TimeChart {
        seconds: 90,
        resolution: TimeChartResolution::Day,
        graph: vec![TimeChartPoint { seconds: 0 }, TimeChartPoint { seconds: 90 }],
    });
    let sync = harness.synchronizer();
    sync.refresh_api_connection(Some(TOKEN)).await.unwrap();
    settle().await;

    let from = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
    let to = NaiveDate::from_ymd_opt(2024, 4, 7).unwrap();
    let query = ReportQuery::new(from, to).with_projects(Selection::include(["Nonexistent"]));

    let report = sync.summary_report(&query).await.unwrap();

    let options = harness.transport.report_options.lock().clone();
    assert_eq!(options.len(), 2);
    assert!(options.iter().all(|o| o.project_ids.is_none()));
    assert!(options.iter().all(|o| o.resolution == Some(TimeChartResolution::Day)));

    let group = &report.project_summary[0];
    let project = group.project.as_ref().unwrap();
    assert_eq!(project.project.name, "Alpha");
    assert_eq!(project.client.as_ref().map(|c| c.name.as_str()), Some("Acme"));
    assert_eq!(report.time_chart.graph[1].date, NaiveDate::from_ymd_opt(2024, 4, 2).unwrap());
}
