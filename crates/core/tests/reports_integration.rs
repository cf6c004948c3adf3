//! Report assembly against the in-memory transport

mod support;

use std::sync::Arc;

use chrono::NaiveDate;
use support::{settings, Harness};
use tickbridge_core::{DetailLayout, ReferenceLookup, ReportService};
use tickbridge_domain::{
    Client, DetailedReportItem, Project, ReportQuery, Selection, Tag, TimeChart, TimeChartPoint,
    TimeChartResolution,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn service() -> (Harness, ReportService) {
    let harness = Harness::connected(settings()).await;
    harness.references.replace_projects(vec![Project {
        id: 10,
        name: "Alpha".to_string(),
        workspace_id: Some(1),
        client_id: Some(20),
        color: Some("#06aaf5".to_string()),
        active: true,
    }]);
    harness.references.replace_clients(vec![Client { id: 20, name: "Acme".to_string() }]);
    harness.references.replace_tags(vec![
        Tag { id: 1, name: "deep".to_string() },
        Tag { id: 2, name: "billable".to_string() },
    ]);
    let service = ReportService::new(Arc::clone(&harness.gateway), harness.references.clone());
    (harness, service)
}

#[tokio::test]
async fn summary_filters_resolve_names_case_insensitively() {
    let (harness, service) = service().await;
    let query = ReportQuery::new(date(2024, 1, 1), date(2024, 3, 31))
        .with_projects(Selection::include(["  alpha "]))
        .with_clients(Selection::include(["ACME"]))
        .with_tags(["deep"]);

    service.summary_report(&query).await.unwrap();

    let options = harness.transport.report_options.lock().clone();
    assert_eq!(options.len(), 2);
    for sent in options {
        assert_eq!(sent.project_ids, Some(vec![10]));
        assert_eq!(sent.client_ids, Some(vec![20]));
        assert_eq!(sent.tag_ids, Some(vec![1]));
        assert_eq!(sent.resolution, Some(TimeChartResolution::Week));
    }
}

#[tokio::test]
async fn weekly_chart_points_are_dated_seven_days_apart() {
    let (harness, service) = service().await;
    *harness.transport.totals.lock() = Some(TimeChart {
        seconds: 30,
        resolution: TimeChartResolution::Week,
        graph: vec![
            TimeChartPoint { seconds: 10 },
            TimeChartPoint { seconds: 0 },
            TimeChartPoint { seconds: 20 },
        ],
    });
    let query = ReportQuery::new(date(2024, 1, 1), date(2024, 3, 1));

    let report = service.summary_report(&query).await.unwrap();

    let dates: Vec<_> = report.time_chart.graph.iter().map(|point| point.date).collect();
    assert_eq!(dates, vec![date(2024, 1, 1), date(2024, 1, 8), date(2024, 1, 15)]);
    assert_eq!(report.time_chart.seconds, 30);
    assert!(report.project_summary.is_empty());
}

#[tokio::test]
async fn detailed_rows_carry_project_client_and_tags() {
    let (harness, service) = service().await;
    *harness.transport.detailed.lock() = vec![
        DetailedReportItem {
            project_id: Some(10),
            description: Some("Review".to_string()),
            tag_ids: vec![2, 1, 99],
            ..DetailedReportItem::default()
        },
        DetailedReportItem { project_id: Some(404), ..DetailedReportItem::default() },
    ];
    let query = ReportQuery::new(date(2024, 5, 1), date(2024, 5, 1));

    let rows = service.detailed_report(&query).await.unwrap();

    assert_eq!(rows.len(), 2);
    let first = &rows[0];
    let project = first.project.as_ref().unwrap();
    assert_eq!(project.project.name, "Alpha");
    assert_eq!(project.client.as_ref().unwrap().name, "Acme");
    let tags: Vec<_> = first.tags.iter().map(|tag| tag.name.as_str()).collect();
    assert_eq!(tags, vec!["deep", "billable"]);

    assert!(rows[1].project.is_none());
    assert_eq!(
        harness.transport.layouts.lock().as_slice(),
        [DetailLayout { grouped: true, newest_first: false }]
    );
}

#[tokio::test]
async fn lookup_passes_ids_through_and_drops_unknown_names() {
    let (harness, _service) = service().await;

    let ids = harness.references.project_ids(&[10.into(), "missing".into(), 55.into()]);

    assert_eq!(ids, vec![10, 55]);
}
