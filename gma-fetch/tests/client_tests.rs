//! Resource client tests against a scripted transport.

mod common;

use serde_json::json;

use common::*;
use gma_core::{Measurement, Role};
use gma_fetch::{GmaError, Method};

async fn logged_in() -> Fixture {
    let f = fixture();
    script_login(&f.transport);
    f.client.login("sam@example.com", "secret").await.unwrap();
    f
}

fn staff_report(id: u64, start: &str, end: &str) -> serde_json::Value {
    json!({
        "staffReportId": id,
        "node": { "nodeId": 5, "shortName": "Campus Ministry" },
        "startDate": start,
        "endDate": end
    })
}

// ============================================================================
// Assignments
// ============================================================================

#[tokio::test]
async fn test_assignments_require_identity() {
    let f = fixture();

    let err = f.client.assignments(Role::Staff).await.unwrap_err();

    assert!(err.is_session_expired());
    assert!(f.transport.calls().is_empty());
}

#[tokio::test]
async fn test_assignments_build_both_mappings() {
    let f = logged_in().await;
    f.transport.respond(
        Method::Get,
        "gma_user/42/assignments/staff",
        ok(json!({
            "staff": [
                { "nodeId": 5, "shortName": "Campus Ministry" },
                { "nodeId": "9", "shortName": "Student Outreach" }
            ]
        })),
    );

    let assignments = f.client.assignments(Role::Staff).await.unwrap();

    assert_eq!(assignments.len(), 2);
    assert_eq!(assignments.name_for(9), Some("Student Outreach"));
    assert_eq!(assignments.id_for("Campus Ministry"), Some(5));
    assert!(assignments.nodes().iter().all(|n| n.role == Role::Staff));
}

#[tokio::test]
async fn test_missing_assignment_list_is_empty() {
    let f = logged_in().await;
    f.transport.respond(Method::Get, "assignments/director", ok(json!([])));

    let assignments = f.client.assignments(Role::Director).await.unwrap();

    assert!(assignments.is_empty());
}

// ============================================================================
// Reports
// ============================================================================

#[tokio::test]
async fn test_reports_request_and_order() {
    let f = logged_in().await;
    f.transport.respond(
        Method::Post,
        "gma_staffReport/searchOwn",
        ok(json!({
            "staffReports": [
                staff_report(31, "20240201", "20240229"),
                staff_report(30, "20240101", "20240131")
            ]
        })),
    );

    let mut reports = f.client.reports_for_node(5).await.unwrap();

    let call = &f.transport.calls_to(Method::Post, "searchOwn")[0];
    assert_eq!(call.json_body(), Some(&json!({ "nodeId": [5], "maxResult": 10 })));

    assert_eq!(reports.len(), 2);
    let current = reports.get().unwrap();
    assert_eq!(current.report_id, 31);
    assert_eq!(current.node_id, 5);
    assert_eq!(current.node_name, "Campus Ministry");
    assert_eq!(current.start_date.code(), "20240201");

    assert_eq!(reports.next().unwrap().report_id, 30);
    assert_eq!(reports.next().unwrap().report_id, 30);
}

#[tokio::test]
async fn test_reports_capped_at_ten() {
    let f = logged_in().await;
    let list: Vec<_> = (0..12)
        .map(|i| staff_report(100 + i, "20240101", "20240131"))
        .collect();
    f.transport
        .respond(Method::Post, "searchOwn", ok(json!({ "staffReports": list })));

    let reports = f.client.reports_for_node(5).await.unwrap();

    assert_eq!(reports.len(), 10);
}

#[tokio::test]
async fn test_no_reports_available() {
    for payload in [json!({}), json!({ "staffReports": [] }), json!([])] {
        let f = logged_in().await;
        f.transport.respond(Method::Post, "searchOwn", ok(payload));

        let err = f.client.reports_for_node(5).await.unwrap_err();

        match err {
            GmaError::Application { message, origin } => {
                assert_eq!(message, "No reports available");
                assert_eq!(origin, "POST ?q=gmaservices/gma_staffReport/searchOwn");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

#[tokio::test]
async fn test_malformed_date_code_is_invalid_response() {
    let f = logged_in().await;
    f.transport.respond(
        Method::Post,
        "searchOwn",
        ok(json!({ "staffReports": [staff_report(1, "2024-01-01", "20240131")] })),
    );

    let err = f.client.reports_for_node(5).await.unwrap_err();

    assert!(matches!(err, GmaError::InvalidResponse { .. }));
}

// ============================================================================
// Measurements
// ============================================================================

#[tokio::test]
async fn test_measurements_grouped_in_order() {
    let f = logged_in().await;
    f.transport.respond(
        Method::Get,
        "gma_staffReport/31/numeric",
        ok(json!({
            "numericMeasurements": [
                { "Win": [
                    { "measurementId": 1, "measurementName": "Exposures", "measurementValue": 4 },
                    { "measurementId": 2, "measurementName": "Decisions", "measurementValue": "1" }
                ]},
                { "Build": [
                    { "measurementId": 3, "measurementName": "Bible studies", "measurementValue": null }
                ]},
                { "Win": [
                    { "measurementId": 4, "measurementName": "Follow-ups", "measurementValue": 2 }
                ]}
            ]
        })),
    );

    let groups = f.client.measurements(31).await.unwrap();

    assert_eq!(groups.strategies(), vec!["Win", "Build"]);
    let win = groups.get("Win").unwrap();
    assert_eq!(win.len(), 1);
    assert_eq!(win[0].measurement_id, 4);
    assert_eq!(groups.find(3).unwrap().value, "0");
    assert!(groups.find(1).is_none());
    assert!(groups.iter().flat_map(|(_, m)| m).all(|m| m.report_id == 31));
}

#[tokio::test]
async fn test_measurements_fetched_fresh_each_time() {
    let f = logged_in().await;
    let payload = |value: u64| {
        ok(json!({ "numericMeasurements": [
            { "Win": [{ "measurementId": 1, "measurementValue": value }] }
        ]}))
    };
    f.transport.respond(Method::Get, "31/numeric", payload(1));
    f.transport.respond(Method::Get, "31/numeric", payload(2));

    let first = f.client.measurements(31).await.unwrap();
    let second = f.client.measurements(31).await.unwrap();

    assert_eq!(first.find(1).unwrap().value, "1");
    assert_eq!(second.find(1).unwrap().value, "2");
    assert_eq!(second.measurement_count(), 1);
}

// ============================================================================
// Writes
// ============================================================================

#[tokio::test]
async fn test_save_measurement_request() {
    let f = logged_in().await;
    let events_before = f.busy.events().len();
    f.transport
        .respond(Method::Put, "gma_staffReport/31", ok(json!(null)));

    let measurement = Measurement::new(31, 4).with_value("12");
    f.client.save_measurement(&measurement).await.unwrap();

    let call = &f.transport.calls_to(Method::Put, "gma_staffReport/31")[0];
    assert_eq!(
        call.json_body(),
        Some(&json!([{ "measurementId": 4, "type": "numeric", "value": "12" }]))
    );
    // Writes never touch the busy indicator.
    assert_eq!(f.busy.events().len(), events_before);
}

#[tokio::test]
async fn test_save_measurement_application_error() {
    let f = logged_in().await;
    f.transport
        .respond(Method::Put, "gma_staffReport/31", app_error("Report is locked"));

    let err = f
        .client
        .save_measurement(&Measurement::new(31, 4).with_value("1"))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Report is locked");
    assert_eq!(err.origin(), Some("PUT ?q=gmaservices/gma_staffReport/31"));
}

#[tokio::test]
async fn test_write_then_refetch() {
    let f = logged_in().await;
    f.transport.respond(Method::Put, "gma_staffReport/31", ok(json!(null)));
    f.transport.respond(
        Method::Get,
        "31/numeric",
        ok(json!({ "numericMeasurements": [
            { "Win": [{ "measurementId": 4, "measurementName": "Exposures", "measurementValue": "17" }] }
        ]})),
    );

    let written = Measurement::new(31, 4).with_name("Exposures").with_value("17");
    f.client.save_measurement(&written).await.unwrap();
    let groups = f.client.measurements(31).await.unwrap();

    let sent = f.transport.calls_to(Method::Put, "gma_staffReport/31")[0]
        .json_body()
        .cloned()
        .unwrap();
    assert_eq!(sent[0]["value"], json!(groups.find(4).unwrap().value));
    assert_eq!(groups.find(4), Some(&written));
}
