mod common;

use common::{TestApp, TEST_USER_ID};
use serde_json::Value;

#[tokio::test]
async fn log_parses_example_message() {
    let app = TestApp::spawn().await;

    let entry = app
        .log_entry(TEST_USER_ID, "Headache 6/10 since 8pm, 2h, took Advil")
        .await;

    assert_eq!(entry["user_id"], TEST_USER_ID);
    assert!(entry["symptom"].as_str().unwrap().contains("Headache"));
    assert_eq!(entry["severity"], "moderate");
    assert_eq!(entry["severity_score"], 6);
    assert_eq!(entry["duration_secs"], 7200);
    assert_eq!(entry["treatment"], "Advil");
    assert!(entry["id"].as_str().is_some_and(|id| !id.is_empty()));
    assert!(entry["ended_at"].is_string());
}

#[tokio::test]
async fn logged_entry_can_be_fetched_by_id() {
    let app = TestApp::spawn().await;
    let entry = app.log_entry(TEST_USER_ID, "Mild nausea this morning").await;
    let id = entry["id"].as_str().unwrap();

    let response = app.get(&format!("/entries/{}", id)).await;

    assert_eq!(response.status(), 200);
    let fetched: Value = response.json().await.unwrap();
    assert_eq!(fetched, entry);
    assert_eq!(fetched["severity"], "mild");
}

#[tokio::test]
async fn unknown_entry_is_not_found() {
    let app = TestApp::spawn().await;

    let response = app.get("/entries/does-not-exist").await;

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn empty_message_is_rejected() {
    let app = TestApp::spawn().await;

    let response = app.post_log(TEST_USER_ID, "").await;

    assert_eq!(response.status(), 422);
    let body: Value = response.json().await.unwrap();
    assert!(body["details"].as_str().unwrap().contains("message"));
}

#[tokio::test]
async fn overlong_user_id_is_rejected() {
    let app = TestApp::spawn().await;

    let response = app.post_log(&"x".repeat(129), "Headache").await;

    assert_eq!(response.status(), 422);
}

#[tokio::test]
async fn unparseable_onset_names_started_at() {
    let app = TestApp::spawn().await;

    let response = app.post_log(TEST_USER_ID, "Headache since banana").await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["field"], "started_at");
}

#[tokio::test]
async fn out_of_range_score_names_severity() {
    let app = TestApp::spawn().await;

    let response = app.post_log(TEST_USER_ID, "Migraine 15/10").await;

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["field"], "severity");
}

#[tokio::test]
async fn malformed_json_is_client_error() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.url("/log"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn missing_fields_are_client_error() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.url("/log"))
        .json(&serde_json::json!({ "user_id": TEST_USER_ID }))
        .send()
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}
