mod common;

use common::TestApp;
use serde_json::Value;

#[tokio::test]
async fn health_check_works() {
    let app = TestApp::spawn().await;

    let response = app.get_public("/health").await;
    assert_success!(response);
}

#[tokio::test]
async fn health_status_reports_service_name() {
    let app = TestApp::spawn().await;

    let response = app.get_public("/health/status").await;
    assert_success!(response);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["service"], "mako");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn readiness_includes_database() {
    let app = TestApp::spawn().await;

    let response = app.get_public("/health/ready").await;
    assert_success!(response);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ready");
    assert_eq!(body["checks"]["database"]["status"], "up");
}

#[tokio::test]
async fn liveness_works() {
    let app = TestApp::spawn().await;

    let response = app.get_public("/health/live").await;
    assert_success!(response);
}

#[tokio::test]
async fn unknown_route_returns_json_404() {
    let app = TestApp::spawn().await;

    let response = app.get_public("/nope").await;
    assert_status!(response, 404);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "NOT_FOUND");
}
