mod common;

use common::TestApp;
use serde_json::{json, Value};

#[tokio::test]
async fn create_assistant_persists_remote_id() {
    let app = TestApp::spawn().await;
    let user = app.create_test_user().await;

    let response = app
        .post(
            "/assistants",
            &user.token,
            json!({
                "name": "Support bot",
                "instructions": "Answer politely.",
            }),
        )
        .await;
    assert_success!(response);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["name"], "Support bot");
    assert_eq!(body["model"], "gpt-4o-mini");
    assert!(body["openai_id"]
        .as_str()
        .unwrap()
        .starts_with("asst_mock"));
    assert_eq!(app.openai.call_count("create_assistant"), 1);
}

#[tokio::test]
async fn create_aborts_on_remote_failure_leaving_no_row() {
    let app = TestApp::spawn().await;
    let user = app.create_test_user().await;

    *app.openai.fail_create_assistant.lock().unwrap() = Some(500);

    let response = app
        .post("/assistants", &user.token, json!({ "name": "Doomed bot" }))
        .await;
    assert_status!(response, 502);

    let list = app.get("/assistants", &user.token).await;
    let body: Value = list.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn create_rejects_invalid_name() {
    let app = TestApp::spawn().await;
    let user = app.create_test_user().await;

    let response = app
        .post("/assistants", &user.token, json!({ "name": "x" }))
        .await;
    assert_status!(response, 400);
    assert_eq!(app.openai.call_count("create_assistant"), 0);
}

#[tokio::test]
async fn list_is_scoped_to_tenant() {
    let app = TestApp::spawn().await;
    let user_a = app.create_test_user().await;
    let user_b = app.create_test_user().await;

    app.create_assistant(&user_a, "A's bot").await;

    let list_a: Value = app
        .get("/assistants", &user_a.token)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(list_a["data"].as_array().unwrap().len(), 1);

    let list_b: Value = app
        .get("/assistants", &user_b.token)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(list_b["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn foreign_assistant_reads_as_not_found() {
    let app = TestApp::spawn().await;
    let user_a = app.create_test_user().await;
    let user_b = app.create_test_user().await;

    let assistant_id = app.create_assistant(&user_a, "A's bot").await;

    let response = app
        .get(&format!("/assistants/{assistant_id}"), &user_b.token)
        .await;
    assert_status!(response, 404);

    let response = app
        .delete(&format!("/assistants/{assistant_id}"), &user_b.token)
        .await;
    assert_status!(response, 404);
    assert_eq!(app.openai.call_count("delete_assistant"), 0);
}

#[tokio::test]
async fn update_pushes_to_remote_then_local() {
    let app = TestApp::spawn().await;
    let user = app.create_test_user().await;
    let assistant_id = app.create_assistant(&user, "Old name").await;

    let response = app
        .patch(
            &format!("/assistants/{assistant_id}"),
            &user.token,
            json!({ "name": "New name" }),
        )
        .await;
    assert_success!(response);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["name"], "New name");
    assert_eq!(app.openai.call_count("update_assistant"), 1);

    let fetched: Value = app
        .get(&format!("/assistants/{assistant_id}"), &user.token)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["name"], "New name");
}

#[tokio::test]
async fn delete_removes_row_and_tries_remote_cleanup() {
    let app = TestApp::spawn().await;
    let user = app.create_test_user().await;
    let assistant_id = app.create_assistant(&user, "Short-lived bot").await;

    let response = app
        .delete(&format!("/assistants/{assistant_id}"), &user.token)
        .await;
    assert_status!(response, 204);
    assert_eq!(app.openai.call_count("delete_assistant"), 1);

    let response = app
        .get(&format!("/assistants/{assistant_id}"), &user.token)
        .await;
    assert_status!(response, 404);
}
