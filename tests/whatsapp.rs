mod common;

use common::TestApp;
use serde_json::{json, Value};
use uuid::Uuid;

fn unique_pn() -> String {
    format!("pn_{}", Uuid::new_v4().simple())
}

async fn register_number(app: &TestApp, token: &str, phone_number_id: &str) -> reqwest::Response {
    app.post(
        "/whatsapp/numbers",
        token,
        json!({
            "waba_id": "waba_1",
            "phone_number_id": phone_number_id,
            "display_name": "Main line",
        }),
    )
    .await
}

#[tokio::test]
async fn register_requires_linked_facebook_account() {
    let app = TestApp::spawn().await;
    let user = app.create_test_user().await;

    let response = register_number(&app, &user.token, &unique_pn()).await;
    assert_status!(response, 400);
    assert!(app.graph.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn register_verified_number_works() {
    let app = TestApp::spawn().await;
    let user = app.create_test_user().await;
    app.link_facebook(&user);

    let pn = unique_pn();
    let response = register_number(&app, &user.token, &pn).await;
    assert_success!(response);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["phone_number_id"], pn);
    assert_eq!(body["status"], "active");
    assert_eq!(body["phone_number"], "+1 555 010 2030");
}

#[tokio::test]
async fn register_rejects_unverified_number() {
    let app = TestApp::spawn().await;
    let user = app.create_test_user().await;
    app.link_facebook(&user);

    *app.graph.verification_status.lock().unwrap() = Some("PENDING".to_string());

    let response = register_number(&app, &user.token, &unique_pn()).await;
    assert_status!(response, 400);
}

#[tokio::test]
async fn free_plan_allows_a_single_number() {
    let app = TestApp::spawn().await;
    let user = app.create_test_user().await;
    app.link_facebook(&user);

    let response = register_number(&app, &user.token, &unique_pn()).await;
    assert_success!(response);

    let response = register_number(&app, &user.token, &unique_pn()).await;
    assert_status!(response, 409);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "PLAN_LIMIT_REACHED");
}

#[tokio::test]
async fn upgraded_plan_raises_the_limit() {
    let app = TestApp::spawn().await;
    let user = app.create_test_user().await;
    app.link_facebook(&user);
    app.set_plan(user.client_id, "STARTER");

    for _ in 0..3 {
        let response = register_number(&app, &user.token, &unique_pn()).await;
        assert_success!(response);
    }

    let response = register_number(&app, &user.token, &unique_pn()).await;
    assert_status!(response, 409);
}

#[tokio::test]
async fn duplicate_phone_number_id_conflicts() {
    let app = TestApp::spawn().await;
    let user = app.create_test_user().await;
    app.link_facebook(&user);
    app.set_plan(user.client_id, "STARTER");

    let pn = unique_pn();
    let response = register_number(&app, &user.token, &pn).await;
    assert_success!(response);

    let response = register_number(&app, &user.token, &pn).await;
    assert_status!(response, 409);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "NUMBER_EXISTS");
}

#[tokio::test]
async fn list_reports_plan_usage() {
    let app = TestApp::spawn().await;
    let user = app.create_test_user().await;
    app.link_facebook(&user);

    let response = register_number(&app, &user.token, &unique_pn()).await;
    assert_success!(response);

    let body: Value = app
        .get("/whatsapp/numbers", &user.token)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["usage"]["plan"], "FREE");
    assert_eq!(body["usage"]["used"], 1);
    assert_eq!(body["usage"]["limit"], 1);
}

#[tokio::test]
async fn assign_and_unassign_assistant() {
    let app = TestApp::spawn().await;
    let user = app.create_test_user().await;
    app.link_facebook(&user);

    let assistant_id = app.create_assistant(&user, "Support bot").await;
    let number: Value = register_number(&app, &user.token, &unique_pn())
        .await
        .json()
        .await
        .unwrap();
    let number_id = number["id"].as_str().unwrap().to_string();

    let response = app
        .post(
            &format!("/whatsapp/numbers/{number_id}/assistant"),
            &user.token,
            json!({ "assistant_id": assistant_id }),
        )
        .await;
    assert_success!(response);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["assistant_id"], assistant_id.to_string());

    // Already assigned; must be unassigned first.
    let response = app
        .post(
            &format!("/whatsapp/numbers/{number_id}/assistant"),
            &user.token,
            json!({ "assistant_id": assistant_id }),
        )
        .await;
    assert_status!(response, 409);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "NUMBER_ALREADY_ASSIGNED");

    let response = app
        .delete(
            &format!("/whatsapp/numbers/{number_id}/assistant"),
            &user.token,
        )
        .await;
    assert_success!(response);
    let body: Value = response.json().await.unwrap();
    assert!(body["assistant_id"].is_null());
}

#[tokio::test]
async fn assistant_cannot_serve_two_numbers() {
    let app = TestApp::spawn().await;
    let user = app.create_test_user().await;
    app.link_facebook(&user);
    app.set_plan(user.client_id, "STARTER");

    let assistant_id = app.create_assistant(&user, "Support bot").await;
    let first: Value = register_number(&app, &user.token, &unique_pn())
        .await
        .json()
        .await
        .unwrap();
    let second: Value = register_number(&app, &user.token, &unique_pn())
        .await
        .json()
        .await
        .unwrap();

    let response = app
        .post(
            &format!("/whatsapp/numbers/{}/assistant", first["id"].as_str().unwrap()),
            &user.token,
            json!({ "assistant_id": assistant_id }),
        )
        .await;
    assert_success!(response);

    let response = app
        .post(
            &format!("/whatsapp/numbers/{}/assistant", second["id"].as_str().unwrap()),
            &user.token,
            json!({ "assistant_id": assistant_id }),
        )
        .await;
    assert_status!(response, 409);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "ASSISTANT_ALREADY_ASSIGNED");

    // Unassigning frees the assistant for the other number.
    let response = app
        .delete(
            &format!("/whatsapp/numbers/{}/assistant", first["id"].as_str().unwrap()),
            &user.token,
        )
        .await;
    assert_success!(response);

    let response = app
        .post(
            &format!("/whatsapp/numbers/{}/assistant", second["id"].as_str().unwrap()),
            &user.token,
            json!({ "assistant_id": assistant_id }),
        )
        .await;
    assert_success!(response);
}

#[tokio::test]
async fn assign_rejects_foreign_assistant() {
    let app = TestApp::spawn().await;
    let user_a = app.create_test_user().await;
    let user_b = app.create_test_user().await;
    app.link_facebook(&user_a);

    let foreign_assistant = app.create_assistant(&user_b, "B's bot").await;
    let number: Value = register_number(&app, &user_a.token, &unique_pn())
        .await
        .json()
        .await
        .unwrap();
    let number_id = number["id"].as_str().unwrap().to_string();

    let response = app
        .post(
            &format!("/whatsapp/numbers/{number_id}/assistant"),
            &user_a.token,
            json!({ "assistant_id": foreign_assistant }),
        )
        .await;
    assert_status!(response, 404);
}

#[tokio::test]
async fn delete_number_works() {
    let app = TestApp::spawn().await;
    let user = app.create_test_user().await;
    app.link_facebook(&user);

    let number: Value = register_number(&app, &user.token, &unique_pn())
        .await
        .json()
        .await
        .unwrap();
    let number_id = number["id"].as_str().unwrap().to_string();

    let response = app
        .delete(&format!("/whatsapp/numbers/{number_id}"), &user.token)
        .await;
    assert_status!(response, 204);

    let body: Value = app
        .get("/whatsapp/numbers", &user.token)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn graph_proxies_require_linked_account() {
    let app = TestApp::spawn().await;
    let user = app.create_test_user().await;

    let response = app.get("/facebook/businesses", &user.token).await;
    assert_status!(response, 400);

    app.link_facebook(&user);

    let response = app.get("/facebook/businesses", &user.token).await;
    assert_success!(response);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"][0]["id"], "biz_1");
}
