mod common;

use common::{AuthResponse, TestApp};
use serde_json::{json, Value};

#[tokio::test]
async fn register_creates_tenant_and_returns_token() {
    let app = TestApp::spawn().await;
    let email = TestApp::unique_email();

    let response = app
        .post_public(
            "/auth/register",
            json!({
                "name": "Jane Doe",
                "company_name": "Acme Inc",
                "email": email,
                "password": "password123",
            }),
        )
        .await;
    assert_success!(response);

    let auth: AuthResponse = response.json().await.unwrap();
    assert!(!auth.token.is_empty());
    assert_eq!(auth.user.email.as_deref(), Some(email.as_str()));
    assert_eq!(auth.client.name, "Acme Inc");
    assert_eq!(auth.client.plan, "FREE");
    assert_eq!(auth.user.client_id, auth.client.id);
}

#[tokio::test]
async fn register_rejects_duplicate_email() {
    let app = TestApp::spawn().await;
    let user = app.create_test_user().await;

    let response = app
        .post_public(
            "/auth/register",
            json!({
                "name": "Impostor",
                "email": user.email,
                "password": "password123",
            }),
        )
        .await;
    assert_status!(response, 409);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["code"], "USER_EXISTS");
}

#[tokio::test]
async fn register_rejects_short_password() {
    let app = TestApp::spawn().await;

    let response = app
        .post_public(
            "/auth/register",
            json!({
                "name": "Jane Doe",
                "email": TestApp::unique_email(),
                "password": "short",
            }),
        )
        .await;
    assert_status!(response, 400);
}

#[tokio::test]
async fn login_works_with_correct_credentials() {
    let app = TestApp::spawn().await;
    let user = app.create_test_user().await;

    let response = app
        .post_public(
            "/auth/login",
            json!({
                "email": user.email,
                "password": user.password,
            }),
        )
        .await;
    assert_success!(response);

    let auth: AuthResponse = response.json().await.unwrap();
    assert_eq!(auth.user.id, user.id);
}

#[tokio::test]
async fn login_rejects_wrong_password() {
    let app = TestApp::spawn().await;
    let user = app.create_test_user().await;

    let response = app
        .post_public(
            "/auth/login",
            json!({
                "email": user.email,
                "password": "not-the-password",
            }),
        )
        .await;
    assert_status!(response, 401);
}

#[tokio::test]
async fn login_rejects_unknown_email() {
    let app = TestApp::spawn().await;

    let response = app
        .post_public(
            "/auth/login",
            json!({
                "email": TestApp::unique_email(),
                "password": "password123",
            }),
        )
        .await;
    assert_status!(response, 401);
}

#[tokio::test]
async fn protected_route_requires_token() {
    let app = TestApp::spawn().await;

    let response = app.get_public("/client/profile").await;
    assert_status!(response, 401);
}

#[tokio::test]
async fn protected_route_rejects_garbage_token() {
    let app = TestApp::spawn().await;

    let response = app.get("/client/profile", "not.a.jwt").await;
    assert_status!(response, 401);
}

#[tokio::test]
async fn profile_returns_user_and_client() {
    let app = TestApp::spawn().await;
    let user = app.create_test_user().await;

    let response = app.get("/client/profile", &user.token).await;
    assert_success!(response);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["user"]["id"], user.id.to_string());
    assert_eq!(body["client"]["id"], user.client_id.to_string());
}

#[tokio::test]
async fn facebook_start_rejects_unlisted_redirect() {
    let app = TestApp::spawn().await;

    let response = app
        .get_public("/auth/facebook?redirect=https://evil.example.com")
        .await;
    assert_status!(response, 400);
}

#[tokio::test]
async fn facebook_callback_logs_in_and_bounces_back() {
    let app = TestApp::spawn().await;

    // The allowed redirect in the test config is http://localhost:5173.
    let no_redirect = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();
    let response = no_redirect
        .get(format!(
            "{}/auth/facebook/callback?code=test-code&state=http://localhost:5173",
            app.base_url
        ))
        .send()
        .await
        .unwrap();

    assert_status!(response, 303);
    let location = response
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(location.starts_with("http://localhost:5173?token="));

    let calls = app.graph.calls.lock().unwrap();
    assert!(calls.contains(&"exchange_code".to_string()));
    assert!(calls.contains(&"profile".to_string()));
}

#[tokio::test]
async fn facebook_callback_rejects_tampered_state() {
    let app = TestApp::spawn().await;

    let response = app
        .get_public("/auth/facebook/callback?code=test-code&state=https://evil.example.com")
        .await;
    assert_status!(response, 400);

    assert!(app.graph.calls.lock().unwrap().is_empty());
}
