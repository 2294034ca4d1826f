mod helpers;

use helpers::auth::{claims, sign, TEST_COOKIE, TEST_LOGIN_REDIRECT};
use helpers::{api_path, setup_test_app};
use serde_json::Value;

#[tokio::test]
async fn test_missing_token_is_unauthorized_problem() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .get(&api_path("/tags"))
        .add_header("Accept", "application/json")
        .await;
    assert_eq!(response.status_code(), 401);
    let body: Value = response.json();
    assert_eq!(body["status"], 401);
    assert_eq!(body["instance"], TEST_LOGIN_REDIRECT);
    assert_eq!(
        body["detail"],
        "Invalid authentication, no JWT token present!"
    );
}

#[tokio::test]
async fn test_browser_without_token_is_redirected_to_login() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .get(&api_path("/documents/search"))
        .add_header("Accept", "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8")
        .await;
    assert_eq!(response.status_code(), 307);
    assert_eq!(
        response.header("location").to_str().unwrap(),
        TEST_LOGIN_REDIRECT
    );
}

#[tokio::test]
async fn test_plain_text_error_rendering() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .get(&api_path("/documents/missing"))
        .add_header("Authorization", app.bearer())
        .add_header("Accept", "text/plain")
        .await;
    assert_eq!(response.status_code(), 404);
    assert!(response.text().contains(": "));
}

#[tokio::test]
async fn test_token_without_required_role_is_forbidden() {
    let app = setup_test_app().await;
    let token = sign(&claims(&["guest"], chrono::Utc::now().timestamp() + 3600));

    let response = app
        .client()
        .get(&api_path("/tags"))
        .add_header("Authorization", format!("Bearer {}", token))
        .await;
    assert_eq!(response.status_code(), 403);
}

#[tokio::test]
async fn test_expired_token_is_unauthorized() {
    let app = setup_test_app().await;
    let token = sign(&claims(&["user"], chrono::Utc::now().timestamp() - 3600));

    let response = app
        .client()
        .get(&api_path("/tags"))
        .add_header("Authorization", format!("Bearer {}", token))
        .await;
    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn test_cookie_token_and_appinfo() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .get(&api_path("/appinfo"))
        .add_header("Cookie", format!("{}={}", TEST_COOKIE, app.token))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["userInfo"]["userName"], "alice");
    assert_eq!(body["userInfo"]["displayName"], "Alice Example");
    assert_eq!(body["userInfo"]["roles"], serde_json::json!(["user"]));
    assert_eq!(body["versionInfo"]["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_openapi_document_is_public() {
    let app = setup_test_app().await;

    let response = app.client().get("/api-docs/openapi.json").await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert!(body["paths"]["/api/v1/documents"].is_object());
}
