//! Integration tests for sign-in, sessions and role gating.
//!
//! The dashboard has no credentials of its own; sign-in is a hand-off
//! from the license API's Discord OAuth flow. These tests drive the
//! callback, logout and the session revalidation window end to end
//! against mock upstreams.

use keywarden_integration_tests::{ACCESS_TOKEN, TestApp};
use reqwest::StatusCode;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

/// Location header of a redirect response.
fn location(response: &reqwest::Response) -> &str {
    response
        .headers()
        .get("location")
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

/// `GET /user` payload for a revalidated operator with the given role.
///
/// Deliberately omits `accessToken`; the dashboard must keep using the
/// stored bearer token when the backend does not echo one back.
fn operator_json(role: &str) -> serde_json::Value {
    json!({
        "_id": "u-1",
        "discordId": "111222333444555666",
        "username": "opal",
        "role": role,
        "createdAt": "2026-01-01T12:00:00.000Z",
        "updatedAt": "2026-02-01T12:00:00.000Z",
    })
}

// ============================================================================
// Sign-in Flow Tests
// ============================================================================

#[tokio::test]
async fn test_health_check_is_public() {
    let app = TestApp::spawn().await;

    let response = app.get("/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.expect("body"), "ok");
}

#[tokio::test]
async fn test_anonymous_request_redirects_to_provider() {
    let app = TestApp::spawn().await;

    let response = app.get("/").await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("{}/auth/discord", app.api.uri()));
}

#[tokio::test]
async fn test_callback_establishes_a_session() {
    let app = TestApp::spawn().await;

    let response = app.sign_in_admin().await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    // The cookie now unlocks protected pages. No upstream mocks are
    // mounted, so the overview renders degraded, but as a signed-in
    // page rather than a redirect.
    let response = app.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.expect("body");
    assert!(body.contains("opal"));
    assert!(body.contains("Overview"));
}

#[tokio::test]
async fn test_callback_error_code_renders_message() {
    let app = TestApp::spawn().await;

    let response = app.get("/auth/callback?error=rate_limit").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.expect("body");
    assert!(body.contains("Too many sign-in attempts"));
}

#[tokio::test]
async fn test_callback_without_token_is_rejected() {
    let app = TestApp::spawn().await;

    let response = app
        .get("/auth/callback?userId=u-1&discordId=1&username=opal")
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.expect("body");
    assert!(body.contains("Failed to create a session"));

    // No session was established.
    let response = app.get("/").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_logout_destroys_session_and_notifies_backend() {
    let app = TestApp::spawn().await;
    app.sign_in_admin().await;

    Mock::given(method("GET"))
        .and(path("/logout"))
        .and(header("authorization", format!("Bearer {ACCESS_TOKEN}")))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.api)
        .await;

    let response = app
        .client
        .post(app.url("/auth/logout"))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    // The session is gone; the next request goes back to the provider.
    let response = app.get("/licenses").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

// ============================================================================
// Role Gating Tests
// ============================================================================

#[tokio::test]
async fn test_non_admin_never_reaches_the_license_api() {
    let app = TestApp::spawn().await;
    app.sign_in_with_role("user").await;

    for page in ["/", "/licenses", "/scripts", "/logs", "/tools/auth-apply"] {
        let response = app.get(page).await;
        assert_eq!(
            response.status(),
            StatusCode::FORBIDDEN,
            "expected 403 for {page}"
        );
        let body = response.text().await.expect("body");
        assert!(body.contains("Access denied"), "missing denial on {page}");
    }

    let requests = app.api.received_requests().await.expect("recorded requests");
    assert!(requests.is_empty(), "denied pages must not call the API");
}

// ============================================================================
// Session Revalidation Tests
// ============================================================================

#[tokio::test]
async fn test_stale_session_is_reconfirmed_against_the_api() {
    // A zero-second window makes every request revalidate.
    let app = TestApp::spawn_with_revalidate_window(0).await;
    app.sign_in_admin().await;

    Mock::given(method("GET"))
        .and(path("/user"))
        .and(header("authorization", format!("Bearer {ACCESS_TOKEN}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(operator_json("admin")))
        .expect(1)
        .mount(&app.api)
        .await;

    // The upload form makes no license API calls of its own, so the
    // only upstream traffic is the revalidation itself.
    let response = app.get("/tools/auth-apply").await;
    assert_eq!(response.status(), StatusCode::OK);

    let requests = app.api.received_requests().await.expect("recorded requests");
    let paths: Vec<String> = requests
        .iter()
        .map(|request| request.url.path().to_string())
        .collect();
    assert_eq!(paths, ["/user"]);
}

#[tokio::test]
async fn test_rejected_revalidation_signs_the_operator_out() {
    let app = TestApp::spawn_with_revalidate_window(0).await;
    app.sign_in_admin().await;

    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": "Session expired"})),
        )
        .expect(1)
        .mount(&app.api)
        .await;

    let response = app.get("/licenses").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("{}/auth/discord", app.api.uri()));

    // The session was flushed, so the next request redirects without
    // asking the backend again.
    let response = app.get("/licenses").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_revalidation_applies_role_changes() {
    let app = TestApp::spawn_with_revalidate_window(0).await;
    app.sign_in_admin().await;

    // The backend has demoted the operator since sign-in.
    Mock::given(method("GET"))
        .and(path("/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(operator_json("user")))
        .mount(&app.api)
        .await;

    let response = app.get("/licenses").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Revalidation was the only upstream call; the license list was
    // never fetched for the demoted operator.
    let requests = app.api.received_requests().await.expect("recorded requests");
    assert!(requests.iter().all(|request| request.url.path() == "/user"));
}
