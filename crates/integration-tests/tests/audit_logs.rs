//! Integration tests for the audit log page.
//!
//! Filtering and pagination live on the backend; these tests assert
//! what actually goes on the wire, including the end-to-end limit
//! clamp, and how the page renders what comes back.

use keywarden_integration_tests::TestApp;
use reqwest::StatusCode;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

async fn signed_in_app() -> TestApp {
    let app = TestApp::spawn().await;
    let response = app.sign_in_admin().await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    app
}

fn empty_page_json() -> serde_json::Value {
    json!({
        "data": [],
        "pagination": {"page": 1, "limit": 20, "total": 0, "totalPages": 0},
    })
}

#[tokio::test]
async fn test_logs_page_renders_rows() {
    let app = signed_in_app().await;
    Mock::given(method("GET"))
        .and(path("/api/licenses/logs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "_id": "log-1",
                "action": "CREATE",
                "actorType": "admin",
                "actorUsername": "opal",
                "actorDiscordId": "111222333444555666",
                "licenseToken": "KW-9f8e",
                "scriptName": "drift-counter",
                "userDiscord": "735388907772051497",
                "requestIp": "203.0.113.9",
                "details": {"actionSource": "discord-bot"},
                "createdAt": "2026-02-01T10:00:00.000Z",
            }],
            "pagination": {"page": 1, "limit": 20, "total": 1, "totalPages": 1},
        })))
        .mount(&app.api)
        .await;

    let response = app.get("/logs").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.expect("body");
    assert!(body.contains("CREATE"));
    assert!(body.contains("opal"));
    assert!(body.contains("KW-9f8e"));
    assert!(body.contains("drift-counter"));
    assert!(body.contains("discord-bot"));
}

#[tokio::test]
async fn test_rows_without_stored_names_are_enriched() {
    let app = signed_in_app().await;
    Mock::given(method("GET"))
        .and(path("/api/licenses/logs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "_id": "log-2",
                "action": "DELETE",
                "actorType": "bot",
                "actorDiscordId": "999888777666555444",
                "createdAt": "2026-02-01T10:00:00.000Z",
            }],
            "pagination": {"page": 1, "limit": 20, "total": 1, "totalPages": 1},
        })))
        .mount(&app.api)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/discord/users/999888777666555444"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"username": "keeper"})))
        .expect(1)
        .mount(&app.profiles)
        .await;

    let response = app.get("/logs").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.expect("body");
    assert!(body.contains("keeper"));
}

#[tokio::test]
async fn test_enrichment_failure_falls_back_to_raw_id() {
    let app = signed_in_app().await;
    Mock::given(method("GET"))
        .and(path("/api/licenses/logs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "_id": "log-3",
                "action": "UPDATE",
                "actorType": "bot",
                "actorDiscordId": "999888777666555444",
                "createdAt": "2026-02-01T10:00:00.000Z",
            }],
            "pagination": {"page": 1, "limit": 20, "total": 1, "totalPages": 1},
        })))
        .mount(&app.api)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/discord/users/999888777666555444"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&app.profiles)
        .await;

    let response = app.get("/logs").await;

    // Lookup failures never fail the page.
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.expect("body");
    assert!(body.contains("999888777666555444"));
}

#[tokio::test]
async fn test_crafted_limit_reaches_the_backend_clamped() {
    let app = signed_in_app().await;
    Mock::given(method("GET"))
        .and(path("/api/licenses/logs"))
        .and(query_param("page", "1"))
        .and(query_param("limit", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(empty_page_json()))
        .expect(1)
        .mount(&app.api)
        .await;

    let response = app.get("/logs?limit=250").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.expect("body");
    assert!(body.contains("No records found."));
}

#[tokio::test]
async fn test_filters_are_forwarded_to_the_backend() {
    let app = signed_in_app().await;
    Mock::given(method("GET"))
        .and(path("/api/licenses/logs"))
        .and(query_param("action", "CREATE"))
        .and(query_param("userDiscord", "42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(empty_page_json()))
        .expect(1)
        .mount(&app.api)
        .await;

    let response = app.get("/logs?action=CREATE&user=42").await;

    assert_eq!(response.status(), StatusCode::OK);
    // The filter inputs keep their submitted values.
    let body = response.text().await.expect("body");
    assert!(body.contains("value=\"42\""));
}

#[tokio::test]
async fn test_pagination_links_carry_active_filters() {
    let app = signed_in_app().await;
    Mock::given(method("GET"))
        .and(path("/api/licenses/logs"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [],
            "pagination": {"page": 2, "limit": 20, "total": 90, "totalPages": 5},
        })))
        .mount(&app.api)
        .await;

    let response = app.get("/logs?page=2&action=CREATE").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.expect("body");
    assert!(body.contains("Page 2 of 5"));
    assert!(body.contains("/logs?page=3&amp;limit=20&amp;action=CREATE"));
    assert!(body.contains("/logs?page=1&amp;limit=20&amp;action=CREATE"));
}

#[tokio::test]
async fn test_backend_failure_shows_banner() {
    let app = signed_in_app().await;
    Mock::given(method("GET"))
        .and(path("/api/licenses/logs"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"error": "log service down"})),
        )
        .mount(&app.api)
        .await;

    let response = app.get("/logs").await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.expect("body");
    assert!(body.contains("log service down"));
}
