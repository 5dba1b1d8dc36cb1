//! Keywarden dashboard library.
//!
//! The dashboard is served by the binary in `main.rs`; this crate root
//! exposes the same modules plus the assembled router so integration
//! tests can drive the app in-process.

#![cfg_attr(not(test), forbid(unsafe_code))]

use axum::{Router, routing::get};
use tower_http::services::ServeDir;

pub mod api;
pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use config::DashboardConfig;
pub use state::AppState;

/// Build the dashboard router with its session layer attached.
///
/// Observability layers (request tracing, Sentry) are added by the
/// binary; everything the handlers depend on is wired here.
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.config());

    Router::new()
        .route("/health", get(health))
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new("crates/dashboard/static"))
        .layer(session_layer)
        .with_state(state)
}

/// Liveness probe; answers without touching the license API.
async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn test_config() -> DashboardConfig {
        DashboardConfig {
            host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
            port: 0,
            base_url: "http://127.0.0.1:3000".to_string(),
            api_base_url: "http://127.0.0.1:9".to_string(),
            profile_api_url: "http://127.0.0.1:9".to_string(),
            session_revalidate_secs: 60,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
        }
    }

    #[tokio::test]
    async fn test_health_check_is_public() {
        let state = AppState::new(test_config()).expect("state");
        let response = app(state)
            .oneshot(Request::get("/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_root_redirects_anonymous_to_provider() {
        let state = AppState::new(test_config()).expect("state");
        let response = app(state)
            .oneshot(Request::get("/").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let location = response
            .headers()
            .get(axum::http::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        assert_eq!(location, "http://127.0.0.1:9/auth/discord");
    }
}
