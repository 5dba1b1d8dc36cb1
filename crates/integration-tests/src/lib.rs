//! Integration tests for the Keywarden dashboard.
//!
//! Each test boots the real router on an ephemeral port, with the
//! license API and the Discord profile API replaced by wiremock
//! servers, and drives it through a cookie-carrying HTTP client the
//! way a browser session would.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p keywarden-integration-tests
//! ```
//!
//! No external services are required; everything runs in-process.

use std::net::{IpAddr, Ipv4Addr};

use keywarden_dashboard::{AppState, DashboardConfig, app};
use wiremock::MockServer;

/// Bearer token handed out by the fake provider callback.
///
/// Mocks that assert authentication should match
/// `Authorization: Bearer <this value>`.
pub const ACCESS_TOKEN: &str = "it-access-token";

/// Discord id of the signed-in operator.
pub const OPERATOR_DISCORD_ID: &str = "111222333444555666";

/// A dashboard instance under test.
///
/// Holds the two mock upstreams so tests can mount expectations and
/// inspect received requests after driving the app.
pub struct TestApp {
    base_url: String,
    /// Mock of the license API.
    pub api: MockServer,
    /// Mock of the Discord profile API.
    pub profiles: MockServer,
    /// Cookie-carrying client; redirects are never followed so tests
    /// can assert on them.
    pub client: reqwest::Client,
}

impl TestApp {
    /// Start the dashboard against fresh mock upstreams.
    ///
    /// The session freshness window is long enough that no test
    /// revalidates by accident; use
    /// [`TestApp::spawn_with_revalidate_window`] to exercise
    /// revalidation itself.
    pub async fn spawn() -> Self {
        Self::spawn_with_revalidate_window(3600).await
    }

    /// Start the dashboard with an explicit session freshness window.
    pub async fn spawn_with_revalidate_window(secs: i64) -> Self {
        let api = MockServer::start().await;
        let profiles = MockServer::start().await;

        let config = DashboardConfig {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            base_url: "http://127.0.0.1:3000".to_string(),
            api_base_url: api.uri(),
            profile_api_url: profiles.uri(),
            session_revalidate_secs: secs,
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 1.0,
        };

        let state = AppState::new(config).expect("Failed to build application state");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind an ephemeral port");
        let addr = listener
            .local_addr()
            .expect("Failed to read the bound address");
        tokio::spawn(async move {
            axum::serve(listener, app(state))
                .await
                .expect("Dashboard server stopped");
        });

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: format!("http://{addr}"),
            api,
            profiles,
            client,
        }
    }

    /// Absolute URL for a dashboard path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// GET a dashboard path with the session cookie attached.
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Request failed")
    }

    /// Sign in as the admin operator `opal`.
    ///
    /// Drives the real provider callback so the session cookie matches
    /// what a browser would hold after the OAuth hop.
    pub async fn sign_in_admin(&self) -> reqwest::Response {
        self.sign_in_with_role(keywarden_core::Role::ADMIN).await
    }

    /// Sign in with an arbitrary role string.
    pub async fn sign_in_with_role(&self, role: &str) -> reqwest::Response {
        let path = format!(
            "/auth/callback?userId=u-1&discordId={OPERATOR_DISCORD_ID}&username=opal&role={role}&accessToken={ACCESS_TOKEN}"
        );
        self.get(&path).await
    }
}

/// A license record as the license API returns it.
#[must_use]
pub fn license_json(token: &str, script: &str, discord: &str) -> serde_json::Value {
    serde_json::json!({
        "_id": format!("lic-{token}"),
        "token": token,
        "scriptName": script,
        "userDiscord": discord,
        "isPermanent": false,
        "createdAt": "2026-01-05T12:00:00.000Z",
        "updatedAt": "2026-01-05T12:00:00.000Z",
    })
}

/// A script record as the license API returns it.
#[must_use]
pub fn script_json(id: &str, name: &str) -> serde_json::Value {
    serde_json::json!({
        "_id": id,
        "name": name,
        "createdAt": "2026-01-02T08:00:00.000Z",
        "updatedAt": "2026-01-02T08:00:00.000Z",
    })
}
