//! Cookie session layer.
//!
//! Sets up in-memory sessions using tower-sessions. The dashboard holds
//! only the operator principal and flash messages in the session, so
//! losing sessions on restart just means signing in again.

use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::DashboardConfig;

/// Name of the dashboard's session cookie.
pub const SESSION_COOKIE_NAME: &str = "keywarden_session";

/// Sessions lapse after a week without a request.
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Build the session layer over an in-memory store.
#[must_use]
pub fn create_session_layer(config: &DashboardConfig) -> SessionManagerLayer<MemoryStore> {
    let store = MemoryStore::default();

    // Secure cookies only when the dashboard itself is served over HTTPS
    let is_secure = config.base_url.starts_with("https://");

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(is_secure)
        // Lax so the redirect back from the identity provider carries the cookie
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
