//! Operator session state.
//!
//! The dashboard keeps no user database. Whatever `GET /user` returned at
//! sign-in is stored in the session, and stale principals are re-confirmed
//! against the license API before they are trusted again.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::api::types::User;
use crate::state::AppState;

/// Session key holding the signed-in operator.
const PRINCIPAL_KEY: &str = "principal";

/// A signed-in operator as stored in the session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredPrincipal {
    pub user: User,
    /// When the principal was last confirmed against the license API.
    pub checked_at: DateTime<Utc>,
}

impl StoredPrincipal {
    fn new(user: User) -> Self {
        Self {
            user,
            checked_at: Utc::now(),
        }
    }

    fn is_fresh(&self, now: DateTime<Utc>, window_secs: i64) -> bool {
        (now - self.checked_at).num_seconds() < window_secs
    }
}

/// Store the signed-in operator in the session.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn save_principal(
    session: &Session,
    user: User,
) -> Result<(), tower_sessions::session::Error> {
    session
        .insert(PRINCIPAL_KEY, &StoredPrincipal::new(user))
        .await
}

/// Load the stored operator, if any.
pub async fn load_principal(session: &Session) -> Option<StoredPrincipal> {
    session
        .get::<StoredPrincipal>(PRINCIPAL_KEY)
        .await
        .ok()
        .flatten()
}

/// Destroy the session and everything stored in it.
pub async fn clear_principal(session: &Session) {
    let _ = session.flush().await;
}

/// Resolve the signed-in operator for a request.
///
/// A principal confirmed within the configured window is returned as-is.
/// A stale one is re-fetched from `GET /user`; if the API rejects the
/// token the session is destroyed and the operator has to sign in again.
pub async fn resolve_user(state: &AppState, session: &Session) -> Option<User> {
    let stored = load_principal(session).await?;

    if stored.is_fresh(Utc::now(), state.config().session_revalidate_secs) {
        return Some(stored.user);
    }

    match state.api().current_user(&stored.user.access_token).await {
        Ok(mut user) => {
            // Keep the bearer token when `/user` does not echo it back.
            if user.access_token.is_empty() {
                user.access_token = stored.user.access_token;
            }
            if let Err(error) = save_principal(session, user.clone()).await {
                tracing::warn!(%error, "Failed to refresh the stored session principal");
            }
            Some(user)
        }
        Err(error) => {
            tracing::warn!(%error, "Session revalidation failed, signing the operator out");
            clear_principal(session).await;
            None
        }
    }
}

/// Sign the operator out.
///
/// The license API logout is best effort. The local session is destroyed
/// even when the API call fails, matching how the rest of the dashboard
/// treats the API as the source of truth only while a token works.
pub async fn sign_out(state: &AppState, session: &Session) {
    if let Some(stored) = load_principal(session).await {
        if let Err(error) = state.api().logout(&stored.user.access_token).await {
            tracing::debug!(%error, "License API logout failed");
        }
    }
    clear_principal(session).await;
}
