//! Sign-in, OAuth callback, and logout routes.
//!
//! The dashboard has no credentials of its own. Sign-in is a redirect to
//! the license API's Discord OAuth flow; the API sends the operator back
//! to `/auth/callback` with the account fields and bearer token in the
//! query string, and those become the session principal.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;

use keywarden_core::Role;

use crate::api::types::User;
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::services::session::{save_principal, sign_out};
use crate::state::AppState;

// =============================================================================
// Query Types
// =============================================================================

/// Query parameters on the provider callback.
///
/// On success the provider sends the account fields; on failure only
/// `error` is set.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackQuery {
    pub user_id: Option<String>,
    pub discord_id: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub role: Option<String>,
    pub access_token: Option<String>,
    pub error: Option<String>,
}

/// Map a provider error code to an operator-facing message.
fn error_message(code: &str) -> &'static str {
    match code {
        "rate_limit" => "Too many sign-in attempts. Wait a few minutes and try again.",
        "auth_failed" => "Discord authentication failed. Try again.",
        "no_user" => "Could not fetch your Discord profile.",
        "login_failed" => "Failed to create a session. Try again.",
        _ => "Unknown sign-in error.",
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Sign-in failure page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/error.html")]
pub struct LoginErrorTemplate {
    pub message: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Send the operator to the provider's Discord sign-in.
pub async fn login(State(state): State<AppState>) -> Redirect {
    Redirect::to(&state.config().oauth_login_url())
}

/// Handle the redirect back from the provider.
///
/// A callback without all of user id, Discord id, username and bearer
/// token is unusable: the dashboard could render pages but every API
/// call would fail, so it is treated as a failed sign-in instead.
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CallbackQuery>,
) -> Response {
    if let Some(code) = query.error.as_deref() {
        tracing::warn!(code, "Provider reported a sign-in failure");
        return LoginErrorTemplate {
            message: error_message(code).to_owned(),
        }
        .into_response();
    }

    let required = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

    let (Some(user_id), Some(discord_id), Some(username), Some(access_token)) = (
        required(query.user_id),
        required(query.discord_id),
        required(query.username),
        required(query.access_token),
    ) else {
        tracing::warn!("Provider callback was missing account fields");
        return LoginErrorTemplate {
            message: error_message("login_failed").to_owned(),
        }
        .into_response();
    };

    let now = Utc::now();
    let user = User {
        id: user_id,
        discord_id,
        username,
        discriminator: "0".to_owned(),
        email: query.email.unwrap_or_default(),
        avatar: query.avatar.unwrap_or_default(),
        role: query
            .role
            .filter(|role| !role.is_empty())
            .map_or_else(Role::default, Role::new),
        access_token,
        refresh_token: String::new(),
        created_at: now,
        updated_at: now,
    };

    set_sentry_user(&user.id, Some(&user.username));

    if let Err(error) = save_principal(&session, user).await {
        tracing::error!(%error, "Failed to store the session principal");
        return LoginErrorTemplate {
            message: error_message("login_failed").to_owned(),
        }
        .into_response();
    }

    Redirect::to("/").into_response()
}

/// Sign the operator out and return to the front page.
pub async fn logout(State(state): State<AppState>, session: Session) -> Redirect {
    sign_out(&state, &session).await;
    clear_sentry_user();
    Redirect::to("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_error_codes_have_specific_messages() {
        assert!(error_message("rate_limit").contains("Too many sign-in attempts"));
        assert!(error_message("auth_failed").contains("Discord authentication failed"));
        assert!(error_message("no_user").contains("Discord profile"));
        assert!(error_message("login_failed").contains("create a session"));
    }

    #[test]
    fn test_unknown_error_code_falls_back() {
        assert_eq!(error_message("tuesday"), "Unknown sign-in error.");
        assert_eq!(error_message(""), "Unknown sign-in error.");
    }
}
