//! HTTP route handlers for the dashboard.
//!
//! # Surface
//!
//! ```text
//! GET  /                        - Overview dashboard
//! GET  /health                  - Health check
//!
//! # Auth
//! GET  /auth/login              - Redirect to the provider's Discord sign-in
//! GET  /auth/callback           - Session hand-off from the provider
//! POST /auth/logout             - Logout action
//!
//! # Licenses
//! GET  /licenses                - License list (filter by Discord id)
//! GET  /licenses/new            - Create form
//! POST /licenses                - Create action
//! GET  /licenses/{token}        - License detail
//! GET  /licenses/{token}/edit   - Edit form
//! POST /licenses/{token}/edit   - Update action
//! POST /licenses/{token}/delete - Delete action
//!
//! # Scripts
//! GET  /scripts                 - Script list with license counts
//! POST /scripts                 - Create script
//! POST /scripts/{id}/rename     - Rename script
//! POST /scripts/{id}/delete     - Delete script
//! GET  /scripts/{id}/licenses   - Licenses issued for one script
//!
//! # Audit log
//! GET  /logs                    - License change log (filters + pagination)
//!
//! # Tools
//! GET  /tools/auth-apply        - Auth-apply upload form
//! POST /tools/auth-apply        - Transform an uploaded script
//! ```

pub mod auth;
pub mod auth_apply;
pub mod licenses;
pub mod logs;
pub mod overview;
pub mod scripts;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use crate::api::types::User;
use crate::filters;
use crate::services::flash::Flash;
use crate::state::AppState;

/// Signed-in operator display data for templates.
#[derive(Debug, Clone)]
pub struct UserView {
    pub username: String,
    /// Full avatar URL as issued by the provider, if one is set.
    pub avatar_url: Option<String>,
    /// Fallback initial shown when there is no avatar.
    pub initial: String,
    pub role: String,
    pub is_admin: bool,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        let initial = user
            .username
            .chars()
            .next()
            .map_or_else(|| "?".to_owned(), |c| c.to_uppercase().to_string());

        Self {
            username: user.username.clone(),
            avatar_url: (!user.avatar.is_empty()).then(|| user.avatar.clone()),
            initial,
            role: user.role.to_string(),
            is_admin: user.role.is_admin(),
        }
    }
}

/// Access denied page template.
#[derive(Template, WebTemplate)]
#[template(path = "denied.html")]
pub struct DeniedTemplate {
    pub user: UserView,
    pub current_path: String,
    pub flash: Option<Flash>,
}

/// Render the access denied page for a non-admin operator.
///
/// Handlers call this before touching the license API, so a plain user
/// never triggers backend reads.
pub(crate) fn deny(user: &User, current_path: &str) -> Response {
    (
        StatusCode::FORBIDDEN,
        DeniedTemplate {
            user: UserView::from(user),
            current_path: current_path.to_owned(),
            flash: None,
        },
    )
        .into_response()
}

/// Sign-in, callback, and logout.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login))
        .route("/callback", get(auth::callback))
        .route("/logout", post(auth::logout))
}

/// Create the license routes router.
pub fn license_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(licenses::index).post(licenses::create))
        .route("/new", get(licenses::new_form))
        .route("/{token}", get(licenses::show))
        .route("/{token}/edit", get(licenses::edit_form).post(licenses::update))
        .route("/{token}/delete", post(licenses::delete))
}

/// Create the script routes router.
pub fn script_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(scripts::index).post(scripts::create))
        .route("/{id}/rename", post(scripts::rename))
        .route("/{id}/delete", post(scripts::delete))
        .route("/{id}/licenses", get(scripts::licenses))
}

/// Create the audit log routes router.
pub fn log_routes() -> Router<AppState> {
    Router::new().route("/", get(logs::index))
}

/// Create the tool routes router.
pub fn tool_routes() -> Router<AppState> {
    Router::new().route(
        "/auth-apply",
        get(auth_apply::form).post(auth_apply::apply),
    )
}

/// Create all routes for the dashboard.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Overview dashboard
        .route("/", get(overview::index))
        // License routes
        .nest("/licenses", license_routes())
        // Script routes
        .nest("/scripts", script_routes())
        // Audit log
        .nest("/logs", log_routes())
        // Tools
        .nest("/tools", tool_routes())
        // Auth routes
        .nest("/auth", auth_routes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn user(username: &str, avatar: &str, role: &str) -> User {
        serde_json::from_value(serde_json::json!({
            "_id": "u-1",
            "discordId": "111222333",
            "username": username,
            "avatar": avatar,
            "role": role,
            "createdAt": "2026-01-01T00:00:00Z",
            "updatedAt": "2026-01-01T00:00:00Z",
        }))
        .unwrap()
    }

    #[test]
    fn test_user_view_uses_avatar_url_verbatim() {
        let view = UserView::from(&user(
            "opal",
            "https://cdn.discordapp.com/avatars/111/abc.png",
            "admin",
        ));
        assert_eq!(
            view.avatar_url.as_deref(),
            Some("https://cdn.discordapp.com/avatars/111/abc.png")
        );
        assert!(view.is_admin);
        assert_eq!(view.role, "admin");
    }

    #[test]
    fn test_user_view_initial_fallback() {
        let view = UserView::from(&user("opal", "", "user"));
        assert_eq!(view.avatar_url, None);
        assert_eq!(view.initial, "O");
        assert!(!view.is_admin);

        let anonymous = UserView::from(&user("", "", "user"));
        assert_eq!(anonymous.initial, "?");
    }
}
