//! Authentication extractor for route handlers.
//!
//! Every dashboard page requires a signed-in operator. Anonymous
//! requests are sent straight to the identity provider rather than to a
//! local login form, since the dashboard has no credentials of its own.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::api::types::User;
use crate::services::session::resolve_user;
use crate::state::AppState;

/// Extractor that requires a signed-in operator.
///
/// Resolves the session principal, revalidating it against the license
/// API when the freshness window has passed. Anonymous or rejected
/// sessions get a redirect to the provider's Discord sign-in.
///
/// # Example
///
/// ```rust,ignore
/// async fn licenses_index(RequireUser(user): RequireUser) -> impl IntoResponse {
///     format!("signed in as {}", user.username)
/// }
/// ```
pub struct RequireUser(pub User);

/// Rejection for requests without a usable session.
pub enum AuthRejection {
    /// Redirect to the identity provider's sign-in flow.
    RedirectToProvider(String),
    /// The session layer is missing entirely.
    Unauthorized,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToProvider(url) => Redirect::to(&url).into_response(),
            Self::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
        }
    }
}

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // Session is set by SessionManagerLayer
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or(AuthRejection::Unauthorized)?
            .clone();

        match resolve_user(state, &session).await {
            Some(user) => Ok(Self(user)),
            None => Err(AuthRejection::RedirectToProvider(
                state.config().oauth_login_url(),
            )),
        }
    }
}
