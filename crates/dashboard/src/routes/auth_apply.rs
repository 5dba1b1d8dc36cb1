//! Auth-apply tool handlers.
//!
//! Uploads a `.lua` or `.js` script source to the backend transform
//! endpoint and streams the protected build straight back as a download.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tower_sessions::Session;

use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireUser;
use crate::services::flash::{Flash, take_flash};
use crate::state::AppState;

use super::{UserView, deny};

const ALLOWED_EXTENSIONS: [&str; 2] = [".lua", ".js"];

/// Auth-apply form template.
#[derive(Template, WebTemplate)]
#[template(path = "tools/auth_apply.html")]
pub struct AuthApplyTemplate {
    pub user: UserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub error: Option<String>,
}

fn has_allowed_extension(file_name: &str) -> bool {
    let lower = file_name.to_lowercase();
    ALLOWED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// `script.lua` becomes `script.auth.lua`, keeping the original casing.
/// Used when the backend does not suggest a download name itself.
fn derive_auth_name(file_name: &str) -> String {
    let lower = file_name.to_lowercase();
    for ext in ALLOWED_EXTENSIONS {
        if lower.ends_with(ext) {
            let (stem, tail) = file_name.split_at(file_name.len() - ext.len());
            return format!("{stem}.auth{tail}");
        }
    }
    file_name.to_owned()
}

/// Display the upload form.
pub async fn form(RequireUser(user): RequireUser, session: Session) -> Response {
    if !user.role.is_admin() {
        return deny(&user, "/tools/auth-apply");
    }
    let flash = take_flash(&session).await;
    AuthApplyTemplate {
        user: UserView::from(&user),
        current_path: "/tools/auth-apply".to_owned(),
        flash,
        error: None,
    }
    .into_response()
}

/// Transform an uploaded file and return it as an attachment.
pub async fn apply(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, AppError> {
    if !user.role.is_admin() {
        return Ok(deny(&user, "/tools/auth-apply"));
    }

    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| AppError::BadRequest(format!("Malformed upload: {error}")))?
    {
        if field.name() == Some("file") {
            let file_name = field.file_name().unwrap_or_default().to_owned();
            let bytes = field
                .bytes()
                .await
                .map_err(|error| AppError::BadRequest(format!("Malformed upload: {error}")))?;
            upload = Some((file_name, bytes.to_vec()));
            break;
        }
    }

    let Some((file_name, contents)) = upload else {
        return Ok(error_page(&user, "Choose a .lua or .js file."));
    };
    if !has_allowed_extension(&file_name) {
        return Ok(error_page(&user, "Invalid format. Upload a .lua or .js file."));
    }

    let out = match state
        .api()
        .apply_auth(&user.access_token, &file_name, contents)
        .await
    {
        Ok(out) => out,
        Err(error) => {
            tracing::error!(%error, file_name, "Auth apply failed");
            return Ok(error_page(&user, &error.user_message()));
        }
    };

    let download_name = out
        .file_name
        .unwrap_or_else(|| derive_auth_name(&file_name));
    // Header values only take visible ASCII.
    let safe_name: String = download_name
        .chars()
        .filter(|c| c.is_ascii() && !c.is_ascii_control() && *c != '"')
        .collect();

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_owned()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{safe_name}\""),
            ),
        ],
        out.bytes,
    )
        .into_response())
}

fn error_page(user: &crate::api::types::User, message: &str) -> Response {
    AuthApplyTemplate {
        user: UserView::from(user),
        current_path: "/tools/auth-apply".to_owned(),
        flash: None,
        error: Some(message.to_owned()),
    }
    .into_response()
}
