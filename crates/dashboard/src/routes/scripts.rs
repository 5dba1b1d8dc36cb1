//! Script route handlers.
//!
//! License counts shown next to each script are computed from the full
//! license list, keyed by script name; the backend does not return them
//! with the scripts themselves.

use std::collections::HashMap;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use serde::Deserialize;
use tower_sessions::Session;

use keywarden_core::expiry;

use crate::api::types::License;
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireUser;
use crate::services::flash::{Flash, set_flash, take_flash};
use crate::state::AppState;

use super::{UserView, deny};

// =============================================================================
// Form and Query Types
// =============================================================================

/// Query parameters for the script list.
#[derive(Debug, Deserialize)]
pub struct ScriptListQuery {
    /// Name filter, matched case-insensitively as a substring.
    #[serde(default)]
    pub name: Option<String>,
}

/// Create form data.
#[derive(Debug, Deserialize)]
pub struct CreateScriptForm {
    #[serde(default)]
    pub name: String,
}

/// Rename form data.
#[derive(Debug, Deserialize)]
pub struct RenameScriptForm {
    #[serde(default)]
    pub name: String,
    /// Stored name at render time, used to skip no-op renames.
    #[serde(default)]
    pub current_name: String,
}

// =============================================================================
// View Models
// =============================================================================

/// One row in the script table.
#[derive(Debug, Clone)]
pub struct ScriptRow {
    pub id: String,
    pub name: String,
    pub created: String,
    pub license_count: u64,
}

/// One license shown on the per-script page.
///
/// Unlike the main license table this stays with the raw Discord id;
/// the page is about the script, not the customer.
#[derive(Debug, Clone)]
pub struct ScriptLicenseRow {
    pub token: String,
    pub user_discord: String,
    pub binding: String,
    pub created: String,
    pub expires: String,
    /// Days until expiry for dated licenses, rounded up.
    pub days_remaining: Option<i64>,
    pub is_expired: bool,
}

impl ScriptLicenseRow {
    fn build(license: &License, now: chrono::NaiveDateTime) -> Self {
        let days_remaining = if license.is_permanent {
            None
        } else {
            Some(license.expires_at.map_or(0, |at| {
                expiry::days_between(at.naive_utc(), now)
            }))
        };

        let expires = if license.is_permanent {
            "Never".to_owned()
        } else {
            license.expires_at.map_or_else(
                || "-".to_owned(),
                |at| at.format("%Y-%m-%d %H:%M UTC").to_string(),
            )
        };

        Self {
            token: license.token.clone(),
            user_discord: license.user_discord.clone(),
            binding: license.ip_port.clone().unwrap_or_default(),
            created: license.created_at.format("%Y-%m-%d %H:%M UTC").to_string(),
            expires,
            is_expired: days_remaining.is_some_and(|days| days < 0),
            days_remaining,
        }
    }
}

/// Count licenses per script name.
pub(super) fn license_counts(licenses: &[License]) -> HashMap<String, u64> {
    let mut counts = HashMap::new();
    for license in licenses {
        *counts.entry(license.script_name.clone()).or_insert(0) += 1;
    }
    counts
}

// =============================================================================
// Templates
// =============================================================================

/// Script list page template.
#[derive(Template, WebTemplate)]
#[template(path = "scripts/index.html")]
pub struct ScriptIndexTemplate {
    pub user: UserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub query: String,
    pub rows: Vec<ScriptRow>,
    pub total: usize,
    pub error: Option<String>,
}

/// Per-script license page template.
#[derive(Template, WebTemplate)]
#[template(path = "scripts/licenses.html")]
pub struct ScriptLicensesTemplate {
    pub user: UserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub script_name: String,
    pub quantity: u64,
    pub rows: Vec<ScriptLicenseRow>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the script list.
pub async fn index(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<ScriptListQuery>,
) -> Result<Response, AppError> {
    if !user.role.is_admin() {
        return Ok(deny(&user, "/scripts"));
    }
    let flash = take_flash(&session).await;

    let (scripts, licenses) = tokio::join!(
        state.api().list_scripts(&user.access_token),
        state.api().list_licenses(&user.access_token),
    );

    let (scripts, error) = match scripts {
        Ok(scripts) => (scripts, None),
        Err(error) => {
            tracing::error!(%error, "Failed to load scripts");
            (Vec::new(), Some(error.user_message()))
        }
    };
    let counts = match licenses {
        Ok(licenses) => license_counts(&licenses),
        Err(error) => {
            tracing::warn!(%error, "Failed to load licenses for script counts");
            HashMap::new()
        }
    };

    let total = scripts.len();
    let q = query.name.as_deref().unwrap_or("").trim().to_owned();
    let needle = q.to_lowercase();
    let rows = scripts
        .iter()
        .filter(|script| needle.is_empty() || script.name.to_lowercase().contains(&needle))
        .map(|script| ScriptRow {
            id: script.id.clone(),
            name: script.name.clone(),
            created: script.created_at.format("%Y-%m-%d").to_string(),
            license_count: counts.get(&script.name).copied().unwrap_or(0),
        })
        .collect();

    Ok(ScriptIndexTemplate {
        user: UserView::from(&user),
        current_path: "/scripts".to_owned(),
        flash,
        query: q,
        rows,
        total,
        error,
    }
    .into_response())
}

/// Handle the create form submission.
pub async fn create(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CreateScriptForm>,
) -> Result<Response, AppError> {
    if !user.role.is_admin() {
        return Ok(deny(&user, "/scripts"));
    }

    let name = form.name.trim();
    if name.is_empty() {
        set_flash(&session, Flash::error("Script name is required.")).await?;
        return Ok(Redirect::to("/scripts").into_response());
    }

    match state.api().create_script(&user.access_token, name).await {
        Ok(script) => {
            set_flash(
                &session,
                Flash::success(format!("Script \"{}\" created.", script.name)),
            )
            .await?;
        }
        Err(error) => set_flash(&session, Flash::error(error.user_message())).await?,
    }
    Ok(Redirect::to("/scripts").into_response())
}

/// Handle the rename form submission.
///
/// An empty or unchanged name is a silent no-op.
pub async fn rename(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Form(form): Form<RenameScriptForm>,
) -> Result<Response, AppError> {
    if !user.role.is_admin() {
        return Ok(deny(&user, "/scripts"));
    }

    let name = form.name.trim();
    if name.is_empty() || name == form.current_name {
        return Ok(Redirect::to("/scripts").into_response());
    }

    match state.api().rename_script(&user.access_token, &id, name).await {
        Ok(script) => {
            set_flash(
                &session,
                Flash::success(format!("Script renamed to \"{}\".", script.name)),
            )
            .await?;
        }
        Err(error) => set_flash(&session, Flash::error(error.user_message())).await?,
    }
    Ok(Redirect::to("/scripts").into_response())
}

/// Handle the delete action.
pub async fn delete(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    if !user.role.is_admin() {
        return Ok(deny(&user, "/scripts"));
    }

    match state.api().delete_script(&user.access_token, &id).await {
        Ok(()) => {
            set_flash(
                &session,
                Flash::success("Script deleted. Its licenses were not removed."),
            )
            .await?;
        }
        Err(error) => set_flash(&session, Flash::error(error.user_message())).await?,
    }
    Ok(Redirect::to("/scripts").into_response())
}

/// Display the licenses issued for one script.
pub async fn licenses(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Response, AppError> {
    if !user.role.is_admin() {
        return Ok(deny(&user, "/scripts"));
    }
    let flash = take_flash(&session).await;

    let data = match state.api().script_licenses(&user.access_token, &id).await {
        Ok(data) => data,
        Err(error) => {
            set_flash(&session, Flash::error(error.user_message())).await?;
            return Ok(Redirect::to("/scripts").into_response());
        }
    };

    let now = Utc::now().naive_utc();
    let rows = data
        .licenses
        .iter()
        .map(|license| ScriptLicenseRow::build(license, now))
        .collect();

    Ok(ScriptLicensesTemplate {
        user: UserView::from(&user),
        current_path: "/scripts".to_owned(),
        flash,
        script_name: data.script.name,
        quantity: data.quantity,
        rows,
    }
    .into_response())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn license(script_name: &str) -> License {
        serde_json::from_value(serde_json::json!({
            "_id": format!("lic-{script_name}"),
            "token": format!("tok-{script_name}"),
            "scriptName": script_name,
            "userDiscord": "735388907772051497",
            "isPermanent": false,
            "createdAt": "2026-01-01T00:00:00Z",
            "updatedAt": "2026-01-01T00:00:00Z",
        }))
        .unwrap()
    }

    #[test]
    fn test_license_counts_group_by_script_name() {
        let licenses = vec![
            license("vehicle-shop"),
            license("vehicle-shop"),
            license("garage"),
        ];
        let counts = license_counts(&licenses);
        assert_eq!(counts.get("vehicle-shop"), Some(&2));
        assert_eq!(counts.get("garage"), Some(&1));
        assert_eq!(counts.get("housing"), None);
    }

    #[test]
    fn test_license_counts_empty() {
        assert!(license_counts(&[]).is_empty());
    }

    #[test]
    fn test_script_license_row_days_remaining() {
        let now = chrono::NaiveDate::from_ymd_opt(2026, 1, 10)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();

        let mut lic = license("vehicle-shop");
        lic.expires_at = Some("2026-01-15T00:00:00Z".parse().unwrap());
        let row = ScriptLicenseRow::build(&lic, now);
        assert_eq!(row.days_remaining, Some(5));
        assert!(!row.is_expired);

        lic.expires_at = Some("2026-01-01T00:00:00Z".parse().unwrap());
        let row = ScriptLicenseRow::build(&lic, now);
        assert_eq!(row.days_remaining, Some(-9));
        assert!(row.is_expired);

        lic.is_permanent = true;
        let row = ScriptLicenseRow::build(&lic, now);
        assert_eq!(row.days_remaining, None);
        assert!(!row.is_expired);
        assert_eq!(row.expires, "Never");
    }
}
