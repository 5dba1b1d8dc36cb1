//! License route handlers.
//!
//! The edit flow is the subtle part: the license API has no blanket
//! update endpoint, only per-field ones (`ip`, `add-days`, `remove-days`,
//! `make-permanent`). A submitted edit form is diffed against the stored
//! license and translated into the minimal call sequence, executed in
//! order and stopped at the first failure.

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

use keywarden_core::{IpPort, expiry, expiry::ExpiryError};

use crate::api::types::{CreateLicenseRequest, License, Script, User};
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireUser;
use crate::services::flash::{Flash, set_flash, take_flash};
use crate::services::profiles::ProfileMap;
use crate::state::AppState;

use super::{UserView, deny};

// =============================================================================
// Form and Query Types
// =============================================================================

/// Query parameters for the license list.
#[derive(Debug, Deserialize)]
pub struct LicenseListQuery {
    /// Discord id filter, matched case-sensitively as a substring.
    #[serde(default)]
    pub user: Option<String>,
}

/// Create form data.
#[derive(Debug, Default, Deserialize)]
pub struct CreateLicenseForm {
    #[serde(default)]
    pub script_id: String,
    #[serde(default)]
    pub user_discord: String,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub port: String,
    #[serde(default)]
    pub expires_at: String,
    /// Checkboxes submit a value only when checked.
    #[serde(default)]
    pub is_permanent: Option<String>,
}

/// Edit form data.
#[derive(Debug, Default, Deserialize)]
pub struct EditLicenseForm {
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub port: String,
    #[serde(default)]
    pub expires_at: String,
    #[serde(default)]
    pub is_permanent: Option<String>,
}

// =============================================================================
// View Models
// =============================================================================

/// One row in the license table.
#[derive(Debug, Clone)]
pub struct LicenseRow {
    pub token: String,
    pub script_name: String,
    pub display_name: String,
    pub avatar_url: Option<String>,
    /// Last characters of the Discord id, shown when there is no avatar.
    pub discord_tail: String,
    pub ip: String,
    pub port: String,
    pub created: String,
    /// Expiry date for dated licenses; empty when permanent or unset.
    pub expires: String,
    pub is_permanent: bool,
    pub is_expired: bool,
}

impl LicenseRow {
    fn build(license: &License, profiles: &ProfileMap) -> Self {
        let profile = profiles.get(&license.user_discord);

        let display_name = non_empty(license.user_name.as_deref())
            .map(str::to_owned)
            .or_else(|| profile.map(|p| p.username.clone()))
            .unwrap_or_else(|| license.user_discord.clone());

        let avatar_url = non_empty(license.user_avatar.as_deref())
            .map(str::to_owned)
            .or_else(|| profile.and_then(|p| p.avatar_url.clone()));

        let binding = IpPort::parse(license.ip_port.as_deref().unwrap_or_default());

        Self {
            token: license.token.clone(),
            script_name: license.script_name.clone(),
            display_name,
            avatar_url,
            discord_tail: tail_chars(&license.user_discord, 2),
            ip: binding.ip,
            port: binding.port,
            created: license.created_at.format("%Y-%m-%d").to_string(),
            expires: license
                .expires_at
                .map(|at| at.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            is_permanent: license.is_permanent,
            is_expired: is_expired(license),
        }
    }
}

/// Detail page data for a single license.
#[derive(Debug, Clone)]
pub struct LicenseDetail {
    pub token: String,
    pub script_name: String,
    pub user_discord: String,
    pub display_name: String,
    pub binding: String,
    pub created: String,
    pub expires: String,
    pub is_permanent: bool,
    pub is_expired: bool,
}

impl LicenseDetail {
    fn build(license: &License, display_name: String) -> Self {
        let binding = match license.ip_port.as_deref() {
            Some(ip_port) if !ip_port.is_empty() => ip_port.to_owned(),
            _ => "-".to_owned(),
        };

        let expires = if license.is_permanent {
            "Never".to_owned()
        } else {
            license
                .expires_at
                .map_or_else(|| "-".to_owned(), format_timestamp)
        };

        Self {
            token: license.token.clone(),
            script_name: license.script_name.clone(),
            user_discord: license.user_discord.clone(),
            display_name,
            binding,
            created: format_timestamp(license.created_at),
            expires,
            is_permanent: license.is_permanent,
            is_expired: is_expired(license),
        }
    }
}

pub(super) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

fn tail_chars(value: &str, count: usize) -> String {
    let skip = value.chars().count().saturating_sub(count);
    value.chars().skip(skip).collect()
}

pub(super) fn is_expired(license: &License) -> bool {
    !license.is_permanent && license.expires_at.is_some_and(|at| at < Utc::now())
}

fn format_timestamp(at: chrono::DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M UTC").to_string()
}

// =============================================================================
// Templates
// =============================================================================

/// License list page template.
#[derive(Template, WebTemplate)]
#[template(path = "licenses/index.html")]
pub struct LicenseIndexTemplate {
    pub user: UserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub query: String,
    pub rows: Vec<LicenseRow>,
    pub can_create: bool,
    pub error: Option<String>,
}

/// Create form page template.
#[derive(Template, WebTemplate)]
#[template(path = "licenses/new.html")]
pub struct LicenseNewTemplate {
    pub user: UserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub scripts: Vec<Script>,
    pub form: CreateLicenseForm,
    pub error: Option<String>,
}

/// License detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "licenses/show.html")]
pub struct LicenseShowTemplate {
    pub user: UserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub detail: LicenseDetail,
}

/// Edit form page template.
#[derive(Template, WebTemplate)]
#[template(path = "licenses/edit.html")]
pub struct LicenseEditTemplate {
    pub user: UserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub token: String,
    pub script_name: String,
    pub user_discord: String,
    pub ip: String,
    pub port: String,
    pub expires_at: String,
    pub is_permanent: bool,
    pub already_permanent: bool,
    pub error: Option<String>,
}

// =============================================================================
// Change Planning
// =============================================================================

/// One backend call in a license edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LicenseChange {
    UpdateIpPort(String),
    MakePermanent,
    AddDays(i64),
    RemoveDays(i64),
}

/// Work out which backend calls an edit form requires.
///
/// Only changed fields produce calls, in a fixed order: binding first,
/// then permanence, then the expiry shift. The expiry shift is an exact
/// whole-day difference between the stored and requested dates, and is
/// only computed when the license has a date on both sides and neither
/// side is permanent. A cleared ip field never produces a call - the
/// backend has no way to remove a binding.
fn plan_changes(license: &License, form: &EditLicenseForm) -> Result<Vec<LicenseChange>, String> {
    let binding = IpPort::from_fields(&form.ip, &form.port);
    if !binding.port.is_empty() && binding.port.parse::<u32>().is_err() {
        return Err("Invalid port.".to_owned());
    }

    let mut changes = Vec::new();

    let new_ip_port = binding.combined();
    let current = license.ip_port.clone().unwrap_or_default();
    if !new_ip_port.is_empty() && new_ip_port != current {
        changes.push(LicenseChange::UpdateIpPort(new_ip_port));
    }

    let wants_permanent = form.is_permanent.is_some();
    if !license.is_permanent && wants_permanent {
        changes.push(LicenseChange::MakePermanent);
    }

    if !wants_permanent && !license.is_permanent {
        let original = license.expires_at.map(|at| at.date_naive());
        let target = expiry::date_only(&form.expires_at);
        if let (Some(original), Some(target)) = (original, target) {
            let diff = expiry::difference_in_days(target, original);
            if diff > 0 {
                changes.push(LicenseChange::AddDays(diff));
            } else if diff < 0 {
                changes.push(LicenseChange::RemoveDays(diff.abs()));
            }
        }
    }

    Ok(changes)
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the license list.
pub async fn index(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<LicenseListQuery>,
) -> Result<Response, AppError> {
    if !user.role.is_admin() {
        return Ok(deny(&user, "/licenses"));
    }
    let flash = take_flash(&session).await;

    let (licenses, scripts) = tokio::join!(
        state.api().list_licenses(&user.access_token),
        state.api().list_scripts(&user.access_token),
    );

    let (licenses, error) = match licenses {
        Ok(licenses) => (licenses, None),
        Err(error) => {
            tracing::error!(%error, "Failed to load licenses");
            (Vec::new(), Some(error.user_message()))
        }
    };
    let can_create = match scripts {
        Ok(scripts) => !scripts.is_empty(),
        Err(error) => {
            tracing::warn!(%error, "Failed to load scripts for the license list");
            false
        }
    };

    let q = query.user.as_deref().unwrap_or("").trim().to_owned();
    let filtered: Vec<&License> = if q.is_empty() {
        licenses.iter().collect()
    } else {
        licenses
            .iter()
            .filter(|license| license.user_discord.contains(&q))
            .collect()
    };

    // Resolve usernames and avatars the backend did not cache
    let missing: Vec<String> = filtered
        .iter()
        .filter(|license| {
            !(non_empty(license.user_name.as_deref()).is_some()
                && non_empty(license.user_avatar.as_deref()).is_some())
        })
        .map(|license| license.user_discord.clone())
        .collect();
    let profiles = state.profiles().resolve_many(missing).await;

    let rows = filtered
        .iter()
        .map(|license| LicenseRow::build(license, &profiles))
        .collect();

    Ok(LicenseIndexTemplate {
        user: UserView::from(&user),
        current_path: "/licenses".to_owned(),
        flash,
        query: q,
        rows,
        can_create,
        error,
    }
    .into_response())
}

/// Display the create form.
pub async fn new_form(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    session: Session,
) -> Result<Response, AppError> {
    if !user.role.is_admin() {
        return Ok(deny(&user, "/licenses"));
    }
    let flash = take_flash(&session).await;

    let (scripts, error) = match state.api().list_scripts(&user.access_token).await {
        Ok(scripts) => (scripts, None),
        Err(error) => (Vec::new(), Some(error.user_message())),
    };

    Ok(LicenseNewTemplate {
        user: UserView::from(&user),
        current_path: "/licenses".to_owned(),
        flash,
        scripts,
        form: CreateLicenseForm::default(),
        error,
    }
    .into_response())
}

/// Handle the create form submission.
pub async fn create(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<CreateLicenseForm>,
) -> Result<Response, AppError> {
    if !user.role.is_admin() {
        return Ok(deny(&user, "/licenses"));
    }

    if form.script_id.is_empty() || form.user_discord.is_empty() {
        return render_new(&state, &user, form, Some("Fill in script and user.".to_owned())).await;
    }

    // A pasted `ip:port` in the ip field is split the same way the form
    // fields would have been filled in separately.
    let binding = IpPort::from_fields(&form.ip, &form.port);
    let port = if binding.port.is_empty() {
        None
    } else {
        match binding.port.parse::<u16>() {
            Ok(port) => Some(port),
            Err(_) => {
                return render_new(&state, &user, form, Some("Invalid port.".to_owned())).await;
            }
        }
    };

    let mut request = CreateLicenseRequest {
        script_id: form.script_id.clone(),
        user_discord: form.user_discord.clone(),
        ip: (!binding.ip.is_empty()).then(|| binding.ip.clone()),
        port,
        expires_in_days: None,
        is_permanent: None,
    };

    if form.is_permanent.is_some() {
        request.is_permanent = Some(true);
    } else if !form.expires_at.trim().is_empty() {
        match expiry::days_for_new_expiry(&form.expires_at) {
            Ok(days) => request.expires_in_days = Some(days),
            Err(error) => {
                let message = expiry_message(&error).to_owned();
                return render_new(&state, &user, form, Some(message)).await;
            }
        }
    }

    match state.api().create_license(&user.access_token, &request).await {
        Ok(license) => {
            set_flash(
                &session,
                Flash::success(format!("License created for {}.", license.user_discord)),
            )
            .await?;
            Ok(Redirect::to("/licenses").into_response())
        }
        Err(error) => render_new(&state, &user, form, Some(error.user_message())).await,
    }
}

/// Display one license.
pub async fn show(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    session: Session,
    Path(token): Path<String>,
) -> Result<Response, AppError> {
    if !user.role.is_admin() {
        return Ok(deny(&user, "/licenses"));
    }
    let flash = take_flash(&session).await;

    let license = match state.api().get_license(&user.access_token, &token).await {
        Ok(license) => license,
        Err(error) => {
            set_flash(&session, Flash::error(error.user_message())).await?;
            return Ok(Redirect::to("/licenses").into_response());
        }
    };

    let display_name = match non_empty(license.user_name.as_deref()) {
        Some(name) => name.to_owned(),
        None => state
            .profiles()
            .lookup(&license.user_discord)
            .await
            .map_or_else(|| license.user_discord.clone(), |p| p.username),
    };

    Ok(LicenseShowTemplate {
        user: UserView::from(&user),
        current_path: "/licenses".to_owned(),
        flash,
        detail: LicenseDetail::build(&license, display_name),
    }
    .into_response())
}

/// Display the edit form, prefilled from the stored license.
pub async fn edit_form(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    session: Session,
    Path(token): Path<String>,
) -> Result<Response, AppError> {
    if !user.role.is_admin() {
        return Ok(deny(&user, "/licenses"));
    }
    let flash = take_flash(&session).await;

    let license = match state.api().get_license(&user.access_token, &token).await {
        Ok(license) => license,
        Err(error) => {
            set_flash(&session, Flash::error(error.user_message())).await?;
            return Ok(Redirect::to("/licenses").into_response());
        }
    };

    let binding = IpPort::parse(license.ip_port.as_deref().unwrap_or_default());
    let form = EditLicenseForm {
        ip: binding.ip,
        port: binding.port,
        expires_at: license
            .expires_at
            .map(|at| at.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        is_permanent: license.is_permanent.then(|| "true".to_owned()),
    };

    Ok(edit_page(&user, &license, &form, None, flash))
}

/// Handle the edit form submission.
pub async fn update(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    session: Session,
    Path(token): Path<String>,
    Form(form): Form<EditLicenseForm>,
) -> Result<Response, AppError> {
    if !user.role.is_admin() {
        return Ok(deny(&user, "/licenses"));
    }

    let license = match state.api().get_license(&user.access_token, &token).await {
        Ok(license) => license,
        Err(error) => {
            set_flash(&session, Flash::error(error.user_message())).await?;
            return Ok(Redirect::to("/licenses").into_response());
        }
    };

    let changes = match plan_changes(&license, &form) {
        Ok(changes) => changes,
        Err(message) => return Ok(edit_page(&user, &license, &form, Some(message), None)),
    };

    for change in &changes {
        let api = state.api();
        let outcome = match change {
            LicenseChange::UpdateIpPort(ip_port) => api
                .update_license_ip(&user.access_token, &license.token, ip_port)
                .await
                .map(|_| ()),
            LicenseChange::MakePermanent => api
                .make_license_permanent(&user.access_token, &license.token)
                .await
                .map(|_| ()),
            LicenseChange::AddDays(days) => api
                .add_license_days(&user.access_token, &license.token, *days)
                .await
                .map(|_| ()),
            LicenseChange::RemoveDays(days) => api
                .remove_license_days(&user.access_token, &license.token, *days)
                .await
                .map(|_| ()),
        };
        if let Err(error) = outcome {
            // Tokens stay out of logs; the prefix is enough to find the license.
            let token_prefix: String = license.token.chars().take(8).collect();
            tracing::warn!(%error, token = %token_prefix, "License edit stopped mid-sequence");
            return Ok(edit_page(
                &user,
                &license,
                &form,
                Some(error.user_message()),
                None,
            ));
        }
    }

    set_flash(&session, Flash::success("License updated.")).await?;
    Ok(Redirect::to("/licenses").into_response())
}

/// Handle the delete action.
pub async fn delete(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    session: Session,
    Path(token): Path<String>,
) -> Result<Response, AppError> {
    if !user.role.is_admin() {
        return Ok(deny(&user, "/licenses"));
    }

    match state.api().delete_license(&user.access_token, &token).await {
        Ok(_) => set_flash(&session, Flash::success("License deleted.")).await?,
        Err(error) => set_flash(&session, Flash::error(error.user_message())).await?,
    }
    Ok(Redirect::to("/licenses").into_response())
}

// =============================================================================
// Render Helpers
// =============================================================================

async fn render_new(
    state: &AppState,
    user: &User,
    form: CreateLicenseForm,
    error: Option<String>,
) -> Result<Response, AppError> {
    // Re-fetch the script list so the select stays populated
    let scripts = match state.api().list_scripts(&user.access_token).await {
        Ok(scripts) => scripts,
        Err(fetch_error) => {
            tracing::warn!(error = %fetch_error, "Failed to reload scripts for the create form");
            Vec::new()
        }
    };

    Ok(LicenseNewTemplate {
        user: UserView::from(user),
        current_path: "/licenses".to_owned(),
        flash: None,
        scripts,
        form,
        error,
    }
    .into_response())
}

fn edit_page(
    user: &User,
    license: &License,
    form: &EditLicenseForm,
    error: Option<String>,
    flash: Option<Flash>,
) -> Response {
    LicenseEditTemplate {
        user: UserView::from(user),
        current_path: "/licenses".to_owned(),
        flash,
        token: license.token.clone(),
        script_name: license.script_name.clone(),
        user_discord: license.user_discord.clone(),
        ip: form.ip.clone(),
        port: form.port.clone(),
        expires_at: form.expires_at.clone(),
        is_permanent: license.is_permanent || form.is_permanent.is_some(),
        already_permanent: license.is_permanent,
        error,
    }
    .into_response()
}

const fn expiry_message(error: &ExpiryError) -> &'static str {
    match error {
        ExpiryError::InvalidDate => "Expiry date is not a valid date.",
        ExpiryError::NotInFuture => "Expiry date must be in the future.",
    }
}
