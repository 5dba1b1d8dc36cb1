//! Audit log route handlers.
//!
//! Filtering and pagination live on the backend; this page just
//! translates its own query string into the wire query and back into
//! links that keep every active filter.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use crate::api::LogQuery;
use crate::api::types::{LicenseLog, LogsPage, Pagination};
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireUser;
use crate::services::flash::{Flash, take_flash};
use crate::services::profiles::ProfileMap;
use crate::state::AppState;

use super::{UserView, deny};

// =============================================================================
// Query Types
// =============================================================================

/// Query parameters for the audit log page.
#[derive(Debug, Default, Deserialize)]
pub struct LogsPageQuery {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub actor: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub script: Option<String>,
}

impl LogsPageQuery {
    fn to_wire(&self) -> LogQuery {
        LogQuery {
            page: self.page.unwrap_or(1),
            limit: self.limit.unwrap_or(20),
            action: clean(self.action.as_deref()),
            actor_type: clean(self.actor.as_deref()),
            token: clean(self.token.as_deref()),
            user_discord: clean(self.user.as_deref()),
            script_name: clean(self.script.as_deref()),
        }
    }
}

fn clean(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

/// Build a `/logs` URL for `page`, carrying the active filters.
fn page_url(query: &LogsPageQuery, page: u32) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    serializer.append_pair("page", &page.to_string());
    serializer.append_pair("limit", &query.limit.unwrap_or(20).to_string());
    for (key, value) in [
        ("action", clean(query.action.as_deref())),
        ("actor", clean(query.actor.as_deref())),
        ("token", clean(query.token.as_deref())),
        ("user", clean(query.user.as_deref())),
        ("script", clean(query.script.as_deref())),
    ] {
        if let Some(value) = value {
            serializer.append_pair(key, &value);
        }
    }
    format!("/logs?{}", serializer.finish())
}

// =============================================================================
// View Models
// =============================================================================

/// One audit log entry as rendered.
#[derive(Debug, Clone)]
pub struct LogRow {
    pub action: &'static str,
    /// CSS suffix for the action badge.
    pub action_class: &'static str,
    pub actor_name: String,
    pub actor_initial: String,
    pub actor_type: &'static str,
    pub license_token: Option<String>,
    pub script_name: Option<String>,
    pub user_discord: Option<String>,
    pub request_ip: Option<String>,
    pub created: String,
    /// Present whenever the entry carries details.
    pub source: Option<String>,
}

impl LogRow {
    fn build(log: &LicenseLog, profiles: &ProfileMap) -> Self {
        let discord_id = log.actor_discord_id.as_deref().filter(|id| !id.is_empty());
        // Stored username wins; otherwise the enriched profile, then the raw id.
        let username = log
            .actor_username
            .clone()
            .filter(|name| !name.is_empty())
            .or_else(|| {
                discord_id
                    .and_then(|id| profiles.get(id))
                    .map(|profile| profile.username.clone())
            });

        let actor_name = username
            .clone()
            .or_else(|| discord_id.map(str::to_owned))
            .unwrap_or_else(|| "Unknown".to_owned());

        let actor_initial = username
            .as_deref()
            .and_then(|name| name.chars().next())
            .map(|c| c.to_uppercase().to_string())
            .or_else(|| {
                discord_id.map(|id| {
                    let skip = id.chars().count().saturating_sub(2);
                    id.chars().skip(skip).collect()
                })
            })
            .filter(|initial: &String| !initial.is_empty())
            .unwrap_or_else(|| "?".to_owned());

        let source = log.details.as_ref().map(|details| {
            details
                .get("actionSource")
                .and_then(|value| value.as_str())
                .unwrap_or("-")
                .to_owned()
        });

        Self {
            action: log.action.as_str(),
            action_class: match log.action {
                crate::api::types::LogAction::Create => "create",
                crate::api::types::LogAction::Update => "update",
                crate::api::types::LogAction::Delete => "delete",
            },
            actor_name,
            actor_initial,
            actor_type: log.actor_type.as_str(),
            license_token: log.license_token.clone().filter(|t| !t.is_empty()),
            script_name: log.script_name.clone().filter(|s| !s.is_empty()),
            user_discord: log.user_discord.clone().filter(|u| !u.is_empty()),
            request_ip: log.request_ip.clone().filter(|ip| !ip.is_empty()),
            created: log.created_at.format("%Y-%m-%d %H:%M UTC").to_string(),
            source,
        }
    }
}

/// Pagination controls for the log page.
#[derive(Debug, Clone)]
pub struct PageNav {
    pub prev_url: Option<String>,
    pub next_url: Option<String>,
    pub label: String,
}

impl PageNav {
    fn build(pagination: &Pagination, query: &LogsPageQuery) -> Option<Self> {
        if pagination.total_pages <= 1 {
            return None;
        }
        Some(Self {
            prev_url: (pagination.page > 1).then(|| page_url(query, pagination.page - 1)),
            next_url: (pagination.page < pagination.total_pages)
                .then(|| page_url(query, pagination.page + 1)),
            label: format!(
                "Page {} of {} · {} records",
                pagination.page, pagination.total_pages, pagination.total
            ),
        })
    }
}

// =============================================================================
// Templates
// =============================================================================

/// Audit log page template.
#[derive(Template, WebTemplate)]
#[template(path = "logs/index.html")]
pub struct LogsTemplate {
    pub user: UserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub rows: Vec<LogRow>,
    pub nav: Option<PageNav>,
    pub action: String,
    pub actor: String,
    pub token: String,
    pub user_filter: String,
    pub script: String,
    pub limit: u32,
    pub error: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the audit log.
pub async fn index(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<LogsPageQuery>,
) -> Result<Response, AppError> {
    if !user.role.is_admin() {
        return Ok(deny(&user, "/logs"));
    }
    let flash = take_flash(&session).await;

    let wire = query.to_wire();
    let (rows, nav, error) = match state.api().license_logs(&user.access_token, &wire).await {
        Ok(LogsPage { data, pagination }) => {
            // Resolve actor names for entries that only carry a Discord id.
            let missing = data
                .iter()
                .filter(|log| {
                    log.actor_username
                        .as_deref()
                        .is_none_or(|name| name.is_empty())
                })
                .filter_map(|log| log.actor_discord_id.clone())
                .filter(|id| !id.is_empty());
            let profiles = state.profiles().resolve_many(missing).await;

            let rows = data
                .iter()
                .map(|log| LogRow::build(log, &profiles))
                .collect();
            (rows, PageNav::build(&pagination, &query), None)
        }
        Err(error) => {
            tracing::error!(%error, "Failed to load license logs");
            (Vec::new(), None, Some(error.user_message()))
        }
    };

    Ok(LogsTemplate {
        user: UserView::from(&user),
        current_path: "/logs".to_owned(),
        flash,
        rows,
        nav,
        action: query.action.clone().unwrap_or_default(),
        actor: query.actor.clone().unwrap_or_default(),
        token: query.token.clone().unwrap_or_default(),
        user_filter: query.user.clone().unwrap_or_default(),
        script: query.script.clone().unwrap_or_default(),
        limit: query.limit.unwrap_or(20),
        error,
    }
    .into_response())
}
