//! Overview route handler.
//!
//! Three backend calls feed the page. Each one degrades on its own:
//! a failed call blanks only its panel and leaves an inline note, so
//! the page still renders when part of the backend is down.

use std::collections::HashMap;

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;

use crate::api::types::{DashboardSummary, License, TopScript, TopUser};
use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireUser;
use crate::services::flash::{Flash, take_flash};
use crate::services::profiles::ProfileMap;
use crate::state::AppState;

use super::licenses::{is_expired, non_empty};
use super::scripts::license_counts;
use super::{UserView, deny};

const RECENT_LICENSES: usize = 5;

// =============================================================================
// View Models
// =============================================================================

/// Aggregate stats panel.
#[derive(Debug, Clone)]
pub struct SummaryView {
    pub customers: u64,
    pub active_licenses: u64,
    pub scripts: u64,
    pub latest: Option<LatestLicenseView>,
    pub top_script: Option<TopScript>,
    pub top_user: Option<TopUser>,
}

impl SummaryView {
    fn build(summary: DashboardSummary) -> Self {
        Self {
            customers: summary.totals.customers,
            active_licenses: summary.totals.active_licenses,
            scripts: summary.totals.scripts,
            latest: summary.latest_license.map(|license| LatestLicenseView {
                display_name: non_empty(license.user_name.as_deref())
                    .unwrap_or(&license.user_discord)
                    .to_owned(),
                script_name: license.script_name,
                created: license.created_at.format("%Y-%m-%d %H:%M UTC").to_string(),
            }),
            top_script: summary.top_script,
            top_user: summary.top_user,
        }
    }
}

/// Most recently issued license, as the summary endpoint reports it.
#[derive(Debug, Clone)]
pub struct LatestLicenseView {
    pub script_name: String,
    pub display_name: String,
    pub created: String,
}

/// One row in the recent-licenses panel.
#[derive(Debug, Clone)]
pub struct RecentRow {
    pub script_name: String,
    pub display_name: String,
    pub created: String,
    pub is_expired: bool,
}

impl RecentRow {
    fn build(license: &License, profiles: &ProfileMap) -> Self {
        let display_name = non_empty(license.user_name.as_deref())
            .map(str::to_owned)
            .or_else(|| {
                profiles
                    .get(&license.user_discord)
                    .map(|profile| profile.username.clone())
            })
            .unwrap_or_else(|| license.user_discord.clone());
        Self {
            script_name: license.script_name.clone(),
            display_name,
            created: license.created_at.format("%Y-%m-%d").to_string(),
            is_expired: is_expired(license),
        }
    }
}

/// One card in the scripts panel.
#[derive(Debug, Clone)]
pub struct ScriptCard {
    pub name: String,
    pub created: String,
    pub license_count: u64,
}

/// Newest licenses first, at most `count` of them.
fn most_recent(licenses: &[License], count: usize) -> Vec<&License> {
    let mut ordered: Vec<&License> = licenses.iter().collect();
    ordered.sort_by_key(|license| std::cmp::Reverse(license.created_at));
    ordered.truncate(count);
    ordered
}

// =============================================================================
// Templates
// =============================================================================

/// Overview page template.
#[derive(Template, WebTemplate)]
#[template(path = "overview.html")]
pub struct OverviewTemplate {
    pub user: UserView,
    pub current_path: String,
    pub flash: Option<Flash>,
    pub summary: Option<SummaryView>,
    pub summary_error: Option<String>,
    pub recent: Vec<RecentRow>,
    pub licenses_error: Option<String>,
    pub script_cards: Vec<ScriptCard>,
    pub scripts_error: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the admin overview.
pub async fn index(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    session: Session,
) -> Result<Response, AppError> {
    if !user.role.is_admin() {
        return Ok(deny(&user, "/"));
    }
    let flash = take_flash(&session).await;

    let api = state.api();
    let (summary, licenses, scripts) = tokio::join!(
        api.dashboard_summary(&user.access_token),
        api.list_licenses(&user.access_token),
        api.list_scripts(&user.access_token),
    );

    let (summary, summary_error) = match summary {
        Ok(summary) => (Some(SummaryView::build(summary)), None),
        Err(error) => {
            tracing::error!(%error, "Failed to load dashboard stats");
            (None, Some(error.user_message()))
        }
    };

    let (recent, counts, licenses_error) = match licenses {
        Ok(list) => {
            let newest = most_recent(&list, RECENT_LICENSES);
            let missing = newest
                .iter()
                .filter(|license| non_empty(license.user_name.as_deref()).is_none())
                .map(|license| license.user_discord.clone());
            let profiles = state.profiles().resolve_many(missing).await;
            let rows = newest
                .into_iter()
                .map(|license| RecentRow::build(license, &profiles))
                .collect();
            (rows, license_counts(&list), None)
        }
        Err(error) => {
            tracing::error!(%error, "Failed to load licenses");
            (Vec::new(), HashMap::new(), Some(error.user_message()))
        }
    };

    let (script_cards, scripts_error) = match scripts {
        Ok(list) => {
            let cards = list
                .into_iter()
                .map(|script| ScriptCard {
                    license_count: counts.get(&script.name).copied().unwrap_or(0),
                    created: script.created_at.format("%Y-%m-%d").to_string(),
                    name: script.name,
                })
                .collect();
            (cards, None)
        }
        Err(error) => {
            tracing::error!(%error, "Failed to load scripts");
            (Vec::new(), Some(error.user_message()))
        }
    };

    Ok(OverviewTemplate {
        user: UserView::from(&user),
        current_path: "/".to_owned(),
        flash,
        summary,
        summary_error,
        recent,
        licenses_error,
        script_cards,
        scripts_error,
    }
    .into_response())
}
