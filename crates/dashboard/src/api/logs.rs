//! Audit log queries.
//!
//! Filtering and paging happen server side; this module's job is to put
//! on the wire exactly what the backend accepts.

use super::types::LogsPage;
use super::{ApiClient, ApiError, read_json};

/// Smallest page size the backend accepts.
const MIN_LIMIT: u32 = 1;
/// Largest page size the backend accepts.
const MAX_LIMIT: u32 = 100;

/// Filters for `GET /api/licenses/logs`.
///
/// Empty-string filters mean "no filter" and stay off the wire.
#[derive(Debug, Clone)]
pub struct LogQuery {
    pub page: u32,
    pub limit: u32,
    pub action: Option<String>,
    pub actor_type: Option<String>,
    pub token: Option<String>,
    pub user_discord: Option<String>,
    pub script_name: Option<String>,
}

impl Default for LogQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 20,
            action: None,
            actor_type: None,
            token: None,
            user_discord: None,
            script_name: None,
        }
    }
}

impl LogQuery {
    /// Query pairs for the wire, with page and limit clamped into the
    /// range the backend accepts and empty filters dropped.
    #[must_use]
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let page = self.page.max(1);
        let limit = self.limit.clamp(MIN_LIMIT, MAX_LIMIT);
        let mut params = vec![("page", page.to_string()), ("limit", limit.to_string())];
        push_filter(&mut params, "actorType", self.actor_type.as_deref());
        push_filter(&mut params, "action", self.action.as_deref());
        push_filter(&mut params, "token", self.token.as_deref());
        push_filter(&mut params, "userDiscord", self.user_discord.as_deref());
        push_filter(&mut params, "scriptName", self.script_name.as_deref());
        params
    }
}

fn push_filter(params: &mut Vec<(&'static str, String)>, key: &'static str, value: Option<&str>) {
    if let Some(value) = value {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            params.push((key, trimmed.to_string()));
        }
    }
}

impl ApiClient {
    /// `GET /api/licenses/logs`
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or a non-success status.
    pub async fn license_logs(
        &self,
        access_token: &str,
        query: &LogQuery,
    ) -> Result<LogsPage, ApiError> {
        let response = self
            .inner
            .http
            .get(self.url("/api/licenses/logs"))
            .bearer_auth(access_token)
            .query(&query.to_params())
            .send()
            .await?;
        read_json(response, "Failed to fetch license logs").await
    }
}
