//! Overview aggregates.

use super::types::DashboardSummary;
use super::{ApiClient, ApiError, read_json};

impl ApiClient {
    /// `GET /api/dashboard-infos`
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or a non-success status.
    pub async fn dashboard_summary(&self, access_token: &str) -> Result<DashboardSummary, ApiError> {
        let response = self
            .inner
            .http
            .get(self.url("/api/dashboard-infos"))
            .bearer_auth(access_token)
            .send()
            .await?;
        read_json(response, "Failed to load dashboard stats").await
    }
}
