//! Script product operations.

use super::types::{Script, ScriptLicenses, ScriptNameRequest};
use super::{ApiClient, ApiError, error_from_response, read_json};

impl ApiClient {
    /// `POST /api/scripts`
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or a non-success status.
    pub async fn create_script(&self, access_token: &str, name: &str) -> Result<Script, ApiError> {
        let response = self
            .inner
            .http
            .post(self.url("/api/scripts"))
            .bearer_auth(access_token)
            .json(&ScriptNameRequest {
                name: name.to_string(),
            })
            .send()
            .await?;
        read_json(response, "Failed to create script").await
    }

    /// `GET /api/scripts`
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or a non-success status.
    pub async fn list_scripts(&self, access_token: &str) -> Result<Vec<Script>, ApiError> {
        let response = self
            .inner
            .http
            .get(self.url("/api/scripts"))
            .bearer_auth(access_token)
            .send()
            .await?;
        read_json(response, "Failed to fetch scripts").await
    }

    /// `GET /api/scripts/{id}`
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or a non-success status.
    pub async fn get_script(&self, access_token: &str, id: &str) -> Result<Script, ApiError> {
        let response = self
            .inner
            .http
            .get(self.url(&format!("/api/scripts/{id}")))
            .bearer_auth(access_token)
            .send()
            .await?;
        read_json(response, "Failed to fetch script").await
    }

    /// `PATCH /api/scripts/{id}`
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or a non-success status.
    pub async fn rename_script(
        &self,
        access_token: &str,
        id: &str,
        name: &str,
    ) -> Result<Script, ApiError> {
        let response = self
            .inner
            .http
            .patch(self.url(&format!("/api/scripts/{id}")))
            .bearer_auth(access_token)
            .json(&ScriptNameRequest {
                name: name.to_string(),
            })
            .send()
            .await?;
        read_json(response, "Failed to rename script").await
    }

    /// `DELETE /api/scripts/{id}`
    ///
    /// Licenses issued for the script are left untouched by the backend.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or a non-success status.
    pub async fn delete_script(&self, access_token: &str, id: &str) -> Result<(), ApiError> {
        let response = self
            .inner
            .http
            .delete(self.url(&format!("/api/scripts/{id}")))
            .bearer_auth(access_token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(error_from_response(response, "Failed to delete script").await);
        }
        Ok(())
    }

    /// `GET /api/scripts/{id}/licenses`
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or a non-success status.
    pub async fn script_licenses(
        &self,
        access_token: &str,
        id: &str,
    ) -> Result<ScriptLicenses, ApiError> {
        let response = self
            .inner
            .http
            .get(self.url(&format!("/api/scripts/{id}/licenses")))
            .bearer_auth(access_token)
            .send()
            .await?;
        read_json(response, "Failed to fetch script licenses").await
    }
}
