//! License operations.
//!
//! Expiry changes are expressed as day deltas (`add-days` / `remove-days`)
//! rather than absolute dates; the edit flow computes deltas before
//! calling in here.

use super::types::{
    CreateLicenseRequest, DeletedLicense, License, ModifyDaysRequest, UpdateIpRequest,
};
use super::{ApiClient, ApiError, error_from_response, read_json};

impl ApiClient {
    /// `POST /api/licenses`
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or a non-success status.
    pub async fn create_license(
        &self,
        access_token: &str,
        request: &CreateLicenseRequest,
    ) -> Result<License, ApiError> {
        let response = self
            .inner
            .http
            .post(self.url("/api/licenses"))
            .bearer_auth(access_token)
            .json(request)
            .send()
            .await?;
        read_json(response, "Failed to create license").await
    }

    /// `GET /api/licenses`
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or a non-success status.
    pub async fn list_licenses(&self, access_token: &str) -> Result<Vec<License>, ApiError> {
        let response = self
            .inner
            .http
            .get(self.url("/api/licenses"))
            .bearer_auth(access_token)
            .send()
            .await?;
        read_json(response, "Failed to fetch licenses").await
    }

    /// `GET /api/licenses/{token}`
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or a non-success status.
    pub async fn get_license(&self, access_token: &str, token: &str) -> Result<License, ApiError> {
        let response = self
            .inner
            .http
            .get(self.url(&format!("/api/licenses/{token}")))
            .bearer_auth(access_token)
            .send()
            .await?;
        read_json(response, "Failed to fetch license").await
    }

    /// `DELETE /api/licenses/{token}`
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or a non-success status.
    pub async fn delete_license(
        &self,
        access_token: &str,
        token: &str,
    ) -> Result<DeletedLicense, ApiError> {
        let response = self
            .inner
            .http
            .delete(self.url(&format!("/api/licenses/{token}")))
            .bearer_auth(access_token)
            .send()
            .await?;
        read_json(response, "Failed to delete license").await
    }

    /// `PATCH /api/licenses/{token}/ip`
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or a non-success status.
    pub async fn update_license_ip(
        &self,
        access_token: &str,
        token: &str,
        ip_port: &str,
    ) -> Result<License, ApiError> {
        let response = self
            .inner
            .http
            .patch(self.url(&format!("/api/licenses/{token}/ip")))
            .bearer_auth(access_token)
            .json(&UpdateIpRequest {
                ip_port: ip_port.to_string(),
            })
            .send()
            .await?;
        read_json(response, "Failed to update license IP").await
    }

    /// `PATCH /api/licenses/{token}/add-days`
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or a non-success status.
    pub async fn add_license_days(
        &self,
        access_token: &str,
        token: &str,
        days: i64,
    ) -> Result<License, ApiError> {
        let response = self
            .inner
            .http
            .patch(self.url(&format!("/api/licenses/{token}/add-days")))
            .bearer_auth(access_token)
            .json(&ModifyDaysRequest { days })
            .send()
            .await?;
        read_json(response, "Failed to add days to license").await
    }

    /// `PATCH /api/licenses/{token}/remove-days`
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or a non-success status.
    pub async fn remove_license_days(
        &self,
        access_token: &str,
        token: &str,
        days: i64,
    ) -> Result<License, ApiError> {
        let response = self
            .inner
            .http
            .patch(self.url(&format!("/api/licenses/{token}/remove-days")))
            .bearer_auth(access_token)
            .json(&ModifyDaysRequest { days })
            .send()
            .await?;
        read_json(response, "Failed to remove days from license").await
    }

    /// `PATCH /api/licenses/{token}/make-permanent`
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or a non-success status.
    pub async fn make_license_permanent(
        &self,
        access_token: &str,
        token: &str,
    ) -> Result<License, ApiError> {
        let response = self
            .inner
            .http
            .patch(self.url(&format!("/api/licenses/{token}/make-permanent")))
            .bearer_auth(access_token)
            .send()
            .await?;
        read_json(response, "Failed to make license permanent").await
    }

    /// `PATCH /api/licenses/{token}/make-temporary`
    ///
    /// The hosted API rolled this endpoint out after make-permanent, so the
    /// fallback message carries the status code to make an unsupported
    /// deployment obvious.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or a non-success status.
    pub async fn make_license_temporary(
        &self,
        access_token: &str,
        token: &str,
    ) -> Result<License, ApiError> {
        let response = self
            .inner
            .http
            .patch(self.url(&format!("/api/licenses/{token}/make-temporary")))
            .bearer_auth(access_token)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let fallback = format!(
                "Failed to make license temporary (HTTP {})",
                status.as_u16()
            );
            return Err(error_from_response(response, &fallback).await);
        }
        response
            .json::<License>()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }
}
