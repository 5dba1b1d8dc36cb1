//! Backend session endpoints.
//!
//! These live at the API root rather than under `/api`: `GET /user`
//! answers with the authenticated operator, `GET /logout` tears the
//! backend session down.

use super::types::User;
use super::{ApiClient, ApiError, error_from_response, read_json};

impl ApiClient {
    /// `GET /user`
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or when the token is no
    /// longer accepted.
    pub async fn current_user(&self, access_token: &str) -> Result<User, ApiError> {
        let response = self
            .inner
            .http
            .get(self.url("/user"))
            .bearer_auth(access_token)
            .send()
            .await?;
        read_json(response, "Not authenticated").await
    }

    /// `GET /logout`
    ///
    /// # Errors
    ///
    /// Returns `ApiError` on transport failure or a non-success status.
    /// Callers treat this as best effort and clear local state either way.
    pub async fn logout(&self, access_token: &str) -> Result<(), ApiError> {
        let response = self
            .inner
            .http
            .get(self.url("/logout"))
            .bearer_auth(access_token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(error_from_response(response, "Failed to log out").await);
        }
        Ok(())
    }
}
