//! Shared application state.

use std::sync::Arc;

use crate::api::{ApiClient, ApiError};
use crate::config::DashboardConfig;
use crate::services::profiles::ProfileService;

/// Application state shared across all request handlers.
///
/// Cheap to clone; all fields live behind one `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: DashboardConfig,
    api: ApiClient,
    profiles: ProfileService,
}

impl AppState {
    /// Create application state from configuration.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if an HTTP client cannot be constructed.
    pub fn new(config: DashboardConfig) -> Result<Self, ApiError> {
        let api = ApiClient::new(&config.api_base_url)?;
        let profiles = ProfileService::new(&config.profile_api_url)?;
        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                api,
                profiles,
            }),
        })
    }

    /// Application configuration.
    #[must_use]
    pub fn config(&self) -> &DashboardConfig {
        &self.inner.config
    }

    /// License API client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Discord profile lookup service.
    #[must_use]
    pub fn profiles(&self) -> &ProfileService {
        &self.inner.profiles
    }
}
