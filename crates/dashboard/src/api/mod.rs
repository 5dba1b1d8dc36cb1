//! Typed client for the Keywarden license API.
//!
//! One [`ApiClient`] is shared process-wide through the application state;
//! resource operations live in sibling modules as `impl ApiClient` blocks.
//! Every operation authenticates with the signed-in operator's bearer
//! token, and every failure funnels into [`ApiError`].

mod licenses;
mod logs;
mod scripts;
mod session;
mod summary;
mod transform;
pub mod types;

pub use logs::LogQuery;

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Timeout applied to every license API call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors from the license API client.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network or protocol failure before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// The API answered with a non-success status.
    #[error("License API error ({status}): {message}")]
    Api { status: u16, message: String },
    /// The API answered 2xx with a body this client cannot decode.
    #[error("Unexpected license API response: {0}")]
    Parse(String),
}

impl ApiError {
    /// Message suitable for rendering to an operator.
    ///
    /// `Api` messages come from the backend (or an operation fallback) and
    /// are already operator-facing; transport and decode failures get a
    /// generic line instead of their internals.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Http(_) => "Could not reach the license API".to_string(),
            Self::Api { message, .. } => message.clone(),
            Self::Parse(_) => "Unexpected response from the license API".to_string(),
        }
    }
}

/// Failure body shape used across the license API.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// HTTP client for the license API.
///
/// Cheap to clone; the connection pool is shared.
#[derive(Debug, Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

#[derive(Debug)]
struct ApiClientInner {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for the API at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the underlying HTTP client cannot be
    /// constructed.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("keywarden-dashboard/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: base_url.trim_end_matches('/').to_string(),
            }),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }
}

/// Convert a non-success response into [`ApiError::Api`], preferring the
/// backend's `{"error": "..."}` body over the operation fallback.
async fn error_from_response(response: reqwest::Response, fallback: &str) -> ApiError {
    let status = response.status().as_u16();
    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.error.unwrap_or_else(|| fallback.to_string()),
        Err(_) => fallback.to_string(),
    };
    ApiError::Api { status, message }
}

/// Decode a success body, routing failures through the shared taxonomy.
async fn read_json<T>(response: reqwest::Response, fallback: &str) -> Result<T, ApiError>
where
    T: serde::de::DeserializeOwned,
{
    if !response.status().is_success() {
        return Err(error_from_response(response, fallback).await);
    }
    response
        .json::<T>()
        .await
        .map_err(|e| ApiError::Parse(e.to_string()))
}
