//! Discord profile lookups for display enrichment.
//!
//! License and log records carry raw Discord ids. This service resolves
//! them to usernames and avatar URLs through the public profile API,
//! with an in-memory cache so list pages do not hammer the upstream.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use moka::future::Cache;
use serde::Deserialize;

use crate::api::ApiError;

/// Maximum number of cached profiles.
const CACHE_CAPACITY: u64 = 2_000;

/// How long a resolved profile stays cached.
const CACHE_TTL: Duration = Duration::from_secs(600);

/// Per-request timeout for profile lookups.
const LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// A resolved Discord profile.
#[derive(Debug, Clone)]
pub struct DiscordProfile {
    pub username: String,
    pub avatar_url: Option<String>,
}

/// Wire shape of the profile API response.
#[derive(Debug, Deserialize)]
struct ProfileResponse {
    username: Option<String>,
    global_name: Option<String>,
    avatar_url: Option<String>,
    default_avatar_url: Option<String>,
}

/// Client for the Discord profile API with response caching.
///
/// Lookups never fail a page render: any upstream error resolves to
/// `None` and callers fall back to the raw Discord id.
#[derive(Clone)]
pub struct ProfileService {
    http: reqwest::Client,
    base_url: String,
    cache: Cache<String, DiscordProfile>,
}

impl ProfileService {
    /// Create a new profile service.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client fails to build.
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(LOOKUP_TIMEOUT)
            .user_agent(concat!("keywarden-dashboard/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let cache = Cache::builder()
            .max_capacity(CACHE_CAPACITY)
            .time_to_live(CACHE_TTL)
            .build();

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            cache,
        })
    }

    /// Resolve a single Discord id to a profile.
    ///
    /// Returns `None` for blank ids and for any lookup failure.
    pub async fn lookup(&self, discord_id: &str) -> Option<DiscordProfile> {
        let discord_id = discord_id.trim();
        if discord_id.is_empty() {
            return None;
        }

        if let Some(profile) = self.cache.get(discord_id).await {
            return Some(profile);
        }

        let profile = self.fetch(discord_id).await?;
        self.cache
            .insert(discord_id.to_owned(), profile.clone())
            .await;
        Some(profile)
    }

    /// Resolve a batch of Discord ids, deduplicated.
    ///
    /// Ids that fail to resolve are simply absent from the returned map.
    pub async fn resolve_many(&self, ids: impl IntoIterator<Item = String>) -> ProfileMap {
        let unique: HashSet<String> = ids
            .into_iter()
            .map(|id| id.trim().to_owned())
            .filter(|id| !id.is_empty())
            .collect();

        let lookups = unique.into_iter().map(|id| async move {
            let profile = self.lookup(&id).await;
            (id, profile)
        });

        futures::future::join_all(lookups)
            .await
            .into_iter()
            .filter_map(|(id, profile)| profile.map(|p| (id, p)))
            .collect()
    }

    async fn fetch(&self, discord_id: &str) -> Option<DiscordProfile> {
        let url = format!("{}/v1/discord/users/{discord_id}", self.base_url);

        let response = match self.http.get(&url).query(&[("raw", "true")]).send().await {
            Ok(response) => response,
            Err(error) => {
                tracing::debug!(%discord_id, %error, "Profile request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            tracing::debug!(
                %discord_id,
                status = response.status().as_u16(),
                "Profile API returned an error"
            );
            return None;
        }

        let body: ProfileResponse = match response.json().await {
            Ok(body) => body,
            Err(error) => {
                tracing::debug!(%discord_id, %error, "Profile response was not valid JSON");
                return None;
            }
        };

        // The display name falls back to the raw id when the profile
        // carries neither a username nor a global name.
        let username = body
            .username
            .or(body.global_name)
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| discord_id.to_owned());

        let avatar_url = body
            .avatar_url
            .or(body.default_avatar_url)
            .filter(|avatar| !avatar.is_empty());

        Some(DiscordProfile {
            username,
            avatar_url,
        })
    }
}

/// Resolved profiles keyed by Discord id.
pub type ProfileMap = HashMap<String, DiscordProfile>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    async fn service(server: &MockServer) -> ProfileService {
        ProfileService::new(&server.uri()).unwrap()
    }

    #[tokio::test]
    async fn test_lookup_resolves_username_and_avatar() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/discord/users/111222333"))
            .and(query_param("raw", "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "username": "opal",
                "global_name": "Opal Dev",
                "avatar_url": "https://cdn.example/avatars/opal.png",
                "default_avatar_url": "https://cdn.example/embed/0.png",
            })))
            .mount(&server)
            .await;

        let profile = service(&server).await.lookup("111222333").await.unwrap();

        assert_eq!(profile.username, "opal");
        assert_eq!(
            profile.avatar_url.as_deref(),
            Some("https://cdn.example/avatars/opal.png")
        );
    }

    #[tokio::test]
    async fn test_lookup_falls_back_to_global_name_then_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/discord/users/444"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "username": "",
                "global_name": "Opal Dev",
                "default_avatar_url": "https://cdn.example/embed/3.png",
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/discord/users/555"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let service = service(&server).await;

        let named = service.lookup("444").await.unwrap();
        assert_eq!(named.username, "Opal Dev");
        assert_eq!(
            named.avatar_url.as_deref(),
            Some("https://cdn.example/embed/3.png")
        );

        let bare = service.lookup("555").await.unwrap();
        assert_eq!(bare.username, "555");
        assert_eq!(bare.avatar_url, None);
    }

    #[tokio::test]
    async fn test_lookup_swallows_upstream_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/discord/users/666"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        assert!(service(&server).await.lookup("666").await.is_none());
    }

    #[tokio::test]
    async fn test_blank_id_short_circuits() {
        let server = MockServer::start().await;

        assert!(service(&server).await.lookup("   ").await.is_none());
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lookup_caches_resolved_profiles() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/discord/users/777"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "username": "cached",
            })))
            .expect(1)
            .mount(&server)
            .await;

        let service = service(&server).await;
        assert!(service.lookup("777").await.is_some());
        assert!(service.lookup("777").await.is_some());
    }

    #[tokio::test]
    async fn test_resolve_many_deduplicates_and_skips_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/discord/users/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "username": "one",
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/discord/users/2"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let ids = vec![
            "1".to_owned(),
            "1".to_owned(),
            "2".to_owned(),
            String::new(),
        ];
        let profiles = service(&server).await.resolve_many(ids).await;

        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles["1"].username, "one");
    }
}
