use governor::{DefaultDirectRateLimiter, Jitter, Quota, RateLimiter};
use moka::future::Cache;
use octocrab::Octocrab;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::config::GitHubConfig;
use crate::github::GitHubError;
use crate::observability::github_metrics;

/// Rate-limited HTTP client that wraps Octocrab with client-side throttling
/// and a short-lived cache of JSON GET responses.
#[derive(Debug, Clone)]
pub struct RateLimitedHttpClient {
    octocrab: Octocrab,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
    cache: Cache<String, serde_json::Value>,
}

impl RateLimitedHttpClient {
    /// Build the client from GitHub settings.
    pub fn new(config: &GitHubConfig) -> Result<Self, GitHubError> {
        let token = config.token.clone().filter(|t| !t.is_empty()).ok_or_else(|| {
            GitHubError::TokenNotFound(
                "Set OMNILENS_GITHUB_TOKEN or GITHUB_TOKEN, or github.token in omnilens.toml"
                    .to_string(),
            )
        })?;

        let octocrab = Octocrab::builder()
            .personal_token(token)
            .base_uri(config.api_base.as_str())?
            .build()?;

        Ok(Self::with_octocrab(octocrab, config))
    }

    /// Wrap an already configured Octocrab instance.
    pub fn with_octocrab(octocrab: Octocrab, config: &GitHubConfig) -> Self {
        let per_second = NonZeroU32::new(config.rate_limit.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(config.rate_limit.burst_capacity).unwrap_or(per_second);
        let quota = Quota::per_second(per_second).allow_burst(burst);
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(config.cache_ttl_seconds.max(1)))
            .build();

        Self {
            octocrab,
            rate_limiter,
            cache,
        }
    }

    async fn throttle(&self) {
        self.rate_limiter
            .until_ready_with_jitter(Jitter::up_to(Duration::from_millis(50)))
            .await;
        github_metrics().record_request();
    }

    /// GET a JSON resource, serving repeated identical requests from cache.
    pub async fn get_json<T, P>(&self, route: &str, params: Option<&P>) -> Result<T, GitHubError>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let key = cache_key(route, params)?;

        if let Some(cached) = self.cache.get(&key).await {
            github_metrics().record_cache_hit();
            debug!(key = %key, "Cache hit");
            return serde_json::from_value(cached).map_err(|e| GitHubError::Decode(e.to_string()));
        }
        github_metrics().record_cache_miss();

        self.throttle().await;
        debug!(route = route, "Executing GitHub API request");

        let value: serde_json::Value = self
            .octocrab
            .get(route, params)
            .await
            .map_err(|e| record_failure(e.into()))?;

        self.cache.insert(key, value.clone()).await;
        serde_json::from_value(value).map_err(|e| GitHubError::Decode(e.to_string()))
    }

    /// GET a plain-text resource. Never cached.
    pub async fn get_text(&self, route: &str) -> Result<String, GitHubError> {
        self.throttle().await;
        debug!(route = route, "Downloading text resource");

        let response = self
            .octocrab
            ._get(route)
            .await
            .map_err(|e| record_failure(e.into()))?;

        let status = response.status();
        let body = self
            .octocrab
            .body_to_string(response)
            .await
            .map_err(|e| record_failure(e.into()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<serde_json::Value>(&body)
                .ok()
                .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
                .unwrap_or_else(|| body.chars().take(200).collect());
            return Err(record_failure(GitHubError::Status {
                status: status.as_u16(),
                message,
            }));
        }

        Ok(body)
    }

    /// Invalidate cached entries whose route starts with `prefix`
    pub async fn invalidate_prefix(&self, prefix: &str) {
        let keys_to_remove: Vec<String> = self
            .cache
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.as_ref().clone())
            .collect();

        for key in keys_to_remove {
            self.cache.invalidate(&key).await;
        }

        debug!(prefix = prefix, "Invalidated cache entries");
    }
}

fn cache_key<P: Serialize + ?Sized>(route: &str, params: Option<&P>) -> Result<String, GitHubError> {
    match params {
        Some(p) => {
            let encoded = serde_json::to_string(p).map_err(|e| GitHubError::Decode(e.to_string()))?;
            Ok(format!("{route}?{encoded}"))
        }
        None => Ok(route.to_string()),
    }
}

fn record_failure(err: GitHubError) -> GitHubError {
    match err {
        GitHubError::RateLimit { .. } => github_metrics().record_rate_limit_hit(),
        _ => github_metrics().record_error(),
    }
    err
}
