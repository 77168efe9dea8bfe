use std::sync::Arc;

use super::actions::{ActionsApi, ActionsHandler};
use super::errors::GitHubError;
use crate::config::GitHubConfig;
use crate::http::RateLimitedHttpClient;

/// Entry point for talking to GitHub with the configured token and limits.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    pub actions: ActionsHandler,
}

impl GitHubClient {
    pub fn new(config: &GitHubConfig) -> Result<Self, GitHubError> {
        let http = RateLimitedHttpClient::new(config)?;
        Ok(Self::from_http(http, config))
    }

    /// Build around an existing Octocrab, e.g. one pointed at a mock server.
    pub fn with_octocrab(octocrab: octocrab::Octocrab, config: &GitHubConfig) -> Self {
        Self::from_http(RateLimitedHttpClient::with_octocrab(octocrab, config), config)
    }

    fn from_http(http: RateLimitedHttpClient, config: &GitHubConfig) -> Self {
        Self {
            actions: ActionsHandler::new(http, config.per_page, config.max_pages),
        }
    }

    /// Shared handle for services that are generic over [`ActionsApi`].
    pub fn into_api(self) -> Arc<dyn ActionsApi> {
        Arc::new(self.actions)
    }
}
