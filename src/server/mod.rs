//! JSON API over the dashboard service.

pub mod errors;
pub mod handlers;
#[cfg(feature = "database")]
pub mod repositories;

pub use errors::ApiError;

use anyhow::Result;
use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::OmniLensConfig;
use crate::dashboard::DashboardService;
use crate::github::{GitHubClient, RepoRef};
use crate::http::RateLimitedHttpClient;
#[cfg(feature = "database")]
use crate::store::RepositoryStore;

#[derive(Clone)]
pub struct AppState {
    pub dashboard: DashboardService,
    /// Shared response cache, invalidated when tracked repositories change
    pub http: Option<RateLimitedHttpClient>,
    #[cfg(feature = "database")]
    pub store: Option<RepositoryStore>,
}

impl AppState {
    pub fn new(dashboard: DashboardService) -> Self {
        Self {
            dashboard,
            http: None,
            #[cfg(feature = "database")]
            store: None,
        }
    }

    pub fn with_http(mut self, http: RateLimitedHttpClient) -> Self {
        self.http = Some(http);
        self
    }

    #[cfg(feature = "database")]
    pub fn with_store(mut self, store: RepositoryStore) -> Self {
        self.store = Some(store);
        self
    }

    pub async fn invalidate_repository(&self, repo: &RepoRef) {
        if let Some(http) = &self.http {
            http.invalidate_prefix(&format!("/repos/{}/{}", repo.owner, repo.name))
                .await;
        }
    }
}

pub fn router(state: AppState) -> Router {
    let router = Router::new()
        .route("/health", get(handlers::health))
        .route("/api/repos/{owner}/{repo}/workflows", get(handlers::workflows))
        .route("/api/repos/{owner}/{repo}/usage", get(handlers::usage))
        .route("/api/repos/{owner}/{repo}/stats", get(handlers::stats))
        .route("/api/repos/{owner}/{repo}/overview", get(handlers::overview))
        .route("/api/repos/{owner}/{repo}/coverage", get(handlers::coverage))
        .route("/api/repos/{owner}/{repo}/detect", get(handlers::detect));

    #[cfg(feature = "database")]
    let router = router
        .route(
            "/api/repositories",
            get(repositories::list_repositories).post(repositories::add_repository),
        )
        .route(
            "/api/repositories/{owner}/{repo}",
            get(repositories::get_repository).delete(repositories::remove_repository),
        );

    router.with_state(state)
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}

/// Build the state from configuration and serve until a shutdown signal.
pub async fn serve(config: &OmniLensConfig, bind_address: &str) -> Result<()> {
    let client = GitHubClient::new(&config.github)?;
    let http = client.actions.http().clone();
    let dashboard = DashboardService::new(client.into_api(), config.dashboard.clone());

    let state = AppState::new(dashboard).with_http(http);

    #[cfg(feature = "database")]
    let state = match &config.database {
        Some(db) => state.with_store(RepositoryStore::connect(db).await?),
        None => {
            info!("Database not configured, repository routes will answer 503");
            state
        }
    };

    let listener = TcpListener::bind(bind_address).await?;
    info!("OmniLens API listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}
