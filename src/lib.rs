// OmniLens Library - GitHub Actions CI health metrics
// This exposes the core components for the CLI, the API server and tests

pub mod cli;
pub mod config;
pub mod coverage;
pub mod dashboard;
pub mod github;
pub mod http;
pub mod metrics;
pub mod observability;
pub mod server;
#[cfg(feature = "database")]
pub mod store;
pub mod telemetry;

// Re-export key types for easy access
pub use config::{config, OmniLensConfig};
pub use coverage::{detect_coverage, parse_coverage, CoverageDetection, CoverageReport};
pub use dashboard::DashboardService;
pub use github::{ActionsApi, GitHubClient, GitHubError, RepoRef};
pub use http::RateLimitedHttpClient;
pub use metrics::{DailyOverview, MetricsReporter, UsageReport, WorkflowStats};
pub use observability::{github_metrics, GitHubApiMetrics, OperationTimer};
pub use server::{router, AppState};
#[cfg(feature = "database")]
pub use store::{RepositoryStore, StoreError};
pub use telemetry::{create_request_span, generate_correlation_id, init_telemetry, shutdown_telemetry};
