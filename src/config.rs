use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for OmniLens
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OmniLensConfig {
    /// GitHub API access
    pub github: GitHubConfig,
    /// Aggregation and request handling
    pub dashboard: DashboardConfig,
    /// HTTP server settings
    pub server: ServerConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
    /// Repository store settings (optional)
    pub database: Option<DatabaseConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// GitHub API token (can be set via env var)
    pub token: Option<String>,
    /// REST API base, overridden for GitHub Enterprise or tests
    pub api_base: String,
    /// Client-side rate limiting
    pub rate_limit: RateLimitConfig,
    /// How long GET responses stay cached
    pub cache_ttl_seconds: u64,
    /// Page size for list endpoints (GitHub caps at 100)
    pub per_page: u8,
    /// Upper bound on pages fetched per listing
    pub max_pages: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub requests_per_second: u32,
    pub burst_capacity: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Hard timeout for the daily overview fetch
    pub request_timeout_seconds: u64,
    /// Jobs fetched concurrently per chunk
    pub log_concurrency: usize,
    /// Window used when a caller does not pass `days`
    pub default_window_days: u32,
    /// Runs inspected when auto-detecting coverage
    pub max_runs_for_coverage: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level used when RUST_LOG is unset
    pub log_level: String,
    /// Emit JSON lines instead of human-readable logs
    pub json_logs: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite file path or connection string
    pub url: String,
    /// Maximum connections in pool
    pub max_connections: u32,
    /// Enable automatic migrations
    pub auto_migrate: bool,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None, // Read from env var or omnilens.toml
            api_base: "https://api.github.com".to_string(),
            rate_limit: RateLimitConfig::default(),
            cache_ttl_seconds: 60,
            per_page: 100,
            max_pages: 10,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 10,
            burst_capacity: 20,
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            request_timeout_seconds: 10,
            log_concurrency: 10,
            default_window_days: 30,
            max_runs_for_coverage: 5,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".to_string(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: true,
        }
    }
}

impl Default for OmniLensConfig {
    fn default() -> Self {
        Self {
            github: GitHubConfig::default(),
            dashboard: DashboardConfig::default(),
            server: ServerConfig::default(),
            observability: ObservabilityConfig::default(),
            database: Some(DatabaseConfig::default()),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://.omnilens/omnilens.db?mode=rwc".to_string(),
            max_connections: 5,
            auto_migrate: true,
        }
    }
}

impl OmniLensConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration files (omnilens.toml, .omnilens-rc)
    /// 3. Environment variables (prefixed with OMNILENS_, nested with `__`)
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("."))
    }

    /// Same as [`OmniLensConfig::load`] but resolves config files relative to `dir`.
    pub fn load_from(dir: &Path) -> Result<Self> {
        let mut builder = Config::builder();

        let main_file = dir.join("omnilens.toml");
        if main_file.exists() {
            builder = builder.add_source(File::from(main_file));
        }

        let rc_file = dir.join(".omnilens-rc");
        if rc_file.exists() {
            builder = builder.add_source(File::from(rc_file).format(config::FileFormat::Toml));
        }

        builder = builder.add_source(
            Environment::with_prefix("OMNILENS")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let mut omnilens_config: OmniLensConfig = builder.build()?.try_deserialize()?;

        // Special handling for GitHub token - check multiple sources
        if omnilens_config.github.token.is_none() {
            if let Ok(token) = std::env::var("OMNILENS_GITHUB_TOKEN") {
                omnilens_config.github.token = Some(token);
            } else if let Ok(token) = std::env::var("GITHUB_TOKEN") {
                omnilens_config.github.token = Some(token);
            }
        }

        Ok(omnilens_config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<OmniLensConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        // Load .env file first
        let _ = OmniLensConfig::load_env_file();
        OmniLensConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static OmniLensConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_limits() {
        let config = OmniLensConfig::default();
        assert_eq!(config.dashboard.request_timeout_seconds, 10);
        assert_eq!(config.dashboard.log_concurrency, 10);
        assert_eq!(config.github.per_page, 100);
        assert_eq!(config.github.api_base, "https://api.github.com");
    }

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("omnilens.toml"),
            r#"
[github]
max_pages = 3

[dashboard]
default_window_days = 7

[server]
bind_address = "0.0.0.0:8080"
"#,
        )
        .unwrap();

        let config = OmniLensConfig::load_from(dir.path()).unwrap();
        assert_eq!(config.github.max_pages, 3);
        assert_eq!(config.github.per_page, 100);
        assert_eq!(config.dashboard.default_window_days, 7);
        assert_eq!(config.dashboard.log_concurrency, 10);
        assert_eq!(config.server.bind_address, "0.0.0.0:8080");
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = OmniLensConfig::default();
        config.dashboard.max_runs_for_coverage = 9;
        config.save_to_file(dir.path().join("omnilens.toml")).unwrap();

        let reloaded = OmniLensConfig::load_from(dir.path()).unwrap();
        assert_eq!(reloaded.dashboard.max_runs_for_coverage, 9);
    }
}
