use octocrab::Error as OctocrabError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("GitHub token not found: {0}")]
    TokenNotFound(String),

    #[error("Invalid repository '{input}': {reason}")]
    InvalidRepository { input: String, reason: String },

    #[error("GitHub API error: {0}")]
    Api(OctocrabError),

    #[error("GitHub returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("GitHub rate limit exceeded ({remaining} remaining, resets at {reset_time})")]
    RateLimit {
        reset_time: chrono::DateTime<chrono::Utc>,
        remaining: u32,
    },

    #[error("Operation '{operation}' timed out after {duration_ms}ms")]
    Timeout { operation: String, duration_ms: u64 },

    #[error("Failed to decode GitHub response: {0}")]
    Decode(String),
}

impl From<OctocrabError> for GitHubError {
    fn from(err: OctocrabError) -> Self {
        match &err {
            OctocrabError::GitHub { source, .. } => {
                let status = source.status_code.as_u16();
                if status == 403 && source.message.to_lowercase().contains("rate limit") {
                    return GitHubError::RateLimit {
                        reset_time: chrono::Utc::now() + chrono::Duration::hours(1),
                        remaining: 0,
                    };
                }
                GitHubError::Status {
                    status,
                    message: source.message.clone(),
                }
            }
            OctocrabError::Serde { source, .. } => GitHubError::Decode(source.to_string()),
            OctocrabError::Json { source, .. } => GitHubError::Decode(source.to_string()),
            _ => GitHubError::Api(err),
        }
    }
}

impl GitHubError {
    /// HTTP status to forward to API callers.
    pub fn status_code(&self) -> u16 {
        match self {
            GitHubError::TokenNotFound(_) => 401,
            GitHubError::InvalidRepository { .. } => 400,
            GitHubError::Status { status, .. } => *status,
            GitHubError::RateLimit { .. } => 429,
            GitHubError::Timeout { .. } => 504,
            GitHubError::Api(_) | GitHubError::Decode(_) => 500,
        }
    }

    /// Short operator-facing hints printed by the CLI under the error message.
    pub fn troubleshooting(&self) -> Vec<&'static str> {
        match self {
            GitHubError::TokenNotFound(_) => vec![
                "Use GitHub CLI: export GITHUB_TOKEN=\"$(gh auth token)\"",
                "Set token directly: export OMNILENS_GITHUB_TOKEN=your_token",
                "Create token at: https://github.com/settings/tokens (needs 'repo' and 'actions:read')",
            ],
            GitHubError::InvalidRepository { .. } => vec![
                "Pass the repository as owner/name",
                "Or paste the full URL: https://github.com/owner/name",
            ],
            GitHubError::Status { status, .. } => match status {
                401 => vec!["Token is invalid or expired", "Run: gh auth login"],
                403 => vec![
                    "Token lacks required permissions",
                    "Private repositories need the 'repo' scope",
                ],
                404 => vec![
                    "Repository may not exist or be private",
                    "Verify access: gh repo view owner/name",
                ],
                _ => vec![
                    "Check authentication: gh auth status",
                    "Check rate limits: gh api rate_limit",
                ],
            },
            GitHubError::RateLimit { .. } => vec![
                "Wait for the rate limit window to reset",
                "Use an authenticated token (5,000 requests/hour)",
            ],
            GitHubError::Timeout { .. } => vec![
                "Narrow the time window",
                "Check GitHub status: https://www.githubstatus.com",
            ],
            GitHubError::Api(_) | GitHubError::Decode(_) => vec![
                "Test connection: curl -I https://api.github.com",
                "Check GitHub status: https://www.githubstatus.com",
            ],
        }
    }
}
