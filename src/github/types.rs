//! Serde mirrors of the GitHub Actions REST payloads OmniLens reads.
//!
//! Only the fields the aggregations need are declared; everything else in the
//! GitHub response is ignored on deserialization.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::GitHubError;

/// An `owner/name` pair identifying a repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parse `owner/name`, an https GitHub URL, or an ssh remote.
    pub fn parse(input: &str) -> Result<Self, GitHubError> {
        let invalid = |reason: &str| GitHubError::InvalidRepository {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let trimmed = input.trim();
        let path = if let Some(rest) = trimmed.strip_prefix("git@github.com:") {
            rest
        } else if let Some(idx) = trimmed.find("github.com/") {
            &trimmed[idx + "github.com/".len()..]
        } else {
            trimmed
        };

        let path = path.trim_end_matches('/');
        let path = path.strip_suffix(".git").unwrap_or(path);

        let mut segments = path.split('/');
        let owner = segments.next().unwrap_or_default();
        let name = segments.next().ok_or_else(|| invalid("expected owner/name"))?;
        if segments.next().is_some() {
            return Err(invalid("too many path segments"));
        }
        if owner.is_empty() || name.is_empty() {
            return Err(invalid("owner and name must be non-empty"));
        }

        let valid = |s: &str| {
            s.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
        };
        if !valid(owner) || !valid(name) {
            return Err(invalid("contains characters GitHub does not allow"));
        }

        Ok(Self::new(owner, name))
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub html_url: String,
    #[serde(default)]
    pub default_branch: Option<String>,
    #[serde(default)]
    pub private: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workflow {
    pub id: u64,
    pub name: String,
    pub path: String,
    pub state: String,
    #[serde(default)]
    pub html_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Workflow {
    pub fn is_active(&self) -> bool {
        self.state == "active"
    }
}

/// Lifecycle state of a run or job as reported in `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RunStatus {
    Queued,
    InProgress,
    Completed,
    Waiting,
    Pending,
    Other(String),
}

impl From<String> for RunStatus {
    fn from(status: String) -> Self {
        match status.as_str() {
            "queued" => RunStatus::Queued,
            "in_progress" => RunStatus::InProgress,
            "completed" => RunStatus::Completed,
            "waiting" => RunStatus::Waiting,
            "pending" | "requested" => RunStatus::Pending,
            _ => RunStatus::Other(status),
        }
    }
}

impl From<RunStatus> for String {
    fn from(status: RunStatus) -> Self {
        match status {
            RunStatus::Queued => "queued".to_string(),
            RunStatus::InProgress => "in_progress".to_string(),
            RunStatus::Completed => "completed".to_string(),
            RunStatus::Waiting => "waiting".to_string(),
            RunStatus::Pending => "pending".to_string(),
            RunStatus::Other(other) => other,
        }
    }
}

/// Final outcome of a completed run or job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Conclusion {
    Success,
    Failure,
    Cancelled,
    Skipped,
    TimedOut,
    Neutral,
    ActionRequired,
    Stale,
    Other(String),
}

impl Conclusion {
    /// Failure and timeout both count against a workflow's health.
    pub fn is_failure(&self) -> bool {
        matches!(self, Conclusion::Failure | Conclusion::TimedOut)
    }
}

impl From<String> for Conclusion {
    fn from(conclusion: String) -> Self {
        match conclusion.as_str() {
            "success" => Conclusion::Success,
            "failure" => Conclusion::Failure,
            "cancelled" => Conclusion::Cancelled,
            "skipped" => Conclusion::Skipped,
            "timed_out" => Conclusion::TimedOut,
            "neutral" => Conclusion::Neutral,
            "action_required" => Conclusion::ActionRequired,
            "stale" => Conclusion::Stale,
            _ => Conclusion::Other(conclusion),
        }
    }
}

impl From<Conclusion> for String {
    fn from(conclusion: Conclusion) -> Self {
        match conclusion {
            Conclusion::Success => "success".to_string(),
            Conclusion::Failure => "failure".to_string(),
            Conclusion::Cancelled => "cancelled".to_string(),
            Conclusion::Skipped => "skipped".to_string(),
            Conclusion::TimedOut => "timed_out".to_string(),
            Conclusion::Neutral => "neutral".to_string(),
            Conclusion::ActionRequired => "action_required".to_string(),
            Conclusion::Stale => "stale".to_string(),
            Conclusion::Other(other) => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowRun {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    pub workflow_id: u64,
    #[serde(default)]
    pub head_branch: Option<String>,
    pub head_sha: String,
    pub event: String,
    pub status: RunStatus,
    #[serde(default)]
    pub conclusion: Option<Conclusion>,
    pub run_number: u64,
    #[serde(default = "default_attempt")]
    pub run_attempt: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub run_started_at: Option<DateTime<Utc>>,
    pub html_url: String,
}

fn default_attempt() -> u32 {
    1
}

impl WorkflowRun {
    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }

    /// Wall-clock seconds from start to last update, zero when clocks disagree.
    pub fn duration_seconds(&self) -> i64 {
        let started = self.run_started_at.unwrap_or(self.created_at);
        (self.updated_at - started).num_seconds().max(0)
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("unnamed workflow")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    pub name: String,
    pub status: RunStatus,
    #[serde(default)]
    pub conclusion: Option<Conclusion>,
    pub number: u32,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: u64,
    pub run_id: u64,
    pub name: String,
    pub status: RunStatus,
    #[serde(default)]
    pub conclusion: Option<Conclusion>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub runner_name: Option<String>,
    #[serde(default)]
    pub runner_group_name: Option<String>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Job {
    /// Seconds between start and completion, `None` until both are known.
    pub fn duration_seconds(&self) -> Option<i64> {
        match (self.started_at, self.completed_at) {
            (Some(start), Some(end)) => Some((end - start).num_seconds().max(0)),
            _ => None,
        }
    }
}

/// Query narrowing for `list_workflow_runs`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunFilter {
    pub workflow_id: Option<u64>,
    pub branch: Option<String>,
    pub event: Option<String>,
    pub status: Option<String>,
    pub created_from: Option<NaiveDate>,
    pub created_to: Option<NaiveDate>,
    /// Stop after this many runs
    pub limit: Option<u32>,
}

impl RunFilter {
    pub fn since(date: NaiveDate) -> Self {
        Self {
            created_from: Some(date),
            ..Self::default()
        }
    }

    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            created_from: Some(from),
            created_to: Some(to),
            ..Self::default()
        }
    }

    /// Value for GitHub's `created` search qualifier.
    pub fn created_qualifier(&self) -> Option<String> {
        match (self.created_from, self.created_to) {
            (Some(from), Some(to)) => Some(format!("{from}..{to}")),
            (Some(from), None) => Some(format!(">={from}")),
            (None, Some(to)) => Some(format!("<={to}")),
            (None, None) => None,
        }
    }
}

/// Envelopes GitHub wraps list responses in.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowsPage {
    pub total_count: u64,
    pub workflows: Vec<Workflow>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowRunsPage {
    pub total_count: u64,
    pub workflow_runs: Vec<WorkflowRun>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobsPage {
    pub total_count: u64,
    pub jobs: Vec<Job>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_owner_name() {
        let repo = RepoRef::parse("rust-lang/cargo").unwrap();
        assert_eq!(repo, RepoRef::new("rust-lang", "cargo"));
        assert_eq!(repo.full_name(), "rust-lang/cargo");
    }

    #[test]
    fn test_parse_urls_and_remotes() {
        let expected = RepoRef::new("octo-org", "hello.world");
        assert_eq!(RepoRef::parse("https://github.com/octo-org/hello.world").unwrap(), expected);
        assert_eq!(RepoRef::parse("https://github.com/octo-org/hello.world/").unwrap(), expected);
        assert_eq!(RepoRef::parse("https://github.com/octo-org/hello.world.git").unwrap(), expected);
        assert_eq!(RepoRef::parse("git@github.com:octo-org/hello.world.git").unwrap(), expected);
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        assert!(RepoRef::parse("justowner").is_err());
        assert!(RepoRef::parse("/name").is_err());
        assert!(RepoRef::parse("owner/").is_err());
        assert!(RepoRef::parse("owner/name/extra").is_err());
        assert!(RepoRef::parse("own er/name").is_err());
    }

    #[test]
    fn test_unknown_conclusion_is_preserved() {
        let c: Conclusion = serde_json::from_str("\"startup_failure\"").unwrap();
        assert_eq!(c, Conclusion::Other("startup_failure".to_string()));
        assert_eq!(serde_json::to_string(&c).unwrap(), "\"startup_failure\"");
        assert!(Conclusion::TimedOut.is_failure());
        assert!(!Conclusion::Cancelled.is_failure());
    }

    #[test]
    fn test_created_qualifier() {
        let from = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        assert_eq!(RunFilter::since(from).created_qualifier().unwrap(), ">=2024-03-01");
        assert_eq!(
            RunFilter::between(from, to).created_qualifier().unwrap(),
            "2024-03-01..2024-03-02"
        );
        assert!(RunFilter::default().created_qualifier().is_none());
    }

    #[test]
    fn test_run_deserializes_from_github_shape() {
        let run: WorkflowRun = serde_json::from_value(serde_json::json!({
            "id": 30433642,
            "name": "Build",
            "workflow_id": 159038,
            "head_branch": "master",
            "head_sha": "acb5820ced9479c074f688cc328bf03f341a511d",
            "event": "push",
            "status": "completed",
            "conclusion": "success",
            "run_number": 562,
            "run_attempt": 1,
            "created_at": "2020-01-22T19:33:08Z",
            "updated_at": "2020-01-22T19:35:08Z",
            "run_started_at": "2020-01-22T19:33:08Z",
            "html_url": "https://github.com/octo-org/octo-repo/actions/runs/30433642",
            "jobs_url": "ignored"
        }))
        .unwrap();
        assert!(run.is_completed());
        assert_eq!(run.duration_seconds(), 120);
        assert_eq!(run.conclusion, Some(Conclusion::Success));
    }
}
