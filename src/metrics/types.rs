use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::github::{Conclusion, WorkflowRun};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunnerKind {
    GitHubHosted,
    SelfHosted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunnerOs {
    Linux,
    Windows,
    MacOs,
    Unknown,
}

impl RunnerOs {
    /// GitHub's per-minute billing multiplier for hosted runners.
    pub fn billing_multiplier(self) -> u64 {
        match self {
            RunnerOs::Linux | RunnerOs::Unknown => 1,
            RunnerOs::Windows => 2,
            RunnerOs::MacOs => 10,
        }
    }
}

/// Usage of one (runner kind, OS) combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerBucket {
    pub kind: RunnerKind,
    pub os: RunnerOs,
    pub jobs: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub cancelled: u64,
    pub skipped: u64,
    pub total_seconds: i64,
    pub billable_minutes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowUsage {
    pub workflow_id: u64,
    pub workflow_name: String,
    pub runs: u64,
    pub jobs: u64,
    pub total_seconds: i64,
    pub billable_minutes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageReport {
    pub repository: String,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub total_runs: u64,
    pub total_jobs: u64,
    pub total_minutes: f64,
    pub billable_minutes: u64,
    pub runners: Vec<RunnerBucket>,
    pub workflows: Vec<WorkflowUsage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub id: u64,
    pub run_number: u64,
    pub conclusion: Option<Conclusion>,
    pub html_url: String,
    pub created_at: DateTime<Utc>,
    pub duration_seconds: i64,
}

impl From<&WorkflowRun> for RunSummary {
    fn from(run: &WorkflowRun) -> Self {
        Self {
            id: run.id,
            run_number: run.run_number,
            conclusion: run.conclusion.clone(),
            html_url: run.html_url.clone(),
            created_at: run.created_at,
            duration_seconds: run.duration_seconds(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStats {
    pub workflow_id: u64,
    pub workflow_name: String,
    pub total_runs: u64,
    pub completed_runs: u64,
    pub successes: u64,
    pub failures: u64,
    pub cancelled: u64,
    /// successes / (successes + failures); `None` without any decided run
    pub success_rate: Option<f64>,
    pub median_duration_seconds: Option<f64>,
    pub average_duration_seconds: Option<f64>,
    pub p95_duration_seconds: Option<i64>,
    pub current_failure_streak: u32,
    pub longest_failure_streak: u32,
    pub last_run: Option<RunSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayStatus {
    Passed,
    Failed,
    Running,
    Cancelled,
    DidNotRun,
}

/// Movement of a workflow's result relative to the previous day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Fixed,
    Regressed,
    StillFailing,
    StillPassing,
    New,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDayResult {
    pub workflow_id: u64,
    pub workflow_name: String,
    pub path: Option<String>,
    pub status: DayStatus,
    pub trend: Trend,
    pub run_count: u64,
    pub latest_run: Option<RunSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyOverview {
    pub repository: String,
    pub date: NaiveDate,
    pub offset_minutes: i32,
    pub workflows: Vec<WorkflowDayResult>,
    pub passed: u64,
    pub failed: u64,
    pub running: u64,
    pub cancelled: u64,
    pub did_not_run: u64,
    /// passed / (passed + failed)
    pub pass_rate: Option<f64>,
    pub total_runs: u64,
    pub total_duration_seconds: i64,
}
